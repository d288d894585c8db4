// src/decode.rs
// =============================================================================
// Recovers human-readable file names from widget row references.
//
// Rows in the tree widget carry a reference like
//   download?id=42&name=%u65E5%u672C%u96FB%u6C17.pdf
// that has been percent-escaped once more on top. The pipeline:
// 1. percent-decode the whole reference
// 2. keep only the trailing `name=` parameter, when there is one
// 3. rewrite `%uXXXX` escapes as `\uXXXX`
// 4. decode `\uXXXX` (and the usual backslash escapes) into characters
// =============================================================================

use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::model::{Node, NodeHandle};

fn name_param() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[?&]name=([^&]+)").unwrap())
}

fn percent_u() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%u([0-9A-Fa-f]{4})").unwrap())
}

/// The name the match engine should see for a node.
pub fn search_name(node: &Node) -> String {
    match &node.handle {
        NodeHandle::Row(row) => decode_reference(&row.reference),
        NodeHandle::Url(_) => percent_decode_str(&node.name).decode_utf8_lossy().into_owned(),
    }
}

/// Runs the full decoding pipeline over a row reference.
pub fn decode_reference(reference: &str) -> String {
    let unquoted = percent_decode_str(reference).decode_utf8_lossy();

    let extracted = name_param()
        .captures(unquoted.as_ref())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(unquoted.as_ref());

    let escaped = percent_u().replace_all(extracted, r"\u$1");
    unescape(&escaped)
}

// Decodes backslash escapes. Anything that is not a well-formed escape is
// kept as written.
fn unescape(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        match chars[i + 1] {
            'u' => match hex_at(&chars, i + 2, 4) {
                Some(unit) => {
                    let (decoded, consumed) = decode_utf16_unit(&chars, i + 6, unit);
                    out.push(decoded);
                    i += 6 + consumed;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            'x' => match hex_at(&chars, i + 2, 2).and_then(char::from_u32) {
                Some(c) => {
                    out.push(c);
                    i += 4;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            'n' => {
                out.push('\n');
                i += 2;
            }
            't' => {
                out.push('\t');
                i += 2;
            }
            'r' => {
                out.push('\r');
                i += 2;
            }
            '\\' => {
                out.push('\\');
                i += 2;
            }
            _ => {
                out.push('\\');
                i += 1;
            }
        }
    }

    out
}

fn hex_at(chars: &[char], start: usize, len: usize) -> Option<u32> {
    if start + len > chars.len() {
        return None;
    }
    let digits: String = chars[start..start + len].iter().collect();
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&digits, 16).ok()
}

// Turns one UTF-16 unit into a char, pairing a high surrogate with a
// following `\uDCxx` escape. Returns the char and how many extra input
// chars were consumed.
fn decode_utf16_unit(chars: &[char], next: usize, unit: u32) -> (char, usize) {
    if (0xD800..0xDC00).contains(&unit)
        && chars.get(next) == Some(&'\\')
        && chars.get(next + 1) == Some(&'u')
    {
        if let Some(low) = hex_at(chars, next + 2, 4) {
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                if let Some(c) = char::from_u32(code) {
                    return (c, 6);
                }
            }
        }
    }

    (char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, RowHandle};
    use rstest::rstest;
    use url::Url;

    #[rstest]
    #[case("report.pdf", "report.pdf")]
    #[case("%E6%97%A5%E6%9C%AC.txt", "日本.txt")]
    #[case("download?id=7&name=%u65E5%u672C%u96FB%u6C17.pdf", "日本電気.pdf")]
    #[case("download%3Fid%3D7%26name%3D%25u30CB%25u30C1%25u30C7%25u30F3.xlsx", "ニチデン.xlsx")]
    #[case("get?name=plain.doc&size=10", "plain.doc")]
    #[case("a\\u00e9b", "aéb")]
    #[case("emoji \\ud83d\\ude00", "emoji 😀")]
    #[case("broken \\u12", "broken \\u12")]
    #[case("C:\\data", "C:\\data")]
    fn test_decode_reference(#[case] reference: &str, #[case] expected: &str) {
        assert_eq!(decode_reference(reference), expected);
    }

    #[test]
    fn test_search_name_for_row() {
        let node = Node::new(
            NodeKind::File,
            "x?name=%u0041BC",
            NodeHandle::Row(RowHandle {
                index: 2,
                reference: "x?name=%u0041BC".to_string(),
            }),
            vec![],
        );
        assert_eq!(search_name(&node), "ABC");
    }

    #[test]
    fn test_search_name_for_url_node() {
        let node = Node::new(
            NodeKind::File,
            "caf%C3%A9.txt",
            NodeHandle::Url(Url::parse("http://example.com/caf%C3%A9.txt").unwrap()),
            vec![],
        );
        assert_eq!(search_name(&node), "café.txt");
    }
}
