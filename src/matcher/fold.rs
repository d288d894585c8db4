// src/matcher/fold.rs
// =============================================================================
// Width and case folding for file names and word list entries.
//
// Japanese file names mix full-width and half-width forms freely, so both
// sides of every comparison go through the same folding:
// - full-width ASCII (Ａ, ｎ, ０, ．) -> half-width ASCII
// - ideographic space -> ASCII space
// - half-width katakana (ﾆｯﾎﾟﾝ) -> full-width katakana, with the separate
//   voiced / semi-voiced marks composed onto the preceding kana
// - lowercase (fold only)
//
// Spans found in folded text are only ever compared with other spans in
// folded text, so the length changes folding causes do not matter.
// =============================================================================

const HALFWIDTH_KANA: &str = "ｦｧｨｩｪｫｬｭｮｯｰｱｲｳｴｵｶｷｸｹｺｻｼｽｾｿﾀﾁﾂﾃﾄﾅﾆﾇﾈﾉﾊﾋﾌﾍﾎﾏﾐﾑﾒﾓﾔﾕﾖﾗﾘﾙﾚﾛﾜﾝ";
const FULLWIDTH_KANA: &str = "ヲァィゥェォャュョッーアイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワン";

const HALFWIDTH_VOICED: char = '\u{FF9E}';
const HALFWIDTH_SEMI_VOICED: char = '\u{FF9F}';

// Kana whose voiced form is the next code point
const VOICEABLE: &str = "カキクケコサシスセソタチツテトハヒフヘホ";
const SEMI_VOICEABLE: &str = "ハヒフヘホ";

/// Width folding only. Safe to apply to regular expression source.
pub fn fold_width(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '\u{FF01}'..='\u{FF5E}' => {
                out.push(char::from_u32(c as u32 - 0xFEE0).unwrap_or(c));
            }
            '\u{3000}' => out.push(' '),
            HALFWIDTH_VOICED => compose_mark(&mut out, 1, '゛'),
            HALFWIDTH_SEMI_VOICED => compose_mark(&mut out, 2, '゜'),
            '\u{FF66}'..='\u{FF9D}' => out.push(halfwidth_kana(c)),
            _ => out.push(c),
        }
    }

    out
}

/// Width and case folding.
pub fn fold(input: &str) -> String {
    fold_width(input).to_lowercase()
}

fn halfwidth_kana(c: char) -> char {
    let offset = (c as u32 - 0xFF66) as usize;
    FULLWIDTH_KANA.chars().nth(offset).unwrap_or(c)
}

// Replaces the last pushed kana with its voiced (step 1) or semi-voiced
// (step 2) form, or appends the standalone mark when it cannot combine.
fn compose_mark(out: &mut String, step: u32, standalone: char) {
    let composed = out.chars().last().and_then(|prev| {
        let combinable = match step {
            1 => VOICEABLE.contains(prev),
            _ => SEMI_VOICEABLE.contains(prev),
        };
        if combinable {
            char::from_u32(prev as u32 + step)
        } else if step == 1 && prev == 'ウ' {
            Some('ヴ')
        } else {
            None
        }
    });

    match composed {
        Some(c) => {
            out.pop();
            out.push(c);
        }
        None => out.push(standalone),
    }
}
