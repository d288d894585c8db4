// src/matcher/wordlist.rs
//
// Word lists are UTF-8 text files with one entry per line. Blank lines and
// surrounding whitespace are ignored. A missing file is fatal: a run that
// silently matches nothing would look like a clean result.

use std::fs;
use std::path::Path;

use crate::error::CrawlError;

pub fn read_words(path: &Path) -> Result<Vec<String>, CrawlError> {
    let content = fs::read_to_string(path).map_err(|source| CrawlError::WordList {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content
        .trim_start_matches('\u{FEFF}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_words_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "\u{FEFF}NEC\n\n  nippon*denki  \n日本*電気\n").unwrap();

        let words = read_words(file.path()).unwrap();
        assert_eq!(words, vec!["NEC", "nippon*denki", "日本*電気"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = read_words(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, CrawlError::WordList { .. }));
    }
}
