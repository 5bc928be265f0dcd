//! 举报描述中的不当词语替换

use once_cell::sync::Lazy;
use regex::Regex;

const BLOCKED_WORDS: [&str; 3] = ["badword1", "badword2", "badword3"];

static BLOCKED_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    BLOCKED_WORDS
        .iter()
        .filter_map(|w| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(w))).ok())
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredText {
    pub clean: bool,
    pub filtered: String,
}

pub fn filter_content(text: &str) -> FilteredText {
    let mut filtered = text.to_string();
    let mut clean = true;

    for re in BLOCKED_RE.iter() {
        if re.is_match(&filtered) {
            clean = false;
            filtered = re.replace_all(&filtered, "***").into_owned();
        }
    }

    FilteredText { clean, filtered }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_boundaries() {
        let r = filter_content("this is BADWORD1, really");
        assert!(!r.clean);
        assert_eq!(r.filtered, "this is ***, really");

        let r = filter_content("notbadword1here");
        assert!(r.clean);
        assert_eq!(r.filtered, "notbadword1here");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let r = filter_content("badword2 and badword3 and badword2");
        assert_eq!(r.filtered, "*** and *** and ***");
    }
}
