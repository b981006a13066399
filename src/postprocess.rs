use crate::config::Compare;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse every whitespace run to one space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Text as fed to the similarity scorer under the compare settings.
pub fn normalize_for_compare(cfg: &Compare, s: &str) -> String {
    let mut out = if cfg.normalize_unicode {
        s.nfkc().collect::<String>()
    } else {
        s.to_string()
    };
    if cfg.collapse_whitespace {
        out = collapse_whitespace(&out);
    }
    out
}
