//! Normalized-name keys used to detect near-duplicate or impersonating
//! display names.

use unicode_normalization::UnicodeNormalization;

/// Visually confusable characters folded onto one representative.
pub const DEFAULT_CONFUSABLES: &[(char, char)] = &[('ン', 'ソ'), ('シ', 'ツ'), ('口', 'ロ'), ('ー', '-')];

/// Keys shorter than this are rejected at registration.
pub const MIN_KEY_CHARS: usize = 2;

/// Computes the normalized-name key of a display name.
///
/// Steps: NFKC, cut at the first opening bracket, lowercase, keep only
/// `a-z`, `0-9`, kana, CJK ideographs and `-`, then fold confusables.
/// Substitution targets must themselves survive the filter and must not be
/// sources, otherwise `normalize` stops being idempotent.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    confusables: Vec<(char, char)>,
}

impl NameNormalizer {
    pub fn new(confusables: Vec<(char, char)>) -> Self {
        let confusables = confusables
            .into_iter()
            .filter(|(_, to)| is_key_char(*to))
            .collect();
        Self { confusables }
    }

    pub fn normalize(&self, name: &str) -> String {
        let composed: String = name.nfkc().collect();
        let head = match composed.find(['(', '[', '{']) {
            Some(idx) => &composed[..idx],
            None => composed.as_str(),
        };

        head.to_lowercase()
            .chars()
            .filter(|c| is_key_char(*c))
            .map(|c| self.fold(c))
            .collect()
    }

    fn fold(&self, c: char) -> char {
        self.confusables
            .iter()
            .find(|(from, _)| *from == c)
            .map_or(c, |(_, to)| *to)
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CONFUSABLES.to_vec())
    }
}

fn is_key_char(c: char) -> bool {
    matches!(c,
        'a'..='z'
        | '0'..='9'
        | '-'
        | '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{4E00}'..='\u{9FAF}')
}
