//! Display-text cleanup shared by the source readers and name matching.

/// Arabic tatweel (kashida), used purely for visual stretching.
const TATWEEL: char = '\u{0640}';

fn is_arabic_diacritic(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}')
}

/// Normalizes a product title for exact-match comparison.
///
/// Drops Arabic diacritics and tatweel, collapses runs of whitespace to one
/// space and trims. Case is folded so Latin-script titles compare equal
/// regardless of capitalization.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|&c| c != TATWEEL && !is_arabic_diacritic(c))
        .flat_map(char::to_lowercase)
        .collect();
    collapse_whitespace(&stripped)
}

/// Collapses whitespace runs (including non-breaking spaces) and trims.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
