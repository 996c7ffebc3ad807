//! Localized price and quantity text parsing.
//!
//! Storefront markup renders amounts in either Western (`0-9`) or
//! Arabic-indic (`٠-٩`) digits, with thousands separators and a currency
//! label that itself contains a period (`ر.س`). Everything here is total:
//! malformed input degrades to zero or `None`, never to an error.

use std::str::FromStr;

use rust_decimal::Decimal;

/// Distance between the Arabic-indic digit block (U+0660) and ASCII `'0'`
/// (U+0030).
const ARABIC_INDIC_OFFSET: u32 = 0x0630;

/// Arabic decimal separator `٫`.
const ARABIC_DECIMAL_SEPARATOR: char = '\u{066B}';

/// Maps a Western or Arabic-indic digit to its ASCII form.
fn to_western_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        '\u{0660}'..='\u{0669}' => char::from_u32(c as u32 - ARABIC_INDIC_OFFSET),
        _ => None,
    }
}

/// Replaces every Arabic-indic digit in `text` with its Western equivalent,
/// leaving all other characters untouched.
#[must_use]
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| to_western_digit(c).unwrap_or(c))
        .collect()
}

/// Parses arbitrary localized price text into a non-negative amount.
///
/// Only digits and periods survive cleaning; commas are thousands
/// separators and are dropped. The amount starts at the first digit and
/// covers the longest `digits[.digits]` run after it, so stray periods from
/// currency labels on either side are ignored.
///
/// Returns [`Decimal::ZERO`] for empty, digitless, or out-of-range input.
#[must_use]
pub fn parse_price(text: &str) -> Decimal {
    let cleaned = clean_numeric(text);
    leading_decimal(&cleaned)
        .and_then(|number| Decimal::from_str(number).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Parses a quantity field. Returns `None` when the text holds no digits or
/// the value is zero.
#[must_use]
pub fn parse_quantity(text: &str) -> Option<u32> {
    parse_count(text).filter(|&n| n > 0)
}

/// Parses a non-negative count such as a cart badge. Unlike
/// [`parse_quantity`], zero is a valid answer.
#[must_use]
pub fn parse_count(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .skip_while(|c| to_western_digit(*c).is_none())
        .map_while(to_western_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok()
}

/// Keeps digits (mapped to ASCII) and decimal separators; drops everything
/// else, including thousands-separator commas.
fn clean_numeric(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '.' | ARABIC_DECIMAL_SEPARATOR => Some('.'),
            other => to_western_digit(other),
        })
        .collect()
}

/// Returns the first `digits[.digits]` run in an already-cleaned string.
fn leading_decimal(cleaned: &str) -> Option<&str> {
    let bytes = cleaned.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;

    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    // Only take the fractional part if at least one digit follows the dot.
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    Some(&cleaned[start..end])
}

#[cfg(test)]
#[path = "price_test.rs"]
mod tests;
