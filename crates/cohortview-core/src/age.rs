//! # Age Normalizer
//!
//! Age data arrives inconsistently formatted: plain numbers next to free text
//! with units ("3 months", "3m"). Normalization takes the first embedded run
//! of decimal digits. It never converts units and never reads a sign, so
//! `"-3"` normalizes to 3 and `"3-6"` to 3.
//!
//! Any Unicode decimal digit counts: fullwidth `"３个月"` and Arabic-Indic
//! `"٣ months"` both normalize to 3.

use crate::Cell;
use regex::Regex;
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+").ok());

static DECIMAL_DIGIT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\A\d\z").ok());

/// Distance back to the start of a run of ten decimal digits is bounded by
/// the widest adjacent block (the five mathematical digit sets).
const MAX_DIGIT_SPAN: u32 = 50;

/// Normalize a raw age cell to a number.
///
/// - `Number` is returned unchanged.
/// - `Text` yields its first digit run, or `None` when there is none.
/// - `Missing` yields `None`.
#[must_use]
pub fn normalize_age(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => normalize_age_text(s),
        Cell::Missing => None,
    }
}

/// Extract the first maximal digit run of `text` as a number.
///
/// Non-ASCII digits are folded to their ASCII value before parsing.
/// Returns `None` if there is no run.
#[must_use]
pub fn normalize_age_text(text: &str) -> Option<f64> {
    let re = DIGIT_RUN.as_ref()?;
    let run = re.find(text)?;
    let ascii: Option<String> = run.as_str().chars().map(ascii_digit).collect();
    ascii?.parse::<f64>().ok()
}

/// ASCII form of a Unicode decimal digit.
///
/// Decimal digits are encoded in contiguous blocks of ten, zero first, and
/// adjacent blocks always start on a zero. The value is therefore the offset
/// from the start of the contiguous digit span, modulo ten.
fn ascii_digit(c: char) -> Option<char> {
    if c.is_ascii_digit() {
        return Some(c);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let code = u32::from(c);
    let mut start = code;
    while code - start < MAX_DIGIT_SPAN {
        let prev = start.checked_sub(1).and_then(char::from_u32);
        match prev {
            Some(p) if is_decimal_digit(p) => start -= 1,
            _ => break,
        }
    }
    char::from_digit((code - start) % 10, 10)
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT
        .as_ref()
        .is_some_and(|re| re.is_match(c.encode_utf8(&mut buf)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_is_identity() {
        assert_eq!(normalize_age(&Cell::Number(7.5)), Some(7.5));
        assert_eq!(normalize_age(&Cell::Number(-2.0)), Some(-2.0));
    }

    #[test]
    fn text_with_units() {
        assert_eq!(normalize_age_text("3 months"), Some(3.0));
        assert_eq!(normalize_age_text("3m"), Some(3.0));
        assert_eq!(normalize_age_text("12 months"), Some(12.0));
    }

    #[test]
    fn first_digit_group_wins() {
        assert_eq!(normalize_age_text("3-6"), Some(3.0));
        assert_eq!(normalize_age_text("age12plus5"), Some(12.0));
    }

    #[test]
    fn sign_is_ignored() {
        assert_eq!(normalize_age_text("-3"), Some(3.0));
    }

    #[test]
    fn no_digits_is_none() {
        assert_eq!(normalize_age_text("unknown"), None);
        assert_eq!(normalize_age_text(""), None);
        assert_eq!(normalize_age(&Cell::Missing), None);
    }

    #[test]
    fn leading_zeros_parse() {
        assert_eq!(normalize_age_text("007 days"), Some(7.0));
    }

    #[test]
    fn patterns_compile() {
        assert!(DIGIT_RUN.is_some());
        assert!(DECIMAL_DIGIT.is_some());
    }

    #[test]
    fn fullwidth_digits() {
        assert_eq!(normalize_age_text("３个月"), Some(3.0));
        assert_eq!(normalize_age_text("１２个月"), Some(12.0));
    }

    #[test]
    fn arabic_indic_digits() {
        assert_eq!(normalize_age_text("٣ months"), Some(3.0));
        assert_eq!(normalize_age_text("٣ months, 6m"), Some(3.0));
        assert_eq!(normalize_age_text("age ٠٩"), Some(9.0));
    }

    #[test]
    fn other_digit_blocks() {
        // Devanagari six, mathematical bold seven, double-struck nine.
        assert_eq!(normalize_age_text("\u{096C}"), Some(6.0));
        assert_eq!(normalize_age_text("\u{1D7D5}"), Some(7.0));
        assert_eq!(normalize_age_text("\u{1D7E1}"), Some(9.0));
    }

    #[test]
    fn mixed_script_run() {
        assert_eq!(normalize_age_text("1２"), Some(12.0));
    }
}
