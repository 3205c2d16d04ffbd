//! Card field validation and formatting.
//!
//! Pure functions over raw form input: Luhn validation, display grouping,
//! brand detection and expiry/CVC handling. No side effects, no error states
//! beyond bool/String results.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Card brand detected from the leading digits of the card number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

impl CardBrand {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "visa",
            CardBrand::Mastercard => "mastercard",
            CardBrand::Amex => "amex",
            CardBrand::Discover => "discover",
            CardBrand::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validates a card number: whitespace is ignored, 13-19 digits required,
/// Luhn checksum must be zero.
pub fn is_valid_card_number(raw: &str) -> bool {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if !(13..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    luhn_checksum(&digits) % 10 == 0
}

/// Luhn checksum: double every second digit from the rightmost, subtracting 9
/// when the doubled value exceeds 9, and sum everything.
fn luhn_checksum(digits: &str) -> u32 {
    let mut sum = 0;
    let mut double = false;
    for c in digits.chars().rev() {
        let mut digit = c.to_digit(10).unwrap_or(0);
        if double {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        double = !double;
    }
    sum
}

/// Formats a card number for display: digits only, grouped into clusters of
/// four joined by single spaces, truncated to the first 16 digits. Inputs
/// shorter than four digits pass through unmodified. Idempotent.
pub fn format_card_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return digits;
    }
    let run = &digits[..digits.len().min(16)];
    run.as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classifies a card number by its leading digits. Unrecognized prefixes map
/// to [`CardBrand::Unknown`].
pub fn card_brand(raw: &str) -> CardBrand {
    let number: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if number.starts_with('4') {
        return CardBrand::Visa;
    }
    if matches!(number.get(..2), Some("51" | "52" | "53" | "54" | "55")) {
        return CardBrand::Mastercard;
    }
    if matches!(number.get(..2), Some("34" | "37")) {
        return CardBrand::Amex;
    }
    if number.starts_with("6011") || number.starts_with("65") {
        return CardBrand::Discover;
    }
    CardBrand::Unknown
}

/// Strips non-digits from an expiry month/year fragment, capped at 2 digits.
pub fn format_expiry_part(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(2).collect()
}

/// Strips non-digits from a CVC, capped at 4 digits.
pub fn format_cvc(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(4).collect()
}

/// A month is valid as exactly two digits in "01".."12".
pub fn is_valid_expiry_month(raw: &str) -> bool {
    raw.len() == 2
        && raw.chars().all(|c| c.is_ascii_digit())
        && matches!(raw.parse::<u32>(), Ok(1..=12))
}

/// A two-digit year YY is interpreted as 2000+YY and is valid iff it falls
/// within `[current_year, current_year + 20]`.
pub fn is_valid_expiry_year_at(raw: &str, current_year: i32) -> bool {
    if raw.len() != 2 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match raw.parse::<i32>() {
        Ok(yy) => {
            let year = 2000 + yy;
            year >= current_year && year <= current_year + 20
        }
        Err(_) => false,
    }
}

/// [`is_valid_expiry_year_at`] against the current UTC year.
pub fn is_valid_expiry_year(raw: &str) -> bool {
    is_valid_expiry_year_at(raw, chrono::Utc::now().year())
}

/// A CVC is valid as 3 or 4 digits.
pub fn is_valid_cvc(raw: &str) -> bool {
    (3..=4).contains(&raw.len()) && raw.chars().all(|c| c.is_ascii_digit())
}
