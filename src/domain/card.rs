use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Card schemes recognised from the leading digits of a card number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardScheme {
    Visa,
    Mastercard,
    AmericanExpress,
    Discover,
    DinersClub,
    Jcb,
    Maestro,
}

impl CardScheme {
    /// Detects the scheme from a digits-only card number prefix.
    pub fn detect(number: &str) -> Option<Self> {
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let prefix = |len: usize| -> Option<u32> { number.get(..len)?.parse().ok() };
        let within = |len: usize, range: RangeInclusive<u32>| {
            prefix(len).is_some_and(|p| range.contains(&p))
        };

        if within(2, 34..=34) || within(2, 37..=37) {
            Some(CardScheme::AmericanExpress)
        } else if within(4, 6011..=6011) || within(2, 65..=65) || within(3, 644..=649) {
            Some(CardScheme::Discover)
        } else if within(4, 3528..=3589) {
            Some(CardScheme::Jcb)
        } else if within(2, 36..=36) || within(2, 38..=39) || within(3, 300..=305) {
            Some(CardScheme::DinersClub)
        } else if within(2, 51..=55) || within(4, 2221..=2720) {
            Some(CardScheme::Mastercard)
        } else if number.starts_with('4') {
            Some(CardScheme::Visa)
        } else if within(2, 50..=50) || within(2, 56..=69) {
            Some(CardScheme::Maestro)
        } else {
            None
        }
    }

    pub fn valid_lengths(&self) -> &'static [usize] {
        match self {
            CardScheme::Visa => &[13, 16, 19],
            CardScheme::Mastercard => &[16],
            CardScheme::AmericanExpress => &[15],
            CardScheme::Discover => &[16, 19],
            CardScheme::DinersClub => &[14, 16, 19],
            CardScheme::Jcb => &[16, 17, 18, 19],
            CardScheme::Maestro => &[12, 13, 14, 15, 16, 17, 18, 19],
        }
    }

    pub fn cvv_length(&self) -> usize {
        match self {
            CardScheme::AmericanExpress => 4,
            _ => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CardScheme::Visa => "Visa",
            CardScheme::Mastercard => "Mastercard",
            CardScheme::AmericanExpress => "American Express",
            CardScheme::Discover => "Discover",
            CardScheme::DinersClub => "Diners Club",
            CardScheme::Jcb => "JCB",
            CardScheme::Maestro => "Maestro",
        }
    }
}

/// Luhn (mod 10) checksum over a digits-only string.
pub fn luhn_valid(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (i, c) in number.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
