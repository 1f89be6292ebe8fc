//! Value parsers used by the extraction rules.
//!
//! A parser turns a raw regex capture into a typed value, or `None` when the
//! capture is malformed. Parser failure is never an error: the rule simply
//! does not match and the engine moves on.

use std::fmt;

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fixed-point currency amount stored as integer cents, serialized as a
/// two-decimal string (`"150.00"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount {
    cents: i64,
}

impl Amount {
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(self) -> i64 {
        self.cents
    }

    /// Parses a Brazilian-formatted amount: `.` thousands separator, `,`
    /// decimal separator, one or two decimal digits (`1.234,56`).
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().replace('.', "");
        let (int_part, frac_part) = match cleaned.split_once(',') {
            Some((i, f)) => (i, f),
            None => (cleaned.as_str(), ""),
        };

        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !(frac_part.len() <= 2 && frac_part.bytes().all(|b| b.is_ascii_digit())) {
            return None;
        }

        let units: i64 = int_part.parse().ok()?;
        let cents_frac: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().ok()? * 10,
            _ => frac_part.parse().ok()?,
        };

        Some(Self {
            cents: units.checked_mul(100)?.checked_add(cents_frac)?,
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let (units, frac) = raw
            .split_once('.')
            .ok_or_else(|| D::Error::custom("amount must have two decimal places"))?;
        if frac.len() != 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(D::Error::custom("amount must have two decimal places"));
        }
        let units: i64 = units
            .parse()
            .map_err(|_| D::Error::custom("invalid amount"))?;
        let cents_frac: i64 = frac.parse().map_err(|_| D::Error::custom("invalid amount"))?;
        Ok(Self::from_cents(units * 100 + cents_frac))
    }
}

/// `10/05/2024` (or `10-05-24`, `10.05.2024`) to ISO 8601.
pub fn parse_date(raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace(['-', '.'], "/");
    // Pick the format by year width: chrono's %Y would happily read "24"
    // as the year 24.
    let fmt = match cleaned.rsplit('/').next() {
        Some(year) if year.len() == 2 => "%d/%m/%y",
        _ => "%d/%m/%Y",
    };
    NaiveDate::parse_from_str(&cleaned, fmt)
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Phone digits to the canonical dial form used in messaging links:
/// `(48) 99999-8888` becomes `+5548999998888`. Numbers already carrying the
/// country code are not double-prefixed.
pub fn parse_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = digits.strip_prefix('0').unwrap_or(&digits);

    let canonical = match digits.len() {
        10 | 11 => format!("55{}", digits),
        12 | 13 if digits.starts_with("55") => digits.to_string(),
        _ => return None,
    };
    Some(format!("+{}", canonical))
}

/// Bounded integer for an age in years.
pub fn parse_age(raw: &str) -> Option<u32> {
    let age: u32 = raw.trim().parse().ok()?;
    (14..=99).contains(&age).then_some(age)
}

/// Bounded integer for years of professional experience.
pub fn parse_experience_years(raw: &str) -> Option<u32> {
    let years: u32 = raw.trim().parse().ok()?;
    (years <= 60).then_some(years)
}

pub fn only_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// CPF with valid check digits, formatted `000.000.000-00`.
pub fn parse_cpf(raw: &str) -> Option<String> {
    let digits = only_digits(raw);
    if !is_valid_cpf(&digits) {
        return None;
    }
    Some(format!(
        "{}.{}.{}-{}",
        &digits[..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..]
    ))
}

/// CNPJ with valid check digits, formatted `00.000.000/0000-00`.
pub fn parse_cnpj(raw: &str) -> Option<String> {
    let digits = only_digits(raw);
    if !is_valid_cnpj(&digits) {
        return None;
    }
    Some(format!(
        "{}.{}.{}/{}-{}",
        &digits[..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..]
    ))
}

pub fn is_valid_cpf(digits: &str) -> bool {
    if digits.len() != 11 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let nums: Vec<u32> = digits.bytes().map(|b| (b - b'0') as u32).collect();
    if nums.iter().all(|&d| d == nums[0]) {
        return false;
    }

    for i in [9usize, 10] {
        let total: u32 = (0..i).map(|n| nums[n] * ((i as u32 + 1) - n as u32)).sum();
        let mut check = (total * 10) % 11;
        if check == 10 {
            check = 0;
        }
        if check != nums[i] {
            return false;
        }
    }
    true
}

pub fn is_valid_cnpj(digits: &str) -> bool {
    if digits.len() != 14 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let nums: Vec<u32> = digits.bytes().map(|b| (b - b'0') as u32).collect();
    if nums.iter().all(|&d| d == nums[0]) {
        return false;
    }

    const WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let check = |weights: &[u32], upto: usize| -> u32 {
        let total: u32 = nums[..upto].iter().zip(weights).map(|(d, w)| d * w).sum();
        let rem = total % 11;
        if rem < 2 {
            0
        } else {
            11 - rem
        }
    };

    nums[12] == check(&WEIGHTS_1, 12) && nums[13] == check(&WEIGHTS_2, 13)
}
