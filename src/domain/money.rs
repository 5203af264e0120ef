use std::fmt;

use serde::{Deserialize, Serialize};

/// Money is represented as integer minor units to avoid floating-point precision issues.
/// For INR, 1 rupee = 100 paise, so ₹50.00 = 5000 paise.
pub type Paise = i64;

/// Format paise as a plain decimal string (no symbol, no grouping).
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_paise(paise: Paise) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs_paise = paise.unsigned_abs();
    let units = abs_paise / 100;
    let remainder = abs_paise % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Parse a major-unit decimal string into paise.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_paise(input: &str) -> Result<Paise, ParsePaiseError> {
    let input = input.trim().replace(',', "");
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => {
            let units: i64 = parts[0]
                .parse()
                .map_err(|_| ParsePaiseError::InvalidFormat)?;
            let paise = units
                .checked_mul(100)
                .ok_or(ParsePaiseError::InvalidFormat)?;
            Ok(if negative { -paise } else { paise })
        }
        2 => {
            let units: i64 = if parts[0].is_empty() {
                0
            } else {
                parts[0]
                    .parse()
                    .map_err(|_| ParsePaiseError::InvalidFormat)?
            };

            let decimal_str = parts[1];
            if !decimal_str.chars().all(|c| c.is_ascii_digit()) {
                return Err(ParsePaiseError::InvalidFormat);
            }
            let decimal_paise: i64 = match decimal_str.len() {
                0 => 0,
                // "5" means 50 paise
                1 => {
                    decimal_str
                        .parse::<i64>()
                        .map_err(|_| ParsePaiseError::InvalidFormat)?
                        * 10
                }
                2 => decimal_str
                    .parse()
                    .map_err(|_| ParsePaiseError::InvalidFormat)?,
                // Truncate anything past two decimals
                _ => decimal_str[..2]
                    .parse()
                    .map_err(|_| ParsePaiseError::InvalidFormat)?,
            };

            let paise = units
                .checked_mul(100)
                .and_then(|p| p.checked_add(decimal_paise))
                .ok_or(ParsePaiseError::InvalidFormat)?;
            Ok(if negative { -paise } else { paise })
        }
        _ => Err(ParsePaiseError::InvalidFormat),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePaiseError {
    InvalidFormat,
}

impl fmt::Display for ParsePaiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePaiseError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParsePaiseError {}

/// How the integer part of an amount is split into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitGrouping {
    /// 12,34,56,789 (lakh/crore)
    Indian,
    /// 123,456,789
    Western,
}

/// Presentation boundary for money: the only place minor units become text
/// with a currency symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub grouping: DigitGrouping,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::inr()
    }
}

impl CurrencyFormat {
    pub fn new(symbol: impl Into<String>, grouping: DigitGrouping) -> Self {
        Self {
            symbol: symbol.into(),
            grouping,
        }
    }

    pub fn inr() -> Self {
        Self::new("₹", DigitGrouping::Indian)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "INR" => Some(Self::inr()),
            "USD" => Some(Self::new("$", DigitGrouping::Western)),
            "EUR" => Some(Self::new("€", DigitGrouping::Western)),
            "GBP" => Some(Self::new("£", DigitGrouping::Western)),
            _ => None,
        }
    }

    /// Example (INR): 12345678 -> "₹1,23,456.78"
    pub fn format(&self, paise: Paise) -> String {
        let sign = if paise < 0 { "-" } else { "" };
        let abs_paise = paise.unsigned_abs();
        let units = group_digits(&(abs_paise / 100).to_string(), self.grouping);
        format!("{}{}{}.{:02}", sign, self.symbol, units, abs_paise % 100)
    }

    /// Format a value that may carry fractional paise (pro-rated item sales).
    pub fn format_fractional(&self, paise: f64) -> String {
        if !paise.is_finite() {
            return self.format(0);
        }
        self.format(paise.round() as Paise)
    }
}

fn group_digits(digits: &str, grouping: DigitGrouping) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let group_size = match grouping {
        DigitGrouping::Indian => 2,
        DigitGrouping::Western => 3,
    };

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(group_size);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}
