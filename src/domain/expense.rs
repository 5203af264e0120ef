use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Paise;

pub type ExpenseId = String;

/// A ledger expense. `date` is stored as `YYYY-MM-DD` text and is bucketed by
/// slicing, never by parsing into an instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    /// Free-form tag (e.g. "marketing", "software")
    pub category: String,
    /// Amount in paise
    pub amount: Paise,
    pub date: String,
}

impl Expense {
    pub fn new(
        description: impl Into<String>,
        category: impl Into<String>,
        amount: Paise,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            category: category.into(),
            amount,
            date: date.into(),
        }
    }

    /// `YYYY-MM`, or `None` when the date does not start with that shape.
    pub fn month_key(&self) -> Option<&str> {
        let key = self.date.get(..7)?;
        has_shape(key, "dddd-dd").then_some(key)
    }

    /// `YYYY-MM-DD`, or `None` when the date does not start with that shape.
    pub fn day_key(&self) -> Option<&str> {
        let key = self.date.get(..10)?;
        has_shape(key, "dddd-dd-dd").then_some(key)
    }
}

/// `d` matches an ASCII digit; any other pattern byte must match literally.
fn has_shape(value: &str, pattern: &str) -> bool {
    value.len() == pattern.len()
        && value
            .bytes()
            .zip(pattern.bytes())
            .all(|(v, p)| if p == b'd' { v.is_ascii_digit() } else { v == p })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_is_a_string_slice() {
        let expense = Expense::new("Ads", "marketing", 20000, "2024-01-31");
        assert_eq!(expense.month_key(), Some("2024-01"));
        assert_eq!(expense.day_key(), Some("2024-01-31"));
    }

    #[test]
    fn test_keys_ignore_trailing_time() {
        let expense = Expense::new("Ads", "marketing", 20000, "2024-12-31T23:59:59Z");
        assert_eq!(expense.month_key(), Some("2024-12"));
        assert_eq!(expense.day_key(), Some("2024-12-31"));
    }

    #[test]
    fn test_malformed_dates_have_no_keys() {
        for date in ["", "2024", "31/01/2024", "2024-1-5", "२०२४-०१-३१"] {
            let expense = Expense::new("x", "misc", 1, date);
            assert_eq!(expense.day_key(), None, "{date}");
        }
        assert_eq!(Expense::new("x", "misc", 1, "2024/01").month_key(), None);
    }

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = Expense::new("x", "misc", 1, "2024-01-01");
        let b = Expense::new("x", "misc", 1, "2024-01-01");
        assert_ne!(a.id, b.id);
    }
}
