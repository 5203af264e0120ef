use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Column + direction of a sortable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K: Copy + PartialEq> SortDescriptor<K> {
    pub fn new(key: K, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn ascending(key: K) -> Self {
        Self::new(key, SortDirection::Ascending)
    }

    pub fn descending(key: K) -> Self {
        Self::new(key, SortDirection::Descending)
    }

    /// Selecting the active column flips its direction; selecting another
    /// column starts it descending.
    pub fn toggled(self, key: K) -> Self {
        if key == self.key {
            Self::new(key, self.direction.reversed())
        } else {
            Self::descending(key)
        }
    }
}

/// A single cell value as seen by the sorter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Text(&'a str),
    /// Absent numbers compare as 0
    Number(Option<f64>),
    /// Absent instants sort before every present one
    Instant(Option<DateTime<Utc>>),
}

pub trait Sortable<K> {
    fn sort_value(&self, key: K) -> SortValue<'_>;
}

/// Ascending comparison of two cell values of the same column.
pub fn compare_sort_values(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Text(a), SortValue::Text(b)) => compare_text(a, b),
        (SortValue::Number(a), SortValue::Number(b)) => a.unwrap_or(0.0).total_cmp(&b.unwrap_or(0.0)),
        (SortValue::Instant(a), SortValue::Instant(b)) => a.cmp(b),
        // Mixed kinds never happen for a single column; keep input order
        _ => Ordering::Equal,
    }
}

/// Case-insensitive first, raw text as tie-breaker.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable sort in either direction: equal rows keep their relative order.
pub fn sort_rows<K: Copy, T: Sortable<K>>(rows: &mut [T], descriptor: SortDescriptor<K>) {
    rows.sort_by(|a, b| {
        let ordering = compare_sort_values(
            &a.sort_value(descriptor.key),
            &b.sort_value(descriptor.key),
        );
        match descriptor.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Columns of the monthly profit-and-loss table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthlySortKey {
    Month,
    Sales,
    Transactions,
    Expenses,
    Profit,
}

impl MonthlySortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonthlySortKey::Month => "month",
            MonthlySortKey::Sales => "sales",
            MonthlySortKey::Transactions => "transactions",
            MonthlySortKey::Expenses => "expenses",
            MonthlySortKey::Profit => "profit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "month" => Some(MonthlySortKey::Month),
            "sales" => Some(MonthlySortKey::Sales),
            "transactions" => Some(MonthlySortKey::Transactions),
            "expenses" => Some(MonthlySortKey::Expenses),
            "profit" => Some(MonthlySortKey::Profit),
            _ => None,
        }
    }
}

/// Columns of the expense ledger listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseSortKey {
    Date,
    Description,
    Category,
    Amount,
}

impl ExpenseSortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseSortKey::Date => "date",
            ExpenseSortKey::Description => "description",
            ExpenseSortKey::Category => "category",
            ExpenseSortKey::Amount => "amount",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "date" => Some(ExpenseSortKey::Date),
            "description" => Some(ExpenseSortKey::Description),
            "category" => Some(ExpenseSortKey::Category),
            "amount" => Some(ExpenseSortKey::Amount),
            _ => None,
        }
    }
}

impl Sortable<ExpenseSortKey> for super::Expense {
    fn sort_value(&self, key: ExpenseSortKey) -> SortValue<'_> {
        match key {
            // YYYY-MM-DD sorts correctly as text
            ExpenseSortKey::Date => SortValue::Text(&self.date),
            ExpenseSortKey::Description => SortValue::Text(&self.description),
            ExpenseSortKey::Category => SortValue::Text(&self.category),
            ExpenseSortKey::Amount => SortValue::Number(Some(self.amount as f64)),
        }
    }
}
