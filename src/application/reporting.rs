use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MonthlySortKey, Paise, PaymentOrder, SortValue, Sortable};

/// Everything the commercial dashboard shows, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub generated_at: DateTime<Utc>,
    pub today_sales: Paise,
    pub yesterday_sales: Paise,
    pub week_sales: Paise,
    pub last_week_sales: Paise,
    pub month_sales: Paise,
    pub total_sales: Paise,
    pub today_expenses: Paise,
    pub month_expenses: Paise,
    pub total_expenses: Paise,
    pub today_profit: Paise,
    pub month_profit: Paise,
    pub total_profit: Paise,
    /// Product key -> sales for today
    pub today_sales_by_item: BTreeMap<String, ProductSales>,
    /// Same entries, largest sales first
    pub sorted_today_sales_by_item: Vec<(String, ProductSales)>,
    pub monthly_report: Vec<MonthlyReportRow>,
    pub recent_transactions: Vec<PaymentOrder>,
}

/// Sales attributed to one product. `sales` may carry fractional paise
/// after pro-rating and is rounded only when formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub name: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReportRow {
    /// `YYYY-MM`
    pub month: String,
    pub sales: Paise,
    pub transactions: i64,
    pub expenses: Paise,
    pub profit: Paise,
}

impl Sortable<MonthlySortKey> for MonthlyReportRow {
    fn sort_value(&self, key: MonthlySortKey) -> SortValue<'_> {
        match key {
            MonthlySortKey::Month => SortValue::Text(&self.month),
            MonthlySortKey::Sales => SortValue::Number(Some(self.sales as f64)),
            MonthlySortKey::Transactions => SortValue::Number(Some(self.transactions as f64)),
            MonthlySortKey::Expenses => SortValue::Number(Some(self.expenses as f64)),
            MonthlySortKey::Profit => SortValue::Number(Some(self.profit as f64)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultantLedgerEntry {
    pub consultant_id: String,
    pub consultant_name: Option<String>,
    pub sales_count: i64,
    pub gross_sales: Paise,
    pub platform_fees: Paise,
    /// Gross sales minus platform fees
    pub earnings: Paise,
    pub paid_out: Paise,
    pub pending_payouts: Paise,
    /// Earnings not yet paid or requested
    pub available: Paise,
}
