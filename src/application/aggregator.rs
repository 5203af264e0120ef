//! Sales aggregation for the commercial dashboard.
//!
//! The aggregator is a pure function of its inputs and of the `now` it was
//! built with: it performs no I/O, never reads the clock and never fails.
//! Records that cannot be placed (no timestamp, non-revenue status, malformed
//! expense date) are left out of the buckets they cannot belong to.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, warn};

use crate::domain::{
    month_key_in, sort_rows, Expense, MonthlySortKey, Paise, PaymentOrder, ReportWindows,
    SortDescriptor,
};

use super::reporting::{MonthlyReportRow, ProductSales, SalesSummary};

pub const DEFAULT_RECENT_LIMIT: usize = 5;

pub struct SalesAggregator<Tz: TimeZone> {
    now: DateTime<Tz>,
    windows: ReportWindows,
    monthly_sort: SortDescriptor<MonthlySortKey>,
    recent_limit: usize,
}

impl<Tz: TimeZone> SalesAggregator<Tz> {
    /// Build an aggregator for a fixed instant. All windows are derived from
    /// `now` in its own time zone.
    pub fn new(now: DateTime<Tz>) -> Self {
        let windows = ReportWindows::new(&now);
        Self {
            now,
            windows,
            monthly_sort: SortDescriptor::descending(MonthlySortKey::Month),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub fn with_monthly_sort(mut self, sort: SortDescriptor<MonthlySortKey>) -> Self {
        self.monthly_sort = sort;
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn windows(&self) -> &ReportWindows {
        &self.windows
    }

    pub fn summarize(&self, orders: &[PaymentOrder], expenses: &[Expense]) -> SalesSummary {
        let w = &self.windows;

        let mut sales = SalesTotals::default();
        for (order, created_at) in revenue_orders(orders) {
            match sales.with_order(w, created_at, order.total_amount) {
                Some(next) => sales = next,
                None => warn!(
                    order = %order.id,
                    amount = order.total_amount,
                    "Sales total overflowed, excluding order"
                ),
            }
        }

        let mut spent = ExpenseTotals::default();
        for expense in expenses {
            match spent.with_expense(w, expense) {
                Some(next) => spent = next,
                None => warn!(
                    expense = %expense.id,
                    amount = expense.amount,
                    "Expense total overflowed, excluding expense"
                ),
            }
        }

        let today_sales_by_item = self.today_sales_by_item(orders);
        let sorted_today_sales_by_item = sort_by_sales(&today_sales_by_item);
        let monthly_report = self.monthly_report(orders, expenses);
        let recent_transactions = self.recent_transactions(orders);

        debug!(
            orders = orders.len(),
            expenses = expenses.len(),
            months = monthly_report.len(),
            today_sales = sales.today,
            total_sales = sales.total,
            "Summarized sales"
        );

        SalesSummary {
            generated_at: self.now.with_timezone(&Utc),
            today_sales: sales.today,
            yesterday_sales: sales.yesterday,
            week_sales: sales.week,
            last_week_sales: sales.last_week,
            month_sales: sales.month,
            total_sales: sales.total,
            today_expenses: spent.today,
            month_expenses: spent.month,
            total_expenses: spent.total,
            today_profit: sales.today.saturating_sub(spent.today),
            month_profit: sales.month.saturating_sub(spent.month),
            total_profit: sales.total.saturating_sub(spent.total),
            today_sales_by_item,
            sorted_today_sales_by_item,
            monthly_report,
            recent_transactions,
        }
    }

    /// Per-product sales for orders placed today, with manual totals
    /// distributed over their items.
    pub fn today_sales_by_item(&self, orders: &[PaymentOrder]) -> BTreeMap<String, ProductSales> {
        let mut by_item: BTreeMap<String, ProductSales> = BTreeMap::new();

        for (order, created_at) in revenue_orders(orders) {
            if !self.windows.today.contains(created_at) {
                continue;
            }
            for (item, value) in order.item_values() {
                by_item
                    .entry(item.product_key())
                    .or_insert_with(|| ProductSales {
                        name: item.display_name(),
                        sales: 0.0,
                    })
                    .sales += value;
            }
        }

        by_item
    }

    /// One row per month that has either sales or expenses.
    pub fn monthly_report(
        &self,
        orders: &[PaymentOrder],
        expenses: &[Expense],
    ) -> Vec<MonthlyReportRow> {
        let tz = self.now.timezone();
        let mut months: BTreeMap<String, MonthlyReportRow> = BTreeMap::new();

        for (order, created_at) in revenue_orders(orders) {
            let month = month_key_in(created_at, &tz);
            let row = months
                .entry(month.clone())
                .or_insert_with(|| empty_row(month));
            match row.sales.checked_add(order.total_amount) {
                Some(sales) => {
                    row.sales = sales;
                    row.transactions += 1;
                }
                None => warn!(
                    order = %order.id,
                    month = %row.month,
                    "Monthly sales overflowed, excluding order"
                ),
            }
        }

        for expense in expenses {
            let Some(month) = expense.month_key() else {
                continue;
            };
            let row = months
                .entry(month.to_string())
                .or_insert_with(|| empty_row(month.to_string()));
            match row.expenses.checked_add(expense.amount) {
                Some(total) => row.expenses = total,
                None => warn!(
                    expense = %expense.id,
                    month = %row.month,
                    "Monthly expenses overflowed, excluding expense"
                ),
            }
        }

        let mut rows: Vec<MonthlyReportRow> = months
            .into_values()
            .map(|mut row| {
                row.profit = row.sales.saturating_sub(row.expenses);
                row
            })
            .collect();
        sort_rows(&mut rows, self.monthly_sort);
        rows
    }

    /// Most recent completed orders, newest first.
    pub fn recent_transactions(&self, orders: &[PaymentOrder]) -> Vec<PaymentOrder> {
        let mut recent: Vec<(&PaymentOrder, DateTime<Utc>)> = revenue_orders(orders).collect();
        recent.sort_by(|a, b| b.1.cmp(&a.1));
        recent
            .into_iter()
            .take(self.recent_limit)
            .map(|(order, _)| order.clone())
            .collect()
    }
}

fn revenue_orders(
    orders: &[PaymentOrder],
) -> impl Iterator<Item = (&PaymentOrder, DateTime<Utc>)> + '_ {
    orders
        .iter()
        .filter_map(|order| order.revenue_timestamp().map(|ts| (order, ts)))
}

/// Running sales per report window. An order is added to every window it
/// falls in or to none, so the windows stay consistent with each other.
#[derive(Debug, Default, Clone, Copy)]
struct SalesTotals {
    today: Paise,
    yesterday: Paise,
    week: Paise,
    last_week: Paise,
    month: Paise,
    total: Paise,
}

impl SalesTotals {
    fn with_order(self, w: &ReportWindows, at: DateTime<Utc>, amount: Paise) -> Option<Self> {
        Some(Self {
            today: add_if(self.today, w.today.contains(at), amount)?,
            yesterday: add_if(self.yesterday, w.yesterday.contains(at), amount)?,
            week: add_if(self.week, w.week.contains(at), amount)?,
            last_week: add_if(self.last_week, w.last_week.contains(at), amount)?,
            month: add_if(self.month, w.month.contains(at), amount)?,
            total: self.total.checked_add(amount)?,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ExpenseTotals {
    today: Paise,
    month: Paise,
    total: Paise,
}

impl ExpenseTotals {
    fn with_expense(self, w: &ReportWindows, expense: &Expense) -> Option<Self> {
        let amount = expense.amount;
        Some(Self {
            today: add_if(self.today, expense.day_key() == Some(w.today_key.as_str()), amount)?,
            month: add_if(self.month, expense.month_key() == Some(w.month_key.as_str()), amount)?,
            total: self.total.checked_add(amount)?,
        })
    }
}

fn add_if(sum: Paise, applies: bool, amount: Paise) -> Option<Paise> {
    if applies {
        sum.checked_add(amount)
    } else {
        Some(sum)
    }
}

fn empty_row(month: String) -> MonthlyReportRow {
    MonthlyReportRow {
        month,
        sales: 0,
        transactions: 0,
        expenses: 0,
        profit: 0,
    }
}

/// Largest sales first; equal sales keep key order.
fn sort_by_sales(by_item: &BTreeMap<String, ProductSales>) -> Vec<(String, ProductSales)> {
    let mut entries: Vec<(String, ProductSales)> = by_item
        .iter()
        .map(|(key, sales)| (key.clone(), sales.clone()))
        .collect();
    entries.sort_by(|a, b| b.1.sales.total_cmp(&a.1.sales));
    entries
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::domain::{LineItem, OrderStatus, SortDirection};

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        at(rfc3339).with_timezone(&Utc)
    }

    fn completed(id: &str, amount: Paise, created_at: &str) -> PaymentOrder {
        PaymentOrder::new(id, OrderStatus::Completed, amount).with_created_at(utc(created_at))
    }

    #[test]
    fn test_empty_inputs_give_zeroed_summary() {
        let summary = SalesAggregator::new(at("2024-03-13T12:00:00+00:00")).summarize(&[], &[]);
        assert_eq!(summary.total_sales, 0);
        assert_eq!(summary.total_profit, 0);
        assert!(summary.today_sales_by_item.is_empty());
        assert!(summary.monthly_report.is_empty());
        assert!(summary.recent_transactions.is_empty());
    }

    #[test]
    fn test_sales_windows() {
        // Wednesday 2024-03-13
        let orders = vec![
            completed("today", 100, "2024-03-13T08:00:00+00:00"),
            completed("yesterday", 200, "2024-03-12T23:59:59+00:00"),
            completed("monday", 400, "2024-03-11T00:00:00+00:00"),
            completed("last-sunday", 800, "2024-03-10T12:00:00+00:00"),
            completed("february", 1600, "2024-02-28T12:00:00+00:00"),
        ];

        let summary =
            SalesAggregator::new(at("2024-03-13T12:00:00+00:00")).summarize(&orders, &[]);
        assert_eq!(summary.today_sales, 100);
        assert_eq!(summary.yesterday_sales, 200);
        assert_eq!(summary.week_sales, 700);
        assert_eq!(summary.last_week_sales, 800);
        assert_eq!(summary.month_sales, 1500);
        assert_eq!(summary.total_sales, 3100);
    }

    #[test]
    fn test_non_revenue_orders_are_ignored() {
        let mut undated = PaymentOrder::new("undated", OrderStatus::Completed, 50);
        undated.created_at = None;
        let mut unknown = completed("unknown", 70, "2024-03-13T08:00:00+00:00");
        unknown.status = None;
        let orders = vec![
            PaymentOrder::new("pending", OrderStatus::Pending, 999)
                .with_created_at(utc("2024-03-13T08:00:00+00:00")),
            PaymentOrder::new("failed", OrderStatus::Failed, 999)
                .with_created_at(utc("2024-03-13T08:00:00+00:00")),
            undated,
            unknown,
        ];

        let summary =
            SalesAggregator::new(at("2024-03-13T12:00:00+00:00")).summarize(&orders, &[]);
        assert_eq!(summary.total_sales, 0);
        assert!(summary.recent_transactions.is_empty());
        assert!(summary.monthly_report.is_empty());
    }

    #[test]
    fn test_expense_buckets_use_date_text() {
        let expenses = vec![
            Expense::new("today", "ops", 10, "2024-03-13"),
            Expense::new("month", "ops", 20, "2024-03-01"),
            Expense::new("older", "ops", 40, "2024-02-29"),
            Expense::new("undated", "ops", 80, ""),
        ];

        let summary =
            SalesAggregator::new(at("2024-03-13T23:30:00+05:30")).summarize(&[], &expenses);
        assert_eq!(summary.today_expenses, 10);
        assert_eq!(summary.month_expenses, 30);
        assert_eq!(summary.total_expenses, 150);
        assert_eq!(summary.today_profit, -10);
        assert_eq!(summary.monthly_report.len(), 2);
    }

    #[test]
    fn test_today_breakdown_merges_product_keys() {
        let orders = vec![
            completed("o1", 1000, "2024-03-13T08:00:00+00:00")
                .with_items(vec![LineItem::app("a1", "App One", 1000)]),
            completed("o2", 600, "2024-03-13T09:00:00+00:00").with_items(vec![
                LineItem::app("a1", "App One", 400),
                LineItem::webinar("w1", "Masterclass", 200),
            ]),
            completed("old", 5000, "2024-03-12T09:00:00+00:00")
                .with_items(vec![LineItem::app("a1", "App One", 5000)]),
        ];

        let summary =
            SalesAggregator::new(at("2024-03-13T12:00:00+00:00")).summarize(&orders, &[]);
        assert_eq!(summary.today_sales_by_item.len(), 2);
        assert_eq!(summary.today_sales_by_item["app_a1"].sales, 1400.0);
        assert_eq!(summary.sorted_today_sales_by_item[0].0, "app_a1");
        assert_eq!(summary.sorted_today_sales_by_item[1].0, "webinar_w1");
    }

    #[test]
    fn test_monthly_report_sorted_by_profit_ascending() {
        let orders = vec![
            completed("jan", 5000, "2024-01-10T10:00:00+00:00"),
            completed("feb", 1000, "2024-02-10T10:00:00+00:00"),
        ];
        let expenses = vec![Expense::new("rent", "office", 3000, "2024-01-05")];

        let rows = SalesAggregator::new(at("2024-03-13T12:00:00+00:00"))
            .with_monthly_sort(SortDescriptor::new(
                MonthlySortKey::Profit,
                SortDirection::Ascending,
            ))
            .monthly_report(&orders, &expenses);

        let months: Vec<&str> = rows.iter().map(|r| r.month.as_str()).collect();
        assert_eq!(months, vec!["2024-02", "2024-01"]);
        assert_eq!(rows[1].profit, 2000);
    }

    #[test]
    fn test_recent_transactions_limit_and_order() {
        let orders: Vec<PaymentOrder> = (1..=7)
            .map(|day| {
                completed(
                    &format!("o{day}"),
                    100,
                    &format!("2024-03-0{day}T10:00:00+00:00"),
                )
            })
            .collect();

        let aggregator = SalesAggregator::new(at("2024-03-13T12:00:00+00:00"));
        let recent = aggregator.recent_transactions(&orders);
        let ids: Vec<&str> = recent.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o7", "o6", "o5", "o4", "o3"]);

        let recent = aggregator.with_recent_limit(2).recent_transactions(&orders);
        assert_eq!(recent.len(), 2);
    }
}
