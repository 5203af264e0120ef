use anyhow::Result;
use chrono::{DateTime, TimeZone};
use std::io::Write;

use crate::application::{
    ConsultantLedgerEntry, DashboardService, MonthlyReportRow, ProductSales, SalesSummary,
};
use crate::domain::{format_paise, Expense, ExpenseSortKey, MonthlySortKey, SortDescriptor};

/// Exporter for writing reports and ledger data in CSV or JSON
pub struct Exporter<'a> {
    service: &'a DashboardService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a DashboardService) -> Self {
        Self { service }
    }

    /// Export the monthly profit-and-loss table to CSV
    pub async fn export_monthly_csv<W: Write, Tz: TimeZone>(
        &self,
        writer: W,
        now: DateTime<Tz>,
        sort: SortDescriptor<MonthlySortKey>,
    ) -> Result<usize> {
        let rows = self.service.monthly_report(now, sort).await?;
        write_monthly_csv(writer, &rows)?;
        Ok(rows.len())
    }

    /// Export today's per-product sales to CSV, largest first
    pub async fn export_today_items_csv<W: Write, Tz: TimeZone>(
        &self,
        writer: W,
        now: DateTime<Tz>,
    ) -> Result<usize> {
        let summary = self
            .service
            .dashboard(now, SortDescriptor::descending(MonthlySortKey::Month))
            .await?;
        write_today_items_csv(writer, &summary.sorted_today_sales_by_item)?;
        Ok(summary.sorted_today_sales_by_item.len())
    }

    /// Export all expenses to CSV, newest first
    pub async fn export_expenses_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let expenses = self
            .service
            .list_expenses(Some(SortDescriptor::descending(ExpenseSortKey::Date)))
            .await?;
        write_expenses_csv(writer, &expenses)?;
        Ok(expenses.len())
    }

    /// Export consultant balances to CSV, highest earnings first
    pub async fn export_consultants_csv<W: Write, Tz: TimeZone>(
        &self,
        writer: W,
        tz: &Tz,
    ) -> Result<usize> {
        let ledger = self.service.consultant_ledger(tz).await?;
        write_consultants_csv(writer, &ledger)?;
        Ok(ledger.len())
    }

    /// Export the full dashboard summary as JSON
    pub async fn export_summary_json<W: Write, Tz: TimeZone>(
        &self,
        mut writer: W,
        now: DateTime<Tz>,
        monthly_sort: SortDescriptor<MonthlySortKey>,
    ) -> Result<SalesSummary> {
        let summary = self.service.dashboard(now, monthly_sort).await?;

        let json = serde_json::to_string_pretty(&summary)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(summary)
    }
}

pub fn write_monthly_csv<W: Write>(writer: W, rows: &[MonthlyReportRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["month", "sales", "transactions", "expenses", "profit"])?;

    for row in rows {
        csv_writer.write_record([
            row.month.clone(),
            format_paise(row.sales),
            row.transactions.to_string(),
            format_paise(row.expenses),
            format_paise(row.profit),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_today_items_csv<W: Write>(writer: W, items: &[(String, ProductSales)]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["product_key", "name", "sales"])?;

    for (key, product) in items {
        csv_writer.write_record([
            key.clone(),
            product.name.clone(),
            format_paise(product.sales.round() as i64),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_expenses_csv<W: Write>(writer: W, expenses: &[Expense]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["id", "date", "description", "category", "amount"])?;

    for expense in expenses {
        csv_writer.write_record([
            expense.id.as_str(),
            expense.date.as_str(),
            expense.description.as_str(),
            expense.category.as_str(),
            format_paise(expense.amount).as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_consultants_csv<W: Write>(
    writer: W,
    ledger: &[ConsultantLedgerEntry],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "consultant_id",
        "name",
        "sales",
        "gross",
        "fees",
        "earnings",
        "paid_out",
        "pending",
        "available",
    ])?;

    for entry in ledger {
        csv_writer.write_record([
            entry.consultant_id.clone(),
            entry.consultant_name.clone().unwrap_or_default(),
            entry.sales_count.to_string(),
            format_paise(entry.gross_sales),
            format_paise(entry.platform_fees),
            format_paise(entry.earnings),
            format_paise(entry.paid_out),
            format_paise(entry.pending_payouts),
            format_paise(entry.available),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
