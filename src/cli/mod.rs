use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use clap::{Parser, Subcommand};
use std::fmt::Display;
use std::io::stdout;

use crate::application::{DashboardService, ExpenseUpdate, SalesSummary};
use crate::domain::{
    parse_paise, CurrencyFormat, ExpenseSortKey, MonthlySortKey, SortDescriptor, SortDirection,
};
use crate::io::{
    write_consultants_csv, write_expenses_csv, write_monthly_csv, write_today_items_csv,
};
use crate::storage::Collection;

/// salesdesk - Storefront sales reporting
#[derive(Parser)]
#[command(name = "salesdesk")]
#[command(about = "Sales, expense and payout reporting over exported storefront documents")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "salesdesk.db", env = "SALESDESK_DB")]
    pub database: String,

    /// Currency used for display: INR, USD, EUR, GBP
    #[arg(long, default_value = "INR", env = "SALESDESK_CURRENCY", global = true)]
    pub currency: String,

    /// Report as of this instant (RFC 3339) instead of the current time.
    /// Days, weeks and months then follow the offset given here.
    #[arg(long, global = true)]
    pub at: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Import exported documents
    Import {
        /// What to import: orders, expenses, payouts
        import_type: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Format: json, csv (csv is only supported for expenses)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Keep already stored documents instead of replacing them
        #[arg(long)]
        skip_existing: bool,

        /// Validate without importing
        #[arg(long)]
        validate: bool,
    },

    /// Expense ledger commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Generate reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export reports to CSV or JSON
    Export {
        /// What to export: monthly, today, expenses, consultants, summary
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Amount (e.g., "1500.00" or "1500")
        amount: String,

        /// What the money was spent on
        #[arg(short, long)]
        description: String,

        /// Category tag (e.g., "marketing", "software")
        #[arg(short, long, default_value = "general")]
        category: String,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List expenses
    List {
        /// Sort column: date, description, category, amount
        #[arg(long, default_value = "date")]
        sort: String,

        /// Sort direction: asc, desc
        #[arg(long, default_value = "desc")]
        direction: String,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Change an expense
    Update {
        /// Expense ID
        id: String,

        #[arg(long)]
        amount: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Sales, expenses and profit for today, this week, this month and overall
    Dashboard {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Monthly profit and loss
    Monthly {
        /// Sort column: month, sales, transactions, expenses, profit
        #[arg(long, default_value = "month")]
        sort: String,

        /// Sort direction: asc, desc
        #[arg(long, default_value = "desc")]
        direction: String,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Today's sales by product
    Today {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Most recent completed orders
    Recent {
        /// Number of orders to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Consultant earnings and payout balances
    Consultants {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let currency = CurrencyFormat::from_code(&self.currency).with_context(|| {
            format!(
                "Unknown currency '{}'. Valid: INR, USD, EUR, GBP",
                self.currency
            )
        })?;

        let at = report_instant(self.at.as_deref())?;
        match at {
            Some(now) => self.execute(currency, now).await,
            None => self.execute(currency, Local::now()).await,
        }
    }

    async fn execute<Tz>(self, currency: CurrencyFormat, now: DateTime<Tz>) -> Result<()>
    where
        Tz: TimeZone,
        Tz::Offset: Copy + Display,
    {
        match self.command {
            Commands::Init => {
                DashboardService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Import {
                import_type,
                input,
                format,
                dry_run,
                skip_existing,
                validate,
            } => {
                let service = DashboardService::connect(&self.database).await?;
                run_import_command(
                    &service,
                    &import_type,
                    input.as_deref(),
                    &format,
                    dry_run,
                    skip_existing,
                    validate,
                )
                .await?;
            }

            Commands::Expense(expense_cmd) => {
                let service = DashboardService::connect(&self.database).await?;
                run_expense_command(&service, expense_cmd, &currency, now).await?;
            }

            Commands::Report(report_cmd) => {
                let service = DashboardService::connect(&self.database).await?;
                run_report_command(&service, report_cmd, &currency, now).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = DashboardService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref(), now).await?;
            }
        }

        Ok(())
    }
}

fn report_instant(at: Option<&str>) -> Result<Option<DateTime<FixedOffset>>> {
    at.map(|s| {
        DateTime::parse_from_rfc3339(s).with_context(|| {
            format!("Invalid --at '{}'. Use RFC 3339, e.g. 2024-03-01T12:00:00+05:30", s)
        })
    })
    .transpose()
}

async fn run_import_command(
    service: &DashboardService,
    import_type: &str,
    input: Option<&str>,
    format: &str,
    dry_run: bool,
    skip_existing: bool,
    validate: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{stdin, Read};

    let collection = Collection::from_str(import_type).with_context(|| {
        format!(
            "Invalid import type '{}'. Valid types: orders, expenses, payouts",
            import_type
        )
    })?;

    let importer = Importer::new(service);

    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        skip_existing,
        validate_only: validate,
    };

    let result = match (collection, format) {
        (_, "json") => {
            importer
                .import_documents_json(reader, collection, options)
                .await?
        }
        (Collection::Expenses, "csv") => importer.import_expenses_csv(reader, options).await?,
        _ => {
            anyhow::bail!(
                "Unsupported format '{}' for {}. Use json (or csv for expenses)",
                format,
                collection
            );
        }
    };

    // Display results
    if validate || dry_run {
        println!("Validation successful");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}: {}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("{}: ", f))
                    .unwrap_or_default()
                    + &error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

async fn run_expense_command<Tz>(
    service: &DashboardService,
    cmd: ExpenseCommands,
    currency: &CurrencyFormat,
    now: DateTime<Tz>,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Copy + Display,
{
    match cmd {
        ExpenseCommands::Add {
            amount,
            description,
            category,
            date,
        } => {
            let amount =
                parse_paise(&amount).context("Invalid amount format. Use '1500.00' or '1500'")?;
            let date = match date {
                Some(date) => check_date(&date)?,
                None => now.date_naive().format("%Y-%m-%d").to_string(),
            };

            let expense = service
                .add_expense(description, category, amount, date)
                .await?;
            println!(
                "Recorded expense: {} on {} [{}] ({})",
                currency.format(expense.amount),
                expense.date,
                expense.category,
                expense.id
            );
        }

        ExpenseCommands::List {
            sort,
            direction,
            format,
        } => {
            let key = ExpenseSortKey::from_str(&sort).with_context(|| {
                format!(
                    "Invalid sort '{}'. Valid: date, description, category, amount",
                    sort
                )
            })?;
            let expenses = service
                .list_expenses(Some(SortDescriptor::new(key, parse_direction(&direction)?)))
                .await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&expenses)?),
                "csv" => write_expenses_csv(stdout(), &expenses)?,
                _ => {
                    if expenses.is_empty() {
                        println!("No expenses found.");
                        return Ok(());
                    }
                    println!(
                        "{:<36} {:<10} {:<24} {:<14} {:>14}",
                        "ID", "DATE", "DESCRIPTION", "CATEGORY", "AMOUNT"
                    );
                    println!("{}", "-".repeat(102));
                    for e in &expenses {
                        println!(
                            "{:<36} {:<10} {:<24} {:<14} {:>14}",
                            e.id,
                            e.date,
                            truncate(&e.description, 24),
                            truncate(&e.category, 14),
                            currency.format(e.amount)
                        );
                    }
                    println!("{}", "-".repeat(102));
                    let total: i64 = expenses.iter().map(|e| e.amount).sum();
                    println!("{:<88} {:>14}", "TOTAL", currency.format(total));
                }
            }
        }

        ExpenseCommands::Update {
            id,
            amount,
            description,
            category,
            date,
        } => {
            let update = ExpenseUpdate {
                description,
                category,
                amount: amount
                    .map(|a| parse_paise(&a))
                    .transpose()
                    .context("Invalid amount format")?,
                date: date.map(|d| check_date(&d)).transpose()?,
            };
            let expense = service.update_expense(&id, update).await?;
            println!(
                "Updated expense {}: {} on {} [{}]",
                expense.id,
                currency.format(expense.amount),
                expense.date,
                expense.category
            );
        }

        ExpenseCommands::Delete { id } => {
            let expense = service.delete_expense(&id).await?;
            println!(
                "Deleted expense: {} ({})",
                expense.description,
                currency.format(expense.amount)
            );
        }
    }

    Ok(())
}

async fn run_report_command<Tz>(
    service: &DashboardService,
    cmd: ReportCommands,
    currency: &CurrencyFormat,
    now: DateTime<Tz>,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Copy + Display,
{
    match cmd {
        ReportCommands::Dashboard { format } => {
            let summary = service
                .dashboard(now, SortDescriptor::descending(MonthlySortKey::Month))
                .await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
                _ => print_dashboard(&summary, currency, now),
            }
        }

        ReportCommands::Monthly {
            sort,
            direction,
            format,
        } => {
            let key = MonthlySortKey::from_str(&sort).with_context(|| {
                format!(
                    "Invalid sort '{}'. Valid: month, sales, transactions, expenses, profit",
                    sort
                )
            })?;
            let rows = service
                .monthly_report(now, SortDescriptor::new(key, parse_direction(&direction)?))
                .await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
                "csv" => write_monthly_csv(stdout(), &rows)?,
                _ => {
                    println!("Monthly Report");
                    println!();
                    println!(
                        "{:<8} {:>16} {:>6} {:>16} {:>16}",
                        "MONTH", "SALES", "TXNS", "EXPENSES", "PROFIT"
                    );
                    println!("{}", "-".repeat(66));
                    for row in &rows {
                        println!(
                            "{:<8} {:>16} {:>6} {:>16} {:>16}",
                            row.month,
                            currency.format(row.sales),
                            row.transactions,
                            currency.format(row.expenses),
                            currency.format(row.profit)
                        );
                    }
                }
            }
        }

        ReportCommands::Today { format } => {
            let summary = service
                .dashboard(now, SortDescriptor::descending(MonthlySortKey::Month))
                .await?;

            match format.as_str() {
                "json" => println!(
                    "{}",
                    serde_json::to_string_pretty(&summary.sorted_today_sales_by_item)?
                ),
                "csv" => write_today_items_csv(stdout(), &summary.sorted_today_sales_by_item)?,
                _ => {
                    println!("Today's Sales by Product ({})", now.format("%Y-%m-%d"));
                    println!();
                    if summary.sorted_today_sales_by_item.is_empty() {
                        println!("No sales today.");
                        return Ok(());
                    }
                    for (_, product) in &summary.sorted_today_sales_by_item {
                        println!(
                            "{:<32} {:>16}",
                            truncate(&product.name, 32),
                            currency.format_fractional(product.sales)
                        );
                    }
                    println!("{}", "-".repeat(49));
                    println!("{:<32} {:>16}", "TOTAL", currency.format(summary.today_sales));
                }
            }
        }

        ReportCommands::Recent { limit } => {
            use crate::application::SalesAggregator;

            let orders = service.list_orders(&now.timezone()).await?;
            let recent = SalesAggregator::new(now)
                .with_recent_limit(limit)
                .recent_transactions(&orders);

            if recent.is_empty() {
                println!("No completed orders.");
                return Ok(());
            }
            println!(
                "{:<16} {:<20} {:<24} {:>16}",
                "DATE", "STATUS", "CUSTOMER", "AMOUNT"
            );
            println!("{}", "-".repeat(79));
            for order in &recent {
                let date = order
                    .created_at
                    .map(|ts| ts.with_timezone(&now.timezone()).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{:<16} {:<20} {:<24} {:>16}",
                    date,
                    order.status.map(|s| s.as_str()).unwrap_or("-"),
                    truncate(order.customer_name.as_deref().unwrap_or("-"), 24),
                    currency.format(order.total_amount)
                );
            }
        }

        ReportCommands::Consultants { format } => {
            let ledger = service.consultant_ledger(&now.timezone()).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&ledger)?),
                "csv" => write_consultants_csv(stdout(), &ledger)?,
                _ => {
                    if ledger.is_empty() {
                        println!("No consultant sales found.");
                        return Ok(());
                    }
                    println!(
                        "{:<24} {:>6} {:>16} {:>16} {:>16} {:>16}",
                        "CONSULTANT", "SALES", "EARNINGS", "PAID", "PENDING", "AVAILABLE"
                    );
                    println!("{}", "-".repeat(99));
                    for entry in &ledger {
                        let name = entry
                            .consultant_name
                            .as_deref()
                            .unwrap_or(&entry.consultant_id);
                        println!(
                            "{:<24} {:>6} {:>16} {:>16} {:>16} {:>16}",
                            truncate(name, 24),
                            entry.sales_count,
                            currency.format(entry.earnings),
                            currency.format(entry.paid_out),
                            currency.format(entry.pending_payouts),
                            currency.format(entry.available)
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_dashboard<Tz>(summary: &SalesSummary, currency: &CurrencyFormat, now: DateTime<Tz>)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    println!("Sales Dashboard");
    println!("As of: {}", now.format("%Y-%m-%d %H:%M"));
    println!();
    println!("{:<12} {:>16} {:>16} {:>16}", "", "SALES", "EXPENSES", "PROFIT");
    println!("{}", "-".repeat(63));
    println!(
        "{:<12} {:>16} {:>16} {:>16}",
        "Today",
        currency.format(summary.today_sales),
        currency.format(summary.today_expenses),
        currency.format(summary.today_profit)
    );
    println!(
        "{:<12} {:>16}",
        "Yesterday",
        currency.format(summary.yesterday_sales)
    );
    println!("{:<12} {:>16}", "This week", currency.format(summary.week_sales));
    println!(
        "{:<12} {:>16}",
        "Last week",
        currency.format(summary.last_week_sales)
    );
    println!(
        "{:<12} {:>16} {:>16} {:>16}",
        "This month",
        currency.format(summary.month_sales),
        currency.format(summary.month_expenses),
        currency.format(summary.month_profit)
    );
    println!(
        "{:<12} {:>16} {:>16} {:>16}",
        "All time",
        currency.format(summary.total_sales),
        currency.format(summary.total_expenses),
        currency.format(summary.total_profit)
    );

    if !summary.sorted_today_sales_by_item.is_empty() {
        println!();
        println!("Top products today:");
        for (i, (_, product)) in summary.sorted_today_sales_by_item.iter().take(10).enumerate() {
            println!(
                "  {}. {:<28} {:>16}",
                i + 1,
                truncate(&product.name, 28),
                currency.format_fractional(product.sales)
            );
        }
    }
}

async fn run_export_command<Tz>(
    service: &DashboardService,
    export_type: &str,
    output: Option<&str>,
    now: DateTime<Tz>,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::Write;

    let exporter = Exporter::new(service);
    let monthly_sort = SortDescriptor::descending(MonthlySortKey::Month);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "monthly" => {
            let count = exporter.export_monthly_csv(writer, now, monthly_sort).await?;
            if output.is_some() {
                eprintln!("Exported {} months", count);
            }
        }
        "today" => {
            let count = exporter.export_today_items_csv(writer, now).await?;
            if output.is_some() {
                eprintln!("Exported {} products", count);
            }
        }
        "expenses" => {
            let count = exporter.export_expenses_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        "consultants" => {
            let count = exporter
                .export_consultants_csv(writer, &now.timezone())
                .await?;
            if output.is_some() {
                eprintln!("Exported {} consultants", count);
            }
        }
        "summary" => {
            let summary = exporter.export_summary_json(writer, now, monthly_sort).await?;
            if output.is_some() {
                eprintln!(
                    "Exported summary: {} months, {} recent orders",
                    summary.monthly_report.len(),
                    summary.recent_transactions.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: monthly, today, expenses, consultants, summary",
                export_type
            );
        }
    }

    Ok(())
}

fn parse_direction(direction: &str) -> Result<SortDirection> {
    SortDirection::from_str(direction)
        .with_context(|| format!("Invalid direction '{}'. Valid: asc, desc", direction))
}

fn check_date(date_str: &str) -> Result<String> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))?;
    Ok(date_str.to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::SalesAggregator;

    #[test]
    fn test_at_keeps_its_offset() {
        let now = report_instant(Some("2024-03-01T01:00:00+05:30"))
            .unwrap()
            .unwrap();
        assert_eq!(now.offset().local_minus_utc(), 5 * 3600 + 1800);

        // Still 2024-02-29 in UTC
        let windows = SalesAggregator::new(now).windows().clone();
        assert_eq!(windows.today_key, "2024-03-01");
        assert_eq!(windows.month_key, "2024-03");
    }

    #[test]
    fn test_at_is_optional_and_validated() {
        assert!(report_instant(None).unwrap().is_none());
        assert!(report_instant(Some("2024-03-01")).is_err());
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("₹₹₹₹₹", 5), "₹₹₹₹₹");
        assert_eq!(truncate("Masterclass", 8), "Maste...");
    }
}
