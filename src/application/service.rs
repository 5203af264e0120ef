use chrono::{DateTime, NaiveDate, TimeZone};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{
    decode_expense, decode_order, decode_payout, encode_expense, sort_rows, Expense,
    ExpenseSortKey, MonthlySortKey, Paise, PaymentOrder, Payout, SortDescriptor,
};
use crate::storage::{Collection, Repository};

use super::{
    consultant_ledger, AppError, ConsultantLedgerEntry, MonthlyReportRow, SalesAggregator,
    SalesSummary,
};

/// Application service for the sales dashboard.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct DashboardService {
    repo: Repository,
}

/// Fields of an expense that can be changed after it was recorded.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Paise>,
    pub date: Option<String>,
}

impl DashboardService {
    /// Create a new dashboard service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Document operations
    // ========================

    /// Store a raw document as received from the storefront.
    pub async fn upsert_document(
        &self,
        collection: Collection,
        id: &str,
        body: &Value,
    ) -> Result<(), AppError> {
        self.repo.upsert_document(collection, id, body).await?;
        Ok(())
    }

    /// Store a batch of raw documents. Returns how many were written.
    pub async fn import_documents(
        &self,
        collection: Collection,
        documents: &[(String, Value)],
    ) -> Result<usize, AppError> {
        for (id, body) in documents {
            self.repo.upsert_document(collection, id, body).await?;
        }
        info!(collection = %collection, count = documents.len(), "Imported documents");
        Ok(documents.len())
    }

    pub async fn document_exists(&self, collection: Collection, id: &str) -> Result<bool, AppError> {
        Ok(self.repo.get_document(collection, id).await?.is_some())
    }

    pub async fn count_documents(&self, collection: Collection) -> Result<i64, AppError> {
        Ok(self.repo.count_documents(collection).await?)
    }

    /// Decode every stored order. Documents that cannot be decoded are
    /// skipped so one bad record never takes the dashboard down.
    pub async fn list_orders<Tz: TimeZone>(&self, tz: &Tz) -> Result<Vec<PaymentOrder>, AppError> {
        let documents = self.repo.list_documents(Collection::Orders).await?;
        let orders: Vec<PaymentOrder> = documents
            .iter()
            .filter_map(|doc| match decode_order(&doc.id, &doc.body, tz) {
                Ok(order) => Some(order),
                Err(e) => {
                    warn!(error = %e, "Skipping order");
                    None
                }
            })
            .collect();
        debug!(stored = documents.len(), decoded = orders.len(), "Loaded orders");
        Ok(orders)
    }

    pub async fn list_payouts<Tz: TimeZone>(&self, tz: &Tz) -> Result<Vec<Payout>, AppError> {
        let documents = self.repo.list_documents(Collection::Payouts).await?;
        Ok(documents
            .iter()
            .filter_map(|doc| match decode_payout(&doc.id, &doc.body, tz) {
                Ok(payout) => Some(payout),
                Err(e) => {
                    warn!(error = %e, "Skipping payout");
                    None
                }
            })
            .collect())
    }

    // ========================
    // Expense operations
    // ========================

    /// Record a new expense.
    pub async fn add_expense(
        &self,
        description: String,
        category: String,
        amount: Paise,
        date: String,
    ) -> Result<Expense, AppError> {
        validate_expense(&description, amount, &date)?;

        let expense = Expense::new(description, category, amount, date);
        self.repo
            .upsert_document(Collection::Expenses, &expense.id, &encode_expense(&expense))
            .await?;

        info!(id = %expense.id, amount = expense.amount, date = %expense.date, "Recorded expense");
        Ok(expense)
    }

    /// Get an expense by ID.
    pub async fn get_expense(&self, id: &str) -> Result<Expense, AppError> {
        let document = self
            .repo
            .get_document(Collection::Expenses, id)
            .await?
            .ok_or_else(|| AppError::ExpenseNotFound(id.to_string()))?;
        Ok(decode_expense(&document.id, &document.body)?)
    }

    /// Change some fields of an existing expense.
    pub async fn update_expense(&self, id: &str, update: ExpenseUpdate) -> Result<Expense, AppError> {
        let mut expense = self.get_expense(id).await?;

        if let Some(description) = update.description {
            expense.description = description;
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        if let Some(amount) = update.amount {
            expense.amount = amount;
        }
        if let Some(date) = update.date {
            expense.date = date;
        }
        validate_expense(&expense.description, expense.amount, &expense.date)?;

        self.repo
            .upsert_document(Collection::Expenses, &expense.id, &encode_expense(&expense))
            .await?;

        info!(id = %expense.id, "Updated expense");
        Ok(expense)
    }

    /// Delete an expense, returning what was removed.
    pub async fn delete_expense(&self, id: &str) -> Result<Expense, AppError> {
        let expense = self.get_expense(id).await?;
        self.repo.delete_document(Collection::Expenses, id).await?;
        info!(id = %id, "Deleted expense");
        Ok(expense)
    }

    /// List expenses, by id unless a sort is given.
    pub async fn list_expenses(
        &self,
        sort: Option<SortDescriptor<ExpenseSortKey>>,
    ) -> Result<Vec<Expense>, AppError> {
        let documents = self.repo.list_documents(Collection::Expenses).await?;
        let mut expenses: Vec<Expense> = documents
            .iter()
            .filter_map(|doc| match decode_expense(&doc.id, &doc.body) {
                Ok(expense) => Some(expense),
                Err(e) => {
                    warn!(error = %e, "Skipping expense");
                    None
                }
            })
            .collect();

        if let Some(sort) = sort {
            sort_rows(&mut expenses, sort);
        }
        Ok(expenses)
    }

    // ========================
    // Reporting
    // ========================

    /// Full dashboard summary over the current snapshot of orders and expenses.
    pub async fn dashboard<Tz: TimeZone>(
        &self,
        now: DateTime<Tz>,
        monthly_sort: SortDescriptor<MonthlySortKey>,
    ) -> Result<SalesSummary, AppError> {
        let tz = now.timezone();
        let orders = self.list_orders(&tz).await?;
        let expenses = self.list_expenses(None).await?;

        Ok(SalesAggregator::new(now)
            .with_monthly_sort(monthly_sort)
            .summarize(&orders, &expenses))
    }

    /// Monthly profit-and-loss rows only.
    pub async fn monthly_report<Tz: TimeZone>(
        &self,
        now: DateTime<Tz>,
        sort: SortDescriptor<MonthlySortKey>,
    ) -> Result<Vec<MonthlyReportRow>, AppError> {
        let tz = now.timezone();
        let orders = self.list_orders(&tz).await?;
        let expenses = self.list_expenses(None).await?;

        Ok(SalesAggregator::new(now)
            .with_monthly_sort(sort)
            .monthly_report(&orders, &expenses))
    }

    /// Earnings and payout balances per consultant.
    pub async fn consultant_ledger<Tz: TimeZone>(
        &self,
        tz: &Tz,
    ) -> Result<Vec<ConsultantLedgerEntry>, AppError> {
        let orders = self.list_orders(tz).await?;
        let payouts = self.list_payouts(tz).await?;
        Ok(consultant_ledger(&orders, &payouts))
    }
}

/// Check the fields an expense must satisfy before it is stored.
pub fn validate_expense(description: &str, amount: Paise, date: &str) -> Result<(), AppError> {
    if description.trim().is_empty() {
        return Err(AppError::EmptyDescription);
    }
    if amount <= 0 {
        return Err(AppError::InvalidAmount(amount));
    }
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() || date.len() != 10 {
        return Err(AppError::InvalidDate(date.to_string()));
    }
    Ok(())
}
