use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use tracing::info;
use uuid::Uuid;

use crate::application::{validate_expense, DashboardService};
use crate::domain::{decode_expense, decode_order, decode_payout, parse_paise};
use crate::storage::Collection;

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    /// CSV line, or 1-based position in a JSON array
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    /// Keep documents that are already stored instead of replacing them
    pub skip_existing: bool,
    pub validate_only: bool,
}

#[derive(Debug, Deserialize)]
struct ExpenseCsvRecord {
    date: String,
    description: String,
    #[serde(default)]
    category: String,
    amount: String,
}

/// Importer for loading exported store documents
pub struct Importer<'a> {
    service: &'a DashboardService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a DashboardService) -> Self {
        Self { service }
    }

    /// Import documents from a JSON export: either an array of objects
    /// (each with an optional `id`) or an object mapping id -> document.
    pub async fn import_documents_json<R: Read>(
        &self,
        reader: R,
        collection: Collection,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let root: Value = serde_json::from_reader(reader).context("Invalid JSON input")?;
        let documents = split_documents(root)?;

        let mut imported = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for (index, (id, body)) in documents.into_iter().enumerate() {
            let line = index + 1;

            if let Err(e) = check_document(collection, &id, &body) {
                errors.push(ImportError {
                    line,
                    field: None,
                    error: e,
                });
                continue;
            }

            if options.skip_existing && self.service.document_exists(collection, &id).await? {
                skipped += 1;
                continue;
            }

            // Skip actual import if dry run or validate only
            if options.dry_run || options.validate_only {
                imported += 1;
                continue;
            }

            self.service.upsert_document(collection, &id, &body).await?;
            imported += 1;
        }

        info!(collection = %collection, imported, skipped, errors = errors.len(), "JSON import finished");
        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }

    /// Import expenses from CSV with the header `date,description,category,amount`.
    /// Amounts are in major units ("1250.50").
    pub async fn import_expenses_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut imported = 0;
        let skipped = 0;
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.deserialize::<ExpenseCsvRecord>().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let amount = match parse_paise(&record.amount) {
                Ok(a) => a,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Invalid amount: {}", e),
                    });
                    continue;
                }
            };

            let category = if record.category.trim().is_empty() {
                "uncategorized".to_string()
            } else {
                record.category.trim().to_string()
            };
            let date = record.date.trim().to_string();

            if let Err(e) = validate_expense(&record.description, amount, &date) {
                errors.push(ImportError {
                    line,
                    field: None,
                    error: e.to_string(),
                });
                continue;
            }

            if options.dry_run || options.validate_only {
                imported += 1;
                continue;
            }

            match self
                .service
                .add_expense(record.description, category, amount, date)
                .await
            {
                Ok(_) => imported += 1,
                Err(e) => errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("Expense creation failed: {}", e),
                }),
            }
        }

        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }
}

fn split_documents(root: Value) -> Result<Vec<(String, Value)>> {
    match root {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| {
                let id = item
                    .get("id")
                    .and_then(|id| match id {
                        Value::String(s) if !s.is_empty() => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                (id, item)
            })
            .collect()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => anyhow::bail!("Expected a JSON array or object of documents"),
    }
}

/// Reject documents the dashboard could never use. The time zone does not
/// affect whether a document decodes, so UTC is used for the check.
fn check_document(collection: Collection, id: &str, body: &Value) -> Result<(), String> {
    let result = match collection {
        Collection::Orders => decode_order(id, body, &Utc).map(|_| ()),
        Collection::Expenses => decode_expense(id, body).map(|_| ()),
        Collection::Payouts => decode_payout(id, body, &Utc).map(|_| ()),
    };
    result.map_err(|e| e.to_string())
}
