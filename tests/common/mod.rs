// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use salesdesk::application::DashboardService;
use salesdesk::storage::Collection;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(DashboardService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = DashboardService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Indian Standard Time, the storefront's home zone
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
}

/// Helper to parse an RFC 3339 instant, keeping its offset
pub fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

/// Helper to parse an RFC 3339 instant into UTC
pub fn utc(rfc3339: &str) -> DateTime<Utc> {
    at(rfc3339).with_timezone(&Utc)
}

/// A store document for a completed single-app order
pub fn app_order_doc(status: &str, created_at: &str, total: i64, app_id: &str, name: &str) -> Value {
    json!({
        "status": status,
        "createdAt": created_at,
        "totalAmount": total,
        "items": [{"appId": app_id, "appName": name, "price": total}]
    })
}

/// Seed orders into the store
pub async fn seed_orders(service: &DashboardService, orders: Vec<(&str, Value)>) -> Result<()> {
    let documents: Vec<(String, Value)> = orders
        .into_iter()
        .map(|(id, body)| (id.to_string(), body))
        .collect();
    service
        .import_documents(Collection::Orders, &documents)
        .await?;
    Ok(())
}
