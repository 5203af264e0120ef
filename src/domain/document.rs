//! Decoding of raw store documents into domain records.
//!
//! Every shape ambiguity of the stored documents (timestamp representations,
//! float-encoded integers, missing or mistyped fields) is resolved here, so the
//! rest of the crate only ever sees normalized records.

use chrono::TimeZone;
use serde_json::{Map, Value};
use thiserror::Error;

use super::timestamp::{as_whole_number, normalize_timestamp};
use super::{
    Expense, ItemKind, LineItem, OrderStatus, Paise, PaymentOrder, Payout, PayoutStatus,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("document {0} is not an object")]
    NotAnObject(String),

    #[error("document {id}: field '{field}' is missing or not a whole number")]
    InvalidAmount { id: String, field: &'static str },

    #[error("document {id}: field '{field}' is negative ({value})")]
    NegativeAmount {
        id: String,
        field: &'static str,
        value: Paise,
    },

    #[error("document {id}: field '{field}' is missing")]
    MissingField { id: String, field: &'static str },

    #[error("document {id}: unknown payout status '{status}'")]
    UnknownPayoutStatus { id: String, status: String },
}

/// Decode a payment order. Only the charged amount is mandatory; a bad
/// timestamp or item list degrades to `None` instead of rejecting the order.
pub fn decode_order<Tz: TimeZone>(
    id: &str,
    body: &Value,
    tz: &Tz,
) -> Result<PaymentOrder, DecodeError> {
    let doc = as_object(id, body)?;
    let total_amount = required_amount(id, doc, "totalAmount")?;

    let items = doc.get("items").and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_object)
            .map(decode_item)
            .collect()
    });

    Ok(PaymentOrder {
        id: id.to_string(),
        status: text(doc, "status").and_then(|s| OrderStatus::from_str(&s)),
        created_at: doc
            .get("createdAt")
            .and_then(|value| normalize_timestamp(value, tz)),
        total_amount,
        subtotal: optional_amount(doc, "subtotal"),
        items,
        platform_fee: optional_amount(doc, "platformFee"),
        consultant_id: text(doc, "consultantId"),
        customer_name: text(doc, "customerName").or_else(|| text(doc, "userName")),
        customer_email: text(doc, "customerEmail").or_else(|| text(doc, "userEmail")),
    })
}

fn decode_item(item: &Map<String, Value>) -> LineItem {
    let kind = if flag(item, "isWebinar") {
        ItemKind::Webinar {
            webinar_date: text(item, "webinarDate"),
        }
    } else if flag(item, "isConsultation") {
        ItemKind::Consultation {
            consultant_name: text(item, "consultantName"),
            package_id: text(item, "packageId"),
        }
    } else {
        ItemKind::AppTier {
            tier_id: text(item, "tierId"),
            tier_name: text(item, "tierName"),
        }
    };

    LineItem {
        app_id: text(item, "appId").unwrap_or_default(),
        app_name: text(item, "appName"),
        // Unusable prices (non-numeric or negative) contribute nothing
        price: item
            .get("price")
            .and_then(as_whole_number)
            .filter(|price| *price >= 0)
            .unwrap_or(0),
        kind,
    }
}

/// Decode a ledger expense. The amount is mandatory; the date is kept verbatim.
pub fn decode_expense(id: &str, body: &Value) -> Result<Expense, DecodeError> {
    let doc = as_object(id, body)?;
    let amount = required_amount(id, doc, "amount")?;

    Ok(Expense {
        id: id.to_string(),
        description: text(doc, "description").unwrap_or_default(),
        category: text(doc, "category").unwrap_or_else(|| "uncategorized".to_string()),
        amount,
        date: text(doc, "date").unwrap_or_default(),
    })
}

pub fn decode_payout<Tz: TimeZone>(id: &str, body: &Value, tz: &Tz) -> Result<Payout, DecodeError> {
    let doc = as_object(id, body)?;
    let amount = required_amount(id, doc, "amount")?;
    let consultant_id = text(doc, "consultantId").ok_or_else(|| DecodeError::MissingField {
        id: id.to_string(),
        field: "consultantId",
    })?;
    let status_text = text(doc, "status").unwrap_or_else(|| "requested".to_string());
    let status =
        PayoutStatus::from_str(&status_text).ok_or_else(|| DecodeError::UnknownPayoutStatus {
            id: id.to_string(),
            status: status_text.clone(),
        })?;

    Ok(Payout {
        id: id.to_string(),
        consultant_id,
        amount,
        status,
        created_at: doc
            .get("createdAt")
            .and_then(|value| normalize_timestamp(value, tz)),
    })
}

/// Store representation of an expense.
pub fn encode_expense(expense: &Expense) -> Value {
    serde_json::json!({
        "description": expense.description,
        "category": expense.category,
        "amount": expense.amount,
        "date": expense.date,
    })
}

fn as_object<'a>(id: &str, body: &'a Value) -> Result<&'a Map<String, Value>, DecodeError> {
    body.as_object()
        .ok_or_else(|| DecodeError::NotAnObject(id.to_string()))
}

fn required_amount(
    id: &str,
    doc: &Map<String, Value>,
    field: &'static str,
) -> Result<Paise, DecodeError> {
    let value = doc
        .get(field)
        .and_then(as_whole_number)
        .ok_or_else(|| DecodeError::InvalidAmount {
            id: id.to_string(),
            field,
        })?;
    if value < 0 {
        return Err(DecodeError::NegativeAmount {
            id: id.to_string(),
            field,
            value,
        });
    }
    Ok(value)
}

fn optional_amount(doc: &Map<String, Value>, field: &str) -> Option<Paise> {
    doc.get(field).and_then(as_whole_number)
}

fn text(doc: &Map<String, Value>, field: &str) -> Option<String> {
    match doc.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(doc: &Map<String, Value>, field: &str) -> bool {
    doc.get(field).and_then(Value::as_bool).unwrap_or(false)
}
