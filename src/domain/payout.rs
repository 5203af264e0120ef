use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Paise;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Requested,
    Processing,
    Paid,
    Rejected,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Requested => "requested",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "requested" | "pending" => Some(PayoutStatus::Requested),
            "processing" => Some(PayoutStatus::Processing),
            "paid" | "completed" => Some(PayoutStatus::Paid),
            "rejected" | "failed" => Some(PayoutStatus::Rejected),
            _ => None,
        }
    }

    /// Money already promised to the consultant but not yet settled.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, PayoutStatus::Requested | PayoutStatus::Processing)
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payout to (or payout request from) a consultant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub consultant_id: String,
    pub amount: Paise,
    pub status: PayoutStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Payout {
    pub fn new(
        id: impl Into<String>,
        consultant_id: impl Into<String>,
        amount: Paise,
        status: PayoutStatus,
    ) -> Self {
        Self {
            id: id.into(),
            consultant_id: consultant_id.into(),
            amount,
            status,
            created_at: None,
        }
    }
}
