use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Paise;

pub type OrderId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    /// Paid online
    Completed,
    /// Entered by an operator for an offline sale
    CompletedManual,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::CompletedManual => "completed_manual",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "completed" => Some(OrderStatus::Completed),
            "completed_manual" => Some(OrderStatus::CompletedManual),
            "cancelled" => Some(OrderStatus::Cancelled),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }

    /// Only completed sales are realized revenue.
    pub fn counts_as_revenue(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::CompletedManual)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a line item sells. The flags on a stored item are mutually exclusive;
/// an item with neither flag is an app-tier purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    Webinar {
        webinar_date: Option<String>,
    },
    Consultation {
        consultant_name: Option<String>,
        package_id: Option<String>,
    },
    AppTier {
        tier_id: Option<String>,
        tier_name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub app_id: String,
    pub app_name: Option<String>,
    /// Nominal price in paise
    pub price: Paise,
    pub kind: ItemKind,
}

impl LineItem {
    pub fn app(app_id: impl Into<String>, app_name: impl Into<String>, price: Paise) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: Some(app_name.into()),
            price,
            kind: ItemKind::AppTier {
                tier_id: None,
                tier_name: None,
            },
        }
    }

    pub fn webinar(app_id: impl Into<String>, app_name: impl Into<String>, price: Paise) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: Some(app_name.into()),
            price,
            kind: ItemKind::Webinar { webinar_date: None },
        }
    }

    pub fn consultation(
        app_id: impl Into<String>,
        package_id: impl Into<String>,
        consultant_name: impl Into<String>,
        price: Paise,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: None,
            price,
            kind: ItemKind::Consultation {
                consultant_name: Some(consultant_name.into()),
                package_id: Some(package_id.into()),
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Grouping key for per-product breakdowns: `webinar_<id>`,
    /// `package_<id>` or `app_<id>`.
    pub fn product_key(&self) -> String {
        match &self.kind {
            ItemKind::Webinar { .. } => format!("webinar_{}", self.app_id),
            ItemKind::Consultation { package_id, .. } => {
                format!("package_{}", package_id.as_deref().unwrap_or(&self.app_id))
            }
            ItemKind::AppTier { .. } => format!("app_{}", self.app_id),
        }
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = self.app_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match &self.kind {
            ItemKind::Consultation {
                consultant_name: Some(consultant),
                ..
            } if !consultant.is_empty() => consultant.clone(),
            _ => self.product_key(),
        }
    }
}

/// A payment order as stored by the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: OrderId,
    /// `None` when the stored status is missing or unrecognized
    pub status: Option<OrderStatus>,
    /// `None` when the stored timestamp could not be normalized
    pub created_at: Option<DateTime<Utc>>,
    /// Amount actually charged, in paise
    pub total_amount: Paise,
    /// Sum of nominal item prices before any manual override
    pub subtotal: Option<Paise>,
    /// `None` when the stored items field is absent or not a list
    pub items: Option<Vec<LineItem>>,
    pub platform_fee: Option<Paise>,
    pub consultant_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

impl PaymentOrder {
    pub fn new(id: impl Into<OrderId>, status: OrderStatus, total_amount: Paise) -> Self {
        Self {
            id: id.into(),
            status: Some(status),
            created_at: None,
            total_amount,
            subtotal: None,
            items: Some(Vec::new()),
            platform_fee: None,
            consultant_id: None,
            customer_name: None,
            customer_email: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_items(mut self, items: Vec<LineItem>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_subtotal(mut self, subtotal: Paise) -> Self {
        self.subtotal = Some(subtotal);
        self
    }

    pub fn with_consultant(mut self, consultant_id: impl Into<String>, platform_fee: Paise) -> Self {
        self.consultant_id = Some(consultant_id.into());
        self.platform_fee = Some(platform_fee);
        self
    }

    pub fn counts_as_revenue(&self) -> bool {
        self.status.is_some_and(|s| s.counts_as_revenue())
    }

    /// Completed, dated and non-negative: the orders every sales figure is built from.
    pub fn revenue_timestamp(&self) -> Option<DateTime<Utc>> {
        if self.counts_as_revenue() && self.total_amount >= 0 {
            self.created_at
        } else {
            None
        }
    }

    /// `subtotal` when recorded, otherwise the sum of item prices.
    /// `None` when the item prices do not fit in a `Paise` sum.
    pub fn order_subtotal(&self) -> Option<Paise> {
        match self.subtotal {
            Some(subtotal) => Some(subtotal),
            None => self
                .items
                .as_deref()
                .unwrap_or_default()
                .iter()
                .try_fold(0 as Paise, |sum, item| sum.checked_add(item.price)),
        }
    }

    /// Value attributed to each line item.
    ///
    /// When the charged total differs from a positive subtotal, the total is
    /// distributed across items in proportion to their nominal prices.
    /// Otherwise each item keeps its nominal price. A zero subtotal never
    /// pro-rates. An order whose subtotal overflows has no breakdown.
    pub fn item_values(&self) -> Vec<(&LineItem, f64)> {
        let Some(items) = self.items.as_deref() else {
            return Vec::new();
        };
        let Some(subtotal) = self.order_subtotal() else {
            return Vec::new();
        };

        let prorate = subtotal > 0 && self.total_amount != subtotal;

        items
            .iter()
            .map(|item| {
                let value = if prorate {
                    (self.total_amount as i128 * item.price as i128) as f64 / subtotal as f64
                } else {
                    item.price as f64
                };
                (item, value)
            })
            .collect()
    }
}
