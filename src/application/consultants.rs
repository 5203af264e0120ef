use std::collections::HashMap;

use tracing::warn;

use crate::domain::{ItemKind, PaymentOrder, Payout, PayoutStatus};

use super::reporting::ConsultantLedgerEntry;

/// Build per-consultant earnings from completed consultant-attributed orders
/// and the payouts recorded against them.
///
/// Earnings are gross sales minus the platform fee. Paid payouts reduce the
/// available balance, as do requests still being processed; rejected
/// requests are ignored.
pub fn consultant_ledger(orders: &[PaymentOrder], payouts: &[Payout]) -> Vec<ConsultantLedgerEntry> {
    let mut ledger: HashMap<String, ConsultantLedgerEntry> = HashMap::new();

    for order in orders {
        if order.revenue_timestamp().is_none() {
            continue;
        }
        let Some(consultant_id) = order.consultant_id.as_deref() else {
            continue;
        };

        let entry = ledger
            .entry(consultant_id.to_string())
            .or_insert_with(|| empty_entry(consultant_id));
        let fee = order.platform_fee.unwrap_or(0);
        let (Some(gross_sales), Some(platform_fees)) = (
            entry.gross_sales.checked_add(order.total_amount),
            entry.platform_fees.checked_add(fee),
        ) else {
            warn!(order = %order.id, consultant = consultant_id, "Consultant sales overflowed, excluding order");
            continue;
        };
        entry.sales_count += 1;
        entry.gross_sales = gross_sales;
        entry.platform_fees = platform_fees;
        if entry.consultant_name.is_none() {
            entry.consultant_name = consultant_name(order);
        }
    }

    for payout in payouts {
        let entry = ledger
            .entry(payout.consultant_id.clone())
            .or_insert_with(|| empty_entry(&payout.consultant_id));
        let balance = if payout.status == PayoutStatus::Paid {
            &mut entry.paid_out
        } else if payout.status.is_outstanding() {
            &mut entry.pending_payouts
        } else {
            continue;
        };
        match balance.checked_add(payout.amount) {
            Some(total) => *balance = total,
            None => warn!(payout = %payout.id, "Consultant payouts overflowed, excluding payout"),
        }
    }

    let mut entries: Vec<ConsultantLedgerEntry> = ledger
        .into_values()
        .map(|mut entry| {
            entry.earnings = entry.gross_sales.saturating_sub(entry.platform_fees);
            entry.available = entry
                .earnings
                .saturating_sub(entry.paid_out)
                .saturating_sub(entry.pending_payouts);
            entry
        })
        .collect();

    entries.sort_by(|a, b| {
        b.earnings
            .cmp(&a.earnings)
            .then_with(|| a.consultant_id.cmp(&b.consultant_id))
    });
    entries
}

fn consultant_name(order: &PaymentOrder) -> Option<String> {
    order.items.as_deref()?.iter().find_map(|item| match &item.kind {
        ItemKind::Consultation {
            consultant_name, ..
        } => consultant_name.clone(),
        _ => None,
    })
}

fn empty_entry(consultant_id: &str) -> ConsultantLedgerEntry {
    ConsultantLedgerEntry {
        consultant_id: consultant_id.to_string(),
        consultant_name: None,
        sales_count: 0,
        gross_sales: 0,
        platform_fees: 0,
        earnings: 0,
        paid_out: 0,
        pending_payouts: 0,
        available: 0,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{LineItem, OrderStatus};

    fn consultation_order(id: &str, consultant: &str, total: i64, fee: i64) -> PaymentOrder {
        PaymentOrder::new(id, OrderStatus::Completed, total)
            .with_created_at(Utc::now())
            .with_consultant(consultant, fee)
            .with_items(vec![LineItem::consultation("k1", "p1", "Dr. Rao", total)])
    }

    #[test]
    fn test_earnings_and_balance() {
        let orders = vec![
            consultation_order("o1", "c1", 10000, 2000),
            consultation_order("o2", "c1", 5000, 1000),
        ];
        let payouts = vec![
            Payout::new("p1", "c1", 4000, PayoutStatus::Paid),
            Payout::new("p2", "c1", 3000, PayoutStatus::Requested),
            Payout::new("p3", "c1", 9999, PayoutStatus::Rejected),
        ];

        let ledger = consultant_ledger(&orders, &payouts);
        assert_eq!(ledger.len(), 1);
        let entry = &ledger[0];
        assert_eq!(entry.consultant_name.as_deref(), Some("Dr. Rao"));
        assert_eq!(entry.sales_count, 2);
        assert_eq!(entry.gross_sales, 15000);
        assert_eq!(entry.platform_fees, 3000);
        assert_eq!(entry.earnings, 12000);
        assert_eq!(entry.paid_out, 4000);
        assert_eq!(entry.pending_payouts, 3000);
        assert_eq!(entry.available, 5000);
    }

    #[test]
    fn test_pending_orders_do_not_earn() {
        let mut order = consultation_order("o1", "c1", 10000, 2000);
        order.status = Some(OrderStatus::Pending);
        assert!(consultant_ledger(&[order], &[]).is_empty());
    }

    #[test]
    fn test_sorted_by_earnings() {
        let orders = vec![
            consultation_order("o1", "small", 1000, 0),
            consultation_order("o2", "large", 9000, 0),
        ];
        let ledger = consultant_ledger(&orders, &[]);
        assert_eq!(ledger[0].consultant_id, "large");
        assert_eq!(ledger[1].consultant_id, "small");
    }

    #[test]
    fn test_overflowing_records_are_excluded() {
        let orders = vec![
            consultation_order("o1", "c1", 5_000_000_000_000_000_000, 0),
            consultation_order("o2", "c1", 5_000_000_000_000_000_000, 0),
        ];
        let payouts = vec![
            Payout::new("p1", "c1", i64::MAX, PayoutStatus::Requested),
            Payout::new("p2", "c1", 1, PayoutStatus::Processing),
        ];

        let ledger = consultant_ledger(&orders, &payouts);
        let entry = &ledger[0];
        assert_eq!(entry.sales_count, 1);
        assert_eq!(entry.gross_sales, 5_000_000_000_000_000_000);
        assert_eq!(entry.pending_payouts, i64::MAX);
        assert_eq!(entry.available, 5_000_000_000_000_000_000 - i64::MAX);
    }
}
