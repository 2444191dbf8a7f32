use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::{Order, OrderStatus};

/// How many of the most recent orders the stats scan covers.
pub const STATS_SCAN_LIMIT: usize = 1000;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    pub ordered: usize,
    pub confirmed: usize,
    pub processing: usize,
    pub delivering: usize,
    pub delivered: usize,
    pub cancelled: usize,
    /// Sum of totals over orders that are not cancelled.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    /// Orders created on `today` (UTC).
    pub today_orders: usize,
}

impl OrderStats {
    pub fn tally(orders: &[Order], today: NaiveDate) -> Self {
        orders.iter().fold(Self::default(), |mut s, o| {
            s.total += 1;
            match o.status {
                OrderStatus::Ordered => s.ordered += 1,
                OrderStatus::Confirmed => s.confirmed += 1,
                OrderStatus::Processing => s.processing += 1,
                OrderStatus::Delivering => s.delivering += 1,
                OrderStatus::Delivered => s.delivered += 1,
                OrderStatus::Cancelled => s.cancelled += 1,
            }
            if o.status != OrderStatus::Cancelled { s.total_revenue += o.total_amount; }
            if o.created_at.date_naive() == today { s.today_orders += 1; }
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{CustomerInfo, Provenance};
    use crate::domain::value_objects::{OrderId, OrderNumber};
    use chrono::{TimeZone, Utc};

    fn order(status: OrderStatus, total: i64, day: u32) -> Order {
        let at = Utc.with_ymd_and_hms(2026, 5, day, 10, 0, 0).unwrap();
        Order {
            id: OrderId::generate(), order_number: OrderNumber::generate(at), customer: CustomerInfo::default(),
            total_amount: Decimal::new(total, 0), status, provenance: Provenance::default(), created_at: at, updated_at: at,
        }
    }

    #[test]
    fn test_tally() {
        let orders = vec![
            order(OrderStatus::Ordered, 100, 4),
            order(OrderStatus::Delivered, 50, 3),
            order(OrderStatus::Cancelled, 70, 4),
            order(OrderStatus::Ordered, 10, 1),
        ];
        let s = OrderStats::tally(&orders, NaiveDate::from_ymd_opt(2026, 5, 4).unwrap());
        assert_eq!(s.total, 4);
        assert_eq!(s.ordered, 2);
        assert_eq!(s.delivered, 1);
        assert_eq!(s.cancelled, 1);
        assert_eq!(s.total_revenue, Decimal::new(160, 0));
        assert_eq!(s.today_orders, 2);
    }

    #[test]
    fn test_empty() {
        let s = OrderStats::tally(&[], NaiveDate::from_ymd_opt(2026, 5, 4).unwrap());
        assert_eq!(s, OrderStats::default());
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["totalRevenue"], 0.0);
        assert_eq!(json["todayOrders"], 0);
    }
}
