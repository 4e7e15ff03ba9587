use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::TAX_RATE;

/// Customer order aggregate root. Items live in `order_items`; totals are
/// computed from the captured item prices, never from live product prices.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub shipping_postal_code: String,
    pub shipping_city: String,
    pub shipping_country: String,
    #[sea_orm(nullable)]
    pub shipping_phone: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Order numbers are derived from the order id at creation time:
    /// `ORD-` plus the first 8 hex characters, uppercased.
    pub fn order_number_for(id: Uuid) -> String {
        let hex = id.simple().to_string();
        format!("ORD-{}", hex[..8].to_uppercase())
    }
}

/// Totals computed from captured item lines: pre-tax subtotal, 20% tax on it,
/// and the grand total.
pub fn compute_totals(lines: &[(Decimal, i32)]) -> (Decimal, Decimal, Decimal) {
    let subtotal: Decimal = lines
        .iter()
        .map(|(unit_price, quantity)| *unit_price * Decimal::from(*quantity))
        .sum();
    let subtotal = subtotal.round_dp(2);
    let tax = (subtotal * TAX_RATE).round_dp(2);
    (subtotal, tax, subtotal + tax)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order lifecycle states. Only `pending -> confirmed` is driven by the
/// storefront; the remaining states are set by back-office operations.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn totals_follow_the_twenty_percent_law() {
        let (subtotal, tax, total) = compute_totals(&[(dec!(10.00), 2)]);
        assert_eq!(subtotal, dec!(20.00));
        assert_eq!(tax, dec!(4.00));
        assert_eq!(total, dec!(24.00));
    }

    #[test]
    fn totals_sum_over_multiple_lines() {
        let (subtotal, tax, total) =
            compute_totals(&[(dec!(19.99), 3), (dec!(5.50), 1), (dec!(0.01), 100)]);
        assert_eq!(subtotal, dec!(66.47));
        assert_eq!(tax, dec!(13.29));
        assert_eq!(total, subtotal + tax);
    }

    #[test]
    fn empty_order_totals_are_zero() {
        let (subtotal, tax, total) = compute_totals(&[]);
        assert_eq!(subtotal, Decimal::ZERO);
        assert_eq!(tax, Decimal::ZERO);
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn order_number_shape() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(Model::order_number_for(id), "ORD-550E8400");
    }

    proptest::proptest! {
        #[test]
        fn totals_stay_consistent_for_any_lines(
            lines in proptest::collection::vec((0i64..1_000_000, 1i32..50), 0..8)
        ) {
            let lines: Vec<(Decimal, i32)> = lines
                .into_iter()
                .map(|(cents, qty)| (Decimal::new(cents, 2), qty))
                .collect();
            let (subtotal, tax, total) = compute_totals(&lines);
            proptest::prop_assert_eq!(total, subtotal + tax);
            proptest::prop_assert_eq!(tax, (subtotal * dec!(0.20)).round_dp(2));
            proptest::prop_assert!(subtotal >= Decimal::ZERO);
            proptest::prop_assert!(subtotal.scale() <= 2 && tax.scale() <= 2);
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        use std::str::FromStr;
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
        assert_eq!(
            OrderStatus::from_str("confirmed").unwrap(),
            OrderStatus::Confirmed
        );
    }
}
