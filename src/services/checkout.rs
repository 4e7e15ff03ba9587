use crate::db::DbPool;
use crate::entities::{order, order_item, product, OrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::session::Session;
use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

// Simulated acquirer: Visa-shaped PANs only.
static CARD_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^4\d{12,18}$").expect("valid card number pattern"));
static CVC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3,4}$").expect("valid cvc pattern"));

/// Longest card validity window the simulated acquirer accepts, in years.
const MAX_EXPIRY_YEARS: i32 = 15;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCard {
    pub card_holder: String,
    pub card_number: String,
    pub card_expiry_month: i32,
    pub card_expiry_year: i32,
    pub card_cvc: String,
}

impl PaymentCard {
    /// Rejects anything the simulated acquirer would decline. Spaces in the
    /// PAN are tolerated.
    pub fn validate(&self) -> Result<(), ServiceError> {
        let now = Utc::now();
        self.validate_at(now.year(), now.month() as i32)
    }

    fn validate_at(&self, current_year: i32, current_month: i32) -> Result<(), ServiceError> {
        if self.card_holder.trim().is_empty() {
            return Err(ServiceError::PaymentRejected(
                "Card holder name is required".into(),
            ));
        }
        let digits: String = self.card_number.chars().filter(|c| !c.is_whitespace()).collect();
        if !CARD_NUMBER_RE.is_match(&digits) {
            return Err(ServiceError::PaymentRejected("Invalid card number".into()));
        }
        if !(1..=12).contains(&self.card_expiry_month) {
            return Err(ServiceError::PaymentRejected("Invalid expiry month".into()));
        }
        if self.card_expiry_year < current_year
            || self.card_expiry_year > current_year + MAX_EXPIRY_YEARS
        {
            return Err(ServiceError::PaymentRejected("Invalid expiry year".into()));
        }
        if self.card_expiry_year == current_year && self.card_expiry_month < current_month {
            return Err(ServiceError::PaymentRejected("Card has expired".into()));
        }
        if !CVC_RE.is_match(&self.card_cvc) {
            return Err(ServiceError::PaymentRejected("Invalid security code".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ShippingDetails {
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Turns a session cart into a pending order after the simulated payment
/// check passes. Stock is not touched here; it is decremented at confirmation.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    default_country: String,
}

impl CheckoutService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, default_country: String) -> Self {
        Self {
            db,
            event_sender,
            default_country,
        }
    }

    #[instrument(skip(self, session, shipping, card), fields(session_id = %session.id(), %user_id))]
    pub async fn place_order(
        &self,
        session: &Session,
        user_id: Uuid,
        shipping: ShippingDetails,
        card: PaymentCard,
    ) -> Result<order::Model, ServiceError> {
        let cart = session.cart();
        if cart.is_empty() {
            return Err(ServiceError::InvalidOperation("Cart is empty".into()));
        }
        shipping.validate()?;
        card.validate()?;

        let country = shipping
            .country
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_country.clone());

        let txn = self.db.begin().await?;

        // Lines whose product vanished or went inactive are skipped; the
        // order snapshots only what still resolves.
        let mut priced: Vec<(product::Model, i32)> = Vec::with_capacity(cart.len());
        for (product_id, quantity) in cart.iter() {
            let found = product::Entity::find_by_id(product_id)
                .filter(product::Column::IsActive.eq(true))
                .one(&txn)
                .await?;
            match found {
                Some(product) => priced.push((product, quantity)),
                None => warn!(%product_id, "cart line no longer resolves; skipping"),
            }
        }
        if priced.is_empty() {
            return Err(ServiceError::InvalidOperation("Cart is empty".into()));
        }

        let totals_input: Vec<(Decimal, i32)> =
            priced.iter().map(|(p, q)| (p.price, *q)).collect();
        let (subtotal, tax, total) = order::compute_totals(&totals_input);

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order::Model::order_number_for(order_id)),
            user_id: Set(user_id),
            status: Set(OrderStatus::Pending),
            shipping_address: Set(shipping.address),
            shipping_postal_code: Set(shipping.postal_code),
            shipping_city: Set(shipping.city),
            shipping_country: Set(country),
            shipping_phone: Set(shipping.phone),
            notes: Set(shipping.notes),
            subtotal: Set(subtotal),
            tax: Set(tax),
            total: Set(total),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = order.insert(&txn).await?;

        for (product, quantity) in &priced {
            let line_total = (product.price * Decimal::from(*quantity)).round_dp(2);
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                product_name: Set(product.name.clone()),
                quantity: Set(*quantity),
                unit_price: Set(product.price),
                line_total: Set(line_total),
                created_at: Set(now),
            };
            item.insert(&txn).await?;
        }

        txn.commit().await?;

        session.with_cart(|cart| cart.clear());
        info!(order_id = %saved.id, order_number = %saved.order_number, "order placed");
        self.event_sender
            .send_or_log(Event::OrderCreated(saved.id))
            .await;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> PaymentCard {
        PaymentCard {
            card_holder: "Alice Martin".into(),
            card_number: "4111111111111111".into(),
            card_expiry_month: 12,
            card_expiry_year: 2030,
            card_cvc: "123".into(),
        }
    }

    #[test]
    fn valid_visa_card_passes() {
        assert!(card().validate_at(2026, 8).is_ok());
    }

    #[test]
    fn spaces_in_the_pan_are_tolerated() {
        let mut c = card();
        c.card_number = "4111 1111 1111 1111".into();
        assert!(c.validate_at(2026, 8).is_ok());
    }

    #[test]
    fn non_visa_prefix_is_rejected() {
        let mut c = card();
        c.card_number = "5111111111111111".into();
        assert!(matches!(
            c.validate_at(2026, 8),
            Err(ServiceError::PaymentRejected(_))
        ));
    }

    #[test]
    fn pan_length_bounds_are_enforced() {
        let mut c = card();
        c.card_number = "4111111111".into();
        assert!(c.validate_at(2026, 8).is_err());
        c.card_number = format!("4{}", "1".repeat(19));
        assert!(c.validate_at(2026, 8).is_err());
        c.card_number = format!("4{}", "1".repeat(18));
        assert!(c.validate_at(2026, 8).is_ok());
    }

    #[test]
    fn expiry_in_the_past_month_of_current_year_is_rejected() {
        let mut c = card();
        c.card_expiry_year = 2026;
        c.card_expiry_month = 7;
        assert!(c.validate_at(2026, 8).is_err());
        c.card_expiry_month = 8;
        assert!(c.validate_at(2026, 8).is_ok());
    }

    #[test]
    fn expiry_year_window_is_bounded() {
        let mut c = card();
        c.card_expiry_year = 2025;
        assert!(c.validate_at(2026, 8).is_err());
        c.card_expiry_year = 2026 + MAX_EXPIRY_YEARS;
        assert!(c.validate_at(2026, 8).is_ok());
        c.card_expiry_year = 2026 + MAX_EXPIRY_YEARS + 1;
        assert!(c.validate_at(2026, 8).is_err());
    }

    #[test]
    fn cvc_must_be_three_or_four_digits() {
        let mut c = card();
        c.card_cvc = "12".into();
        assert!(c.validate_at(2026, 8).is_err());
        c.card_cvc = "1234".into();
        assert!(c.validate_at(2026, 8).is_ok());
        c.card_cvc = "12a4".into();
        assert!(c.validate_at(2026, 8).is_err());
    }

    #[test]
    fn blank_holder_is_rejected() {
        let mut c = card();
        c.card_holder = "   ".into();
        assert!(c.validate_at(2026, 8).is_err());
    }
}
