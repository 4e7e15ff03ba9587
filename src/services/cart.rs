use crate::db::DbPool;
use crate::entities::product;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::session::{Cart, CartLine, Session};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Cart joined against the live catalog. `total` sums the tax-inclusive line
/// totals; `subtotal` and `tax` break that figure back into its portions.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_quantity: i32,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Session cart operations. All state lives in the session; this service only
/// validates lines against the catalog and prices them.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl CartService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    async fn sellable_products_for(
        &self,
        cart: &Cart,
    ) -> Result<HashMap<Uuid, product::Model>, ServiceError> {
        if cart.is_empty() {
            return Ok(HashMap::new());
        }
        let products = product::Entity::find()
            .filter(product::Column::Id.is_in(cart.product_ids()))
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::Stock.gt(0))
            .all(&*self.db)
            .await?;
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn sellable_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Prices the cart. Lines whose product vanished, went inactive or ran out
    /// of stock are pruned from the session before pricing.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn view(&self, session: &Session) -> Result<CartView, ServiceError> {
        let cart = session.cart();
        let products = self.sellable_products_for(&cart).await?;

        let stale: Vec<Uuid> = cart
            .iter()
            .filter(|(id, _)| !products.contains_key(id))
            .map(|(id, _)| id)
            .collect();
        let cart = if stale.is_empty() {
            cart
        } else {
            session.with_cart(|cart| {
                for id in &stale {
                    cart.remove(*id);
                }
            })
        };

        let mut lines = Vec::with_capacity(cart.len());
        let mut subtotal = Decimal::ZERO;
        let mut total = Decimal::ZERO;
        for (product_id, quantity) in cart.iter() {
            // Reconciled above, so every remaining line has a product.
            if let Some(product) = products.get(&product_id) {
                let unit_price_with_tax = product.price_with_tax();
                let line_total = (unit_price_with_tax * Decimal::from(quantity)).round_dp(2);
                subtotal += (product.price * Decimal::from(quantity)).round_dp(2);
                total += line_total;
                lines.push(CartLine {
                    product_id,
                    name: product.name.clone(),
                    unit_price: product.price,
                    unit_price_with_tax,
                    quantity,
                    line_total,
                });
            }
        }
        Ok(CartView {
            total_quantity: cart.total_quantity(),
            lines,
            subtotal,
            tax: total - subtotal,
            total,
        })
    }

    /// Adds units to a line, bounded by available stock across the whole line.
    /// Quantities below 1 are treated as 1.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn add(
        &self,
        session: &Session,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        let quantity = quantity.max(1);
        let product = self.sellable_product(product_id).await?;
        if product.stock <= 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "{} is out of stock",
                product.name
            )));
        }

        let requested = session.cart().quantity(product_id).saturating_add(quantity);
        if requested > product.stock {
            return Err(ServiceError::InsufficientStock(format!(
                "Only {} unit(s) of {} available",
                product.stock, product.name
            )));
        }

        session.with_cart(|cart| cart.add(product_id, quantity));
        info!(%product_id, quantity, "cart line added");
        self.event_sender
            .send_or_log(Event::CartItemAdded {
                session_id: session.id().to_string(),
                product_id,
                quantity,
            })
            .await;
        self.view(session).await
    }

    /// Sets the line quantity outright. Zero or less removes the line.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn update(
        &self,
        session: &Session,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity <= 0 {
            return self.remove(session, product_id).await;
        }
        let product = self.sellable_product(product_id).await?;
        if quantity > product.stock {
            return Err(ServiceError::InsufficientStock(format!(
                "Only {} unit(s) of {} available",
                product.stock, product.name
            )));
        }

        session.with_cart(|cart| cart.set(product_id, quantity));
        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                session_id: session.id().to_string(),
                product_id,
                quantity,
            })
            .await;
        self.view(session).await
    }

    /// Removing an absent line is fine.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn remove(
        &self,
        session: &Session,
        product_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        session.with_cart(|cart| cart.remove(product_id));
        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                session_id: session.id().to_string(),
                product_id,
            })
            .await;
        self.view(session).await
    }

    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn clear(&self, session: &Session) -> Result<(), ServiceError> {
        session.with_cart(|cart| cart.clear());
        self.event_sender
            .send_or_log(Event::CartCleared {
                session_id: session.id().to_string(),
            })
            .await;
        Ok(())
    }
}
