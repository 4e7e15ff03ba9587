use crate::db::DbPool;
use crate::entities::{order, order_item, product, user, OrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, Iterable, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Order together with its snapshot lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Allowed lifecycle moves. Everything else is rejected.
fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Confirmed, Shipped)
            | (Confirmed, Cancelled)
            | (Shipped, Delivered)
    )
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<order::Model>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(orders)
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<order::Model>, ServiceError> {
        let orders = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(orders)
    }

    async fn find_by_number(&self, order_number: &str) -> Result<order::Model, ServiceError> {
        order::Entity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_number)))
    }

    /// Customer-facing lookup. Non-admin callers only see their own orders,
    /// and a foreign order number reads as not found rather than forbidden.
    #[instrument(skip(self))]
    pub async fn get_by_order_number(
        &self,
        order_number: &str,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<OrderWithItems, ServiceError> {
        let order = self.find_by_number(order_number).await?;
        if !is_admin && order.user_id != user_id {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                order_number
            )));
        }
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?;
        Ok(OrderWithItems { order, items })
    }

    /// Confirms a pending order and decrements stock, flooring at zero.
    /// Confirming an already-confirmed order is a no-op; the returned flag is
    /// false when nothing changed.
    #[instrument(skip(self))]
    pub async fn confirm(
        &self,
        order_number: &str,
        user_id: Uuid,
    ) -> Result<(order::Model, bool), ServiceError> {
        let order = self.find_by_number(order_number).await?;
        if order.user_id != user_id {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                order_number
            )));
        }
        // Anything past pending has already been through confirmation; stock
        // must only ever be decremented once.
        if order.status != OrderStatus::Pending {
            return Ok((order, false));
        }

        let txn = self.db.begin().await?;
        let depleted = apply_stock_decrement(&txn, order.id).await?;

        let mut model: order::ActiveModel = order.into();
        model.status = Set(OrderStatus::Confirmed);
        model.updated_at = Set(Utc::now());
        let confirmed = model.update(&txn).await?;
        txn.commit().await?;

        info!(order_id = %confirmed.id, "order confirmed");
        self.event_sender
            .send_or_log(Event::OrderConfirmed(confirmed.id))
            .await;
        for product_id in depleted {
            self.event_sender
                .send_or_log(Event::StockDepleted { product_id })
                .await;
        }
        Ok((confirmed, true))
    }

    /// Back-office status change. Moving into `Confirmed` runs the same stock
    /// decrement as a customer confirmation.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let old_status = order.status;
        if old_status == new_status {
            return Ok(order);
        }
        if !can_transition(old_status, new_status) {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot move order {} from {} to {}",
                order.order_number, old_status, new_status
            )));
        }

        let txn = self.db.begin().await?;
        let depleted = if new_status == OrderStatus::Confirmed {
            apply_stock_decrement(&txn, order.id).await?
        } else {
            Vec::new()
        };

        let mut model: order::ActiveModel = order.into();
        model.status = Set(new_status);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;
        for product_id in depleted {
            self.event_sender
                .send_or_log(Event::StockDepleted { product_id })
                .await;
        }
        Ok(updated)
    }
}

/// Figures for the back-office dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_users: u64,
    pub confirmed_orders: u64,
    pub orders_by_status: BTreeMap<String, u64>,
    /// Sum of order totals over shipped and delivered orders.
    pub revenue: Decimal,
    pub recent_products: Vec<product::Model>,
    pub recent_orders: Vec<order::Model>,
}

const DASHBOARD_RECENT_LIMIT: u64 = 5;

impl OrderService {
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        let total_products = product::Entity::find().count(&*self.db).await?;
        let total_users = user::Entity::find().count(&*self.db).await?;

        let mut orders_by_status = BTreeMap::new();
        for status in OrderStatus::iter() {
            let count = order::Entity::find()
                .filter(order::Column::Status.eq(status))
                .count(&*self.db)
                .await?;
            orders_by_status.insert(status.to_string(), count);
        }
        let confirmed_orders = orders_by_status
            .get(&OrderStatus::Confirmed.to_string())
            .copied()
            .unwrap_or(0);

        let fulfilled = order::Entity::find()
            .filter(
                order::Column::Status
                    .eq(OrderStatus::Shipped)
                    .or(order::Column::Status.eq(OrderStatus::Delivered)),
            )
            .all(&*self.db)
            .await?;
        let revenue: Decimal = fulfilled.iter().map(|o| o.total).sum();

        let recent_products = product::Entity::find()
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, DASHBOARD_RECENT_LIMIT)
            .fetch_page(0)
            .await?;
        let recent_orders = order::Entity::find()
            .filter(order::Column::Status.eq(OrderStatus::Confirmed))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, DASHBOARD_RECENT_LIMIT)
            .fetch_page(0)
            .await?;

        Ok(DashboardStats {
            total_products,
            total_users,
            confirmed_orders,
            orders_by_status,
            revenue,
            recent_products,
            recent_orders,
        })
    }
}

/// Subtracts each line quantity from its product's stock, never below zero.
/// Returns the products whose stock reached zero. Deleted products are
/// skipped; their snapshot line still stands.
async fn apply_stock_decrement(
    txn: &DatabaseTransaction,
    order_id: Uuid,
) -> Result<Vec<Uuid>, ServiceError> {
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(txn)
        .await?;

    let mut depleted = Vec::new();
    for item in items {
        let Some(product) = product::Entity::find_by_id(item.product_id).one(txn).await? else {
            warn!(product_id = %item.product_id, "product gone before confirmation; skipping decrement");
            continue;
        };
        let new_stock = (product.stock - item.quantity).max(0);
        let reached_zero = new_stock == 0 && product.stock > 0;
        let product_id = product.id;
        let mut model: product::ActiveModel = product.into();
        model.stock = Set(new_stock);
        model.updated_at = Set(Utc::now());
        model.update(txn).await?;
        if reached_zero {
            depleted.push(product_id);
        }
    }
    Ok(depleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions_are_restricted() {
        use OrderStatus::*;
        assert!(can_transition(Pending, Confirmed));
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(Confirmed, Shipped));
        assert!(can_transition(Shipped, Delivered));
        assert!(!can_transition(Delivered, Cancelled));
        assert!(!can_transition(Cancelled, Pending));
        assert!(!can_transition(Pending, Delivered));
        assert!(!can_transition(Shipped, Cancelled));
    }
}
