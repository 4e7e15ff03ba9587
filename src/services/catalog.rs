use crate::db::DbPool;
use crate::entities::{category, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// How many products the featured strip shows.
pub const FEATURED_LIMIT: u64 = 6;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// Catalog reads for the storefront plus product/category administration.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    low_stock_threshold: i32,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, low_stock_threshold: i32) -> Self {
        Self {
            db,
            event_sender,
            low_stock_threshold,
        }
    }

    /// Active, in-stock products, newest first.
    #[instrument(skip(self))]
    pub async fn list_active_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::Stock.gt(0))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    /// Active featured products for the home page, capped at [`FEATURED_LIMIT`].
    #[instrument(skip(self))]
    pub async fn list_featured_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::IsFeatured.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, FEATURED_LIMIT)
            .fetch_page(0)
            .await?;
        Ok(products)
    }

    /// Name/description search over active, in-stock products, alphabetical.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::Stock.gt(0))
            .filter(
                product::Column::Name
                    .contains(query)
                    .or(product::Column::Description.contains(query)),
            )
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    /// Sellable products of one active category, optionally narrowed by the
    /// same name/description match as [`search_products`].
    #[instrument(skip(self))]
    pub async fn list_products_in_category(
        &self,
        category_id: Uuid,
        search: Option<&str>,
    ) -> Result<(category::Model, Vec<product::Model>), ServiceError> {
        let category = category::Entity::find_by_id(category_id)
            .filter(category::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

        let mut query = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::Stock.gt(0))
            .filter(product::Column::CategoryId.eq(category_id));
        if let Some(term) = search {
            query = query.filter(
                product::Column::Name
                    .contains(term)
                    .or(product::Column::Description.contains(term)),
            );
        }
        let products = query
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;
        Ok((category, products))
    }

    /// Storefront product lookup; inactive products are invisible here.
    #[instrument(skip(self))]
    pub async fn get_active_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    /// Back-office lookup; sees inactive products too.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_all_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    /// Products whose stock is positive but at or under the threshold.
    #[instrument(skip(self))]
    pub async fn list_low_stock_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::Stock.gt(0))
            .filter(product::Column::Stock.lte(self.low_stock_threshold))
            .order_by_asc(product::Column::Stock)
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn list_active_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        let categories = category::Entity::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(categories)
    }

    #[instrument(skip(self))]
    pub async fn list_all_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(categories)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".into(),
            ));
        }
        category::Entity::find_by_id(input.category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("Category {} not found", input.category_id))
            })?;

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            stock: Set(input.stock),
            sku: Set(input.sku),
            image: Set(input.image),
            images: Set(serde_json::json!(input.images)),
            is_active: Set(input.is_active),
            is_featured: Set(input.is_featured),
            category_id: Set(input.category_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&*self.db).await?;
        info!(product_id = %saved.id, "product created");
        self.event_sender
            .send_or_log(Event::ProductCreated(saved.id))
            .await;
        Ok(saved)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        if matches!(input.price, Some(p) if p < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".into(),
            ));
        }
        let existing = self.get_product(id).await?;

        if let Some(category_id) = input.category_id {
            category::Entity::find_by_id(category_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!("Category {} not found", category_id))
                })?;
        }

        let mut model: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(description);
        }
        if let Some(price) = input.price {
            model.price = Set(price);
        }
        if let Some(stock) = input.stock {
            model.stock = Set(stock);
        }
        if let Some(sku) = input.sku {
            model.sku = Set(sku);
        }
        if let Some(image) = input.image {
            model.image = Set(Some(image));
        }
        if let Some(images) = input.images {
            model.images = Set(serde_json::json!(images));
        }
        if let Some(is_active) = input.is_active {
            model.is_active = Set(is_active);
        }
        if let Some(is_featured) = input.is_featured {
            model.is_featured = Set(is_featured);
        }
        if let Some(category_id) = input.category_id {
            model.category_id = Set(category_id);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_product(id).await?;
        product::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        info!(product_id = %id, "product deleted");
        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            image: Set(input.image),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::CategoryCreated(saved.id))
            .await;
        Ok(saved)
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_category(id).await?;
        let mut model: category::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }
        if let Some(image) = input.image {
            model.image = Set(Some(image));
        }
        if let Some(is_active) = input.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    /// Deletes a category. Refused while any product still references it; the
    /// guard and the delete share one transaction.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_category(id).await?;
        let txn = self.db.begin().await?;
        let in_use = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&txn)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category {} still has {} product(s)",
                id, in_use
            )));
        }
        category::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::CategoryDeleted(id))
            .await;
        Ok(())
    }
}
