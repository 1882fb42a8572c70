use crate::{
    entities::{category, product, Category, CategoryModel, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Catalog service: category and product lookups, plus the write
/// operations the storefront itself never exposes over HTTP (seeding and
/// administration go through these directly).
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create a new category. Name and slug are unique; a conflict
    /// surfaces as a database error from the unique index.
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let category_id = Uuid::new_v4();

        let category = category::ActiveModel {
            id: Set(category_id),
            name: Set(input.name),
            slug: Set(input.slug),
        };

        let category = category.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category_id))
            .await;

        info!("Created category: {}", category_id);
        Ok(category)
    }

    /// All categories, ordered by name.
    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<CategoryModel, ServiceError> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category '{}' not found", slug)))
    }

    /// Delete a category, nulling the reference of every product that
    /// pointed at it. Both writes happen in one transaction; products
    /// themselves are never cascaded.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        Category::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category {} not found", category_id))
            })?;

        Product::update_many()
            .col_expr(product::Column::CategoryId, Expr::value(None::<Uuid>))
            .filter(product::Column::CategoryId.eq(category_id))
            .exec(&txn)
            .await?;

        Category::delete_by_id(category_id).exec(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted(category_id))
            .await;

        info!("Deleted category: {}", category_id);
        Ok(())
    }

    /// Create a new product. The category, when given, must exist.
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price cannot be negative".to_string(),
            ));
        }

        if let Some(category_id) = input.category_id {
            Category::find_by_id(category_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Category {} not found", category_id))
                })?;
        }

        let product_id = Uuid::new_v4();

        let product = product::ActiveModel {
            id: Set(product_id),
            category_id: Set(input.category_id),
            name: Set(input.name),
            price: Set(input.price),
            image_url: Set(input.image_url),
            description: Set(input.description.unwrap_or_default()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!("Created product: {}", product_id);
        Ok(product)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Product detail with its category resolved.
    pub async fn get_product_with_category(
        &self,
        product_id: Uuid,
    ) -> Result<(ProductModel, Option<CategoryModel>), ServiceError> {
        Product::find_by_id(product_id)
            .find_also_related(Category)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Paginated product listing ordered by name, optionally restricted
    /// to a category (by slug). An unknown slug is a not-found error
    /// rather than an empty page.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category_slug: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<(ProductModel, Option<CategoryModel>)>, u64), ServiceError> {
        let mut query = Product::find()
            .find_also_related(Category)
            .order_by_asc(product::Column::Name);

        if let Some(slug) = category_slug {
            let cat = self.get_category_by_slug(slug).await?;
            query = query.filter(product::Column::CategoryId.eq(cat.id));
        }

        let paginator = query.paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((data, total))
    }
}

/// Input for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub slug: String,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
}
