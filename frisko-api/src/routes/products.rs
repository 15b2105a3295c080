use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use frisko_shared::errors::{AppError, AppResult, ErrorCode};
use frisko_shared::middleware::SellerUser;
use frisko_shared::types::auth::AuthUser;
use frisko_shared::types::ApiResponse;

use crate::models::{stock_status, NewProduct, Product, CATEGORIES};
use crate::schema::products;
use crate::AppState;

fn validate_category(category: &str) -> AppResult<()> {
    if !CATEGORIES.contains(&category) {
        return Err(AppError::new(
            ErrorCode::InvalidCategory,
            format!("unknown category: {category}"),
        ));
    }
    Ok(())
}

fn validate_stock_status(status: &str) -> AppResult<()> {
    match status {
        stock_status::AVAILABLE | stock_status::LOW | stock_status::OUT => Ok(()),
        other => Err(AppError::new(
            ErrorCode::ValidationError,
            format!("unknown stock status: {other}"),
        )),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0.01))]
    pub price: f64,
    #[validate(length(min = 1, max = 20))]
    pub unit: String,
    pub category: String,
    pub image_url: Option<String>,
}

/// POST /products - create a product for the authenticated seller
pub async fn create_product(
    SellerUser(user): SellerUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    validate_category(&req.category)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let new_product = NewProduct {
        seller_id: user.id,
        title: req.title,
        description: req.description,
        price: req.price,
        unit: req.unit,
        category: req.category,
        image_url: req.image_url,
        stock_status: stock_status::AVAILABLE.to_string(),
    };

    let product: Product = diesel::insert_into(products::table)
        .values(&new_product)
        .get_result(&mut conn)
        .map_err(AppError::Database)?;

    tracing::debug!(product_id = %product.id, seller_id = %user.id, "product created");

    Ok(Json(ApiResponse::ok(product)))
}

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub seller_id: Option<Uuid>,
    pub category: Option<String>,
}

/// GET /products?seller_id=&category= - list products
pub async fn list_products(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    if let Some(ref category) = params.category {
        validate_category(category)?;
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let mut query = products::table.into_boxed();
    if let Some(seller_id) = params.seller_id {
        query = query.filter(products::seller_id.eq(seller_id));
    }
    if let Some(category) = params.category {
        query = query.filter(products::category.eq(category));
    }

    let items: Vec<Product> = query
        .order(products::created_at.desc())
        .load::<Product>(&mut conn)
        .map_err(AppError::Database)?;

    Ok(Json(ApiResponse::ok(items)))
}

/// GET /products/:id
pub async fn get_product(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let product: Product = products::table
        .find(product_id)
        .first::<Product>(&mut conn)
        .optional()
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound, "product not found"))?;

    Ok(Json(ApiResponse::ok(product)))
}

#[derive(Debug, Deserialize, Validate, AsChangeset)]
#[diesel(table_name = products)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0.01))]
    pub price: Option<f64>,
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock_status: Option<String>,
}

impl UpdateProductRequest {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.unit.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
            && self.stock_status.is_none()
    }
}

/// Load the product and check the caller owns it.
fn load_owned_product(
    conn: &mut diesel::pg::PgConnection,
    product_id: Uuid,
    user_id: Uuid,
) -> AppResult<Product> {
    let product: Product = products::table
        .find(product_id)
        .first::<Product>(conn)
        .optional()
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound, "product not found"))?;

    if product.seller_id != user_id {
        return Err(AppError::new(
            ErrorCode::NotProductOwner,
            "you can only modify your own products",
        ));
    }

    Ok(product)
}

/// PATCH /products/:id - update own product
pub async fn update_product(
    SellerUser(user): SellerUser,
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if let Some(ref category) = req.category {
        validate_category(category)?;
    }
    if let Some(ref status) = req.stock_status {
        validate_stock_status(status)?;
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let existing = load_owned_product(&mut conn, product_id, user.id)?;

    // Diesel rejects a changeset with no fields
    if req.is_empty() {
        return Ok(Json(ApiResponse::ok(existing)));
    }

    let product: Product = diesel::update(products::table.find(product_id))
        .set(&req)
        .get_result(&mut conn)
        .map_err(AppError::Database)?;

    Ok(Json(ApiResponse::ok(product)))
}

/// DELETE /products/:id - delete own product
pub async fn delete_product(
    SellerUser(user): SellerUser,
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    load_owned_product(&mut conn, product_id, user.id)?;

    diesel::delete(products::table.find(product_id))
        .execute(&mut conn)
        .map_err(AppError::Database)?;

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "deleted": product_id
    }))))
}
