//! Catalog route handlers. All reads are served from the commerce
//! client's cache when warm.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::catalog::{ProductView, VariantView, variant_views};
use crate::commerce::{CatalogOps, CommerceError, ProductCategory};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product detail body: the flattened view plus purchasable variants.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    /// The flattened product.
    #[serde(flatten)]
    pub product: ProductView,
    /// Variants to pick from when adding to cart.
    pub variants: Vec<VariantView>,
}

/// List all products.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let currency = state.config().commerce.currency;
    let products = state.commerce().list_products().await?;
    Ok(Json(
        products
            .iter()
            .map(|product| ProductView::from_product(product, currency))
            .collect(),
    ))
}

/// Show one product by its URL handle.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ProductDetail>> {
    let currency = state.config().commerce.currency;
    let product = state
        .commerce()
        .get_product_by_handle(&handle)
        .await
        .map_err(|e| match e {
            CommerceError::NotFound(_) => AppError::NotFound(format!("product {handle}")),
            other => other.into(),
        })?;

    Ok(Json(ProductDetail {
        product: ProductView::from_product(&product, currency),
        variants: variant_views(&product, currency),
    }))
}

/// List all product categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<ProductCategory>>> {
    Ok(Json(state.commerce().list_categories().await?))
}
