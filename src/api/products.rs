//! Public product catalog.

use super::{types::Product, ApiClient, ApiError, ApiRequest};
use tracing::instrument;

/// Categories the catalog is stocked with. Listing without a category shows
/// every product.
pub const SUGGESTED_CATEGORIES: [&str; 5] = [
    "Солнцезащитные",
    "Для чтения",
    "Спортивные",
    "Компьютерные",
    "Детские",
];

#[instrument(skip(client))]
pub async fn list(client: &ApiClient, category: Option<&str>) -> Result<Vec<Product>, ApiError> {
    let query = category
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(|category| vec![("category".to_string(), category.to_string())])
        .unwrap_or_default();

    client.json(ApiRequest::get("/products").query(query)).await
}

#[instrument(skip(client))]
pub async fn get(client: &ApiClient, id: i64) -> Result<Product, ApiError> {
    client.json(ApiRequest::get(format!("/products/{id}"))).await
}
