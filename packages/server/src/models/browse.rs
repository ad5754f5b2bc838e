use serde::Serialize;

pub use catalog_common::FilterSelection as BrowseContextRequest;

/// A captured browse context.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrowseContextResponse {
    /// Opaque token to pass back as `context` when opening a product.
    pub token: String,
    /// Matching product ids in result order.
    pub product_ids: Vec<i32>,
    pub total: usize,
}
