use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::{debug, instrument};

use crate::catalog::{ProductScope, list_product_views};
use crate::error::{AppError, ErrorBody};
use crate::extractors::payload::AppJson;
use crate::models::browse::{BrowseContextRequest, BrowseContextResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/browse-context",
    tag = "Browse Context",
    operation_id = "captureBrowseContext",
    summary = "Filter the catalog and capture the result as a browse context",
    description = "Applies the facet selection to all active products (OR within a facet, AND \
        across facets, `searchQuery` matching name or short description) and returns the matching \
        ids with a token. Keep the token client-side and pass it as `context` when opening a \
        product to get previous/next links inside the result set. Tokens expire after the \
        configured TTL (30 minutes by default).",
    request_body = BrowseContextRequest,
    responses(
        (status = 200, description = "Captured context", body = BrowseContextResponse),
        (status = 400, description = "Malformed selection (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, selection))]
pub async fn capture_browse_context(
    State(state): State<AppState>,
    AppJson(selection): AppJson<BrowseContextRequest>,
) -> Result<Json<BrowseContextResponse>, AppError> {
    let products = list_product_views(&state.db, &ProductScope::default()).await?;
    let product_ids: Vec<i32> = catalog_common::filter(&products, &selection)
        .into_iter()
        .map(|p| p.id)
        .collect();

    debug!(
        matched = product_ids.len(),
        scanned = products.len(),
        "Captured browse context"
    );

    let token = state
        .tracker
        .capture(selection, product_ids.clone(), Utc::now());

    Ok(Json(BrowseContextResponse {
        token: token.into_inner(),
        total: product_ids.len(),
        product_ids,
    }))
}
