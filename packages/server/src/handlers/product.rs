use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use catalog_common::storage::FileStore;
use chrono::Utc;
use tracing::instrument;

use super::media::{discard_files, is_image, next_field, read_file_field, read_text_field};
use crate::catalog::{
    self, ProductIdentifier, ProductScope, get_product_view, list_product_views, navigation_for,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::payload::AppQuery;
use crate::models::product::*;
use crate::state::AppState;

const HERO_FOLDER: &str = "products";

#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List products",
    description = "Returns active products, newest first, with company, categories and facet ids. \
        `companyId` and `search` narrow the base query; `categoryId`, `featureId` and \
        `applicationId` narrow by taxonomy membership. Set `includeInactive=true` to include \
        inactive products.",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductListItem>),
        (status = 400, description = "Malformed query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductListQuery>,
) -> Result<Json<Vec<ProductListItem>>, AppError> {
    let scope = ProductScope {
        company_id: query.company_id,
        search: query.search,
        category_id: query.category_id,
        feature_id: query.feature_id,
        application_id: query.application_id,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    Ok(Json(list_product_views(&state.db, &scope).await?))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    operation_id = "getProduct",
    summary = "Get a product by id or slug",
    description = "Returns the full product view: company, categories, features, applications, \
        images and documents. All-digit identifiers are treated as ids, anything else as a slug. \
        Pass a browse-context token as `context` to get previous/next links within that result \
        set; without a usable context the links follow the full catalog order.",
    params(
        ("id" = String, Path, description = "Product ID or slug"),
        ProductViewQuery,
    ),
    responses(
        (status = 200, description = "Product details", body = ProductDetailResponse),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(identifier = %identifier))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    AppQuery(query): AppQuery<ProductViewQuery>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let product = get_product_view(&state.db, &ProductIdentifier::parse(&identifier)).await?;
    let navigation = navigation_for(
        &state.db,
        &state.tracker,
        query.context.as_deref(),
        product.id,
        Utc::now(),
    )
    .await?;

    Ok(Json(ProductDetailResponse {
        product,
        navigation,
    }))
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    operation_id = "createProduct",
    summary = "Create a product",
    description = "Creates a product from multipart fields `companyId`, `name`, `slug`, \
        `shortDescription`, `contentHtml`, `seoTitle`, `seoDescription`, `isActive`, and the JSON \
        arrays `categoryIds`, `featureIds`, `applicationIds`, plus an optional `heroImage` file. \
        A blank slug is derived from the company and product names. Requires role `admin` or `editor`.",
    request_body(content_type = "multipart/form-data", description = "Product fields"),
    responses(
        (status = 201, description = "Product created", body = ProductWriteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 413, description = "Hero image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn create_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;

    let form = read_product_form(multipart, state.config.storage.max_file_size).await?;
    let (draft, hero) = form.into_draft()?;
    let hero_path = store_hero(&state, hero).await?;

    match catalog::create_product(&state.db, draft, hero_path.clone()).await {
        Ok(model) => Ok((StatusCode::CREATED, Json(ProductWriteResponse::from(model)))),
        Err(e) => {
            discard_files(&*state.files, hero_path.as_slice()).await;
            Err(e)
        }
    }
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Update a product",
    description = "Overwrites the product fields and replaces its category, feature and \
        application sets with the submitted ones. Accepts the same multipart fields as create. \
        A new `heroImage` replaces the stored one; omitting it keeps the current image. \
        Requires role `admin` or `editor`.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Product fields"),
    responses(
        (status = 200, description = "Product updated", body = ProductWriteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Hero image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id))]
pub async fn update_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ProductWriteResponse>, AppError> {
    auth_user.require_editor()?;

    let form = read_product_form(multipart, state.config.storage.max_file_size).await?;
    let (draft, hero) = form.into_draft()?;
    let hero_path = store_hero(&state, hero).await?;

    match catalog::update_product(&state.db, id, draft, hero_path.clone()).await {
        Ok((model, detached)) => {
            discard_files(&*state.files, &detached.paths).await;
            Ok(Json(model.into()))
        }
        Err(e) => {
            discard_files(&*state.files, hero_path.as_slice()).await;
            Err(e)
        }
    }
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    operation_id = "deleteProduct",
    summary = "Delete a product",
    description = "Deletes the product together with its association rows, images and documents. \
        Requires role `admin` or `editor`.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;

    let detached = catalog::delete_product(&state.db, id).await?;
    discard_files(&*state.files, &detached.paths).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Collect the product multipart fields. Unknown fields are ignored.
async fn read_product_form(mut multipart: Multipart, max_size: u64) -> Result<ProductForm, AppError> {
    let mut form = ProductForm::default();

    while let Some(field) = next_field(&mut multipart).await? {
        let slot = match field.name() {
            Some("companyId") => &mut form.company_id,
            Some("name") => &mut form.name,
            Some("slug") => &mut form.slug,
            Some("shortDescription") => &mut form.short_description,
            Some("contentHtml") => &mut form.content_html,
            Some("seoTitle") => &mut form.seo_title,
            Some("seoDescription") => &mut form.seo_description,
            Some("isActive") => &mut form.is_active,
            Some("categoryIds") => &mut form.category_ids,
            Some("featureIds") => &mut form.feature_ids,
            Some("applicationIds") => &mut form.application_ids,
            Some("heroImage") => {
                if field.file_name().is_some_and(|n| !n.trim().is_empty()) {
                    let file = read_file_field(field, max_size).await?;
                    if !file.bytes.is_empty() && !is_image(&file) {
                        return Err(AppError::invalid_field(
                            "heroImage",
                            format!("'{}' is not an image", file.file_name),
                        ));
                    }
                    form.hero_image = Some(file);
                }
                continue;
            }
            _ => continue,
        };
        *slot = Some(read_text_field(field).await?);
    }

    Ok(form)
}

async fn store_hero(state: &AppState, hero: Option<UploadedFile>) -> Result<Option<String>, AppError> {
    let Some(file) = hero else {
        return Ok(None);
    };
    let stored = state
        .files
        .store(HERO_FOLDER, &file.file_name, &file.bytes)
        .await?;
    Ok(Some(stored.path))
}
