use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use catalog_common::slugify;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{application, category, company, feature};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::payload::AppJson;
use crate::models::shared::{non_blank, validate_name};
use crate::models::taxonomy::*;
use crate::state::AppState;

const MAX_TERM_NAME_LEN: usize = 128;

#[utoipa::path(
    get,
    path = "/companies",
    tag = "Taxonomies",
    operation_id = "listCompanies",
    summary = "List companies",
    responses((status = 200, description = "Companies ordered by name", body = Vec<CompanyResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<CompanyResponse>>, AppError> {
    let rows = company::Entity::find()
        .order_by_asc(company::Column::Name)
        .order_by_asc(company::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/companies",
    tag = "Taxonomies",
    operation_id = "createCompany",
    summary = "Create a company",
    description = "Creates a company. A blank slug is derived from the name. Requires role `admin` or `editor`.",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_company(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;
    let (name, slug) = name_and_slug(&payload.name, payload.slug.as_deref())?;

    let model = company::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        logo: Set(non_blank(payload.logo)),
        description: Set(non_blank(payload.description)),
        website: Set(non_blank(payload.website)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(slug_taken)?;

    Ok((StatusCode::CREATED, Json(CompanyResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Taxonomies",
    operation_id = "listCategories",
    summary = "List categories",
    responses((status = 200, description = "Categories ordered by name", body = Vec<TaxonomyTermResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaxonomyTermResponse>>, AppError> {
    let rows = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .order_by_asc(category::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "Taxonomies",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Creates a category. A blank slug is derived from the name. Requires role `admin` or `editor`.",
    request_body = CreateTermRequest,
    responses(
        (status = 201, description = "Category created", body = TaxonomyTermResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTermRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;
    let (name, slug) = name_and_slug(&payload.name, payload.slug.as_deref())?;

    let model = category::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        image: Set(non_blank(payload.image)),
        description: Set(non_blank(payload.description)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(slug_taken)?;

    Ok((StatusCode::CREATED, Json(TaxonomyTermResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/features",
    tag = "Taxonomies",
    operation_id = "listFeatures",
    summary = "List features",
    responses((status = 200, description = "Features ordered by name", body = Vec<TaxonomyTermResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_features(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaxonomyTermResponse>>, AppError> {
    let rows = feature::Entity::find()
        .order_by_asc(feature::Column::Name)
        .order_by_asc(feature::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/features",
    tag = "Taxonomies",
    operation_id = "createFeature",
    summary = "Create a feature",
    description = "Creates a feature. A blank slug is derived from the name. Requires role `admin` or `editor`.",
    request_body = CreateTermRequest,
    responses(
        (status = 201, description = "Feature created", body = TaxonomyTermResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_feature(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTermRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;
    let (name, slug) = name_and_slug(&payload.name, payload.slug.as_deref())?;

    let model = feature::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        image: Set(non_blank(payload.image)),
        description: Set(non_blank(payload.description)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(slug_taken)?;

    Ok((StatusCode::CREATED, Json(TaxonomyTermResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/applications",
    tag = "Taxonomies",
    operation_id = "listApplications",
    summary = "List applications",
    responses((status = 200, description = "Applications ordered by name", body = Vec<TaxonomyTermResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaxonomyTermResponse>>, AppError> {
    let rows = application::Entity::find()
        .order_by_asc(application::Column::Name)
        .order_by_asc(application::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/applications",
    tag = "Taxonomies",
    operation_id = "createApplication",
    summary = "Create an application",
    description = "Creates an application. A blank slug is derived from the name. Requires role `admin` or `editor`.",
    request_body = CreateTermRequest,
    responses(
        (status = 201, description = "Application created", body = TaxonomyTermResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_application(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTermRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;
    let (name, slug) = name_and_slug(&payload.name, payload.slug.as_deref())?;

    let model = application::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        image: Set(non_blank(payload.image)),
        description: Set(non_blank(payload.description)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(slug_taken)?;

    Ok((StatusCode::CREATED, Json(TaxonomyTermResponse::from(model))))
}

/// Validate the name and pick the slug: the submitted one normalized, or one derived from the name.
fn name_and_slug(name: &str, slug: Option<&str>) -> Result<(String, String), AppError> {
    let name = validate_name("name", name, MAX_TERM_NAME_LEN)?;
    let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => slugify(raw),
        None => slugify(&name),
    };
    if slug.is_empty() {
        return Err(AppError::invalid_field(
            "slug",
            "Slug must contain at least one letter or digit",
        ));
    }
    Ok((name, slug))
}

fn slug_taken(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::invalid_field("slug", "Slug is already in use")
        }
        _ => err.into(),
    }
}
