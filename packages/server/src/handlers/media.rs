use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use catalog_common::storage::FileStore;
use tracing::{instrument, warn};

use crate::catalog::media::{self, NewDocument, NewImage};
use crate::config::AppConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::product::{ProductDocumentResponse, ProductImageResponse, UploadedFile};
use crate::state::AppState;

pub(crate) const IMAGE_FOLDER: &str = "images";
pub(crate) const DOCUMENT_FOLDER: &str = "documents";

/// Body limit large enough for a full image batch plus form fields.
pub fn upload_body_limit(config: &AppConfig) -> DefaultBodyLimit {
    let files = config
        .catalog
        .max_images_per_upload
        .max(config.catalog.max_documents_per_upload) as u64
        + 1;
    let limit = config
        .storage
        .max_file_size
        .saturating_mul(files)
        .saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/products/{id}/images",
    tag = "Product Media",
    operation_id = "uploadProductImages",
    summary = "Append images to a product gallery",
    description = "Uploads one or more files in the `images` multipart field (up to the configured \
        per-request maximum, 10 by default). An optional `altText` field applies to every image in \
        the request. New images are ordered after the existing gallery. Requires role `admin` or `editor`.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Image files with optional alt text"),
    responses(
        (status = 201, description = "Images added", body = Vec<ProductImageResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(product_id))]
pub async fn upload_images(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;
    media::ensure_product_exists(&state.db, product_id).await?;

    let max_files = state.config.catalog.max_images_per_upload;
    let max_size = state.config.storage.max_file_size;
    let mut files: Vec<UploadedFile> = Vec::new();
    let mut alt_text: Option<String> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name() {
            Some("images") => {
                if files.len() == max_files {
                    return Err(AppError::invalid_field(
                        "images",
                        format!("At most {max_files} images per upload"),
                    ));
                }
                let file = read_file_field(field, max_size).await?;
                if !is_image(&file) {
                    return Err(AppError::invalid_field(
                        "images",
                        format!("'{}' is not an image", file.file_name),
                    ));
                }
                files.push(file);
            }
            Some("altText") => alt_text = Some(read_text_field(field).await?),
            _ => {} // Ignore unknown fields.
        }
    }

    if files.is_empty() {
        return Err(AppError::invalid_field("images", "Missing 'images' field"));
    }
    let alt_text = alt_text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let mut stored = Vec::with_capacity(files.len());
    for file in &files {
        match state
            .files
            .store(IMAGE_FOLDER, &file.file_name, &file.bytes)
            .await
        {
            Ok(s) => stored.push(s.path),
            Err(e) => {
                discard_files(&*state.files, &stored).await;
                return Err(e.into());
            }
        }
    }

    let new_images = stored
        .iter()
        .map(|path| NewImage {
            image_url: path.clone(),
            alt_text: alt_text.clone(),
        })
        .collect();
    let created = match media::add_images(&state.db, product_id, new_images).await {
        Ok(created) => created,
        Err(e) => {
            discard_files(&*state.files, &stored).await;
            return Err(e);
        }
    };

    let body: Vec<ProductImageResponse> = created.into_iter().map(Into::into).collect();
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    post,
    path = "/products/{id}/documents",
    tag = "Product Media",
    operation_id = "uploadProductDocuments",
    summary = "Attach documents to a product",
    description = "Uploads one or more files in the `documents` multipart field (up to the \
        configured per-request maximum, 5 by default). The original file name is kept as the \
        document name. Requires role `admin` or `editor`.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Document files"),
    responses(
        (status = 201, description = "Documents added", body = Vec<ProductDocumentResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(product_id))]
pub async fn upload_documents(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;
    media::ensure_product_exists(&state.db, product_id).await?;

    let max_files = state.config.catalog.max_documents_per_upload;
    let max_size = state.config.storage.max_file_size;
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("documents") {
            if files.len() == max_files {
                return Err(AppError::invalid_field(
                    "documents",
                    format!("At most {max_files} documents per upload"),
                ));
            }
            files.push(read_file_field(field, max_size).await?);
        }
    }

    if files.is_empty() {
        return Err(AppError::invalid_field("documents", "Missing 'documents' field"));
    }

    let mut new_documents = Vec::with_capacity(files.len());
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        let saved = match state
            .files
            .store(DOCUMENT_FOLDER, &file.file_name, &file.bytes)
            .await
        {
            Ok(s) => s,
            Err(e) => {
                discard_files(&*state.files, &stored).await;
                return Err(e.into());
            }
        };
        stored.push(saved.path.clone());
        new_documents.push(NewDocument {
            name: file.file_name,
            file_url: saved.path,
            file_size: i64::try_from(saved.size).unwrap_or(i64::MAX),
            file_type: file.content_type,
        });
    }

    let created = match media::add_documents(&state.db, product_id, new_documents).await {
        Ok(created) => created,
        Err(e) => {
            discard_files(&*state.files, &stored).await;
            return Err(e);
        }
    };

    let body: Vec<ProductDocumentResponse> = created.into_iter().map(Into::into).collect();
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    delete,
    path = "/products/{id}/images/{image_id}",
    tag = "Product Media",
    operation_id = "deleteProductImage",
    summary = "Remove an image from a product",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("image_id" = i32, Path, description = "Image ID"),
    ),
    responses(
        (status = 204, description = "Image removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Image not found on this product (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(product_id, image_id))]
pub async fn delete_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;

    let path = media::delete_image(&state.db, product_id, image_id).await?;
    discard_files(&*state.files, &[path]).await;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/products/{id}/documents/{document_id}",
    tag = "Product Media",
    operation_id = "deleteProductDocument",
    summary = "Remove a document from a product",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("document_id" = i32, Path, description = "Document ID"),
    ),
    responses(
        (status = 204, description = "Document removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found on this product (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(product_id, document_id))]
pub async fn delete_document(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((product_id, document_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_editor()?;

    let path = media::delete_document(&state.db, product_id, document_id).await?;
    discard_files(&*state.files, &[path]).await;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))
}

pub(crate) async fn read_text_field(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::validation(format!("Failed to read '{name}': {e}")))
}

/// Buffer a file field, rejecting it once it grows past `max_size`.
pub(crate) async fn read_file_field(
    mut field: Field<'_>,
    max_size: u64,
) -> Result<UploadedFile, AppError> {
    let file_name = field
        .file_name()
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::validation("File field must have a filename"))?;
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .or_else(|| mime_guess::from_path(&file_name).first().map(|m| m.to_string()));

    let mut data: Vec<u8> = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::validation(format!("Upload read error: {e}")))?
    {
        if (data.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "'{file_name}' exceeds maximum size of {max_size} bytes"
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes: Bytes::from(data),
    })
}

/// Image check by declared type, falling back to the file extension.
pub(crate) fn is_image(file: &UploadedFile) -> bool {
    let declared = file
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("image/"));
    declared
        || mime_guess::from_path(&file.file_name)
            .first()
            .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE)
}

/// Remove files that are no longer referenced. Failures are logged only.
pub(crate) async fn discard_files(files: &dyn FileStore, paths: &[String]) {
    for path in paths {
        if let Err(e) = files.remove(path).await {
            warn!(path = %path, "Failed to remove file: {}", e);
        }
    }
}
