use chrono::Utc;
use sea_orm::*;

use super::mutator::find_product_for_update;
use crate::entity::{product, product_document, product_image};
use crate::error::AppError;

/// An image already written to the file store.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub image_url: String,
    pub alt_text: Option<String>,
}

/// A document already written to the file store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub file_url: String,
    pub file_size: i64,
    pub file_type: Option<String>,
}

pub async fn ensure_product_exists(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    let found = product::Entity::find_by_id(id).count(db).await?;
    if found == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }
    Ok(())
}

/// Append images to the gallery. Sort order continues after the current maximum.
pub async fn add_images(
    db: &DatabaseConnection,
    product_id: i32,
    images: Vec<NewImage>,
) -> Result<Vec<product_image::Model>, AppError> {
    let txn = db.begin().await?;
    find_product_for_update(&txn, product_id).await?;

    let mut sort_order = next_sort_order(&txn, product_id).await?;
    let now = Utc::now();
    let mut created = Vec::with_capacity(images.len());

    for image in images {
        let model = product_image::ActiveModel {
            product_id: Set(product_id),
            image_url: Set(image.image_url),
            alt_text: Set(image.alt_text),
            sort_order: Set(sort_order),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        created.push(model);
        sort_order = sort_order
            .checked_add(1)
            .ok_or_else(|| AppError::validation("Sort order overflow"))?;
    }

    txn.commit().await?;
    Ok(created)
}

/// Append documents to a product.
pub async fn add_documents(
    db: &DatabaseConnection,
    product_id: i32,
    documents: Vec<NewDocument>,
) -> Result<Vec<product_document::Model>, AppError> {
    let txn = db.begin().await?;
    find_product_for_update(&txn, product_id).await?;

    let now = Utc::now();
    let mut created = Vec::with_capacity(documents.len());

    for document in documents {
        let model = product_document::ActiveModel {
            product_id: Set(product_id),
            name: Set(document.name),
            file_url: Set(document.file_url),
            file_size: Set(document.file_size),
            file_type: Set(document.file_type),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        created.push(model);
    }

    txn.commit().await?;
    Ok(created)
}

/// Remove an image row, returning its file path.
pub async fn delete_image(
    db: &DatabaseConnection,
    product_id: i32,
    image_id: i32,
) -> Result<String, AppError> {
    let image = product_image::Entity::find_by_id(image_id)
        .filter(product_image::Column::ProductId.eq(product_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))?;

    product_image::Entity::delete_by_id(image.id).exec(db).await?;
    Ok(image.image_url)
}

/// Remove a document row, returning its file path.
pub async fn delete_document(
    db: &DatabaseConnection,
    product_id: i32,
    document_id: i32,
) -> Result<String, AppError> {
    let document = product_document::Entity::find_by_id(document_id)
        .filter(product_document::Column::ProductId.eq(product_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;

    product_document::Entity::delete_by_id(document.id).exec(db).await?;
    Ok(document.file_url)
}

async fn next_sort_order<C: ConnectionTrait>(db: &C, product_id: i32) -> Result<i32, AppError> {
    let max_order: Option<i32> = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .select_only()
        .column_as(product_image::Column::SortOrder.max(), "max_order")
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();
    max_order
        .unwrap_or(-1)
        .checked_add(1)
        .ok_or_else(|| AppError::validation("Sort order overflow"))
}
