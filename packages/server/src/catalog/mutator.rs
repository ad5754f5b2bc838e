//! Product writes and association replacement.
//!
//! Every junction row set for a product is the complete current association
//! set: a write deletes the existing rows and inserts the new ones inside the
//! same transaction as the product row itself.

use std::collections::HashSet;

use catalog_common::derive_slug;
use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::{debug, info};

use crate::entity::{
    application, category, company, feature, product, product_application, product_category,
    product_document, product_feature, product_image,
};
use crate::error::AppError;
use crate::models::product::ProductDraft;

/// Target id sets for the three product taxonomies.
///
/// Ids are deduplicated on construction, keeping first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationTargets {
    pub category_ids: Vec<i32>,
    pub feature_ids: Vec<i32>,
    pub application_ids: Vec<i32>,
}

impl AssociationTargets {
    pub fn new(category_ids: Vec<i32>, feature_ids: Vec<i32>, application_ids: Vec<i32>) -> Self {
        Self {
            category_ids: dedupe(category_ids),
            feature_ids: dedupe(feature_ids),
            application_ids: dedupe(application_ids),
        }
    }
}

fn dedupe(ids: Vec<i32>) -> Vec<i32> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Files no longer referenced after a write or delete.
#[derive(Debug, Default)]
pub struct DetachedFiles {
    pub paths: Vec<String>,
}

/// Replace all three association sets of `product_id` inside the caller's transaction.
///
/// Every target id must reference an existing taxonomy row; a missing one is a
/// field error and nothing is written. An empty target list clears that taxonomy.
pub async fn replace_associations(
    txn: &DatabaseTransaction,
    product_id: i32,
    targets: &AssociationTargets,
) -> Result<(), AppError> {
    ensure_targets_exist(txn, targets).await?;
    write_associations(txn, product_id, targets).await?;
    Ok(())
}

async fn write_associations<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    targets: &AssociationTargets,
) -> Result<(), DbErr> {
    product_category::Entity::delete_many()
        .filter(product_category::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;
    if !targets.category_ids.is_empty() {
        product_category::Entity::insert_many(targets.category_ids.iter().map(|&category_id| {
            product_category::ActiveModel {
                product_id: Set(product_id),
                category_id: Set(category_id),
                ..Default::default()
            }
        }))
        .exec_without_returning(db)
        .await?;
    }

    product_feature::Entity::delete_many()
        .filter(product_feature::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;
    if !targets.feature_ids.is_empty() {
        product_feature::Entity::insert_many(targets.feature_ids.iter().map(|&feature_id| {
            product_feature::ActiveModel {
                product_id: Set(product_id),
                feature_id: Set(feature_id),
                ..Default::default()
            }
        }))
        .exec_without_returning(db)
        .await?;
    }

    product_application::Entity::delete_many()
        .filter(product_application::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;
    if !targets.application_ids.is_empty() {
        product_application::Entity::insert_many(targets.application_ids.iter().map(
            |&application_id| product_application::ActiveModel {
                product_id: Set(product_id),
                application_id: Set(application_id),
                ..Default::default()
            },
        ))
        .exec_without_returning(db)
        .await?;
    }

    debug!(
        product_id,
        categories = targets.category_ids.len(),
        features = targets.feature_ids.len(),
        applications = targets.application_ids.len(),
        "Replaced product associations"
    );
    Ok(())
}

/// Insert a product and its associations. The slug is derived when the draft has none.
pub async fn create_product(
    db: &DatabaseConnection,
    draft: ProductDraft,
    hero_image: Option<String>,
) -> Result<product::Model, AppError> {
    let txn = db.begin().await?;

    let company = find_company(&txn, draft.company_id).await?;
    let slug = resolve_slug(&txn, &draft, &company, None).await?;

    let now = Utc::now();
    let model = product::ActiveModel {
        slug: Set(slug),
        name: Set(draft.name),
        company_id: Set(draft.company_id),
        hero_image: Set(hero_image),
        short_description: Set(draft.short_description),
        content_html: Set(draft.content_html),
        seo_title: Set(draft.seo_title),
        seo_description: Set(draft.seo_description),
        is_active: Set(draft.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(slug_conflict)?;

    replace_associations(&txn, model.id, &draft.associations).await?;
    txn.commit().await?;

    info!(id = model.id, slug = %model.slug, "Created product");
    Ok(model)
}

/// Overwrite a product and replace its associations.
///
/// `hero_image` replaces the stored reference when present; the previous file
/// is returned so the caller can remove it once the write is committed.
pub async fn update_product(
    db: &DatabaseConnection,
    id: i32,
    draft: ProductDraft,
    hero_image: Option<String>,
) -> Result<(product::Model, DetachedFiles), AppError> {
    let txn = db.begin().await?;

    let existing = find_product_for_update(&txn, id).await?;
    let company = find_company(&txn, draft.company_id).await?;
    let slug = resolve_slug(&txn, &draft, &company, Some(id)).await?;

    let mut detached = DetachedFiles::default();
    let previous_hero = existing.hero_image.clone();
    let mut active: product::ActiveModel = existing.into();

    if let Some(path) = hero_image {
        detached.paths.extend(previous_hero);
        active.hero_image = Set(Some(path));
    }
    active.slug = Set(slug);
    active.name = Set(draft.name);
    active.company_id = Set(draft.company_id);
    active.short_description = Set(draft.short_description);
    active.content_html = Set(draft.content_html);
    active.seo_title = Set(draft.seo_title);
    active.seo_description = Set(draft.seo_description);
    active.is_active = Set(draft.is_active);
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await.map_err(slug_conflict)?;
    replace_associations(&txn, id, &draft.associations).await?;
    txn.commit().await?;

    info!(id, slug = %model.slug, "Updated product");
    Ok((model, detached))
}

/// Delete a product with its junction rows, images and documents.
pub async fn delete_product(db: &DatabaseConnection, id: i32) -> Result<DetachedFiles, AppError> {
    let txn = db.begin().await?;

    let existing = find_product_for_update(&txn, id).await?;

    let image_urls: Vec<String> = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(id))
        .select_only()
        .column(product_image::Column::ImageUrl)
        .into_tuple()
        .all(&txn)
        .await?;
    let document_urls: Vec<String> = product_document::Entity::find()
        .filter(product_document::Column::ProductId.eq(id))
        .select_only()
        .column(product_document::Column::FileUrl)
        .into_tuple()
        .all(&txn)
        .await?;

    write_associations(&txn, id, &AssociationTargets::default()).await?;
    product_image::Entity::delete_many()
        .filter(product_image::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    product_document::Entity::delete_many()
        .filter(product_document::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    product::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    info!(id, "Deleted product");

    let mut detached = DetachedFiles::default();
    detached.paths.extend(existing.hero_image);
    detached.paths.extend(image_urls);
    detached.paths.extend(document_urls);
    Ok(detached)
}

pub(crate) async fn find_product_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<product::Model, AppError> {
    product::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

async fn find_company<C: ConnectionTrait>(db: &C, id: i32) -> Result<company::Model, AppError> {
    company::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::invalid_field("companyId", format!("Company {id} does not exist")))
}

/// Pick the slug for a write and check it against other products.
async fn resolve_slug<C: ConnectionTrait>(
    db: &C,
    draft: &ProductDraft,
    company: &company::Model,
    own_id: Option<i32>,
) -> Result<String, AppError> {
    let slug = match &draft.slug {
        Some(slug) => slug.clone(),
        None => derive_slug(&company.name, &draft.name),
    };
    if slug.is_empty() {
        return Err(AppError::invalid_field(
            "slug",
            "Slug cannot be derived from the company and product names",
        ));
    }

    let mut taken = product::Entity::find().filter(product::Column::Slug.eq(&slug));
    if let Some(id) = own_id {
        taken = taken.filter(product::Column::Id.ne(id));
    }
    if taken.count(db).await? > 0 {
        return Err(AppError::invalid_field(
            "slug",
            format!("Slug '{slug}' is already used by another product"),
        ));
    }
    Ok(slug)
}

/// Concurrent writers can still race past [`resolve_slug`]; the unique index decides.
fn slug_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::invalid_field("slug", "Slug is already used by another product")
        }
        _ => err.into(),
    }
}

/// Reject association targets that reference missing taxonomy rows.
async fn ensure_targets_exist<C: ConnectionTrait>(
    db: &C,
    targets: &AssociationTargets,
) -> Result<(), AppError> {
    if !targets.category_ids.is_empty() {
        let found = category::Entity::find()
            .filter(category::Column::Id.is_in(targets.category_ids.clone()))
            .count(db)
            .await?;
        if found as usize != targets.category_ids.len() {
            return Err(AppError::invalid_field(
                "categoryIds",
                "One or more categories do not exist",
            ));
        }
    }
    if !targets.feature_ids.is_empty() {
        let found = feature::Entity::find()
            .filter(feature::Column::Id.is_in(targets.feature_ids.clone()))
            .count(db)
            .await?;
        if found as usize != targets.feature_ids.len() {
            return Err(AppError::invalid_field(
                "featureIds",
                "One or more features do not exist",
            ));
        }
    }
    if !targets.application_ids.is_empty() {
        let found = application::Entity::find()
            .filter(application::Column::Id.is_in(targets.application_ids.clone()))
            .count(db)
            .await?;
        if found as usize != targets.application_ids.len() {
            return Err(AppError::invalid_field(
                "applicationIds",
                "One or more applications do not exist",
            ));
        }
    }
    Ok(())
}
