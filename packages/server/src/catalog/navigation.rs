use catalog_common::{Adjacency, BrowseContextTracker};
use chrono::{DateTime, Utc};
use sea_orm::*;
use tracing::debug;

use crate::entity::product;
use crate::error::AppError;
use crate::models::product::NavigationResponse;

/// Previous/next links for `product_id`.
///
/// Follows the browse context when it is active and contains the product,
/// otherwise the ordering of all active products.
pub async fn navigation_for(
    db: &DatabaseConnection,
    tracker: &BrowseContextTracker,
    context: Option<&str>,
    product_id: i32,
    now: DateTime<Utc>,
) -> Result<NavigationResponse, AppError> {
    if let Some(token) = context {
        if let Some(adjacency) = tracker.adjacency(token, product_id, now) {
            return Ok(from_adjacency(adjacency, true));
        }
        debug!(product_id, "Browse context unusable, falling back to catalog order");
    }

    Ok(catalog_adjacency(db, product_id)
        .await?
        .map(|adjacency| from_adjacency(adjacency, false))
        .unwrap_or_default())
}

/// Neighbours of an active product in the catalog order (`created_at` desc, then `id` desc).
///
/// Reads only the two adjacent rows and two counts. `None` when the product is
/// missing or inactive.
async fn catalog_adjacency(
    db: &DatabaseConnection,
    product_id: i32,
) -> Result<Option<Adjacency>, AppError> {
    let Some(current) = active()
        .filter(product::Column::Id.eq(product_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let listed_before = Condition::any()
        .add(product::Column::CreatedAt.gt(current.created_at))
        .add(
            Condition::all()
                .add(product::Column::CreatedAt.eq(current.created_at))
                .add(product::Column::Id.gt(current.id)),
        );
    let listed_after = Condition::any()
        .add(product::Column::CreatedAt.lt(current.created_at))
        .add(
            Condition::all()
                .add(product::Column::CreatedAt.eq(current.created_at))
                .add(product::Column::Id.lt(current.id)),
        );

    let (previous_id, next_id, ahead, total) = tokio::try_join!(
        active()
            .filter(listed_before.clone())
            .order_by_asc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id)
            .select_only()
            .column(product::Column::Id)
            .into_tuple::<i32>()
            .one(db),
        active()
            .filter(listed_after)
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .select_only()
            .column(product::Column::Id)
            .into_tuple::<i32>()
            .one(db),
        active().filter(listed_before).count(db),
        active().count(db),
    )?;

    Ok(Some(Adjacency {
        previous_id,
        next_id,
        position: usize::try_from(ahead).unwrap_or(usize::MAX).saturating_add(1),
        total: usize::try_from(total).unwrap_or(usize::MAX),
    }))
}

fn active() -> Select<product::Entity> {
    product::Entity::find().filter(product::Column::IsActive.eq(true))
}

fn from_adjacency(adjacency: Adjacency, scoped: bool) -> NavigationResponse {
    NavigationResponse {
        previous_id: adjacency.previous_id,
        next_id: adjacency.next_id,
        position: Some(adjacency.position),
        total: Some(adjacency.total),
        scoped,
    }
}
