use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{product, product_application, product_category, product_feature, product_image};

/// Ensure indexes that schema-sync does not derive from the entities.
///
/// Junction pairs are unique, and the listing and gallery queries
/// read by composite keys. Failures are logged and startup continues.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes = [
        (
            "uq_product_category_pair",
            Index::create()
                .unique()
                .table(product_category::Entity)
                .col(product_category::Column::ProductId)
                .col(product_category::Column::CategoryId)
                .to_owned(),
        ),
        (
            "uq_product_feature_pair",
            Index::create()
                .unique()
                .table(product_feature::Entity)
                .col(product_feature::Column::ProductId)
                .col(product_feature::Column::FeatureId)
                .to_owned(),
        ),
        (
            "uq_product_application_pair",
            Index::create()
                .unique()
                .table(product_application::Entity)
                .col(product_application::Column::ProductId)
                .col(product_application::Column::ApplicationId)
                .to_owned(),
        ),
        (
            "idx_product_image_order",
            Index::create()
                .table(product_image::Entity)
                .col(product_image::Column::ProductId)
                .col(product_image::Column::SortOrder)
                .to_owned(),
        ),
        (
            "idx_product_created",
            Index::create()
                .table(product::Entity)
                .col(product::Column::CreatedAt)
                .col(product::Column::Id)
                .to_owned(),
        ),
    ];

    for (name, index) in indexes {
        create_index(db, name, index).await;
    }

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, mut index: IndexCreateStatement) {
    let stmt = index
        .if_not_exists()
        .name(name)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => warn!("Failed to create index {}: {}", name, e),
    }
}
