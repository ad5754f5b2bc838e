use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per (product, feature) pair. The pair is unique.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_feature")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub product_id: i32,
    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: HasOne<super::product::Entity>,

    pub feature_id: i32,
    #[sea_orm(belongs_to, from = "feature_id", to = "id")]
    pub feature: HasOne<super::feature::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
