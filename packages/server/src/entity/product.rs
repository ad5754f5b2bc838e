use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,

    pub company_id: i32,
    #[sea_orm(belongs_to, from = "company_id", to = "id")]
    pub company: HasOne<super::company::Entity>,

    /// Public path of the hero image, if one was uploaded.
    pub hero_image: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub short_description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content_html: Option<String>,
    pub seo_title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub seo_description: Option<String>,
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    #[sea_orm(has_many, via = "product_category")]
    pub categories: HasMany<super::category::Entity>,
    #[sea_orm(has_many, via = "product_feature")]
    pub features: HasMany<super::feature::Entity>,
    #[sea_orm(has_many, via = "product_application")]
    pub applications: HasMany<super::application::Entity>,

    #[sea_orm(has_many)]
    pub images: HasMany<super::product_image::Entity>,
    #[sea_orm(has_many)]
    pub documents: HasMany<super::product_document::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
