//! Assembles product views from the normalized tables.

use std::collections::{HashMap, HashSet};

use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery, SelectStatement};
use sea_orm::*;
use tracing::debug;

use crate::entity::{
    application, category, company, feature, product, product_application, product_category,
    product_document, product_feature, product_image,
};
use crate::error::AppError;
use crate::models::product::{
    CompanyResponse, ProductDocumentResponse, ProductImageResponse, ProductListItem, ProductView,
    TaxonomyTermResponse,
};
use crate::models::shared::escape_like;

/// How a caller refers to a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductIdentifier {
    Id(i32),
    Slug(String),
}

impl ProductIdentifier {
    /// All-digit input that fits a positive `i32` is an id; anything else is a slug.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && let Ok(id) = raw.parse::<i32>()
            && id > 0
        {
            return ProductIdentifier::Id(id);
        }
        ProductIdentifier::Slug(raw.to_string())
    }
}

/// A product taxonomy reached through a junction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Category,
    Feature,
    Application,
}

impl Facet {
    /// Term ids linked to `product_id`, as a subquery.
    fn term_ids_of(self, product_id: i32) -> SelectStatement {
        match self {
            Facet::Category => SeaQuery::select()
                .column(product_category::Column::CategoryId)
                .from(product_category::Entity)
                .and_where(product_category::Column::ProductId.eq(product_id))
                .to_owned(),
            Facet::Feature => SeaQuery::select()
                .column(product_feature::Column::FeatureId)
                .from(product_feature::Entity)
                .and_where(product_feature::Column::ProductId.eq(product_id))
                .to_owned(),
            Facet::Application => SeaQuery::select()
                .column(product_application::Column::ApplicationId)
                .from(product_application::Entity)
                .and_where(product_application::Column::ProductId.eq(product_id))
                .to_owned(),
        }
    }

    /// Terms linked to `product_id`, ordered by name.
    async fn terms_of(
        self,
        db: &DatabaseConnection,
        product_id: i32,
    ) -> Result<Vec<TaxonomyTermResponse>, DbErr> {
        let subquery = self.term_ids_of(product_id);
        let terms = match self {
            Facet::Category => category::Entity::find()
                .filter(category::Column::Id.in_subquery(subquery))
                .order_by_asc(category::Column::Name)
                .order_by_asc(category::Column::Id)
                .all(db)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
            Facet::Feature => feature::Entity::find()
                .filter(feature::Column::Id.in_subquery(subquery))
                .order_by_asc(feature::Column::Name)
                .order_by_asc(feature::Column::Id)
                .all(db)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
            Facet::Application => application::Entity::find()
                .filter(application::Column::Id.in_subquery(subquery))
                .order_by_asc(application::Column::Name)
                .order_by_asc(application::Column::Id)
                .all(db)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
        };
        Ok(terms)
    }

    /// Products linked to the term `term_id`.
    async fn product_ids_with(
        self,
        db: &DatabaseConnection,
        term_id: i32,
    ) -> Result<HashSet<i32>, DbErr> {
        let ids: Vec<i32> = match self {
            Facet::Category => {
                product_category::Entity::find()
                    .filter(product_category::Column::CategoryId.eq(term_id))
                    .select_only()
                    .column(product_category::Column::ProductId)
                    .into_tuple()
                    .all(db)
                    .await?
            }
            Facet::Feature => {
                product_feature::Entity::find()
                    .filter(product_feature::Column::FeatureId.eq(term_id))
                    .select_only()
                    .column(product_feature::Column::ProductId)
                    .into_tuple()
                    .all(db)
                    .await?
            }
            Facet::Application => {
                product_application::Entity::find()
                    .filter(product_application::Column::ApplicationId.eq(term_id))
                    .select_only()
                    .column(product_application::Column::ProductId)
                    .into_tuple()
                    .all(db)
                    .await?
            }
        };
        Ok(ids.into_iter().collect())
    }

    /// `(product_id, term_id)` pairs for the given products, in junction order.
    async fn pairs_for(
        self,
        db: &DatabaseConnection,
        product_ids: &[i32],
    ) -> Result<Vec<(i32, i32)>, DbErr> {
        let ids = product_ids.to_vec();
        match self {
            Facet::Category => {
                product_category::Entity::find()
                    .filter(product_category::Column::ProductId.is_in(ids))
                    .select_only()
                    .column(product_category::Column::ProductId)
                    .column(product_category::Column::CategoryId)
                    .order_by_asc(product_category::Column::Id)
                    .into_tuple()
                    .all(db)
                    .await
            }
            Facet::Feature => {
                product_feature::Entity::find()
                    .filter(product_feature::Column::ProductId.is_in(ids))
                    .select_only()
                    .column(product_feature::Column::ProductId)
                    .column(product_feature::Column::FeatureId)
                    .order_by_asc(product_feature::Column::Id)
                    .into_tuple()
                    .all(db)
                    .await
            }
            Facet::Application => {
                product_application::Entity::find()
                    .filter(product_application::Column::ProductId.is_in(ids))
                    .select_only()
                    .column(product_application::Column::ProductId)
                    .column(product_application::Column::ApplicationId)
                    .order_by_asc(product_application::Column::Id)
                    .into_tuple()
                    .all(db)
                    .await
            }
        }
    }
}

/// Narrowing for [`list_product_views`].
#[derive(Debug, Clone, Default)]
pub struct ProductScope {
    pub company_id: Option<i32>,
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub feature_id: Option<i32>,
    pub application_id: Option<i32>,
    pub include_inactive: bool,
}

impl ProductScope {
    fn facet_terms(&self) -> impl Iterator<Item = (Facet, i32)> {
        [
            (Facet::Category, self.category_id),
            (Facet::Feature, self.feature_id),
            (Facet::Application, self.application_id),
        ]
        .into_iter()
        .filter_map(|(facet, term)| term.map(|t| (facet, t)))
    }
}

/// Load one product with its company, taxonomies and media.
pub async fn get_product_view(
    db: &DatabaseConnection,
    identifier: &ProductIdentifier,
) -> Result<ProductView, AppError> {
    let select = match identifier {
        ProductIdentifier::Id(id) => product::Entity::find_by_id(*id),
        ProductIdentifier::Slug(slug) => {
            product::Entity::find().filter(product::Column::Slug.eq(slug.as_str()))
        }
    };
    let product = select
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

    let id = product.id;
    let (company, categories, features, applications, images, documents) = tokio::try_join!(
        company::Entity::find_by_id(product.company_id).one(db),
        Facet::Category.terms_of(db, id),
        Facet::Feature.terms_of(db, id),
        Facet::Application.terms_of(db, id),
        product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(id))
            .order_by_asc(product_image::Column::SortOrder)
            .order_by_asc(product_image::Column::Id)
            .all(db),
        product_document::Entity::find()
            .filter(product_document::Column::ProductId.eq(id))
            .order_by_asc(product_document::Column::Id)
            .all(db),
    )?;

    if company.is_none() {
        debug!(id, company_id = product.company_id, "Product references a missing company");
    }

    Ok(ProductView {
        id,
        slug: product.slug,
        name: product.name,
        company_id: product.company_id,
        hero_image: product.hero_image,
        short_description: product.short_description,
        content_html: product.content_html,
        seo_title: product.seo_title,
        seo_description: product.seo_description,
        is_active: product.is_active,
        created_at: product.created_at,
        updated_at: product.updated_at,
        company: company.map(CompanyResponse::from),
        categories,
        features,
        applications,
        images: images.into_iter().map(ProductImageResponse::from).collect(),
        documents: documents
            .into_iter()
            .map(ProductDocumentResponse::from)
            .collect(),
    })
}

/// Base product query for a scope: activity, company and text narrowing, newest first.
fn scoped_select(scope: &ProductScope) -> Select<product::Entity> {
    let mut select = product::Entity::find();

    if !scope.include_inactive {
        select = select.filter(product::Column::IsActive.eq(true));
    }
    if let Some(company_id) = scope.company_id {
        select = select.filter(product::Column::CompanyId.eq(company_id));
    }
    if let Some(ref search) = scope.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::ShortDescription)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    select
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
}

/// List products in `scope` with their company, categories and facet ids.
pub async fn list_product_views(
    db: &DatabaseConnection,
    scope: &ProductScope,
) -> Result<Vec<ProductListItem>, AppError> {
    let mut products = scoped_select(scope).all(db).await?;

    for (facet, term_id) in scope.facet_terms() {
        if products.is_empty() {
            break;
        }
        let linked = facet.product_ids_with(db, term_id).await?;
        products.retain(|p| linked.contains(&p.id));
    }

    if products.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let company_ids: Vec<i32> = products
        .iter()
        .map(|p| p.company_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let (companies, category_pairs, feature_pairs, application_pairs) = tokio::try_join!(
        company::Entity::find()
            .filter(company::Column::Id.is_in(company_ids))
            .all(db),
        Facet::Category.pairs_for(db, &product_ids),
        Facet::Feature.pairs_for(db, &product_ids),
        Facet::Application.pairs_for(db, &product_ids),
    )?;

    let category_ids: HashSet<i32> = category_pairs.iter().map(|&(_, c)| c).collect();
    let categories: HashMap<i32, TaxonomyTermResponse> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, TaxonomyTermResponse::from(c)))
            .collect()
    };

    let companies: HashMap<i32, CompanyResponse> = companies
        .into_iter()
        .map(|c| (c.id, CompanyResponse::from(c)))
        .collect();
    let mut categories_by_product = group_pairs(category_pairs);
    let mut features_by_product = group_pairs(feature_pairs);
    let mut applications_by_product = group_pairs(application_pairs);

    let items = products
        .into_iter()
        .map(|p| ProductListItem {
            company: companies.get(&p.company_id).cloned(),
            categories: categories_by_product
                .remove(&p.id)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|id| categories.get(&id).cloned())
                .collect(),
            feature_ids: features_by_product.remove(&p.id).unwrap_or_default(),
            application_ids: applications_by_product.remove(&p.id).unwrap_or_default(),
            id: p.id,
            slug: p.slug,
            name: p.name,
            company_id: p.company_id,
            hero_image: p.hero_image,
            short_description: p.short_description,
            is_active: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
        .collect();

    Ok(items)
}

fn group_pairs(pairs: Vec<(i32, i32)>) -> HashMap<i32, Vec<i32>> {
    let mut grouped: HashMap<i32, Vec<i32>> = HashMap::new();
    for (product_id, term_id) in pairs {
        grouped.entry(product_id).or_default().push(term_id);
    }
    grouped
}
