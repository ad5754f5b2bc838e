use axum::body::Bytes;
use catalog_common::{FacetedProduct, slugify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::mutator::AssociationTargets;
use crate::entity::{product, product_document, product_image};
use crate::error::AppError;

use super::shared::{non_blank, parse_bool, parse_id_list, validate_name};
pub use super::taxonomy::{CompanyResponse, TaxonomyTermResponse};

const MAX_NAME_LEN: usize = 256;
const MAX_SLUG_LEN: usize = 256;
const MAX_SEO_TITLE_LEN: usize = 256;

/// Narrowing applied by `GET /products`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Only products of this company.
    pub company_id: Option<i32>,
    /// Only products linked to this category.
    pub category_id: Option<i32>,
    /// Only products linked to this feature.
    pub feature_id: Option<i32>,
    /// Only products linked to this application.
    pub application_id: Option<i32>,
    /// Case-insensitive substring over name or short description.
    pub search: Option<String>,
    /// Include products with `isActive = false`. Defaults to false.
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductViewQuery {
    /// Browse-context token returned by `POST /browse-context`.
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageResponse {
    pub id: i32,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDocumentResponse {
    pub id: i32,
    pub name: String,
    pub file_url: String,
    /// Size in bytes.
    pub file_size: i64,
    pub file_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A product with everything it references.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub company_id: i32,
    pub hero_image: Option<String>,
    pub short_description: Option<String>,
    pub content_html: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `null` when the company row is missing.
    pub company: Option<CompanyResponse>,
    pub categories: Vec<TaxonomyTermResponse>,
    pub features: Vec<TaxonomyTermResponse>,
    pub applications: Vec<TaxonomyTermResponse>,
    /// Ordered by `sortOrder`, then id.
    pub images: Vec<ProductImageResponse>,
    /// In upload order.
    pub documents: Vec<ProductDocumentResponse>,
}

/// Previous/next links for the product being viewed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    pub previous_id: Option<i32>,
    pub next_id: Option<i32>,
    /// 1-based position in the ordering, absent when the product is not part of it.
    pub position: Option<usize>,
    pub total: Option<usize>,
    /// Whether the links follow the caller's browse context rather than the full catalog.
    pub scoped: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductView,
    pub navigation: NavigationResponse,
}

/// A product row in list results. Carries ids for facet filtering.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListItem {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub company_id: i32,
    pub company: Option<CompanyResponse>,
    pub hero_image: Option<String>,
    pub short_description: Option<String>,
    pub is_active: bool,
    pub categories: Vec<TaxonomyTermResponse>,
    pub feature_ids: Vec<i32>,
    pub application_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FacetedProduct for ProductListItem {
    fn name(&self) -> &str {
        &self.name
    }
    fn short_description(&self) -> Option<&str> {
        self.short_description.as_deref()
    }
    fn company_id(&self) -> i32 {
        self.company_id
    }
    fn category_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.categories.iter().map(|c| c.id)
    }
    fn feature_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.feature_ids.iter().copied()
    }
    fn application_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.application_ids.iter().copied()
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductWriteResponse {
    pub id: i32,
    pub slug: String,
}

/// A file received in a multipart field, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Raw multipart fields of a product create/update request.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub company_id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub short_description: Option<String>,
    pub content_html: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub is_active: Option<String>,
    pub category_ids: Option<String>,
    pub feature_ids: Option<String>,
    pub application_ids: Option<String>,
    pub hero_image: Option<UploadedFile>,
}

/// A validated product write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub company_id: i32,
    pub name: String,
    /// Normalized slug, or `None` to derive it from the company and product names.
    pub slug: Option<String>,
    pub short_description: Option<String>,
    pub content_html: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub is_active: bool,
    pub associations: AssociationTargets,
}

impl ProductForm {
    /// Validate the raw fields into a draft and the optional hero image.
    pub fn into_draft(self) -> Result<(ProductDraft, Option<UploadedFile>), AppError> {
        let company_id = self
            .company_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::invalid_field("companyId", "Company is required"))?
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::invalid_field("companyId", "Company id must be a positive integer"))?;

        let name = validate_name("name", self.name.as_deref().unwrap_or_default(), MAX_NAME_LEN)?;

        let slug = match non_blank(self.slug) {
            Some(raw) => {
                let slug = slugify(&raw);
                if slug.is_empty() {
                    return Err(AppError::invalid_field(
                        "slug",
                        "Slug must contain at least one letter or digit",
                    ));
                }
                if slug.len() > MAX_SLUG_LEN {
                    return Err(AppError::invalid_field(
                        "slug",
                        format!("Slug must be at most {MAX_SLUG_LEN} characters"),
                    ));
                }
                Some(slug)
            }
            None => None,
        };

        let seo_title = non_blank(self.seo_title);
        if seo_title
            .as_ref()
            .is_some_and(|t| t.chars().count() > MAX_SEO_TITLE_LEN)
        {
            return Err(AppError::invalid_field(
                "seoTitle",
                format!("SEO title must be at most {MAX_SEO_TITLE_LEN} characters"),
            ));
        }

        let is_active = match self.is_active.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_bool("isActive", raw)?,
            _ => true,
        };

        let associations = AssociationTargets::new(
            parse_id_list("categoryIds", self.category_ids.as_deref().unwrap_or_default())?,
            parse_id_list("featureIds", self.feature_ids.as_deref().unwrap_or_default())?,
            parse_id_list(
                "applicationIds",
                self.application_ids.as_deref().unwrap_or_default(),
            )?,
        );

        let hero_image = self.hero_image.filter(|f| !f.bytes.is_empty());

        Ok((
            ProductDraft {
                company_id,
                name,
                slug,
                short_description: non_blank(self.short_description),
                content_html: non_blank(self.content_html),
                seo_title,
                seo_description: non_blank(self.seo_description),
                is_active,
                associations,
            },
            hero_image,
        ))
    }
}

impl From<product_image::Model> for ProductImageResponse {
    fn from(m: product_image::Model) -> Self {
        Self {
            id: m.id,
            image_url: m.image_url,
            alt_text: m.alt_text,
            sort_order: m.sort_order,
            created_at: m.created_at,
        }
    }
}

impl From<product_document::Model> for ProductDocumentResponse {
    fn from(m: product_document::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            file_url: m.file_url,
            file_size: m.file_size,
            file_type: m.file_type,
            created_at: m.created_at,
        }
    }
}

impl From<product::Model> for ProductWriteResponse {
    fn from(m: product::Model) -> Self {
        Self {
            id: m.id,
            slug: m.slug,
        }
    }
}
