use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{application, category, company, feature};

/// Payload for creating a company.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyRequest {
    #[schema(example = "Acme Corp")]
    pub name: String,
    /// Derived from the name when blank.
    pub slug: Option<String>,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

/// Payload for creating a category, feature or application.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTermRequest {
    #[schema(example = "Polypropylene")]
    pub name: String,
    /// Derived from the name when blank.
    pub slug: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A category, feature or application.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyTermResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl From<company::Model> for CompanyResponse {
    fn from(m: company::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            logo: m.logo,
            description: m.description,
            website: m.website,
            created_at: m.created_at,
        }
    }
}

impl From<category::Model> for TaxonomyTermResponse {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            image: m.image,
            description: m.description,
        }
    }
}

impl From<feature::Model> for TaxonomyTermResponse {
    fn from(m: feature::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            image: m.image,
            description: m.description,
        }
    }
}

impl From<application::Model> for TaxonomyTermResponse {
    fn from(m: application::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
            image: m.image,
            description: m.description,
        }
    }
}
