use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Facet and free-text selections applied to a product list.
///
/// An empty id set imposes no constraint for its facet group. Field names follow
/// the browse-context wire format, so a selection can be embedded directly in a
/// captured context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    /// Case-insensitive substring matched against name or short description.
    #[serde(default, rename = "searchQuery")]
    #[schema(example = "glue")]
    pub text: Option<String>,
    #[serde(default)]
    pub company_ids: BTreeSet<i32>,
    #[serde(default)]
    pub category_ids: BTreeSet<i32>,
    #[serde(default)]
    pub feature_ids: BTreeSet<i32>,
    #[serde(default)]
    pub application_ids: BTreeSet<i32>,
}

/// A product as seen by the facet filter.
pub trait FacetedProduct {
    fn name(&self) -> &str;
    fn short_description(&self) -> Option<&str>;
    fn company_id(&self) -> i32;
    fn category_ids(&self) -> impl Iterator<Item = i32> + '_;
    fn feature_ids(&self) -> impl Iterator<Item = i32> + '_;
    fn application_ids(&self) -> impl Iterator<Item = i32> + '_;
}

impl<T: FacetedProduct> FacetedProduct for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn short_description(&self) -> Option<&str> {
        (**self).short_description()
    }
    fn company_id(&self) -> i32 {
        (**self).company_id()
    }
    fn category_ids(&self) -> impl Iterator<Item = i32> + '_ {
        (**self).category_ids()
    }
    fn feature_ids(&self) -> impl Iterator<Item = i32> + '_ {
        (**self).feature_ids()
    }
    fn application_ids(&self) -> impl Iterator<Item = i32> + '_ {
        (**self).application_ids()
    }
}

/// Minimal in-memory product shape carrying only what filtering needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub id: i32,
    pub name: String,
    pub short_description: Option<String>,
    pub company_id: i32,
    pub category_ids: Vec<i32>,
    pub feature_ids: Vec<i32>,
    pub application_ids: Vec<i32>,
}

impl FacetedProduct for ProductSummary {
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
        self.category_ids.iter().copied()
    }
    fn feature_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.feature_ids.iter().copied()
    }
    fn application_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.application_ids.iter().copied()
    }
}

impl FilterSelection {
    /// Returns `true` when no facet or text constraint is active.
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
            && self.company_ids.is_empty()
            && self.category_ids.is_empty()
            && self.feature_ids.is_empty()
            && self.application_ids.is_empty()
    }

    /// Lowercased, trimmed search text, or `None` when blank.
    fn search_term(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    /// AND across facet groups, OR within a group.
    pub fn matches<P: FacetedProduct>(&self, product: &P) -> bool {
        self.matches_text(product, self.search_term().as_deref())
            && self.matches_facets(product)
    }

    fn matches_text<P: FacetedProduct>(&self, product: &P, term: Option<&str>) -> bool {
        let Some(term) = term else {
            return true;
        };
        product.name().to_lowercase().contains(term)
            || product
                .short_description()
                .is_some_and(|d| d.to_lowercase().contains(term))
    }

    fn matches_facets<P: FacetedProduct>(&self, product: &P) -> bool {
        (self.company_ids.is_empty() || self.company_ids.contains(&product.company_id()))
            && any_selected(&self.category_ids, product.category_ids())
            && any_selected(&self.feature_ids, product.feature_ids())
            && any_selected(&self.application_ids, product.application_ids())
    }
}

fn any_selected(selected: &BTreeSet<i32>, mut ids: impl Iterator<Item = i32>) -> bool {
    selected.is_empty() || ids.any(|id| selected.contains(&id))
}

/// Stable filter: returns the matching products in their input order.
pub fn filter<P, I>(products: I, selection: &FilterSelection) -> Vec<P>
where
    P: FacetedProduct,
    I: IntoIterator<Item = P>,
{
    let term = selection.search_term();
    products
        .into_iter()
        .filter(|p| selection.matches_text(p, term.as_deref()) && selection.matches_facets(p))
        .collect()
}
