//! Catalog composition, navigation and writes over the relational store.

pub mod composer;
pub mod media;
pub mod mutator;
pub mod navigation;

pub use composer::{Facet, ProductIdentifier, ProductScope, get_product_view, list_product_views};
pub use mutator::{AssociationTargets, create_product, delete_product, update_product};
pub use navigation::navigation_for;
