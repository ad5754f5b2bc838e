pub mod browse;
pub mod config;
pub mod filter;
pub mod slug;
pub mod storage;

pub use browse::{Adjacency, BrowseContext, BrowseContextTracker, ContextToken, Resolution};
pub use filter::{FacetedProduct, FilterSelection, ProductSummary, filter};
pub use slug::{derive_slug, slugify};
