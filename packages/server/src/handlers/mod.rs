pub mod browse;
pub mod media;
pub mod product;
pub mod taxonomy;
