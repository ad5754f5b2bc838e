pub mod browse;
pub mod product;
pub mod shared;
pub mod taxonomy;
