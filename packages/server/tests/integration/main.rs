mod common;
mod product;
mod taxonomy;
