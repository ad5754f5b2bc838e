pub mod application;
pub mod category;
pub mod company;
pub mod feature;
pub mod product;
pub mod product_application;
pub mod product_category;
pub mod product_document;
pub mod product_feature;
pub mod product_image;
