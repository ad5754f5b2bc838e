use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{browse, media, product, taxonomy};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(product_routes(config))
        .merge(taxonomy_routes())
        .routes(routes!(browse::capture_browse_context))
}

fn product_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(product::list_products, product::create_product))
        .routes(routes!(
            product::get_product,
            product::update_product,
            product::delete_product
        ))
        .routes(routes!(media::upload_images))
        .routes(routes!(media::upload_documents))
        .routes(routes!(media::delete_image))
        .routes(routes!(media::delete_document))
        .layer(media::upload_body_limit(config))
}

fn taxonomy_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(taxonomy::list_companies, taxonomy::create_company))
        .routes(routes!(taxonomy::list_categories, taxonomy::create_category))
        .routes(routes!(taxonomy::list_features, taxonomy::create_feature))
        .routes(routes!(taxonomy::list_applications, taxonomy::create_application))
}
