use std::sync::Arc;

use catalog_common::BrowseContextTracker;
use catalog_common::storage::FileStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub files: Arc<dyn FileStore>,
    pub tracker: BrowseContextTracker,
}
