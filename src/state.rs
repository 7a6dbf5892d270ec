use sqlx::SqlitePool;

use crate::admin::TableAdmin;
use crate::config::AppConfig;
use crate::metadata::MetadataStore;
use crate::store::Store;

/// Shared handles injected into every handler / 共享状态
///
/// All collaborators hold clones of the one pool opened at startup.
pub struct AppState {
    pub store: Store,
    pub metadata: MetadataStore,
    pub admin: TableAdmin,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig) -> Self {
        let store = Store::new(db.clone());
        let metadata = MetadataStore::new(db);
        let admin = TableAdmin::new(store.clone(), metadata.clone());
        Self { store, metadata, admin, config }
    }
}
