use axum::Router;
use std::sync::Arc;

use crate::config::DaemonConfig;
use crate::db::Database;

pub mod captions;

pub fn router(db: Arc<Database>, config: Arc<DaemonConfig>) -> Router {
    Router::new().nest("/captions", captions::router(db, config))
}
