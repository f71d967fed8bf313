use std::sync::Arc;

use crate::clock::Clock;
use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub clock: Arc<dyn Clock>,
}
