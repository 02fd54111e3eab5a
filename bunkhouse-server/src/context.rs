use std::sync::Arc;

use axum::extract::FromRef;
use bunkhouse_core::{Bunkhouse, PgDatabase};

/// The concrete booking system this server fronts
pub type BunkhouseInstance = Bunkhouse<PgDatabase>;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub bunkhouse: Arc<BunkhouseInstance>,
}
