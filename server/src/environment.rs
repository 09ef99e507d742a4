use std::sync::Arc;

use log::Logger;

use crate::db::Db;

/// A database handle that can be shared across filters.
pub type SafeDb = Arc<dyn Db + Send + Sync>;

/// The shared state handed to every request handler.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: SafeDb,
    pub config: Config,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, db: SafeDb, config: Config) -> Self {
        Environment { logger, db, config }
    }
}

/// Tunables read from the environment at startup.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// How many films `GET /films/popular` returns when the query does not
    /// say.
    pub popular_default_count: i64,
}

impl Config {
    pub fn new(popular_default_count: i64) -> Self {
        Config {
            popular_default_count,
        }
    }
}
