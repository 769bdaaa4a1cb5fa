use sqlx::PgPool;

use crate::{config::Config, models::Locale, services::TmdbClient};

/// Shared application state cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tmdb: TmdbClient,
    pub db_pool: PgPool,
}

impl AppState {
    pub fn new(config: Config, tmdb: TmdbClient, db_pool: PgPool) -> Self {
        Self {
            config,
            tmdb,
            db_pool,
        }
    }

    /// Locale used when no request signal resolves one
    pub fn default_locale(&self) -> Locale {
        Locale::new(&self.config.default_language, &self.config.default_region)
    }
}
