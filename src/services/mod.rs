pub mod locale;
pub mod rotation;
pub mod tmdb;

pub use tmdb::TmdbClient;
