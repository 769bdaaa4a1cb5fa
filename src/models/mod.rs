pub mod locale;
pub mod newsletter;
pub mod tmdb;

pub use locale::Locale;
pub use newsletter::Subscriber;
pub use tmdb::{ListItem, ListPage, TrendingKind, TrendingWindow};
