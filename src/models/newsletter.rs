use chrono::{DateTime, Utc};
use serde::Serialize;

/// A newsletter subscriber row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}
