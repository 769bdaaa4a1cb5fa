use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::Subscriber,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// Subscribes an email address to the newsletter
///
/// Uniqueness is enforced by the database; a duplicate subscription surfaces
/// as a validation error rather than a 500.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> AppResult<(StatusCode, Json<Subscriber>)> {
    let email = request.email.trim().to_ascii_lowercase();
    validate_email(&email)?;

    let subscriber = sqlx::query_as::<_, Subscriber>(
        "INSERT INTO newsletter_subscribers (email) VALUES ($1) \
         RETURNING id, email, subscribed_at",
    )
    .bind(&email)
    .fetch_one(&state.db_pool)
    .await
    .map_err(map_insert_error)?;

    tracing::info!(subscriber_id = subscriber.id, "Newsletter subscription created");

    Ok((StatusCode::CREATED, Json(subscriber)))
}

/// Maps insert failures, turning a duplicate email into a validation error
fn map_insert_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::InvalidInput("Email is already subscribed".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// Syntactic email validation; the mailbox is never verified here
fn validate_email(email: &str) -> AppResult<()> {
    let valid = email.len() <= 255
        && !email.contains(char::is_whitespace)
        && matches!(email.split_once('@'), Some((local, domain))
            if !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.split('.').all(|label| !label.is_empty()));

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidInput(
            "A valid email address is required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::ErrorKind;

    /// Stand-in for a driver error with a chosen constraint-violation kind
    #[derive(Debug)]
    struct StubDatabaseError {
        unique: bool,
    }

    impl std::fmt::Display for StubDatabaseError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "stub database error")
        }
    }

    impl std::error::Error for StubDatabaseError {}

    impl sqlx::error::DatabaseError for StubDatabaseError {
        fn message(&self) -> &str {
            "stub database error"
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_duplicate_email_maps_to_invalid_input() {
        let e = sqlx::Error::Database(Box::new(StubDatabaseError { unique: true }));
        match map_insert_error(e) {
            AppError::InvalidInput(msg) => assert!(msg.contains("already subscribed")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_other_database_errors_stay_database_errors() {
        let e = sqlx::Error::Database(Box::new(StubDatabaseError { unique: false }));
        assert!(matches!(map_insert_error(e), AppError::Database(_)));
    }

    #[test]
    fn test_non_database_errors_stay_database_errors() {
        assert!(matches!(
            map_insert_error(sqlx::Error::RowNotFound),
            AppError::Database(_)
        ));
    }

    #[test]
    fn test_validate_email_accepts_normal_addresses() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co").is_ok());
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@.example.com").is_err());
        assert!(validate_email("user@example.com.").is_err());
        assert!(validate_email("user name@example.com").is_err());
    }

    #[test]
    fn test_validate_email_rejects_overlong() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&email).is_err());
    }
}
