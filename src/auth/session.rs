use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;

/// Server-side login session, keyed by the token held in the private cookie.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSession {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: NaiveDateTime,
}

pub const SESSION_LIFETIME_HOURS: i64 = 24;

impl UserSession {
    pub fn generate_token() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now().naive_utc()
    }
}
