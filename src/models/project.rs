use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A project member as shown on the project page.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub username: String,
}

/// Generate a random URL-safe project id: the 16 bytes of a v4 UUID,
/// base64url-encoded without padding. Always 22 characters.
pub fn generate_id() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}
