use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Profile of the authenticated user, as returned by `/api/auth/me`.
///
/// The session manager treats this record as opaque: it only cares whether a
/// profile could be resolved for the stored token. Fields are exposed for the
/// view layer (greeting, admin-only screens).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    /// Server timestamps are naive (no offset), so this is not `DateTime<Utc>`.
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}
