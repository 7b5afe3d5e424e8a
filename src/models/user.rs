use serde::{Deserialize, Serialize};

use super::lenient;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    pub email: String,
}

/// Answer to `login` and `register`.
#[derive(Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

// Keep tokens out of logs.
impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
