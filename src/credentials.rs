/// Catalog account credentials, read from the environment. Storage and
/// rotation are the operator's problem; the clients only ever see the pair.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
}

impl UserCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads `DHUS_USERNAME` / `DHUS_PASSWORD`. Returns `None` unless both
    /// are present and non-empty.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("DHUS_USERNAME").ok()?;
        let password = std::env::var("DHUS_PASSWORD").ok()?;
        if username.trim().is_empty() || password.trim().is_empty() {
            return None;
        }
        Some(Self::new(username.trim(), password.trim()))
    }
}
