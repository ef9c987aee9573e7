//! Authentication attached to outgoing calls.

/// Credentials attached to every outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Auth {
    /// No authentication.
    #[default]
    None,
    /// HTTP basic authentication.
    Basic {
        /// Username sent in the `Authorization` header.
        username: String,
        /// Password sent in the `Authorization` header.
        password: String,
    },
}

impl Auth {
    /// Creates basic-auth credentials.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }
}
