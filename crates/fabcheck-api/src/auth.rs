use secrecy::{ExposeSecret, SecretString};

/// Credentials for authenticating with the fabric controller.
///
/// The controller accepts HTTP Basic auth on every request and also sets a
/// session cookie; the client sends both.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// HTTP Basic auth.
    Basic {
        username: String,
        password: SecretString,
    },
    /// No `Authorization` header (controller behind an authenticating proxy,
    /// or a mock server in tests).
    None,
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: SecretString) -> Self {
        Self::Basic {
            username: username.into(),
            password,
        }
    }

    /// Attach these credentials to an outgoing request.
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Basic { username, password } => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
            Self::None => builder,
        }
    }

    /// The configured username, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Basic { username, .. } => Some(username),
            Self::None => None,
        }
    }
}
