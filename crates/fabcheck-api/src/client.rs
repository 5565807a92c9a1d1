// Fabric controller HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, Basic auth and status
// classification. Resource endpoints (tenants, routers, sflow, ...) are
// inherent methods defined in `crate::endpoints` so this module stays
// focused on transport mechanics.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Default path prefix under which the controller mounts its REST API.
pub const API_PREFIX: &str = "/mars/";

/// Async client for the fabric controller REST API.
///
/// Every request carries the configured credentials and shares one cookie
/// jar, so the controller session persists for the lifetime of the client.
#[derive(Debug, Clone)]
pub struct FabricClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl FabricClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Create a client from a controller URL and credentials.
    ///
    /// `base_url` may be the controller root (`http://host:8181`) or already
    /// include the API prefix (`http://host:8181/mars/`).
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client_with_headers(HeaderMap::new())?;
        Self::with_client(http, base_url, credentials)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Ensure the base URL ends with the API prefix and a trailing slash so
    /// relative joins (`v1/tenants/v1`) land under it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        let prefix = API_PREFIX.trim_end_matches('/');

        if path.ends_with(prefix) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}{prefix}/"));
        }
        Ok(url)
    }

    /// The normalized API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path onto the API base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.credentials.apply(self.http.request(method, url))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.request(Method::GET, url).send().await?;
        self.handle_response(path, resp).await
    }

    /// GET that maps an empty object (`{}`) or 404 to `None`.
    ///
    /// Several per-device endpoints report "nothing configured" this way.
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, Error> {
        let value: serde_json::Value = match self.get(path).await {
            Ok(v) => v,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        match &value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(map) if map.is_empty() => Ok(None),
            _ => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: value.to_string(),
                }),
        }
    }

    pub(crate) async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.request(Method::POST, url).json(body).send().await?;
        self.handle_empty(path, resp).await
    }

    pub(crate) async fn put<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.request(Method::PUT, url).json(body).send().await?;
        self.handle_empty(path, resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.request(Method::DELETE, url).send().await?;
        self.handle_empty(path, resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::classify(path, status, resp).await);
        }

        let body = resp.text().await?;
        trace!(path, bytes = body.len(), "response body");
        serde_json::from_str(&body).map_err(|e| {
            let preview = truncate_chars(&body, 200);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn handle_empty(&self, path: &str, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::classify(path, status, resp).await)
        }
    }

    /// Map a non-success response to an [`Error`] variant.
    async fn classify(path: &str, status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = if raw.is_empty() {
            status.to_string()
        } else {
            truncate_chars(&raw, 500).to_owned()
        };
        classify_status(path, status, message)
    }
}

/// Status (and body) classification shared by every endpoint.
pub(crate) fn classify_status(path: &str, status: StatusCode, message: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication { message },
        StatusCode::NOT_FOUND => Error::NotFound { path: path.into() },
        StatusCode::CONFLICT => Error::DependencyConflict {
            path: path.into(),
            message,
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            if mentions_dependency(&message) {
                Error::DependencyConflict {
                    path: path.into(),
                    message,
                }
            } else {
                Error::Rejected {
                    status: status.as_u16(),
                    message,
                }
            }
        }
        _ => Error::Server {
            status: status.as_u16(),
            message,
        },
    }
}

/// At most `max` characters of `text`, cut on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices().nth(max).map_or(text, |(i, _)| &text[..i])
}

fn mentions_dependency(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["in use", "depend", "referenced", "still has"]
        .iter()
        .any(|needle| lower.contains(needle))
}
