//! Security schemes, credential extraction and authentication.
//!
//! A security parameter names a [`SecurityScheme`] (how credentials travel)
//! and an [`Authenticator`] (whether they are any good). The resolver pulls
//! [`Credentials`] out of the request with [`SecurityScheme::extract`] and
//! hands them to the authenticator, whose principal becomes the argument.

use crate::view::RequestView;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Where an API key is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKeyLocation {
    /// Request header.
    Header,
    /// Query parameter.
    Query,
    /// Cookie.
    Cookie,
}

impl ApiKeyLocation {
    /// Lowercase name as used in the document.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Query => "query",
            Self::Cookie => "cookie",
        }
    }
}

/// How credentials travel in a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecurityScheme {
    /// `Authorization: Bearer <token>`.
    HttpBearer {
        /// Optional token format hint (e.g. "JWT").
        bearer_format: Option<String>,
    },
    /// `Authorization: Basic <base64(user:password)>`.
    HttpBasic,
    /// A key in a header, query parameter or cookie.
    ApiKey {
        /// Where the key is.
        location: ApiKeyLocation,
        /// Header, parameter or cookie name.
        name: String,
    },
}

impl SecurityScheme {
    /// Bearer tokens without a format hint.
    #[must_use]
    pub fn bearer() -> Self {
        Self::HttpBearer { bearer_format: None }
    }

    /// API key in a header.
    #[must_use]
    pub fn api_key_header(name: impl Into<String>) -> Self {
        Self::ApiKey {
            location: ApiKeyLocation::Header,
            name: name.into(),
        }
    }

    /// API key in the query string.
    #[must_use]
    pub fn api_key_query(name: impl Into<String>) -> Self {
        Self::ApiKey {
            location: ApiKeyLocation::Query,
            name: name.into(),
        }
    }

    /// API key in a cookie.
    #[must_use]
    pub fn api_key_cookie(name: impl Into<String>) -> Self {
        Self::ApiKey {
            location: ApiKeyLocation::Cookie,
            name: name.into(),
        }
    }

    /// The challenge sent in `WWW-Authenticate` when credentials are missing
    /// or rejected.
    #[must_use]
    pub fn challenge(&self) -> &'static str {
        match self {
            Self::HttpBearer { .. } => "Bearer",
            Self::HttpBasic => "Basic",
            Self::ApiKey { .. } => "APIKey",
        }
    }

    /// Pulls credentials out of the request.
    pub fn extract(&self, view: &dyn RequestView) -> Result<Credentials, AuthenticationError> {
        match self {
            Self::HttpBearer { .. } => {
                let token = authorization(view, "bearer").ok_or_else(|| {
                    AuthenticationError::unauthorized("Not authenticated").with_challenge(self.challenge())
                })?;
                Ok(Credentials::Bearer(token.to_string()))
            }
            Self::HttpBasic => {
                let encoded = authorization(view, "basic").ok_or_else(|| {
                    AuthenticationError::unauthorized("Not authenticated").with_challenge(self.challenge())
                })?;
                decode_basic(encoded).ok_or_else(|| {
                    AuthenticationError::unauthorized("Invalid authentication credentials")
                        .with_challenge(self.challenge())
                })
            }
            Self::ApiKey { location, name } => {
                let key = match location {
                    ApiKeyLocation::Header => view
                        .headers()
                        .get(name.as_str())
                        .and_then(|v| v.to_str().ok()),
                    ApiKeyLocation::Query => view.query().get(name),
                    ApiKeyLocation::Cookie => view.cookies().get(name),
                };
                key.filter(|k| !k.is_empty())
                    .map(|k| Credentials::ApiKey(k.to_string()))
                    .ok_or_else(|| AuthenticationError::forbidden("Not authenticated"))
            }
        }
    }
}

fn authorization<'a>(view: &'a dyn RequestView, scheme: &str) -> Option<&'a str> {
    let value = view
        .headers()
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let (given, rest) = value.split_once(' ')?;
    let rest = rest.trim();
    (given.eq_ignore_ascii_case(scheme) && !rest.is_empty()).then_some(rest)
}

fn decode_basic(encoded: &str) -> Option<Credentials> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials::Basic {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Credentials extracted from a request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Bearer token.
    Bearer(String),
    /// HTTP basic pair.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// API key.
    ApiKey(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Basic { username, .. } => write!(f, "Basic({username}:***)"),
            Self::ApiKey(_) => f.write_str("ApiKey(***)"),
        }
    }
}

/// A named scheme plus required scopes on an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecurityRequirement {
    scheme: String,
    scopes: Vec<String>,
}

impl SecurityRequirement {
    /// Requirement on `scheme` with no scopes.
    #[must_use]
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            scopes: Vec::new(),
        }
    }

    /// Sets the scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Scheme name.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Scopes.
    #[must_use]
    pub fn scope_list(&self) -> &[String] {
        &self.scopes
    }
}

/// Whether the failure means "who are you" or "not allowed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Credentials missing or invalid.
    Unauthorized,
    /// Credentials valid but insufficient.
    Forbidden,
}

/// Security resolution failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthenticationError {
    /// Failure kind.
    pub kind: AuthFailure,
    /// Message for the client.
    pub message: String,
    /// `WWW-Authenticate` challenge, if any.
    pub challenge: Option<String>,
}

impl AuthenticationError {
    /// Missing or invalid credentials.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            kind: AuthFailure::Unauthorized,
            message: message.into(),
            challenge: None,
        }
    }

    /// Valid but insufficient credentials.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            kind: AuthFailure::Forbidden,
            message: message.into(),
            challenge: None,
        }
    }

    /// Sets the challenge.
    #[must_use]
    pub fn with_challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }
}

/// Authenticated identity, type-erased.
pub type Principal = Arc<dyn Any + Send + Sync>;

/// Turns credentials into a principal.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Validates `credentials`.
    async fn authenticate(&self, credentials: Credentials) -> Result<Principal, AuthenticationError>;
}

/// [`Authenticator`] backed by an async closure.
pub struct FnAuthenticator<F> {
    f: F,
}

/// Wraps an async closure as an [`Authenticator`].
///
/// # Example
///
/// ```
/// use portico_core::{authenticator_fn, AuthenticationError, Credentials};
///
/// let auth = authenticator_fn(|credentials: Credentials| async move {
///     match credentials {
///         Credentials::Bearer(token) if token == "secret" => Ok("alice".to_string()),
///         _ => Err(AuthenticationError::unauthorized("invalid token")),
///     }
/// });
/// # let _ = auth;
/// ```
pub fn authenticator_fn<F, Fut, P>(f: F) -> FnAuthenticator<F>
where
    F: Fn(Credentials) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<P, AuthenticationError>> + Send + 'static,
    P: Send + Sync + 'static,
{
    FnAuthenticator { f }
}

#[async_trait]
impl<F, Fut, P> Authenticator for FnAuthenticator<F>
where
    F: Fn(Credentials) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<P, AuthenticationError>> + Send + 'static,
    P: Send + Sync + 'static,
{
    async fn authenticate(&self, credentials: Credentials) -> Result<Principal, AuthenticationError> {
        let principal = (self.f)(credentials).await?;
        Ok(Arc::new(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Cookies, FileMap, PathParams, QueryMap};
    use crate::BodyError;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, Method};

    struct View {
        method: Method,
        headers: HeaderMap,
        query: QueryMap,
        cookies: Cookies,
        params: PathParams,
        files: FileMap,
    }

    impl View {
        fn new() -> Self {
            Self {
                method: Method::GET,
                headers: HeaderMap::new(),
                query: QueryMap::new(),
                cookies: Cookies::new(),
                params: PathParams::new(),
                files: FileMap::new(),
            }
        }

        fn header(mut self, name: &'static str, value: &'static str) -> Self {
            self.headers.insert(name, HeaderValue::from_static(value));
            self
        }
    }

    #[async_trait]
    impl RequestView for View {
        fn method(&self) -> &Method {
            &self.method
        }
        fn path(&self) -> &str {
            "/"
        }
        fn path_params(&self) -> &PathParams {
            &self.params
        }
        fn query(&self) -> &QueryMap {
            &self.query
        }
        fn headers(&self) -> &HeaderMap {
            &self.headers
        }
        fn cookies(&self) -> &Cookies {
            &self.cookies
        }
        fn files(&self) -> &FileMap {
            &self.files
        }
        async fn body(&self) -> Result<Bytes, BodyError> {
            Ok(Bytes::new())
        }
    }

    #[test]
    fn test_bearer_extraction() {
        let view = View::new().header("authorization", "bearer abc.def");
        assert_eq!(
            SecurityScheme::bearer().extract(&view).unwrap(),
            Credentials::Bearer("abc.def".to_string())
        );

        let err = SecurityScheme::bearer().extract(&View::new()).unwrap_err();
        assert_eq!(err.kind, AuthFailure::Unauthorized);
        assert_eq!(err.challenge.as_deref(), Some("Bearer"));
    }

    #[test]
    fn test_basic_extraction() {
        // "alice:s3cret"
        let view = View::new().header("authorization", "Basic YWxpY2U6czNjcmV0");
        assert_eq!(
            SecurityScheme::HttpBasic.extract(&view).unwrap(),
            Credentials::Basic {
                username: "alice".to_string(),
                password: "s3cret".to_string(),
            }
        );

        let view = View::new().header("authorization", "Basic !!!");
        assert!(SecurityScheme::HttpBasic.extract(&view).is_err());
    }

    #[test]
    fn test_api_key_sources() {
        let view = View::new().header("x-api-key", "k1");
        assert_eq!(
            SecurityScheme::api_key_header("X-API-Key").extract(&view).unwrap(),
            Credentials::ApiKey("k1".to_string())
        );

        let mut view = View::new();
        view.query.push("api_key", "k2");
        view.cookies.insert("session", "k3");
        assert_eq!(
            SecurityScheme::api_key_query("api_key").extract(&view).unwrap(),
            Credentials::ApiKey("k2".to_string())
        );
        assert_eq!(
            SecurityScheme::api_key_cookie("session").extract(&view).unwrap(),
            Credentials::ApiKey("k3".to_string())
        );

        let err = SecurityScheme::api_key_header("X-API-Key")
            .extract(&View::new())
            .unwrap_err();
        assert_eq!(err.kind, AuthFailure::Forbidden);
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let debug = format!("{:?}", Credentials::Bearer("secret".to_string()));
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_fn_authenticator() {
        let auth = authenticator_fn(|credentials: Credentials| async move {
            match credentials {
                Credentials::Bearer(token) if token == "good" => Ok(7_u32),
                _ => Err(AuthenticationError::unauthorized("bad token")),
            }
        });
        let principal = auth
            .authenticate(Credentials::Bearer("good".to_string()))
            .await
            .unwrap();
        assert_eq!(principal.downcast_ref::<u32>(), Some(&7));
        assert!(auth
            .authenticate(Credentials::Bearer("bad".to_string()))
            .await
            .is_err());
    }
}
