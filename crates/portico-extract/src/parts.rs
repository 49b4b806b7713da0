//! In-memory [`RequestView`] built from an `http::Request`.
//!
//! Host adapters that already buffer the body can convert their request into
//! [`RequestParts`] and hand it to the resolver; everything else implements
//! [`RequestView`] directly.

use crate::error::PartsError;
use crate::multipart::{self, MultipartConfig};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use portico_core::{BodyError, Cookies, FileMap, PathParams, QueryMap, RequestView, UploadedFile};

/// A fully buffered request.
///
/// # Example
///
/// ```rust
/// use portico_core::RequestView;
/// use portico_extract::RequestParts;
/// use http::Method;
///
/// let parts = RequestParts::builder(Method::GET, "/items/5?tag=a&tag=b")
///     .path_param("item_id", "5")
///     .header("cookie", "session=abc")
///     .build()
///     .unwrap();
///
/// assert_eq!(parts.path(), "/items/5");
/// assert_eq!(parts.query().get_all("tag"), vec!["a", "b"]);
/// assert_eq!(parts.cookies().get("session"), Some("abc"));
/// assert_eq!(parts.path_params().get("item_id"), Some("5"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: Method,
    uri: Uri,
    path_params: PathParams,
    query: QueryMap,
    headers: HeaderMap,
    cookies: Cookies,
    files: FileMap,
    body: Bytes,
}

impl RequestParts {
    /// Starts building a request.
    #[must_use]
    pub fn builder(method: Method, uri: &str) -> RequestPartsBuilder {
        RequestPartsBuilder::new(method, uri)
    }

    /// Converts a buffered `http::Request`.
    ///
    /// The query string and cookies are parsed; a `multipart/form-data`
    /// body is parsed into files.
    ///
    /// # Errors
    ///
    /// Returns an error if the query string or the multipart body is
    /// malformed.
    pub async fn from_request(
        request: Request<Bytes>,
        path_params: PathParams,
        config: &MultipartConfig,
    ) -> Result<Self, PartsError> {
        let (parts, body) = request.into_parts();
        let query = QueryMap::parse(parts.uri.query().unwrap_or_default())?;
        let cookies = Cookies::from_headers(&parts.headers);

        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let files = match content_type {
            Some(ct) if multipart::is_multipart(ct) => {
                multipart::parse_files(ct, body.clone(), config).await?
            }
            _ => FileMap::new(),
        };

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            path_params,
            query,
            headers: parts.headers,
            cookies,
            files,
            body,
        })
    }

    /// Replaces the path captures, typically after routing.
    pub fn set_path_params(&mut self, params: PathParams) {
        self.path_params = params;
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the buffered body.
    #[must_use]
    pub fn raw_body(&self) -> &Bytes {
        &self.body
    }
}

#[async_trait]
impl RequestView for RequestParts {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        self.uri.path()
    }

    fn path_params(&self) -> &PathParams {
        &self.path_params
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
        Ok(self.body.clone())
    }
}

/// Builder for [`RequestParts`], mostly for tests and simple adapters.
#[derive(Debug)]
pub struct RequestPartsBuilder {
    method: Method,
    uri: String,
    path_params: PathParams,
    headers: HeaderMap,
    files: FileMap,
    body: Bytes,
    invalid_header: Option<String>,
}

impl RequestPartsBuilder {
    fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            path_params: PathParams::new(),
            headers: HeaderMap::new(),
            files: FileMap::new(),
            body: Bytes::new(),
            invalid_header: None,
        }
    }

    /// Adds a path capture.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Appends a header; repeated names keep every value.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => self.invalid_header = Some(name.to_string()),
        }
        self
    }

    /// Sets a JSON body and its content type.
    #[must_use]
    pub fn json(self, value: &serde_json::Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }

    /// Sets the raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Attaches an uploaded file without building a multipart body.
    #[must_use]
    pub fn file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.push(field, file);
        self
    }

    /// Finishes the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI, a header or the query string is invalid.
    pub fn build(self) -> Result<RequestParts, PartsError> {
        if let Some(name) = self.invalid_header {
            return Err(PartsError::InvalidHeader(name));
        }
        let uri: Uri = self.uri.parse()?;
        let query = QueryMap::parse(uri.query().unwrap_or_default())?;
        let cookies = Cookies::from_headers(&self.headers);
        Ok(RequestParts {
            method: self.method,
            uri,
            path_params: self.path_params,
            query,
            headers: self.headers,
            cookies,
            files: self.files,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_repeated_headers() {
        let parts = RequestParts::builder(Method::GET, "/")
            .header("x-token", "a")
            .header("X-Token", "b")
            .build()
            .unwrap();
        let values: Vec<&str> = parts
            .headers()
            .get_all("x-token")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn test_builder_invalid_header() {
        let err = RequestParts::builder(Method::GET, "/")
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, PartsError::InvalidHeader(ref name) if name == "bad header"));
    }

    #[test]
    fn test_builder_json_body() {
        let parts = RequestParts::builder(Method::POST, "/items")
            .json(&serde_json::json!({"name": "pen"}))
            .build()
            .unwrap();
        assert_eq!(parts.content_type(), Some("application/json"));
        assert_eq!(parts.raw_body().as_ref(), br#"{"name":"pen"}"#);
    }

    #[tokio::test]
    async fn test_from_request_parses_multipart() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n\r\nhello\r\n--B--\r\n";
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload?x=1")
            .header("content-type", "multipart/form-data; boundary=B")
            .body(Bytes::from(body))
            .unwrap();
        let parts = RequestParts::from_request(request, PathParams::new(), &MultipartConfig::default())
            .await
            .unwrap();
        assert_eq!(parts.query().get("x"), Some("1"));
        let files = parts.files().get_all("doc");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].bytes().as_ref(), b"hello");
        assert_eq!(parts.body().await.unwrap().len(), body.len());
    }
}
