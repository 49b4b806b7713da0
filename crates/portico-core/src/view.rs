//! The abstract request seen by the resolver.
//!
//! Host adapters implement [`RequestView`] once per framework; the resolver
//! only ever talks to this trait. `portico-extract` ships `RequestParts`, an
//! in-memory implementation built from `http::Request<Bytes>`.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method};
use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;

/// Path captures in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a capture.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push((name.into(), value.into()));
    }

    /// Looks a capture up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether there are no captures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates captures in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Query string as an ordered multi-map.
///
/// Repeated keys keep every occurrence in arrival order.
///
/// # Example
///
/// ```
/// use portico_core::QueryMap;
///
/// let query = QueryMap::parse("tag=a&tag=b&limit=10").unwrap();
/// assert_eq!(query.get_all("tag"), vec!["a", "b"]);
/// assert_eq!(query.get("limit"), Some("10"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    pairs: Vec<(String, String)>,
}

impl QueryMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL-encoded query string (without the leading `?`).
    pub fn parse(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query)?;
        Ok(Self { pairs })
    }

    /// Appends a pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Last occurrence of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every occurrence of `key`, in order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Whether `key` occurs at all.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Cookies from the `Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies {
    cookies: HashMap<String, String>,
}

impl Cookies {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses every `Cookie` header in `headers`.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = Self::new();
        for value in headers.get_all(http::header::COOKIE) {
            if let Ok(value) = value.to_str() {
                cookies.extend_from_header(value);
            }
        }
        cookies
    }

    /// Parses a single `Cookie` header value.
    #[must_use]
    pub fn parse(header_value: &str) -> Self {
        let mut cookies = Self::new();
        cookies.extend_from_header(header_value);
        cookies
    }

    fn extend_from_header(&mut self, header_value: &str) {
        for pair in header_value.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                let value = value.trim().trim_matches('"');
                self.cookies
                    .insert(name.trim().to_string(), value.to_string());
            }
        }
    }

    /// Sets a cookie.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Looks a cookie up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Whether the jar is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// A file received in a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl UploadedFile {
    /// Creates a file handle.
    #[must_use]
    pub fn new(filename: Option<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            filename,
            content_type,
            data,
        }
    }

    /// Client-supplied file name.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Declared content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// File contents.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Uploaded files keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMap {
    files: IndexMap<String, Vec<UploadedFile>>,
}

impl FileMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file under `field`.
    pub fn push(&mut self, field: impl Into<String>, file: UploadedFile) {
        self.files.entry(field.into()).or_default().push(file);
    }

    /// Files uploaded under `field`.
    #[must_use]
    pub fn get_all(&self, field: &str) -> &[UploadedFile] {
        self.files.get(field).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files were uploaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Failure reading the request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyError {
    /// The body exceeds the configured limit.
    #[error("request body of {actual} bytes exceeds the limit of {limit} bytes")]
    TooLarge {
        /// Configured limit.
        limit: usize,
        /// Observed size.
        actual: usize,
    },
    /// The transport failed.
    #[error("failed to read request body: {0}")]
    Read(String),
}

/// Framework-neutral view of one request.
///
/// Registration must complete before requests are resolved; a view is only
/// ever read.
#[async_trait]
pub trait RequestView: Send + Sync {
    /// HTTP method.
    fn method(&self) -> &Method;

    /// Request path without the query string.
    fn path(&self) -> &str;

    /// Captures matched from the path template.
    fn path_params(&self) -> &PathParams;

    /// Query string multi-map.
    fn query(&self) -> &QueryMap;

    /// Request headers (case-insensitive lookup).
    fn headers(&self) -> &HeaderMap;

    /// Parsed cookies.
    fn cookies(&self) -> &Cookies;

    /// Uploaded files.
    fn files(&self) -> &FileMap;

    /// The `Content-Type` header, if present and valid UTF-8.
    fn content_type(&self) -> Option<&str> {
        self.headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Reads the full body.
    async fn body(&self) -> Result<Bytes, BodyError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A request with nothing in it.
    #[derive(Debug)]
    pub(crate) struct EmptyView {
        pub(crate) method: Method,
        pub(crate) params: PathParams,
        pub(crate) query: QueryMap,
        pub(crate) headers: HeaderMap,
        pub(crate) cookies: Cookies,
        pub(crate) files: FileMap,
    }

    impl Default for EmptyView {
        fn default() -> Self {
            Self {
                method: Method::GET,
                params: PathParams::new(),
                query: QueryMap::new(),
                headers: HeaderMap::new(),
                cookies: Cookies::new(),
                files: FileMap::new(),
            }
        }
    }

    #[async_trait]
    impl RequestView for EmptyView {
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
}
