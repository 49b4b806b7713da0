//! `multipart/form-data` parsing for file uploads.
//!
//! Uploads are read fully into memory and handed to the resolver as
//! [`UploadedFile`] handles grouped by form field name. Parts without a
//! filename are plain form values and are skipped.

use bytes::Bytes;
use portico_core::{FileMap, UploadedFile};
use std::io;
use thiserror::Error;

/// Default maximum size per part (10 MB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum number of parts.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Limits applied while parsing.
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Maximum size of one part in bytes.
    pub max_field_size: usize,
    /// Maximum number of parts.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl MultipartConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum part size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Set the maximum number of parts.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// Multipart parsing failure.
#[derive(Debug, Error)]
pub enum MultipartError {
    /// The `Content-Type` has no usable boundary.
    #[error("missing or invalid boundary in multipart Content-Type")]
    Boundary,

    /// More parts than allowed.
    #[error("too many multipart fields (max {max})")]
    TooManyFields {
        /// Configured maximum.
        max: usize,
    },

    /// One part is larger than allowed.
    #[error("multipart field '{field}' of {actual} bytes exceeds the limit of {limit} bytes")]
    FieldTooLarge {
        /// Form field name.
        field: String,
        /// Configured limit.
        limit: usize,
        /// Observed size.
        actual: usize,
    },

    /// The body is malformed.
    #[error("multipart parse error: {0}")]
    Parse(#[from] multer::Error),
}

/// Whether `content_type` announces a multipart form.
#[must_use]
pub fn is_multipart(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA)
        .unwrap_or(false)
}

/// Parses the file parts of a multipart body.
///
/// # Errors
///
/// Returns an error if the boundary is missing, the body is malformed or a
/// configured limit is exceeded.
pub async fn parse_files(
    content_type: &str,
    body: Bytes,
    config: &MultipartConfig,
) -> Result<FileMap, MultipartError> {
    let boundary = multer::parse_boundary(content_type).map_err(|_| MultipartError::Boundary)?;
    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut files = FileMap::new();
    let mut count = 0;
    while let Some(field) = multipart.next_field().await? {
        count += 1;
        if count > config.max_fields {
            return Err(MultipartError::TooManyFields {
                max: config.max_fields,
            });
        }

        let Some(filename) = field.file_name().map(String::from) else {
            continue;
        };
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(ToString::to_string);
        let data = field.bytes().await?;
        if data.len() > config.max_field_size {
            return Err(MultipartError::FieldTooLarge {
                field: name,
                limit: config.max_field_size,
                actual: data.len(),
            });
        }

        files.push(name, UploadedFile::new(Some(filename), content_type, data));
    }

    tracing::trace!(parts = count, files = files.len(), "parsed multipart body");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "X-PORTICO-BOUNDARY";

    fn body(parts: &[(&str, Option<&str>, &str)]) -> Bytes {
        let mut out = String::new();
        for (name, filename, content) in parts {
            out.push_str(&format!("--{BOUNDARY}\r\n"));
            match filename {
                Some(filename) => {
                    out.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                    ));
                    out.push_str("Content-Type: text/plain\r\n\r\n");
                }
                None => {
                    out.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"));
                }
            }
            out.push_str(content);
            out.push_str("\r\n");
        }
        out.push_str(&format!("--{BOUNDARY}--\r\n"));
        Bytes::from(out)
    }

    fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    #[test]
    fn test_is_multipart() {
        assert!(is_multipart(&content_type()));
        assert!(!is_multipart("application/json"));
        assert!(!is_multipart("not a mime"));
    }

    #[tokio::test]
    async fn test_parse_files() {
        let body = body(&[
            ("docs", Some("a.txt"), "alpha"),
            ("note", None, "plain value"),
            ("docs", Some("b.txt"), "beta"),
        ]);
        let files = parse_files(&content_type(), body, &MultipartConfig::default())
            .await
            .unwrap();

        let docs = files.get_all("docs");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].filename(), Some("a.txt"));
        assert_eq!(docs[0].content_type(), Some("text/plain"));
        assert_eq!(docs[1].bytes().as_ref(), b"beta");
        assert!(files.get_all("note").is_empty());
    }

    #[tokio::test]
    async fn test_field_too_large() {
        let body = body(&[("docs", Some("a.txt"), "0123456789")]);
        let err = parse_files(&content_type(), body, &MultipartConfig::new().max_field_size(4))
            .await
            .unwrap_err();
        assert!(matches!(err, MultipartError::FieldTooLarge { limit: 4, .. }));
    }

    #[tokio::test]
    async fn test_too_many_fields() {
        let body = body(&[("a", None, "1"), ("b", None, "2")]);
        let err = parse_files(&content_type(), body, &MultipartConfig::new().max_fields(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MultipartError::TooManyFields { max: 1 }));
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let err = parse_files("multipart/form-data", Bytes::new(), &MultipartConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MultipartError::Boundary));
    }
}
