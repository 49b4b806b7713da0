//! Swagger UI page.
//!
//! The page loads Swagger UI from a CDN and fetches the document from the
//! JSON URL the facade serves, so it never needs regenerating when routes
//! change.

use crate::html_escape;

/// Default Swagger UI version loaded from the CDN.
pub const DEFAULT_SWAGGER_VERSION: &str = "5.18.2";

/// Swagger UI configuration and HTML generation.
///
/// # Example
///
/// ```
/// use portico_docs::SwaggerUi;
///
/// let page = SwaggerUi::new("/openapi.json", "Inventory").html();
/// assert!(page.contains("url: '/openapi.json'"));
/// ```
#[derive(Debug, Clone)]
pub struct SwaggerUi {
    spec_url: String,
    title: String,
    deep_linking: bool,
    doc_expansion: DocExpansion,
    display_request_duration: bool,
    swagger_version: String,
}

/// Document expansion level for Swagger UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocExpansion {
    /// Show all operations collapsed.
    None,
    /// Show only the list of operations.
    #[default]
    List,
    /// Expand all operations fully.
    Full,
}

impl DocExpansion {
    fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::List => "list",
            Self::Full => "full",
        }
    }
}

impl SwaggerUi {
    /// A page titled `"{api_title} - Swagger UI"` reading the document from
    /// `spec_url`.
    #[must_use]
    pub fn new(spec_url: impl Into<String>, api_title: &str) -> Self {
        Self {
            spec_url: spec_url.into(),
            title: format!("{api_title} - Swagger UI"),
            deep_linking: true,
            doc_expansion: DocExpansion::List,
            display_request_duration: true,
            swagger_version: DEFAULT_SWAGGER_VERSION.to_string(),
        }
    }

    /// Set the page title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Enable or disable deep linking.
    #[must_use]
    pub fn deep_linking(mut self, enabled: bool) -> Self {
        self.deep_linking = enabled;
        self
    }

    /// Set the document expansion level.
    #[must_use]
    pub fn doc_expansion(mut self, expansion: DocExpansion) -> Self {
        self.doc_expansion = expansion;
        self
    }

    /// Enable or disable request duration display.
    #[must_use]
    pub fn display_request_duration(mut self, enabled: bool) -> Self {
        self.display_request_duration = enabled;
        self
    }

    /// Set the Swagger UI version to use.
    #[must_use]
    pub fn swagger_version(mut self, version: impl Into<String>) -> Self {
        self.swagger_version = version.into();
        self
    }

    /// URL the page fetches the document from.
    #[must_use]
    pub fn spec_url(&self) -> &str {
        &self.spec_url
    }

    /// Generate the HTML page.
    #[must_use]
    pub fn html(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui.css" />
    <style>
        html {{
            box-sizing: border-box;
            overflow-y: scroll;
        }}
        body {{
            margin: 0;
            background: #fafafa;
        }}
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {{
            window.ui = SwaggerUIBundle({{
                url: '{spec_url}',
                dom_id: '#swagger-ui',
                deepLinking: {deep_linking},
                docExpansion: '{doc_expansion}',
                displayRequestDuration: {display_duration},
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            }});
        }};
    </script>
</body>
</html>"##,
            title = html_escape(&self.title),
            version = html_escape(&self.swagger_version),
            spec_url = html_escape(&self.spec_url),
            deep_linking = self.deep_linking,
            doc_expansion = self.doc_expansion.as_str(),
            display_duration = self.display_request_duration,
        )
    }

    /// The HTML as bytes for use in HTTP responses.
    #[must_use]
    pub fn html_bytes(&self) -> bytes::Bytes {
        bytes::Bytes::from(self.html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swagger_ui_defaults() {
        let swagger = SwaggerUi::new("/openapi.json", "Test API");
        assert_eq!(swagger.spec_url(), "/openapi.json");
        assert_eq!(swagger.title, "Test API - Swagger UI");
        assert_eq!(swagger.doc_expansion, DocExpansion::List);
    }

    #[test]
    fn test_swagger_ui_customization() {
        let swagger = SwaggerUi::new("/api/openapi.json", "Test API")
            .title("Custom Title")
            .deep_linking(false)
            .doc_expansion(DocExpansion::Full)
            .display_request_duration(false)
            .swagger_version("5.0.0");

        let html = swagger.html();
        assert!(html.contains("<title>Custom Title</title>"));
        assert!(html.contains("deepLinking: false"));
        assert!(html.contains("docExpansion: 'full'"));
        assert!(html.contains("swagger-ui-dist@5.0.0"));
    }

    #[test]
    fn test_swagger_ui_html_generation() {
        let html = SwaggerUi::new("/openapi.json", "Test API").html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("swagger-ui-bundle.js"));
        assert!(html.contains("url: '/openapi.json'"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = SwaggerUi::new("/openapi.json", "<script>alert(1)</script>").html();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; - Swagger UI"));
    }

    #[test]
    fn test_html_bytes() {
        let bytes = SwaggerUi::new("/openapi.json", "Test API").html_bytes();
        assert!(bytes.len() > 100);
    }
}
