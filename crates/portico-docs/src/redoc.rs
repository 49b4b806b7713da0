//! ReDoc page.

use crate::html_escape;

/// Default ReDoc version loaded from the CDN.
pub const DEFAULT_REDOC_VERSION: &str = "2.1.5";

/// ReDoc configuration and HTML generation.
#[derive(Debug, Clone)]
pub struct ReDoc {
    spec_url: String,
    title: String,
    expand_responses: ExpandResponses,
    hide_download_button: bool,
    disable_search: bool,
    redoc_version: String,
}

/// Which responses ReDoc expands by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpandResponses {
    /// Expand all responses.
    All,
    /// Expand only success responses.
    #[default]
    Success,
    /// Don't expand any responses.
    None,
}

impl ExpandResponses {
    fn as_attr(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Success => "200,201,204",
            Self::None => "",
        }
    }
}

impl ReDoc {
    /// A page titled `"{api_title} - ReDoc"` reading the document from
    /// `spec_url`.
    #[must_use]
    pub fn new(spec_url: impl Into<String>, api_title: &str) -> Self {
        Self {
            spec_url: spec_url.into(),
            title: format!("{api_title} - ReDoc"),
            expand_responses: ExpandResponses::Success,
            hide_download_button: false,
            disable_search: false,
            redoc_version: DEFAULT_REDOC_VERSION.to_string(),
        }
    }

    /// Set the page title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set response expansion.
    #[must_use]
    pub fn expand_responses(mut self, expand: ExpandResponses) -> Self {
        self.expand_responses = expand;
        self
    }

    /// Hide or show the download button.
    #[must_use]
    pub fn hide_download_button(mut self, hide: bool) -> Self {
        self.hide_download_button = hide;
        self
    }

    /// Enable or disable search.
    #[must_use]
    pub fn disable_search(mut self, disable: bool) -> Self {
        self.disable_search = disable;
        self
    }

    /// Set the ReDoc version to use.
    #[must_use]
    pub fn redoc_version(mut self, version: impl Into<String>) -> Self {
        self.redoc_version = version.into();
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
        let mut options = vec![format!(
            r#"expand-responses="{}""#,
            self.expand_responses.as_attr()
        )];
        if self.hide_download_button {
            options.push("hide-download-button".to_string());
        }
        if self.disable_search {
            options.push("disable-search".to_string());
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link href="https://fonts.googleapis.com/css?family=Montserrat:300,400,700|Roboto:300,400,700" rel="stylesheet">
    <style>
        body {{
            margin: 0;
            padding: 0;
        }}
    </style>
</head>
<body>
    <redoc spec-url="{spec_url}" {options}></redoc>
    <script src="https://cdn.redoc.ly/redoc/v{version}/bundles/redoc.standalone.js"></script>
</body>
</html>"#,
            title = html_escape(&self.title),
            spec_url = html_escape(&self.spec_url),
            options = options.join(" "),
            version = html_escape(&self.redoc_version),
        )
    }

    /// The HTML as bytes for use in HTTP responses.
    #[must_use]
    pub fn html_bytes(&self) -> bytes::Bytes {
        bytes::Bytes::from(self.html())
    }
}
