//! # Portico Docs
//!
//! OpenAPI 3.1 generation for Portico endpoints, plus HTML pages for
//! Swagger UI and ReDoc.
//!
//! ## Example
//!
//! ```
//! use portico_core::{ApiError, EndpointBuilder, ParameterDescriptor, Router, SchemaCache, TypeSpec};
//! use portico_docs::{OpenApiGenerator, SwaggerUi};
//!
//! let mut router = Router::new();
//! router
//!     .add(
//!         EndpointBuilder::get("/items/{item_id}")
//!             .param(ParameterDescriptor::path("item_id", TypeSpec::Integer))
//!             .handler_sync(|_| Ok::<_, ApiError>(())),
//!     )
//!     .unwrap();
//!
//! let doc = OpenApiGenerator::new()
//!     .title("Inventory")
//!     .generate(router.endpoints(), &SchemaCache::new())
//!     .unwrap();
//! let op = doc.operation(&http::Method::GET, "/items/{item_id}").unwrap();
//! assert_eq!(op.operation_id, "get_items_item_id");
//!
//! let page = SwaggerUi::new("/openapi.json", &doc.info.title).html();
//! assert!(page.contains("Inventory - Swagger UI"));
//! ```

#![doc(html_root_url = "https://docs.rs/portico-docs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod openapi;
mod redoc;
mod swagger;

pub use error::{DocsError, DocsResult};
pub use openapi::{
    Components, Contact, Info, License, MediaType, OpenApi, OpenApiGenerator, Operation,
    Parameter, ParameterIn, PathItem, RequestBody, Response, SecurityRequirementObject,
    SecurityScheme, Server, Tag, HTTP_VALIDATION_ERROR, OPENAPI_VERSION, VALIDATION_ERROR,
};
pub use redoc::{ExpandResponses, ReDoc, DEFAULT_REDOC_VERSION};
pub use swagger::{DocExpansion, SwaggerUi, DEFAULT_SWAGGER_VERSION};

/// Escapes text for HTML element content and attribute values.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
