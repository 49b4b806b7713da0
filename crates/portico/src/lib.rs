//! # Portico
//!
//! Typed request handling and OpenAPI documents for any host web framework.
//!
//! Portico sits between a host framework and application handlers:
//!
//! - routes are declared with typed parameters ([`EndpointBuilder`](portico_core::EndpointBuilder))
//! - requests are resolved into validated arguments through an abstract
//!   [`RequestView`](portico_core::RequestView)
//! - handler output is checked against the declared response contract
//! - an OpenAPI 3.1 document is generated from the routes and cached
//!
//! ## Quick Start
//!
//! ```
//! use portico::prelude::*;
//!
//! struct Item;
//!
//! impl Model for Item {
//!     const NAME: &'static str = "Item";
//!
//!     fn fields() -> Vec<FieldSpec> {
//!         vec![FieldSpec::of::<i64>("id"), FieldSpec::of::<String>("name")]
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mut api = Api::new(PorticoConfig::default());
//! api.add(
//!     EndpointBuilder::get("/items/{item_id}")
//!         .param(ParameterDescriptor::path("item_id", TypeSpec::Integer))
//!         .returns(TypeSpec::model::<Item>())
//!         .handler_sync(|args| {
//!             let id: i64 = args.get("item_id")?;
//!             Ok::<_, ApiError>(serde_json::json!({"id": id, "name": "x"}))
//!         }),
//! )
//! .unwrap();
//!
//! let request = http::Request::get("/items/42").body(bytes::Bytes::new()).unwrap();
//! let response = api.handle(request).await;
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.body().as_ref(), br#"{"id":42,"name":"x"}"#);
//!
//! let doc = api.openapi().unwrap();
//! assert!(doc.component("Item").is_some());
//! # });
//! ```
//!
//! ## Request flow
//!
//! ```text
//! RequestView → Resolver → handler → teardowns → ResponseSerializer
//!                  │                                   │
//!                  └──────────── transport ◄───────────┘
//! ```
//!
//! Only [`transport`] knows status codes: validation failures are `422`
//! (`400` when the input did not parse), authentication failures `401`/`403`,
//! oversized bodies `413` and contract violations by handlers `500`.

#![doc(html_root_url = "https://docs.rs/portico/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod dispatch;
mod serialize;
pub mod transport;

pub use api::Api;
pub use dispatch::{Dispatcher, Outcome};
pub use serialize::{ResponseSerializer, Serialized};

pub use portico_config::{ConfigLoader, PorticoConfig, ScalarStyle};

// Re-export the member crates
pub use portico_config as config;
pub use portico_core as core;
pub use portico_docs as docs;
pub use portico_extract as extract;
pub use portico_telemetry as telemetry;

/// Common imports for applications.
///
/// ```
/// use portico::prelude::*;
///
/// let api = Api::default();
/// assert!(api.endpoints().is_empty());
/// ```
pub mod prelude {
    pub use crate::{Api, ConfigLoader, PorticoConfig, ScalarStyle};
    pub use portico_core::{
        provider_fn, authenticator_fn, ApiError, Constraints, Container, Credentials,
        EndpointBuilder, ExitStatus, FieldSpec, IncludeOptions, Model, ParameterDescriptor,
        Provided, ResolvedArguments, ResponseContract, Router, SecurityRequirement,
        SecurityScheme, TypeSpec,
    };
    pub use portico_extract::RequestParts;
}
