//! # Portico Extract
//!
//! Request resolution for Portico.
//!
//! Given an [`Endpoint`](portico_core::Endpoint) and a
//! [`RequestView`](portico_core::RequestView), the [`Resolver`] produces the
//! handler's arguments:
//!
//! | Source | Rule |
//! |--------|------|
//! | path | required capture, text coerced to the declared type |
//! | query | last occurrence for scalars, every occurrence for sequences, flat keys for models |
//! | header / cookie | as query; header names are case-insensitive |
//! | body | JSON only, validated strictly, failures under the parameter name |
//! | file | uploaded-file handles from a multipart body |
//! | dependency | awaited provider, teardown registered in the scope |
//! | security | credentials extracted and authenticated, failing fast |
//!
//! [`RequestParts`] is an in-memory view built from `http::Request<Bytes>`;
//! host adapters with their own request type implement the view trait
//! directly.

#![doc(html_root_url = "https://docs.rs/portico-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod coerce;
mod error;
pub mod multipart;
mod parts;
mod resolver;

pub use error::{PartsError, ResolveError};
pub use multipart::{MultipartConfig, MultipartError};
pub use parts::{RequestParts, RequestPartsBuilder};
pub use resolver::{Resolved, Resolver, ResolverConfig, DEFAULT_MAX_BODY_SIZE};
