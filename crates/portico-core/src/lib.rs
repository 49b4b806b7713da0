//! # Portico Core
//!
//! Core types for the Portico request-handling layer.
//!
//! This crate holds everything that is decided at registration time plus the
//! vocabulary shared with the request resolver:
//!
//! - [`Model`], [`TypeSpec`] and [`SchemaCache`] - structural descriptions of
//!   record types, computed once and reused for validation and documents
//! - [`ParameterDescriptor`] - where one handler argument comes from
//! - [`EndpointBuilder`], [`Endpoint`] and [`Router`] - route registration
//! - [`RequestView`] - the boundary host adapters implement
//! - [`Provider`], [`Authenticator`] and [`DependencyScope`] - injected values,
//!   credentials and their teardown
//! - [`ApiError`], [`ConfigurationError`] and [`ValidationFailure`] - the
//!   error vocabulary

#![doc(html_root_url = "https://docs.rs/portico-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod cache;
mod dependency;
pub mod di;
mod endpoint;
mod error;
mod handler;
mod model;
mod param;
mod registry;
pub mod schema;
mod security;
mod validate;
mod view;

pub use args::{ArgumentError, ResolvedArguments};
pub use cache::{schema_for, ModelInfo, SchemaCache};
pub use dependency::{
    provider_fn, BoxFuture, ContainerProvider, DependencyContext, DependencyScope, ExitStatus,
    FnProvider, Provided, Provider, Teardown,
};
pub use di::Container;
pub use endpoint::{join_paths, Endpoint, EndpointBuilder, PathTemplate, ResponseContract};
pub use error::{
    ApiError, ApiResult, ConfigurationError, ErrorCategory, ErrorDetail, ErrorEnvelope, ErrorKind,
    HandlerContractError, PathSegment, ValidationFailure,
};
pub use handler::{Handler, HandlerError, HandlerOutput};
pub use model::{Constraints, FieldSpec, Model, ModelRef, Pattern, TypeSpec, Typed};
pub use param::{ParamSource, ParameterDescriptor, SecurityBinding};
pub use registry::{IncludeOptions, Router};
pub use schema::{Schema, SchemaType, COMPONENTS_PREFIX};
pub use security::{
    authenticator_fn, ApiKeyLocation, AuthFailure, AuthenticationError, Authenticator,
    Credentials, FnAuthenticator, Principal, SecurityRequirement, SecurityScheme,
};
pub use validate::{parse_bool, Coercion, Validator};
pub use view::{
    BodyError, Cookies, FileMap, PathParams, QueryMap, RequestView, UploadedFile,
};
