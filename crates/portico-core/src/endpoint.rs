//! Endpoints, path templates and response contracts.
//!
//! An [`EndpointBuilder`] collects everything about one route; validation
//! happens when it is registered with a [`Router`](crate::Router), after
//! which the [`Endpoint`] is immutable and shared behind an `Arc`.

use crate::error::{ApiError, ConfigurationError};
use crate::handler::Handler;
use crate::model::{ModelRef, TypeSpec, Typed};
use crate::param::{ParamSource, ParameterDescriptor};
use crate::security::SecurityRequirement;
use crate::view::PathParams;
use http::Method;
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;

/// One segment of a parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path template such as `/items/{item_id}`.
///
/// # Example
///
/// ```
/// use portico_core::PathTemplate;
///
/// let template = PathTemplate::parse("/items/{item_id}").unwrap();
/// assert_eq!(template.param_names(), vec!["item_id"]);
///
/// let params = template.matches("/items/42").unwrap();
/// assert_eq!(params.get("item_id"), Some("42"));
/// assert!(template.matches("/items").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parses and checks a template. A trailing slash is dropped.
    pub fn parse(template: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidPathTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        if !template.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        let mut seen = HashSet::new();
        for part in template.split('/').filter(|s| !s.is_empty()) {
            let opens = part.matches('{').count();
            let closes = part.matches('}').count();
            if opens == 0 && closes == 0 {
                segments.push(Segment::Literal(part.to_string()));
                continue;
            }
            if opens != 1 || closes != 1 {
                return Err(invalid("unbalanced braces"));
            }
            let name = part
                .strip_prefix('{')
                .and_then(|p| p.strip_suffix('}'))
                .ok_or_else(|| invalid("a placeholder must span a whole segment"))?;
            if name.is_empty() {
                return Err(invalid("empty placeholder name"));
            }
            if !seen.insert(name.to_string()) {
                return Err(invalid("placeholder names must be unique"));
            }
            segments.push(Segment::Param(name.to_string()));
        }

        Ok(Self {
            raw: join_paths("", template),
            segments,
        })
    }

    /// The template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order.
    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Matches a concrete request path, returning the captures.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, value) in self.segments.iter().zip(actual) {
            match segment {
                Segment::Literal(literal) if literal != value => return None,
                Segment::Literal(_) => {}
                Segment::Param(name) => params.push(name.clone(), value),
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Joins a router prefix and a path: duplicate slashes collapse and a
/// trailing slash is dropped unless the result is the root.
///
/// ```
/// use portico_core::join_paths;
///
/// assert_eq!(join_paths("/api/", "/items/"), "/api/items");
/// assert_eq!(join_paths("", "/"), "/");
/// assert_eq!(join_paths("/v1", "/"), "/v1");
/// ```
#[must_use]
pub fn join_paths(prefix: &str, path: &str) -> String {
    let joined: Vec<&str> = prefix
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", joined.join("/"))
}

fn default_operation_id(method: &Method, path: &str) -> String {
    let slug: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let slug = slug
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let slug = if slug.is_empty() { "root".to_string() } else { slug };
    format!("{}_{slug}", method.as_str().to_ascii_lowercase())
}

/// Declared output of an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseContract {
    ty: Option<TypeSpec>,
    description: String,
}

impl Default for ResponseContract {
    fn default() -> Self {
        Self::new(TypeSpec::Any)
    }
}

impl ResponseContract {
    /// A JSON body of type `ty`.
    #[must_use]
    pub fn new(ty: TypeSpec) -> Self {
        Self {
            ty: Some(ty),
            description: "Successful Response".to_string(),
        }
    }

    /// A JSON body typed from a Rust type.
    #[must_use]
    pub fn of<T: Typed>() -> Self {
        Self::new(T::type_spec())
    }

    /// No body at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ty: None,
            description: "Successful Response".to_string(),
        }
    }

    /// Sets the description used in the document.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declared body type; `None` for [`empty`](Self::empty).
    #[must_use]
    pub fn ty(&self) -> Option<&TypeSpec> {
        self.ty.as_ref()
    }

    /// Description.
    #[must_use]
    pub fn description_text(&self) -> &str {
        &self.description
    }

    /// Whether a body is declared.
    #[must_use]
    pub fn declares_body(&self) -> bool {
        self.ty.is_some()
    }
}

/// A registered route. Immutable once registered.
#[derive(Debug, Clone)]
pub struct Endpoint {
    method: Method,
    template: PathTemplate,
    parameters: Vec<ParameterDescriptor>,
    response: ResponseContract,
    status_code: u16,
    tags: IndexSet<String>,
    operation_id: String,
    explicit_operation_id: bool,
    security: Option<Vec<SecurityRequirement>>,
    summary: Option<String>,
    description: Option<String>,
    deprecated: bool,
    handler: Handler,
}

impl Endpoint {
    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path template text.
    #[must_use]
    pub fn path(&self) -> &str {
        self.template.as_str()
    }

    /// Parsed path template.
    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Parameter descriptors in resolution order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Response contract.
    #[must_use]
    pub fn response(&self) -> &ResponseContract {
        &self.response
    }

    /// Success status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Tags in declaration order.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    /// Operation id.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Declared security; `Some(vec![])` means explicitly public.
    #[must_use]
    pub fn security(&self) -> Option<&[SecurityRequirement]> {
        self.security.as_deref()
    }

    /// Security requirements contributed by security parameters.
    #[must_use]
    pub fn parameter_security(&self) -> Vec<SecurityRequirement> {
        self.parameters
            .iter()
            .filter_map(|p| p.security_binding().map(crate::SecurityBinding::requirement))
            .collect()
    }

    /// Summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// The body descriptor, if any.
    #[must_use]
    pub fn body_parameter(&self) -> Option<&ParameterDescriptor> {
        self.parameters
            .iter()
            .find(|p| p.source() == ParamSource::Body)
    }

    /// Whether resolution can produce validation failures.
    #[must_use]
    pub fn can_fail_validation(&self) -> bool {
        self.parameters.iter().any(|p| {
            matches!(
                p.source(),
                ParamSource::Path
                    | ParamSource::Query
                    | ParamSource::Header
                    | ParamSource::Cookie
                    | ParamSource::Body
                    | ParamSource::File
            )
        })
    }

    /// Route key used for duplicate detection.
    #[must_use]
    pub fn route_key(&self) -> (Method, String) {
        (self.method.clone(), self.template.as_str().to_string())
    }

    pub(crate) fn with_prefix(&self, prefix: &str) -> Result<Self, ConfigurationError> {
        let mut copy = self.clone();
        copy.template = PathTemplate::parse(&join_paths(prefix, self.template.as_str()))?;
        if !copy.explicit_operation_id {
            copy.operation_id = default_operation_id(&copy.method, copy.template.as_str());
        }
        Ok(copy)
    }

    pub(crate) fn prepend_tags<'a>(&mut self, tags: impl IntoIterator<Item = &'a String>) {
        let mut merged: IndexSet<String> = tags.into_iter().cloned().collect();
        merged.extend(self.tags.drain(..));
        self.tags = merged;
    }

    pub(crate) fn default_security(&mut self, security: Option<&Vec<SecurityRequirement>>) {
        if self.security.is_none() {
            self.security = security.cloned();
        }
    }

    pub(crate) fn add_security(&mut self, extra: &[SecurityRequirement]) {
        if extra.is_empty() {
            return;
        }
        let current = self.security.get_or_insert_with(Vec::new);
        for requirement in extra {
            if !current.contains(requirement) {
                current.push(requirement.clone());
            }
        }
    }

    pub(crate) fn prepend_dependencies(
        &mut self,
        dependencies: &[ParameterDescriptor],
    ) -> Result<(), ConfigurationError> {
        if dependencies.is_empty() {
            return Ok(());
        }
        let mut parameters = dependencies.to_vec();
        parameters.append(&mut self.parameters);
        check_unique_names(&self.method, self.template.as_str(), &parameters)?;
        self.parameters = parameters;
        Ok(())
    }
}

fn check_unique_names(
    method: &Method,
    path: &str,
    parameters: &[ParameterDescriptor],
) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for parameter in parameters {
        if !seen.insert(parameter.name()) {
            return Err(ConfigurationError::DuplicateParameter {
                method: method.to_string(),
                path: path.to_string(),
                name: parameter.name().to_string(),
            });
        }
    }
    Ok(())
}

fn check_patterns(parameters: &[ParameterDescriptor]) -> Result<(), ConfigurationError> {
    let mut visited: HashSet<ModelRef> = HashSet::new();
    let mut pending: Vec<ModelRef> = Vec::new();

    for parameter in parameters {
        if let Some(pattern) = &parameter.constraint_set().pattern {
            if let Err(reason) = pattern.regex() {
                return Err(ConfigurationError::InvalidPattern {
                    field: parameter.name().to_string(),
                    pattern: pattern.as_str().to_string(),
                    reason: reason.to_string(),
                });
            }
        }
        parameter.ty().for_each_model(&mut |m| pending.push(*m));
    }

    while let Some(model) = pending.pop() {
        if !visited.insert(model) {
            continue;
        }
        for field in model.declared_fields() {
            if let Some(pattern) = &field.constraint_set().pattern {
                if let Err(reason) = pattern.regex() {
                    return Err(ConfigurationError::InvalidPattern {
                        field: format!("{}.{}", model.name(), field.name()),
                        pattern: pattern.as_str().to_string(),
                        reason: reason.to_string(),
                    });
                }
            }
            field.ty().for_each_model(&mut |m| pending.push(*m));
        }
    }
    Ok(())
}

/// Collects the declaration of one endpoint.
///
/// # Example
///
/// ```
/// use portico_core::{ApiError, EndpointBuilder, ParameterDescriptor, TypeSpec};
///
/// let builder = EndpointBuilder::get("/items/{item_id}")
///     .param(ParameterDescriptor::path("item_id", TypeSpec::Integer))
///     .tag("items")
///     .summary("Read one item")
///     .handler(|args| async move {
///         let id: i64 = args.get("item_id")?;
///         Ok::<_, ApiError>(serde_json::json!({"item_id": id}))
///     });
/// let endpoint = builder.build().unwrap();
/// assert_eq!(endpoint.operation_id(), "get_items_item_id");
/// ```
#[derive(Debug)]
pub struct EndpointBuilder {
    method: Method,
    path: String,
    parameters: Vec<ParameterDescriptor>,
    response: ResponseContract,
    status_code: u16,
    tags: IndexSet<String>,
    operation_id: Option<String>,
    security: Option<Vec<SecurityRequirement>>,
    summary: Option<String>,
    description: Option<String>,
    deprecated: bool,
    handler: Option<Handler>,
}

impl EndpointBuilder {
    /// Starts an endpoint for `method` and `path`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            parameters: Vec::new(),
            response: ResponseContract::default(),
            status_code: 200,
            tags: IndexSet::new(),
            operation_id: None,
            security: None,
            summary: None,
            description: None,
            deprecated: false,
            handler: None,
        }
    }

    /// `GET path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends several parameters.
    #[must_use]
    pub fn params(mut self, parameters: impl IntoIterator<Item = ParameterDescriptor>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Sets the response contract.
    #[must_use]
    pub fn response(mut self, response: ResponseContract) -> Self {
        self.response = response;
        self
    }

    /// Sets the response type.
    #[must_use]
    pub fn returns(self, ty: TypeSpec) -> Self {
        self.response(ResponseContract::new(ty))
    }

    /// Sets the success status code.
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status_code = status;
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Sets the operation id.
    #[must_use]
    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Adds a security requirement.
    #[must_use]
    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.get_or_insert_with(Vec::new).push(requirement);
        self
    }

    /// Marks the endpoint public, overriding router and document defaults.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.security = Some(Vec::new());
        self
    }

    /// Sets the summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the endpoint deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Sets an async handler.
    #[must_use]
    pub fn handler<F, Fut, T>(mut self, f: F) -> Self
    where
        F: Fn(crate::ResolvedArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Serialize + 'static,
    {
        self.handler = Some(Handler::new(f));
        self
    }

    /// Sets a synchronous handler.
    #[must_use]
    pub fn handler_sync<F, T>(mut self, f: F) -> Self
    where
        F: Fn(crate::ResolvedArguments) -> Result<T, ApiError> + Send + Sync + 'static,
        T: Serialize + 'static,
    {
        self.handler = Some(Handler::sync(f));
        self
    }

    /// Sets a prebuilt handler.
    #[must_use]
    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Method being built.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path being built.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Validates the declaration and produces the endpoint.
    pub fn build(self) -> Result<Endpoint, ConfigurationError> {
        let template = PathTemplate::parse(&self.path)?;
        let method_name = self.method.to_string();

        if !(100..=599).contains(&self.status_code) {
            return Err(ConfigurationError::InvalidStatusCode {
                status: self.status_code,
            });
        }

        let handler = self.handler.ok_or_else(|| ConfigurationError::MissingHandler {
            method: method_name.clone(),
            path: self.path.clone(),
        })?;

        check_unique_names(&self.method, &self.path, &self.parameters)?;

        let bodies: Vec<String> = self
            .parameters
            .iter()
            .filter(|p| p.source() == ParamSource::Body)
            .map(|p| p.name().to_string())
            .collect();
        if bodies.len() > 1 {
            return Err(ConfigurationError::MultipleBodies {
                method: method_name,
                path: self.path,
                names: bodies,
            });
        }

        // Placeholders carry the external name: the alias when one is set.
        let placeholders = template.param_names();
        for placeholder in &placeholders {
            let declared = self
                .parameters
                .iter()
                .any(|p| p.source() == ParamSource::Path && p.wire_name() == *placeholder);
            if !declared {
                return Err(ConfigurationError::UndeclaredPathParameter {
                    template: self.path.clone(),
                    name: (*placeholder).to_string(),
                });
            }
        }
        for parameter in self.parameters.iter().filter(|p| p.source() == ParamSource::Path) {
            let wire = parameter.wire_name();
            if !placeholders.contains(&wire.as_str()) {
                return Err(ConfigurationError::UnusedPathParameter {
                    template: self.path.clone(),
                    name: wire,
                });
            }
        }

        check_patterns(&self.parameters)?;

        let explicit_operation_id = self.operation_id.is_some();
        let operation_id = self
            .operation_id
            .unwrap_or_else(|| default_operation_id(&self.method, template.as_str()));

        Ok(Endpoint {
            method: self.method,
            template,
            parameters: self.parameters,
            response: self.response,
            status_code: self.status_code,
            tags: self.tags,
            operation_id,
            explicit_operation_id,
            security: self.security,
            summary: self.summary,
            description: self.description,
            deprecated: self.deprecated,
            handler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraints, FieldSpec, Model};

    fn ok_handler(builder: EndpointBuilder) -> EndpointBuilder {
        builder.handler_sync(|_| Ok::<_, ApiError>(()))
    }

    #[test]
    fn test_template_errors() {
        for bad in ["items", "/items/{", "/items/{}", "/items/x{id}", "/a/{id}/{id}"] {
            assert!(
                matches!(
                    PathTemplate::parse(bad),
                    Err(ConfigurationError::InvalidPathTemplate { .. })
                ),
                "{bad} should be rejected"
            );
        }
        assert!(PathTemplate::parse("/").unwrap().param_names().is_empty());
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/api//v1/", "//items"), "/api/v1/items");
        assert_eq!(join_paths("/", "/"), "/");
        assert_eq!(join_paths("/api", "/items/{id}/"), "/api/items/{id}");
    }

    #[test]
    fn test_default_operation_id() {
        assert_eq!(default_operation_id(&Method::GET, "/items/{item_id}"), "get_items_item_id");
        assert_eq!(default_operation_id(&Method::POST, "/"), "post_root");
    }

    #[test]
    fn test_undeclared_placeholder() {
        let err = ok_handler(EndpointBuilder::get("/items/{item_id}")).build().unwrap_err();
        assert!(matches!(err, ConfigurationError::UndeclaredPathParameter { ref name, .. } if name == "item_id"));
    }

    #[test]
    fn test_unused_path_parameter() {
        let err = ok_handler(
            EndpointBuilder::get("/items").param(ParameterDescriptor::path("id", TypeSpec::Integer)),
        )
        .build()
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnusedPathParameter { .. }));
    }

    #[test]
    fn test_aliased_path_parameter_matches_placeholder() {
        let endpoint = ok_handler(
            EndpointBuilder::get("/items/{itemId}")
                .param(ParameterDescriptor::path("item_id", TypeSpec::Integer).alias("itemId")),
        )
        .build()
        .unwrap();
        assert_eq!(endpoint.path(), "/items/{itemId}");

        let err = ok_handler(
            EndpointBuilder::get("/items/{item_id}")
                .param(ParameterDescriptor::path("item_id", TypeSpec::Integer).alias("itemId")),
        )
        .build()
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::UndeclaredPathParameter { ref name, .. } if name == "item_id"));
    }

    #[test]
    fn test_multiple_bodies() {
        let err = ok_handler(
            EndpointBuilder::post("/items")
                .param(ParameterDescriptor::body("a", TypeSpec::Any))
                .param(ParameterDescriptor::body("b", TypeSpec::Any)),
        )
        .build()
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::MultipleBodies { ref names, .. } if names.len() == 2));
    }

    #[test]
    fn test_duplicate_names_and_status() {
        let err = ok_handler(
            EndpointBuilder::get("/items")
                .param(ParameterDescriptor::query("q", TypeSpec::String))
                .param(ParameterDescriptor::header("q", TypeSpec::String)),
        )
        .build()
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateParameter { .. }));

        let err = ok_handler(EndpointBuilder::get("/items").status(700)).build().unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidStatusCode { status: 700 });
    }

    #[test]
    fn test_missing_handler() {
        let err = EndpointBuilder::get("/items").build().unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingHandler { .. }));
    }

    struct BadModel;

    impl Model for BadModel {
        const NAME: &'static str = "BadModel";

        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::of::<String>("code").constraints(Constraints::new().pattern("(["))]
        }
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        let err = ok_handler(
            EndpointBuilder::post("/x").param(ParameterDescriptor::body("b", TypeSpec::model::<BadModel>())),
        )
        .build()
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPattern { ref field, .. } if field == "BadModel.code"));
    }

    #[test]
    fn test_with_prefix_rederives_operation_id() {
        let endpoint = ok_handler(EndpointBuilder::get("/items")).build().unwrap();
        let prefixed = endpoint.with_prefix("/v1").unwrap();
        assert_eq!(prefixed.path(), "/v1/items");
        assert_eq!(prefixed.operation_id(), "get_v1_items");

        let named = ok_handler(EndpointBuilder::get("/items").operation_id("listItems"))
            .build()
            .unwrap();
        assert_eq!(named.with_prefix("/v1").unwrap().operation_id(), "listItems");
    }

    #[test]
    fn test_match_literal_mismatch() {
        let template = PathTemplate::parse("/users/{id}/orders").unwrap();
        assert!(template.matches("/users/1/orders").is_some());
        assert!(template.matches("/users/1/items").is_none());
    }
}
