//! Endpoint registry.
//!
//! The [`Router`] owns validated endpoints, applies router-level defaults
//! when they are added and copies them when another router is included.

use crate::endpoint::{Endpoint, EndpointBuilder};
use crate::error::ConfigurationError;
use crate::param::ParameterDescriptor;
use crate::security::SecurityRequirement;
use crate::view::PathParams;
use http::Method;
use indexmap::IndexSet;
use std::collections::HashSet;
use std::sync::Arc;

/// Options applied to every endpoint copied by [`Router::include`].
#[derive(Debug, Clone, Default)]
pub struct IncludeOptions {
    /// Path prefix.
    pub prefix: String,
    /// Extra tags, placed before the endpoint's own.
    pub tags: Vec<String>,
    /// Extra security requirements.
    pub security: Vec<SecurityRequirement>,
    /// Extra dependencies, resolved before the endpoint's own parameters.
    pub dependencies: Vec<ParameterDescriptor>,
}

impl IncludeOptions {
    /// Options with just a prefix.
    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds a security requirement.
    #[must_use]
    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.push(requirement);
        self
    }

    /// Adds a dependency.
    #[must_use]
    pub fn dependency(mut self, dependency: ParameterDescriptor) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// Ordered collection of endpoints.
///
/// # Example
///
/// ```rust
/// use portico_core::{ApiError, EndpointBuilder, IncludeOptions, Router};
///
/// let mut items = Router::new().tag("items");
/// items
///     .add(EndpointBuilder::get("/items").handler_sync(|_| Ok::<_, ApiError>(Vec::<String>::new())))
///     .unwrap();
///
/// let mut app = Router::new();
/// app.include(&items, IncludeOptions::prefix("/v1")).unwrap();
/// app.include(&items, IncludeOptions::prefix("/v2")).unwrap();
///
/// assert_eq!(app.len(), 2);
/// assert!(app.find(&http::Method::GET, "/v2/items").is_some());
/// assert_eq!(items.endpoints()[0].path(), "/items");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Router {
    endpoints: Vec<Arc<Endpoint>>,
    tags: IndexSet<String>,
    security: Option<Vec<SecurityRequirement>>,
    dependencies: Vec<ParameterDescriptor>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a default tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Sets the default tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the security used by endpoints that declare none.
    #[must_use]
    pub fn with_security(mut self, security: Vec<SecurityRequirement>) -> Self {
        self.security = Some(security);
        self
    }

    /// The security applied to endpoints that declare none, if set.
    #[must_use]
    pub fn default_security(&self) -> Option<&[SecurityRequirement]> {
        self.security.as_deref()
    }

    /// Adds a dependency resolved for every endpoint added afterwards.
    #[must_use]
    pub fn dependency(mut self, dependency: ParameterDescriptor) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Validates and registers an endpoint.
    pub fn add(&mut self, builder: EndpointBuilder) -> Result<Arc<Endpoint>, ConfigurationError> {
        let mut endpoint = builder.build()?;
        endpoint.prepend_tags(&self.tags);
        endpoint.default_security(self.security.as_ref());
        endpoint.prepend_dependencies(&self.dependencies)?;
        self.check_route_free(&endpoint)?;

        tracing::debug!(
            method = %endpoint.method(),
            path = endpoint.path(),
            operation_id = endpoint.operation_id(),
            parameters = endpoint.parameters().len(),
            "registered endpoint"
        );

        let endpoint = Arc::new(endpoint);
        self.endpoints.push(Arc::clone(&endpoint));
        Ok(endpoint)
    }

    /// Copies every endpoint of `sub` into this router.
    ///
    /// Nothing is registered when any copy fails; `sub` is never modified.
    pub fn include(&mut self, sub: &Router, options: IncludeOptions) -> Result<(), ConfigurationError> {
        if options.prefix.contains('{') || options.prefix.contains('}') {
            return Err(ConfigurationError::InvalidPathTemplate {
                template: options.prefix,
                reason: "a router prefix cannot contain placeholders".to_string(),
            });
        }

        let extra_tags: IndexSet<String> = options.tags.iter().chain(self.tags.iter()).cloned().collect();
        let mut dependencies = self.dependencies.clone();
        dependencies.extend(options.dependencies.iter().cloned());

        let mut copies = Vec::with_capacity(sub.endpoints.len());
        let mut seen: HashSet<(Method, String)> = HashSet::new();
        for original in &sub.endpoints {
            let mut copy = original.with_prefix(&options.prefix)?;
            copy.prepend_tags(&extra_tags);
            copy.default_security(self.security.as_ref());
            copy.add_security(&options.security);
            copy.prepend_dependencies(&dependencies)?;
            self.check_route_free(&copy)?;
            if !seen.insert(copy.route_key()) {
                return Err(ConfigurationError::DuplicateRoute {
                    method: copy.method().to_string(),
                    path: copy.path().to_string(),
                });
            }
            copies.push(Arc::new(copy));
        }

        tracing::debug!(
            prefix = %options.prefix,
            endpoints = copies.len(),
            "included router"
        );
        self.endpoints.extend(copies);
        Ok(())
    }

    fn check_route_free(&self, endpoint: &Endpoint) -> Result<(), ConfigurationError> {
        if self.find(endpoint.method(), endpoint.path()).is_some() {
            return Err(ConfigurationError::DuplicateRoute {
                method: endpoint.method().to_string(),
                path: endpoint.path().to_string(),
            });
        }
        Ok(())
    }

    /// Registered endpoints in registration order.
    #[must_use]
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    /// Number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Looks an endpoint up by method and template text.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<&Arc<Endpoint>> {
        self.endpoints
            .iter()
            .find(|e| e.method() == method && e.path() == path)
    }

    /// Matches a concrete request path.
    ///
    /// Templates with fewer placeholders win, so `/users/me` beats
    /// `/users/{id}`; ties go to the earliest registration.
    #[must_use]
    pub fn match_request(&self, method: &Method, path: &str) -> Option<(Arc<Endpoint>, PathParams)> {
        self.endpoints
            .iter()
            .filter(|e| e.method() == method)
            .filter_map(|e| e.template().matches(path).map(|params| (e, params)))
            .min_by_key(|(_, params)| params.len())
            .map(|(e, params)| (Arc::clone(e), params))
    }

    /// Methods registered for a concrete path, for `405` responses.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for endpoint in &self.endpoints {
            if endpoint.template().matches(path).is_some() && !methods.contains(endpoint.method()) {
                methods.push(endpoint.method().clone());
            }
        }
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{provider_fn, Provided};
    use crate::error::ApiError;
    use crate::model::TypeSpec;

    fn endpoint(builder: EndpointBuilder) -> EndpointBuilder {
        builder.handler_sync(|_| Ok::<_, ApiError>(()))
    }

    #[test]
    fn test_duplicate_route() {
        let mut router = Router::new();
        router.add(endpoint(EndpointBuilder::get("/items"))).unwrap();
        router.add(endpoint(EndpointBuilder::post("/items"))).unwrap();
        let err = router.add(endpoint(EndpointBuilder::get("/items/"))).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateRoute { ref path, .. } if path == "/items"));
    }

    #[test]
    fn test_duplicate_route_same_template() {
        let mut router = Router::new();
        router.add(endpoint(EndpointBuilder::get("/items"))).unwrap();
        let err = router.add(endpoint(EndpointBuilder::get("/items"))).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateRoute {
                method: "GET".into(),
                path: "/items".into()
            }
        );
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_router_defaults() {
        let mut router = Router::new()
            .tag("shop")
            .with_security(vec![SecurityRequirement::new("bearer")]);
        let with_tag = router.add(endpoint(EndpointBuilder::get("/a").tag("items").tag("shop"))).unwrap();
        assert_eq!(with_tag.tags(), vec!["shop", "items"]);
        assert_eq!(with_tag.security().map(<[_]>::len), Some(1));

        let public = router.add(endpoint(EndpointBuilder::get("/b").public())).unwrap();
        assert_eq!(public.security(), Some(&[][..]));
    }

    #[test]
    fn test_router_dependencies_prepended() {
        let db = ParameterDescriptor::dependency("db", provider_fn(|| async { Ok(Provided::value(1_u8)) }));
        let mut router = Router::new().dependency(db);
        let added = router
            .add(endpoint(EndpointBuilder::get("/a").param(ParameterDescriptor::query("q", TypeSpec::String))))
            .unwrap();
        let names: Vec<&str> = added.parameters().iter().map(ParameterDescriptor::name).collect();
        assert_eq!(names, vec!["db", "q"]);

        let err = router
            .add(endpoint(EndpointBuilder::get("/b").param(ParameterDescriptor::query("db", TypeSpec::String))))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateParameter { .. }));
    }

    #[test]
    fn test_include_is_atomic() {
        let mut sub = Router::new();
        sub.add(endpoint(EndpointBuilder::get("/a"))).unwrap();
        sub.add(endpoint(EndpointBuilder::get("/b"))).unwrap();

        let mut app = Router::new();
        app.add(endpoint(EndpointBuilder::get("/v1/b"))).unwrap();
        let err = app.include(&sub, IncludeOptions::prefix("/v1")).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateRoute { .. }));
        assert_eq!(app.len(), 1);
    }

    #[test]
    fn test_include_does_not_mutate_sub() {
        let mut sub = Router::new();
        sub.add(endpoint(EndpointBuilder::get("/items/{id}").param(ParameterDescriptor::path("id", TypeSpec::Integer))))
            .unwrap();

        let mut app = Router::new();
        app.include(&sub, IncludeOptions::prefix("/api/").tag("api").security(SecurityRequirement::new("key")))
            .unwrap();

        let copied = app.find(&Method::GET, "/api/items/{id}").unwrap();
        assert_eq!(copied.tags(), vec!["api"]);
        assert_eq!(copied.operation_id(), "get_api_items_id");
        assert_eq!(copied.security().map(<[_]>::len), Some(1));

        let original = &sub.endpoints()[0];
        assert_eq!(original.path(), "/items/{id}");
        assert!(original.tags().is_empty());
        assert!(original.security().is_none());
    }

    #[test]
    fn test_include_rejects_placeholder_prefix() {
        let sub = Router::new();
        let mut app = Router::new();
        assert!(app.include(&sub, IncludeOptions::prefix("/{tenant}")).is_err());
    }

    #[test]
    fn test_match_prefers_static() {
        let mut router = Router::new();
        router
            .add(endpoint(EndpointBuilder::get("/users/{id}").param(ParameterDescriptor::path("id", TypeSpec::String))))
            .unwrap();
        router.add(endpoint(EndpointBuilder::get("/users/me"))).unwrap();

        let (found, params) = router.match_request(&Method::GET, "/users/me").unwrap();
        assert_eq!(found.path(), "/users/me");
        assert!(params.is_empty());

        let (found, params) = router.match_request(&Method::GET, "/users/7").unwrap();
        assert_eq!(found.path(), "/users/{id}");
        assert_eq!(params.get("id"), Some("7"));

        assert!(router.match_request(&Method::POST, "/users/7").is_none());
        assert_eq!(router.allowed_methods("/users/7"), vec![Method::GET]);
    }
}
