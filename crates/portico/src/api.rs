//! The application-facing facade.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response};
use parking_lot::RwLock;
use portico_config::PorticoConfig;
use portico_core::{
    ConfigurationError, Container, Endpoint, EndpointBuilder, IncludeOptions, RequestView, Router,
    SchemaCache,
};
use portico_docs::{DocsResult, OpenApi, OpenApiGenerator, ReDoc, SwaggerUi};
use portico_extract::{MultipartConfig, RequestParts, Resolver, ResolverConfig};

use crate::dispatch::Dispatcher;
use crate::serialize::ResponseSerializer;
use crate::transport;

/// Routes, schema cache, configuration and the generated document.
///
/// Register everything first, then share the `Api` (it is `Send + Sync`)
/// across request tasks. [`add`](Self::add) and [`include`](Self::include)
/// drop the cached document so the next [`openapi`](Self::openapi) call
/// regenerates it.
///
/// # Example
///
/// ```
/// use portico::prelude::*;
///
/// # tokio_test::block_on(async {
/// let mut api = Api::new(PorticoConfig::default());
/// api.add(
///     EndpointBuilder::get("/items/{item_id}")
///         .param(ParameterDescriptor::path("item_id", TypeSpec::Integer))
///         .returns(TypeSpec::Integer)
///         .handler_sync(|args| args.get::<i64>("item_id").map_err(ApiError::from)),
/// )
/// .unwrap();
///
/// let request = http::Request::get("/items/42").body(bytes::Bytes::new()).unwrap();
/// let response = api.handle(request).await;
/// assert_eq!(response.status(), 200);
/// assert_eq!(response.body().as_ref(), b"42");
/// # });
/// ```
pub struct Api {
    router: Router,
    config: PorticoConfig,
    cache: Arc<SchemaCache>,
    generator: OpenApiGenerator,
    dispatcher: Dispatcher,
    container: Option<Arc<Container>>,
    document: RwLock<Option<Arc<OpenApi>>>,
}

impl Default for Api {
    fn default() -> Self {
        Self::new(PorticoConfig::default())
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("endpoints", &self.router.len())
            .field("config", &self.config)
            .field("document_cached", &self.document.read().is_some())
            .finish_non_exhaustive()
    }
}

impl Api {
    /// Creates an empty facade.
    #[must_use]
    pub fn new(config: PorticoConfig) -> Self {
        let cache = Arc::new(SchemaCache::with_alias_policy(config.serialization.by_alias));
        let mut generator = OpenApiGenerator::new()
            .title(config.docs.title.clone())
            .version(config.docs.version.clone());
        if let Some(description) = &config.docs.description {
            generator = generator.description(description.clone());
        }
        let dispatcher = build_dispatcher(&config, &cache, None);
        Self {
            router: Router::new(),
            config,
            cache,
            generator,
            dispatcher,
            container: None,
            document: RwLock::new(None),
        }
    }

    /// Uses `router` as the root router, keeping its defaults for later
    /// [`add`](Self::add) calls. Its default security is published as the
    /// document-level security.
    #[must_use]
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self.invalidate();
        self
    }

    /// Makes `container` visible to dependency providers.
    #[must_use]
    pub fn with_container(mut self, container: Container) -> Self {
        let container = Arc::new(container);
        self.dispatcher = build_dispatcher(&self.config, &self.cache, Some(Arc::clone(&container)));
        self.container = Some(container);
        self
    }

    /// Adjusts the document generator (servers, security, tag descriptions).
    ///
    /// ```
    /// use portico::prelude::*;
    ///
    /// let api = Api::default().with_generator(|g| {
    ///     g.security(SecurityRequirement::new("bearer"))
    ///         .security_scheme("bearer", &SecurityScheme::bearer())
    /// });
    /// assert!(api.openapi().unwrap().components.is_some());
    /// ```
    #[must_use]
    pub fn with_generator(mut self, f: impl FnOnce(OpenApiGenerator) -> OpenApiGenerator) -> Self {
        self.generator = f(self.generator);
        self.invalidate();
        self
    }

    /// Registers an endpoint.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigurationError`] from [`Router::add`]; nothing is
    /// registered in that case.
    pub fn add(&mut self, builder: EndpointBuilder) -> Result<Arc<Endpoint>, ConfigurationError> {
        let endpoint = self.router.add(builder)?;
        self.invalidate();
        Ok(endpoint)
    }

    /// Copies every endpoint of `sub` into this facade. `sub` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigurationError`] from [`Router::include`].
    pub fn include(&mut self, sub: &Router, options: IncludeOptions) -> Result<(), ConfigurationError> {
        self.router.include(sub, options)?;
        self.invalidate();
        Ok(())
    }

    /// The root router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Registered endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        self.router.endpoints()
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &PorticoConfig {
        &self.config
    }

    /// The schema cache shared by resolution, serialization and documents.
    #[must_use]
    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// The dispatcher, for hosts that route requests themselves.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The service container, if one was set.
    #[must_use]
    pub fn container(&self) -> Option<&Arc<Container>> {
        self.container.as_ref()
    }

    /// The generated document, built on first use and then cached.
    ///
    /// # Errors
    ///
    /// Returns the generator's error (schema name collision, duplicate
    /// operation id). Failures are not cached.
    pub fn openapi(&self) -> DocsResult<Arc<OpenApi>> {
        if let Some(document) = self.document.read().as_ref() {
            return Ok(Arc::clone(document));
        }

        let mut slot = self.document.write();
        if let Some(document) = slot.as_ref() {
            return Ok(Arc::clone(document));
        }
        let document = Arc::new(
            self.document_generator()
                .generate(self.router.endpoints(), &self.cache)?,
        );
        *slot = Some(Arc::clone(&document));
        Ok(document)
    }

    // The root router's default security becomes the document default.
    fn document_generator(&self) -> Cow<'_, OpenApiGenerator> {
        match self.router.default_security() {
            Some(security) if !security.is_empty() => Cow::Owned(
                security
                    .iter()
                    .cloned()
                    .fold(self.generator.clone(), OpenApiGenerator::security),
            ),
            _ => Cow::Borrowed(&self.generator),
        }
    }

    /// The generated document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// See [`openapi`](Self::openapi).
    pub fn openapi_json(&self) -> DocsResult<String> {
        self.openapi()?.to_json()
    }

    /// Whether a document is currently cached.
    #[must_use]
    pub fn is_document_cached(&self) -> bool {
        self.document.read().is_some()
    }

    /// Serves the JSON document, the Swagger UI page or the ReDoc page when
    /// `path` is one of the configured URLs and documentation is enabled.
    ///
    /// A document that fails to generate is served as a `500`.
    #[must_use]
    pub fn docs_response(&self, path: &str) -> Option<Response<Bytes>> {
        let docs = &self.config.docs;
        if !docs.enabled {
            return None;
        }

        if path == docs.openapi_url {
            let response = match self.openapi_json() {
                Ok(json) => transport::json_response(json),
                Err(err) => {
                    tracing::error!(error = %err, "failed to generate OpenAPI document");
                    transport::api_error_response(&portico_core::ApiError::internal(
                        "failed to generate the API document",
                    ))
                }
            };
            return Some(response);
        }
        if path == docs.docs_url {
            let page = SwaggerUi::new(docs.openapi_url.clone(), &docs.title);
            return Some(transport::html_response(page.html_bytes()));
        }
        if path == docs.redoc_url {
            let page = ReDoc::new(docs.openapi_url.clone(), &docs.title);
            return Some(transport::html_response(page.html_bytes()));
        }
        None
    }

    /// Runs one endpoint against a request view.
    pub async fn dispatch(&self, endpoint: &Endpoint, view: &dyn RequestView) -> Response<Bytes> {
        self.dispatcher.dispatch(endpoint, view).await
    }

    /// Routes and dispatches a buffered request.
    ///
    /// Unknown paths are `404`, known paths with another method `405`;
    /// documentation URLs answer `GET`.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let Some((endpoint, params)) = self.router.match_request(&method, &path) else {
            if method == Method::GET {
                if let Some(response) = self.docs_response(&path) {
                    return response;
                }
            }
            let allowed = self.router.allowed_methods(&path);
            return if allowed.is_empty() {
                transport::not_found_response(&path)
            } else {
                transport::method_not_allowed_response(&method, &allowed)
            };
        };

        let parts = match RequestParts::from_request(request, params, &self.multipart_config()).await
        {
            Ok(parts) => parts,
            Err(err) => {
                tracing::debug!(error = %err, "malformed request");
                return transport::parts_error_response(&err);
            }
        };
        self.dispatch(&endpoint, &parts).await
    }

    fn multipart_config(&self) -> MultipartConfig {
        MultipartConfig::new()
            .max_field_size(self.config.resolver.max_field_size)
            .max_fields(self.config.resolver.max_fields)
    }

    fn invalidate(&self) {
        if self.document.write().take().is_some() {
            tracing::debug!("invalidated cached OpenAPI document");
        }
    }
}

fn build_dispatcher(
    config: &PorticoConfig,
    cache: &Arc<SchemaCache>,
    container: Option<Arc<Container>>,
) -> Dispatcher {
    let mut resolver = Resolver::new(Arc::clone(cache))
        .with_config(ResolverConfig::default().max_body_size(config.resolver.max_body_size));
    if let Some(container) = container {
        resolver = resolver.with_container(container);
    }
    let serializer = ResponseSerializer::new(Arc::clone(cache), config.serialization.scalar_style);
    Dispatcher::new(resolver, serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{ApiError, SecurityRequirement, TypeSpec};

    fn ping() -> EndpointBuilder {
        EndpointBuilder::get("/ping")
            .returns(TypeSpec::String)
            .handler_sync(|_| Ok::<_, ApiError>("pong"))
    }

    #[test]
    fn test_document_is_cached() {
        let mut api = Api::default();
        api.add(ping()).unwrap();

        let first = api.openapi().unwrap();
        let second = api.openapi().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(api.is_document_cached());
    }

    #[test]
    fn test_add_invalidates_document() {
        let mut api = Api::default();
        api.add(ping()).unwrap();
        let before = api.openapi().unwrap();

        api.add(
            EndpointBuilder::get("/health").handler_sync(|_| Ok::<_, ApiError>(())),
        )
        .unwrap();
        assert!(!api.is_document_cached());

        let after = api.openapi().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.paths.contains_key("/health"));
        assert!(!before.paths.contains_key("/health"));
    }

    #[test]
    fn test_failed_add_keeps_document() {
        let mut api = Api::default();
        api.add(ping()).unwrap();
        api.openapi().unwrap();

        assert!(api.add(ping()).is_err());
        assert!(api.is_document_cached());
    }

    #[test]
    fn test_info_from_config() {
        let mut config = PorticoConfig::default();
        config.docs.title = "Inventory".to_string();
        config.docs.version = "3.0.0".to_string();
        config.docs.description = Some("Stock levels".to_string());

        let doc = Api::new(config).openapi().unwrap();
        assert_eq!(doc.info.title, "Inventory");
        assert_eq!(doc.info.version, "3.0.0");
        assert_eq!(doc.info.description.as_deref(), Some("Stock levels"));
    }

    #[test]
    fn test_docs_routes() {
        let api = Api::default();
        let json = api.docs_response("/openapi.json").unwrap();
        assert_eq!(json.headers()[http::header::CONTENT_TYPE], "application/json");

        let swagger = api.docs_response("/docs").unwrap();
        let page = String::from_utf8(swagger.body().to_vec()).unwrap();
        assert!(page.contains("Portico API - Swagger UI"));
        assert!(page.contains("/openapi.json"));

        let redoc = api.docs_response("/redoc").unwrap();
        assert!(String::from_utf8(redoc.body().to_vec()).unwrap().contains("redoc"));

        assert!(api.docs_response("/elsewhere").is_none());
    }

    #[test]
    fn test_docs_disabled_removes_all_three() {
        let mut config = PorticoConfig::default();
        config.docs.enabled = false;
        let api = Api::new(config);
        for path in ["/openapi.json", "/docs", "/redoc"] {
            assert!(api.docs_response(path).is_none(), "{path} still served");
        }
    }

    #[test]
    fn test_router_security_is_document_default() {
        let router = Router::new().with_security(vec![SecurityRequirement::new("bearer")]);
        let mut api = Api::default().with_router(router);
        api.add(ping()).unwrap();
        api.add(
            EndpointBuilder::get("/health")
                .public()
                .handler_sync(|_| Ok::<_, ApiError>(())),
        )
        .unwrap();

        let doc = api.openapi().unwrap();
        assert_eq!(doc.security.len(), 1);
        assert!(doc.security[0].contains_key("bearer"));
        let ping = doc.operation(&Method::GET, "/ping").unwrap();
        assert!(ping.security.is_none());
        let health = doc.operation(&Method::GET, "/health").unwrap();
        assert_eq!(health.security.as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_api_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Api>();
    }
}
