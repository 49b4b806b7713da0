//! Request resolution.
//!
//! The [`Resolver`] turns one [`RequestView`] into the [`ResolvedArguments`]
//! of one [`Endpoint`]. Credentials and dependencies are resolved first and
//! fail fast; every other parameter is checked and all failures are
//! reported together.

use crate::coerce;
use crate::error::ResolveError;
use portico_core::{
    AuthenticationError, BodyError, Coercion, Container, DependencyContext, DependencyScope, Endpoint, ExitStatus,
    ParamSource, ParameterDescriptor, PathSegment, RequestView, ResolvedArguments, SchemaCache,
    ValidationFailure,
};
use serde_json::Value;
use std::sync::Arc;

/// Default body limit (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Resolver limits.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ResolverConfig {
    /// Sets the body limit.
    #[must_use]
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }
}

/// Arguments for one handler call plus the teardowns they carry.
///
/// Close [`scope`](Self::scope) after the handler returns; dropping it runs
/// the teardowns as cancelled.
#[derive(Debug)]
pub struct Resolved {
    /// Values for the handler.
    pub args: ResolvedArguments,
    /// Pending dependency teardowns.
    pub scope: DependencyScope,
}

/// Resolves endpoint parameters from request views.
///
/// # Example
///
/// ```rust
/// use portico_core::{ApiError, EndpointBuilder, ParameterDescriptor, Router, SchemaCache, TypeSpec};
/// use portico_extract::{RequestParts, Resolver};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let mut router = Router::new();
/// let endpoint = router
///     .add(
///         EndpointBuilder::get("/items/{item_id}")
///             .param(ParameterDescriptor::path("item_id", TypeSpec::Integer))
///             .handler_sync(|_| Ok::<_, ApiError>(())),
///     )
///     .unwrap();
///
/// let resolver = Resolver::new(Arc::new(SchemaCache::new()));
/// let parts = RequestParts::builder(http::Method::GET, "/items/5")
///     .path_param("item_id", "5")
///     .build()
///     .unwrap();
///
/// let resolved = resolver.resolve(&endpoint, &parts).await.unwrap();
/// assert_eq!(resolved.args.get::<i64>("item_id").unwrap(), 5);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Resolver {
    cache: Arc<SchemaCache>,
    config: ResolverConfig,
    container: Option<Arc<Container>>,
}

impl Resolver {
    /// Creates a resolver with default limits.
    #[must_use]
    pub fn new(cache: Arc<SchemaCache>) -> Self {
        Self {
            cache,
            config: ResolverConfig::default(),
            container: None,
        }
    }

    /// Sets the limits.
    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the service container visible to providers.
    #[must_use]
    pub fn with_container(mut self, container: Arc<Container>) -> Self {
        self.container = Some(container);
        self
    }

    /// The schema cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// The limits.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves every parameter of `endpoint` from `view`.
    ///
    /// On failure the teardowns of dependencies already entered have run
    /// before this returns.
    ///
    /// # Errors
    ///
    /// Returns the single highest-precedence outcome: authentication,
    /// dependency, payload size, then the accumulated validation failures.
    pub async fn resolve(
        &self,
        endpoint: &Endpoint,
        view: &dyn RequestView,
    ) -> Result<Resolved, ResolveError> {
        let mut args = ResolvedArguments::new();
        let mut scope = DependencyScope::new();

        if let Err(err) = self.resolve_injected(endpoint, view, &mut args, &mut scope).await {
            scope.close(ExitStatus::Failed).await;
            return Err(err);
        }

        let mut failures = Vec::new();
        let mut too_large = None;
        for parameter in endpoint.parameters() {
            match parameter.source() {
                ParamSource::Path => self.resolve_path(parameter, view, &mut args, &mut failures),
                ParamSource::Query => {
                    let query = view.query();
                    self.resolve_text(parameter, &mut args, &mut failures, |key| query.get_all(key));
                }
                ParamSource::Header => {
                    let headers = view.headers();
                    self.resolve_text(parameter, &mut args, &mut failures, |key| {
                        headers
                            .get_all(key.replace('_', "-").as_str())
                            .iter()
                            .filter_map(|v| v.to_str().ok())
                            .collect()
                    });
                }
                ParamSource::Cookie => {
                    let cookies = view.cookies();
                    self.resolve_text(parameter, &mut args, &mut failures, |key| {
                        cookies.get(key).into_iter().collect()
                    });
                }
                ParamSource::File => resolve_files(parameter, view, &mut args, &mut failures),
                ParamSource::Body => {
                    too_large = self.resolve_body(parameter, view, &mut args, &mut failures).await;
                }
                ParamSource::Dependency | ParamSource::Security => {}
            }
        }

        let outcome = match too_large {
            Some((limit, actual)) => Err(ResolveError::PayloadTooLarge { limit, actual }),
            None if !failures.is_empty() => Err(ResolveError::Validation(failures)),
            None => Ok(()),
        };

        match outcome {
            Ok(()) => Ok(Resolved { args, scope }),
            Err(err) => {
                tracing::debug!(
                    operation_id = endpoint.operation_id(),
                    outcome = err.outcome(),
                    failures = err.failures().map_or(0, <[_]>::len),
                    "request resolution failed"
                );
                scope.close(ExitStatus::Failed).await;
                Err(err)
            }
        }
    }

    /// Security parameters first, then dependencies, each in declared order.
    async fn resolve_injected(
        &self,
        endpoint: &Endpoint,
        view: &dyn RequestView,
        args: &mut ResolvedArguments,
        scope: &mut DependencyScope,
    ) -> Result<(), ResolveError> {
        for parameter in endpoint.parameters() {
            let Some(binding) = parameter.security_binding() else {
                continue;
            };
            let credentials = match binding.scheme.extract(view) {
                Ok(credentials) => credentials,
                Err(_) if !parameter.is_required() => continue,
                Err(err) => return Err(auth_failed(endpoint, parameter, err)),
            };
            match binding.authenticator.authenticate(credentials).await {
                Ok(principal) => args.insert_injected(parameter.name(), principal),
                Err(err) => return Err(auth_failed(endpoint, parameter, err)),
            }
        }

        let ctx = DependencyContext {
            view,
            container: self.container.as_deref(),
        };
        for parameter in endpoint.parameters() {
            let Some(provider) = parameter.provider() else {
                continue;
            };
            let provided = provider
                .provide(&ctx)
                .await
                .map_err(|error| ResolveError::Dependency {
                    name: parameter.name().to_string(),
                    error,
                })?;
            let (value, teardown) = provided.into_parts();
            if let Some(teardown) = teardown {
                scope.push(parameter.name(), teardown);
            }
            args.insert_injected(parameter.name(), value);
        }
        Ok(())
    }

    fn resolve_path(
        &self,
        parameter: &ParameterDescriptor,
        view: &dyn RequestView,
        args: &mut ResolvedArguments,
        failures: &mut Vec<ValidationFailure>,
    ) {
        let key = parameter.wire_name();
        let Some(raw) = view.path_params().get(&key) else {
            failures.push(ValidationFailure::missing(vec![key.into()]).at(ParamSource::Path));
            return;
        };
        self.check(parameter, &Value::String(raw.to_string()), Coercion::Lax, vec![key.into()], args, failures);
    }

    fn resolve_text<'v, F>(
        &self,
        parameter: &ParameterDescriptor,
        args: &mut ResolvedArguments,
        failures: &mut Vec<ValidationFailure>,
        mut lookup: F,
    ) where
        F: FnMut(&str) -> Vec<&'v str>,
    {
        let key = parameter.wire_name();
        let (gathered, base) = match parameter.ty().required_type().as_model() {
            Some(model) => {
                let info = self.cache.describe(model);
                let gathered = coerce::gather_model(&info, &mut lookup).or_else(|| {
                    // Nothing given: let the model's own defaults and
                    // required fields decide.
                    (parameter.is_required() && parameter.default_value().is_none())
                        .then(|| Value::Object(serde_json::Map::new()))
                });
                (gathered, Vec::new())
            }
            None => {
                let occurrences = lookup(key.as_str());
                (coerce::gather(parameter.ty(), &occurrences), vec![key.into()])
            }
        };

        match gathered {
            Some(value) => self.check(parameter, &value, Coercion::Lax, base, args, failures),
            None => absent(parameter, args, failures),
        }
    }

    /// Returns `(limit, actual)` when the body is too large.
    async fn resolve_body(
        &self,
        parameter: &ParameterDescriptor,
        view: &dyn RequestView,
        args: &mut ResolvedArguments,
        failures: &mut Vec<ValidationFailure>,
    ) -> Option<(usize, usize)> {
        let limit = self.config.max_body_size;
        let base: Vec<PathSegment> = vec![parameter.wire_name().into()];

        let bytes = match view.body().await {
            Ok(bytes) => bytes,
            Err(BodyError::TooLarge { limit, actual }) => return Some((limit, actual)),
            Err(err @ BodyError::Read(_)) => {
                failures.push(ValidationFailure::parse_error(base, err.to_string()).at(ParamSource::Body));
                return None;
            }
        };
        if bytes.len() > limit {
            return Some((limit, bytes.len()));
        }
        if bytes.is_empty() {
            absent(parameter, args, failures);
            return None;
        }

        if let Some(content_type) = view.content_type() {
            if !coerce::is_json(content_type) {
                failures.push(
                    ValidationFailure::parse_error(
                        base,
                        format!("unsupported content type '{content_type}', expected JSON"),
                    )
                    .at(ParamSource::Body),
                );
                return None;
            }
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => self.check(parameter, &value, Coercion::Strict, base, args, failures),
            Err(err) => failures.push(
                ValidationFailure::parse_error(base, format!("JSON decode error: {err}"))
                    .at(ParamSource::Body),
            ),
        }
        None
    }

    fn check(
        &self,
        parameter: &ParameterDescriptor,
        value: &Value,
        mode: Coercion,
        base: Vec<PathSegment>,
        args: &mut ResolvedArguments,
        failures: &mut Vec<ValidationFailure>,
    ) {
        let constraints = Some(parameter.constraint_set()).filter(|c| !c.is_empty());
        match self
            .cache
            .validator(mode)
            .validate_at(parameter.ty(), constraints, value, base)
        {
            Ok(normalized) => args.insert_value(parameter.name(), normalized),
            Err(errs) => failures.extend(errs.into_iter().map(|f| f.at(parameter.source()))),
        }
    }
}

fn auth_failed(
    endpoint: &Endpoint,
    parameter: &ParameterDescriptor,
    err: AuthenticationError,
) -> ResolveError {
    tracing::warn!(
        operation_id = endpoint.operation_id(),
        scheme = parameter
            .security_binding()
            .map_or("", |b| b.scheme_name.as_str()),
        kind = ?err.kind,
        "authentication failed"
    );
    ResolveError::Authentication(err)
}

/// Default, null, or a missing failure.
fn absent(
    parameter: &ParameterDescriptor,
    args: &mut ResolvedArguments,
    failures: &mut Vec<ValidationFailure>,
) {
    if let Some(default) = parameter.default_value() {
        args.insert_value(parameter.name(), default.clone());
    } else if parameter.is_required() {
        failures.push(
            ValidationFailure::missing(vec![parameter.wire_name().into()]).at(parameter.source()),
        );
    } else {
        args.insert_value(parameter.name(), Value::Null);
    }
}

fn resolve_files(
    parameter: &ParameterDescriptor,
    view: &dyn RequestView,
    args: &mut ResolvedArguments,
    failures: &mut Vec<ValidationFailure>,
) {
    let key = parameter.wire_name();
    let uploaded = view.files().get_all(&key);
    if uploaded.is_empty() {
        if parameter.is_required() {
            failures.push(ValidationFailure::missing(vec![key.into()]).at(ParamSource::File));
        }
        return;
    }

    let files = if parameter.ty().required_type().is_sequence() {
        uploaded.to_vec()
    } else {
        uploaded[uploaded.len() - 1..].to_vec()
    };
    args.insert_files(parameter.name(), files);
}
