//! Parameter descriptors.
//!
//! A [`ParameterDescriptor`] says where one handler argument comes from
//! (its [`ParamSource`]), what type it has and how absence is treated.
//! Endpoints carry an ordered list of them; the resolver walks that list.

use crate::dependency::Provider;
use crate::model::{Constraints, TypeSpec, Typed};
use crate::security::{Authenticator, SecurityRequirement, SecurityScheme};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSource {
    /// Path template capture.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
    /// JSON request body.
    Body,
    /// Multipart file upload.
    File,
    /// Value produced by a dependency provider.
    Dependency,
    /// Authenticated principal.
    Security,
}

impl ParamSource {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
            Self::File => "file",
            Self::Dependency => "dependency",
            Self::Security => "security",
        }
    }

    /// Whether values from this source arrive as text and are coerced.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::Path | Self::Query | Self::Header | Self::Cookie)
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A security parameter's scheme, requirement and authenticator.
#[derive(Clone)]
pub struct SecurityBinding {
    /// Name under which the scheme is published.
    pub scheme_name: String,
    /// How credentials are carried.
    pub scheme: SecurityScheme,
    /// Required scopes.
    pub scopes: Vec<String>,
    /// Validates the credentials.
    pub authenticator: Arc<dyn Authenticator>,
}

impl SecurityBinding {
    /// The requirement this binding contributes to the endpoint.
    #[must_use]
    pub fn requirement(&self) -> SecurityRequirement {
        SecurityRequirement::new(self.scheme_name.clone()).scopes(self.scopes.clone())
    }
}

impl fmt::Debug for SecurityBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityBinding")
            .field("scheme_name", &self.scheme_name)
            .field("scheme", &self.scheme)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// Declaration of one handler argument.
///
/// # Example
///
/// ```
/// use portico_core::{Constraints, ParameterDescriptor, ParamSource, TypeSpec};
///
/// let limit = ParameterDescriptor::query("limit", TypeSpec::Integer)
///     .default(serde_json::json!(10))
///     .constraints(Constraints::new().minimum(1.0).maximum(100.0));
/// assert_eq!(limit.source(), ParamSource::Query);
/// assert!(!limit.is_required());
///
/// let agent = ParameterDescriptor::header("user_agent", TypeSpec::String);
/// assert_eq!(agent.wire_name(), "user-agent");
/// ```
#[derive(Clone)]
pub struct ParameterDescriptor {
    name: String,
    alias: Option<String>,
    source: ParamSource,
    ty: TypeSpec,
    required: bool,
    default: Option<Value>,
    constraints: Constraints,
    description: Option<String>,
    deprecated: bool,
    provider: Option<Arc<dyn Provider>>,
    security: Option<SecurityBinding>,
}

impl ParameterDescriptor {
    /// Creates a descriptor; required unless `ty` is optional. Path
    /// parameters are always required.
    #[must_use]
    pub fn new(source: ParamSource, name: impl Into<String>, ty: TypeSpec) -> Self {
        let required = source == ParamSource::Path || !ty.is_optional();
        Self {
            name: name.into(),
            alias: None,
            source,
            ty,
            required,
            default: None,
            constraints: Constraints::default(),
            description: None,
            deprecated: false,
            provider: None,
            security: None,
        }
    }

    /// Creates a descriptor typed from a Rust type.
    #[must_use]
    pub fn of<T: Typed>(source: ParamSource, name: impl Into<String>) -> Self {
        Self::new(source, name, T::type_spec())
    }

    /// Path capture.
    #[must_use]
    pub fn path(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self::new(ParamSource::Path, name, ty)
    }

    /// Query parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self::new(ParamSource::Query, name, ty)
    }

    /// Header.
    #[must_use]
    pub fn header(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self::new(ParamSource::Header, name, ty)
    }

    /// Cookie.
    #[must_use]
    pub fn cookie(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self::new(ParamSource::Cookie, name, ty)
    }

    /// JSON body.
    #[must_use]
    pub fn body(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self::new(ParamSource::Body, name, ty)
    }

    /// Single uploaded file.
    #[must_use]
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(ParamSource::File, name, TypeSpec::File)
    }

    /// Any number of uploaded files under one field.
    #[must_use]
    pub fn files(name: impl Into<String>) -> Self {
        Self::new(ParamSource::File, name, TypeSpec::array(TypeSpec::File))
    }

    /// Value produced by `provider`.
    #[must_use]
    pub fn dependency(name: impl Into<String>, provider: impl Provider + 'static) -> Self {
        Self::dependency_shared(name, Arc::new(provider))
    }

    /// Value produced by a shared provider.
    #[must_use]
    pub fn dependency_shared(name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        let mut descriptor = Self::new(ParamSource::Dependency, name, TypeSpec::Any);
        descriptor.required = true;
        descriptor.provider = Some(provider);
        descriptor
    }

    /// Authenticated principal.
    #[must_use]
    pub fn security(
        name: impl Into<String>,
        scheme_name: impl Into<String>,
        scheme: SecurityScheme,
        authenticator: impl Authenticator + 'static,
    ) -> Self {
        let mut descriptor = Self::new(ParamSource::Security, name, TypeSpec::Any);
        descriptor.required = true;
        descriptor.security = Some(SecurityBinding {
            scheme_name: scheme_name.into(),
            scheme,
            scopes: Vec::new(),
            authenticator: Arc::new(authenticator),
        });
        descriptor
    }

    /// Sets the wire name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets a default; the parameter becomes optional.
    #[must_use]
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }

    /// Marks the parameter optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        if self.source != ParamSource::Path {
            self.required = false;
        }
        self
    }

    /// Sets constraints.
    #[must_use]
    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets a description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the parameter deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Adds required scopes to a security parameter.
    #[must_use]
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(binding) = self.security.as_mut() {
            binding.scopes.extend(scopes.into_iter().map(Into::into));
        }
        self
    }

    /// Declared name; the key in resolved arguments.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias, if any.
    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// External name: the alias, or for headers the name with `_` turned
    /// into `-`, otherwise the declared name.
    #[must_use]
    pub fn wire_name(&self) -> String {
        match (&self.alias, self.source) {
            (Some(alias), _) => alias.clone(),
            (None, ParamSource::Header) => self.name.replace('_', "-"),
            (None, _) => self.name.clone(),
        }
    }

    /// Source.
    #[must_use]
    pub fn source(&self) -> ParamSource {
        self.source
    }

    /// Declared type.
    #[must_use]
    pub fn ty(&self) -> &TypeSpec {
        &self.ty
    }

    /// Whether absence is an error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Default value.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Constraints.
    #[must_use]
    pub fn constraint_set(&self) -> &Constraints {
        &self.constraints
    }

    /// Description.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Dependency provider.
    #[must_use]
    pub fn provider(&self) -> Option<&Arc<dyn Provider>> {
        self.provider.as_ref()
    }

    /// Security binding.
    #[must_use]
    pub fn security_binding(&self) -> Option<&SecurityBinding> {
        self.security.as_ref()
    }
}

impl fmt::Debug for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDescriptor")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("source", &self.source)
            .field("ty", &self.ty)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("deprecated", &self.deprecated)
            .field("has_provider", &self.provider.is_some())
            .field("security", &self.security)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_defaults() {
        assert!(ParameterDescriptor::query("q", TypeSpec::String).is_required());
        assert!(!ParameterDescriptor::query("q", TypeSpec::optional(TypeSpec::String)).is_required());
        assert!(ParameterDescriptor::path("id", TypeSpec::Integer).optional().is_required());
        assert!(!ParameterDescriptor::cookie("session", TypeSpec::String)
            .optional()
            .is_required());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            ParameterDescriptor::header("x_request_id", TypeSpec::String).wire_name(),
            "x-request-id"
        );
        assert_eq!(
            ParameterDescriptor::header("token", TypeSpec::String)
                .alias("X_Token")
                .wire_name(),
            "X_Token"
        );
        assert_eq!(
            ParameterDescriptor::query("page_size", TypeSpec::Integer).wire_name(),
            "page_size"
        );
    }

    #[test]
    fn test_source_serialization() {
        assert_eq!(serde_json::to_value(ParamSource::Query).unwrap(), "query");
        assert!(ParamSource::Cookie.is_textual());
        assert!(!ParamSource::Body.is_textual());
    }

    #[test]
    fn test_files_descriptor() {
        let files = ParameterDescriptor::files("attachments");
        assert!(files.ty().is_file());
        assert!(files.ty().is_sequence());
    }
}
