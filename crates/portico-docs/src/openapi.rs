//! OpenAPI document types and generation.
//!
//! The types in this module follow the OpenAPI 3.1 specification:
//! <https://spec.openapis.org/oas/v3.1.0>
//!
//! [`OpenApiGenerator::generate`] turns a list of registered endpoints into a
//! document. Output is deterministic: paths and operations keep registration
//! order, components are sorted by name, and every map is ordered.

use indexmap::{IndexMap, IndexSet};
use portico_core::{
    schema_for, ConfigurationError, Endpoint, FieldSpec, ModelRef, ParamSource,
    ParameterDescriptor, Schema, SchemaCache, SecurityRequirement, TypeSpec,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::error::{DocsError, DocsResult};

/// Version string written into every document.
pub const OPENAPI_VERSION: &str = "3.1.0";

/// Component name of a single validation failure.
pub const VALIDATION_ERROR: &str = "ValidationError";

/// Component name of the 422 response body.
pub const HTTP_VALIDATION_ERROR: &str = "HTTPValidationError";

const JSON: &str = "application/json";
const MULTIPART: &str = "multipart/form-data";

/// OpenAPI document root object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    /// OpenAPI version (always "3.1.0").
    pub openapi: String,
    /// API metadata.
    pub info: Info,
    /// Available servers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths and operations.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    /// Reusable components (schemas, security schemes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// Default security applied to every operation without its own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirementObject>,
    /// Tags for API grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl OpenApi {
    /// Looks up the operation for `method` on `path`.
    #[must_use]
    pub fn operation(&self, method: &http::Method, path: &str) -> Option<&Operation> {
        self.paths.get(path)?.get(method)
    }

    /// Looks up a component schema by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Schema> {
        self.components.as_ref()?.schemas.get(name)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> DocsResult<String> {
        serde_json::to_string_pretty(self).map_err(DocsError::from)
    }
}

/// API metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    pub title: String,
    /// API version.
    pub version: String,
    /// API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Contact information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// License information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// Contact information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    /// License name.
    pub name: String,
    /// License URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Server information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL.
    pub url: String,
    /// Server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The operations available on a single path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// TRACE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: &http::Method) -> Option<&mut Option<Operation>> {
        Some(match *method {
            http::Method::GET => &mut self.get,
            http::Method::PUT => &mut self.put,
            http::Method::POST => &mut self.post,
            http::Method::DELETE => &mut self.delete,
            http::Method::OPTIONS => &mut self.options,
            http::Method::HEAD => &mut self.head,
            http::Method::PATCH => &mut self.patch,
            http::Method::TRACE => &mut self.trace,
            _ => return None,
        })
    }

    /// The operation for `method`, if present.
    #[must_use]
    pub fn get(&self, method: &http::Method) -> Option<&Operation> {
        match *method {
            http::Method::GET => self.get.as_ref(),
            http::Method::PUT => self.put.as_ref(),
            http::Method::POST => self.post.as_ref(),
            http::Method::DELETE => self.delete.as_ref(),
            http::Method::OPTIONS => self.options.as_ref(),
            http::Method::HEAD => self.head.as_ref(),
            http::Method::PATCH => self.patch.as_ref(),
            http::Method::TRACE => self.trace.as_ref(),
            _ => None,
        }
    }
}

/// An API operation (endpoint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Tags for grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Full description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique operation identifier.
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// Parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code.
    pub responses: IndexMap<String, Response>,
    /// Whether deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Security requirements. `None` inherits the document's; an empty list
    /// marks the operation public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirementObject>>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// Query string parameter.
    Query,
    /// URL path parameter.
    Path,
    /// HTTP header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParameterIn {
    fn from_source(source: ParamSource) -> Option<Self> {
        match source {
            ParamSource::Path => Some(Self::Path),
            ParamSource::Query => Some(Self::Query),
            ParamSource::Header => Some(Self::Header),
            ParamSource::Cookie => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name as sent on the wire.
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Whether deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Parameter schema.
    pub schema: Schema,
}

impl Parameter {
    fn from_descriptor(param: &ParameterDescriptor, location: ParameterIn) -> Self {
        Self {
            name: param.wire_name(),
            location,
            description: param.description_text().map(str::to_string),
            required: param.is_required(),
            deprecated: param.is_deprecated(),
            schema: parameter_schema(param),
        }
    }

    fn from_field(field: &FieldSpec, location: ParameterIn, parent_required: bool) -> Self {
        let mut schema = schema_for(field.ty(), Some(field.constraint_set()));
        schema.default = field.default_value().cloned();
        Self {
            name: field.wire_name().to_string(),
            location,
            description: field.description_text().map(str::to_string),
            required: parent_required && field.is_required(),
            deprecated: false,
            schema,
        }
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Content by media type.
    pub content: IndexMap<String, MediaType>,
}

/// Media type content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type.
    pub schema: Schema,
}

fn content(media_type: &str, schema: Schema) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(media_type.to_string(), MediaType { schema });
    content
}

/// Response definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Description (required).
    pub description: String,
    /// Response content by media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Reusable components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Reusable schemas, sorted by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
    /// Security schemes.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[serde(rename = "securitySchemes")]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

impl Components {
    fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.security_schemes.is_empty()
    }
}

/// Security scheme object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// Security scheme type ("http" or "apiKey").
    #[serde(rename = "type")]
    pub scheme_type: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// HTTP auth scheme name (for type=http).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Bearer token format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "bearerFormat")]
    pub bearer_format: Option<String>,
    /// API key location (for type=apiKey).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "in")]
    pub location: Option<String>,
    /// API key name (for type=apiKey).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&portico_core::SecurityScheme> for SecurityScheme {
    fn from(scheme: &portico_core::SecurityScheme) -> Self {
        let http = |name: &str, bearer_format: Option<String>| Self {
            scheme_type: "http".to_string(),
            description: None,
            scheme: Some(name.to_string()),
            bearer_format,
            location: None,
            name: None,
        };
        match scheme {
            portico_core::SecurityScheme::HttpBearer { bearer_format } => {
                http("bearer", bearer_format.clone())
            }
            portico_core::SecurityScheme::HttpBasic => http("basic", None),
            portico_core::SecurityScheme::ApiKey { location, name } => Self {
                scheme_type: "apiKey".to_string(),
                description: None,
                scheme: None,
                bearer_format: None,
                location: Some(location.as_str().to_string()),
                name: Some(name.clone()),
            },
        }
    }
}

/// Security requirement object: scheme name to required scopes.
pub type SecurityRequirementObject = BTreeMap<String, Vec<String>>;

fn requirement_object(requirement: &SecurityRequirement) -> SecurityRequirementObject {
    let mut object = BTreeMap::new();
    object.insert(
        requirement.scheme().to_string(),
        requirement.scope_list().to_vec(),
    );
    object
}

/// API tag for grouping operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Generator for turning registered endpoints into an OpenAPI document.
///
/// # Example
///
/// ```
/// use portico_core::{ApiError, EndpointBuilder, Router, SchemaCache};
/// use portico_docs::OpenApiGenerator;
///
/// let mut router = Router::new();
/// router
///     .add(EndpointBuilder::get("/health").handler_sync(|_| Ok::<_, ApiError>("ok")))
///     .unwrap();
///
/// let doc = OpenApiGenerator::new()
///     .title("Inventory")
///     .version("1.2.0")
///     .generate(router.endpoints(), &SchemaCache::new())
///     .unwrap();
/// assert_eq!(doc.openapi, "3.1.0");
/// assert!(doc.paths.contains_key("/health"));
/// ```
#[derive(Debug, Clone)]
pub struct OpenApiGenerator {
    title: String,
    version: String,
    description: Option<String>,
    servers: Vec<Server>,
    contact: Option<Contact>,
    license: Option<License>,
    security: Vec<SecurityRequirement>,
    security_schemes: IndexMap<String, SecurityScheme>,
    tag_descriptions: IndexMap<String, String>,
}

impl Default for OpenApiGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenApiGenerator {
    /// Create a new generator titled "Portico API", version "0.1.0".
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: "Portico API".to_string(),
            version: "0.1.0".to_string(),
            description: None,
            servers: Vec::new(),
            contact: None,
            license: None,
            security: Vec::new(),
            security_schemes: IndexMap::new(),
            tag_descriptions: IndexMap::new(),
        }
    }

    /// Set the API title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a server.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }

    /// Set contact information.
    #[must_use]
    pub fn contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Set license information.
    #[must_use]
    pub fn license(mut self, name: impl Into<String>, url: Option<String>) -> Self {
        self.license = Some(License {
            name: name.into(),
            url,
        });
        self
    }

    /// Add a document-level security requirement.
    ///
    /// Operations whose effective requirements equal the document's omit
    /// their own `security`; public operations emit an empty list.
    #[must_use]
    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        if !self.security.contains(&requirement) {
            self.security.push(requirement);
        }
        self
    }

    /// Publish a security scheme that no security parameter declares, for
    /// requirements attached at router level.
    #[must_use]
    pub fn security_scheme(
        mut self,
        name: impl Into<String>,
        scheme: &portico_core::SecurityScheme,
    ) -> Self {
        self.security_schemes.insert(name.into(), scheme.into());
        self
    }

    /// Describe a tag in the document's `tags` list.
    #[must_use]
    pub fn tag_description(mut self, tag: impl Into<String>, description: impl Into<String>) -> Self {
        self.tag_descriptions.insert(tag.into(), description.into());
        self
    }

    /// Generate the document for `endpoints`.
    ///
    /// # Errors
    ///
    /// [`DocsError::Configuration`] when two endpoints share an operation id
    /// or two distinct models declare the same schema name;
    /// [`DocsError::UnsupportedMethod`] for methods OpenAPI cannot express.
    pub fn generate(&self, endpoints: &[Arc<Endpoint>], cache: &SchemaCache) -> DocsResult<OpenApi> {
        check_operation_ids(endpoints)?;

        let document_security: Vec<SecurityRequirementObject> =
            self.security.iter().map(requirement_object).collect();
        let mut collector = ModelCollector::default();
        let mut security_schemes = self.security_schemes.clone();
        let mut paths: IndexMap<String, PathItem> = IndexMap::new();
        let mut tag_names: IndexSet<String> = IndexSet::new();
        let mut validation_errors = false;

        for endpoint in endpoints {
            let operation = self.operation(
                endpoint,
                cache,
                &mut collector,
                &mut security_schemes,
                &document_security,
            )?;
            validation_errors |= operation.responses.contains_key("422");
            tag_names.extend(operation.tags.iter().cloned());

            let item = paths.entry(endpoint.path().to_string()).or_default();
            let Some(slot) = item.slot(endpoint.method()) else {
                return Err(DocsError::UnsupportedMethod {
                    method: endpoint.method().to_string(),
                    path: endpoint.path().to_string(),
                });
            };
            *slot = Some(operation);
        }

        let mut schemas = collector.into_schemas(cache);
        if validation_errors {
            for (name, schema) in [
                (VALIDATION_ERROR, validation_error_schema()),
                (HTTP_VALIDATION_ERROR, http_validation_error_schema()),
            ] {
                if let Some(user) = schemas.get(name) {
                    return Err(ConfigurationError::SchemaNameCollision {
                        name: name.to_string(),
                        first: user.title.clone().unwrap_or_else(|| name.to_string()),
                        second: "built-in validation error schema".to_string(),
                    }
                    .into());
                }
                schemas.insert(name.to_string(), schema);
            }
            schemas.sort_keys();
        }

        let components = Components {
            schemas,
            security_schemes,
        };
        let tags = tag_names
            .into_iter()
            .map(|name| Tag {
                description: self.tag_descriptions.get(&name).cloned(),
                name,
            })
            .collect();

        let doc = OpenApi {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info {
                title: self.title.clone(),
                version: self.version.clone(),
                description: self.description.clone(),
                contact: self.contact.clone(),
                license: self.license.clone(),
            },
            servers: self.servers.clone(),
            paths,
            components: (!components.is_empty()).then_some(components),
            security: document_security,
            tags,
        };

        tracing::info!(
            endpoints = endpoints.len(),
            paths = doc.paths.len(),
            schemas = doc.components.as_ref().map_or(0, |c| c.schemas.len()),
            "generated OpenAPI document"
        );
        Ok(doc)
    }

    /// Generate the document as pretty-printed JSON.
    pub fn generate_json(&self, endpoints: &[Arc<Endpoint>], cache: &SchemaCache) -> DocsResult<String> {
        self.generate(endpoints, cache)?.to_json()
    }

    fn operation(
        &self,
        endpoint: &Endpoint,
        cache: &SchemaCache,
        collector: &mut ModelCollector,
        security_schemes: &mut IndexMap<String, SecurityScheme>,
        document_security: &[SecurityRequirementObject],
    ) -> DocsResult<Operation> {
        let mut parameters = Vec::new();
        let mut body: Option<&ParameterDescriptor> = None;
        let mut files: Vec<&ParameterDescriptor> = Vec::new();

        for param in endpoint.parameters() {
            if let Some(location) = ParameterIn::from_source(param.source()) {
                match param.ty().as_model() {
                    Some(model) if location != ParameterIn::Path => {
                        let info = cache.describe(model);
                        for field in info.fields() {
                            collector.visit_type(field.ty(), cache)?;
                            parameters.push(Parameter::from_field(field, location, param.is_required()));
                        }
                    }
                    _ => {
                        collector.visit_type(param.ty(), cache)?;
                        parameters.push(Parameter::from_descriptor(param, location));
                    }
                }
                continue;
            }
            match param.source() {
                ParamSource::Body => {
                    collector.visit_type(param.ty(), cache)?;
                    body = Some(param);
                }
                ParamSource::File => files.push(param),
                ParamSource::Security => {
                    if let Some(binding) = param.security_binding() {
                        let scheme = SecurityScheme::from(&binding.scheme);
                        match security_schemes.get(&binding.scheme_name) {
                            Some(existing) if *existing != scheme => tracing::warn!(
                                scheme = %binding.scheme_name,
                                "security scheme declared twice with different settings; keeping the first"
                            ),
                            Some(_) => {}
                            None => {
                                security_schemes.insert(binding.scheme_name.clone(), scheme);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let request_body = if files.is_empty() {
            body.map(|param| RequestBody {
                description: param.description_text().map(str::to_string),
                required: param.is_required(),
                content: content(JSON, parameter_schema(param)),
            })
        } else {
            let mut form = Schema::object();
            for param in files.iter().copied().chain(body) {
                form.properties.insert(param.wire_name(), parameter_schema(param));
                if param.is_required() {
                    form.required.push(param.wire_name());
                }
            }
            Some(RequestBody {
                description: None,
                required: !form.required.is_empty(),
                content: content(MULTIPART, form),
            })
        };

        let mut responses = IndexMap::new();
        let contract = endpoint.response();
        let status = endpoint.status_code();
        let mut success = Response {
            description: contract.description_text().to_string(),
            content: IndexMap::new(),
        };
        if let Some(ty) = contract.ty() {
            if !matches!(status, 204 | 304) {
                collector.visit_type(ty, cache)?;
                success.content = content(JSON, schema_for(ty, None));
            }
        }
        responses.insert(status.to_string(), success);
        if endpoint.can_fail_validation() {
            responses.insert(
                "422".to_string(),
                Response {
                    description: "Validation Error".to_string(),
                    content: content(JSON, Schema::component_ref(HTTP_VALIDATION_ERROR)),
                },
            );
        }

        let mut requirements: Vec<SecurityRequirement> =
            endpoint.security().map(<[_]>::to_vec).unwrap_or_default();
        for requirement in endpoint.parameter_security() {
            if !requirements.contains(&requirement) {
                requirements.push(requirement);
            }
        }
        let requirements: Vec<SecurityRequirementObject> =
            requirements.iter().map(requirement_object).collect();
        let security = (requirements != document_security).then_some(requirements);

        Ok(Operation {
            tags: endpoint.tags().into_iter().map(str::to_string).collect(),
            summary: endpoint.summary().map(str::to_string),
            description: endpoint.description().map(str::to_string),
            operation_id: endpoint.operation_id().to_string(),
            parameters,
            request_body,
            responses,
            deprecated: endpoint.is_deprecated(),
            security,
        })
    }
}

fn parameter_schema(param: &ParameterDescriptor) -> Schema {
    let mut schema = schema_for(param.ty(), Some(param.constraint_set()));
    schema.default = param.default_value().cloned();
    schema
}

fn check_operation_ids(endpoints: &[Arc<Endpoint>]) -> DocsResult<()> {
    let mut seen = HashSet::new();
    for endpoint in endpoints {
        if !seen.insert(endpoint.operation_id()) {
            return Err(ConfigurationError::DuplicateOperationId {
                operation_id: endpoint.operation_id().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Gathers every model reachable from the documented types, one per name.
#[derive(Default)]
struct ModelCollector {
    seen: HashSet<ModelRef>,
    by_name: BTreeMap<&'static str, ModelRef>,
}

impl ModelCollector {
    fn visit_type(&mut self, ty: &TypeSpec, cache: &SchemaCache) -> DocsResult<()> {
        let mut found = Vec::new();
        ty.for_each_model(&mut |model| found.push(*model));
        for model in found {
            self.visit_model(model, cache)?;
        }
        Ok(())
    }

    fn visit_model(&mut self, model: ModelRef, cache: &SchemaCache) -> DocsResult<()> {
        let mut stack = vec![model];
        while let Some(model) = stack.pop() {
            if !self.seen.insert(model) {
                continue;
            }
            if let Some(existing) = self.by_name.get(model.name()) {
                return Err(ConfigurationError::SchemaNameCollision {
                    name: model.name().to_string(),
                    first: existing.type_name().to_string(),
                    second: model.type_name().to_string(),
                }
                .into());
            }
            self.by_name.insert(model.name(), model);
            stack.extend(cache.describe(&model).references().iter().copied());
        }
        Ok(())
    }

    fn into_schemas(self, cache: &SchemaCache) -> IndexMap<String, Schema> {
        self.by_name
            .into_values()
            .map(|model| {
                let info = cache.describe(&model);
                (info.name().to_string(), info.schema().clone())
            })
            .collect()
    }
}

/// Schema of one entry in a validation error's `details`.
fn validation_error_schema() -> Schema {
    let location = Schema {
        enum_values: ["path", "query", "header", "cookie", "body", "file"]
            .into_iter()
            .map(serde_json::Value::from)
            .collect(),
        ..Schema::string()
    };
    let segment = Schema {
        any_of: vec![Schema::string(), Schema::integer()],
        ..Schema::default()
    };
    let kind = Schema {
        enum_values: ["missing_error", "type_error", "value_error", "parse_error"]
            .into_iter()
            .map(serde_json::Value::from)
            .collect(),
        ..Schema::string()
    };
    Schema::object()
        .with_title(VALIDATION_ERROR)
        .property("location", location)
        .property("field_path", Schema::array(segment))
        .property("message", Schema::string())
        .property("kind", kind)
        .required_property("field_path")
        .required_property("message")
        .required_property("kind")
}

/// Schema of the 422 error envelope.
fn http_validation_error_schema() -> Schema {
    let detail = Schema::object()
        .property("code", Schema::string())
        .property("message", Schema::string())
        .property("category", Schema::string())
        .property("details", Schema::array(Schema::component_ref(VALIDATION_ERROR)))
        .required_property("code")
        .required_property("message")
        .required_property("category");
    Schema::object()
        .with_title(HTTP_VALIDATION_ERROR)
        .property("error", detail)
        .required_property("error")
}
