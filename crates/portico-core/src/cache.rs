//! Per-instance cache of model descriptions.
//!
//! [`SchemaCache::describe`] computes a [`ModelInfo`] (field list plus JSON
//! Schema) the first time a model is seen and hands out the same `Arc` on
//! every later call. The cache is an explicit object owned by the facade, so
//! two facades never share state.

use crate::model::{FieldSpec, ModelRef, TypeSpec};
use crate::schema::Schema;
use crate::validate::{Coercion, Validator};
use crate::ValidationFailure;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cached structural description of one model.
#[derive(Debug)]
pub struct ModelInfo {
    model: ModelRef,
    fields: Vec<FieldSpec>,
    schema: Schema,
    references: Vec<ModelRef>,
}

impl ModelInfo {
    fn build(model: &ModelRef, by_alias: bool) -> Self {
        let fields = model.declared_fields();
        let mut schema = Schema::object().with_title(model.name());
        if let Some(description) = model.description() {
            schema = schema.with_description(description);
        }

        let mut references: Vec<ModelRef> = Vec::new();
        for field in &fields {
            let key = if by_alias { field.wire_name() } else { field.name() };
            let mut property = schema_for(field.ty(), Some(field.constraint_set()));
            if let Some(default) = field.default_value() {
                property.default = Some(default.clone());
            }
            if let Some(description) = field.description_text() {
                property.description = Some(description.to_string());
            }
            schema.properties.insert(key.to_string(), property);
            if field.is_required() {
                schema.required.push(key.to_string());
            }
            field.ty().for_each_model(&mut |nested| {
                if !references.contains(nested) {
                    references.push(*nested);
                }
            });
        }

        Self {
            model: *model,
            fields,
            schema,
            references,
        }
    }

    /// The model handle.
    #[must_use]
    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    /// Declared schema name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.model.name()
    }

    /// Ordered field declarations.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks a field up by alias first, then declared name.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.alias_name() == Some(key))
            .or_else(|| self.fields.iter().find(|f| f.name() == key))
    }

    /// Component schema; nested models appear as `$ref`s.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Models referenced directly by this model's fields.
    #[must_use]
    pub fn references(&self) -> &[ModelRef] {
        &self.references
    }
}

/// Builds the inline schema for a type. Models become component references.
#[must_use]
pub fn schema_for(ty: &TypeSpec, constraints: Option<&crate::Constraints>) -> Schema {
    let constrain = |mut schema: Schema| {
        if let Some(constraints) = constraints {
            constraints.apply_to(&mut schema);
        }
        schema
    };
    match ty {
        TypeSpec::Any => constrain(Schema::default()),
        TypeSpec::Boolean => constrain(Schema::boolean()),
        TypeSpec::Integer => constrain(Schema::integer()),
        TypeSpec::Number => constrain(Schema::number()),
        TypeSpec::String => constrain(Schema::string()),
        TypeSpec::File => Schema::binary(),
        TypeSpec::Array(inner) => constrain(Schema::array(schema_for(inner, None))),
        TypeSpec::Optional(inner) => Schema::nullable(schema_for(inner, constraints)),
        TypeSpec::Model(model) => Schema::component_ref(model.name()),
    }
}

/// Cache of [`ModelInfo`] keyed by model identity.
///
/// # Example
///
/// ```
/// use portico_core::{FieldSpec, Model, ModelRef, SchemaCache};
/// use std::sync::Arc;
///
/// struct Ping;
/// impl Model for Ping {
///     const NAME: &'static str = "Ping";
///     fn fields() -> Vec<FieldSpec> {
///         vec![FieldSpec::of::<String>("message")]
///     }
/// }
///
/// let cache = SchemaCache::new();
/// let first = cache.describe(&ModelRef::of::<Ping>());
/// let second = cache.describe(&ModelRef::of::<Ping>());
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.computations(), 1);
/// ```
#[derive(Debug)]
pub struct SchemaCache {
    models: DashMap<TypeId, Arc<ModelInfo>>,
    computations: AtomicUsize,
    by_alias: bool,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCache {
    /// Creates an empty cache whose schemas use aliases as property names.
    #[must_use]
    pub fn new() -> Self {
        Self::with_alias_policy(true)
    }

    /// Creates an empty cache with an explicit property naming policy.
    #[must_use]
    pub fn with_alias_policy(by_alias: bool) -> Self {
        Self {
            models: DashMap::new(),
            computations: AtomicUsize::new(0),
            by_alias,
        }
    }

    /// Whether property names in schemas and dumps use aliases.
    #[must_use]
    pub fn by_alias(&self) -> bool {
        self.by_alias
    }

    /// Returns the cached description of `model`, computing it on first use.
    ///
    /// Concurrent first uses may both compute; the first stored value wins
    /// and every caller gets that one.
    pub fn describe(&self, model: &ModelRef) -> Arc<ModelInfo> {
        if let Some(info) = self.models.get(&model.type_id()) {
            return Arc::clone(info.value());
        }

        // Computed outside the map lock: field declarations may describe
        // other models through this cache.
        let computed = Arc::new(ModelInfo::build(model, self.by_alias));
        self.computations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(model = model.name(), "described model");

        let entry = self.models.entry(model.type_id()).or_insert(computed);
        Arc::clone(entry.value())
    }

    /// Number of descriptions computed so far.
    #[must_use]
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    /// Number of cached models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether nothing has been described yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// A validator bound to this cache.
    #[must_use]
    pub fn validator(&self, mode: Coercion) -> Validator<'_> {
        Validator::new(self, mode)
    }

    /// Validates and normalizes `value` against `ty`.
    ///
    /// Never panics; every problem becomes a [`ValidationFailure`] with a
    /// path relative to `value`.
    pub fn validate(
        &self,
        ty: &TypeSpec,
        value: &Value,
        mode: Coercion,
    ) -> Result<Value, Vec<ValidationFailure>> {
        self.validator(mode).validate(ty, None, value)
    }

    /// Renames declared field names to aliases throughout an already
    /// validated `value` when the alias policy is on.
    #[must_use]
    pub fn dump(&self, ty: &TypeSpec, value: Value) -> Value {
        if self.by_alias {
            self.rename(ty, value)
        } else {
            value
        }
    }

    fn rename(&self, ty: &TypeSpec, value: Value) -> Value {
        match (ty, value) {
            (TypeSpec::Optional(inner), value) => self.rename(inner, value),
            (TypeSpec::Array(inner), Value::Array(items)) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.rename(inner, item))
                    .collect(),
            ),
            (TypeSpec::Model(model), Value::Object(mut input)) => {
                let info = self.describe(model);
                let mut out = Map::new();
                for field in info.fields() {
                    if let Some(v) = input.remove(field.name()) {
                        out.insert(field.wire_name().to_string(), self.rename(field.ty(), v));
                    }
                }
                Value::Object(out)
            }
            (_, value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraints, Model};
    use serde_json::json;

    struct Address;

    impl Model for Address {
        const NAME: &'static str = "Address";

        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::of::<String>("city")]
        }
    }

    struct Person;

    impl Model for Person {
        const NAME: &'static str = "Person";

        fn fields() -> Vec<FieldSpec> {
            vec![
                FieldSpec::of::<String>("full_name")
                    .alias("fullName")
                    .constraints(Constraints::new().min_length(1)),
                FieldSpec::new("home", TypeSpec::model::<Address>()),
                FieldSpec::new("previous", TypeSpec::array(TypeSpec::model::<Address>()))
                    .default(json!([])),
            ]
        }

        fn description() -> Option<&'static str> {
            Some("A person")
        }
    }

    #[test]
    fn test_describe_once() {
        let cache = SchemaCache::new();
        let person = ModelRef::of::<Person>();
        let a = cache.describe(&person);
        let b = cache.describe(&person);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.computations(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_schema_uses_refs_and_aliases() {
        let cache = SchemaCache::new();
        let info = cache.describe(&ModelRef::of::<Person>());
        let schema = serde_json::to_value(info.schema()).unwrap();
        assert_eq!(schema["title"], "Person");
        assert_eq!(schema["description"], "A person");
        assert_eq!(schema["properties"]["fullName"]["minLength"], 1);
        assert_eq!(
            schema["properties"]["home"]["$ref"],
            "#/components/schemas/Address"
        );
        assert_eq!(
            schema["properties"]["previous"]["items"]["$ref"],
            "#/components/schemas/Address"
        );
        assert_eq!(schema["required"], json!(["fullName", "home"]));
        assert_eq!(info.references(), &[ModelRef::of::<Address>()]);
    }

    #[test]
    fn test_schema_declared_names() {
        let cache = SchemaCache::with_alias_policy(false);
        let info = cache.describe(&ModelRef::of::<Person>());
        assert!(info.schema().properties.contains_key("full_name"));
    }

    #[test]
    fn test_field_lookup_alias_first() {
        let cache = SchemaCache::new();
        let info = cache.describe(&ModelRef::of::<Person>());
        assert_eq!(info.field("fullName").map(FieldSpec::name), Some("full_name"));
        assert_eq!(info.field("full_name").map(FieldSpec::name), Some("full_name"));
        assert!(info.field("unknown").is_none());
    }

    #[test]
    fn test_dump_renames_nested_fields() {
        let cache = SchemaCache::new();
        let ty = TypeSpec::array(TypeSpec::model::<Person>());
        let value = json!([{"full_name": "Ada", "home": {"city": "London"}, "previous": []}]);
        let dumped = cache.dump(&ty, value.clone());
        assert_eq!(
            dumped,
            json!([{"fullName": "Ada", "home": {"city": "London"}, "previous": []}])
        );

        let plain = SchemaCache::with_alias_policy(false);
        assert_eq!(plain.dump(&ty, value.clone()), value);
    }

    #[test]
    fn test_concurrent_describe_converges() {
        let cache = Arc::new(SchemaCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.describe(&ModelRef::of::<Person>()))
            })
            .collect();
        let infos: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = cache.describe(&ModelRef::of::<Person>());
        assert!(infos.iter().all(|info| Arc::ptr_eq(info, &stored)));
        assert_eq!(cache.len(), 1);
    }
}
