//! Declared types: models, fields, type specs and constraints.
//!
//! A record type becomes a *model* by implementing [`Model`], which gives it a
//! declared schema name and an ordered list of [`FieldSpec`]s. Everything the
//! validator and the document generator need is read from that declaration;
//! the [`SchemaCache`](crate::SchemaCache) turns it into a cached
//! [`ModelInfo`](crate::ModelInfo).
//!
//! # Example
//!
//! ```
//! use portico_core::{Constraints, FieldSpec, Model, TypeSpec};
//!
//! struct Item;
//!
//! impl Model for Item {
//!     const NAME: &'static str = "Item";
//!
//!     fn fields() -> Vec<FieldSpec> {
//!         vec![
//!             FieldSpec::new("name", TypeSpec::String)
//!                 .constraints(Constraints::new().min_length(1)),
//!             FieldSpec::new("price", TypeSpec::Number),
//!             FieldSpec::new("tags", TypeSpec::array(TypeSpec::String))
//!                 .default(serde_json::json!([])),
//!         ]
//!     }
//! }
//!
//! assert_eq!(TypeSpec::model::<Item>().to_string(), "Item");
//! ```

use regex::Regex;
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A record type with a declared schema.
pub trait Model: Send + Sync + 'static {
    /// Declared schema name, used as the component key in the document.
    const NAME: &'static str;

    /// Ordered field declarations.
    fn fields() -> Vec<FieldSpec>;

    /// Optional model description.
    fn description() -> Option<&'static str> {
        None
    }
}

/// Identity-keyed handle to a [`Model`] implementation.
///
/// Two refs are equal exactly when they point at the same Rust type, even if
/// two different types declare the same [`Model::NAME`].
#[derive(Clone, Copy)]
pub struct ModelRef {
    type_id: TypeId,
    type_name: &'static str,
    name: &'static str,
    fields: fn() -> Vec<FieldSpec>,
    description: fn() -> Option<&'static str>,
}

impl ModelRef {
    /// Creates a handle for `M`.
    #[must_use]
    pub fn of<M: Model>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            name: M::NAME,
            fields: M::fields,
            description: M::description,
        }
    }

    /// The identity key.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type name (diagnostics only).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The declared schema name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared description.
    #[must_use]
    pub fn description(&self) -> Option<&'static str> {
        (self.description)()
    }

    /// Calls the field declaration. Prefer [`SchemaCache::describe`](crate::SchemaCache::describe),
    /// which does this once per model.
    #[must_use]
    pub fn declared_fields(&self) -> Vec<FieldSpec> {
        (self.fields)()
    }
}

impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ModelRef {}

impl Hash for ModelRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// The declared type of a parameter, field or response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    /// Any JSON value, unvalidated.
    Any,
    /// JSON boolean.
    Boolean,
    /// Integral number.
    Integer,
    /// Any number.
    Number,
    /// String.
    String,
    /// Uploaded file.
    File,
    /// Homogeneous sequence.
    Array(Box<TypeSpec>),
    /// Value that may be null or absent.
    Optional(Box<TypeSpec>),
    /// A structured model.
    Model(ModelRef),
}

impl TypeSpec {
    /// `Array(inner)`.
    #[must_use]
    pub fn array(inner: TypeSpec) -> Self {
        Self::Array(Box::new(inner))
    }

    /// `Optional(inner)`.
    #[must_use]
    pub fn optional(inner: TypeSpec) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// `Model(M)`.
    #[must_use]
    pub fn model<M: Model>() -> Self {
        Self::Model(ModelRef::of::<M>())
    }

    /// The spec for a Rust type implementing [`Typed`].
    #[must_use]
    pub fn of<T: Typed>() -> Self {
        T::type_spec()
    }

    /// Whether null/absent is acceptable.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_) | Self::Any)
    }

    /// Strips any `Optional` wrappers.
    #[must_use]
    pub fn required_type(&self) -> &TypeSpec {
        match self {
            Self::Optional(inner) => inner.required_type(),
            other => other,
        }
    }

    /// Whether the (unwrapped) type is a sequence.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self.required_type(), Self::Array(_))
    }

    /// Whether the (unwrapped) type is a model.
    #[must_use]
    pub fn as_model(&self) -> Option<&ModelRef> {
        match self.required_type() {
            Self::Model(model) => Some(model),
            _ => None,
        }
    }

    /// Whether the (unwrapped) type is a file or a sequence of files.
    #[must_use]
    pub fn is_file(&self) -> bool {
        match self.required_type() {
            Self::File => true,
            Self::Array(inner) => matches!(inner.required_type(), Self::File),
            _ => false,
        }
    }

    /// Whether the (unwrapped) type is a JSON primitive.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.required_type(),
            Self::Boolean | Self::Integer | Self::Number | Self::String
        )
    }

    /// Visits every model reachable from this type without descending into
    /// the models themselves.
    pub fn for_each_model(&self, visit: &mut impl FnMut(&ModelRef)) {
        match self {
            Self::Array(inner) | Self::Optional(inner) => inner.for_each_model(visit),
            Self::Model(model) => visit(model),
            _ => {}
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Boolean => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::File => f.write_str("file"),
            Self::Array(inner) => write!(f, "array<{inner}>"),
            Self::Optional(inner) => write!(f, "optional<{inner}>"),
            Self::Model(model) => f.write_str(model.name()),
        }
    }
}

/// Rust types with a natural [`TypeSpec`].
///
/// Models opt in by returning [`TypeSpec::model`]:
///
/// ```
/// # use portico_core::{FieldSpec, Model, TypeSpec, Typed};
/// struct User;
/// # impl Model for User {
/// #     const NAME: &'static str = "User";
/// #     fn fields() -> Vec<FieldSpec> { Vec::new() }
/// # }
/// impl Typed for User {
///     fn type_spec() -> TypeSpec {
///         TypeSpec::model::<Self>()
///     }
/// }
///
/// assert_eq!(TypeSpec::of::<Vec<User>>(), TypeSpec::array(TypeSpec::model::<User>()));
/// ```
pub trait Typed {
    /// The declared type.
    fn type_spec() -> TypeSpec;
}

macro_rules! typed {
    ($spec:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Typed for $ty {
                fn type_spec() -> TypeSpec {
                    $spec
                }
            }
        )+
    };
}

typed!(TypeSpec::Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
typed!(TypeSpec::Number => f32, f64);
typed!(TypeSpec::Boolean => bool);
typed!(TypeSpec::String => String, &str);
typed!(TypeSpec::Any => Value);

impl<T: Typed> Typed for Vec<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::array(T::type_spec())
    }
}

impl<T: Typed> Typed for Option<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::optional(T::type_spec())
    }
}

/// A compiled regex constraint that remembers its source.
///
/// Compilation errors are kept and reported by
/// [`Router::add`](crate::Router::add) as configuration errors.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Result<Regex, String>,
}

impl Pattern {
    /// Compiles `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&source).map_err(|e| e.to_string());
        Self { source, compiled }
    }

    /// The pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled regex, or the compiler message.
    pub fn regex(&self) -> Result<&Regex, &str> {
        self.compiled.as_ref().map_err(String::as_str)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Value constraints attached to a field or parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Inclusive minimum.
    pub minimum: Option<f64>,
    /// Inclusive maximum.
    pub maximum: Option<f64>,
    /// Exclusive minimum.
    pub exclusive_minimum: Option<f64>,
    /// Exclusive maximum.
    pub exclusive_maximum: Option<f64>,
    /// Minimum string length in characters.
    pub min_length: Option<usize>,
    /// Maximum string length in characters.
    pub max_length: Option<usize>,
    /// Regex the whole string is searched with.
    pub pattern: Option<Pattern>,
    /// Minimum number of array items.
    pub min_items: Option<usize>,
    /// Maximum number of array items.
    pub max_items: Option<usize>,
    /// Permitted values.
    pub enum_values: Vec<Value>,
}

impl Constraints {
    /// No constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `value >= minimum`.
    #[must_use]
    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// `value <= maximum`.
    #[must_use]
    pub fn maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// `value > bound`.
    #[must_use]
    pub fn exclusive_minimum(mut self, bound: f64) -> Self {
        self.exclusive_minimum = Some(bound);
        self
    }

    /// `value < bound`.
    #[must_use]
    pub fn exclusive_maximum(mut self, bound: f64) -> Self {
        self.exclusive_maximum = Some(bound);
        self
    }

    /// Minimum string length.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Maximum string length.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Regex constraint.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(Pattern::new(pattern));
        self
    }

    /// Minimum item count.
    #[must_use]
    pub fn min_items(mut self, count: usize) -> Self {
        self.min_items = Some(count);
        self
    }

    /// Maximum item count.
    #[must_use]
    pub fn max_items(mut self, count: usize) -> Self {
        self.max_items = Some(count);
        self
    }

    /// Restricts to the given values.
    #[must_use]
    pub fn one_of(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = values.into_iter().collect();
        self
    }

    /// Whether nothing is constrained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Copies the constraints onto a schema fragment.
    pub fn apply_to(&self, schema: &mut crate::Schema) {
        schema.minimum = self.minimum;
        schema.maximum = self.maximum;
        schema.exclusive_minimum = self.exclusive_minimum;
        schema.exclusive_maximum = self.exclusive_maximum;
        schema.min_length = self.min_length.map(|v| v as u64);
        schema.max_length = self.max_length.map(|v| v as u64);
        schema.pattern = self.pattern.as_ref().map(|p| p.as_str().to_string());
        schema.min_items = self.min_items.map(|v| v as u64);
        schema.max_items = self.max_items.map(|v| v as u64);
        schema.enum_values.clone_from(&self.enum_values);
    }
}

/// One declared field of a [`Model`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    alias: Option<String>,
    ty: TypeSpec,
    required: bool,
    default: Option<Value>,
    constraints: Constraints,
    description: Option<String>,
}

impl FieldSpec {
    /// A field that is required unless `ty` is optional.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self {
            name: name.into(),
            alias: None,
            required: !ty.is_optional(),
            ty,
            default: None,
            constraints: Constraints::default(),
            description: None,
        }
    }

    /// A field typed from a Rust type.
    #[must_use]
    pub fn of<T: Typed>(name: impl Into<String>) -> Self {
        Self::new(name, T::type_spec())
    }

    /// Sets the external (wire) name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets a default; the field becomes optional.
    #[must_use]
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }

    /// Marks the field optional without a default.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
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

    /// Declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias, if any.
    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Alias if present, otherwise the declared name.
    #[must_use]
    pub fn wire_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
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
}
