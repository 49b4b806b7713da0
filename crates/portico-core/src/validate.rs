//! Validation and coercion of JSON values against [`TypeSpec`]s.
//!
//! The validator walks the declared type and the value side by side,
//! accumulating every failure instead of stopping at the first. The output
//! value is normalized: model objects are keyed by declared field names,
//! defaults are filled in, and unknown keys are dropped.

use crate::cache::SchemaCache;
use crate::error::{PathSegment, ValidationFailure};
use crate::model::{Constraints, ModelRef, TypeSpec};
use serde_json::{Map, Number, Value};

/// How strictly primitives are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coercion {
    /// JSON bodies: numbers must be numbers, booleans must be booleans.
    #[default]
    Strict,
    /// String-sourced values (path, query, header, cookie): numeric and
    /// boolean text is converted.
    Lax,
}

/// Parses the boolean spellings accepted from string sources.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// Whole floats outside this range cannot be cast to `i64` without saturating.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn parse_integer(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .map(Value::from)
        .or_else(|_| raw.parse::<u64>().map(Value::from))
        .ok()
}

fn parse_number(raw: &str) -> Option<Value> {
    parse_integer(raw).or_else(|| {
        raw.trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    })
}

/// Validator bound to a [`SchemaCache`] and a coercion mode.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    cache: &'a SchemaCache,
    mode: Coercion,
}

impl<'a> Validator<'a> {
    /// Creates a validator.
    #[must_use]
    pub fn new(cache: &'a SchemaCache, mode: Coercion) -> Self {
        Self { cache, mode }
    }

    /// Validates `value`; failure paths are relative to `value`.
    pub fn validate(
        &self,
        ty: &TypeSpec,
        constraints: Option<&Constraints>,
        value: &Value,
    ) -> Result<Value, Vec<ValidationFailure>> {
        self.validate_at(ty, constraints, value, Vec::new())
    }

    /// Validates `value`; failure paths start with `base`.
    pub fn validate_at(
        &self,
        ty: &TypeSpec,
        constraints: Option<&Constraints>,
        value: &Value,
        base: Vec<PathSegment>,
    ) -> Result<Value, Vec<ValidationFailure>> {
        let mut path = base;
        let mut errors = Vec::new();
        match self.check(ty, constraints, value, &mut path, &mut errors) {
            Some(out) if errors.is_empty() => Ok(out),
            _ => {
                if errors.is_empty() {
                    errors.push(ValidationFailure::type_error(path, format!("value is not a valid {ty}")));
                }
                Err(errors)
            }
        }
    }

    fn check(
        &self,
        ty: &TypeSpec,
        constraints: Option<&Constraints>,
        value: &Value,
        path: &mut Vec<PathSegment>,
        errors: &mut Vec<ValidationFailure>,
    ) -> Option<Value> {
        let out = match ty {
            TypeSpec::Optional(inner) => {
                if value.is_null() {
                    return Some(Value::Null);
                }
                return self.check(inner, constraints, value, path, errors);
            }
            TypeSpec::Any | TypeSpec::File => Some(value.clone()),
            TypeSpec::Boolean => self.primitive(self.boolean(value), "boolean", path, errors),
            TypeSpec::Integer => self.primitive(self.integer(value), "integer", path, errors),
            TypeSpec::Number => self.primitive(self.number(value), "number", path, errors),
            TypeSpec::String => {
                let coerced = value.is_string().then(|| value.clone());
                self.primitive(coerced, "string", path, errors)
            }
            TypeSpec::Array(inner) => self.array(inner, value, path, errors),
            TypeSpec::Model(model) => self.model(model, value, path, errors),
        }?;

        match constraints {
            Some(constraints) if !self.constrain(constraints, &out, path, errors) => None,
            _ => Some(out),
        }
    }

    fn primitive(
        &self,
        coerced: Option<Value>,
        expected: &str,
        path: &[PathSegment],
        errors: &mut Vec<ValidationFailure>,
    ) -> Option<Value> {
        if coerced.is_none() {
            errors.push(ValidationFailure::type_error(
                path.to_vec(),
                format!("value is not a valid {expected}"),
            ));
        }
        coerced
    }

    fn boolean(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(raw) if self.mode == Coercion::Lax => parse_bool(raw).map(Value::Bool),
            _ => None,
        }
    }

    fn integer(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
            Value::Number(n) => n
                .as_f64()
                .filter(|f| f.is_finite() && f.fract().abs() < f64::EPSILON)
                .filter(|f| (I64_LOWER..I64_UPPER).contains(f))
                .map(|f| Value::from(f as i64)),
            Value::String(raw) if self.mode == Coercion::Lax => parse_integer(raw),
            _ => None,
        }
    }

    fn number(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Number(_) => Some(value.clone()),
            Value::String(raw) if self.mode == Coercion::Lax => parse_number(raw),
            _ => None,
        }
    }

    fn array(
        &self,
        inner: &TypeSpec,
        value: &Value,
        path: &mut Vec<PathSegment>,
        errors: &mut Vec<ValidationFailure>,
    ) -> Option<Value> {
        let Value::Array(items) = value else {
            errors.push(ValidationFailure::type_error(
                path.clone(),
                "value is not a valid list",
            ));
            return None;
        };

        let mut out = Vec::with_capacity(items.len());
        let mut valid = true;
        for (index, item) in items.iter().enumerate() {
            path.push(PathSegment::Index(index));
            match self.check(inner, None, item, path, errors) {
                Some(v) => out.push(v),
                None => valid = false,
            }
            path.pop();
        }
        valid.then_some(Value::Array(out))
    }

    fn model(
        &self,
        model: &ModelRef,
        value: &Value,
        path: &mut Vec<PathSegment>,
        errors: &mut Vec<ValidationFailure>,
    ) -> Option<Value> {
        let Value::Object(input) = value else {
            errors.push(ValidationFailure::type_error(
                path.clone(),
                "value is not a valid object",
            ));
            return None;
        };

        let info = self.cache.describe(model);
        let mut out = Map::new();
        let mut valid = true;
        for field in info.fields() {
            let raw = field
                .alias_name()
                .and_then(|alias| input.get(alias))
                .or_else(|| input.get(field.name()));

            path.push(PathSegment::Key(field.wire_name().to_string()));
            match raw {
                Some(raw) => {
                    match self.check(field.ty(), Some(field.constraint_set()), raw, path, errors) {
                        Some(v) => {
                            out.insert(field.name().to_string(), v);
                        }
                        None => valid = false,
                    }
                }
                None => {
                    if let Some(default) = field.default_value() {
                        out.insert(field.name().to_string(), default.clone());
                    } else if field.is_required() {
                        errors.push(ValidationFailure::missing(path.clone()));
                        valid = false;
                    } else {
                        out.insert(field.name().to_string(), Value::Null);
                    }
                }
            }
            path.pop();
        }
        valid.then_some(Value::Object(out))
    }

    fn constrain(
        &self,
        constraints: &Constraints,
        value: &Value,
        path: &[PathSegment],
        errors: &mut Vec<ValidationFailure>,
    ) -> bool {
        let before = errors.len();
        let mut fail = |message: String| {
            errors.push(ValidationFailure::value_error(path.to_vec(), message));
        };

        match value {
            Value::Number(n) => {
                let x = n.as_f64().unwrap_or_default();
                if let Some(min) = constraints.minimum.filter(|min| x < *min) {
                    fail(format!("ensure this value is greater than or equal to {min}"));
                }
                if let Some(max) = constraints.maximum.filter(|max| x > *max) {
                    fail(format!("ensure this value is less than or equal to {max}"));
                }
                if let Some(min) = constraints.exclusive_minimum.filter(|min| x <= *min) {
                    fail(format!("ensure this value is greater than {min}"));
                }
                if let Some(max) = constraints.exclusive_maximum.filter(|max| x >= *max) {
                    fail(format!("ensure this value is less than {max}"));
                }
            }
            Value::String(s) => {
                let len = s.chars().count();
                if let Some(min) = constraints.min_length.filter(|min| len < *min) {
                    fail(format!("ensure this value has at least {min} characters"));
                }
                if let Some(max) = constraints.max_length.filter(|max| len > *max) {
                    fail(format!("ensure this value has at most {max} characters"));
                }
                if let Some(pattern) = &constraints.pattern {
                    match pattern.regex() {
                        Ok(re) if re.is_match(s) => {}
                        Ok(_) => fail(format!(
                            "string does not match pattern '{}'",
                            pattern.as_str()
                        )),
                        Err(reason) => fail(format!(
                            "pattern '{}' is invalid: {reason}",
                            pattern.as_str()
                        )),
                    }
                }
            }
            Value::Array(items) => {
                if let Some(min) = constraints.min_items.filter(|min| items.len() < *min) {
                    fail(format!("ensure this list has at least {min} items"));
                }
                if let Some(max) = constraints.max_items.filter(|max| items.len() > *max) {
                    fail(format!("ensure this list has at most {max} items"));
                }
            }
            _ => {}
        }

        if !constraints.enum_values.is_empty() && !constraints.enum_values.contains(value) {
            let permitted: Vec<String> = constraints
                .enum_values
                .iter()
                .map(ToString::to_string)
                .collect();
            fail(format!(
                "value is not one of the permitted values: {}",
                permitted.join(", ")
            ));
        }

        errors.len() == before
    }
}
