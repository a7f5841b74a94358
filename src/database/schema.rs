use chrono::DateTime;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::database::error::RepositoryError;
use crate::database::record::{Record, ID_FIELD};
use crate::filter::error::FilterError;

/// Storage type of a field; drives validation and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Decimal,
    Text,
    Boolean,
    Timestamp,
}

impl FieldType {
    /// Whether a non-null value is acceptable for this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Integer => value.as_i64().is_some(),
            FieldType::Decimal => to_decimal(value).is_some(),
            FieldType::Text => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Timestamp => value
                .as_str()
                .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false),
        }
    }

    /// Typed comparison. Nulls and mismatched values do not compare.
    pub fn compare(&self, a: &Value, b: &Value, ignore_case: bool) -> Option<Ordering> {
        if a.is_null() || b.is_null() {
            return None;
        }
        match self {
            FieldType::Integer => match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => compare_loose(a, b, ignore_case),
            },
            FieldType::Decimal => match (to_decimal(a), to_decimal(b)) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => None,
            },
            FieldType::Text => compare_text(a.as_str()?, b.as_str()?, ignore_case),
            FieldType::Boolean => Some(a.as_bool()?.cmp(&b.as_bool()?)),
            FieldType::Timestamp => {
                let (x, y) = (a.as_str()?, b.as_str()?);
                match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                    (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                    _ => Some(x.cmp(y)),
                }
            }
        }
    }
}

fn compare_text(a: &str, b: &str, ignore_case: bool) -> Option<Ordering> {
    if ignore_case {
        Some(a.to_lowercase().cmp(&b.to_lowercase()))
    } else {
        Some(a.cmp(b))
    }
}

/// Comparison for values whose field type is unknown.
pub fn compare_loose(a: &Value, b: &Value, ignore_case: bool) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => compare_text(x, y, ignore_case),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Reads a decimal from a JSON number or numeric string.
pub fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                Decimal::from_str(&n.to_string())
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            }
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Field-level validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Required,
    NotBlank,
    Size { min: usize, max: usize },
    Email,
    Min(i64),
    Max(i64),
    Unique,
}

impl Constraint {
    /// Returns the violation message, if the value breaks the rule.
    fn check(&self, value: &Value) -> Option<String> {
        match self {
            Constraint::Required => value.is_null().then(|| "must not be null".to_string()),
            Constraint::NotBlank => match value {
                Value::Null => Some("must not be blank".to_string()),
                Value::String(s) if s.trim().is_empty() => Some("must not be blank".to_string()),
                _ => None,
            },
            Constraint::Size { min, max } => {
                let len = value.as_str()?.chars().count();
                (len < *min || len > *max)
                    .then(|| format!("size must be between {} and {}", min, max))
            }
            Constraint::Email => {
                let s = value.as_str()?;
                (!is_email(s)).then(|| "must be a well-formed email address".to_string())
            }
            Constraint::Min(min) => {
                let n = to_decimal(value)?;
                (n < Decimal::from(*min)).then(|| format!("must be greater than or equal to {}", min))
            }
            Constraint::Max(max) => {
                let n = to_decimal(value)?;
                (n > Decimal::from(*max)).then(|| format!("must be less than or equal to {}", max))
            }
            Constraint::Unique => None,
        }
    }
}

fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.splitn(2, '@');
    let (local, domain) = match (parts.next(), parts.next()) {
        (Some(l), Some(d)) => (l, d),
        _ => return false,
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub constraints: Vec<Constraint>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type, constraints: vec![] }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Decimal)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn required(self) -> Self {
        self.with(Constraint::Required)
    }

    pub fn not_blank(self) -> Self {
        self.with(Constraint::NotBlank)
    }

    pub fn size(self, min: usize, max: usize) -> Self {
        self.with(Constraint::Size { min, max })
    }

    pub fn email(self) -> Self {
        self.with(Constraint::Email)
    }

    pub fn min(self, min: i64) -> Self {
        self.with(Constraint::Min(min))
    }

    pub fn max(self, max: i64) -> Self {
        self.with(Constraint::Max(max))
    }

    pub fn unique(self) -> Self {
        self.with(Constraint::Unique)
    }

    pub fn is_unique(&self) -> bool {
        self.constraints.contains(&Constraint::Unique)
    }
}

/// Field layout of one collection. The identity field is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: vec![] }
    }

    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        name == ID_FIELD || self.get(name).is_some()
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        if name == ID_FIELD {
            return Some(FieldType::Integer);
        }
        self.get(name).map(|f| f.field_type)
    }

    /// Fails with SchemaMismatch when the field is not declared.
    pub fn require_field(&self, name: &str) -> Result<FieldType, FilterError> {
        self.field_type(name).ok_or_else(|| FilterError::SchemaMismatch {
            collection: self.name.clone(),
            field: name.to_string(),
        })
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_unique())
    }

    /// Checks every field of the record and reports all violations at once.
    pub fn validate(&self, record: &Record) -> Result<(), RepositoryError> {
        let mut field_errors = BTreeMap::new();

        for key in record.fields().keys() {
            if self.get(key).is_none() {
                field_errors.insert(key.clone(), "unknown field".to_string());
            }
        }

        for def in &self.fields {
            let value = record.field_value(&def.name);
            if !value.is_null() && !def.field_type.accepts(&value) {
                field_errors.insert(
                    def.name.clone(),
                    format!("expected {:?} value", def.field_type).to_lowercase(),
                );
                continue;
            }
            if let Some(message) = def.constraints.iter().find_map(|c| c.check(&value)) {
                field_errors.insert(def.name.clone(), message);
            }
        }

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(RepositoryError::Validation { collection: self.name.clone(), field_errors })
        }
    }
}
