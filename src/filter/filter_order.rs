use serde_json::Value;
use std::cmp::Ordering;

use super::error::FilterError;
use super::types::{SortDirection, SortOrder, SortSpec};
use crate::database::record::Record;
use crate::database::schema::{compare_loose, Schema};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<SortSpec, FilterError> {
        match order {
            Value::Null => Ok(SortSpec::unsorted()),
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // Expect array of strings like ["marks desc", "student_name asc"]
                let mut out = SortSpec::unsorted();
                for v in arr {
                    let s = v
                        .as_str()
                        .ok_or_else(|| FilterError::InvalidOrder(format!("expected string, got {}", v)))?;
                    out.orders_mut().extend(Self::parse_order_string(s)?.orders().iter().cloned());
                }
                Ok(out)
            }
            Value::Object(obj) => {
                // { "marks": "desc", "student_name": "asc" }
                let mut out = SortSpec::unsorted();
                for (k, v) in obj {
                    let direction = Self::direction(v.as_str().unwrap_or("asc"))
                        .ok_or_else(|| FilterError::InvalidOrder(format!("bad direction for {}: {}", k, v)))?;
                    out.push(SortOrder { field: k.clone(), direction });
                }
                Ok(out)
            }
            other => Err(FilterError::InvalidOrder(format!("unsupported order format: {}", other))),
        }
    }

    /// Accepts `"marks desc, student_name"` as well as `"marks,desc"`.
    pub fn parse_order_string(s: &str) -> Result<SortSpec, FilterError> {
        let mut out = SortSpec::unsorted();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            // A bare direction applies to the preceding field
            if let Some(direction) = Self::direction(trimmed) {
                match out.orders_mut().last_mut() {
                    Some(last) => last.direction = direction,
                    None => return Err(FilterError::InvalidOrder(format!("direction '{}' without field", trimmed))),
                }
                continue;
            }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let direction = match it.next() {
                    Some(dir) => Self::direction(dir)
                        .ok_or_else(|| FilterError::InvalidOrder(format!("unknown direction '{}'", dir)))?,
                    None => SortDirection::Asc,
                };
                out.push(SortOrder { field: col.to_string(), direction });
            }
        }
        Ok(out)
    }

    fn direction(s: &str) -> Option<SortDirection> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn validate(spec: &SortSpec, schema: &Schema) -> Result<(), FilterError> {
        for order in spec.orders() {
            schema.require_field(&order.field)?;
        }
        Ok(())
    }

    /// Stable sort; ties keep their original relative order. Nulls sort last
    /// ascending and first descending.
    pub fn sort(records: &mut [Record], spec: &SortSpec, schema: &Schema) {
        if spec.is_empty() {
            return;
        }
        records.sort_by(|a, b| Self::compare(a, b, spec, schema));
    }

    pub fn compare(a: &Record, b: &Record, spec: &SortSpec, schema: &Schema) -> Ordering {
        for order in spec.orders() {
            let x = a.field_value(&order.field);
            let y = b.field_value(&order.field);
            let ordering = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => match schema.field_type(&order.field) {
                    Some(t) => t.compare(&x, &y, false),
                    None => compare_loose(&x, &y, false),
                }
                .unwrap_or(Ordering::Equal),
            };
            let ordering = match order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
