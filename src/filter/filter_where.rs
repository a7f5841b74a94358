use serde_json::Value;
use std::cmp::Ordering;

use super::error::FilterError;
use super::types::{BoundClause, BoundPredicate, Combinator, FilterClause, FilterOp};
use crate::database::record::Record;
use crate::database::schema::{compare_loose, FieldType, Schema};

static NULL: Value = Value::Null;

/// Builds and evaluates WHERE predicates against in-memory records.
pub struct FilterWhere;

impl FilterWhere {
    /// Checks that every clause names a declared field and carries the right
    /// number of values.
    pub fn validate(predicate: &BoundPredicate, schema: &Schema) -> Result<(), FilterError> {
        for bound in predicate.clauses() {
            schema.require_field(bound.field())?;
            if bound.values.len() != bound.clause.op.arity() {
                return Err(FilterError::InvalidOperatorData(format!(
                    "{:?} on '{}' needs {} value(s)",
                    bound.clause.op,
                    bound.field(),
                    bound.clause.op.arity()
                )));
            }
        }
        Ok(())
    }

    /// AND-chains are evaluated left to right; the first chain that holds
    /// short-circuits the OR.
    pub fn matches(predicate: &BoundPredicate, record: &Record, schema: &Schema) -> bool {
        if predicate.is_match_all() {
            return true;
        }
        predicate
            .chains()
            .into_iter()
            .any(|chain| chain.iter().all(|clause| Self::eval(clause, record, schema)))
    }

    fn eval(bound: &BoundClause, record: &Record, schema: &Schema) -> bool {
        let clause = &bound.clause;
        let actual = record.field_value(&clause.field);
        let field_type = schema.field_type(&clause.field);
        let ic = clause.ignore_case;
        let cmp = |expected: &Value| compare(field_type, &actual, expected, ic);
        let arg = |i: usize| bound.values.get(i).unwrap_or(&NULL);

        match clause.op {
            FilterOp::IsNull => actual.is_null(),
            FilterOp::IsNotNull => !actual.is_null(),
            FilterOp::True => *actual == Value::Bool(true),
            FilterOp::False => *actual == Value::Bool(false),
            FilterOp::Eq => {
                if arg(0).is_null() {
                    actual.is_null()
                } else {
                    cmp(arg(0)) == Some(Ordering::Equal)
                }
            }
            FilterOp::Ne => {
                if arg(0).is_null() {
                    !actual.is_null()
                } else {
                    matches!(cmp(arg(0)), Some(o) if o != Ordering::Equal)
                }
            }
            FilterOp::Gt => cmp(arg(0)) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(cmp(arg(0)), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => cmp(arg(0)) == Some(Ordering::Less),
            FilterOp::Lte => matches!(cmp(arg(0)), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::Between => {
                matches!(cmp(arg(0)), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(cmp(arg(1)), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOp::In => in_list(arg(0), |v| cmp(v) == Some(Ordering::Equal)),
            FilterOp::NotIn => {
                !actual.is_null() && !in_list(arg(0), |v| cmp(v) == Some(Ordering::Equal))
            }
            FilterOp::Containing => text_op(&actual, arg(0), ic, |a, b| a.contains(b)),
            FilterOp::StartingWith => text_op(&actual, arg(0), ic, |a, b| a.starts_with(b)),
            FilterOp::EndingWith => text_op(&actual, arg(0), ic, |a, b| a.ends_with(b)),
            FilterOp::Like => text_op(&actual, arg(0), ic, like),
        }
    }

    /// Parses the JSON where-language into a predicate:
    /// `{ "field": value }`, `{ "field": { "$gt": value } }`, `$and`, `$or`.
    /// Nested groups are distributed into OR-of-AND chains.
    pub fn parse(where_data: &Value, schema: &Schema, max_chains: usize) -> Result<BoundPredicate, FilterError> {
        if where_data.is_null() {
            return Ok(BoundPredicate::match_all());
        }
        let chains = Self::parse_node(where_data, max_chains)?;
        let unconditional = chains.iter().any(|chain| chain.is_empty());

        let mut predicate = BoundPredicate::match_all();
        for chain in chains {
            for (i, clause) in chain.into_iter().enumerate() {
                let combinator = if i == 0 { Combinator::Or } else { Combinator::And };
                predicate.push(combinator, clause);
            }
        }
        // Validate before an empty chain collapses everything to match-all
        Self::validate(&predicate, schema)?;

        if unconditional {
            return Ok(BoundPredicate::match_all());
        }
        Ok(predicate)
    }

    fn parse_node(node: &Value, max_chains: usize) -> Result<Vec<Vec<BoundClause>>, FilterError> {
        let obj = node
            .as_object()
            .ok_or_else(|| FilterError::InvalidWhereClause("WHERE must be an object".to_string()))?;

        let mut dnf: Vec<Vec<BoundClause>> = vec![vec![]];
        for (key, value) in obj {
            let rhs = match key.as_str() {
                "$and" => {
                    let mut acc = vec![vec![]];
                    for item in Self::group_items(key, value)? {
                        acc = Self::distribute(acc, Self::parse_node(item, max_chains)?, max_chains)?;
                    }
                    acc
                }
                "$or" => {
                    let mut acc = Vec::new();
                    for item in Self::group_items(key, value)? {
                        acc.extend(Self::parse_node(item, max_chains)?);
                    }
                    acc
                }
                op if op.starts_with('$') => {
                    return Err(FilterError::UnsupportedOperator(op.to_string()));
                }
                field => vec![Self::parse_field_condition(field, value)?],
            };
            dnf = Self::distribute(dnf, rhs, max_chains)?;
        }
        Ok(dnf)
    }

    fn group_items<'a>(op: &str, value: &'a Value) -> Result<&'a Vec<Value>, FilterError> {
        match value.as_array() {
            Some(items) if !items.is_empty() => Ok(items),
            _ => Err(FilterError::InvalidOperatorData(format!("{} requires a non-empty array", op))),
        }
    }

    fn distribute(
        left: Vec<Vec<BoundClause>>,
        right: Vec<Vec<BoundClause>>,
        max_chains: usize,
    ) -> Result<Vec<Vec<BoundClause>>, FilterError> {
        if left.len().saturating_mul(right.len()) > max_chains {
            return Err(FilterError::InvalidWhereClause(format!(
                "WHERE expands to more than {} alternatives",
                max_chains
            )));
        }
        let mut out = Vec::with_capacity(left.len() * right.len());
        for l in &left {
            for r in &right {
                let mut chain = l.clone();
                chain.extend(r.iter().cloned());
                out.push(chain);
            }
        }
        Ok(out)
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<BoundClause>, FilterError> {
        match value {
            Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
                let mut clauses = Vec::with_capacity(ops.len());
                for (op_key, op_val) in ops {
                    clauses.push(Self::map_operator(field, op_key, op_val)?);
                }
                Ok(clauses)
            }
            Value::Null => Ok(vec![BoundClause::new(FilterClause::new(field, FilterOp::IsNull), vec![])]),
            // Implicit equality: { field: value }
            other => Ok(vec![BoundClause::new(
                FilterClause::new(field, FilterOp::Eq),
                vec![other.clone()],
            )]),
        }
    }

    fn map_operator(field: &str, op_key: &str, data: &Value) -> Result<BoundClause, FilterError> {
        let (op, ignore_case) = match op_key {
            "$eq" => (FilterOp::Eq, false),
            "$ne" | "$neq" => (FilterOp::Ne, false),
            "$gt" => (FilterOp::Gt, false),
            "$gte" => (FilterOp::Gte, false),
            "$lt" => (FilterOp::Lt, false),
            "$lte" => (FilterOp::Lte, false),
            "$like" => (FilterOp::Like, false),
            "$ilike" => (FilterOp::Like, true),
            "$contains" => (FilterOp::Containing, false),
            "$icontains" => (FilterOp::Containing, true),
            "$startswith" => (FilterOp::StartingWith, false),
            "$endswith" => (FilterOp::EndingWith, false),
            "$in" => (FilterOp::In, false),
            "$nin" => (FilterOp::NotIn, false),
            "$between" => (FilterOp::Between, false),
            "$null" => {
                let op = match data.as_bool() {
                    Some(true) => FilterOp::IsNull,
                    Some(false) => FilterOp::IsNotNull,
                    None => {
                        return Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string()))
                    }
                };
                return Ok(BoundClause::new(FilterClause::new(field, op), vec![]));
            }
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        };

        let values = match op {
            FilterOp::Between => match data.as_array() {
                Some(pair) if pair.len() == 2 => pair.clone(),
                _ => {
                    return Err(FilterError::InvalidOperatorData(
                        "$between requires array with 2 values".to_string(),
                    ))
                }
            },
            FilterOp::In | FilterOp::NotIn if !data.is_array() => {
                return Err(FilterError::InvalidOperatorData(format!("{} requires an array", op_key)))
            }
            _ => vec![data.clone()],
        };

        let mut clause = FilterClause::new(field, op);
        clause.ignore_case = ignore_case;
        Ok(BoundClause::new(clause, values))
    }
}

fn compare(field_type: Option<FieldType>, a: &Value, b: &Value, ignore_case: bool) -> Option<Ordering> {
    match field_type {
        Some(t) => t.compare(a, b, ignore_case),
        None => compare_loose(a, b, ignore_case),
    }
}

fn in_list(list: &Value, mut eq: impl FnMut(&Value) -> bool) -> bool {
    match list {
        Value::Array(values) => values.iter().any(|v| eq(v)),
        single => eq(single),
    }
}

fn text_op(actual: &Value, pattern: &Value, ignore_case: bool, f: impl Fn(&str, &str) -> bool) -> bool {
    match (actual.as_str(), pattern.as_str()) {
        (Some(a), Some(p)) if ignore_case => f(&a.to_lowercase(), &p.to_lowercase()),
        (Some(a), Some(p)) => f(a, p),
        _ => false,
    }
}

/// SQL LIKE matching: `%` is any run of characters, `_` exactly one.
fn like(text: &str, pattern: &str) -> bool {
    let t: Vec<char> = text.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    let (mut ti, mut pi) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == t[ti]) {
            ti += 1;
            pi += 1;
        } else if pi < p.len() && p[pi] == '%' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '%' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::FieldDef;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new("students")
            .field(FieldDef::text("student_name"))
            .field(FieldDef::integer("marks"))
            .field(FieldDef::text("result"))
            .field(FieldDef::decimal("fee"))
            .field(FieldDef::boolean("active"))
    }

    fn student(name: &str, marks: i64, result: &str) -> Record {
        Record::from_json(json!({
            "student_name": name, "marks": marks, "result": result, "fee": "120.00", "active": true
        }))
        .unwrap()
    }

    fn clause(field: &str, op: FilterOp, values: Vec<Value>) -> BoundClause {
        BoundClause::new(FilterClause::new(field, op), values)
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // marks > 95 AND result = Pass OR student_name = Ram
        let p = BoundPredicate::new(clause("marks", FilterOp::Gt, vec![json!(95)]))
            .and(clause("result", FilterOp::Eq, vec![json!("Pass")]))
            .or(clause("student_name", FilterOp::Eq, vec![json!("Ram")]));
        let s = schema();
        assert!(FilterWhere::matches(&p, &student("Ram", 10, "Fail"), &s));
        assert!(!FilterWhere::matches(&p, &student("Rahul", 90, "Pass"), &s));
        assert!(FilterWhere::matches(&p, &student("Rahul", 99, "Pass"), &s));
    }

    #[test]
    fn containing_is_case_sensitive_unless_ignore_case() {
        let s = schema();
        let r = student("Rahul", 90, "Pass");
        let mut c = clause("student_name", FilterOp::Containing, vec![json!("rah")]);
        assert!(!FilterWhere::matches(&BoundPredicate::new(c.clone()), &r, &s));
        c.clause.ignore_case = true;
        assert!(FilterWhere::matches(&BoundPredicate::new(c), &r, &s));
    }

    #[test]
    fn between_in_and_null_handling() {
        let s = schema();
        let r = student("Ratan", 75, "Pass");
        let between = BoundPredicate::new(clause("marks", FilterOp::Between, vec![json!(70), json!(75)]));
        assert!(FilterWhere::matches(&between, &r, &s));
        let within = BoundPredicate::new(clause("result", FilterOp::In, vec![json!(["Fail", "Pass"])]));
        assert!(FilterWhere::matches(&within, &r, &s));
        let grade_null = BoundPredicate::new(clause("grade", FilterOp::IsNull, vec![]));
        assert!(FilterWhere::matches(&grade_null, &r, &s));
        let ne_missing = BoundPredicate::new(clause("grade", FilterOp::Ne, vec![json!("A")]));
        assert!(!FilterWhere::matches(&ne_missing, &r, &s));
    }

    #[test]
    fn decimal_fields_compare_numerically() {
        let s = schema();
        let p = BoundPredicate::new(clause("fee", FilterOp::Gte, vec![json!(99.5)]));
        assert!(FilterWhere::matches(&p, &student("Ram", 1, "Pass"), &s));
    }

    #[test]
    fn like_patterns() {
        assert!(like("Rakesh", "Ra%"));
        assert!(like("Rakesh", "%kes_"));
        assert!(!like("Rakesh", "Ra_"));
        assert!(like("", "%"));
    }

    #[test]
    fn parse_json_where_distributes_or() {
        let s = schema();
        let where_data = json!({
            "result": "Pass",
            "$or": [{ "student_name": "Ram" }, { "marks": { "$gte": 90 } }]
        });
        let p = FilterWhere::parse(&where_data, &s, 64).unwrap();
        assert_eq!(p.chains().len(), 2);
        assert!(FilterWhere::matches(&p, &student("Ram", 10, "Pass"), &s));
        assert!(FilterWhere::matches(&p, &student("Rahul", 90, "Pass"), &s));
        assert!(!FilterWhere::matches(&p, &student("Ram", 10, "Fail"), &s));
    }

    #[test]
    fn parse_rejects_unknown_fields_and_operators() {
        let s = schema();
        assert!(matches!(
            FilterWhere::parse(&json!({"nickname": "x"}), &s, 64),
            Err(FilterError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            FilterWhere::parse(&json!({"marks": {"$near": 1}}), &s, 64),
            Err(FilterError::UnsupportedOperator(op)) if op == "$near"
        ));
        assert!(matches!(
            FilterWhere::parse(&json!({"marks": {"$between": [1]}}), &s, 64),
            Err(FilterError::InvalidOperatorData(_))
        ));
    }

    #[test]
    fn parse_caps_expansion() {
        let s = schema();
        let where_data = json!({
            "$and": [
                { "$or": [{ "marks": 1 }, { "marks": 2 }, { "marks": 3 }] },
                { "$or": [{ "result": "a" }, { "result": "b" }, { "result": "c" }] }
            ]
        });
        assert!(FilterWhere::parse(&where_data, &s, 9).is_ok());
        assert!(matches!(
            FilterWhere::parse(&where_data, &s, 8),
            Err(FilterError::InvalidWhereClause(_))
        ));
    }

    #[test]
    fn empty_where_matches_everything() {
        let s = schema();
        let p = FilterWhere::parse(&json!({}), &s, 8).unwrap();
        assert!(p.is_match_all());

        let p = FilterWhere::parse(&json!({"$or": [{}, {"result": "Pass"}]}), &s, 8).unwrap();
        assert!(p.is_match_all());
    }

    #[test]
    fn empty_alternative_still_validates_its_siblings() {
        let s = schema();
        assert!(matches!(
            FilterWhere::parse(&json!({"$or": [{}, {"nickname": 1}]}), &s, 8),
            Err(FilterError::SchemaMismatch { ref field, .. }) if field == "nickname"
        ));
        assert!(matches!(
            FilterWhere::parse(&json!({"$or": [{}, {"marks": {"$between": [1]}}]}), &s, 8),
            Err(FilterError::InvalidOperatorData(_))
        ));
    }
}
