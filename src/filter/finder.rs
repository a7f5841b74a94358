//! Derived finders.
//!
//! A finder is declared once, either from a conventional name such as
//! `findByStudentNameAndResult` or through the builder
//! (`Finder::by("student_name").and("result")`). Declaration resolves every
//! field against the collection schema, so a finder that reaches a repository
//! is already known to be well formed; calling it only binds arguments.

use serde::Serialize;
use serde_json::Value;

use super::error::FilterError;
use super::types::{
    BoundClause, BoundPredicate, Combinator, FilterClause, FilterOp, FilterPredicate, SortDirection,
    SortOrder, SortSpec,
};
use crate::database::schema::Schema;

/// What a finder returns when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinderKind {
    Find,
    Count,
    Exists,
}

const VERBS: &[(&str, FinderKind)] = &[
    ("find", FinderKind::Find),
    ("get", FinderKind::Find),
    ("read", FinderKind::Find),
    ("query", FinderKind::Find),
    ("search", FinderKind::Find),
    ("count", FinderKind::Count),
    ("exists", FinderKind::Exists),
];

/// Operator keywords, longest first so that `GreaterThanEqual` wins over
/// `GreaterThan` and `NotIn` over `In`.
const OPERATORS: &[(&str, FilterOp)] = &[
    ("GreaterThanEqual", FilterOp::Gte),
    ("LessThanEqual", FilterOp::Lte),
    ("StartingWith", FilterOp::StartingWith),
    ("GreaterThan", FilterOp::Gt),
    ("EndingWith", FilterOp::EndingWith),
    ("Containing", FilterOp::Containing),
    ("IsNotNull", FilterOp::IsNotNull),
    ("StartsWith", FilterOp::StartingWith),
    ("LessThan", FilterOp::Lt),
    ("EndsWith", FilterOp::EndingWith),
    ("Contains", FilterOp::Containing),
    ("NotNull", FilterOp::IsNotNull),
    ("Between", FilterOp::Between),
    ("IsNull", FilterOp::IsNull),
    ("Equals", FilterOp::Eq),
    ("Before", FilterOp::Lt),
    ("After", FilterOp::Gt),
    ("NotIn", FilterOp::NotIn),
    ("False", FilterOp::False),
    ("Null", FilterOp::IsNull),
    ("Like", FilterOp::Like),
    ("True", FilterOp::True),
    ("Not", FilterOp::Ne),
    ("In", FilterOp::In),
    ("Is", FilterOp::Eq),
];

/// A declared query: predicate shape, optional ordering and row limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finder {
    name: Option<String>,
    kind: FinderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    predicate: FilterPredicate,
    order: SortSpec,
}

impl Finder {
    /// Starts a builder with an equality clause on `field`.
    pub fn by(field: impl Into<String>) -> Self {
        Self::by_op(field, FilterOp::Eq)
    }

    pub fn by_op(field: impl Into<String>, op: FilterOp) -> Self {
        Self {
            name: None,
            kind: FinderKind::Find,
            limit: None,
            predicate: FilterPredicate::new(FilterClause::new(field, op)),
            order: SortSpec::unsorted(),
        }
    }

    pub fn and(self, field: impl Into<String>) -> Self {
        self.and_op(field, FilterOp::Eq)
    }

    pub fn or(self, field: impl Into<String>) -> Self {
        self.or_op(field, FilterOp::Eq)
    }

    pub fn and_op(mut self, field: impl Into<String>, op: FilterOp) -> Self {
        self.predicate.push(Combinator::And, FilterClause::new(field, op));
        self
    }

    pub fn or_op(mut self, field: impl Into<String>, op: FilterOp) -> Self {
        self.predicate.push(Combinator::Or, FilterClause::new(field, op));
        self
    }

    /// Makes the most recently added clause case-insensitive.
    pub fn ignore_case(mut self) -> Self {
        if let Some(clause) = self.predicate.last_mut() {
            clause.ignore_case = true;
        }
        self
    }

    pub fn order_by(mut self, order: SortSpec) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn kind(mut self, kind: FinderKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Resolves a builder-declared finder against the schema.
    pub fn validate(&self, schema: &Schema) -> Result<(), FilterError> {
        for clause in self.predicate.clauses() {
            schema.require_field(&clause.field)?;
        }
        for order in self.order.orders() {
            schema.require_field(&order.field)?;
        }
        Ok(())
    }

    /// Declares a finder from its conventional name.
    pub fn parse(name: &str, schema: &Schema) -> Result<Self, FilterError> {
        let (kind, rest) = VERBS
            .iter()
            .find_map(|(verb, kind)| {
                let rest = name.strip_prefix(verb)?;
                rest.starts_with(|c: char| c.is_ascii_uppercase()).then_some((*kind, rest))
            })
            .ok_or_else(|| FilterError::InvalidFinder(format!("{}: unknown query verb", name)))?;

        let by = find_keyword(rest, "By", 0)
            .ok_or_else(|| FilterError::InvalidFinder(format!("{}: missing 'By'", name)))?;
        let limit = parse_subject(&rest[..by], name)?;
        let body = &rest[by + 2..];

        let (criteria, order_part) = match find_keyword(body, "OrderBy", 1) {
            Some(pos) => (&body[..pos], Some(&body[pos + 7..])),
            None => (body, None),
        };
        if criteria.is_empty() {
            return Err(FilterError::InvalidFinder(format!("{}: no criteria after 'By'", name)));
        }

        let (criteria, all_ignore_case) = match criteria.strip_suffix("AllIgnoreCase") {
            Some(stripped) => (stripped, true),
            None => match criteria.strip_suffix("AllIgnoringCase") {
                Some(stripped) => (stripped, true),
                None => (criteria, false),
            },
        };

        let mut predicate = FilterPredicate::default();
        for (combinator, token) in split_combinators(criteria) {
            if token.is_empty() {
                return Err(FilterError::InvalidFinder(format!("{}: empty criterion", name)));
            }
            let mut clause = parse_clause(token, schema)?;
            clause.ignore_case |= all_ignore_case;
            predicate.push(combinator, clause);
        }

        let order = match order_part {
            Some(part) => parse_order_by(part, schema, name)?,
            None => SortSpec::unsorted(),
        };

        Ok(Self { name: Some(name.to_string()), kind, limit, predicate, order })
    }

    /// Name the finder is registered under. Builder finders without an explicit
    /// name get the conventional name of their structure.
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.canonical_name())
    }

    pub fn canonical_name(&self) -> String {
        let verb = match self.kind {
            FinderKind::Find => "find",
            FinderKind::Count => "count",
            FinderKind::Exists => "exists",
        };
        let mut out = String::from(verb);
        match self.limit {
            Some(1) => out.push_str("First"),
            Some(n) => out.push_str(&format!("Top{}", n)),
            None => {}
        }
        out.push_str("By");
        for (i, clause) in self.predicate.clauses().iter().enumerate() {
            if i > 0 {
                out.push_str(self.predicate.combinators()[i - 1].keyword());
            }
            out.push_str(&snake_to_pascal(&clause.field));
            out.push_str(clause.op.keyword());
            if clause.ignore_case {
                out.push_str("IgnoreCase");
            }
        }
        if !self.order.is_empty() {
            out.push_str("OrderBy");
            for order in self.order.orders() {
                out.push_str(&snake_to_pascal(&order.field));
                out.push_str(order.direction.keyword());
            }
        }
        out
    }

    pub fn finder_kind(&self) -> FinderKind {
        self.kind
    }

    pub fn predicate(&self) -> &FilterPredicate {
        &self.predicate
    }

    pub fn order(&self) -> &SortSpec {
        &self.order
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    pub fn arity(&self) -> usize {
        self.predicate.arity()
    }

    /// Binds call arguments to clauses positionally, in declaration order.
    pub fn bind(&self, args: Vec<Value>) -> Result<BoundPredicate, FilterError> {
        let expected = self.arity();
        if args.len() != expected {
            return Err(FilterError::ArgumentCountMismatch {
                finder: self.name(),
                expected,
                actual: args.len(),
            });
        }

        let mut args = args.into_iter();
        let mut bound = BoundPredicate::match_all();
        for (i, clause) in self.predicate.clauses().iter().enumerate() {
            let values: Vec<Value> = args.by_ref().take(clause.op.arity()).collect();
            let combinator = if i == 0 { Combinator::And } else { self.predicate.combinators()[i - 1] };
            bound.push(combinator, BoundClause::new(clause.clone(), values));
        }
        Ok(bound)
    }
}

/// Finds `keyword` where it starts a PascalCase word and is followed by another.
fn find_keyword(s: &str, keyword: &str, min_pos: usize) -> Option<usize> {
    let mut from = min_pos;
    while let Some(offset) = s.get(from..)?.find(keyword) {
        let pos = from + offset;
        let after = &s[pos + keyword.len()..];
        let boundary_before = pos == 0 || s[..pos].ends_with(|c: char| !c.is_ascii_uppercase());
        let boundary_after = after.starts_with(|c: char| c.is_ascii_uppercase());
        if boundary_before && boundary_after {
            return Some(pos);
        }
        from = pos + 1;
    }
    None
}

/// Subject between the verb and `By`: `All`, `Distinct`, an entity name,
/// `First`/`Top` with an optional count.
fn parse_subject(subject: &str, name: &str) -> Result<Option<usize>, FilterError> {
    let subject = subject.strip_prefix("Distinct").unwrap_or(subject);
    for prefix in ["First", "Top"] {
        if let Some(rest) = subject.strip_prefix(prefix) {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                return Ok(Some(1));
            }
            let n: usize = digits
                .parse()
                .map_err(|_| FilterError::InvalidFinder(format!("{}: bad limit '{}'", name, digits)))?;
            if n == 0 {
                return Err(FilterError::InvalidFinder(format!("{}: limit must be positive", name)));
            }
            return Ok(Some(n));
        }
    }
    Ok(None)
}

/// Splits criteria on `And`/`Or` where the keyword closes one PascalCase word
/// run and the next word starts with an upper-case letter.
fn split_combinators(criteria: &str) -> Vec<(Combinator, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut pending = Combinator::And;
    let mut i = 1;
    while i < criteria.len() {
        let found = [("And", Combinator::And), ("Or", Combinator::Or)]
            .into_iter()
            .find(|(kw, _)| {
                criteria.get(i..).is_some_and(|s| s.starts_with(kw)) && is_split_point(criteria, i, kw.len())
            });
        match found {
            Some((kw, combinator)) => {
                out.push((pending, &criteria[start..i]));
                pending = combinator;
                start = i + kw.len();
                i = start + 1;
            }
            None => i += 1,
        }
    }
    out.push((pending, &criteria[start..]));
    out
}

fn is_split_point(s: &str, pos: usize, len: usize) -> bool {
    if !s.is_char_boundary(pos) || pos + len > s.len() {
        return false;
    }
    let before_ok = s[..pos].ends_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit());
    let after_ok = s[pos + len..].starts_with(|c: char| c.is_ascii_uppercase());
    before_ok && after_ok
}

fn parse_clause(token: &str, schema: &Schema) -> Result<FilterClause, FilterError> {
    let (token, ignore_case) = match token
        .strip_suffix("IgnoreCase")
        .or_else(|| token.strip_suffix("IgnoringCase"))
    {
        Some(stripped) => (stripped, true),
        None => (token, false),
    };

    let with_case = |field: String, op: FilterOp| FilterClause { field, op, ignore_case };

    if let Some(field) = resolve_field(token, schema) {
        return Ok(with_case(field, FilterOp::Eq));
    }

    for (keyword, op) in OPERATORS {
        if let Some(prefix) = token.strip_suffix(keyword) {
            if let Some(field) = resolve_field(prefix, schema) {
                return Ok(with_case(field, *op));
            }
            // `MarksIsGreaterThan`, `NameIsNot`
            if let Some(field) = prefix.strip_suffix("Is").and_then(|p| resolve_field(p, schema)) {
                return Ok(with_case(field, *op));
            }
        }
    }

    // A known field followed by an unknown keyword is an operator problem,
    // anything else is an unknown field.
    for (pos, c) in token.char_indices().skip(1) {
        if c.is_ascii_uppercase() && resolve_field(&token[..pos], schema).is_some() {
            return Err(FilterError::UnsupportedOperator(token[pos..].to_string()));
        }
    }
    Err(FilterError::SchemaMismatch {
        collection: schema.name().to_string(),
        field: pascal_to_snake(token),
    })
}

fn resolve_field(pascal: &str, schema: &Schema) -> Option<String> {
    if pascal.is_empty() {
        return None;
    }
    let snake = pascal_to_snake(pascal);
    schema.has_field(&snake).then_some(snake)
}

fn parse_order_by(part: &str, schema: &Schema, name: &str) -> Result<SortSpec, FilterError> {
    if part.is_empty() {
        return Err(FilterError::InvalidFinder(format!("{}: empty OrderBy", name)));
    }
    let mut spec = SortSpec::unsorted();
    let mut rest = part;
    while !rest.is_empty() {
        let next = [("Desc", SortDirection::Desc), ("Asc", SortDirection::Asc)]
            .into_iter()
            .filter_map(|(kw, dir)| {
                let pos = find_direction(rest, kw)?;
                Some((pos, kw.len(), dir))
            })
            .min_by_key(|(pos, _, _)| *pos);

        let (property, direction, consumed) = match next {
            Some((pos, len, dir)) => (&rest[..pos], dir, pos + len),
            None => (rest, SortDirection::Asc, rest.len()),
        };
        let field = resolve_field(property, schema).ok_or_else(|| FilterError::SchemaMismatch {
            collection: schema.name().to_string(),
            field: pascal_to_snake(property),
        })?;
        spec.push(SortOrder { field, direction });
        rest = &rest[consumed..];
    }
    Ok(spec)
}

/// Direction keyword ending a property: followed by the end of input or a new word.
fn find_direction(s: &str, kw: &str) -> Option<usize> {
    let mut from = 1;
    while let Some(offset) = s.get(from..)?.find(kw) {
        let pos = from + offset;
        let after = &s[pos + kw.len()..];
        if after.is_empty() || after.starts_with(|c: char| c.is_ascii_uppercase()) {
            return Some(pos);
        }
        from = pos + 1;
    }
    None
}

pub fn pascal_to_snake(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub fn snake_to_pascal(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
