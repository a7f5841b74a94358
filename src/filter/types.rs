use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison applied by a single predicate clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Containing,
    StartingWith,
    EndingWith,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
    True,
    False,
}

impl FilterOp {
    /// Number of call arguments the operator consumes.
    pub fn arity(&self) -> usize {
        match self {
            FilterOp::IsNull | FilterOp::IsNotNull | FilterOp::True | FilterOp::False => 0,
            FilterOp::Between => 2,
            _ => 1,
        }
    }

    /// Keyword used when the operator appears in a finder name.
    pub fn keyword(&self) -> &'static str {
        match self {
            FilterOp::Eq => "",
            FilterOp::Ne => "Not",
            FilterOp::Gt => "GreaterThan",
            FilterOp::Gte => "GreaterThanEqual",
            FilterOp::Lt => "LessThan",
            FilterOp::Lte => "LessThanEqual",
            FilterOp::Like => "Like",
            FilterOp::Containing => "Containing",
            FilterOp::StartingWith => "StartingWith",
            FilterOp::EndingWith => "EndingWith",
            FilterOp::In => "In",
            FilterOp::NotIn => "NotIn",
            FilterOp::Between => "Between",
            FilterOp::IsNull => "IsNull",
            FilterOp::IsNotNull => "IsNotNull",
            FilterOp::True => "True",
            FilterOp::False => "False",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn keyword(&self) -> &'static str {
        match self {
            Combinator::And => "And",
            Combinator::Or => "Or",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub ignore_case: bool,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self { field: field.into(), op, ignore_case: false }
    }
}

/// Ordered clauses joined by combinators. `And` binds tighter than `Or`, so
/// `a And b Or c` reads as `(a AND b) OR c`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterPredicate {
    clauses: Vec<FilterClause>,
    combinators: Vec<Combinator>,
}

impl FilterPredicate {
    pub fn new(first: FilterClause) -> Self {
        Self { clauses: vec![first], combinators: vec![] }
    }

    pub fn push(&mut self, combinator: Combinator, clause: FilterClause) {
        if self.clauses.is_empty() {
            self.clauses.push(clause);
        } else {
            self.combinators.push(combinator);
            self.clauses.push(clause);
        }
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    pub fn last_mut(&mut self) -> Option<&mut FilterClause> {
        self.clauses.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Total number of call arguments the predicate needs.
    pub fn arity(&self) -> usize {
        self.clauses.iter().map(|c| c.op.arity()).sum()
    }
}

/// A clause with its call arguments attached.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundClause {
    pub clause: FilterClause,
    pub values: Vec<Value>,
}

impl BoundClause {
    pub fn new(clause: FilterClause, values: Vec<Value>) -> Self {
        Self { clause, values }
    }

    pub fn field(&self) -> &str {
        &self.clause.field
    }
}

/// A predicate ready for evaluation. An empty predicate matches every record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundPredicate {
    clauses: Vec<BoundClause>,
    combinators: Vec<Combinator>,
}

impl BoundPredicate {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn new(first: BoundClause) -> Self {
        Self { clauses: vec![first], combinators: vec![] }
    }

    pub fn push(&mut self, combinator: Combinator, clause: BoundClause) {
        if !self.clauses.is_empty() {
            self.combinators.push(combinator);
        }
        self.clauses.push(clause);
    }

    pub fn and(mut self, clause: BoundClause) -> Self {
        self.push(Combinator::And, clause);
        self
    }

    pub fn or(mut self, clause: BoundClause) -> Self {
        self.push(Combinator::Or, clause);
        self
    }

    pub fn clauses(&self) -> &[BoundClause] {
        &self.clauses
    }

    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Splits the clause list at every `Or`, yielding the AND-chains.
    pub fn chains(&self) -> Vec<&[BoundClause]> {
        if self.clauses.is_empty() {
            return vec![];
        }
        let mut chains = Vec::new();
        let mut start = 0;
        for (i, combinator) in self.combinators.iter().enumerate() {
            if *combinator == Combinator::Or {
                chains.push(&self.clauses[start..=i]);
                start = i + 1;
            }
        }
        chains.push(&self.clauses[start..]);
        chains
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "Asc",
            SortDirection::Desc => "Desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec(Vec<SortOrder>);

impl SortSpec {
    pub fn unsorted() -> Self {
        Self(vec![])
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::unsorted().then(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::unsorted().then(field, SortDirection::Desc)
    }

    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.0.push(SortOrder { field: field.into(), direction });
        self
    }

    pub fn push(&mut self, order: SortOrder) {
        self.0.push(order);
    }

    pub fn orders(&self) -> &[SortOrder] {
        &self.0
    }

    pub fn orders_mut(&mut self) -> &mut Vec<SortOrder> {
        &mut self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Request body accepted by the find endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(rename = "where")]
    pub where_clause: Option<Value>,
    pub order: Option<Value>,
    pub limit: Option<usize>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eq(field: &str) -> BoundClause {
        BoundClause::new(FilterClause::new(field, FilterOp::Eq), vec![json!(1)])
    }

    #[test]
    fn chains_split_on_or() {
        let predicate = BoundPredicate::new(eq("a")).and(eq("b")).or(eq("c")).and(eq("d"));
        let chains = predicate.chains();
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].iter().map(|c| c.field()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(chains[1].iter().map(|c| c.field()).collect::<Vec<_>>(), vec!["c", "d"]);
    }

    #[test]
    fn match_all_has_no_chains() {
        assert!(BoundPredicate::match_all().chains().is_empty());
        assert!(BoundPredicate::match_all().is_match_all());
    }

    #[test]
    fn arity_counts_operator_arguments() {
        let mut predicate = FilterPredicate::new(FilterClause::new("marks", FilterOp::Between));
        predicate.push(Combinator::And, FilterClause::new("grade", FilterOp::IsNull));
        predicate.push(Combinator::Or, FilterClause::new("result", FilterOp::Eq));
        assert_eq!(predicate.arity(), 3);
    }
}
