//! Restriction rendering.
//!
//! A [`CriteriaPolicy`] renders one restriction node given the preferred
//! column name and its operand placeholders (or, for `AND`/`OR`, the
//! already-rendered sub-expressions). Walking a criteria tree is the
//! caller's job.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlGenError};
use crate::value::SqlValue;

/// Kind of restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionType {
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Between,
    NotBetween,
    Amongst,
    NotAmongst,
    Like,
    NotLike,
    BeginsWith,
    NotBeginWith,
    EndsWith,
    NotEndWith,
    IsNull,
    IsNotNull,
    And,
    Or,
}

/// Number of operands a restriction takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No operand (`IS NULL`).
    None,
    /// Exactly one.
    One,
    /// Exactly two (`BETWEEN`).
    Two,
    /// One or more (`IN`, `AND`).
    Many,
}

impl Arity {
    fn accepts(self, n: usize) -> bool {
        match self {
            Self::None => n == 0,
            Self::One => n == 1,
            Self::Two => n == 2,
            Self::Many => n >= 1,
        }
    }

    fn describe(self) -> String {
        match self {
            Self::None => "0".to_string(),
            Self::One => "1".to_string(),
            Self::Two => "2".to_string(),
            Self::Many => "at least 1".to_string(),
        }
    }
}

impl RestrictionType {
    /// Every restriction type.
    pub const ALL: [Self; 20] = [
        Self::Equals,
        Self::NotEquals,
        Self::Less,
        Self::LessOrEqual,
        Self::Greater,
        Self::GreaterOrEqual,
        Self::Between,
        Self::NotBetween,
        Self::Amongst,
        Self::NotAmongst,
        Self::Like,
        Self::NotLike,
        Self::BeginsWith,
        Self::NotBeginWith,
        Self::EndsWith,
        Self::NotEndWith,
        Self::IsNull,
        Self::IsNotNull,
        Self::And,
        Self::Or,
    ];

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::Less => "LESS",
            Self::LessOrEqual => "LESS_OR_EQUAL",
            Self::Greater => "GREATER",
            Self::GreaterOrEqual => "GREATER_OR_EQUAL",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT_BETWEEN",
            Self::Amongst => "AMONGST",
            Self::NotAmongst => "NOT_AMONGST",
            Self::Like => "LIKE",
            Self::NotLike => "NOT_LIKE",
            Self::BeginsWith => "BEGINS_WITH",
            Self::NotBeginWith => "NOT_BEGIN_WITH",
            Self::EndsWith => "ENDS_WITH",
            Self::NotEndWith => "NOT_END_WITH",
            Self::IsNull => "IS_NULL",
            Self::IsNotNull => "IS_NOT_NULL",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Operand count the restriction takes.
    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::IsNull | Self::IsNotNull => Arity::None,
            Self::Between | Self::NotBetween => Arity::Two,
            Self::Amongst | Self::NotAmongst | Self::And | Self::Or => Arity::Many,
            _ => Arity::One,
        }
    }

    /// Returns `true` for `AND`/`OR`.
    #[must_use]
    pub const fn is_compound(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl fmt::Display for RestrictionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering rule for one restriction type.
pub trait CriteriaPolicy: fmt::Debug + Send + Sync {
    /// The restriction this policy serves.
    fn restriction(&self) -> RestrictionType;

    /// Renders the restriction without checking operand count.
    fn render_unchecked(&self, column: &str, operands: &[&str]) -> String;

    /// Renders the restriction over `column` with the given operands.
    fn render(&self, column: &str, operands: &[&str]) -> Result<String> {
        let restriction = self.restriction();
        let arity = restriction.arity();
        if !arity.accepts(operands.len()) {
            return Err(SqlGenError::OperandCount {
                restriction,
                expected: arity.describe(),
                actual: operands.len(),
            });
        }
        Ok(self.render_unchecked(column, operands))
    }

    /// Transforms an operand value before binding (pattern wildcards).
    fn transform_operand(&self, value: SqlValue) -> SqlValue {
        value
    }
}

/// Binary comparison: `col <op> ?`.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonPolicy {
    restriction: RestrictionType,
    operator: &'static str,
}

impl ComparisonPolicy {
    /// Creates a comparison rendering `operator`.
    #[must_use]
    pub const fn new(restriction: RestrictionType, operator: &'static str) -> Self {
        Self {
            restriction,
            operator,
        }
    }
}

impl CriteriaPolicy for ComparisonPolicy {
    fn restriction(&self) -> RestrictionType {
        self.restriction
    }

    fn render_unchecked(&self, column: &str, operands: &[&str]) -> String {
        format!("{column} {} {}", self.operator, operands.join(""))
    }
}

/// `col [NOT] BETWEEN ? AND ?`.
#[derive(Debug, Clone, Copy)]
pub struct RangePolicy {
    negated: bool,
}

impl RangePolicy {
    /// Creates a range policy.
    #[must_use]
    pub const fn new(negated: bool) -> Self {
        Self { negated }
    }
}

impl CriteriaPolicy for RangePolicy {
    fn restriction(&self) -> RestrictionType {
        if self.negated {
            RestrictionType::NotBetween
        } else {
            RestrictionType::Between
        }
    }

    fn render_unchecked(&self, column: &str, operands: &[&str]) -> String {
        let not = if self.negated { "NOT " } else { "" };
        format!("{column} {not}BETWEEN {} AND {}", operands[0], operands[1])
    }
}

/// `col [NOT] IN (?, ?, ...)`.
#[derive(Debug, Clone, Copy)]
pub struct AmongstPolicy {
    negated: bool,
}

impl AmongstPolicy {
    /// Creates a membership policy.
    #[must_use]
    pub const fn new(negated: bool) -> Self {
        Self { negated }
    }
}

impl CriteriaPolicy for AmongstPolicy {
    fn restriction(&self) -> RestrictionType {
        if self.negated {
            RestrictionType::NotAmongst
        } else {
            RestrictionType::Amongst
        }
    }

    fn render_unchecked(&self, column: &str, operands: &[&str]) -> String {
        let not = if self.negated { "NOT " } else { "" };
        format!("{column} {not}IN ({})", operands.join(", "))
    }
}

/// Where a pattern operand gets its `%` wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcard {
    /// `%value%`
    Both,
    /// `value%`
    Trailing,
    /// `%value`
    Leading,
}

/// `col [NOT] LIKE ?` with the operand wrapped in wildcards.
#[derive(Debug, Clone, Copy)]
pub struct LikePolicy {
    restriction: RestrictionType,
    negated: bool,
    wildcard: Wildcard,
}

impl LikePolicy {
    /// Creates a pattern policy.
    #[must_use]
    pub const fn new(restriction: RestrictionType, negated: bool, wildcard: Wildcard) -> Self {
        Self {
            restriction,
            negated,
            wildcard,
        }
    }
}

impl CriteriaPolicy for LikePolicy {
    fn restriction(&self) -> RestrictionType {
        self.restriction
    }

    fn render_unchecked(&self, column: &str, operands: &[&str]) -> String {
        let not = if self.negated { "NOT " } else { "" };
        format!("{column} {not}LIKE {}", operands[0])
    }

    fn transform_operand(&self, value: SqlValue) -> SqlValue {
        match value {
            SqlValue::Text(s) => SqlValue::Text(match self.wildcard {
                Wildcard::Both => format!("%{s}%"),
                Wildcard::Trailing => format!("{s}%"),
                Wildcard::Leading => format!("%{s}"),
            }),
            other => other,
        }
    }
}

/// `col IS [NOT] NULL`.
#[derive(Debug, Clone, Copy)]
pub struct NullCheckPolicy {
    negated: bool,
}

impl NullCheckPolicy {
    /// Creates a null check policy.
    #[must_use]
    pub const fn new(negated: bool) -> Self {
        Self { negated }
    }
}

impl CriteriaPolicy for NullCheckPolicy {
    fn restriction(&self) -> RestrictionType {
        if self.negated {
            RestrictionType::IsNotNull
        } else {
            RestrictionType::IsNull
        }
    }

    fn render_unchecked(&self, column: &str, _operands: &[&str]) -> String {
        if self.negated {
            format!("{column} IS NOT NULL")
        } else {
            format!("{column} IS NULL")
        }
    }
}

/// `(a AND b ...)` / `(a OR b ...)` over rendered sub-expressions.
#[derive(Debug, Clone, Copy)]
pub struct CompoundPolicy {
    restriction: RestrictionType,
}

impl CompoundPolicy {
    /// Creates an `AND` or `OR` policy.
    #[must_use]
    pub const fn new(restriction: RestrictionType) -> Self {
        Self { restriction }
    }
}

impl CriteriaPolicy for CompoundPolicy {
    fn restriction(&self) -> RestrictionType {
        self.restriction
    }

    fn render_unchecked(&self, _column: &str, operands: &[&str]) -> String {
        if operands.len() == 1 {
            return operands[0].to_string();
        }
        let glue = format!(" {} ", self.restriction.as_str());
        format!("({})", operands.join(&glue))
    }
}

/// The criteria policies of one dialect, keyed by restriction type.
#[derive(Debug, Clone, Default)]
pub struct CriteriaPolicyTable {
    policies: HashMap<RestrictionType, Arc<dyn CriteriaPolicy>>,
}

impl CriteriaPolicyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the standard table covering every restriction type.
    #[must_use]
    pub fn standard() -> Self {
        use RestrictionType as R;
        Self::new()
            .with(ComparisonPolicy::new(R::Equals, "="))
            .with(ComparisonPolicy::new(R::NotEquals, "<>"))
            .with(ComparisonPolicy::new(R::Less, "<"))
            .with(ComparisonPolicy::new(R::LessOrEqual, "<="))
            .with(ComparisonPolicy::new(R::Greater, ">"))
            .with(ComparisonPolicy::new(R::GreaterOrEqual, ">="))
            .with(RangePolicy::new(false))
            .with(RangePolicy::new(true))
            .with(AmongstPolicy::new(false))
            .with(AmongstPolicy::new(true))
            .with(LikePolicy::new(R::Like, false, Wildcard::Both))
            .with(LikePolicy::new(R::NotLike, true, Wildcard::Both))
            .with(LikePolicy::new(R::BeginsWith, false, Wildcard::Trailing))
            .with(LikePolicy::new(R::NotBeginWith, true, Wildcard::Trailing))
            .with(LikePolicy::new(R::EndsWith, false, Wildcard::Leading))
            .with(LikePolicy::new(R::NotEndWith, true, Wildcard::Leading))
            .with(NullCheckPolicy::new(false))
            .with(NullCheckPolicy::new(true))
            .with(CompoundPolicy::new(R::And))
            .with(CompoundPolicy::new(R::Or))
    }

    /// Adds or replaces the policy for its restriction type.
    #[must_use]
    pub fn with(mut self, policy: impl CriteriaPolicy + 'static) -> Self {
        self.policies.insert(policy.restriction(), Arc::new(policy));
        self
    }

    /// Looks up the policy for a restriction type.
    #[must_use]
    pub fn get(&self, restriction: RestrictionType) -> Option<&Arc<dyn CriteriaPolicy>> {
        self.policies.get(&restriction)
    }

    /// Restriction types without a policy.
    #[must_use]
    pub fn missing(&self) -> Vec<RestrictionType> {
        RestrictionType::ALL
            .into_iter()
            .filter(|r| !self.policies.contains_key(r))
            .collect()
    }
}

/// Splits `values` into chunks no larger than `max_values`.
///
/// `None` means the dialect has no limit and yields a single chunk.
#[must_use]
pub fn clause_value_chunks<T>(values: &[T], max_values: Option<usize>) -> Vec<&[T]> {
    match max_values {
        Some(max) if max > 0 && values.len() > max => values.chunks(max).collect(),
        _ => vec![values],
    }
}
