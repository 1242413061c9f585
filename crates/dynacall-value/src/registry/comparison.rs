//! Comparison table: (left type, right type) -> six independent predicates.
//!
//! The predicates are never derived from one another. A pair registered with
//! only an equality predicate answers `false` to every ordering question, and
//! `not_equal` is whatever was registered for it, not `!equal`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::type_tag::TypeTag;

/// Type-erased binary predicate over two payloads.
pub type Predicate = Arc<dyn Fn(&dyn Any, &dyn Any) -> bool + Send + Sync>;

/// The six relational operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Equal,
        CompareOp::NotEqual,
        CompareOp::LessThan,
        CompareOp::GreaterThan,
        CompareOp::LessEqual,
        CompareOp::GreaterEqual,
    ];

    /// Whether `a op b` may be answered by the mirrored pair as `b op a`.
    pub fn is_commutative(self) -> bool {
        matches!(self, CompareOp::Equal | CompareOp::NotEqual)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::LessThan => "<",
            CompareOp::GreaterThan => ">",
            CompareOp::LessEqual => "<=",
            CompareOp::GreaterEqual => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The predicates registered for one ordered type pair.
#[derive(Clone, Default)]
pub struct Comparison {
    predicates: [Option<Predicate>; 6],
}

impl Comparison {
    /// Starts a comparison for `A op B` with no predicates set.
    pub fn builder<A: Any, B: Any>() -> ComparisonBuilder<A, B> {
        ComparisonBuilder {
            comparison: Comparison::default(),
            _marker: PhantomData,
        }
    }

    /// All six predicates from the native `PartialEq`/`PartialOrd` operators.
    pub fn native<A, B>() -> Self
    where
        A: Any + PartialOrd<B>,
        B: Any,
    {
        Self::builder::<A, B>()
            .equal(|a, b| a == b)
            .not_equal(|a, b| a != b)
            .less_than(|a, b| a < b)
            .greater_than(|a, b| a > b)
            .less_equal(|a, b| a <= b)
            .greater_equal(|a, b| a >= b)
            .build()
    }

    /// Only `==` and `!=` from the native `PartialEq` operators.
    pub fn equality<A, B>() -> Self
    where
        A: Any + PartialEq<B>,
        B: Any,
    {
        Self::builder::<A, B>()
            .equal(|a, b| a == b)
            .not_equal(|a, b| a != b)
            .build()
    }

    pub fn predicate(&self, op: CompareOp) -> Option<&Predicate> {
        self.predicates[op as usize].as_ref()
    }

    /// Whether a predicate is registered for `op`.
    pub fn supports(&self, op: CompareOp) -> bool {
        self.predicate(op).is_some()
    }

    /// Evaluates `left op right`; `false` when `op` is not registered.
    pub fn evaluate(&self, op: CompareOp, left: &dyn Any, right: &dyn Any) -> bool {
        self.predicate(op).is_some_and(|p| p(left, right))
    }
}

impl fmt::Debug for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops: Vec<&str> = CompareOp::ALL
            .iter()
            .filter(|op| self.supports(**op))
            .map(|op| op.symbol())
            .collect();
        f.debug_struct("Comparison").field("ops", &ops).finish()
    }
}

/// Typed builder for a [`Comparison`].
pub struct ComparisonBuilder<A, B> {
    comparison: Comparison,
    _marker: PhantomData<fn(&A, &B)>,
}

impl<A: Any, B: Any> ComparisonBuilder<A, B> {
    fn set<F>(mut self, op: CompareOp, f: F) -> Self
    where
        F: Fn(&A, &B) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(move |left: &dyn Any, right: &dyn Any| {
            match (left.downcast_ref::<A>(), right.downcast_ref::<B>()) {
                (Some(a), Some(b)) => f(a, b),
                _ => false,
            }
        });
        self.comparison.predicates[op as usize] = Some(predicate);
        self
    }

    pub fn equal<F: Fn(&A, &B) -> bool + Send + Sync + 'static>(self, f: F) -> Self {
        self.set(CompareOp::Equal, f)
    }

    pub fn not_equal<F: Fn(&A, &B) -> bool + Send + Sync + 'static>(self, f: F) -> Self {
        self.set(CompareOp::NotEqual, f)
    }

    pub fn less_than<F: Fn(&A, &B) -> bool + Send + Sync + 'static>(self, f: F) -> Self {
        self.set(CompareOp::LessThan, f)
    }

    pub fn greater_than<F: Fn(&A, &B) -> bool + Send + Sync + 'static>(self, f: F) -> Self {
        self.set(CompareOp::GreaterThan, f)
    }

    pub fn less_equal<F: Fn(&A, &B) -> bool + Send + Sync + 'static>(self, f: F) -> Self {
        self.set(CompareOp::LessEqual, f)
    }

    pub fn greater_equal<F: Fn(&A, &B) -> bool + Send + Sync + 'static>(self, f: F) -> Self {
        self.set(CompareOp::GreaterEqual, f)
    }

    pub fn build(self) -> Comparison {
        self.comparison
    }
}

/// Registered comparisons keyed by ordered type pair.
#[derive(Clone, Default)]
pub struct ComparisonTable {
    entries: HashMap<(TypeTag, TypeTag), Comparison>,
}

impl ComparisonTable {
    /// Registers `comparison` for `left op right`, replacing any previous entry.
    pub fn register(&mut self, left: TypeTag, right: TypeTag, comparison: Comparison) {
        self.entries.insert((left, right), comparison);
    }

    pub fn get(&self, left: TypeTag, right: TypeTag) -> Option<&Comparison> {
        self.entries.get(&(left, right))
    }

    pub fn contains(&self, left: TypeTag, right: TypeTag) -> bool {
        self.entries.contains_key(&(left, right))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_comparison() {
        let cmp = Comparison::native::<i64, i64>();
        assert!(cmp.evaluate(CompareOp::Equal, &1_i64, &1_i64));
        assert!(cmp.evaluate(CompareOp::LessThan, &1_i64, &2_i64));
        assert!(!cmp.evaluate(CompareOp::GreaterEqual, &1_i64, &2_i64));
        // Mismatched payloads never satisfy a predicate
        assert!(!cmp.evaluate(CompareOp::Equal, &1_i64, &1_i32));
    }

    #[test]
    fn test_predicates_are_not_derived() {
        let cmp = Comparison::builder::<i64, i64>().equal(|a, b| a == b).build();
        assert!(cmp.supports(CompareOp::Equal));
        assert!(!cmp.supports(CompareOp::NotEqual));
        assert!(!cmp.evaluate(CompareOp::NotEqual, &1_i64, &2_i64));
        assert!(!cmp.evaluate(CompareOp::LessThan, &1_i64, &2_i64));
    }

    #[test]
    fn test_partial_order_is_preserved() {
        let cmp = Comparison::native::<f64, f64>();
        let nan = f64::NAN;
        assert!(!cmp.evaluate(CompareOp::Equal, &nan, &nan));
        assert!(cmp.evaluate(CompareOp::NotEqual, &nan, &nan));
        assert!(!cmp.evaluate(CompareOp::LessEqual, &nan, &1.0_f64));
        assert!(!cmp.evaluate(CompareOp::GreaterEqual, &nan, &1.0_f64));
    }

    #[test]
    fn test_debug_lists_supported_ops() {
        let cmp = Comparison::equality::<String, String>();
        assert_eq!(format!("{:?}", cmp), "Comparison { ops: [\"==\", \"!=\"] }");
    }
}
