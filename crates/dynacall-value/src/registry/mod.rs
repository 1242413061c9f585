//! Conversion, comparison and iteration registries.
//!
//! A [`Registry`] is a plain value: build one, register into it, and pass it to
//! the `*_in` APIs. The process-wide instance lives in [`global`] and follows a
//! copy-on-write discipline: readers take an `Arc` snapshot and run every
//! lookup and every registered function without holding a lock, writers clone
//! the tables when snapshots are outstanding. Registration is expected during
//! setup; a registration racing a lookup is serialised by the lock, but the
//! lookup may observe either the old or the new table.
//!
//! Every lookup that misses answers with a sentinel (an invalid [`Value`],
//! `false`, or an empty iteration). Nothing here panics; [`Registry::try_compare`]
//! is the one lookup that reports a miss as an error.

mod comparison;
mod conversion;
mod global;
mod iteration;

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use dynacall_error::{ValueError, ValueResult};
use tracing::trace;

pub use comparison::{CompareOp, Comparison, ComparisonBuilder, ComparisonTable, Predicate};
pub use conversion::{ConversionTable, ConvertFn};
pub use global::{global, init, install, reset, shutdown, with_global_mut};
pub use iteration::{ContainerKind, Cursor, Entry, IterAdapter, Iter, IterationTable};

use crate::type_tag::TypeTag;
use crate::value::{Value, ValueList, ValueMap};

/// The three lookup tables consulted by dynamic values.
#[derive(Clone, Default)]
pub struct Registry {
    conversions: ConversionTable,
    comparisons: ComparisonTable,
    iterators: IterationTable,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("conversions", &self.conversions.len())
            .field("comparisons", &self.comparisons.len())
            .field("iterators", &self.iterators.len())
            .finish()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in group installed.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::Builtins::all().install(&mut registry);
        registry
    }

    pub fn conversions(&self) -> &ConversionTable {
        &self.conversions
    }

    pub fn comparisons(&self) -> &ComparisonTable {
        &self.comparisons
    }

    pub fn iterators(&self) -> &IterationTable {
        &self.iterators
    }

    //-------------------------------------------------------------------------
    // Conversion
    //-------------------------------------------------------------------------

    /// Registers `f` as the conversion from `S` to `T`. Replaces any previous
    /// conversion for the pair.
    pub fn register_conversion<S, T, F>(&mut self, f: F)
    where
        S: Any,
        T: Any + Clone + Send + Sync,
        F: Fn(&S) -> Option<T> + Send + Sync + 'static,
    {
        trace!(
            from = std::any::type_name::<S>(),
            to = std::any::type_name::<T>(),
            "registering conversion"
        );
        self.conversions.register::<S, T, F>(f);
    }

    /// Registers the infallible `From` conversion from `S` to `T`.
    pub fn register_into<S, T>(&mut self)
    where
        S: Any + Clone,
        T: Any + Clone + Send + Sync + From<S>,
    {
        self.register_conversion::<S, T, _>(|s: &S| Some(T::from(s.clone())));
    }

    /// Whether a value of type `from` can be converted to `to` in one hop.
    pub fn can_convert(&self, from: TypeTag, to: TypeTag) -> bool {
        from == to || to.is::<Value>() || self.conversions.contains(from, to)
    }

    /// Converts `value` to the type `to`.
    ///
    /// A value already of type `to` is returned as-is; otherwise the direct
    /// conversion for the pair is used. There is no chaining: a missing entry
    /// yields an invalid value.
    pub fn convert(&self, value: &Value, to: TypeTag) -> Value {
        let (Some(from), Some(payload)) = (value.type_tag(), value.as_any()) else {
            return Value::invalid();
        };
        if from == to || to.is::<Value>() {
            return value.clone();
        }
        match self.conversions.get(from, to) {
            Some(converter) => converter(payload).unwrap_or_default(),
            None => Value::invalid(),
        }
    }

    /// Extracts a `T` from `value`, converting if needed.
    ///
    /// `T = Value` accepts any valid value. `T = ValueList` and `T = ValueMap`
    /// additionally accept any registered list or map container.
    pub fn convert_to<T: Any + Clone + Send + Sync>(&self, value: &Value) -> Option<T> {
        if !value.is_valid() {
            return None;
        }
        if let Some(exact) = value.downcast_ref::<T>() {
            return Some(exact.clone());
        }
        if TypeTag::of::<T>().is::<Value>() {
            return cast::<Value, T>(value.clone());
        }
        if TypeTag::of::<T>().is::<ValueList>() && self.is_list(value) {
            return cast::<ValueList, T>(self.to_list(value));
        }
        if TypeTag::of::<T>().is::<ValueMap>() && self.is_map(value) {
            return cast::<ValueMap, T>(self.to_map(value));
        }
        self.convert(value, TypeTag::of::<T>()).take::<T>()
    }

    //-------------------------------------------------------------------------
    // Comparison
    //-------------------------------------------------------------------------

    /// Registers `comparison` for `left op right`. Replaces any previous
    /// comparison for the ordered pair.
    pub fn register_comparison(&mut self, left: TypeTag, right: TypeTag, comparison: Comparison) {
        trace!(left = left.name(), right = right.name(), ?comparison, "registering comparison");
        self.comparisons.register(left, right, comparison);
    }

    /// Registers `T` against itself using its native operators.
    pub fn register_comparable<T: Any + PartialOrd>(&mut self) {
        self.register_comparison(TypeTag::of::<T>(), TypeTag::of::<T>(), Comparison::native::<T, T>());
    }

    /// Registers `T` against itself for `==` and `!=` only.
    pub fn register_equatable<T: Any + PartialEq>(&mut self) {
        self.register_comparison(TypeTag::of::<T>(), TypeTag::of::<T>(), Comparison::equality::<T, T>());
    }

    /// Whether `a` and `b` can be compared by any operator.
    pub fn can_compare(&self, a: &Value, b: &Value) -> bool {
        let (Some(ta), Some(tb)) = (a.type_tag(), b.type_tag()) else {
            return !a.is_valid() && !b.is_valid();
        };
        self.comparisons.contains(ta, tb)
            || self.comparisons.contains(tb, ta)
            || (self.comparisons.contains(ta, ta) && self.conversions.contains(tb, ta))
    }

    /// Evaluates `a op b`.
    ///
    /// Lookup order: the exact pair; the mirrored pair for `==` and `!=`; the
    /// right operand converted to the left operand's type and compared with
    /// that type's own comparison. Two invalid values are equal.
    pub fn compare(&self, op: CompareOp, a: &Value, b: &Value) -> bool {
        let (Some(ta), Some(tb), Some(pa), Some(pb)) =
            (a.type_tag(), b.type_tag(), a.as_any(), b.as_any())
        else {
            return op == CompareOp::Equal && !a.is_valid() && !b.is_valid();
        };

        if let Some(comparison) = self.comparisons.get(ta, tb) {
            if let Some(equal) = self.containers_equal(op, pa, pb) {
                return if op == CompareOp::Equal { equal } else { !equal };
            }
            return comparison.evaluate(op, pa, pb);
        }
        if op.is_commutative() {
            if let Some(comparison) = self.comparisons.get(tb, ta) {
                return comparison.evaluate(op, pb, pa);
            }
        }
        if let Some(comparison) = self.comparisons.get(ta, ta) {
            let converted = self.convert(b, ta);
            if let Some(pc) = converted.as_any() {
                return comparison.evaluate(op, pa, pc);
            }
        }
        false
    }

    /// Element-wise equality of two lists or two maps through this registry.
    /// `None` when the operands are not both lists or both maps, or `op` is
    /// an ordering.
    fn containers_equal(&self, op: CompareOp, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        if !op.is_commutative() {
            return None;
        }
        if let (Some(a), Some(b)) = (a.downcast_ref::<ValueList>(), b.downcast_ref::<ValueList>()) {
            return Some(a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.equal(x, y)));
        }
        if let (Some(a), Some(b)) = (a.downcast_ref::<ValueMap>(), b.downcast_ref::<ValueMap>()) {
            return Some(
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && self.equal(va, vb)),
            );
        }
        None
    }

    /// Like [`Registry::compare`], reporting pairs with no usable comparison
    /// instead of answering `false`.
    pub fn try_compare(&self, op: CompareOp, a: &Value, b: &Value) -> ValueResult<bool> {
        if !self.can_compare(a, b) {
            return Err(ValueError::Incomparable {
                left: a.type_name(),
                right: b.type_name(),
            });
        }
        Ok(self.compare(op, a, b))
    }

    pub fn equal(&self, a: &Value, b: &Value) -> bool {
        self.compare(CompareOp::Equal, a, b)
    }

    pub fn not_equal(&self, a: &Value, b: &Value) -> bool {
        self.compare(CompareOp::NotEqual, a, b)
    }

    pub fn less_than(&self, a: &Value, b: &Value) -> bool {
        self.compare(CompareOp::LessThan, a, b)
    }

    pub fn greater_than(&self, a: &Value, b: &Value) -> bool {
        self.compare(CompareOp::GreaterThan, a, b)
    }

    pub fn less_equal(&self, a: &Value, b: &Value) -> bool {
        self.compare(CompareOp::LessEqual, a, b)
    }

    pub fn greater_equal(&self, a: &Value, b: &Value) -> bool {
        self.compare(CompareOp::GreaterEqual, a, b)
    }

    //-------------------------------------------------------------------------
    // Iteration
    //-------------------------------------------------------------------------

    /// Registers list iteration for container `C` of `T` items.
    pub fn register_list<C, T>(&mut self)
    where
        C: Any,
        for<'a> &'a C: IntoIterator<Item = &'a T>,
        T: Any + Clone + Send + Sync,
    {
        trace!(container = std::any::type_name::<C>(), "registering list iteration");
        self.iterators.register(TypeTag::of::<C>(), IterAdapter::list::<C, T>());
    }

    /// Registers map iteration for container `M` of `K` to `V`.
    pub fn register_map<M, K, V>(&mut self)
    where
        M: Any,
        for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
        K: Any + Clone + Send + Sync,
        V: Any + Clone + Send + Sync,
    {
        trace!(container = std::any::type_name::<M>(), "registering map iteration");
        self.iterators.register(TypeTag::of::<M>(), IterAdapter::map::<M, K, V>());
    }

    fn adapter_for(&self, value: &Value) -> Option<&IterAdapter> {
        value.type_tag().and_then(|tag| self.iterators.get(tag))
    }

    pub fn is_list(&self, value: &Value) -> bool {
        self.adapter_for(value)
            .is_some_and(|adapter| adapter.kind() == ContainerKind::List)
    }

    pub fn is_map(&self, value: &Value) -> bool {
        self.adapter_for(value)
            .is_some_and(|adapter| adapter.kind() == ContainerKind::Map)
    }

    /// Whether `value` is valid and iterates generically as a single entry.
    pub fn is_generic(&self, value: &Value) -> bool {
        value.is_valid() && self.adapter_for(value).is_none()
    }

    /// Number of entries: 0 for invalid, 1 for generic values.
    pub fn item_count(&self, value: &Value) -> usize {
        match (self.adapter_for(value), value.as_any()) {
            (Some(adapter), Some(payload)) => adapter.count(payload),
            (None, Some(_)) => 1,
            _ => 0,
        }
    }

    fn snapshot(&self, value: &Value) -> Arc<[Entry]> {
        let entries = match (self.adapter_for(value), value.as_any()) {
            (Some(adapter), Some(payload)) => adapter.entries(payload),
            (None, Some(_)) => vec![Entry {
                key: Value::invalid(),
                value: value.clone(),
            }],
            _ => Vec::new(),
        };
        Arc::from(entries)
    }

    /// Cursor on the first entry of `value`.
    pub fn begin(&self, value: &Value) -> Cursor {
        Cursor::begin(self.snapshot(value), value.is_valid())
    }

    /// Cursor one past the last entry of `value`.
    pub fn end(&self, value: &Value) -> Cursor {
        Cursor::end(self.snapshot(value), value.is_valid())
    }

    /// Iterator over the entries of `value`.
    pub fn iter(&self, value: &Value) -> Iter {
        Iter::new(self.begin(value))
    }

    /// All entry values of `value`.
    pub fn to_list(&self, value: &Value) -> ValueList {
        if let Some(list) = value.downcast_ref::<ValueList>() {
            return list.clone();
        }
        self.iter(value).map(|entry| entry.value).collect()
    }

    /// Entries of a map value keyed by their string form. Keys that do not
    /// convert to `String` are skipped; non-map values give an empty map.
    pub fn to_map(&self, value: &Value) -> ValueMap {
        if let Some(map) = value.downcast_ref::<ValueMap>() {
            return map.clone();
        }
        if !self.is_map(value) {
            return BTreeMap::new();
        }
        self.iter(value)
            .filter_map(|entry| {
                let key = self.convert_to::<String>(&entry.key);
                if key.is_none() {
                    trace!(key = entry.key.type_name(), "skipping map key without string form");
                }
                key.map(|key| (key, entry.value))
            })
            .collect()
    }
}

/// Moves `value` into `T` when `S` and `T` are the same type.
fn cast<S: Any, T: Any>(value: S) -> Option<T> {
    let mut slot = Some(value);
    (&mut slot as &mut dyn Any)
        .downcast_mut::<Option<T>>()
        .and_then(Option::take)
}
