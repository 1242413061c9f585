//! Dynacall Value
//!
//! Type-erased, copyable dynamic values together with the registries that
//! give them behaviour: one-hop type conversion, six-way comparison and
//! list/map iteration. Unregistered types still round-trip through a value;
//! they just cannot be converted, compared or iterated element-wise.

pub mod builtins;
#[cfg(feature = "json")]
pub mod json;
pub mod registry;
pub mod type_tag;
pub mod value;

pub use builtins::Builtins;
pub use registry::{
    CompareOp, Comparison, ComparisonBuilder, ContainerKind, Cursor, Entry, Iter, Registry,
};
pub use type_tag::TypeTag;
pub use value::{Value, ValueList, ValueMap};

/// Builds a [`ValueList`] from expressions convertible into [`Value`].
///
/// ```
/// use dynacall_value::{values, Value};
///
/// let list = values![1_i64, "two", 3.0_f64];
/// assert_eq!(list.len(), 3);
/// assert!(list[1].is::<&'static str>());
/// ```
#[macro_export]
macro_rules! values {
    () => {
        $crate::ValueList::new()
    };
    ($($item:expr),+ $(,)?) => {
        <$crate::ValueList as ::core::convert::From<_>>::from([$($crate::Value::from($item)),+])
    };
}
