//! Conversion table: (source type, target type) -> converter.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::type_tag::TypeTag;
use crate::value::Value;

/// Type-erased converter. Receives the source payload, returns the converted
/// value or `None` when this particular source value cannot be represented.
pub type ConvertFn = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;

/// Direct, single-hop conversions between registered type pairs.
#[derive(Clone, Default)]
pub struct ConversionTable {
    entries: HashMap<(TypeTag, TypeTag), ConvertFn>,
}

impl ConversionTable {
    /// Registers `f` as the conversion from `S` to `T`, replacing any previous
    /// entry for the pair.
    pub fn register<S, T, F>(&mut self, f: F)
    where
        S: Any,
        T: Any + Clone + Send + Sync,
        F: Fn(&S) -> Option<T> + Send + Sync + 'static,
    {
        let converter: ConvertFn = Arc::new(move |any: &dyn Any| {
            any.downcast_ref::<S>().and_then(&f).map(Value::wrap)
        });
        self.entries
            .insert((TypeTag::of::<S>(), TypeTag::of::<T>()), converter);
    }

    pub fn get(&self, from: TypeTag, to: TypeTag) -> Option<&ConvertFn> {
        self.entries.get(&(from, to))
    }

    pub fn contains(&self, from: TypeTag, to: TypeTag) -> bool {
        self.entries.contains_key(&(from, to))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
