//! Placeholders and bound argument slots.

use std::any::Any;
use std::fmt;

use dynacall_value::Value;

/// Positional reference to the k-th argument of a future call, 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placeholder(usize);

impl Placeholder {
    /// Placeholder for call-time argument `index`. Index 0 is clamped to 1.
    pub const fn new(index: usize) -> Self {
        if index == 0 {
            Self(1)
        } else {
            Self(index)
        }
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.0)
    }
}

#[allow(non_upper_case_globals)]
pub mod placeholders {
    use super::Placeholder;

    pub const _1: Placeholder = Placeholder::new(1);
    pub const _2: Placeholder = Placeholder::new(2);
    pub const _3: Placeholder = Placeholder::new(3);
    pub const _4: Placeholder = Placeholder::new(4);
    pub const _5: Placeholder = Placeholder::new(5);
    pub const _6: Placeholder = Placeholder::new(6);
    pub const _7: Placeholder = Placeholder::new(7);
    pub const _8: Placeholder = Placeholder::new(8);
    pub const _9: Placeholder = Placeholder::new(9);
}

/// One slot of a binding: a literal value or a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundSlot {
    Literal(Value),
    Placeholder(Placeholder),
}

impl BoundSlot {
    pub fn placeholder(&self) -> Option<Placeholder> {
        match self {
            BoundSlot::Placeholder(p) => Some(*p),
            BoundSlot::Literal(_) => None,
        }
    }
}

/// Argument accepted by `Callback::bind`.
///
/// Any eligible value becomes a literal slot; a [`Placeholder`] becomes a
/// placeholder slot and a [`Value`] is stored as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArg(BoundSlot);

impl BoundArg {
    pub fn new<T: Any + Clone + Send + Sync>(arg: T) -> Self {
        let any: &dyn Any = &arg;
        match any.downcast_ref::<Placeholder>() {
            Some(placeholder) => Self(BoundSlot::Placeholder(*placeholder)),
            None => Self(BoundSlot::Literal(Value::wrap(arg))),
        }
    }

    pub fn into_slot(self) -> BoundSlot {
        self.0
    }
}

impl From<Placeholder> for BoundArg {
    fn from(placeholder: Placeholder) -> Self {
        Self(BoundSlot::Placeholder(placeholder))
    }
}

impl From<Value> for BoundArg {
    fn from(value: Value) -> Self {
        Self(BoundSlot::Literal(value))
    }
}
