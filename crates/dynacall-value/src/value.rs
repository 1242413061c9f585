//! The dynamic value container.
//!
//! A [`Value`] is either invalid (holds nothing) or holds exactly one value of
//! some `'static + Clone + Send + Sync` type behind a type-erased box. Copies
//! are deep: every clone owns its own payload, so no two values ever alias.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use dynacall_error::{ValueError, ValueResult};

use crate::registry::{self, Registry};
use crate::type_tag::TypeTag;

/// Ordered list of dynamic values.
pub type ValueList = Vec<Value>;

/// String-keyed map of dynamic values.
pub type ValueMap = BTreeMap<String, Value>;

mod sealed {
    use std::any::Any;

    use crate::type_tag::TypeTag;

    /// Capability set of a stored payload. Implemented for every eligible
    /// type and nothing else.
    pub trait Stored: Any + Send + Sync {
        fn clone_boxed(&self) -> Box<dyn Stored>;
        fn as_any(&self) -> &dyn Any;
        fn into_any(self: Box<Self>) -> Box<dyn Any>;
        fn type_tag(&self) -> TypeTag;
    }

    impl<T: Any + Clone + Send + Sync> Stored for T {
        fn clone_boxed(&self) -> Box<dyn Stored> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn Any> {
            self
        }

        fn type_tag(&self) -> TypeTag {
            TypeTag::of::<T>()
        }
    }
}

use sealed::Stored;

/// Type-erased, copyable container for a value of any eligible type.
#[derive(Default)]
pub struct Value {
    inner: Option<Box<dyn Stored>>,
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.as_deref().map(|stored| stored.clone_boxed()),
        }
    }
}

impl Value {
    /// Wraps a copy of `value`. Wrapping a `Value` returns it unchanged
    /// rather than nesting it.
    pub fn wrap<T: Any + Clone + Send + Sync>(value: T) -> Self {
        let mut slot = Some(value);
        if let Some(already) = (&mut slot as &mut dyn Any).downcast_mut::<Option<Value>>() {
            return already.take().unwrap_or_default();
        }
        Self {
            inner: slot.map(|v| Box::new(v) as Box<dyn Stored>),
        }
    }

    /// The invalid value.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// The result of a target that ran and returned nothing. Valid, holds `()`.
    pub fn void() -> Self {
        Self::wrap(())
    }

    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Whether this value is the void marker.
    pub fn is_void(&self) -> bool {
        self.is::<()>()
    }

    /// Runtime type of the payload, `None` when invalid.
    pub fn type_tag(&self) -> Option<TypeTag> {
        self.inner.as_deref().map(|stored| stored.type_tag())
    }

    /// Name of the payload type, `"<invalid>"` when invalid.
    pub fn type_name(&self) -> &'static str {
        self.type_tag().map_or("<invalid>", |tag| tag.name())
    }

    /// Whether the payload is exactly a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is_some_and(|any| any.is::<T>())
    }

    /// Borrows the payload as `&dyn Any`.
    pub fn as_any(&self) -> Option<&dyn Any> {
        self.inner.as_deref().map(|stored| stored.as_any())
    }

    /// Borrows the payload if it is exactly a `T`. No conversion is attempted.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any()?.downcast_ref::<T>()
    }

    /// Moves the payload out if it is exactly a `T`.
    pub fn take<T: Any>(self) -> Option<T> {
        let stored = self.inner?;
        stored.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Converts to a value holding `T` using the process-wide registry.
    /// Returns an invalid value when no conversion is registered.
    pub fn convert<T: Any + Clone + Send + Sync>(&self) -> Value {
        registry::global().convert(self, TypeTag::of::<T>())
    }

    pub fn convert_in<T: Any + Clone + Send + Sync>(&self, registry: &Registry) -> Value {
        registry.convert(self, TypeTag::of::<T>())
    }

    /// Extracts a `T`, converting through the process-wide registry if the
    /// payload is of another type.
    pub fn to<T: Any + Clone + Send + Sync>(&self) -> Option<T> {
        registry::global().convert_to::<T>(self)
    }

    /// Like [`Value::to`], reporting why the extraction failed.
    pub fn try_convert<T: Any + Clone + Send + Sync>(&self) -> ValueResult<T> {
        self.try_convert_in::<T>(&registry::global())
    }

    /// Like [`Value::try_convert`] against an explicit registry.
    pub fn try_convert_in<T: Any + Clone + Send + Sync>(
        &self,
        registry: &Registry,
    ) -> ValueResult<T> {
        let Some(from) = self.type_tag() else {
            return Err(ValueError::InvalidValue);
        };
        registry
            .convert_to::<T>(self)
            .ok_or_else(|| ValueError::not_convertible(from.name(), std::any::type_name::<T>()))
    }

    /// Borrows the payload as `T` or reports the mismatch.
    pub fn expect_ref<T: Any>(&self) -> ValueResult<&T> {
        let Some(from) = self.type_tag() else {
            return Err(ValueError::InvalidValue);
        };
        self.downcast_ref::<T>().ok_or(ValueError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            found: from.name(),
        })
    }
}

impl PartialEq for Value {
    /// Equality as declared in the process-wide comparison registry. Values
    /// whose types have no registered comparison are never equal.
    fn eq(&self, other: &Self) -> bool {
        registry::global().equal(self, other)
    }
}

macro_rules! debug_known {
    ($f:ident, $any:ident, [$($ty:ty),* $(,)?]) => {
        $(
            if let Some(v) = $any.downcast_ref::<$ty>() {
                return fmt::Debug::fmt(v, $f);
            }
        )*
    };
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(any) = self.as_any() else {
            return f.write_str("Value(<invalid>)");
        };
        if any.is::<()>() {
            return f.write_str("Value(<void>)");
        }
        if let Some(list) = any.downcast_ref::<ValueList>() {
            return f.debug_list().entries(list.iter()).finish();
        }
        if let Some(map) = any.downcast_ref::<ValueMap>() {
            return f.debug_map().entries(map.iter()).finish();
        }
        debug_known!(
            f,
            any,
            [
                i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool,
                char, String, &'static str
            ]
        );
        #[cfg(feature = "json")]
        debug_known!(f, any, [serde_json::Value]);
        write!(f, "Value({})", self.type_name())
    }
}

macro_rules! impl_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::wrap(value)
                }
            }
        )*
    };
}

impl_from!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
    String, &'static str, ValueList, ValueMap
);
