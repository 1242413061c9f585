//! Dynacall Callback
//!
//! Type-erased callbacks over free functions, methods and closures. A
//! callback is invoked with a list of dynamic values; arguments are bound
//! or reordered with placeholders, coerced to the target's parameter types
//! through a value registry, and the result comes back as a dynamic value.
//!
//! ```
//! use dynacall_callback::{bind_args, placeholders::*, Callback};
//! use dynacall_value::values;
//!
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! let cb = Callback::from_fn(add);
//! assert_eq!(cb.call(&values![3, 4]).to::<i32>(), Some(7));
//!
//! let plus_ten = cb.bind(bind_args![_1, 10]);
//! assert_eq!(plus_ten.call(&values!["5"]).to::<i32>(), Some(15));
//! ```

pub mod binding;
pub mod callback;
pub mod placeholder;
pub mod reflect;
pub mod signature;
pub mod target;
mod variadic;

pub use callback::Callback;
pub use placeholder::{placeholders, BoundArg, BoundSlot, Placeholder};
pub use reflect::{Creator, Guard, InstanceRef, InvokeAction, MethodFactory, MethodHandle};
pub use signature::{Signature, VariadicShape};
pub use target::{Function, Method, MethodMut};

/// Builds a `Vec<BoundArg>` from values and placeholders of mixed types.
#[macro_export]
macro_rules! bind_args {
    () => {
        ::std::vec::Vec::<$crate::BoundArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::BoundArg::new($arg)),+]
    };
}
