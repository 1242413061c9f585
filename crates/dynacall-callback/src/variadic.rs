//! Splitting of an effective argument list for variadic targets.

use std::any::Any;

use dynacall_error::{CallbackError, CallbackResult};
use dynacall_value::{Registry, Value, ValueList};

use crate::signature::VariadicShape;
use crate::target::extract;

/// Effective arguments split according to a [`VariadicShape`].
#[derive(Debug)]
pub(crate) struct Split<L> {
    pub extra: Option<L>,
    pub collected: ValueList,
}

/// Splits `args` into the fixed extra parameter and the collected tail.
///
/// `NoExtra` collects everything. `LeadingExtra` converts the first argument
/// and `TrailingExtra` the last; both fail with `MissingVariadicExtra` when
/// the list is empty.
pub(crate) fn split<L: Any + Clone + Send + Sync>(
    shape: VariadicShape,
    registry: &Registry,
    mut args: ValueList,
) -> CallbackResult<Split<L>> {
    match shape {
        VariadicShape::NoExtra => Ok(Split {
            extra: None,
            collected: args,
        }),
        VariadicShape::LeadingExtra(_) => {
            if args.is_empty() {
                return Err(CallbackError::MissingVariadicExtra);
            }
            let first: Value = args.remove(0);
            let extra = extract::<L>(registry, &first, 0)?;
            Ok(Split {
                extra: Some(extra),
                collected: args,
            })
        }
        VariadicShape::TrailingExtra(_) => {
            let last = args.pop().ok_or(CallbackError::MissingVariadicExtra)?;
            let extra = extract::<L>(registry, &last, args.len())?;
            Ok(Split {
                extra: Some(extra),
                collected: args,
            })
        }
    }
}
