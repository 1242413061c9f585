//! Argument resolution for bound callbacks.
//!
//! A binding layer is an ordered list of slots. Resolving a layer against the
//! call-time arguments is a pure function; a callback bound several times
//! resolves its layers from the outermost (most recent) inwards, each layer
//! producing the argument list the next one receives.

use dynacall_error::{CallbackError, CallbackResult};
use dynacall_value::{Value, ValueList};

use crate::placeholder::BoundSlot;

fn highest_placeholder(slots: &[BoundSlot]) -> Option<usize> {
    slots
        .iter()
        .filter_map(|slot| slot.placeholder())
        .map(|p| p.index())
        .max()
}

/// Number of call-time arguments `slots` needs so that the resolved list has
/// `inner` entries. `None` when the inner level accepts any count.
pub fn argument_count(slots: &[BoundSlot], inner: Option<usize>) -> Option<usize> {
    let inner = inner?;
    Some(match highest_placeholder(slots) {
        None => inner.saturating_sub(slots.len()),
        Some(highest) => highest + inner.saturating_sub(slots.len()),
    })
}

/// Resolves one binding layer against the call-time `args`.
///
/// Without placeholders the literal slots are prepended to `args`. With
/// placeholders each slot is substituted, then the arguments after the
/// highest referenced index are appended. Either way nothing is appended
/// once the slots alone provide the `expected` count.
pub fn resolve(
    slots: &[BoundSlot],
    args: &[Value],
    expected: Option<usize>,
) -> CallbackResult<ValueList> {
    let satisfied = expected.is_some_and(|n| slots.len() >= n);

    let Some(highest) = highest_placeholder(slots) else {
        let literals = slots.iter().filter_map(|slot| match slot {
            BoundSlot::Literal(value) => Some(value.clone()),
            BoundSlot::Placeholder(_) => None,
        });
        if satisfied {
            return Ok(literals.collect());
        }
        return Ok(literals.chain(args.iter().cloned()).collect());
    };

    let mut resolved = Vec::with_capacity(slots.len() + args.len().saturating_sub(highest));
    for slot in slots {
        match slot {
            BoundSlot::Literal(value) => resolved.push(value.clone()),
            BoundSlot::Placeholder(p) => {
                let arg = args.get(p.index() - 1).ok_or(CallbackError::UnresolvedPlaceholder {
                    index: p.index(),
                    supplied: args.len(),
                })?;
                resolved.push(arg.clone());
            }
        }
    }

    if !satisfied {
        resolved.extend(args.iter().skip(highest).cloned());
    }
    Ok(resolved)
}
