//! The type-erased callback handle.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dynacall_error::{CallbackError, CallbackResult, DynacallError};
use dynacall_value::{registry, Registry, TypeTag, Value, ValueList};
use parking_lot::Mutex;
use tracing::debug;

use crate::binding;
use crate::placeholder::{BoundArg, BoundSlot};
use crate::signature::{Signature, VariadicShape};
use crate::target::{FnTarget, Function, Method, MethodMut, MethodMutTarget, MethodTarget, Target};
use crate::variadic;

/// Copyable handle to an invokable target plus its bound arguments.
///
/// A default-constructed callback is invalid: calling it does nothing and
/// yields an invalid value. Binding produces a new callback and never touches
/// the original; invoking never mutates the callback.
#[derive(Clone, Default)]
pub struct Callback {
    target: Option<Arc<dyn Target>>,
    layers: Vec<Arc<[BoundSlot]>>,
}

impl Callback {
    /// The invalid callback.
    pub fn invalid() -> Self {
        Self::default()
    }

    fn from_target(target: impl Target + 'static) -> Self {
        Self {
            target: Some(Arc::new(target)),
            layers: Vec::new(),
        }
    }

    /// Wraps a free function or closure of up to eight parameters.
    pub fn from_fn<F, M>(function: F) -> Self
    where
        F: Function<M>,
        M: 'static,
    {
        Self::from_target(FnTarget::new(F::signature(), move |registry: &Registry, args| {
            function.invoke(registry, args)
        }))
    }

    /// Wraps a method called on `instance`.
    ///
    /// The callback keeps a weak reference only. Calling it after the last
    /// strong reference is gone fails with `InstanceDropped`.
    pub fn from_method<T, F, M>(instance: &Arc<T>, method: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Method<T, M>,
        M: 'static,
    {
        Self::from_target(MethodTarget::new(Arc::downgrade(instance), method))
    }

    /// Wraps a mutating method called on `instance` under its lock.
    pub fn from_method_mut<T, F, M>(instance: &Arc<Mutex<T>>, method: F) -> Self
    where
        T: Send + 'static,
        F: MethodMut<T, M>,
        M: 'static,
    {
        Self::from_target(MethodMutTarget::new(Arc::downgrade(instance), method))
    }

    /// Wraps a closure receiving every argument as one list.
    pub fn variadic<F, R>(function: F) -> Self
    where
        F: Fn(ValueList) -> R + Send + Sync + 'static,
        R: Any + Clone + Send + Sync,
    {
        let shape = VariadicShape::NoExtra;
        Self::from_target(FnTarget::new(
            Signature::variadic(shape, TypeTag::of::<R>()),
            move |registry: &Registry, args| {
                let split = variadic::split::<()>(shape, registry, args)?;
                Ok(Value::wrap(function(split.collected)))
            },
        ))
    }

    /// Wraps a closure receiving the first argument as `L` and the rest as
    /// a list.
    pub fn variadic_leading<F, L, R>(function: F) -> Self
    where
        F: Fn(L, ValueList) -> R + Send + Sync + 'static,
        L: Any + Clone + Send + Sync,
        R: Any + Clone + Send + Sync,
    {
        let shape = VariadicShape::LeadingExtra(TypeTag::of::<L>());
        Self::from_target(FnTarget::new(
            Signature::variadic(shape, TypeTag::of::<R>()),
            move |registry: &Registry, args| {
                let split = variadic::split::<L>(shape, registry, args)?;
                let extra = split.extra.ok_or(CallbackError::MissingVariadicExtra)?;
                Ok(Value::wrap(function(extra, split.collected)))
            },
        ))
    }

    /// Wraps a closure receiving the last argument as `L` and the others as
    /// a list.
    pub fn variadic_trailing<F, L, R>(function: F) -> Self
    where
        F: Fn(ValueList, L) -> R + Send + Sync + 'static,
        L: Any + Clone + Send + Sync,
        R: Any + Clone + Send + Sync,
    {
        let shape = VariadicShape::TrailingExtra(TypeTag::of::<L>());
        Self::from_target(FnTarget::new(
            Signature::variadic(shape, TypeTag::of::<R>()),
            move |registry: &Registry, args| {
                let split = variadic::split::<L>(shape, registry, args)?;
                let extra = split.extra.ok_or(CallbackError::MissingVariadicExtra)?;
                Ok(Value::wrap(function(split.collected, extra)))
            },
        ))
    }

    /// Wraps an already erased body with an explicit signature.
    pub(crate) fn from_erased<G>(signature: Signature, body: G) -> Self
    where
        G: Fn(&Registry, ValueList) -> CallbackResult<Value> + Send + Sync + 'static,
    {
        Self::from_target(FnTarget::new(signature, body))
    }

    pub fn is_valid(&self) -> bool {
        self.target.is_some()
    }

    /// Signature of the wrapped target, ignoring bound arguments.
    pub fn signature(&self) -> Option<&Signature> {
        self.target.as_deref().map(|target| target.signature())
    }

    /// Binding layers, innermost first.
    pub fn bound_layers(&self) -> &[Arc<[BoundSlot]>] {
        &self.layers
    }

    /// Returns a new callback with `args` bound on top of any existing
    /// binding. Shape errors surface at call time, not here.
    pub fn bind<I>(&self, args: I) -> Callback
    where
        I: IntoIterator,
        I::Item: Into<BoundArg>,
    {
        let slots: Vec<BoundSlot> = args
            .into_iter()
            .map(|arg| arg.into().into_slot())
            .collect();
        let mut bound = self.clone();
        if !slots.is_empty() {
            bound.layers.push(Arc::from(slots));
        }
        bound
    }

    /// Expected count at each binding level, from the target outwards.
    fn level_counts(&self) -> Vec<Option<usize>> {
        let mut counts = Vec::with_capacity(self.layers.len() + 1);
        let mut count = self.signature().and_then(Signature::arity);
        counts.push(count);
        for layer in &self.layers {
            count = binding::argument_count(layer, count);
            counts.push(count);
        }
        counts
    }

    /// Number of call-time arguments this callback needs. `None` for
    /// variadic targets; `Some(0)` for the invalid callback.
    pub fn argument_count(&self) -> Option<usize> {
        if !self.is_valid() {
            return Some(0);
        }
        self.level_counts().last().copied().flatten()
    }

    /// The argument list the target receives for `args`.
    pub fn resolve(&self, args: &[Value]) -> CallbackResult<ValueList> {
        let counts = self.level_counts();
        let mut effective = args.to_vec();
        for (depth, layer) in self.layers.iter().enumerate().rev() {
            effective = binding::resolve(layer, &effective, counts[depth])?;
        }
        Ok(effective)
    }

    /// Invokes against the process-wide registry. Every failure collapses to
    /// an invalid value.
    pub fn call(&self, args: &[Value]) -> Value {
        self.call_in(&registry::global(), args)
    }

    /// Invokes against `registry`. Every failure collapses to an invalid
    /// value.
    pub fn call_in(&self, registry: &Registry, args: &[Value]) -> Value {
        match self.try_call_in(registry, args) {
            Ok(value) => value,
            Err(error) => {
                debug!(
                    code = %error.code(),
                    binding = error.is_binding_error(),
                    %error,
                    "callback invocation failed"
                );
                Value::invalid()
            }
        }
    }

    /// Invokes against the process-wide registry, reporting failures.
    pub fn try_call(&self, args: &[Value]) -> CallbackResult<Value> {
        self.try_call_in(&registry::global(), args)
    }

    /// Invokes against `registry`, reporting failures.
    pub fn try_call_in(&self, registry: &Registry, args: &[Value]) -> CallbackResult<Value> {
        let target = self.target.as_deref().ok_or(CallbackError::InvalidTarget)?;
        let effective = self.resolve(args)?;
        target.invoke(registry, effective)
    }
}

impl PartialEq for Callback {
    /// Same target and same bound arguments. Stateless targets compare by
    /// function identity (and instance, for methods); stateful closures only
    /// equal copies of the same callback.
    fn eq(&self, other: &Self) -> bool {
        let same_target = match (&self.target, &other.target) {
            (None, None) => true,
            (Some(a), Some(b)) => match (a.identity(), b.identity()) {
                (Some(a), Some(b)) => a == b,
                _ => Arc::ptr_eq(a, b),
            },
            _ => false,
        };
        same_target && self.layers == other.layers
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.signature() {
            None => f.write_str("Callback(<invalid>)"),
            Some(signature) => f
                .debug_struct("Callback")
                .field("signature", &format_args!("{}", signature))
                .field("layers", &self.layers)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::placeholders::*;
    use dynacall_value::{values, Builtins};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        Builtins::all().install(&mut registry);
        registry
    }

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    fn sum3(a: i64, b: i64, c: i64) -> i64 {
        a * 100 + b * 10 + c
    }

    #[test]
    fn test_invalid_callback() {
        let cb = Callback::default();
        assert!(!cb.is_valid());
        assert_eq!(cb.argument_count(), Some(0));
        assert_eq!(cb.try_call_in(&registry(), &[]), Err(CallbackError::InvalidTarget));
        assert!(!cb.call_in(&registry(), &values![1_i64]).is_valid());
        assert_eq!(format!("{:?}", cb), "Callback(<invalid>)");
    }

    #[test]
    fn test_argument_count_through_layers() {
        let cb = Callback::from_fn(sum3);
        assert_eq!(cb.argument_count(), Some(3));
        assert_eq!(cb.bind([BoundArg::new(1_i64)]).argument_count(), Some(2));
        assert_eq!(cb.bind([_3, _2, _1]).argument_count(), Some(3));
        assert_eq!(cb.bind([_1]).bind([BoundArg::new(5_i64)]).argument_count(), Some(2));
        assert_eq!(Callback::variadic(|l: ValueList| l.len()).argument_count(), None);
    }

    #[test]
    fn test_rebinding_composes() {
        let registry = registry();
        let reversed = Callback::from_fn(sum3).bind([_3, _2, _1]);
        // The outer layer resolves against the new call's arguments
        let rebound = reversed.bind([BoundArg::new(_2), BoundArg::new(_1), BoundArg::new(9_i64)]);
        let out = rebound.call_in(&registry, &values![1_i64, 2_i64]);
        // outer: (2, 1, 9), inner reverses: (9, 1, 2)
        assert_eq!(out.downcast_ref::<i64>(), Some(&912));
    }

    #[test]
    fn test_bind_leaves_original_untouched() {
        let cb = Callback::from_fn(add);
        let bound = cb.bind([BoundArg::new(1_i32)]);
        assert!(cb.bound_layers().is_empty());
        assert_eq!(bound.bound_layers().len(), 1);
        assert_ne!(cb, bound);
    }

    #[test]
    fn test_equality() {
        assert_eq!(Callback::from_fn(add), Callback::from_fn(add));
        assert_ne!(Callback::from_fn(add), Callback::from_fn(sum3));
        assert_eq!(Callback::invalid(), Callback::default());
        assert_ne!(Callback::invalid(), Callback::from_fn(add));

        let offset = 3;
        let closure = Callback::from_fn(move |x: i32| x + offset);
        assert_eq!(closure, closure.clone());
        assert_ne!(closure, Callback::from_fn(move |x: i32| x + offset));

        assert_eq!(
            Callback::from_fn(add).bind([BoundArg::new(1_i32)]),
            Callback::from_fn(add).bind([BoundArg::new(1_i32)])
        );
        assert_ne!(
            Callback::from_fn(add).bind([BoundArg::new(1_i32)]),
            Callback::from_fn(add).bind([BoundArg::new(2_i32)])
        );
    }

    #[test]
    fn test_method_equality_uses_instance() {
        struct Gauge(i64);
        fn read(g: &Gauge) -> i64 {
            g.0
        }

        let a = Arc::new(Gauge(1));
        let b = Arc::new(Gauge(1));
        assert_eq!(Callback::from_method(&a, read), Callback::from_method(&a, read));
        assert_ne!(Callback::from_method(&a, read), Callback::from_method(&b, read));
    }

    #[test]
    fn test_debug_shows_signature() {
        let cb = Callback::from_fn(add);
        let debug = format!("{:?}", cb);
        assert!(debug.contains("fn(i32, i32) -> i32"), "{}", debug);
    }
}
