//! Invokable targets behind a callback.
//!
//! Typed functions and methods are adapted to the uniform
//! `(registry, arguments) -> result` shape through the [`Function`],
//! [`Method`] and [`MethodMut`] traits, implemented for every `Fn` of up to
//! eight parameters. The marker parameter only disambiguates the arity; it
//! is always inferred.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use dynacall_error::{CallbackError, CallbackResult};
use dynacall_value::{Registry, TypeTag, Value, ValueList};
use parking_lot::Mutex;

use crate::signature::Signature;

/// What makes two targets the same for callback equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Identity {
    /// A stateless function item or closure, identified by its type.
    Function(TypeId),
    /// A stateless method on a particular instance.
    Method { method: TypeId, instance: usize },
}

/// Uniform, type-erased view of a target.
pub(crate) trait Target: Send + Sync {
    fn signature(&self) -> &Signature;

    /// Converts `args` to the parameter types and runs the target. The
    /// argument count has not been checked yet.
    fn invoke(&self, registry: &Registry, args: ValueList) -> CallbackResult<Value>;

    /// `None` for targets that are only equal to themselves.
    fn identity(&self) -> Option<Identity>;
}

fn stateless<F: 'static>() -> Option<TypeId> {
    (std::mem::size_of::<F>() == 0).then(TypeId::of::<F>)
}

/// Extracts parameter `position` as a `T`.
///
/// A `Value` parameter takes the argument as-is, invalid values included.
/// Any other parameter type goes through the registry.
pub(crate) fn extract<T: Any + Clone + Send + Sync>(
    registry: &Registry,
    value: &Value,
    position: usize,
) -> CallbackResult<T> {
    if TypeId::of::<T>() == TypeId::of::<Value>() {
        let mut slot = Some(value.clone());
        if let Some(out) = (&mut slot as &mut dyn Any).downcast_mut::<Option<T>>() {
            if let Some(out) = out.take() {
                return Ok(out);
            }
        }
    }
    registry
        .convert_to::<T>(value)
        .ok_or(CallbackError::Conversion {
            position,
            from: value.type_name(),
            to: type_name::<T>(),
        })
}

/// Argument stream handed to the generated adapters.
pub(crate) struct Arguments<'r> {
    registry: &'r Registry,
    expected: usize,
    args: std::iter::Enumerate<std::vec::IntoIter<Value>>,
}

impl<'r> Arguments<'r> {
    fn new(registry: &'r Registry, args: ValueList, expected: usize) -> CallbackResult<Self> {
        dynacall_error::ensure!(args.len() == expected, CallbackError::arity(expected, args.len()));
        Ok(Self {
            registry,
            expected,
            args: args.into_iter().enumerate(),
        })
    }

    fn next<T: Any + Clone + Send + Sync>(&mut self) -> CallbackResult<T> {
        let (position, value) = self
            .args
            .next()
            .ok_or(CallbackError::arity(self.expected, self.expected))?;
        extract::<T>(self.registry, &value, position)
    }
}

/// A free function or closure taking typed parameters.
pub trait Function<Marker>: Send + Sync + 'static {
    fn signature() -> Signature;
    fn invoke(&self, registry: &Registry, args: ValueList) -> CallbackResult<Value>;
}

/// A function taking `&T` first, bound to an instance at call time.
pub trait Method<T, Marker>: Send + Sync + 'static {
    fn signature() -> Signature;
    fn invoke_on(&self, instance: &T, registry: &Registry, args: ValueList) -> CallbackResult<Value>;
}

/// A function taking `&mut T` first, bound to an instance at call time.
pub trait MethodMut<T, Marker>: Send + Sync + 'static {
    fn signature() -> Signature;
    fn invoke_on(&self, instance: &mut T, registry: &Registry, args: ValueList) -> CallbackResult<Value>;
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_targets {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> Function<fn($($arg,)*) -> R> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Any + Clone + Send + Sync,
            $($arg: Any + Clone + Send + Sync,)*
        {
            fn signature() -> Signature {
                Signature::fixed(vec![$(TypeTag::of::<$arg>()),*], TypeTag::of::<R>())
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke(&self, registry: &Registry, args: ValueList) -> CallbackResult<Value> {
                let mut args = Arguments::new(registry, args, count!($($arg)*))?;
                $( let $arg = args.next::<$arg>()?; )*
                Ok(Value::wrap(self($($arg),*)))
            }
        }

        impl<F, T, R, $($arg,)*> Method<T, fn(&T, $($arg,)*) -> R> for F
        where
            F: Fn(&T, $($arg),*) -> R + Send + Sync + 'static,
            T: 'static,
            R: Any + Clone + Send + Sync,
            $($arg: Any + Clone + Send + Sync,)*
        {
            fn signature() -> Signature {
                Signature::fixed(vec![$(TypeTag::of::<$arg>()),*], TypeTag::of::<R>())
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke_on(&self, instance: &T, registry: &Registry, args: ValueList) -> CallbackResult<Value> {
                let mut args = Arguments::new(registry, args, count!($($arg)*))?;
                $( let $arg = args.next::<$arg>()?; )*
                Ok(Value::wrap(self(instance, $($arg),*)))
            }
        }

        impl<F, T, R, $($arg,)*> MethodMut<T, fn(&mut T, $($arg,)*) -> R> for F
        where
            F: Fn(&mut T, $($arg),*) -> R + Send + Sync + 'static,
            T: 'static,
            R: Any + Clone + Send + Sync,
            $($arg: Any + Clone + Send + Sync,)*
        {
            fn signature() -> Signature {
                Signature::fixed(vec![$(TypeTag::of::<$arg>()),*], TypeTag::of::<R>())
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke_on(&self, instance: &mut T, registry: &Registry, args: ValueList) -> CallbackResult<Value> {
                let mut args = Arguments::new(registry, args, count!($($arg)*))?;
                $( let $arg = args.next::<$arg>()?; )*
                Ok(Value::wrap(self(instance, $($arg),*)))
            }
        }
    };
}

impl_targets!();
impl_targets!(A1);
impl_targets!(A1, A2);
impl_targets!(A1, A2, A3);
impl_targets!(A1, A2, A3, A4);
impl_targets!(A1, A2, A3, A4, A5);
impl_targets!(A1, A2, A3, A4, A5, A6);
impl_targets!(A1, A2, A3, A4, A5, A6, A7);
impl_targets!(A1, A2, A3, A4, A5, A6, A7, A8);

//-----------------------------------------------------------------------------
// Concrete targets
//-----------------------------------------------------------------------------

/// Target running an erased body. Used for free functions, closures,
/// variadic targets and the reflection wrappers.
pub(crate) struct FnTarget<G> {
    signature: Signature,
    body: G,
}

impl<G> FnTarget<G>
where
    G: Fn(&Registry, ValueList) -> CallbackResult<Value> + Send + Sync + 'static,
{
    pub(crate) fn new(signature: Signature, body: G) -> Self {
        Self { signature, body }
    }
}

impl<G> Target for FnTarget<G>
where
    G: Fn(&Registry, ValueList) -> CallbackResult<Value> + Send + Sync + 'static,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn invoke(&self, registry: &Registry, args: ValueList) -> CallbackResult<Value> {
        (self.body)(registry, args)
    }

    fn identity(&self) -> Option<Identity> {
        stateless::<G>().map(Identity::Function)
    }
}

/// Method bound to an instance it does not own.
pub(crate) struct MethodTarget<T, F, M> {
    instance: Weak<T>,
    method: F,
    signature: Signature,
    _marker: PhantomData<fn() -> M>,
}

impl<T, F, M> MethodTarget<T, F, M>
where
    F: Method<T, M>,
{
    pub(crate) fn new(instance: Weak<T>, method: F) -> Self {
        Self {
            instance,
            method,
            signature: F::signature(),
            _marker: PhantomData,
        }
    }
}

impl<T, F, M> Target for MethodTarget<T, F, M>
where
    T: Send + Sync + 'static,
    F: Method<T, M>,
    M: 'static,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn invoke(&self, registry: &Registry, args: ValueList) -> CallbackResult<Value> {
        let instance = self
            .instance
            .upgrade()
            .ok_or(CallbackError::InstanceDropped(type_name::<T>()))?;
        self.method.invoke_on(&instance, registry, args)
    }

    fn identity(&self) -> Option<Identity> {
        stateless::<F>().map(|method| Identity::Method {
            method,
            instance: self.instance.as_ptr() as *const () as usize,
        })
    }
}

thread_local! {
    static LOCKED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks an instance as locked by the current thread until dropped.
struct Reentry(usize);

impl Reentry {
    /// `None` when this thread already holds the instance's lock.
    fn enter(address: usize) -> Option<Self> {
        LOCKED.with(|locked| {
            let mut locked = locked.borrow_mut();
            if locked.contains(&address) {
                return None;
            }
            locked.push(address);
            Some(Reentry(address))
        })
    }
}

impl Drop for Reentry {
    fn drop(&mut self) {
        LOCKED.with(|locked| locked.borrow_mut().retain(|a| *a != self.0));
    }
}

/// Mutating method bound to a lockable instance it does not own. The lock
/// is held for the duration of the call; re-entering the same instance from
/// inside the call fails with `InstanceBusy` instead of deadlocking.
pub(crate) struct MethodMutTarget<T, F, M> {
    instance: Weak<Mutex<T>>,
    method: F,
    signature: Signature,
    _marker: PhantomData<fn() -> M>,
}

impl<T, F, M> MethodMutTarget<T, F, M>
where
    F: MethodMut<T, M>,
{
    pub(crate) fn new(instance: Weak<Mutex<T>>, method: F) -> Self {
        Self {
            instance,
            method,
            signature: F::signature(),
            _marker: PhantomData,
        }
    }
}

impl<T, F, M> Target for MethodMutTarget<T, F, M>
where
    T: Send + 'static,
    F: MethodMut<T, M>,
    M: 'static,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn invoke(&self, registry: &Registry, args: ValueList) -> CallbackResult<Value> {
        let instance = self
            .instance
            .upgrade()
            .ok_or(CallbackError::InstanceDropped(type_name::<T>()))?;
        let address = Arc::as_ptr(&instance) as *const () as usize;
        let _entered = Reentry::enter(address).ok_or(CallbackError::InstanceBusy(type_name::<T>()))?;
        let mut guard = instance.lock();
        self.method.invoke_on(&mut guard, registry, args)
    }

    fn identity(&self) -> Option<Identity> {
        stateless::<F>().map(|method| Identity::Method {
            method,
            instance: self.instance.as_ptr() as *const () as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynacall_value::Builtins;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        Builtins::all().install(&mut registry);
        registry
    }

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    fn args(values: &[Value]) -> ValueList {
        values.to_vec()
    }

    #[test]
    fn test_function_signature() {
        let sig = <fn(i32, i32) -> i32 as Function<fn(i32, i32) -> i32>>::signature();
        assert_eq!(sig.to_string(), "fn(i32, i32) -> i32");
    }

    #[test]
    fn test_function_invoke_converts_arguments() {
        let registry = registry();
        let out = Function::invoke(&add, &registry, args(&[Value::from("5"), Value::from(4_i64)]));
        assert_eq!(out.unwrap().downcast_ref::<i32>(), Some(&9));
    }

    #[test]
    fn test_function_invoke_checks_arity() {
        let registry = registry();
        let err = Function::invoke(&add, &registry, args(&[Value::from(1_i32)])).unwrap_err();
        assert_eq!(err, CallbackError::arity(2, 1));
    }

    #[test]
    fn test_conversion_failure_reports_position() {
        let registry = registry();
        let err = Function::invoke(&add, &registry, args(&[Value::from(1_i32), Value::from("x")]))
            .unwrap_err();
        assert_eq!(
            err,
            CallbackError::Conversion { position: 1, from: "&str", to: "i32" }
        );
    }

    #[test]
    fn test_value_parameter_accepts_invalid() {
        let registry = registry();
        let is_valid = |v: Value| v.is_valid();
        let out = Function::invoke(&is_valid, &registry, args(&[Value::invalid()])).unwrap();
        assert_eq!(out.downcast_ref::<bool>(), Some(&false));
    }

    #[test]
    fn test_method_target_holds_weak_instance() {
        struct Counter(i64);
        fn plus(c: &Counter, n: i64) -> i64 {
            c.0 + n
        }

        let registry = registry();
        let instance = std::sync::Arc::new(Counter(40));
        let target = MethodTarget::new(std::sync::Arc::downgrade(&instance), plus);
        let out = target.invoke(&registry, args(&[Value::from(2_i64)])).unwrap();
        assert_eq!(out.downcast_ref::<i64>(), Some(&42));

        drop(instance);
        let err = target.invoke(&registry, args(&[Value::from(2_i64)])).unwrap_err();
        assert!(matches!(err, CallbackError::InstanceDropped(_)));
    }

    #[test]
    fn test_stateless_identity() {
        let a = FnTarget::new(Signature::dynamic(Some(0), TypeTag::of::<()>()), |_: &Registry, _| {
            Ok(Value::void())
        });
        assert!(a.identity().is_some());

        let captured = 5_i64;
        let b = FnTarget::new(Signature::dynamic(Some(0), TypeTag::of::<i64>()), move |_: &Registry, _| {
            Ok(Value::from(captured))
        });
        assert!(b.identity().is_none());
    }
}
