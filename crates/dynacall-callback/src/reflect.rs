//! Seam for reflection layers that hand out callbacks for named methods.
//!
//! A reflection layer describes a method with a [`MethodHandle`]: its name,
//! the names of its arguments, an optional [`Guard`] and a creator producing
//! a callback for an opaque instance and a requested [`InvokeAction`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dynacall_error::{CallbackError, CallbackResult};
use dynacall_value::{Registry, TypeTag, Value, ValueList};

use crate::callback::Callback;
use crate::signature::Signature;
use crate::target::Method;

/// Opaque instance handed to a creator.
pub type InstanceRef = Arc<dyn Any + Send + Sync>;

/// Produces the callback for an instance and requested action.
pub type Creator = Arc<dyn Fn(Option<InstanceRef>, InvokeAction) -> Callback + Send + Sync>;

/// Produces the plain method callback for an instance.
pub type MethodFactory = Arc<dyn Fn(Option<InstanceRef>) -> Callback + Send + Sync>;

#[derive(Clone)]
enum Source {
    Creator(Creator),
    Factory(MethodFactory),
}

/// How a reflected method is to be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeAction {
    /// Evaluate the guard, then invoke the method if it passed.
    Invoke,
    /// Invoke the method without evaluating the guard.
    UnsafeInvoke,
    /// Evaluate the guard only and return its result as a `bool` value.
    ArgumentTest,
}

/// Precondition attached to a reflected method.
///
/// The guard callback receives the same arguments as the method. It passes
/// when it returns something convertible to `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Guard(Callback);

impl Guard {
    pub fn new(callback: Callback) -> Self {
        Self(callback)
    }

    pub fn callback(&self) -> &Callback {
        &self.0
    }

    /// Evaluates the guard. Results without a `bool` form count as `false`.
    pub fn check(&self, registry: &Registry, args: &[Value]) -> CallbackResult<bool> {
        let result = self.0.try_call_in(registry, args)?;
        Ok(registry.convert_to::<bool>(&result).unwrap_or(false))
    }
}

/// Description of a reflected method and the means to call it.
#[derive(Clone)]
pub struct MethodHandle {
    name: String,
    return_type: &'static str,
    argument_names: Vec<String>,
    guard: Option<Guard>,
    source: Source,
}

impl MethodHandle {
    /// Handle with a hand-written creator. The creator is responsible for
    /// honouring the requested action.
    pub fn new<C>(name: impl Into<String>, creator: C) -> Self
    where
        C: Fn(Option<InstanceRef>, InvokeAction) -> Callback + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            return_type: "",
            argument_names: Vec::new(),
            guard: None,
            source: Source::Creator(Arc::new(creator)),
        }
    }

    /// Handle whose factory only knows how to build the plain callback for
    /// an instance. Guard handling for the three actions is added on top,
    /// using the guard attached to the handle when the callback is created.
    pub fn from_callback_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Option<InstanceRef>) -> Callback + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            return_type: "",
            argument_names: Vec::new(),
            guard: None,
            source: Source::Factory(Arc::new(factory)),
        }
    }

    /// Handle for a method of `T`. The instance passed at creation time must
    /// be a `T`; anything else yields the invalid callback.
    pub fn for_method<T, F, M>(name: impl Into<String>, method: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Method<T, M> + Clone,
        M: 'static,
    {
        let return_type = F::signature().ret.name();
        Self::from_callback_factory(name, move |instance| {
            match instance.and_then(|i| i.downcast::<T>().ok()) {
                Some(instance) => Callback::from_method(&instance, method.clone()),
                None => Callback::invalid(),
            }
        })
        .with_return_type(return_type)
    }

    pub fn with_return_type(mut self, return_type: &'static str) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn with_argument_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argument_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches `guard`. Handles built by [`MethodHandle::from_callback_factory`]
    /// or [`MethodHandle::for_method`] evaluate it for `Invoke` and
    /// `ArgumentTest`.
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> &'static str {
        self.return_type
    }

    pub fn argument_names(&self) -> &[String] {
        &self.argument_names
    }

    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    /// Callback for `action` on `instance`.
    pub fn create(&self, instance: Option<InstanceRef>, action: InvokeAction) -> Callback {
        match &self.source {
            Source::Creator(creator) => creator(instance, action),
            Source::Factory(factory) => {
                let method = factory(instance);
                if !method.is_valid() {
                    return Callback::invalid();
                }
                wrap_action(self.name.clone(), self.guard.clone(), method, action)
            }
        }
    }

    pub fn callback(&self, instance: Option<InstanceRef>) -> Callback {
        self.create(instance, InvokeAction::Invoke)
    }

    pub fn unsafe_callback(&self, instance: Option<InstanceRef>) -> Callback {
        self.create(instance, InvokeAction::UnsafeInvoke)
    }

    pub fn test_callback(&self, instance: Option<InstanceRef>) -> Callback {
        self.create(instance, InvokeAction::ArgumentTest)
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandle")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("argument_names", &self.argument_names)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// Wraps `method` so that calling it performs `action`.
fn wrap_action(
    name: String,
    guard: Option<Guard>,
    method: Callback,
    action: InvokeAction,
) -> Callback {
    let arity = method.argument_count();
    match (action, guard) {
        (InvokeAction::UnsafeInvoke, _) | (InvokeAction::Invoke, None) => method,
        (InvokeAction::Invoke, Some(guard)) => {
            let ret = method.signature().map_or(TypeTag::of::<Value>(), |s| s.ret);
            let body = move |registry: &Registry, args: ValueList| -> CallbackResult<Value> {
                if !guard.check(registry, &args)? {
                    dynacall_error::bail!(CallbackError::GuardRejected { method: name.clone() });
                }
                method.try_call_in(registry, &args)
            };
            Callback::from_erased(Signature::dynamic(arity, ret), body)
        }
        (InvokeAction::ArgumentTest, guard) => {
            let body = move |registry: &Registry, args: ValueList| -> CallbackResult<Value> {
                let passed = match &guard {
                    Some(guard) => guard.check(registry, &args)?,
                    None => true,
                };
                Ok(Value::from(passed))
            };
            Callback::from_erased(Signature::dynamic(arity, TypeTag::of::<bool>()), body)
        }
    }
}
