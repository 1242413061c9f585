//! Static signature of a callback target.

use std::fmt;

use dynacall_value::{TypeTag, Value, ValueList};

/// Arrangement of fixed and collected parameters of a variadic target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariadicShape {
    /// `(collected)`
    NoExtra,
    /// `(leading, collected)`
    LeadingExtra(TypeTag),
    /// `(collected, trailing)`
    TrailingExtra(TypeTag),
}

impl VariadicShape {
    /// Number of fixed parameters besides the collected list.
    pub fn fixed_count(&self) -> usize {
        match self {
            VariadicShape::NoExtra => 0,
            VariadicShape::LeadingExtra(_) | VariadicShape::TrailingExtra(_) => 1,
        }
    }
}

/// Parameter and return types of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<TypeTag>,
    pub ret: TypeTag,
    pub variadic: Option<VariadicShape>,
}

impl Signature {
    pub fn fixed(params: Vec<TypeTag>, ret: TypeTag) -> Self {
        Self {
            params,
            ret,
            variadic: None,
        }
    }

    pub fn variadic(shape: VariadicShape, ret: TypeTag) -> Self {
        let params = match shape {
            VariadicShape::NoExtra => vec![TypeTag::of::<ValueList>()],
            VariadicShape::LeadingExtra(extra) => vec![extra, TypeTag::of::<ValueList>()],
            VariadicShape::TrailingExtra(extra) => vec![TypeTag::of::<ValueList>(), extra],
        };
        Self {
            params,
            ret,
            variadic: Some(shape),
        }
    }

    /// Signature of a target whose `arity` parameters accept any value.
    pub fn dynamic(arity: Option<usize>, ret: TypeTag) -> Self {
        match arity {
            Some(n) => Self::fixed(vec![TypeTag::of::<Value>(); n], ret),
            None => Self::variadic(VariadicShape::NoExtra, ret),
        }
    }

    /// Parameter count of a fixed-arity target, `None` when variadic.
    pub fn arity(&self) -> Option<usize> {
        match self.variadic {
            Some(_) => None,
            None => Some(self.params.len()),
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }

    pub fn returns_void(&self) -> bool {
        self.ret.is::<()>()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.short_name()).collect();
        write!(f, "fn({})", params.join(", "))?;
        if self.is_variadic() {
            f.write_str("..")?;
        }
        if !self.returns_void() {
            write!(f, " -> {}", self.ret.short_name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let sig = Signature::fixed(
            vec![TypeTag::of::<i32>(), TypeTag::of::<String>()],
            TypeTag::of::<bool>(),
        );
        assert_eq!(sig.to_string(), "fn(i32, String) -> bool");
        assert_eq!(sig.arity(), Some(2));

        let void = Signature::fixed(vec![], TypeTag::of::<()>());
        assert_eq!(void.to_string(), "fn()");
        assert!(void.returns_void());
    }

    #[test]
    fn test_variadic_shapes() {
        let sig = Signature::variadic(VariadicShape::LeadingExtra(TypeTag::of::<i64>()), TypeTag::of::<()>());
        assert_eq!(sig.arity(), None);
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.variadic.map(|s| s.fixed_count()), Some(1));
    }
}
