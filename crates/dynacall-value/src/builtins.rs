//! Built-in registrations.
//!
//! The core group (always installed) makes the primitive types, `String`,
//! `ValueList` and `ValueMap` comparable and registers list/map iteration for
//! the dynamic containers. The optional groups add coercions between them.

use std::collections::HashMap;

use crate::registry::{Comparison, Registry};
use crate::type_tag::TypeTag;
use crate::value::{Value, ValueList, ValueMap};

/// Selection of built-in registration groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    /// Integer, float, `bool` and `char` coercions.
    pub numeric: bool,
    /// Coercions between scalars and `String`/`&'static str`.
    pub text: bool,
    /// Coercions between scalars and `serde_json::Value`. Ignored without the
    /// `json` feature.
    pub json: bool,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::all()
    }
}

impl Builtins {
    pub fn all() -> Self {
        Self {
            numeric: true,
            text: true,
            json: true,
        }
    }

    /// Only the core group.
    pub fn core() -> Self {
        Self {
            numeric: false,
            text: false,
            json: false,
        }
    }

    /// Installs the selected groups into `registry`.
    pub fn install(&self, registry: &mut Registry) {
        install_core(registry);
        if self.numeric {
            install_numeric(registry);
        }
        if self.text {
            install_text(registry);
        }
        #[cfg(feature = "json")]
        if self.json {
            crate::json::install_json(registry);
        }
    }
}

macro_rules! comparable {
    ($registry:ident; $($ty:ty),* $(,)?) => {
        $( $registry.register_comparable::<$ty>(); )*
    };
}

/// Comparisons for scalars and the dynamic containers, plus container
/// iteration.
pub fn install_core(registry: &mut Registry) {
    comparable!(
        registry;
        i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
        String, &'static str, ()
    );
    registry.register_equatable::<ValueList>();
    registry.register_equatable::<ValueMap>();

    registry.register_list::<ValueList, Value>();
    registry.register_map::<ValueMap, String, Value>();
    registry.register_map::<HashMap<String, Value>, String, Value>();
    registry.register_list::<Vec<String>, String>();
    registry.register_list::<Vec<i64>, i64>();
    registry.register_list::<Vec<f64>, f64>();
}

macro_rules! int_to_int {
    ($registry:ident; $($from:ty),*) => {
        $( int_to_int!(@row $registry; $from; i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize); )*
    };
    (@row $registry:ident; $from:ty; $($to:ty),*) => {
        $( $registry.register_conversion::<$from, $to, _>(|v: &$from| <$to>::try_from(*v).ok()); )*
    };
}

/// Whether `v` is a whole number an integer of `bits` width can hold. `min`
/// is exact for every width; the upper bound is the exclusive power of two.
fn integral_in_range(v: f64, min: f64, bits: u32, signed: bool) -> bool {
    let upper = 2f64.powi((bits - u32::from(signed)) as i32);
    v.fract() == 0.0 && v >= min && v < upper
}

macro_rules! int_float_bool {
    ($registry:ident; $($int:ty),*) => {
        $(
            $registry.register_conversion::<$int, f64, _>(|v: &$int| Some(*v as f64));
            $registry.register_conversion::<$int, f32, _>(|v: &$int| Some(*v as f32));
            $registry.register_conversion::<f64, $int, _>(|v: &f64| {
                integral_in_range(*v, <$int>::MIN as f64, <$int>::BITS, <$int>::MIN != 0)
                    .then(|| *v as $int)
            });
            $registry.register_conversion::<f32, $int, _>(|v: &f32| {
                integral_in_range(f64::from(*v), <$int>::MIN as f64, <$int>::BITS, <$int>::MIN != 0)
                    .then(|| *v as $int)
            });
            $registry.register_conversion::<bool, $int, _>(|v: &bool| Some(<$int>::from(*v)));
            $registry.register_conversion::<$int, bool, _>(|v: &$int| Some(*v != 0));
        )*
    };
}

/// Checked numeric coercions.
///
/// Integer to integer conversions fail when the value does not fit the
/// target. Float to integer conversions fail unless the float is integral
/// and in range.
pub fn install_numeric(registry: &mut Registry) {
    int_to_int!(registry; i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
    int_float_bool!(registry; i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

    registry.register_into::<f32, f64>();
    registry.register_conversion::<f64, f32, _>(|v: &f64| {
        let narrowed = *v as f32;
        (f64::from(narrowed) == *v || v.is_nan()).then_some(narrowed)
    });
    registry.register_conversion::<bool, f64, _>(|v: &bool| Some(if *v { 1.0 } else { 0.0 }));
    registry.register_conversion::<f64, bool, _>(|v: &f64| Some(*v != 0.0));

    registry.register_into::<char, u32>();
    registry.register_conversion::<u32, char, _>(|v: &u32| char::from_u32(*v));
}

macro_rules! text_row {
    ($registry:ident; $($ty:ty),*) => {
        $(
            $registry.register_conversion::<$ty, String, _>(|v: &$ty| Some(v.to_string()));
            $registry.register_conversion::<String, $ty, _>(|s: &String| s.trim().parse::<$ty>().ok());
            $registry.register_conversion::<&'static str, $ty, _>(|s: &&'static str| s.trim().parse::<$ty>().ok());
        )*
    };
}

/// Coercions between scalars and text. Parsing trims surrounding whitespace.
pub fn install_text(registry: &mut Registry) {
    text_row!(
        registry;
        i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool
    );

    registry.register_conversion::<&'static str, String, _>(|s: &&'static str| Some(s.to_string()));
    registry.register_conversion::<char, String, _>(|c: &char| Some(c.to_string()));
    registry.register_conversion::<String, char, _>(|s: &String| {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    });

    // Mixed text comparisons go through the String self-comparison
    registry.register_comparison(
        TypeTag::of::<&'static str>(),
        TypeTag::of::<String>(),
        Comparison::builder::<&'static str, String>()
            .equal(|a, b| *a == b.as_str())
            .not_equal(|a, b| *a != b.as_str())
            .less_than(|a, b| *a < b.as_str())
            .greater_than(|a, b| *a > b.as_str())
            .less_equal(|a, b| *a <= b.as_str())
            .greater_equal(|a, b| *a >= b.as_str())
            .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(builtins: Builtins) -> Registry {
        let mut registry = Registry::new();
        builtins.install(&mut registry);
        registry
    }

    #[test]
    fn test_core_only_has_no_coercions() {
        let registry = registry(Builtins::core());
        assert!(registry.equal(&Value::from(1_i64), &Value::from(1_i64)));
        assert!(registry.convert_to::<i32>(&Value::from(1_i64)).is_none());
        assert!(registry.is_list(&Value::from(vec![Value::from(1_i64)])));
        assert!(registry.is_map(&Value::from(ValueMap::new())));
    }

    #[test]
    fn test_int_conversions_are_checked() {
        let registry = registry(Builtins::all());
        assert_eq!(registry.convert_to::<u8>(&Value::from(200_i64)), Some(200));
        assert_eq!(registry.convert_to::<u8>(&Value::from(300_i64)), None);
        assert_eq!(registry.convert_to::<u32>(&Value::from(-1_i32)), None);
        assert_eq!(registry.convert_to::<i64>(&Value::from(7_u16)), Some(7));
    }

    #[test]
    fn test_float_to_int_requires_integral() {
        let registry = registry(Builtins::all());
        assert_eq!(registry.convert_to::<i32>(&Value::from(4.0_f64)), Some(4));
        assert_eq!(registry.convert_to::<i32>(&Value::from(4.5_f64)), None);
        assert_eq!(registry.convert_to::<u8>(&Value::from(-1.0_f64)), None);
        assert_eq!(registry.convert_to::<u8>(&Value::from(255.0_f64)), Some(255));
        assert_eq!(registry.convert_to::<u8>(&Value::from(256.0_f64)), None);
        assert_eq!(registry.convert_to::<i64>(&Value::from(2f64.powi(63))), None);
        assert_eq!(registry.convert_to::<i64>(&Value::from(-(2f64.powi(63)))), Some(i64::MIN));
        assert_eq!(registry.convert_to::<u64>(&Value::from(2f64.powi(64))), None);
        assert_eq!(registry.convert_to::<i32>(&Value::from(2f32.powi(31))), None);
        assert_eq!(registry.convert_to::<i32>(&Value::from(f64::NAN)), None);
        assert_eq!(registry.convert_to::<i32>(&Value::from(f64::INFINITY)), None);
        assert_eq!(registry.convert_to::<f64>(&Value::from(3_i64)), Some(3.0));
    }

    #[test]
    fn test_bool_and_char() {
        let registry = registry(Builtins::all());
        assert_eq!(registry.convert_to::<i32>(&Value::from(true)), Some(1));
        assert_eq!(registry.convert_to::<bool>(&Value::from(0_i64)), Some(false));
        assert_eq!(registry.convert_to::<u32>(&Value::from('A')), Some(65));
        assert_eq!(registry.convert_to::<char>(&Value::from(0x41_u32)), Some('A'));
    }

    #[test]
    fn test_text_round_trip() {
        let registry = registry(Builtins::all());
        assert_eq!(registry.convert_to::<i64>(&Value::from("5")), Some(5));
        assert_eq!(registry.convert_to::<i64>(&Value::from(" 42 ".to_string())), Some(42));
        assert_eq!(registry.convert_to::<String>(&Value::from(2.5_f64)), Some("2.5".to_string()));
        assert_eq!(registry.convert_to::<bool>(&Value::from("true")), Some(true));
        assert_eq!(registry.convert_to::<bool>(&Value::from("yes")), None);
        assert_eq!(registry.convert_to::<String>(&Value::from("x")), Some("x".to_string()));
        assert_eq!(registry.convert_to::<char>(&Value::from("xy".to_string())), None);
    }

    #[test]
    fn test_cross_type_numeric_comparison_uses_conversion() {
        let registry = registry(Builtins::all());
        // i64 self comparison after converting the i32 operand
        assert!(registry.equal(&Value::from(3_i64), &Value::from(3_i32)));
        assert!(registry.less_than(&Value::from(2_i64), &Value::from(3_u8)));
        assert!(registry.equal(&Value::from("a"), &Value::from("a".to_string())));
        assert!(registry.equal(&Value::from("a".to_string()), &Value::from("a")));
    }

    #[test]
    fn test_list_equality_is_element_wise() {
        let registry = registry(Builtins::all());
        let a = Value::from(vec![Value::from(1_i64), Value::from("x")]);
        let b = Value::from(vec![Value::from(1_i64), Value::from("x")]);
        assert!(registry.can_compare(&a, &b));
        assert!(registry.equal(&a, &b));
        assert!(!registry.less_than(&a, &b));
        assert!(registry.can_convert(TypeTag::of::<ValueList>(), TypeTag::of::<Value>()));
    }
}
