//! Bridge between dynamic values and `serde_json::Value`.

use serde_json::{Map, Number, Value as Json};

use crate::registry::{self, Registry};
use crate::value::{Value, ValueList, ValueMap};

/// Converts a JSON document to a dynamic value.
///
/// `null` becomes the invalid value, numbers become `i64`, `u64` or `f64`
/// (first that fits), arrays become `ValueList` and objects `ValueMap`.
pub fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::invalid(),
        Json::Bool(b) => Value::from(*b),
        Json::Number(n) => number_value(n),
        Json::String(s) => Value::from(s.clone()),
        Json::Array(items) => Value::from(items.iter().map(from_json).collect::<ValueList>()),
        Json::Object(fields) => Value::from(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), from_json(field)))
                .collect::<ValueMap>(),
        ),
    }
}

fn number_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64().map(Value::from).unwrap_or_default()
    }
}

/// Converts a dynamic value to JSON through the process-wide registry.
pub fn to_json(value: &Value) -> Option<Json> {
    to_json_in(&registry::global(), value)
}

/// Converts a dynamic value to JSON.
///
/// The invalid value maps to `null`. Lists and maps are converted element by
/// element; any element without a JSON form makes the whole conversion fail.
pub fn to_json_in(registry: &Registry, value: &Value) -> Option<Json> {
    if !value.is_valid() {
        return Some(Json::Null);
    }
    if let Some(json) = value.downcast_ref::<Json>() {
        return Some(json.clone());
    }
    if registry.is_map(value) {
        return registry
            .to_map(value)
            .iter()
            .map(|(key, field)| to_json_in(registry, field).map(|json| (key.clone(), json)))
            .collect::<Option<Map<String, Json>>>()
            .map(Json::Object);
    }
    if registry.is_list(value) {
        return registry
            .to_list(value)
            .iter()
            .map(|item| to_json_in(registry, item))
            .collect::<Option<Vec<Json>>>()
            .map(Json::Array);
    }
    registry.convert_to::<Json>(value)
}

macro_rules! into_json {
    ($registry:ident; $($ty:ty),*) => {
        $( $registry.register_into::<$ty, Json>(); )*
    };
}

macro_rules! from_json_int {
    ($registry:ident; $($ty:ty),*) => {
        $(
            $registry.register_conversion::<Json, $ty, _>(|json: &Json| match json {
                Json::Number(n) => n
                    .as_i64()
                    .and_then(|i| <$ty>::try_from(i).ok())
                    .or_else(|| n.as_u64().and_then(|u| <$ty>::try_from(u).ok())),
                _ => None,
            });
        )*
    };
}

/// Scalar coercions to and from `serde_json::Value`, plus JSON arrays and
/// objects to `ValueList` and `ValueMap`.
pub fn install_json(registry: &mut Registry) {
    registry.register_equatable::<Json>();

    into_json!(registry; i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String, &'static str);
    from_json_int!(registry; i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

    registry.register_conversion::<Json, f64, _>(Json::as_f64);
    registry.register_conversion::<Json, bool, _>(Json::as_bool);
    registry.register_conversion::<Json, String, _>(|json: &Json| json.as_str().map(str::to_owned));
    registry.register_conversion::<Json, ValueList, _>(|json: &Json| {
        json.as_array().map(|items| items.iter().map(from_json).collect())
    });
    registry.register_conversion::<Json, ValueMap, _>(|json: &Json| {
        json.as_object().map(|fields| {
            fields
                .iter()
                .map(|(key, field)| (key.clone(), from_json(field)))
                .collect()
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        crate::builtins::Builtins::all().install(&mut registry);
        registry
    }

    #[test]
    fn test_from_json_shapes() {
        let value = from_json(&json!({ "n": 1, "f": 1.5, "s": "x", "l": [true, null] }));
        let map = value.downcast_ref::<ValueMap>().unwrap();
        assert_eq!(map["n"].downcast_ref::<i64>(), Some(&1));
        assert_eq!(map["f"].downcast_ref::<f64>(), Some(&1.5));
        assert_eq!(map["s"].downcast_ref::<String>(), Some(&"x".to_string()));

        let list = map["l"].downcast_ref::<ValueList>().unwrap();
        assert_eq!(list[0].downcast_ref::<bool>(), Some(&true));
        assert!(!list[1].is_valid());
    }

    #[test]
    fn test_to_json_recurses_into_containers() {
        let registry = registry();
        let mut map = ValueMap::new();
        map.insert("a".into(), Value::from(vec![Value::from(1_i32), Value::from("two")]));
        map.insert("b".into(), Value::invalid());

        let json = to_json_in(&registry, &Value::from(map)).unwrap();
        assert_eq!(json, json!({ "a": [1, "two"], "b": null }));
    }

    #[test]
    fn test_to_json_fails_on_opaque_payload() {
        #[derive(Clone)]
        struct Opaque;
        let registry = registry();
        assert!(to_json_in(&registry, &Value::wrap(Opaque)).is_none());
    }

    #[test]
    fn test_json_scalar_coercions() {
        let registry = registry();
        let number = Value::wrap(json!(300));
        assert_eq!(registry.convert_to::<i64>(&number), Some(300));
        assert_eq!(registry.convert_to::<u8>(&number), None);
        assert_eq!(registry.convert_to::<String>(&Value::wrap(json!("s"))), Some("s".into()));

        let list = registry.convert_to::<ValueList>(&Value::wrap(json!([1, 2]))).unwrap();
        assert_eq!(list.len(), 2);
    }
}
