//! Deep merge of partial settings onto defaults
//!
//! Every settings record in the crate (molecule, emitter, scene) is built the
//! same way: serialize the defaults to a JSON map, drop mistyped keys from the
//! supplied partial, merge the partial on top and decode the result.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Deep merge `source` onto `target`.
///
/// The result holds every key of `target`. Keys present in `source` win;
/// when both sides hold an object the merge recurses, anything else
/// (scalars, arrays, null) is replaced wholesale. A missing or non-object
/// `source` behaves as an empty map.
pub fn merge_deep(target: &Value, source: Option<&Value>) -> Value {
    let (Value::Object(target_map), Some(Value::Object(source_map))) = (target, source) else {
        return target.clone();
    };

    let mut output = target_map.clone();
    for (key, value) in source_map {
        let merged = match (target_map.get(key), value) {
            (Some(existing @ Value::Object(_)), Value::Object(_)) => merge_deep(existing, Some(value)),
            _ => value.clone(),
        };
        output.insert(key.clone(), merged);
    }
    Value::Object(output)
}

/// Strip keys from `partial` whose type disagrees with the same key in `defaults`.
///
/// Unknown keys pass through untouched. Integer fields accept integral floats
/// (`3.0`) but reject fractional or negative values.
pub fn conform(defaults: &Value, partial: &Value) -> Value {
    let (Value::Object(expected), Value::Object(supplied)) = (defaults, partial) else {
        return Value::Object(Map::new());
    };

    let mut output = Map::new();
    for (key, value) in supplied {
        match expected.get(key) {
            None => {
                output.insert(key.clone(), value.clone());
            }
            Some(default) => match conform_value(default, value) {
                Some(value) => {
                    output.insert(key.clone(), value);
                }
                None => {
                    tracing::debug!(key = %key, "Ignoring mistyped settings field");
                }
            },
        }
    }
    Value::Object(output)
}

fn conform_value(default: &Value, value: &Value) -> Option<Value> {
    match (default, value) {
        (Value::Object(_), Value::Object(_)) => Some(conform(default, value)),
        (Value::Number(expected), Value::Number(number)) => {
            if expected.is_f64() {
                return Some(value.clone());
            }
            if number.is_u64() {
                return Some(value.clone());
            }
            if number.is_i64() {
                return (!expected.is_u64()).then(|| value.clone());
            }
            let float = number.as_f64()?;
            if float.fract() == 0.0 && float >= 0.0 && float <= u32::MAX as f64 {
                Some(Value::from(float as u64))
            } else {
                None
            }
        }
        (Value::Bool(_), Value::Bool(_))
        | (Value::String(_), Value::String(_))
        | (Value::Array(_), Value::Array(_)) => Some(value.clone()),
        // Optional fields default to null and accept anything the decoder takes.
        (Value::Null, _) => Some(value.clone()),
        _ => None,
    }
}

/// Build a fully populated settings record from a partial JSON object.
///
/// Never fails: if the merged record still does not decode, the partial is
/// applied key by key and any key that breaks decoding is dropped.
pub fn decode_settings<T>(partial: Option<&Value>) -> T
where
    T: Default + Serialize + DeserializeOwned,
{
    let defaults = to_value_or_empty(&T::default());
    let Some(partial) = partial else {
        return T::default();
    };
    let conformed = conform(&defaults, partial);

    if let Ok(settings) = serde_json::from_value(merge_deep(&defaults, Some(&conformed))) {
        return settings;
    }

    let mut accepted = defaults.clone();
    if let Value::Object(fields) = &conformed {
        for (key, value) in fields {
            let mut single = Map::new();
            single.insert(key.clone(), value.clone());
            let candidate = merge_deep(&accepted, Some(&Value::Object(single)));
            if serde_json::from_value::<T>(candidate.clone()).is_ok() {
                accepted = candidate;
            } else {
                tracing::warn!(key = %key, "Dropping settings field that failed to decode");
            }
        }
    }
    serde_json::from_value(accepted).unwrap_or_default()
}

/// Serialize a settings record into a JSON map (empty on failure)
pub fn to_settings_map<T: Serialize>(settings: &T) -> Map<String, Value> {
    match to_value_or_empty(settings) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn to_value_or_empty<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::warn!("Failed to serialize settings: {}", e);
        Value::Object(Map::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Sample {
        size: f32,
        amount: u32,
        enabled: bool,
        label: String,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                size: 10.0,
                amount: 4,
                enabled: true,
                label: "default".to_string(),
            }
        }
    }

    #[test]
    fn test_merge_keeps_every_default_key() {
        let defaults = json!({"a": 1, "b": {"c": 2, "d": 3}, "e": [1, 2]});
        let merged = merge_deep(&defaults, Some(&json!({"a": 5})));
        assert_eq!(merged, json!({"a": 5, "b": {"c": 2, "d": 3}, "e": [1, 2]}));
    }

    #[test]
    fn test_merge_recurses_into_nested_objects() {
        let defaults = json!({"b": {"c": 2, "d": {"x": 1, "y": 2}}});
        let merged = merge_deep(&defaults, Some(&json!({"b": {"d": {"y": 9}}})));
        assert_eq!(merged, json!({"b": {"c": 2, "d": {"x": 1, "y": 9}}}));
    }

    #[test]
    fn test_merge_replaces_arrays_wholesale() {
        let defaults = json!({"e": [1, 2, 3]});
        let merged = merge_deep(&defaults, Some(&json!({"e": [7]})));
        assert_eq!(merged, json!({"e": [7]}));
    }

    #[test]
    fn test_merge_adds_unknown_keys() {
        let defaults = json!({"a": 1});
        let merged = merge_deep(&defaults, Some(&json!({"z": "new"})));
        assert_eq!(merged, json!({"a": 1, "z": "new"}));
    }

    #[test]
    fn test_merge_absent_partial_is_identity() {
        let defaults = json!({"a": 1, "b": {"c": 2}});
        assert_eq!(merge_deep(&defaults, None), defaults);
        assert_eq!(merge_deep(&defaults, Some(&Value::Null)), defaults);
    }

    #[test]
    fn test_conform_drops_mistyped_fields() {
        let defaults = json!({"size": 10.0, "amount": 4, "enabled": true});
        let conformed = conform(&defaults, &json!({"size": "big", "amount": 3.0, "enabled": 1, "extra": 2}));
        assert_eq!(conformed, json!({"amount": 3, "extra": 2}));
    }

    #[test]
    fn test_conform_rejects_fractional_integers() {
        let defaults = json!({"amount": 4});
        assert_eq!(conform(&defaults, &json!({"amount": 2.5})), json!({}));
        assert_eq!(conform(&defaults, &json!({"amount": -1})), json!({}));
    }

    #[test]
    fn test_decode_settings_drops_bad_fields() {
        let sample: Sample = decode_settings(Some(&json!({"size": 3, "label": 7, "enabled": false})));
        assert_eq!(sample.size, 3.0);
        assert_eq!(sample.label, "default");
        assert!(!sample.enabled);
        assert_eq!(sample.amount, 4);
    }

    #[test]
    fn test_decode_settings_without_partial() {
        let sample: Sample = decode_settings(None);
        assert_eq!(sample, Sample::default());
    }
}
