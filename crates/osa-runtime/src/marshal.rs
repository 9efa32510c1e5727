//! Canonical value mapping across the native boundary.
//!
//! | value      | wire (JSON)          | Rhai              |
//! |------------|----------------------|-------------------|
//! | `Null`     | `null`               | `()`              |
//! | `Bool`     | `true` / `false`     | `bool`            |
//! | `Integer`  | integer number       | `INT` (i64)       |
//! | `Real`     | fractional number    | `FLOAT` (f64)     |
//! | `String`   | string               | string or `char`  |
//! | `List`     | array                | `Array`           |
//! | `Record`   | object               | `Map`             |
//!
//! Integers are exact within i64. Integers the native side reports outside
//! that range arrive as `Real`, rounded to the nearest f64. Non-finite reals
//! never cross in either direction.

use std::collections::BTreeMap;

use osa_core::{OsaError, OsaValue};
use rhai::{Array, Dynamic, ImmutableString, Map, FLOAT, INT};
use serde_json::{Number, Value};

pub type Namespace = BTreeMap<String, OsaValue>;

/// Rejects values that have no representation on the native side.
pub fn validate(value: &OsaValue) -> Result<(), OsaError> {
    match value {
        OsaValue::Real(real) if !real.is_finite() => Err(non_finite(*real)),
        OsaValue::List(values) => values.iter().try_for_each(validate),
        OsaValue::Record(values) => values.values().try_for_each(validate),
        _ => Ok(()),
    }
}

pub fn validate_namespace(namespace: &Namespace) -> Result<(), OsaError> {
    for (name, value) in namespace {
        validate(value).map_err(|error| {
            OsaError::marshal(format!("Binding \"{}\": {}", name, error.message))
        })?;
    }
    Ok(())
}

pub fn value_to_json(value: &OsaValue) -> Result<Value, OsaError> {
    match value {
        OsaValue::Null => Ok(Value::Null),
        OsaValue::Bool(value) => Ok(Value::Bool(*value)),
        OsaValue::Integer(value) => Ok(Value::Number(Number::from(*value))),
        OsaValue::Real(value) => Number::from_f64(*value)
            .map(Value::Number)
            .ok_or_else(|| non_finite(*value)),
        OsaValue::String(value) => Ok(Value::String(value.clone())),
        OsaValue::List(values) => values
            .iter()
            .map(value_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        OsaValue::Record(values) => {
            let mut object = serde_json::Map::new();
            for (key, value) in values {
                object.insert(key.clone(), value_to_json(value)?);
            }
            Ok(Value::Object(object))
        }
    }
}

pub fn value_from_json(value: Value) -> Result<OsaValue, OsaError> {
    match value {
        Value::Null => Ok(OsaValue::Null),
        Value::Bool(value) => Ok(OsaValue::Bool(value)),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(OsaValue::Integer(integer))
            } else if let Some(real) = number.as_f64() {
                Ok(OsaValue::Real(real))
            } else {
                Err(OsaError::marshal(format!(
                    "Native number {} is not representable.",
                    number
                )))
            }
        }
        Value::String(value) => Ok(OsaValue::String(value)),
        Value::Array(values) => values
            .into_iter()
            .map(value_from_json)
            .collect::<Result<Vec<_>, _>>()
            .map(OsaValue::List),
        Value::Object(values) => {
            let mut record = BTreeMap::new();
            for (key, value) in values {
                record.insert(key, value_from_json(value)?);
            }
            Ok(OsaValue::Record(record))
        }
    }
}

pub(crate) fn value_to_dynamic(value: &OsaValue) -> Result<Dynamic, OsaError> {
    match value {
        OsaValue::Null => Ok(Dynamic::UNIT),
        OsaValue::Bool(value) => Ok(Dynamic::from_bool(*value)),
        OsaValue::Integer(value) => Ok(Dynamic::from_int(*value as INT)),
        OsaValue::Real(value) if !value.is_finite() => Err(non_finite(*value)),
        OsaValue::Real(value) => Ok(Dynamic::from_float(*value as FLOAT)),
        OsaValue::String(value) => Ok(Dynamic::from(value.clone())),
        OsaValue::List(values) => {
            let mut array = Array::new();
            for value in values {
                array.push(value_to_dynamic(value)?);
            }
            Ok(Dynamic::from_array(array))
        }
        OsaValue::Record(values) => {
            let mut map = Map::new();
            for (key, value) in values {
                map.insert(key.clone().into(), value_to_dynamic(value)?);
            }
            Ok(Dynamic::from_map(map))
        }
    }
}

pub(crate) fn dynamic_to_value(value: Dynamic) -> Result<OsaValue, OsaError> {
    if value.is::<()>() {
        return Ok(OsaValue::Null);
    }
    if value.is::<bool>() {
        return Ok(OsaValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(OsaValue::Integer(value.cast::<INT>()));
    }
    if value.is::<FLOAT>() {
        let real = value.cast::<FLOAT>();
        if !real.is_finite() {
            return Err(non_finite(real));
        }
        return Ok(OsaValue::Real(real));
    }
    if value.is::<ImmutableString>() {
        return Ok(OsaValue::String(
            value.cast::<ImmutableString>().to_string(),
        ));
    }
    if value.is::<char>() {
        return Ok(OsaValue::String(value.cast::<char>().to_string()));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_value(item)?);
        }
        return Ok(OsaValue::List(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), dynamic_to_value(value)?);
        }
        return Ok(OsaValue::Record(out));
    }

    Err(OsaError::marshal(format!(
        "Runtime value of type {} has no canonical mapping.",
        value.type_name()
    )))
}

fn non_finite(value: f64) -> OsaError {
    OsaError::marshal(format!("Real value {} cannot cross the native boundary.", value))
}
