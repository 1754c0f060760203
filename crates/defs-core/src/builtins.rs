//! Built-in types and the `datetime` standard module.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::ConstructError;
use crate::registry::Namespace;
use crate::types::{Arguments, Constructed, InstanceValue, TypeDef, TypeRef};
use crate::value::Parsed;

/// Payload of a bare `object()` instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BareObject;

pub(crate) fn namespace() -> Namespace {
    let object = TypeDef::object_root(construct_object).into_ref();
    let int = TypeDef::new("int", construct_int).extends(&object).into_ref();
    let bool_ = TypeDef::new("bool", construct_bool).extends(&int).into_ref();
    let float = TypeDef::new("float", construct_float).extends(&object).into_ref();
    let str_ = TypeDef::new("str", construct_str).extends(&object).into_ref();
    let list = TypeDef::new("list", construct_list).extends(&object).into_ref();
    let dict = TypeDef::new("dict", construct_dict).extends(&object).into_ref();

    let mut namespace = Namespace::default();
    for (names, ty) in [
        (["object", "Object"], object),
        (["bool", "Bool"], bool_),
        (["int", "Int"], int),
        (["float", "Float"], float),
        (["str", "Str"], str_),
        (["list", "List"], list),
        (["dict", "Dict"], dict),
    ] {
        for name in names {
            namespace.bind(name, TypeRef::clone(&ty));
        }
    }
    namespace
}

pub(crate) fn date_type() -> TypeRef {
    TypeDef::class("date", |args| {
        let year = args.take_i64(0, "year")?;
        let month = args.take_i64(1, "month")?;
        let day = args.take_i64(2, "day")?;
        let year = i32::try_from(year)
            .map_err(|_| ConstructError::invalid(format!("year {year} is out of range")))?;
        let month = u32::try_from(month)
            .map_err(|_| ConstructError::invalid("month must be in 1..12"))?;
        let day = u32::try_from(day)
            .map_err(|_| ConstructError::invalid("day is out of range for month"))?;
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| ConstructError::invalid("day is out of range for month"))
    })
    .in_module("datetime")
    .into_ref()
}

fn single(mut args: Arguments) -> Result<Option<Parsed>, ConstructError> {
    let value = args.take_positional(0);
    args.finish()?;
    Ok(value)
}

fn construct_object(args: Arguments) -> Result<Constructed, ConstructError> {
    if !args.is_empty() {
        return Err(ConstructError::invalid("object() takes no arguments"));
    }
    Ok(Constructed::Instance(InstanceValue::new(BareObject)))
}

fn construct_int(args: Arguments) -> Result<Constructed, ConstructError> {
    let value = match single(args)? {
        None => 0,
        Some(value) => to_int(&value)?,
    };
    Ok(Constructed::Value(Parsed::Int(value)))
}

fn to_int(value: &Parsed) -> Result<i64, ConstructError> {
    match value {
        Parsed::Int(i) => Ok(*i),
        Parsed::Bool(b) => Ok(i64::from(*b)),
        Parsed::Float(x) if x.is_finite() => {
            let truncated = x.trunc();
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(truncated as i64)
            } else {
                Err(ConstructError::invalid(format!(
                    "cannot convert float {x} to integer: out of range"
                )))
            }
        }
        Parsed::Float(x) => Err(ConstructError::invalid(format!(
            "cannot convert float {x} to integer"
        ))),
        Parsed::Str(s) => s.trim().parse::<i64>().map_err(|_| {
            ConstructError::invalid(format!("invalid literal for int() with base 10: '{s}'"))
        }),
        other => Err(ConstructError::invalid(format!(
            "int() argument must be a string or a number, not {}",
            other.kind()
        ))),
    }
}

fn construct_float(args: Arguments) -> Result<Constructed, ConstructError> {
    let value = match single(args)? {
        None => 0.0,
        Some(Parsed::Bool(b)) => f64::from(u8::from(b)),
        Some(Parsed::Str(s)) => s.trim().parse::<f64>().map_err(|_| {
            ConstructError::invalid(format!("could not convert string to float: '{s}'"))
        })?,
        Some(other) => other.as_f64().ok_or_else(|| {
            ConstructError::invalid(format!(
                "float() argument must be a string or a number, not {}",
                other.kind()
            ))
        })?,
    };
    Ok(Constructed::Value(Parsed::Float(value)))
}

fn construct_str(args: Arguments) -> Result<Constructed, ConstructError> {
    let value = match single(args)? {
        None => String::new(),
        Some(Parsed::Str(s)) => s,
        Some(Parsed::Float(x)) if x.is_finite() && x.fract() == 0.0 => format!("{x:.1}"),
        Some(other) => other.to_string(),
    };
    Ok(Constructed::Value(Parsed::Str(value)))
}

fn construct_bool(args: Arguments) -> Result<Constructed, ConstructError> {
    let value = match single(args)? {
        None => false,
        Some(value) => truthy(&value),
    };
    Ok(Constructed::Value(Parsed::Bool(value)))
}

fn truthy(value: &Parsed) -> bool {
    match value {
        Parsed::Null => false,
        Parsed::Bool(b) => *b,
        Parsed::Int(i) => *i != 0,
        Parsed::Float(x) => *x != 0.0,
        Parsed::Str(s) => !s.is_empty(),
        Parsed::Seq(items) => !items.is_empty(),
        Parsed::Map(_) | Parsed::Attrs(_) => value.as_map().is_some_and(|m| !m.is_empty()),
        Parsed::Object(_) => true,
    }
}

fn construct_list(args: Arguments) -> Result<Constructed, ConstructError> {
    let items = match single(args)? {
        None => Vec::new(),
        Some(Parsed::Seq(items)) => items,
        Some(Parsed::Str(s)) => s.chars().map(|c| Parsed::Str(c.to_string())).collect(),
        Some(other) => match other.as_map() {
            Some(entries) => entries.keys().cloned().map(Parsed::Str).collect(),
            None => {
                return Err(ConstructError::invalid(format!(
                    "'{}' object is not iterable",
                    other.kind()
                )))
            }
        },
    };
    Ok(Constructed::Value(Parsed::Seq(items)))
}

fn construct_dict(mut args: Arguments) -> Result<Constructed, ConstructError> {
    let keywords = args.take_keywords();
    let mut entries = match single(args)? {
        None => BTreeMap::new(),
        Some(Parsed::Map(entries)) => entries,
        Some(Parsed::Attrs(view)) => view.into_inner(),
        Some(Parsed::Seq(pairs)) => pairs_to_entries(pairs)?,
        Some(other) => {
            return Err(ConstructError::invalid(format!(
                "'{}' object is not a mapping",
                other.kind()
            )))
        }
    };
    entries.extend(keywords);
    Ok(Constructed::Value(Parsed::Map(entries)))
}

fn pairs_to_entries(pairs: Vec<Parsed>) -> Result<BTreeMap<String, Parsed>, ConstructError> {
    pairs
        .into_iter()
        .enumerate()
        .map(|(i, pair)| match pair {
            Parsed::Seq(mut kv) if kv.len() == 2 => {
                let value = kv.pop().unwrap_or(Parsed::Null);
                match kv.pop() {
                    Some(Parsed::Str(key)) => Ok((key, value)),
                    _ => Err(ConstructError::invalid(format!(
                        "dictionary update sequence element #{i} has a non-string key"
                    ))),
                }
            }
            _ => Err(ConstructError::invalid(format!(
                "dictionary update sequence element #{i} is not a key-value pair"
            ))),
        })
        .collect()
}
