// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Named, typed parameters attached to level elements.
//!
//! On disk a parameter is a two element sequence `[kind, value]`, where
//! `kind` is 1 (string), 2 (int), 3 (double) or 4 (bool).

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::Result;
use crate::level_err;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Int,
    Double,
    Bool,
}

impl ParamKind {
    fn code(self) -> u8 {
        match self {
            ParamKind::String => 1,
            ParamKind::Int => 2,
            ParamKind::Double => 3,
            ParamKind::Bool => 4,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ParamKind::String),
            2 => Some(ParamKind::Int),
            3 => Some(ParamKind::Double),
            4 => Some(ParamKind::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ParamKind::String => "string",
            ParamKind::Int => "int",
            ParamKind::Double => "double",
            ParamKind::Bool => "bool",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl Param {
    pub fn kind(&self) -> ParamKind {
        match self {
            Param::String(_) => ParamKind::String,
            Param::Int(_) => ParamKind::Int,
            Param::Double(_) => ParamKind::Double,
            Param::Bool(_) => ParamKind::Bool,
        }
    }

    /// Parse `text` as a value of the given kind, the way a property editor
    /// hands values over.
    pub fn parse(kind: ParamKind, text: &str) -> Result<Param> {
        let text = text.trim();
        let param = match kind {
            ParamKind::String => Param::String(text.to_owned()),
            ParamKind::Int => match text.parse::<i64>() {
                Ok(n) => Param::Int(n),
                Err(err) => return level_err!(BadParamValue, format!("'{text}': {err}")),
            },
            ParamKind::Double => match text.parse::<f64>() {
                Ok(n) => Param::Double(n),
                Err(err) => return level_err!(BadParamValue, format!("'{text}': {err}")),
            },
            ParamKind::Bool => Param::Bool(text == "true"),
        };
        Ok(param)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Param::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value; ints widen to doubles.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Param::Double(n) => Some(*n),
            Param::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Param::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Param::String(s) => write!(f, "{s}"),
            Param::Int(n) => write!(f, "{n}"),
            Param::Double(n) => write!(f, "{n}"),
            Param::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for Param {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.kind().code())?;
        match self {
            Param::String(s) => seq.serialize_element(s)?,
            Param::Int(n) => seq.serialize_element(n)?,
            Param::Double(n) => seq.serialize_element(n)?,
            Param::Bool(b) => seq.serialize_element(b)?,
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Param {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ParamVisitor;

        impl<'de> Visitor<'de> for ParamVisitor {
            type Value = Param;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a [kind, value] parameter sequence")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let code: u8 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let Some(kind) = ParamKind::from_code(code) else {
                    return Err(de::Error::custom(format!("unknown parameter kind {code}")));
                };
                let param = match kind {
                    ParamKind::String => seq.next_element::<String>()?.map(Param::String),
                    ParamKind::Int => seq.next_element::<i64>()?.map(Param::Int),
                    ParamKind::Double => seq.next_element::<f64>()?.map(Param::Double),
                    ParamKind::Bool => seq.next_element::<bool>()?.map(Param::Bool),
                };
                param.ok_or_else(|| de::Error::invalid_length(1, &self))
            }
        }

        deserializer.deserialize_seq(ParamVisitor)
    }
}

/// Declared parameter of an element type: its name, kind, and the value it
/// starts with when the element requires it.
#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: Option<DefaultValue>,
}

#[derive(Clone, Copy, Debug)]
pub enum DefaultValue {
    String(&'static str),
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl From<DefaultValue> for Param {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::String(s) => Param::String(s.to_owned()),
            DefaultValue::Int(n) => Param::Int(n),
            DefaultValue::Double(n) => Param::Double(n),
            DefaultValue::Bool(b) => Param::Bool(b),
        }
    }
}

pub type ParamMap = BTreeMap<String, Param>;

/// Insert the defaults for every required parameter not already present.
pub fn create_required(params: &mut ParamMap, specs: &[ParamSpec]) {
    for spec in specs {
        if let Some(value) = spec.required {
            params
                .entry(spec.name.to_owned())
                .or_insert_with(|| value.into());
        }
    }
}

/// Look up the kind a parameter named `name` has (or would have) on an
/// element: an existing entry wins, then the element type's declaration.
pub fn kind_of(params: &ParamMap, specs: &[ParamSpec], name: &str) -> Option<ParamKind> {
    params
        .get(name)
        .map(Param::kind)
        .or_else(|| specs.iter().find(|s| s.name == name).map(|s| s.kind))
}

/// Store `value` under `name`.  Returns `Ok(false)` without touching the map
/// when the name is neither present nor declared for the element type.
pub fn set(params: &mut ParamMap, specs: &[ParamSpec], name: &str, value: Param) -> Result<bool> {
    let Some(kind) = kind_of(params, specs, name) else {
        log::warn!("tried to set unknown parameter [{name}]");
        return Ok(false);
    };
    // ints are accepted where doubles are expected, never the reverse
    let value = match (kind, value) {
        (ParamKind::Double, Param::Int(n)) => Param::Double(n as f64),
        (kind, value) if value.kind() == kind => value,
        (kind, value) => {
            return level_err!(
                ParamTypeMismatch,
                format!("{name} is a {kind} parameter, got {}", value.kind())
            );
        }
    };
    params.insert(name.to_owned(), value);
    Ok(true)
}

/// Like [`set`], parsing `text` according to the parameter's kind.
pub fn set_str(params: &mut ParamMap, specs: &[ParamSpec], name: &str, text: &str) -> Result<bool> {
    let Some(kind) = kind_of(params, specs, name) else {
        log::warn!("tried to set unknown parameter [{name}]");
        return Ok(false);
    };
    let value = Param::parse(kind, text)?;
    params.insert(name.to_owned(), value);
    Ok(true)
}
