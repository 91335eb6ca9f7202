// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Generic,
    YamlDeserialization,
    JsonDeserialization,
    YamlSerialization,
    JsonSerialization,
    MissingDimension,
    BadDimensions,
    BadLayer,
    IndexOutOfRange,
    DegenerateEdge,
    EmptyPolygon,
    ParamTypeMismatch,
    BadParamValue,
    DrawingUnavailable,
    DoesNotExist,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            Generic => "generic",
            YamlDeserialization => "yaml_deserialization",
            JsonDeserialization => "json_deserialization",
            YamlSerialization => "yaml_serialization",
            JsonSerialization => "json_serialization",
            MissingDimension => "missing_dimension",
            BadDimensions => "bad_dimensions",
            BadLayer => "bad_layer",
            IndexOutOfRange => "index_out_of_range",
            DegenerateEdge => "degenerate_edge",
            EmptyPolygon => "empty_polygon",
            ParamTypeMismatch => "param_type_mismatch",
            BadParamValue => "bad_param_value",
            DrawingUnavailable => "drawing_unavailable",
            DoesNotExist => "does_not_exist",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed structured input; loading is aborted.
    Import,
    /// Failure while producing the structured representation.
    Export,
    /// A mutation or query that would break the level's invariants.
    Level,
    /// An external resource (background drawing) could not be read.
    Resource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Import => "ImportError",
            ErrorKind::Export => "ExportError",
            ErrorKind::Level => "LevelError",
            ErrorKind::Resource => "ResourceError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// A recoverable problem found while loading a level.  The offending
/// element has already been skipped (or a fallback applied) by the time a
/// warning is produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Warning {
    DrawingUnavailable {
        level: String,
        filename: String,
        reason: String,
    },
    UnknownDoorType {
        level: String,
        door_type: String,
    },
    UnknownField {
        level: String,
        field: String,
    },
    /// An edge whose start and end are the same vertex.
    DegenerateEdge {
        level: String,
        container: String,
        index: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::DrawingUnavailable {
                level,
                filename,
                reason,
            } => write!(f, "level {level}: unable to read drawing {filename}: {reason}"),
            Warning::UnknownDoorType { level, door_type } => {
                write!(f, "level {level}: skipping door of unknown type [{door_type}]")
            }
            Warning::UnknownField { level, field } => {
                write!(f, "level {level}: ignoring unknown field [{field}]")
            }
            Warning::DegenerateEdge {
                level,
                container,
                index,
            } => write!(
                f,
                "level {level}: skipping {container}[{index}], it starts and ends at one vertex"
            ),
        }
    }
}

#[macro_export]
macro_rules! import_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Import, ErrorCode::$code, Some($str)))
    }}
);

#[macro_export]
macro_rules! level_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Level, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Level, ErrorCode::$code, None))
    }};
}

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Import,
        ErrorCode::IndexOutOfRange,
        Some("lanes[2] references vertex 9".to_string()),
    );
    assert_eq!(
        "ImportError{index_out_of_range: lanes[2] references vertex 9}",
        format!("{err}")
    );

    let err = Error::new(ErrorKind::Level, ErrorCode::DegenerateEdge, None);
    assert_eq!("LevelError{degenerate_edge}", format!("{err}"));
}

#[test]
fn test_warning_display() {
    let warning = Warning::UnknownDoorType {
        level: "L1".to_string(),
        door_type: "revolving".to_string(),
    };
    assert_eq!(
        "level L1: skipping door of unknown type [revolving]",
        warning.to_string()
    );

    let warning = Warning::DegenerateEdge {
        level: "L1".to_string(),
        container: "walls".to_string(),
        index: 3,
    };
    assert_eq!(
        "level L1: skipping walls[3], it starts and ends at one vertex",
        warning.to_string()
    );
}
