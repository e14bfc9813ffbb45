// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::result;

/// Failure codes for the few fallible edges of the crate: loading graph
/// fixtures, parsing layout configuration and replaying sessions. Engine
/// operations themselves never fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DoesNotExist,
    JsonDeserialization,
    UnknownNodeKind,
    UnknownRelationKind,
    InvalidConfig,
    InvalidScript,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorCode::DoesNotExist => "does_not_exist",
            ErrorCode::JsonDeserialization => "json_deserialization",
            ErrorCode::UnknownNodeKind => "unknown_node_kind",
            ErrorCode::UnknownRelationKind => "unknown_relation_kind",
            ErrorCode::InvalidConfig => "invalid_config",
            ErrorCode::InvalidScript => "invalid_script",
        };
        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Import,
    Config,
    Session,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.describe())]
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

    fn describe(&self) -> String {
        let kind = match self.kind {
            ErrorKind::Import => "ImportError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Session => "SessionError",
        };
        match self.details {
            Some(ref details) => format!("{}{{{}: {}}}", kind, self.code, details),
            None => format!("{}{{{}}}", kind, self.code),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(
            ErrorKind::Import,
            ErrorCode::JsonDeserialization,
            Some(err.to_string()),
        )
    }
}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! import_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Import,
            ErrorCode::$code,
            Some($str),
        ))
    }}
);

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Import,
        ErrorCode::UnknownNodeKind,
        Some("Saga".to_owned()),
    );
    assert_eq!("ImportError{unknown_node_kind: Saga}", format!("{err}"));

    let err = Error::new(ErrorKind::Config, ErrorCode::InvalidConfig, None);
    assert_eq!("ConfigError{invalid_config}", format!("{err}"));
}
