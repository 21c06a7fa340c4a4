// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::{error, fmt, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AlreadyRunning,
    StageNotReady,
    NoModelSelected,
    NotYetReviewed,
    InvalidConfig,
    InvalidGraph,
    UnknownNode,
    GraphInactive,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            AlreadyRunning => "already_running",
            StageNotReady => "stage_not_ready",
            NoModelSelected => "no_model_selected",
            NotYetReviewed => "not_yet_reviewed",
            InvalidConfig => "invalid_config",
            InvalidGraph => "invalid_graph",
            UnknownNode => "unknown_node",
            GraphInactive => "graph_inactive",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Wizard,
    Progress,
    Graph,
    Config,
}

/// A recoverable, operator-facing failure. None of these are fatal: the
/// presentation layer surfaces them as a disabled action or a prompt.
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
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Wizard => "WizardError",
            ErrorKind::Progress => "ProgressError",
            ErrorKind::Graph => "GraphError",
            ErrorKind::Config => "ConfigError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(
            ErrorKind::Config,
            ErrorCode::InvalidConfig,
            Some(err.to_string()),
        )
    }
}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! wizard_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Wizard, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Wizard, ErrorCode::$code, None))
    }};
}

#[macro_export]
macro_rules! progress_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Progress, ErrorCode::$code, Some($str)))
    }};
}

#[macro_export]
macro_rules! graph_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Graph, ErrorCode::$code, Some($str)))
    }};
}

#[macro_export]
macro_rules! config_err {
    ($str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Config,
            ErrorCode::InvalidConfig,
            Some($str),
        ))
    }};
}
