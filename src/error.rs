//! Error types for the MUSYS interpreter, grouped per the load/lookup/runtime/output
//! taxonomy the interpreter distinguishes at the policy level: load and output errors
//! are fatal, lookup and runtime errors are diagnosed and papered over with a safe
//! default so that a single bad device code or exhausted paragraph never aborts a run.

use thiserror::Error;

/// Fatal: raised while reading and parsing source, data, or device-catalog files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read source file {path}: {source}")]
    SourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read data file {path}: {source}")]
    DataUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read device catalog {path}: {source}")]
    DeviceCatalogUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("macro name {name:?} exceeds 6 characters")]
    MacroNameTooLong { name: String },
    #[error("malformed label on program line {line}: {text:?}")]
    MalformedLabel { line: usize, text: String },
    #[error("malformed device catalog entry: {line:?}")]
    MalformedDeviceEntry { line: String },
}

/// Diagnosed, not fatal: a reference to something the interpreter cannot find.
/// The caller substitutes the documented safe default and keeps running.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("undeclared macro {0:?}")]
    UnknownMacro(String),
    #[error("unknown device code {0:?}")]
    UnknownDevice(String),
    #[error("unknown data paragraph {0:?}")]
    UnknownParagraph(char),
}

/// Diagnosed, not fatal: a well-formed operation that hit a runtime edge case.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivideByZero,
    #[error("paragraph {0} is exhausted")]
    ParagraphExhausted(char),
    #[error("jump to undefined label {0}")]
    UndefinedLabel(i64),
}

/// Fatal: the six finished buses could not be persisted.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("could not write output file {path}: {source}")]
    Unwritable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
