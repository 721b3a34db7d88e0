// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

//! Errors returned by registry population, publication and token creation.
//!
//! A plain `lookup` miss is not an error: it is reported as `None`.

/// Errors returned by connlayout operations.
///
/// # Example
///
/// ```rust
/// use connlayout::{Error, Layout, RegistryBuilder};
///
/// #[derive(Layout)]
/// struct Conn { input: Vec<u8> }
///
/// let mut builder = RegistryBuilder::new();
/// match builder.register::<Conn>(&["output"]) {
///     Err(Error::UnknownField { type_name, field }) => {
///         assert_eq!(type_name, "Conn");
///         assert_eq!(field, "output");
///     }
///     other => panic!("unexpected: {:?}", other.map(|_| ())),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors (fatal at initialization)
    // ========================================================================
    /// A requested field name does not exist on the registered type.
    UnknownField {
        type_name: &'static str,
        field: String,
    },
    /// The descriptor reported by a `Layout` impl is not consistent with the type.
    InvalidLayout {
        type_name: &'static str,
        field: &'static str,
        reason: &'static str,
    },
    /// Two distinct Rust types were registered under the same type name.
    TypeNameConflict { type_name: &'static str },
    /// A type/field pair required by the configuration was never registered.
    MissingRequired { type_name: String, field: String },
    /// Configuration document could not be parsed.
    Config(String),
    /// I/O error while loading configuration.
    IoError(std::io::Error),

    // ========================================================================
    // Token Errors (recoverable)
    // ========================================================================
    /// The wrapper type was never registered.
    NotRegistered(&'static str),
    /// The field was never registered for this wrapper type.
    FieldNotRegistered {
        type_name: &'static str,
        field: String,
    },
    /// The requested field type differs from the registered one.
    FieldTypeMismatch {
        type_name: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The registry has not been published yet.
    NotReady,
    /// A registry was already published to this cell.
    AlreadyPublished,
}

impl Error {
    /// True for errors that must abort initialization.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownField { .. }
                | Error::InvalidLayout { .. }
                | Error::TypeNameConflict { .. }
                | Error::MissingRequired { .. }
                | Error::Config(_)
                | Error::IoError(_)
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Configuration
            Error::UnknownField { type_name, field } => {
                write!(f, "Unknown field `{}` on type `{}`", field, type_name)
            }
            Error::InvalidLayout {
                type_name,
                field,
                reason,
            } => write!(f, "Invalid layout for `{}.{}`: {}", type_name, field, reason),
            Error::TypeNameConflict { type_name } => write!(
                f,
                "Type name `{}` is already registered for a different type",
                type_name
            ),
            Error::MissingRequired { type_name, field } => {
                write!(f, "Required field `{}.{}` is not registered", type_name, field)
            }
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            // Token
            Error::NotRegistered(type_name) => write!(f, "Type `{}` is not registered", type_name),
            Error::FieldNotRegistered { type_name, field } => {
                write!(f, "Field `{}.{}` is not registered", type_name, field)
            }
            Error::FieldTypeMismatch {
                type_name,
                field,
                expected,
                found,
            } => write!(
                f,
                "Field `{}.{}` has type `{}`, requested `{}`",
                type_name, field, expected, found
            ),
            // Lifecycle
            Error::NotReady => write!(f, "Layout registry is not ready"),
            Error::AlreadyPublished => write!(f, "Layout registry already published"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e)
    }
}

/// Convenient alias for results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;
