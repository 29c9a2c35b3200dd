use proc_macro2::{Span, TokenStream};
use quote::quote_spanned;
use staged_macro_types::CompileError;

/// Why a builder could not be generated.
///
/// Generation is all-or-nothing: when any of these is returned, no builder
/// code is emitted, only the diagnostic.
#[derive(Debug, Clone)]
pub enum GenerateError {
    /// Two fields share a name.
    DuplicateField {
        /// The repeated name
        name: String,
        /// Where the second occurrence is
        span: Span,
    },

    /// Two fields would get setters of the same name.
    DuplicateSetter {
        /// The repeated setter name
        name: String,
        /// Where the second occurrence is
        span: Span,
    },

    /// A setter or field name collides with something the builder itself
    /// defines.
    ReservedName {
        /// The offending name
        name: String,
        /// What it collides with
        reserved_for: &'static str,
        /// Where it was declared
        span: Span,
    },

    /// The descriptor list is inconsistent: positions out of order, or field
    /// names that do not match the record kind.
    Malformed {
        /// What is wrong
        message: String,
        /// Where to point
        span: Span,
    },

    /// The declaration could not be turned into a descriptor list:
    /// unsupported item kind or invalid `#[staged]` attributes.
    Parse(Vec<CompileError>),
}

impl GenerateError {
    /// Renders the error as spanned `compile_error!` invocations.
    pub fn to_compile_error(&self) -> TokenStream {
        match self {
            GenerateError::Parse(errors) => errors.iter().map(|e| e.to_compile_error()).collect(),
            GenerateError::DuplicateField { span, .. }
            | GenerateError::DuplicateSetter { span, .. }
            | GenerateError::ReservedName { span, .. }
            | GenerateError::Malformed { span, .. } => {
                let message = self.to_string();
                quote_spanned! { *span => compile_error!(#message); }
            }
        }
    }
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::DuplicateField { name, .. } => {
                write!(f, "duplicate field name `{name}`")
            }
            GenerateError::DuplicateSetter { name, .. } => {
                write!(
                    f,
                    "duplicate setter name `{name}`; rename one with `#[staged(setter = ...)]`"
                )
            }
            GenerateError::ReservedName {
                name, reserved_for, ..
            } => {
                write!(f, "`{name}` is reserved for {reserved_for}")
            }
            GenerateError::Malformed { message, .. } => {
                write!(f, "malformed field descriptor list: {message}")
            }
            GenerateError::Parse(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", e.message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for GenerateError {}
