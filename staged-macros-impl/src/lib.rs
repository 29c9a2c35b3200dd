#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

// ============================================================================
// RE-EXPORTS FROM STAGED-MACRO-TYPES (grammar, descriptors) AND STAGED-MACRO-PARSE
// ============================================================================

pub use staged_macro_parse::*;

// ============================================================================
// CODE EMISSION
// ============================================================================

mod checked;
mod typed;

mod error;
pub use error::*;

mod generate;
pub use generate::generate;

mod derive;
pub use derive::*;
