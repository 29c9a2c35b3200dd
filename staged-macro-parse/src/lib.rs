//! Parser for the staged derive macro
//!
//! Takes the `TokenStream` of a struct declaration and produces the
//! [`RecordDescriptor`] the builder generator consumes. Parsing is done with
//! `unsynn` through the grammar in `staged-macro-types`; `#[staged(...)]`
//! options are validated here and reported as spanned [`CompileError`]s.

pub use staged_macro_types::*;

mod attrs;
pub use attrs::*;

mod convert;
pub use convert::*;
