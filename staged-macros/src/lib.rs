#![doc = include_str!("../README.md")]

/// Generates a staged builder for a struct.
///
/// See the `staged` crate documentation for the generated surface and the
/// `#[staged(...)]` options.
#[proc_macro_derive(Staged, attributes(staged))]
pub fn staged(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    staged_macros_impl::staged_derive(input.into()).into()
}
