use proc_macro2::{Delimiter, TokenStream, TokenTree};

use crate::{GenerateError, generate, parse_record};

/// Recursively flattens transparent groups (groups with `Delimiter::None`) in a token stream.
///
/// Declarative macros wrap captured fragments such as `$vis:vis` or `$t:ty` in
/// invisible groups; unwrapping them lets the grammar see the plain tokens.
fn flatten_transparent_groups(input: TokenStream) -> TokenStream {
    input
        .into_iter()
        .flat_map(|tt| match tt {
            TokenTree::Group(group) if group.delimiter() == Delimiter::None => {
                flatten_transparent_groups(group.stream())
            }
            TokenTree::Group(group) => {
                let flattened_stream = flatten_transparent_groups(group.stream());
                let mut new_group = proc_macro2::Group::new(group.delimiter(), flattened_stream);
                new_group.set_span(group.span());
                std::iter::once(TokenTree::Group(new_group)).collect()
            }
            other => std::iter::once(other).collect(),
        })
        .collect()
}

/// Main entry point for `#[derive(Staged)]`: parses the struct, generates
/// its builders, or returns `compile_error!`s and nothing else.
pub fn staged_derive(input: TokenStream) -> TokenStream {
    let input = flatten_transparent_groups(input);
    let result = parse_record(input)
        .map_err(GenerateError::Parse)
        .and_then(|record| generate(&record));
    match result {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}
