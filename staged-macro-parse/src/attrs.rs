//! Interpretation of `#[staged(...)]` and doc attributes.

use proc_macro2::{Ident, Span, TokenStream};
use staged_macro_types::unsynn::{
    Cons, CommaDelimitedVec, EndOfStream, IParse, ToTokenIter, ToTokens,
};
use staged_macro_types::*;

const RECORD_KEYS: &str = "`builder`, `entry`, `finalize`, `crate`, `checked`";
const FIELD_KEYS: &str = "`setter`, `into`";

/// One `key` or `key = value` item from a `#[staged(...)]` list.
struct Item {
    key: Ident,
    value: Option<TokenStream>,
}

/// Splits every `#[staged(...)]` attribute into its items, and collects doc
/// literals on the way.
fn collect_items(
    attributes: &[Attribute],
    doc: &mut Vec<TokenStream>,
    errors: &mut Vec<CompileError>,
) -> Vec<Item> {
    let mut items = Vec::new();
    for attr in attributes {
        match &attr.body.content {
            AttributeInner::Staged(staged) => {
                let group = &staged.body.0;
                let mut it = group.stream().to_token_iter();
                match it.parse::<Cons<CommaDelimitedVec<StagedItem>, EndOfStream>>() {
                    Ok(parsed) => {
                        for delimited in parsed.first.iter() {
                            let item = &delimited.value;
                            items.push(Item {
                                key: item.key.clone(),
                                value: item.value.as_ref().map(|v| v.second.to_token_stream()),
                            });
                        }
                    }
                    Err(_) => errors.push(CompileError::new(
                        "malformed `#[staged(...)]` attribute: expected a comma-separated list of `key` or `key = value`",
                        group.span(),
                    )),
                }
            }
            AttributeInner::Doc(d) => doc.push(d.value.to_token_stream()),
            AttributeInner::Any(_) => {}
        }
    }
    items
}

fn parse_ident_value(item: &Item, errors: &mut Vec<CompileError>) -> Option<Ident> {
    let Some(value) = &item.value else {
        errors.push(CompileError::new(
            format!("`{}` expects an identifier: `{} = name`", item.key, item.key),
            item.key.span(),
        ));
        return None;
    };
    let mut it = value.clone().to_token_iter();
    match it.parse::<Cons<Ident, EndOfStream>>() {
        Ok(parsed) => Some(parsed.first),
        Err(_) => {
            errors.push(CompileError::new(
                format!("`{}` expects a single identifier", item.key),
                first_span(value).unwrap_or_else(|| item.key.span()),
            ));
            None
        }
    }
}

fn expect_flag(item: &Item, errors: &mut Vec<CompileError>) -> bool {
    if let Some(value) = &item.value {
        errors.push(CompileError::new(
            format!("`{}` takes no value", item.key),
            first_span(value).unwrap_or_else(|| item.key.span()),
        ));
        return false;
    }
    true
}

fn first_span(tokens: &TokenStream) -> Option<Span> {
    tokens.clone().into_iter().next().map(|tt| tt.span())
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>, key: &Ident, errors: &mut Vec<CompileError>) {
    let Some(value) = value else { return };
    if slot.is_some() {
        errors.push(CompileError::new(
            format!("`{key}` is specified more than once"),
            key.span(),
        ));
        return;
    }
    *slot = Some(value);
}

/// Reads container-level options from a struct's attributes.
pub fn record_attrs_from_grammar(
    attributes: &[Attribute],
    errors: &mut Vec<CompileError>,
) -> PRecordAttrs {
    let mut attrs = PRecordAttrs::default();
    let items = collect_items(attributes, &mut attrs.doc, errors);

    for item in &items {
        match item.key.to_string().as_str() {
            "builder" => {
                let value = parse_ident_value(item, errors);
                set_once(&mut attrs.builder, value, &item.key, errors);
            }
            "entry" => {
                let value = parse_ident_value(item, errors);
                set_once(&mut attrs.entry, value, &item.key, errors);
            }
            "finalize" => {
                let value = parse_ident_value(item, errors);
                set_once(&mut attrs.finalize, value, &item.key, errors);
            }
            "crate" => match &item.value {
                Some(path) if !path.is_empty() => {
                    set_once(&mut attrs.crate_path, Some(path.clone()), &item.key, errors);
                }
                _ => errors.push(CompileError::new(
                    "`crate` expects a path: `crate = ::path::to::staged`",
                    item.key.span(),
                )),
            },
            "checked" => {
                if expect_flag(item, errors) {
                    attrs.checked = true;
                }
            }
            "setter" | "into" => errors.push(CompileError::new(
                format!("`{}` is a field option; put it on a field", item.key),
                item.key.span(),
            )),
            other => errors.push(CompileError::new(
                format!("unknown `#[staged]` option `{other}`; expected one of {RECORD_KEYS}"),
                item.key.span(),
            )),
        }
    }

    attrs
}

/// Reads field-level options. Returns the options and the setter override.
pub fn field_attrs_from_grammar(
    attributes: &[Attribute],
    errors: &mut Vec<CompileError>,
) -> (PFieldAttrs, Option<Ident>) {
    let mut attrs = PFieldAttrs::default();
    let mut setter = None;
    let items = collect_items(attributes, &mut attrs.doc, errors);

    for item in &items {
        match item.key.to_string().as_str() {
            "setter" => {
                let value = parse_ident_value(item, errors);
                set_once(&mut setter, value, &item.key, errors);
            }
            "into" => {
                if expect_flag(item, errors) {
                    attrs.into = true;
                }
            }
            "builder" | "entry" | "finalize" | "crate" | "checked" => {
                errors.push(CompileError::new(
                    format!("`{}` is a struct option; put it on the struct", item.key),
                    item.key.span(),
                ))
            }
            other => errors.push(CompileError::new(
                format!("unknown `#[staged]` field option `{other}`; expected one of {FIELD_KEYS}"),
                item.key.span(),
            )),
        }
    }

    (attrs, setter)
}
