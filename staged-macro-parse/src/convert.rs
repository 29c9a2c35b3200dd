//! Conversion from grammar types to the descriptor model
//!
//! This module converts the unsynn-parsed [`RecordDecl`] into a
//! [`RecordDescriptor`]: fields in declaration order, generics split into
//! parameters and where predicates, options validated.

use crate::attrs::{field_attrs_from_grammar, record_attrs_from_grammar};
use proc_macro2::{Span, TokenStream};
use staged_macro_types::unsynn::{Cons, EndOfStream, IParse, ToTokenIter, ToTokens};
use staged_macro_types::*;

// ============================================================================
// PUBLIC PARSING API
// ============================================================================

/// Parse a struct declaration into a record descriptor.
///
/// Every problem found is returned, not just the first, so the user sees
/// all of them in one compile.
pub fn parse_record(tokens: TokenStream) -> Result<RecordDescriptor, Vec<CompileError>> {
    let mut iter = tokens.to_token_iter();
    let decl = match iter.parse::<Cons<RecordDecl, EndOfStream>>() {
        Ok(parsed) => parsed.first,
        Err(e) => {
            return Err(vec![CompileError::new(
                format!("failed to parse type for `#[derive(Staged)]`: {e:?}"),
                Span::call_site(),
            )]);
        }
    };
    record_from_grammar(&decl)
}

// ============================================================================
// CONVERSION FUNCTIONS
// ============================================================================

fn record_from_grammar(decl: &RecordDecl) -> Result<RecordDescriptor, Vec<CompileError>> {
    let name = decl.name.clone();

    let item_kind = match &decl.keyword {
        ItemKeyword::Struct(_) => None,
        ItemKeyword::Enum(_) => Some("an enum"),
        ItemKeyword::Union(_) => Some("a union"),
    };
    if let Some(item_kind) = item_kind {
        return Err(vec![CompileError::new(
            format!(
                "`#[derive(Staged)]` only supports structs, but `{name}` is {item_kind}; \
                 a staged builder needs every field to be present at once"
            ),
            name.span(),
        )]);
    }

    let mut errors = Vec::new();
    let attrs = record_attrs_from_grammar(&decl.attributes, &mut errors);

    let (kind, clauses, fields) = match &decl.body {
        RecordBody::Named { clauses, fields } => {
            let fields = fields
                .content
                .iter()
                .enumerate()
                .map(|(position, d)| {
                    let field = &d.value;
                    let (attrs, setter) = field_attrs_from_grammar(&field.attributes, &mut errors);
                    FieldDescriptor {
                        name: PName::new(IdentOrIndex::Ident(field.name.clone()), setter),
                        ty: field.typ.to_token_stream(),
                        position,
                        attrs,
                    }
                })
                .collect::<Vec<_>>();
            (RecordKind::Named, clauses.as_ref(), fields)
        }
        RecordBody::Tuple {
            fields, clauses, ..
        } => {
            let fields = fields
                .content
                .iter()
                .enumerate()
                .map(|(position, d)| {
                    let field = &d.value;
                    let (attrs, setter) = field_attrs_from_grammar(&field.attributes, &mut errors);
                    FieldDescriptor {
                        name: PName::new(IdentOrIndex::Index(position), setter),
                        ty: field.typ.to_token_stream(),
                        position,
                        attrs,
                    }
                })
                .collect::<Vec<_>>();
            (RecordKind::Tuple, clauses.as_ref(), fields)
        }
        RecordBody::Unit { clauses, .. } => (RecordKind::Unit, clauses.as_ref(), Vec::new()),
        RecordBody::Other { .. } => {
            errors.push(CompileError::new(
                format!("unsupported declaration syntax for `{name}`"),
                name.span(),
            ));
            return Err(errors);
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(RecordDescriptor {
        name,
        vis: decl
            .vis
            .as_ref()
            .map(|vis| vis.to_token_stream())
            .unwrap_or_default(),
        generics: generics_from_grammar(decl.generics.as_ref(), clauses),
        kind,
        fields,
        attrs,
    })
}

fn generics_from_grammar(
    params: Option<&GenericParams>,
    clauses: Option<&WhereClauses>,
) -> PGenerics {
    let params = params
        .map(|generics| {
            generics
                .params
                .iter()
                .map(|d| match &d.value {
                    GenericParam::Lifetime { name, bounds } => PGenericParam::Lifetime {
                        name: LifetimeName(name.name.clone()),
                        bounds: bounds.as_ref().map(|b| b.second.to_token_stream()),
                    },
                    GenericParam::Type { name, bounds, .. } => PGenericParam::Type {
                        name: name.clone(),
                        bounds: bounds.as_ref().map(|b| b.second.to_token_stream()),
                    },
                    GenericParam::Const { name, typ, .. } => PGenericParam::Const {
                        name: name.clone(),
                        ty: typ.to_token_stream(),
                    },
                })
                .collect()
        })
        .unwrap_or_default();

    let where_predicates = clauses
        .map(|clauses| {
            clauses
                .clauses
                .iter()
                .map(|d| d.value.pred.to_token_stream())
                .collect()
        })
        .unwrap_or_default();

    PGenerics {
        params,
        where_predicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    fn parse_ok(tokens: TokenStream) -> RecordDescriptor {
        match parse_record(tokens) {
            Ok(record) => record,
            Err(errors) => panic!(
                "expected success, got {:?}",
                errors.iter().map(|e| &e.message).collect::<Vec<_>>()
            ),
        }
    }

    fn parse_err(tokens: TokenStream) -> Vec<String> {
        match parse_record(tokens) {
            Ok(_) => panic!("expected an error"),
            Err(errors) => errors.into_iter().map(|e| e.message).collect(),
        }
    }

    #[test]
    fn named_fields_in_declaration_order() {
        let record = parse_ok(quote! {
            /// A person.
            pub struct Person {
                /// Full name.
                pub name: String,
                age: u32,
            }
        });
        assert_eq!(record.name.to_string(), "Person");
        assert_eq!(record.kind, RecordKind::Named);
        assert_eq!(record.vis.to_string(), "pub");
        let names: Vec<_> = record.fields.iter().map(|f| f.name.raw.display()).collect();
        assert_eq!(names, ["name", "age"]);
        assert_eq!(record.fields[0].ty.to_string(), "String");
        assert_eq!(record.fields[0].attrs.doc.len(), 1);
        assert_eq!(record.fields[1].position, 1);
        assert_eq!(record.attrs.doc.len(), 1);
    }

    #[test]
    fn tuple_fields_are_positional() {
        let record = parse_ok(quote! { struct Pair(pub u8, Vec<String>); });
        assert_eq!(record.kind, RecordKind::Tuple);
        assert_eq!(record.fields[1].name.raw, IdentOrIndex::Index(1));
        assert_eq!(record.fields[1].name.setter.to_string(), "field_1");
        assert_eq!(record.fields[1].ty.to_string(), "Vec < String >");
        assert!(record.vis.is_empty());
    }

    #[test]
    fn unit_struct_has_no_fields() {
        let record = parse_ok(quote! { pub(crate) struct Marker; });
        assert_eq!(record.kind, RecordKind::Unit);
        assert!(record.fields.is_empty());
        assert_eq!(record.vis.to_string(), "pub (crate)");
    }

    #[test]
    fn generics_split_into_params_and_predicates() {
        let record = parse_ok(quote! {
            struct Holder<'a, T: Clone + 'a = u8, const N: usize = 4>
            where
                T: Default,
            {
                items: &'a [T; N],
            }
        });
        let decl: Vec<String> = record.generics.decl().iter().map(|t| t.to_string()).collect();
        assert_eq!(decl, ["'a", "T : Clone + 'a", "const N : usize"]);
        let preds: Vec<String> = record
            .generics
            .where_predicates
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(preds, ["T : Default"]);
    }

    #[test]
    fn container_options() {
        let record = parse_ok(quote! {
            #[staged(builder = PersonMaker, entry = start, finalize = finish, crate = ::my::staged, checked)]
            struct Person { name: String }
        });
        assert_eq!(record.builder_ident().to_string(), "PersonMaker");
        assert_eq!(record.entry_ident().to_string(), "start");
        assert_eq!(record.finalize_ident().to_string(), "finish");
        assert_eq!(record.staged_crate().to_string(), ":: my :: staged");
        assert!(record.attrs.checked);
    }

    #[test]
    fn field_options() {
        let record = parse_ok(quote! {
            struct Person {
                #[staged(setter = with_name, into)]
                name: String,
            }
        });
        let field = &record.fields[0];
        assert_eq!(field.name.setter.to_string(), "with_name");
        assert_eq!(field.name.slot().to_string(), "name");
        assert!(field.attrs.into);
    }

    #[test]
    fn enums_and_unions_are_rejected() {
        let errors = parse_err(quote! { enum Color { Red, Green } });
        assert!(errors[0].contains("only supports structs"), "{errors:?}");
        assert!(errors[0].contains("an enum"), "{errors:?}");

        let errors = parse_err(quote! { union Bits { a: u32, b: f32 } });
        assert!(errors[0].contains("a union"), "{errors:?}");
    }

    #[test]
    fn unknown_and_misplaced_options_are_all_reported() {
        let errors = parse_err(quote! {
            #[staged(frobnicate, into)]
            struct Person {
                #[staged(checked)]
                name: String,
            }
        });
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].contains("unknown `#[staged]` option `frobnicate`"));
        assert!(errors[1].contains("field option"));
        assert!(errors[2].contains("struct option"));
    }

    #[test]
    fn malformed_option_values() {
        let errors = parse_err(quote! {
            #[staged(builder, checked = yes)]
            struct Person { name: String }
        });
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("expects an identifier"));
        assert!(errors[1].contains("takes no value"));

        let errors = parse_err(quote! {
            struct Person {
                #[staged(setter = "name")]
                name: String,
            }
        });
        assert!(errors[0].contains("single identifier"), "{errors:?}");
    }

    #[test]
    fn repeated_option_is_an_error() {
        let errors = parse_err(quote! {
            #[staged(entry = a)]
            #[staged(entry = b)]
            struct Person { name: String }
        });
        assert!(errors[0].contains("more than once"), "{errors:?}");
    }
}
