use std::collections::HashSet;

use proc_macro2::{Group, Ident, Literal, TokenStream, TokenTree};
use quote::{format_ident, quote};
use staged_macro_types::{FieldDescriptor, IdentOrIndex, RecordDescriptor, RecordKind};

use crate::{GenerateError, checked, typed};

/// Everything the emitters share about one record, computed once.
pub(crate) struct Ctx<'a> {
    pub record: &'a RecordDescriptor,
    /// Path to the runtime crate
    pub staged: TokenStream,
    /// Record name as a string literal source, `r#` stripped
    pub record_name: String,
    pub builder: Ident,
    pub checked: Ident,
    pub entry: Ident,
    pub finalize: Ident,
    /// Record generics as declared after `impl`
    pub decl: Vec<TokenStream>,
    /// Record generics as arguments
    pub args: Vec<TokenStream>,
    /// Record where predicates
    pub preds: Vec<TokenStream>,
    /// One state parameter per field
    pub states: Vec<Ident>,
    /// Builder storage names
    pub slots: Vec<Ident>,
    /// Field names as users read them
    pub field_names: Vec<String>,
    /// `Person<'a, T>`
    pub record_ty: TokenStream,
}

impl<'a> Ctx<'a> {
    fn new(record: &'a RecordDescriptor) -> Self {
        let args = record.generics.args();
        Self {
            record,
            staged: record.staged_crate(),
            record_name: record.display_name(),
            builder: record.builder_ident(),
            checked: record.checked_builder_ident(),
            entry: record.entry_ident(),
            finalize: record.finalize_ident(),
            decl: record.generics.decl(),
            record_ty: record_ty(record),
            args,
            preds: record.generics.where_predicates.clone(),
            states: (0..record.fields.len())
                .map(|i| format_ident!("__S{}", i))
                .collect(),
            slots: record.fields.iter().map(|f| f.name.slot()).collect(),
            field_names: record.fields.iter().map(|f| f.name.raw.display()).collect(),
        }
    }

    pub fn fields(&self) -> &'a [FieldDescriptor] {
        &self.record.fields
    }

    /// Number of fields, as an unsuffixed literal.
    pub fn count(&self) -> Literal {
        Literal::usize_unsuffixed(self.record.fields.len())
    }

    /// `Builder<'a, T, S0, S1>` for the given field states.
    pub fn builder_ty(&self, states: &[TokenStream]) -> TokenStream {
        let builder = &self.builder;
        let params: Vec<TokenStream> = self.args.iter().chain(states).cloned().collect();
        let generics = angle(&params);
        quote! { #builder #generics }
    }

    /// `Checked<'a, T>`
    pub fn checked_ty(&self) -> TokenStream {
        let checked = &self.checked;
        let generics = angle(&self.args);
        quote! { #checked #generics }
    }

    /// `Absent<T_i>` for every field.
    pub fn absent_states(&self) -> Vec<TokenStream> {
        let staged = &self.staged;
        self.fields()
            .iter()
            .map(|f| {
                let ty = &f.ty;
                quote! { #staged::Absent<#ty> }
            })
            .collect()
    }

    /// `Present<T_i>` for every field.
    pub fn present_states(&self) -> Vec<TokenStream> {
        let staged = &self.staged;
        self.fields()
            .iter()
            .map(|f| {
                let ty = &f.ty;
                quote! { #staged::Present<#ty> }
            })
            .collect()
    }

    /// `S_i: Slot<T_i>` for every field whose index is accepted by `keep`.
    pub fn slot_bounds(&self, keep: impl Fn(usize) -> bool) -> Vec<TokenStream> {
        let staged = &self.staged;
        self.fields()
            .iter()
            .zip(&self.states)
            .filter(|(f, _)| keep(f.position))
            .map(|(f, state)| {
                let ty = &f.ty;
                quote! { #state: #staged::Slot<#ty> }
            })
            .collect()
    }

    /// The record's own where clause.
    pub fn record_where(&self) -> TokenStream {
        where_clause(&self.preds)
    }

    /// The record's own doc comment, appended to a builder's docs.
    pub fn record_docs(&self) -> TokenStream {
        let docs = &self.record.attrs.doc;
        if docs.is_empty() {
            quote! {}
        } else {
            quote! {
                #[doc = ""]
                #[doc = "# Record"]
                #[doc = ""]
                #(#[doc = #docs])*
            }
        }
    }

    /// Lints the generated items may trip in user crates.
    pub fn allows(&self) -> TokenStream {
        quote! {
            #[allow(dead_code, non_camel_case_types, clippy::type_complexity)]
        }
    }
}

/// `Person<'a, T>`
fn record_ty(record: &RecordDescriptor) -> TokenStream {
    let name = &record.name;
    let generics = angle(&record.generics.args());
    quote! { #name #generics }
}

/// Replaces `Self` in a field type with the record type. `Self` is not
/// valid in the builder's parameter defaults, bounds or impl headers.
fn resolve_self(ty: TokenStream, record_ty: &TokenStream) -> TokenStream {
    ty.into_iter()
        .flat_map(|tt| match tt {
            TokenTree::Ident(ident) if ident == "Self" => record_ty.clone(),
            TokenTree::Group(group) => {
                let mut resolved =
                    Group::new(group.delimiter(), resolve_self(group.stream(), record_ty));
                resolved.set_span(group.span());
                TokenStream::from(TokenTree::Group(resolved))
            }
            other => TokenStream::from(other),
        })
        .collect()
}

/// `<a, b>`, or nothing if there are no parameters.
pub(crate) fn angle(params: &[TokenStream]) -> TokenStream {
    if params.is_empty() {
        quote! {}
    } else {
        quote! { < #(#params),* > }
    }
}

/// `where a, b`, or nothing if there are no predicates.
pub(crate) fn where_clause(preds: &[TokenStream]) -> TokenStream {
    if preds.is_empty() {
        quote! {}
    } else {
        quote! { where #(#preds),* }
    }
}

/// Names generated code uses for its own storage and methods.
fn reserved_setters(record: &RecordDescriptor) -> Vec<(String, &'static str)> {
    let mut reserved = vec![
        (
            record.finalize_ident().to_string(),
            "the finalizer; rename the setter or use `#[staged(finalize = ...)]`",
        ),
        ("presence".to_string(), "presence introspection"),
        ("FIELD_NAMES".to_string(), "presence introspection"),
        ("PRESENCE".to_string(), "presence introspection"),
    ];
    if record.attrs.checked {
        reserved.push(("into_checked".to_string(), "conversion to the checked builder"));
    }
    reserved
}

/// Checks the descriptor list before anything is emitted.
fn validate(record: &RecordDescriptor) -> Result<(), GenerateError> {
    if record.kind == RecordKind::Unit && !record.fields.is_empty() {
        return Err(GenerateError::Malformed {
            message: format!("unit record `{}` cannot have fields", record.name),
            span: record.name.span(),
        });
    }

    let mut names = HashSet::new();
    let mut setters = HashSet::new();
    let reserved = reserved_setters(record);

    for (index, field) in record.fields.iter().enumerate() {
        let span = field.name.raw.span();
        if field.position != index {
            return Err(GenerateError::Malformed {
                message: format!(
                    "field `{}` is at index {index} but claims position {}",
                    field.name.raw, field.position
                ),
                span,
            });
        }
        match (&field.name.raw, record.kind) {
            (IdentOrIndex::Ident(_), RecordKind::Named) => {}
            (IdentOrIndex::Index(i), RecordKind::Tuple) if *i == index => {}
            (raw, kind) => {
                return Err(GenerateError::Malformed {
                    message: format!("field `{raw}` does not fit a {kind:?} record at index {index}"),
                    span,
                });
            }
        }

        let name = field.name.raw.display();
        if !names.insert(name.clone()) {
            return Err(GenerateError::DuplicateField { name, span });
        }

        let slot = field.name.slot().to_string();
        if slot == "__marker" || slot == "__mask" {
            return Err(GenerateError::ReservedName {
                name: slot,
                reserved_for: "builder storage",
                span,
            });
        }

        let setter = field.name.setter.to_string();
        if let Some(&(_, reserved_for)) = reserved.iter().find(|(r, _)| *r == setter) {
            return Err(GenerateError::ReservedName {
                name: setter,
                reserved_for,
                span: field.name.setter.span(),
            });
        }
        if !setters.insert(setter.clone()) {
            return Err(GenerateError::DuplicateSetter {
                name: setter,
                span: field.name.setter.span(),
            });
        }
    }

    if record.attrs.checked && record.entry_ident() == "checked_builder" {
        return Err(GenerateError::ReservedName {
            name: "checked_builder".to_string(),
            reserved_for: "the checked builder's entry point",
            span: record.name.span(),
        });
    }

    Ok(())
}

/// Generates the builder family for one record.
///
/// Output is deterministic and linear in the number of fields: one builder
/// type with one state parameter per field, one impl block per setter, one
/// for the finalizer, plus trait impls. With `checked` enabled the runtime
/// checked builder is emitted as well. On error nothing is emitted.
pub fn generate(record: &RecordDescriptor) -> Result<TokenStream, GenerateError> {
    validate(record)?;

    let mut resolved = record.clone();
    let own_ty = record_ty(record);
    for field in &mut resolved.fields {
        field.ty = resolve_self(core::mem::take(&mut field.ty), &own_ty);
    }
    let ctx = Ctx::new(&resolved);

    let mut out = typed::emit(&ctx);
    if record.attrs.checked {
        out.extend(checked::emit(&ctx));
    }
    Ok(out)
}
