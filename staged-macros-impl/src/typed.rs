//! The type-state builder: one generic state parameter per field.
//!
//! Field *i*'s parameter is `Absent<T_i>` until its setter runs and
//! `Present<T_i>` afterwards. Setters exist only in impl blocks where their
//! field is absent, the finalizer only where every field is present. The
//! builder has no `Drop` impl: releasing an unfinished builder is the
//! compiler's drop glue over its slots, which by construction touches
//! exactly the present fields, in declaration order.

use proc_macro2::TokenStream;
use quote::quote;

use crate::generate::{Ctx, angle, where_clause};

pub(crate) fn emit(ctx: &Ctx<'_>) -> TokenStream {
    let mut out = TokenStream::new();
    out.extend(builder_struct(ctx));
    out.extend(entry(ctx));
    out.extend(staged_impl(ctx));
    for index in 0..ctx.fields().len() {
        out.extend(setter(ctx, index));
    }
    out.extend(finalizer(ctx));
    out.extend(introspection(ctx));
    out.extend(debug_impl(ctx));
    out
}

/// `Builder { a: Absent::new(), ..., __marker: PhantomData }`
fn empty_builder(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        staged,
        builder,
        slots,
        ..
    } = ctx;
    quote! {
        #builder {
            #(#slots: #staged::Absent::new(),)*
            __marker: ::core::marker::PhantomData,
        }
    }
}

fn builder_struct(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        record,
        builder,
        decl,
        preds,
        states,
        slots,
        record_ty,
        record_name,
        entry,
        finalize,
        ..
    } = ctx;
    let vis = &record.vis;
    let allows = ctx.allows();

    let params: Vec<TokenStream> = decl
        .iter()
        .cloned()
        .chain(
            states
                .iter()
                .zip(ctx.absent_states())
                .map(|(state, absent)| quote! { #state = #absent }),
        )
        .collect();
    let generics = angle(&params);

    let mut all_preds = preds.clone();
    all_preds.extend(ctx.slot_bounds(|_| true));
    let where_clause = where_clause(&all_preds);

    let doc = format!(
        "Staged builder for [`{record_name}`].\n\n\
         Each type parameter tracks one field: `Absent` until its setter is called, \
         `Present` afterwards. Start from [`{record_name}::{entry}`], call every setter \
         in any order, then `{finalize}`. Dropping an unfinished builder releases \
         exactly the fields that were set."
    );

    let record_docs = ctx.record_docs();

    quote! {
        #[doc = #doc]
        #record_docs
        #[must_use = "a builder does nothing unless it is finalized"]
        #allows
        #vis struct #builder #generics #where_clause {
            #(#slots: #states,)*
            __marker: ::core::marker::PhantomData<fn() -> #record_ty>,
        }
    }
}

fn entry(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        record,
        builder,
        decl,
        record_ty,
        entry,
        ..
    } = ctx;
    let vis = &record.vis;
    let generics = angle(decl);
    let where_clause = ctx.record_where();
    let empty_ty = ctx.builder_ty(&ctx.absent_states());
    let empty = empty_builder(ctx);
    let checked_entry = ctx.record.attrs.checked.then(|| crate::checked::entry(ctx));
    let doc = format!("Returns an empty [`{builder}`]: every field absent.");

    quote! {
        #[allow(dead_code)]
        impl #generics #record_ty #where_clause {
            #[doc = #doc]
            #[inline]
            #vis fn #entry() -> #empty_ty {
                #empty
            }

            #checked_entry
        }
    }
}

fn staged_impl(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        staged,
        decl,
        record_ty,
        ..
    } = ctx;
    let generics = angle(decl);
    let where_clause = ctx.record_where();
    let empty_ty = ctx.builder_ty(&ctx.absent_states());
    let empty = empty_builder(ctx);

    quote! {
        #[automatically_derived]
        impl #generics #staged::Staged for #record_ty #where_clause {
            type Builder = #empty_ty;

            #[inline]
            fn builder() -> Self::Builder {
                #empty
            }
        }
    }
}

fn setter(ctx: &Ctx<'_>, index: usize) -> TokenStream {
    let Ctx {
        staged,
        builder,
        decl,
        preds,
        states,
        slots,
        record_name,
        field_names,
        ..
    } = ctx;
    let field = &ctx.fields()[index];
    let ty = &field.ty;
    let setter = &field.name.setter;
    let slot = &slots[index];
    let field_name = &field_names[index];
    let allows = ctx.allows();

    let params: Vec<TokenStream> = decl
        .iter()
        .cloned()
        .chain(
            states
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, state)| quote! { #state }),
        )
        .collect();
    let generics = angle(&params);

    let mut all_preds = preds.clone();
    all_preds.extend(ctx.slot_bounds(|i| i != index));
    let where_clause = where_clause(&all_preds);

    let with = |replacement: TokenStream| -> Vec<TokenStream> {
        states
            .iter()
            .enumerate()
            .map(|(i, state)| {
                if i == index {
                    replacement.clone()
                } else {
                    quote! { #state }
                }
            })
            .collect()
    };
    let before = ctx.builder_ty(&with(quote! { #staged::Absent<#ty> }));
    let after = ctx.builder_ty(&with(quote! { #staged::Present<#ty> }));

    let (param_ty, value) = if field.attrs.into {
        (
            quote! { impl ::core::convert::Into<#ty> },
            quote! { ::core::convert::Into::<#ty>::into(value) },
        )
    } else {
        (quote! { #ty }, quote! { value })
    };

    let docs = &field.attrs.doc;
    let doc = if docs.is_empty() {
        let text = format!("Sets `{field_name}`.");
        quote! { #[doc = #text] }
    } else {
        quote! { #(#[doc = #docs])* }
    };

    let rebuilt = slots.iter().map(|s| {
        if s == slot {
            quote! { #s: self.#s.fill(#value) }
        } else {
            quote! { #s: self.#s }
        }
    });

    quote! {
        #allows
        impl #generics #before #where_clause {
            #doc
            #[inline]
            pub fn #setter(self, value: #param_ty) -> #after {
                #staged::trace!(record = #record_name, field = #field_name, "field set");
                #builder {
                    #(#rebuilt,)*
                    __marker: ::core::marker::PhantomData,
                }
            }
        }
    }
}

fn finalizer(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        record,
        staged,
        decl,
        slots,
        record_ty,
        record_name,
        finalize,
        ..
    } = ctx;
    let name = &record.name;
    let allows = ctx.allows();
    let generics = angle(decl);
    let where_clause = ctx.record_where();
    let full_ty = ctx.builder_ty(&ctx.present_states());
    let doc = format!("Consumes the builder and returns the finished [`{record_name}`].");

    let inits = ctx.fields().iter().zip(slots).map(|(field, slot)| {
        let raw = &field.name.raw;
        quote! { #raw: self.#slot.into_inner() }
    });

    quote! {
        #allows
        impl #generics #full_ty #where_clause {
            #[doc = #doc]
            #[inline]
            pub fn #finalize(self) -> #record_ty {
                #staged::debug!(record = #record_name, "finalized");
                #name { #(#inits),* }
            }
        }

        #[automatically_derived]
        impl #generics #staged::Finalize for #full_ty #where_clause {
            type Output = #record_ty;

            #[inline]
            fn finalize(self) -> Self::Output {
                <#full_ty>::#finalize(self)
            }
        }
    }
}

/// Presence introspection, available in every state.
fn introspection(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        staged,
        decl,
        preds,
        states,
        field_names,
        ..
    } = ctx;
    let allows = ctx.allows();
    let count = ctx.count();

    let params: Vec<TokenStream> = decl
        .iter()
        .cloned()
        .chain(states.iter().map(|state| quote! { #state }))
        .collect();
    let generics = angle(&params);
    let mut all_preds = preds.clone();
    all_preds.extend(ctx.slot_bounds(|_| true));
    let where_clause = where_clause(&all_preds);
    let state_args: Vec<TokenStream> = states.iter().map(|s| quote! { #s }).collect();
    let self_ty = ctx.builder_ty(&state_args);

    let presence = ctx.fields().iter().zip(states).map(|(field, state)| {
        let ty = &field.ty;
        quote! { <#state as #staged::Slot<#ty>>::PRESENT }
    });
    let into_checked = ctx
        .record
        .attrs
        .checked
        .then(|| crate::checked::into_checked(ctx));

    quote! {
        #allows
        impl #generics #self_ty #where_clause {
            /// Field names, in declaration order.
            pub const FIELD_NAMES: [&'static str; #count] = [#(#field_names),*];

            /// Which fields hold a value in this state, in declaration order.
            pub const PRESENCE: [bool; #count] = [#(#presence),*];

            /// Returns [`Self::PRESENCE`]. Known at compile time; provided for
            /// convenience when only a value is at hand.
            #[inline]
            pub fn presence(&self) -> [bool; #count] {
                Self::PRESENCE
            }

            #into_checked
        }
    }
}

/// `Debug` that reports presence only, so field types need not be `Debug`.
fn debug_impl(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        builder,
        decl,
        preds,
        states,
        ..
    } = ctx;
    let allows = ctx.allows();
    let params: Vec<TokenStream> = decl
        .iter()
        .cloned()
        .chain(states.iter().map(|state| quote! { #state }))
        .collect();
    let generics = angle(&params);
    let mut all_preds = preds.clone();
    all_preds.extend(ctx.slot_bounds(|_| true));
    let where_clause = where_clause(&all_preds);
    let state_args: Vec<TokenStream> = states.iter().map(|s| quote! { #s }).collect();
    let self_ty = ctx.builder_ty(&state_args);
    let builder_name = builder.to_string();

    quote! {
        #[automatically_derived]
        #allows
        impl #generics ::core::fmt::Debug for #self_ty #where_clause {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                let mut s = f.debug_struct(#builder_name);
                for (name, present) in Self::FIELD_NAMES.iter().zip(Self::PRESENCE) {
                    if present {
                        s.field(name, &::core::format_args!("<present>"));
                    } else {
                        s.field(name, &::core::format_args!("<absent>"));
                    }
                }
                s.finish()
            }
        }
    }
}
