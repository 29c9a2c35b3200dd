//! The runtime-checked builder, emitted with `#[staged(checked)]`.
//!
//! Same fields, but presence lives in a `PresenceMask` next to one `Option`
//! per field instead of in the type. Setters borrow mutably and fail on a
//! second call; `build` fails if anything is missing. An explicit `Drop`
//! releases whatever is still held, in declaration order.

use proc_macro2::{Literal, TokenStream};
use quote::quote;

use crate::generate::{Ctx, angle};

pub(crate) fn emit(ctx: &Ctx<'_>) -> TokenStream {
    let mut out = TokenStream::new();
    out.extend(checked_struct(ctx));
    out.extend(checked_impl(ctx));
    out.extend(drop_impl(ctx));
    out.extend(debug_impl(ctx));
    out
}

/// `Name::checked_builder()`, spliced into the record's inherent impl.
pub(crate) fn entry(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        record,
        staged,
        checked,
        slots,
        ..
    } = ctx;
    let vis = &record.vis;
    let count = ctx.count();
    let checked_ty = ctx.checked_ty();
    let doc = format!(
        "Returns an empty [`{checked}`], which tracks presence at runtime instead of in its type."
    );

    quote! {
        #[doc = #doc]
        #[inline]
        #vis fn checked_builder() -> #checked_ty {
            #checked {
                #(#slots: ::core::option::Option::None,)*
                __mask: #staged::PresenceMask::new(#count),
                __marker: ::core::marker::PhantomData,
            }
        }
    }
}

/// `into_checked`, spliced into the typed builder's all-states impl.
pub(crate) fn into_checked(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        staged,
        checked,
        states,
        slots,
        ..
    } = ctx;
    let count = ctx.count();
    let checked_ty = ctx.checked_ty();
    let doc = format!(
        "Moves the fields set so far into a [`{checked}`] with the same presence."
    );

    let moves = ctx
        .fields()
        .iter()
        .zip(states)
        .zip(slots)
        .map(|((field, state), slot)| {
            let ty = &field.ty;
            let position = Literal::usize_unsuffixed(field.position);
            quote! {
                let #slot = <#state as #staged::Slot<#ty>>::into_option(self.#slot);
                if #slot.is_some() {
                    __mask.set(#position);
                }
            }
        });

    quote! {
        #[doc = #doc]
        pub fn into_checked(self) -> #checked_ty {
            #[allow(unused_mut)]
            let mut __mask = #staged::PresenceMask::new(#count);
            #(#moves)*
            #checked {
                #(#slots,)*
                __mask,
                __marker: ::core::marker::PhantomData,
            }
        }
    }
}

fn checked_struct(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        record,
        staged,
        checked,
        decl,
        slots,
        record_ty,
        record_name,
        finalize,
        ..
    } = ctx;
    let vis = &record.vis;
    let allows = ctx.allows();
    let generics = angle(decl);
    let where_clause = ctx.record_where();
    let tys = ctx.fields().iter().map(|f| &f.ty);
    let doc = format!(
        "Runtime-checked builder for [`{record_name}`].\n\n\
         Setters return an error instead of failing to compile when a field is set twice, \
         and `{finalize}` returns an error naming the first field that was never set. \
         Dropping the builder releases every field it still holds, in declaration order."
    );

    let record_docs = ctx.record_docs();

    quote! {
        #[doc = #doc]
        #record_docs
        #allows
        #vis struct #checked #generics #where_clause {
            #(#slots: ::core::option::Option<#tys>,)*
            __mask: #staged::PresenceMask,
            __marker: ::core::marker::PhantomData<fn() -> #record_ty>,
        }
    }
}

fn checked_impl(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        record,
        staged,
        decl,
        slots,
        field_names,
        record_ty,
        record_name,
        finalize,
        ..
    } = ctx;
    let name = &record.name;
    let allows = ctx.allows();
    let generics = angle(decl);
    let where_clause = ctx.record_where();
    let checked_ty = ctx.checked_ty();
    let count = ctx.count();
    let positions: Vec<Literal> = ctx
        .fields()
        .iter()
        .map(|f| Literal::usize_unsuffixed(f.position))
        .collect();

    let setters = ctx.fields().iter().enumerate().map(|(index, field)| {
        let ty = &field.ty;
        let setter = &field.name.setter;
        let slot = &slots[index];
        let field_name = &field_names[index];
        let position = &positions[index];

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
            let text = format!(
                "Sets `{field_name}`, or fails with `StagedError::AlreadySet` if it already holds a value."
            );
            quote! { #[doc = #text] }
        } else {
            quote! { #(#[doc = #docs])* }
        };

        quote! {
            #doc
            pub fn #setter(
                &mut self,
                value: #param_ty,
            ) -> ::core::result::Result<&mut Self, #staged::StagedError> {
                if self.__mask.get(#position) {
                    #staged::trace!(record = #record_name, field = #field_name, "field already set, rejecting value");
                    return ::core::result::Result::Err(#staged::StagedError::AlreadySet {
                        record: #record_name,
                        field: #field_name,
                    });
                }
                self.#slot = ::core::option::Option::Some(#value);
                self.__mask.set(#position);
                #staged::trace!(record = #record_name, field = #field_name, "field set");
                ::core::result::Result::Ok(self)
            }
        }
    });

    let takes = slots.iter().zip(field_names).map(|(slot, field_name)| {
        quote! {
            let ::core::option::Option::Some(#slot) = self.#slot.take() else {
                return ::core::result::Result::Err(#staged::StagedError::Missing {
                    record: #record_name,
                    field: #field_name,
                });
            };
        }
    });
    let inits = ctx.fields().iter().zip(slots).map(|(field, slot)| {
        let raw = &field.name.raw;
        quote! { #raw: #slot }
    });
    let self_param = if ctx.fields().is_empty() {
        quote! { self }
    } else {
        quote! { mut self }
    };

    quote! {
        #allows
        impl #generics #checked_ty #where_clause {
            /// Field names, in declaration order.
            pub const FIELD_NAMES: [&'static str; #count] = [#(#field_names),*];

            #(#setters)*

            /// Which fields currently hold a value, in declaration order.
            pub fn presence(&self) -> [bool; #count] {
                [#(self.__mask.get(#positions)),*]
            }

            /// Returns the finished record, or `StagedError::Missing` naming the
            /// first field that was never set. On error the builder is dropped
            /// and releases the fields it holds.
            pub fn #finalize(#self_param) -> ::core::result::Result<#record_ty, #staged::StagedError> {
                if let ::core::option::Option::Some(missing) = self.__mask.first_unset() {
                    let field = Self::FIELD_NAMES[missing];
                    #staged::debug!(record = #record_name, field, "build failed: field never set");
                    return ::core::result::Result::Err(#staged::StagedError::Missing {
                        record: #record_name,
                        field,
                    });
                }
                #(#takes)*
                #staged::debug!(record = #record_name, "finalized");
                ::core::result::Result::Ok(#name { #(#inits),* })
            }
        }
    }
}

/// The explicit cleanup coordinator for the checked builder.
fn drop_impl(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx {
        staged,
        decl,
        slots,
        field_names,
        record_name,
        ..
    } = ctx;
    let generics = angle(decl);
    let where_clause = ctx.record_where();
    let checked_ty = ctx.checked_ty();

    let releases = ctx
        .fields()
        .iter()
        .zip(slots)
        .zip(field_names)
        .map(|((field, slot), field_name)| {
            let position = Literal::usize_unsuffixed(field.position);
            quote! {
                if let ::core::option::Option::Some(_released) = self.#slot.take() {
                    self.__mask.unset(#position);
                    #staged::trace!(record = #record_name, field = #field_name, "releasing field of unfinished builder");
                }
            }
        });

    quote! {
        #[automatically_derived]
        impl #generics ::core::ops::Drop for #checked_ty #where_clause {
            fn drop(&mut self) {
                #(#releases)*
            }
        }
    }
}

fn debug_impl(ctx: &Ctx<'_>) -> TokenStream {
    let Ctx { checked, decl, .. } = ctx;
    let generics = angle(decl);
    let where_clause = ctx.record_where();
    let checked_ty = ctx.checked_ty();
    let checked_name = checked.to_string();

    quote! {
        #[automatically_derived]
        impl #generics ::core::fmt::Debug for #checked_ty #where_clause {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                let mut s = f.debug_struct(#checked_name);
                for (name, present) in Self::FIELD_NAMES.iter().zip(self.presence()) {
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
