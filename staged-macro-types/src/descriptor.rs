use proc_macro2::{Ident, Punct, Spacing, Span, TokenStream, TokenTree};
use quote::{ToTokens, format_ident, quote, quote_spanned};

/// A field's raw name: an identifier for named structs, a position for
/// tuple structs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentOrIndex {
    /// Named field identifier, possibly raw (`r#type`)
    Ident(Ident),
    /// Tuple field index
    Index(usize),
}

impl IdentOrIndex {
    /// The name as users read it: `r#` stripped, indices as digits.
    pub fn display(&self) -> String {
        match self {
            IdentOrIndex::Ident(ident) => {
                let s = ident.to_string();
                match s.strip_prefix("r#") {
                    Some(stripped) => stripped.to_string(),
                    None => s,
                }
            }
            IdentOrIndex::Index(index) => index.to_string(),
        }
    }

    /// Span to attach diagnostics about this field to.
    pub fn span(&self) -> Span {
        match self {
            IdentOrIndex::Ident(ident) => ident.span(),
            IdentOrIndex::Index(_) => Span::call_site(),
        }
    }
}

impl ToTokens for IdentOrIndex {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            IdentOrIndex::Ident(ident) => tokens.extend(quote! { #ident }),
            IdentOrIndex::Index(index) => {
                let unsuffixed = proc_macro2::Literal::usize_unsuffixed(*index);
                tokens.extend(quote! { #unsuffixed })
            }
        }
    }
}

impl std::fmt::Display for IdentOrIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentOrIndex::Ident(ident) => write!(f, "{ident}"),
            IdentOrIndex::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A parsed field name: the raw name plus the setter it gets.
///
/// Examples:
///
///   raw = `name`, no override, setter = `name`
///   raw = `name`, `#[staged(setter = with_name)]`, setter = `with_name`
///   raw = `1` (tuple field), no override, setter = `field_1`
#[derive(Debug, Clone)]
pub struct PName {
    /// The raw identifier or index, as found in the source code.
    pub raw: IdentOrIndex,
    /// The setter method name.
    pub setter: Ident,
}

impl PName {
    /// Resolves the setter name: the override if given, otherwise derived
    /// from the raw name.
    pub fn new(raw: IdentOrIndex, setter_override: Option<Ident>) -> Self {
        let setter = setter_override.unwrap_or_else(|| match &raw {
            IdentOrIndex::Ident(ident) => ident.clone(),
            IdentOrIndex::Index(index) => format_ident!("field_{}", index),
        });
        Self { raw, setter }
    }

    /// Name of the builder's private storage for this field.
    pub fn slot(&self) -> Ident {
        match &self.raw {
            IdentOrIndex::Ident(ident) => ident.clone(),
            IdentOrIndex::Index(index) => format_ident!("field_{}", index),
        }
    }
}

/// Field-level options, from `#[staged(...)]` and doc comments.
#[derive(Debug, Clone, Default)]
pub struct PFieldAttrs {
    /// Doc comment literals, carried onto the setter.
    pub doc: Vec<TokenStream>,
    /// Whether the setter takes `impl Into<T>`.
    pub into: bool,
}

/// One field of the record: name, semantic type, position.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Raw and setter names
    pub name: PName,
    /// The field's type, verbatim
    pub ty: TokenStream,
    /// Zero-based declaration position
    pub position: usize,
    /// Options
    pub attrs: PFieldAttrs,
}

impl FieldDescriptor {
    /// A named field with default options.
    pub fn new(name: Ident, ty: TokenStream, position: usize) -> Self {
        Self {
            name: PName::new(IdentOrIndex::Ident(name), None),
            ty,
            position,
            attrs: PFieldAttrs::default(),
        }
    }
}

/// Container-level options, from `#[staged(...)]` and doc comments.
#[derive(Debug, Clone, Default)]
pub struct PRecordAttrs {
    /// Doc comment literals on the record
    pub doc: Vec<TokenStream>,
    /// `builder = Name`
    pub builder: Option<Ident>,
    /// `entry = name`
    pub entry: Option<Ident>,
    /// `finalize = name`
    pub finalize: Option<Ident>,
    /// `crate = path`
    pub crate_path: Option<TokenStream>,
    /// `checked`
    pub checked: bool,
}

/// How the record's fields are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `struct S { a: A }`
    Named,
    /// `struct S(A);`
    Tuple,
    /// `struct S;`
    Unit,
}

/// A lifetime name without its tick; the tick is added back, joint, when
/// the lifetime is emitted.
#[derive(Debug, Clone)]
pub struct LifetimeName(pub Ident);

impl ToTokens for LifetimeName {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let punct = TokenTree::Punct(Punct::new('\'', Spacing::Joint));
        let name = &self.0;
        tokens.extend(quote! {
            #punct #name
        });
    }
}

/// One generic parameter, with its default dropped.
#[derive(Debug, Clone)]
pub enum PGenericParam {
    /// `'a: 'b`
    Lifetime {
        /// The lifetime
        name: LifetimeName,
        /// Outlives bounds, without the colon
        bounds: Option<TokenStream>,
    },
    /// `T: Clone`
    Type {
        /// Parameter name
        name: Ident,
        /// Trait bounds, without the colon
        bounds: Option<TokenStream>,
    },
    /// `const N: usize`
    Const {
        /// Parameter name
        name: Ident,
        /// Parameter type
        ty: TokenStream,
    },
}

/// The record's generics, split into the pieces generated impls need.
#[derive(Debug, Clone, Default)]
pub struct PGenerics {
    /// Parameters in declaration order (lifetimes first, as Rust requires)
    pub params: Vec<PGenericParam>,
    /// Where predicates, without the `where` keyword
    pub where_predicates: Vec<TokenStream>,
}

impl PGenerics {
    /// Parameters as they appear after `impl`: bounds kept, defaults dropped.
    pub fn decl(&self) -> Vec<TokenStream> {
        self.params
            .iter()
            .map(|param| match param {
                PGenericParam::Lifetime { name, bounds } => match bounds {
                    Some(bounds) => quote! { #name: #bounds },
                    None => quote! { #name },
                },
                PGenericParam::Type { name, bounds } => match bounds {
                    Some(bounds) => quote! { #name: #bounds },
                    None => quote! { #name },
                },
                PGenericParam::Const { name, ty } => quote! { const #name: #ty },
            })
            .collect()
    }

    /// Parameters as arguments: `'a, T, N`.
    pub fn args(&self) -> Vec<TokenStream> {
        self.params
            .iter()
            .map(|param| match param {
                PGenericParam::Lifetime { name, .. } => quote! { #name },
                PGenericParam::Type { name, .. } | PGenericParam::Const { name, .. } => {
                    quote! { #name }
                }
            })
            .collect()
    }
}

/// Everything the generator needs to know about one record.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    /// Type name
    pub name: Ident,
    /// Visibility, carried onto the builder and entry points
    pub vis: TokenStream,
    /// Generic parameters and where clause
    pub generics: PGenerics,
    /// Field declaration style
    pub kind: RecordKind,
    /// Fields in declaration order
    pub fields: Vec<FieldDescriptor>,
    /// Container options
    pub attrs: PRecordAttrs,
}

impl RecordDescriptor {
    /// A plain descriptor: named fields, no generics, default options,
    /// positions assigned in iteration order.
    pub fn new(name: Ident, fields: impl IntoIterator<Item = (Ident, TokenStream)>) -> Self {
        let fields: Vec<_> = fields
            .into_iter()
            .enumerate()
            .map(|(position, (name, ty))| FieldDescriptor::new(name, ty, position))
            .collect();
        let kind = if fields.is_empty() {
            RecordKind::Unit
        } else {
            RecordKind::Named
        };
        Self {
            name,
            vis: quote! { pub },
            generics: PGenerics::default(),
            kind,
            fields,
            attrs: PRecordAttrs::default(),
        }
    }

    /// The record name as users read it.
    pub fn display_name(&self) -> String {
        let s = self.name.to_string();
        match s.strip_prefix("r#") {
            Some(stripped) => stripped.to_string(),
            None => s,
        }
    }

    /// `PersonBuilder`, or the `builder = ...` override.
    pub fn builder_ident(&self) -> Ident {
        match &self.attrs.builder {
            Some(ident) => ident.clone(),
            None => format_ident!("{}Builder", self.display_name()),
        }
    }

    /// `PersonCheckedBuilder`, derived from the builder name.
    pub fn checked_builder_ident(&self) -> Ident {
        let builder = self.builder_ident().to_string();
        match builder.strip_suffix("Builder") {
            Some(stem) => format_ident!("{}CheckedBuilder", stem),
            None => format_ident!("{}Checked", builder),
        }
    }

    /// The entry function name, `builder` by default.
    pub fn entry_ident(&self) -> Ident {
        self.attrs
            .entry
            .clone()
            .unwrap_or_else(|| format_ident!("builder"))
    }

    /// The finalizer name, `build` by default.
    pub fn finalize_ident(&self) -> Ident {
        self.attrs
            .finalize
            .clone()
            .unwrap_or_else(|| format_ident!("build"))
    }

    /// Path to the runtime crate, `::staged` by default.
    pub fn staged_crate(&self) -> TokenStream {
        self.attrs
            .crate_path
            .clone()
            .unwrap_or_else(|| quote! { ::staged })
    }
}

/// An error collected while turning source syntax into a descriptor.
#[derive(Debug, Clone)]
pub struct CompileError {
    /// The error message
    pub message: String,
    /// The span where the error occurred
    pub span: Span,
}

impl CompileError {
    /// Creates an error at `span`.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Renders the error as a spanned `compile_error!` invocation.
    pub fn to_compile_error(&self) -> TokenStream {
        let message = &self.message;
        quote_spanned! { self.span => compile_error!(#message); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_fields_get_positional_setters() {
        let name = PName::new(IdentOrIndex::Index(2), None);
        assert_eq!(name.setter.to_string(), "field_2");
        assert_eq!(name.slot().to_string(), "field_2");
        assert_eq!(name.raw.display(), "2");
    }

    #[test]
    fn setter_override_wins() {
        let name = PName::new(
            IdentOrIndex::Ident(format_ident!("name")),
            Some(format_ident!("with_name")),
        );
        assert_eq!(name.setter.to_string(), "with_name");
        assert_eq!(name.slot().to_string(), "name");
    }

    #[test]
    fn raw_identifiers_display_without_prefix() {
        let raw = IdentOrIndex::Ident(Ident::new_raw("type", Span::call_site()));
        assert_eq!(raw.display(), "type");
        assert_eq!(raw.to_string(), "r#type");
    }

    #[test]
    fn plain_descriptor_defaults() {
        let record = RecordDescriptor::new(
            format_ident!("Person"),
            [
                (format_ident!("name"), quote! { String }),
                (format_ident!("age"), quote! { u32 }),
            ],
        );
        assert_eq!(record.kind, RecordKind::Named);
        assert_eq!(record.fields[1].position, 1);
        assert_eq!(record.builder_ident().to_string(), "PersonBuilder");
        assert_eq!(
            record.checked_builder_ident().to_string(),
            "PersonCheckedBuilder"
        );
        assert_eq!(record.entry_ident().to_string(), "builder");
        assert_eq!(record.finalize_ident().to_string(), "build");
        assert_eq!(record.staged_crate().to_string(), ":: staged");
    }

    #[test]
    fn generics_decl_drops_nothing_but_defaults() {
        let generics = PGenerics {
            params: vec![
                PGenericParam::Lifetime {
                    name: LifetimeName(format_ident!("a")),
                    bounds: None,
                },
                PGenericParam::Type {
                    name: format_ident!("T"),
                    bounds: Some(quote! { Clone + 'a }),
                },
                PGenericParam::Const {
                    name: format_ident!("N"),
                    ty: quote! { usize },
                },
            ],
            where_predicates: Vec::new(),
        };
        let decl: Vec<String> = generics.decl().iter().map(|t| t.to_string()).collect();
        assert_eq!(decl, ["'a", "T : Clone + 'a", "const N : usize"]);
        let args: Vec<String> = generics.args().iter().map(|t| t.to_string()).collect();
        assert_eq!(args, ["'a", "T", "N"]);
    }
}
