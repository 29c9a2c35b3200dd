//! Unsynn grammar for the declarations `#[derive(Staged)]` is applied to.
//!
//! Only as much of Rust's item syntax is modelled as the generator needs:
//! attributes, visibility, the item keyword, generics, where clauses and
//! the field list. Field types and bounds are captured verbatim.

use unsynn::*;

keyword! {
    /// The "struct" keyword.
    pub KStruct = "struct";
    /// The "enum" keyword.
    pub KEnum = "enum";
    /// The "union" keyword.
    pub KUnion = "union";
    /// The "pub" keyword.
    pub KPub = "pub";
    /// The "where" keyword.
    pub KWhere = "where";
    /// The "const" keyword.
    pub KConst = "const";
    /// The "doc" keyword.
    pub KDoc = "doc";
    /// The "staged" attribute name.
    pub KStaged = "staged";
}

operator! {
    /// Represents the '=' operator.
    pub Equals = "=";
    /// Represents the ''' of a lifetime.
    pub Apostrophe = "'";
}

/// Tokens up to (not including) a top-level `C`, with `<...>` kept together.
pub type VerbatimUntil<C> = Many<Cons<Except<C>, AngleTokenTree>>;

unsynn! {
    /// Parses either a `TokenTree` or `<...>` grouping (which is not a [`Group`] as far as proc-macros
    /// are concerned). A `->` is taken whole so its `>` never closes a grouping.
    #[derive(Clone)]
    pub struct AngleTokenTree(
        pub Either<RArrow, Either<Cons<Lt, Vec<Cons<Except<Gt>, AngleTokenTree>>, Gt>, TokenTree>>,
    );

    /// An outer attribute: `#[...]`
    pub struct Attribute {
        /// The `#`
        pub _pound: Pound,
        /// The bracketed body
        pub body: BracketGroupContaining<AttributeInner>,
    }

    /// What sits between the brackets of an attribute
    pub enum AttributeInner {
        /// `#[staged(...)]`
        Staged(StagedAttr),
        /// `#[doc = "..."]`, which is what `///` comments become
        Doc(DocInner),
        /// Anything else; ignored
        Any(Vec<TokenTree>),
    }

    /// `staged(...)`; the parenthesized list is parsed separately so that
    /// malformed options can be reported with a span instead of being ignored
    pub struct StagedAttr {
        /// The `staged` name
        pub _kw_staged: KStaged,
        /// The parenthesized options
        pub body: ParenthesisGroup,
    }

    /// `doc = "..."`
    pub struct DocInner {
        /// The `doc` name
        pub _kw_doc: KDoc,
        /// The `=`
        pub _eq: Equals,
        /// The doc text, still quoted
        pub value: LiteralString,
    }

    /// One option inside `#[staged(...)]`: `checked`, `setter = name`, ...
    pub struct StagedItem {
        /// Option name
        pub key: Ident,
        /// `= value`, if given
        pub value: Option<Cons<Equals, VerbatimUntil<Comma>>>,
    }

    /// Visibility: `pub`, `pub(crate)`, `pub(in path)`
    pub enum Vis {
        /// `pub(...)`
        PubIn(Cons<KPub, ParenthesisGroup>),
        /// plain `pub`
        Pub(KPub),
    }

    /// A lifetime: `'a`
    pub struct Lifetime {
        /// The tick
        pub _tick: Apostrophe,
        /// The name after the tick
        pub name: Ident,
    }

    /// `<...>` after the type name
    pub struct GenericParams {
        /// Opening angle bracket
        pub _lt: Lt,
        /// Comma-delimited list of generic parameters
        pub params: CommaDelimitedVec<GenericParam>,
        /// Closing angle bracket
        pub _gt: Gt,
    }

    /// One generic parameter
    pub enum GenericParam {
        /// `'a: 'b`
        Lifetime {
            /// The lifetime
            name: Lifetime,
            /// Outlives bounds
            bounds: Option<Cons<Colon, VerbatimUntil<Either<Comma, Gt>>>>,
        },
        /// `const N: usize = 3`
        Const {
            /// The `const` keyword
            _const: KConst,
            /// Parameter name
            name: Ident,
            /// The `:`
            _colon: Colon,
            /// Parameter type
            typ: VerbatimUntil<Either<Comma, Either<Gt, Equals>>>,
            /// Default value
            default: Option<Cons<Equals, VerbatimUntil<Either<Comma, Gt>>>>,
        },
        /// `T: Clone = u8`
        Type {
            /// Parameter name
            name: Ident,
            /// Trait bounds
            bounds: Option<Cons<Colon, VerbatimUntil<Either<Comma, Either<Gt, Equals>>>>>,
            /// Default type
            default: Option<Cons<Equals, VerbatimUntil<Either<Comma, Gt>>>>,
        },
    }

    /// `where A: B, C: D`
    pub struct WhereClauses {
        /// The `where` keyword
        pub _kw_where: KWhere,
        /// The predicates
        pub clauses: CommaDelimitedVec<WhereClause>,
    }

    /// One where predicate
    pub struct WhereClause {
        /// The predicate tokens
        pub pred: VerbatimUntil<Either<Comma, Either<Semicolon, BraceGroup>>>,
    }

    /// `struct`, `enum` or `union`
    pub enum ItemKeyword {
        /// `struct`
        Struct(KStruct),
        /// `enum`
        Enum(KEnum),
        /// `union`
        Union(KUnion),
    }

    /// A whole item as handed to a derive macro
    pub struct RecordDecl {
        /// Outer attributes
        pub attributes: Vec<Attribute>,
        /// Visibility
        pub vis: Option<Vis>,
        /// Item keyword
        pub keyword: ItemKeyword,
        /// Type name
        pub name: Ident,
        /// Generic parameters
        pub generics: Option<GenericParams>,
        /// Everything after the generics
        pub body: RecordBody,
    }

    /// The part of an item after its generics
    pub enum RecordBody {
        /// `where ... { a: A, b: B }`
        Named {
            /// Where clause
            clauses: Option<WhereClauses>,
            /// Fields
            fields: BraceGroupContaining<CommaDelimitedVec<NamedField>>,
        },
        /// `(A, B) where ...;`
        Tuple {
            /// Fields
            fields: ParenthesisGroupContaining<CommaDelimitedVec<TupleField>>,
            /// Where clause
            clauses: Option<WhereClauses>,
            /// The `;`
            _semi: Semicolon,
        },
        /// `where ...;`
        Unit {
            /// Where clause
            clauses: Option<WhereClauses>,
            /// The `;`
            _semi: Semicolon,
        },
        /// Enum and union bodies, or syntax this grammar does not model
        Other {
            /// The raw tokens
            tokens: Vec<TokenTree>,
        },
    }

    /// A named field: `pub name: Type`
    pub struct NamedField {
        /// Attributes
        pub attributes: Vec<Attribute>,
        /// Visibility
        pub vis: Option<Vis>,
        /// Field name
        pub name: Ident,
        /// The `:`
        pub _colon: Colon,
        /// Field type
        pub typ: VerbatimUntil<Comma>,
    }

    /// A tuple field: `pub Type`
    pub struct TupleField {
        /// Attributes
        pub attributes: Vec<Attribute>,
        /// Visibility
        pub vis: Option<Vis>,
        /// Field type
        pub typ: VerbatimUntil<Comma>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    fn parse_decl(input: TokenStream) -> RecordDecl {
        let mut it = input.to_token_iter();
        it.parse::<Cons<RecordDecl, EndOfStream>>()
            .expect("should parse")
            .first
    }

    #[test]
    fn named_struct_fields() {
        let decl = parse_decl(quote! {
            pub struct Person {
                /// Full name
                pub name: String,
                #[staged(into)]
                age: u32,
            }
        });
        assert_eq!(decl.name.to_string(), "Person");
        assert!(decl.vis.is_some());
        let RecordBody::Named { fields, .. } = &decl.body else {
            panic!("expected named fields");
        };
        let names: Vec<_> = fields
            .content
            .iter()
            .map(|d| d.value.name.to_string())
            .collect();
        assert_eq!(names, ["name", "age"]);
        assert_eq!(fields.content.iter().next().unwrap().value.attributes.len(), 1);
    }

    #[test]
    fn nested_generic_field_types_stay_whole() {
        let decl = parse_decl(quote! {
            struct Table {
                rows: HashMap<String, Vec<(u8, u16)>>,
                count: usize,
            }
        });
        let RecordBody::Named { fields, .. } = &decl.body else {
            panic!("expected named fields");
        };
        assert_eq!(fields.content.iter().count(), 2);
    }

    #[test]
    fn arrows_inside_angle_brackets_do_not_close_them() {
        let decl = parse_decl(quote! {
            struct Handler<F: Fn(u8) -> u8> {
                f: Result<fn() -> u8, ()>,
                g: F,
            }
        });
        let RecordBody::Named { fields, .. } = &decl.body else {
            panic!("expected named fields");
        };
        let types: Vec<String> = fields
            .content
            .iter()
            .map(|d| d.value.typ.to_token_stream().to_string())
            .collect();
        assert_eq!(types.len(), 2);
        assert!(types[0].starts_with("Result <") && types[0].ends_with('>'), "{types:?}");
        assert!(types[0].contains("u8"), "{types:?}");
        assert_eq!(types[1], "F");
        let generics = decl.generics.expect("generics");
        assert_eq!(generics.params.iter().count(), 1);
    }

    #[test]
    fn generics_and_where_clause() {
        let decl = parse_decl(quote! {
            struct Wrapper<'a, T: Clone + 'a, const N: usize> where T: Default {
                items: &'a [T; N],
            }
        });
        let generics = decl.generics.expect("generics");
        assert_eq!(generics.params.iter().count(), 3);
        let RecordBody::Named { clauses, .. } = &decl.body else {
            panic!("expected named fields");
        };
        assert!(clauses.is_some());
    }

    #[test]
    fn tuple_and_unit_structs() {
        let decl = parse_decl(quote! { struct Pair(u8, pub String); });
        assert!(matches!(decl.body, RecordBody::Tuple { .. }));

        let decl = parse_decl(quote! { struct Nothing; });
        assert!(matches!(decl.body, RecordBody::Unit { .. }));
    }

    #[test]
    fn enums_fall_through_to_other() {
        let decl = parse_decl(quote! { enum Color { Red, Green } });
        assert!(matches!(decl.keyword, ItemKeyword::Enum(_)));
        assert!(matches!(decl.body, RecordBody::Other { .. }));
    }
}
