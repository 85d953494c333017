//! Procedural macros for bonfig schema declarations.
//!
//! `#[derive(Bonfig)]` turns a struct of `Field<T>` handles into an
//! implementation of `Declare`, using each member's identifier as the field
//! name unless one is given explicitly:
//!
//! ```ignore
//! #[derive(Bonfig)]
//! #[bonfig(store = "d")]
//! struct Basic {
//!     #[bonfig(default = "foo")]
//!     a: Field<String>,
//!     #[bonfig(section = ["Output"], default = 1234)]
//!     pin: Field<i64>,
//!     #[bonfig(store = "environ", name = "HOME")]
//!     home: Field<String>,
//! }
//! ```
//!
//! Struct attributes: `store` (default store for every member), `name`
//! (schema name, defaults to the struct name), `crate` (path the generated
//! code uses instead of `::bonfig`).
//!
//! Member attributes: `store`, `section` (one name or an array, outermost
//! first), `name`, `default` (any expression of the field's type),
//! `format` (date-time format string), `separator` (list separator), and
//! `extends` for members whose type itself derives `Bonfig`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{
    Data, DeriveInput, Expr, ExprLit, Fields, GenericArgument, Lit, LitStr, Path, PathArguments,
    Type, parse_macro_input,
};

/// Derives `Declare` for a struct whose members are field handles.
#[proc_macro_derive(Bonfig, attributes(bonfig))]
pub fn derive_bonfig(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct ContainerAttrs {
    store: Option<LitStr>,
    name: Option<LitStr>,
    krate: Option<Path>,
}

impl ContainerAttrs {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut attrs = Self::default();
        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("bonfig")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("store") {
                    attrs.store = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("name") {
                    attrs.name = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("crate") {
                    let path: LitStr = meta.value()?.parse()?;
                    attrs.krate = Some(path.parse()?);
                } else {
                    return Err(meta.error("expected `store`, `name` or `crate`"));
                }
                Ok(())
            })?;
        }
        Ok(attrs)
    }
}

#[derive(Default)]
struct MemberAttrs {
    store: Option<LitStr>,
    section: Vec<LitStr>,
    name: Option<LitStr>,
    default: Option<Expr>,
    format: Option<LitStr>,
    separator: Option<LitStr>,
    extends: bool,
}

impl MemberAttrs {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        let mut attrs = Self::default();
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("bonfig")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("store") {
                    attrs.store = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("section") {
                    attrs.section = parse_sections(&meta)?;
                } else if meta.path.is_ident("name") {
                    attrs.name = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("default") {
                    attrs.default = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("format") {
                    attrs.format = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("separator") {
                    attrs.separator = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("extends") {
                    attrs.extends = true;
                } else {
                    return Err(meta.error(
                        "expected `store`, `section`, `name`, `default`, `format`, `separator` or `extends`",
                    ));
                }
                Ok(())
            })?;
        }

        if attrs.format.is_some() && attrs.separator.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "`format` and `separator` cannot be combined",
            ));
        }
        if attrs.extends
            && (attrs.store.is_some()
                || !attrs.section.is_empty()
                || attrs.name.is_some()
                || attrs.default.is_some()
                || attrs.format.is_some()
                || attrs.separator.is_some())
        {
            return Err(syn::Error::new_spanned(
                field,
                "`extends` takes no other options",
            ));
        }
        Ok(attrs)
    }
}

/// Accepts `section = "A"` or `section = ["A", "B"]`.
fn parse_sections(meta: &ParseNestedMeta<'_>) -> syn::Result<Vec<LitStr>> {
    let expr: Expr = meta.value()?.parse()?;
    let elems: Vec<Expr> = match expr {
        Expr::Array(array) => array.elems.into_iter().collect(),
        other => vec![other],
    };
    elems
        .into_iter()
        .map(|elem| match elem {
            Expr::Lit(ExprLit {
                lit: Lit::Str(name),
                ..
            }) => Ok(name),
            other => Err(syn::Error::new_spanned(
                other,
                "section names must be string literals",
            )),
        })
        .collect()
}

/// Returns `T` for a member typed `Field<T>`.
fn field_value_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Field" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Bonfig can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "Bonfig requires a struct with named fields",
        ));
    };

    let container = ContainerAttrs::parse(input)?;
    let krate = container
        .krate
        .clone()
        .unwrap_or_else(|| syn::parse_quote!(::bonfig));
    let ident = &input.ident;
    let schema_name = container
        .name
        .clone()
        .unwrap_or_else(|| LitStr::new(&ident.unraw().to_string(), ident.span()));

    let mut members = Vec::with_capacity(fields.named.len());
    let mut statements = Vec::with_capacity(fields.named.len());
    for field in &fields.named {
        let Some(member) = field.ident.as_ref() else {
            continue;
        };
        let attrs = MemberAttrs::parse(field)?;
        statements.push(declare_member(&krate, &container, member, field, attrs)?);
        members.push(member);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics #krate::Declare for #ident #ty_generics #where_clause {
            const SCHEMA_NAME: &'static str = #schema_name;

            fn declare(
                __bonfig_builder: &mut #krate::SchemaBuilder,
            ) -> #krate::SchemaResult<Self> {
                #(#statements)*
                ::core::result::Result::Ok(Self { #(#members),* })
            }
        }
    })
}

fn declare_member(
    krate: &Path,
    container: &ContainerAttrs,
    member: &syn::Ident,
    field: &syn::Field,
    attrs: MemberAttrs,
) -> syn::Result<TokenStream2> {
    let ty = &field.ty;
    if attrs.extends {
        return Ok(quote! {
            let #member = <#ty as #krate::Declare>::declare(__bonfig_builder)?;
        });
    }

    let Some(value_type) = field_value_type(ty) else {
        return Err(syn::Error::new_spanned(
            ty,
            "expected `Field<T>`; mark embedded schemas with #[bonfig(extends)]",
        ));
    };
    let Some(store) = attrs.store.as_ref().or(container.store.as_ref()) else {
        return Err(syn::Error::new_spanned(
            member,
            "no store given; add #[bonfig(store = \"..\")] to the struct or this member",
        ));
    };
    let name = attrs
        .name
        .unwrap_or_else(|| LitStr::new(&member.unraw().to_string(), member.span()));
    let sections = &attrs.section;

    let scope = quote! { __bonfig_builder.store(#store)? #(.section(#sections)?)* };
    let spec = if let Some(format) = &attrs.format {
        quote! { #scope.datetime(#name, #format)? }
    } else if let Some(separator) = &attrs.separator {
        quote! { #scope.list(#name, #separator)? }
    } else {
        quote! { #scope.field::<#value_type>(#name)? }
    };
    let spec = match &attrs.default {
        Some(Expr::Lit(ExprLit {
            lit: Lit::Str(text),
            ..
        })) => quote! { #spec.default(#text) },
        Some(expr) => quote! {
            #spec.default({
                let value: #value_type = #expr;
                value
            })
        },
        None => spec,
    };

    Ok(quote! {
        let #member = {
            let spec = #spec;
            __bonfig_builder.add(spec)?
        };
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_field_value_type() {
        let ty: Type = syn::parse_quote!(bonfig::Field<Vec<String>>);
        let inner = field_value_type(&ty).expect("field type");
        assert_eq!(quote!(#inner).to_string(), quote!(Vec<String>).to_string());

        let plain: Type = syn::parse_quote!(Option<String>);
        assert!(field_value_type(&plain).is_none());
    }

    #[test]
    fn member_names_default_to_identifiers() {
        let input: DeriveInput = syn::parse_quote! {
            #[bonfig(store = "d")]
            struct Basic {
                #[bonfig(section = ["Output", "Deep"], default = 1234)]
                pin: Field<i64>,
                r#type: Field<String>,
            }
        };
        let expanded = expand(&input).expect("expands").to_string();
        assert!(expanded.contains("\"pin\""));
        assert!(expanded.contains("\"type\""));
        assert!(expanded.contains("\"Deep\""));
        assert!(expanded.contains("SCHEMA_NAME"));
    }

    #[test]
    fn missing_store_is_an_error() {
        let input: DeriveInput = syn::parse_quote! {
            struct Basic {
                a: Field<String>,
            }
        };
        let err = expand(&input).expect_err("no store");
        assert!(err.to_string().contains("no store given"));
    }

    #[test]
    fn non_field_members_need_extends() {
        let input: DeriveInput = syn::parse_quote! {
            #[bonfig(store = "d")]
            struct Derived {
                base: Base,
            }
        };
        assert!(expand(&input).is_err());

        let input: DeriveInput = syn::parse_quote! {
            #[bonfig(store = "d")]
            struct Derived {
                #[bonfig(extends)]
                base: Base,
            }
        };
        assert!(expand(&input).is_ok());
    }
}
