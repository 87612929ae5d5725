//! Field-level `#[xdb(...)]` attribute parsing shared by both derives.

use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

/// A field that takes part in mapping.
pub(crate) struct MappedField {
    pub ident: syn::Ident,
    pub ty: syn::Type,
    pub col: Option<String>,
    pub embed: bool,
}

impl MappedField {
    /// The `::xdb::FieldInfo` entry; embedded tables come from `trait_path`.
    pub fn field_info(&self, trait_path: &TokenStream) -> TokenStream {
        let name = self.ident.to_string();
        let ty = &self.ty;
        if self.embed {
            return quote! { ::xdb::FieldInfo::embed(#name, <#ty as #trait_path>::FIELDS) };
        }
        match &self.col {
            Some(col) => {
                quote! { ::xdb::FieldInfo::field(#name, ::core::option::Option::Some(#col)) }
            }
            None => quote! { ::xdb::FieldInfo::field(#name, ::core::option::Option::None) },
        }
    }
}

/// Index literal usable in a slice pattern.
pub(crate) fn index(i: usize) -> Literal {
    Literal::usize_unsuffixed(i)
}

#[derive(Default)]
struct FieldAttr {
    col: Option<String>,
    embed: bool,
    skip: bool,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "embed" {
                attr.embed = true;
            } else if ident == "skip" {
                attr.skip = true;
            } else if ident == "col" {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                attr.col = Some(value.value());
            } else {
                return Err(syn::Error::new_spanned(
                    &ident,
                    "unknown xdb attribute, expected `col = \"...\"`, `embed` or `skip`",
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attr)
    }
}

/// The named fields of `input` in declaration order, without skipped ones.
pub(crate) fn mapped_fields(input: &DeriveInput, derive: &str) -> Result<Vec<MappedField>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{derive} can only be derived for structs with named fields"),
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs"),
            ));
        }
    };

    let mut mapped = Vec::with_capacity(fields.len());
    for field in fields {
        let mut attr = FieldAttr::default();
        for a in field.attrs.iter().filter(|a| a.path().is_ident("xdb")) {
            let parsed: FieldAttr = a.parse_args()?;
            attr.col = parsed.col.or(attr.col);
            attr.embed |= parsed.embed;
            attr.skip |= parsed.skip;
        }
        if attr.skip {
            continue;
        }
        if attr.embed && attr.col.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "`embed` and `col` cannot be combined",
            ));
        }
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        mapped.push(MappedField {
            ident,
            ty: field.ty.clone(),
            col: attr.col,
            embed: attr.embed,
        });
    }
    Ok(mapped)
}
