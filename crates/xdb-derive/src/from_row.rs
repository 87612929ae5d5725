//! FromRow derive macro implementation

use crate::attrs::{index, mapped_fields};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = mapped_fields(&input, "FromRow")?;

    let trait_path = quote!(::xdb::FromRow);
    let infos = fields.iter().map(|f| f.field_info(&trait_path));

    let arms = fields.iter().enumerate().map(|(i, f)| {
        let i = index(i);
        let ident = &f.ident;
        if f.embed {
            quote! { [#i, rest @ ..] => ::xdb::FromRow::field_mut(&mut self.#ident, rest) }
        } else {
            quote! {
                [#i] => ::core::option::Option::Some(&mut self.#ident as &mut dyn ::xdb::DecodeRaw)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::xdb::FromRow for #name #ty_generics #where_clause {
            const FIELDS: &'static [::xdb::FieldInfo] = &[#(#infos),*];

            fn field_mut(
                &mut self,
                path: &[usize],
            ) -> ::core::option::Option<&mut dyn ::xdb::DecodeRaw> {
                match path {
                    #(#arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics ::xdb::RowSlot for #name #ty_generics #where_clause {
            type Target = Self;

            fn new_slot() -> Self {
                ::core::default::Default::default()
            }

            fn target(&mut self) -> &mut Self {
                self
            }
        }
    })
}
