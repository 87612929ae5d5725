//! ToArgs derive macro implementation

use crate::attrs::{index, mapped_fields};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = mapped_fields(&input, "ToArgs")?;

    let trait_path = quote!(::xdb::ToArgs);
    let infos = fields.iter().map(|f| f.field_info(&trait_path));

    let arms = fields.iter().enumerate().map(|(i, f)| {
        let i = index(i);
        let ident = &f.ident;
        if f.embed {
            quote! { [#i, rest @ ..] => ::xdb::ToArgs::field_arg(&self.#ident, rest) }
        } else {
            quote! { [#i] => ::core::option::Option::Some(::xdb::ToArg::to_arg(&self.#ident)) }
        }
    });

    Ok(quote! {
        impl #impl_generics ::xdb::ToArgs for #name #ty_generics #where_clause {
            const FIELDS: &'static [::xdb::FieldInfo] = &[#(#infos),*];

            fn field_arg(&self, path: &[usize]) -> ::core::option::Option<::xdb::Arg> {
                match path {
                    #(#arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics ::xdb::ArgSource for #name #ty_generics #where_clause {
            fn lookup(&self, token: &str) -> ::core::option::Option<::xdb::Arg> {
                ::xdb::reflect::lookup_field(self, token)
            }
        }
    })
}
