// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;
use syn::spanned::Spanned;
use syn::DeriveInput;
use syn::LitStr;
use syn::Token;

/// Generates `COLUMNS`: the column names a row struct is read from, in
/// declaration order. Fields marked `#[sqlx(skip)]` are left out and
/// `#[sqlx(rename = "...")]` is honoured.
#[proc_macro_derive(FieldList, attributes(sqlx))]
pub fn derive_fields(item: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(item as DeriveInput);
    let struct_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let fields = if let syn::Data::Struct(syn::DataStruct {
        fields: syn::Fields::Named(ref fields),
        ..
    }) = ast.data
    {
        fields
    } else {
        return syn::Error::new(ast.span(), "FieldList supports structs with named fields only")
            .to_compile_error()
            .into();
    };

    let mut keys = Vec::new();

    for field in fields.named.iter() {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let mut name = field_name.to_string();
        let mut skip = false;

        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("sqlx")) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                } else if meta.path.is_ident("rename") {
                    name = meta.value()?.parse::<LitStr>()?.value();
                } else if meta.input.peek(Token![=]) {
                    meta.value()?.parse::<syn::Expr>()?;
                }
                Ok(())
            });
            if let Err(err) = parsed {
                return err.to_compile_error().into();
            }
        }

        if !skip {
            let literal_key_str = LitStr::new(&name, field.span());
            keys.push(quote! { #literal_key_str });
        }
    }

    let expanded = quote! {

        impl #impl_generics #struct_name #ty_generics #where_clause {
            pub const COLUMNS: &'static [&'static str] = &[ #( #keys ),* ];
        }

    };
    expanded.into()
}
