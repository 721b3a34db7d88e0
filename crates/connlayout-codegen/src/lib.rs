// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 connlayout contributors

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr, Meta, Token};

/// Options collected from `#[layout(...)]` on a field.
#[derive(Default)]
struct FieldOptions {
    rename: Option<String>,
    skip: bool,
}

/// `#[derive(Layout)]` macro: generates the one-time layout introspection
/// for a connection wrapper struct.
///
/// Offsets come from `core::mem::offset_of!`, so they always describe the
/// layout the compiler actually chose for this build.
///
/// Supports:
/// - `#[layout(name = "CommonConn")]` on the struct: registry type name
///   (defaults to the struct ident)
/// - `#[layout(rename = "rawInput")]` on a field: registry field name
///   (defaults to the field ident)
/// - `#[layout(skip)]` on a field: not described, not resolvable
///
/// Every described field type must implement `connlayout::FieldType`.
/// `#[repr(packed)]` structs are rejected: their fields may sit at
/// addresses that are not aligned for the field type.
///
/// # Panics
///
/// Never panics; malformed input is reported as a compile error.
///
/// Example:
/// ```ignore
/// use connlayout::Layout;
/// use std::io::Cursor;
///
/// #[derive(Layout)]
/// #[layout(name = "CommonConn")]
/// struct CommonConn {
///     input: Cursor<Vec<u8>>,
///     #[layout(rename = "rawInput")]
///     raw_input: Vec<u8>,
///     #[layout(skip)]
///     peer: String,
/// }
/// ```
#[proc_macro_derive(Layout, attributes(layout))]
pub fn derive_layout(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() || input.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Layout can only be derived for non-generic structs",
        ));
    }

    reject_packed(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Only structs with named fields are supported",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "Only structs are supported")),
    };

    let type_name = container_name(&input.attrs)?.unwrap_or_else(|| name.to_string());

    let mut seen = HashSet::new();
    let mut field_layouts = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };

        let options = field_options(&field.attrs)?;
        if options.skip {
            continue;
        }

        let field_name = options.rename.unwrap_or_else(|| ident.to_string());
        if !seen.insert(field_name.clone()) {
            return Err(syn::Error::new_spanned(
                ident,
                format!("Duplicate layout field name `{field_name}` on `{type_name}`"),
            ));
        }

        let ty = &field.ty;
        field_layouts.push(quote! {
            ::connlayout::FieldLayout::of::<Self, #ty>(
                #field_name,
                ::core::mem::offset_of!(Self, #ident),
            )
        });
    }

    Ok(quote! {
        #[automatically_derived]
        unsafe impl ::connlayout::Layout for #name {
            const TYPE_NAME: &'static str = #type_name;

            fn describe() -> ::connlayout::TypeDescriptor {
                ::connlayout::TypeDescriptor::of::<Self>(
                    #type_name,
                    ::std::vec![#(#field_layouts),*],
                )
            }
        }
    })
}

/// Fail on `#[repr(packed)]` / `#[repr(packed(N))]`.
fn reject_packed(attrs: &[Attribute]) -> syn::Result<()> {
    for attr in attrs.iter().filter(|a| a.path().is_ident("repr")) {
        let reprs = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        for repr in &reprs {
            if repr.path().is_ident("packed") {
                return Err(syn::Error::new_spanned(
                    repr,
                    "Layout cannot be derived for #[repr(packed)] structs",
                ));
            }
        }
    }
    Ok(())
}

/// Parse `#[layout(name = "...")]` on the struct.
fn container_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("layout")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().is_empty() {
                    return Err(meta.error("layout type name must not be empty"));
                }
                name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported container attribute, expected `name = \"...\"`"))
            }
        })?;
    }

    Ok(name)
}

/// Parse `#[layout(rename = "...")]` / `#[layout(skip)]` on a field.
fn field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("layout")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().is_empty() {
                    return Err(meta.error("layout field name must not be empty"));
                }
                options.rename = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else {
                Err(meta.error(
                    "unsupported field attribute, expected `rename = \"...\"` or `skip`",
                ))
            }
        })?;
    }

    Ok(options)
}
