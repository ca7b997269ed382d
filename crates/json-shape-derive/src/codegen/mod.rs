//! Code generation for the Shape derive macro.

mod shape_ref;

use crate::field_kind::FieldKind;
use crate::parse::ShapeInput;
use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use std::collections::HashSet;
use syn::DeriveInput;

/// Main entry point for code generation.
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let parsed = ShapeInput::from_derive_input(input)
        .map_err(|e| syn::Error::new_spanned(input, e.to_string()))?;

    if !parsed.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &parsed.generics,
            "#[derive(Shape)] does not support generic structs",
        ));
    }

    match parsed.namespace.as_deref() {
        Some(ns) if !ns.trim().is_empty() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &parsed.ident,
                "#[derive(Shape)] requires #[shape(namespace = \"...\")]",
            ))
        }
    }

    let mut keys = HashSet::new();
    for field in parsed.fields() {
        let ident = field.ident()?;
        let ops = field.operations();

        if field.adapter.is_some() && !(ops.get || ops.set) {
            return Err(syn::Error::new_spanned(
                ident,
                "#[shape(adapter)] requires a get or set accessor; \
                 has, is_null and delete never see the value",
            ));
        }

        if !keys.insert(field.key()?) {
            return Err(syn::Error::new_spanned(
                ident,
                format!("property '{}' is declared twice", field.key()?),
            ));
        }

        FieldKind::from_type(&field.ty, field.adapter.as_ref())?;
    }

    shape_ref::generate(&parsed)
}
