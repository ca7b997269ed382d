//! Typed handle code generation.
//!
//! Generates `{Name}Ref`, a handle that derefs to its parent's handle and
//! calls the synthesized accessors through `ShapeObject::invoke`, plus the
//! `Shape` impl carrying the schema declaration.

use crate::field_kind::FieldKind;
use crate::parse::{FieldInput, ShapeInput};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Generate the handle struct and the Shape trait implementation.
pub fn generate(input: &ShapeInput) -> syn::Result<TokenStream> {
    let struct_name = &input.ident;
    let ref_name = format_ident!("{}Ref", struct_name);
    let vis = &input.vis;
    let namespace = input.namespace.as_deref().unwrap_or_default();
    let schema_name = input.schema_name();

    let parent_ty = match &input.extends {
        Some(parent) => quote! { <#parent as ::json_shape::Shape>::Ref },
        None => quote! { ::json_shape::ShapeObject },
    };
    let extends = input.extends.as_ref().map(|parent| {
        quote! {
            .extends(::json_shape::SchemaRef::lazy(<#parent as ::json_shape::Shape>::declaration))
        }
    });

    let mut methods = TokenStream::new();
    let mut members = Vec::new();
    for field in input.fields() {
        let generated = generate_field(field)?;
        methods.extend(generated.methods);
        members.extend(generated.members);
    }

    let doc = format!("Typed handle for the `{namespace}.{schema_name}` shape.");

    Ok(quote! {
        #[doc = #doc]
        #[derive(Clone, Debug)]
        #vis struct #ref_name {
            parent: #parent_ty,
        }

        impl ::std::ops::Deref for #ref_name {
            type Target = #parent_ty;

            fn deref(&self) -> &Self::Target {
                &self.parent
            }
        }

        impl ::json_shape::ShapeHandle for #ref_name {
            fn schema() -> ::json_shape::SchemaRef {
                ::json_shape::SchemaRef::lazy(<#struct_name as ::json_shape::Shape>::declaration)
            }

            fn from_object(object: ::json_shape::ShapeObject) -> Self {
                Self {
                    parent: <#parent_ty as ::json_shape::ShapeHandle>::from_object(object),
                }
            }

            fn as_object(&self) -> &::json_shape::ShapeObject {
                ::json_shape::ShapeHandle::as_object(&self.parent)
            }

            fn into_object(self) -> ::json_shape::ShapeObject {
                ::json_shape::ShapeHandle::into_object(self.parent)
            }
        }

        impl #ref_name {
            #methods
        }

        impl ::json_shape::Shape for #struct_name {
            type Ref = #ref_name;

            fn declaration() -> ::std::sync::Arc<::json_shape::SchemaDecl> {
                static DECL: ::std::sync::OnceLock<::std::sync::Arc<::json_shape::SchemaDecl>> =
                    ::std::sync::OnceLock::new();
                DECL.get_or_init(|| {
                    ::json_shape::SchemaDecl::builder(#namespace, #schema_name)
                        #extends
                        #(.member(#members))*
                        .build()
                })
                .clone()
            }
        }
    })
}

struct FieldCode {
    methods: TokenStream,
    members: Vec<TokenStream>,
}

/// Generate the methods and member declarations for a single field.
fn generate_field(field: &FieldInput) -> syn::Result<FieldCode> {
    let ident = field.ident()?;
    let key = field.key()?;
    let ty = &field.ty;
    let ops = field.operations();
    let kind = FieldKind::from_type(ty, field.adapter.as_ref())?;

    let object = quote! { ::json_shape::ShapeHandle::as_object(self) };
    let (type_ref, adapter) = match &kind {
        FieldKind::Declared => (quote! { <#ty as ::json_shape::Declared>::type_ref() }, None),
        FieldKind::Adapted(path) => (
            quote! { ::json_shape::TypeRef::foreign::<#ty>() },
            Some(quote! { .adapter(::json_shape::AdapterRef::of::<#path>()) }),
        ),
    };

    let mut methods = TokenStream::new();
    let mut members = Vec::new();

    if ops.get {
        let method = ident.to_string();
        let convert = match &kind {
            FieldKind::Declared => quote! { <#ty as ::json_shape::Declared>::from_property(value) },
            FieldKind::Adapted(_) => quote! { value.into_adapted::<#ty>() },
        };
        let doc = format!("Read `{key}`.");
        methods.extend(quote! {
            #[doc = #doc]
            pub fn #ident(&self) -> ::json_shape::ShapeResult<#ty> {
                let value = #object.invoke(
                    ::json_shape::Operation::Get,
                    #key,
                    ::json_shape::PropertyValue::Unit,
                )?;
                #convert
            }
        });
        members.push(quote! {
            ::json_shape::MemberDecl::getter(#method, #key, #type_ref) #adapter
        });
    }

    if ops.set {
        let name = format_ident!("set_{}", ident);
        let method = name.to_string();
        let convert = match &kind {
            FieldKind::Declared => quote! { <#ty as ::json_shape::Declared>::into_property(value) },
            FieldKind::Adapted(_) => quote! { ::json_shape::PropertyValue::adapted(value) },
        };
        let doc = format!("Write `{key}`.");
        methods.extend(quote! {
            #[doc = #doc]
            pub fn #name(&self, value: #ty) -> ::json_shape::ShapeResult<()> {
                #object
                    .invoke(::json_shape::Operation::Set, #key, #convert)?
                    .into_unit()
            }
        });
        members.push(quote! {
            ::json_shape::MemberDecl::setter(#method, #key, #type_ref) #adapter
        });
    }

    let predicates = [
        (
            ops.has,
            format_ident!("has_{}", ident),
            quote! { Has },
            quote! { has },
            format!("Whether `{key}` is present, even if null."),
        ),
        (
            ops.is_null,
            format_ident!("is_{}_null", ident),
            quote! { IsNull },
            quote! { is_null },
            format!("Whether `{key}` is present and null."),
        ),
        (
            ops.delete,
            format_ident!("delete_{}", ident),
            quote! { Delete },
            quote! { delete },
            format!("Remove `{key}`; returns whether it was present."),
        ),
    ];
    for (wanted, name, operation, constructor, doc) in predicates {
        if !wanted {
            continue;
        }
        let method = name.to_string();
        methods.extend(quote! {
            #[doc = #doc]
            pub fn #name(&self) -> ::json_shape::ShapeResult<bool> {
                #object
                    .invoke(
                        ::json_shape::Operation::#operation,
                        #key,
                        ::json_shape::PropertyValue::Unit,
                    )?
                    .into_bool()
            }
        });
        members.push(quote! {
            ::json_shape::MemberDecl::#constructor(#method, #key)
        });
    }

    Ok(FieldCode { methods, members })
}
