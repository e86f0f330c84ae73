use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, ExprPath, Field, Fields, LitStr};

use crate::util;

struct FieldDoc {
    description: Option<String>,
    /// From `#[document(default = "...")]`, already formatted as markdown.
    explicit_default: Option<LitStr>,
    /// Expression producing the value serde falls back to.
    serde_default: Option<TokenStream>,
    /// From `#[document(no_default)]`.
    hide_default: bool,
}

impl FieldDoc {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut result = Self {
            description: util::docstring(&field.attrs)?,
            explicit_default: None,
            serde_default: None,
            hide_default: false,
        };

        for attr in &field.attrs {
            if attr.path().is_ident("document") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("default") {
                        result.explicit_default = Some(meta.value()?.parse()?);
                        Ok(())
                    } else if meta.path.is_ident("no_default") {
                        result.hide_default = true;
                        Ok(())
                    } else {
                        Err(meta.error("expected `default = \"...\"` or `no_default`"))
                    }
                })?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if !meta.path.is_ident("default") {
                        return util::skip_value(&meta);
                    }

                    let ty = &field.ty;
                    result.serde_default = Some(if meta.input.peek(syn::Token![=]) {
                        let path = meta.value()?.parse::<LitStr>()?.parse::<ExprPath>()?;
                        quote! { #path() }
                    } else {
                        quote! { <#ty as ::std::default::Default>::default() }
                    });
                    Ok(())
                })?;
            }
        }

        Ok(result)
    }

    fn setters(&self) -> TokenStream {
        let description = self.description.as_ref().map(|description| {
            quote! { doc.description = Some(#description.to_string()); }
        });

        let default = if self.hide_default {
            None
        } else if let Some(default) = &self.explicit_default {
            Some(quote! { doc.value_info.default = Some(#default.to_string()); })
        } else {
            self.serde_default.as_ref().map(|value| {
                quote! {
                    doc.value_info.default = Some(crate::doc::toml_value_as_markdown(&#value));
                }
            })
        };

        quote! {
            #description
            #default
        }
    }
}

fn field_entry(field: &Field) -> syn::Result<TokenStream> {
    let Some(ident) = &field.ident else {
        return Err(syn::Error::new(field.span(), "tuple fields can't be documented"));
    };
    let name = ident.to_string();
    let ty = &field.ty;
    let setters = FieldDoc::parse(field)?.setters();

    Ok(quote! {
        fields.insert(#name.to_string(), {
            let mut doc = <#ty as crate::doc::Document>::doc();
            #setters
            ::std::boxed::Box::new(doc)
        });
    })
}

pub fn derive_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let ident = input.ident;
    let Data::Struct(data) = input.data else {
        return Err(syn::Error::new(ident.span(), "only structs can be documented"));
    };
    let Fields::Named(named) = data.fields else {
        return Err(syn::Error::new(ident.span(), "struct must have named fields"));
    };

    let entries = named
        .named
        .iter()
        .map(field_entry)
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl crate::doc::Document for #ident {
            fn doc() -> crate::doc::Doc {
                let mut fields = ::std::collections::HashMap::new();
                #( #entries )*

                let mut doc = crate::doc::Doc::default();
                doc.struct_info.fields = fields;
                doc
            }
        }
    })
}
