use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, Ident, Variant};

struct ErrorVariant<'a> {
    name: &'a Ident,
    source: Option<&'a Field>,
    has_context: bool,
    cfgs: Vec<&'a Attribute>,
}

impl<'a> ErrorVariant<'a> {
    fn parse(variant: &'a Variant) -> syn::Result<Self> {
        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "tzpass_error variants must use named fields",
            ));
        };

        let mut source = None;
        let mut has_context = false;

        for field in &fields.named {
            let Some(ident) = &field.ident else { continue };
            if ident == "context" {
                if !is_context_type(field) {
                    return Err(syn::Error::new_spanned(
                        &field.ty,
                        "`context` must be Option<Cow<'static, str>>",
                    ));
                }
                has_context = true;
            } else if ident == "source" || field.attrs.iter().any(|a| a.path().is_ident("source"))
            {
                source = Some(field);
            }
        }

        if source.is_some() && !has_context {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "variants with a source need a `context: Option<Cow<'static, str>>` field",
            ));
        }

        Ok(Self {
            name: &variant.ident,
            source,
            has_context,
            cfgs: variant.attrs.iter().filter(|a| a.path().is_ident("cfg")).collect(),
        })
    }

    fn is_internal(&self) -> bool {
        self.name == "Internal"
    }
}

pub fn expand(input: DeriveInput) -> TokenStream {
    try_expand(&input).unwrap_or_else(syn::Error::into_compile_error)
}

fn try_expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "tzpass_error can only be applied to enums"));
    };

    let variants =
        data.variants.iter().map(ErrorVariant::parse).collect::<syn::Result<Vec<_>>>()?;

    let name = &input.ident;
    let ext = format_ident!("{name}Ext");

    let derives = missing_derives(input);
    let context_trait = context_trait(name, &ext, &variants);
    let source_impls = source_impls(name, &ext, &variants);
    let internal_impls = internal_impls(name, &variants);

    Ok(quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        #context_trait
        #source_impls
        #internal_impls

        #[allow(dead_code)]
        fn format_context(
            context: &Option<::std::borrow::Cow<'static, str>>,
        ) -> ::std::borrow::Cow<'static, str> {
            match context {
                Some(c) => ::std::borrow::Cow::Owned(format!(" ({c})")),
                None => ::std::borrow::Cow::Borrowed(""),
            }
        }
    })
}

fn missing_derives(input: &DeriveInput) -> TokenStream {
    let mut present = FxHashSet::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(last) = meta.path.segments.last() {
                present.insert(last.ident.to_string());
            }
            Ok(())
        });
    }

    let mut derives = Vec::new();
    if !present.contains("Debug") {
        derives.push(quote!(Debug));
    }
    if !present.contains("Error") {
        derives.push(quote!(::thiserror::Error));
    }

    if derives.is_empty() { TokenStream::new() } else { quote!(#[derive(#(#derives),*)]) }
}

fn context_trait(name: &Ident, ext: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let arms = variants.iter().filter(|v| v.has_context).map(|v| {
        let cfgs = &v.cfgs;
        let variant = v.name;
        quote! { #(#cfgs)* #name::#variant { context: slot, .. } => *slot = Some(context), }
    });

    quote! {
        pub trait #ext<T> {
            fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> Self {
                let context = context.into();
                self.map_err(move |mut err| {
                    match &mut err {
                        #(#arms)*
                        _ => {}
                    }
                    err
                })
            }
        }
    }
}

fn source_impls(name: &Ident, ext: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let mut seen = FxHashSet::default();
    let mut out = TokenStream::new();

    for v in variants.iter().filter(|v| !v.is_internal()) {
        let Some(field) = v.source else { continue };
        let Some(field_name) = field.ident.as_ref() else { continue };
        let ty = &field.ty;
        // Two variants wrapping the same type would produce conflicting impls; first one wins.
        if !seen.insert(quote!(#ty).to_string()) {
            continue;
        }
        let cfgs = &v.cfgs;
        let variant = v.name;

        out.extend(quote! {
            #(#cfgs)*
            #[automatically_derived]
            impl From<#ty> for #name {
                #[inline]
                fn from(#field_name: #ty) -> Self {
                    Self::#variant { #field_name, context: None }
                }
            }

            #(#cfgs)*
            #[automatically_derived]
            impl<T> #ext<T> for ::std::result::Result<T, #ty> {
                #[inline]
                fn context(
                    self,
                    context: impl Into<::std::borrow::Cow<'static, str>>,
                ) -> ::std::result::Result<T, #name> {
                    self.map_err(|#field_name| #name::#variant {
                        #field_name,
                        context: Some(context.into()),
                    })
                }
            }
        });
    }

    out
}

fn internal_impls(name: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let Some(internal) = variants.iter().find(|v| v.is_internal()) else {
        return TokenStream::new();
    };
    let cfgs = &internal.cfgs;

    quote! {
        #(#cfgs)*
        impl From<&'static str> for #name {
            #[inline]
            fn from(message: &'static str) -> Self {
                Self::Internal { message: ::std::borrow::Cow::Borrowed(message), context: None }
            }
        }

        #(#cfgs)*
        impl From<String> for #name {
            #[inline]
            fn from(message: String) -> Self {
                Self::Internal { message: ::std::borrow::Cow::Owned(message), context: None }
            }
        }
    }
}

fn is_context_type(field: &Field) -> bool {
    let ty = &field.ty;
    let rendered: String =
        quote!(#ty).to_string().chars().filter(|c| !c.is_whitespace()).collect();

    let Some(inner) =
        rendered.strip_prefix("Option<").or_else(|| rendered.strip_prefix("std::option::Option<"))
    else {
        return false;
    };

    inner
        .strip_suffix('>')
        .is_some_and(|cow| cow == "Cow<'static,str>" || cow.ends_with("::Cow<'static,str>"))
}
