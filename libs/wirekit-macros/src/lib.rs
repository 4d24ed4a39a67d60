use heck::ToSnakeCase;
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, punctuated::Punctuated, DeriveInput,
    Expr, FnArg, GenericArgument, ImplItem, ItemImpl, Lit, LitStr, Meta, Path, PathArguments,
    ReturnType, Token, Type, TypePath,
};

/// Configuration parsed from #[module(...)] attribute
struct ModuleConfig {
    name: Option<String>,
    include: Option<Vec<TypePath>>, // static dependency list; None = inspect the constructor
    ctor: Option<Expr>,             // arbitrary constructor expression
    inject: bool,                   // build through the #[injectable] constructor
}

const VALID_PARAMS: &[&str] = &["name", "include", "ctor", "inject"];

fn suggest_similar(input: &str) -> Vec<&'static str> {
    let mut suggestions: Vec<(&str, f64)> = VALID_PARAMS
        .iter()
        .map(|&p| (p, strsim::jaro_winkler(input, p)))
        .filter(|(_, score)| *score > 0.6)
        .collect();

    suggestions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    suggestions.into_iter().take(2).map(|(p, _)| p).collect()
}

fn unknown_param(path: &Path) -> syn::Error {
    let input = path
        .get_ident()
        .map(|i| i.to_string())
        .unwrap_or_else(|| quote!(#path).to_string());
    let suggestions = suggest_similar(&input);
    let msg = if suggestions.is_empty() {
        format!(
            "unknown attribute parameter '{input}', expected one of: {}",
            VALID_PARAMS.join(", ")
        )
    } else {
        format!(
            "unknown attribute parameter '{input}'\n       = help: did you mean one of: {}?",
            suggestions.join(", ")
        )
    };
    syn::Error::new_spanned(path, msg)
}

impl Parse for ModuleConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut name: Option<String> = None;
        let mut include: Option<Vec<TypePath>> = None;
        let mut ctor: Option<Expr> = None;
        let mut inject = false;

        let punctuated: Punctuated<Meta, Token![,]> =
            input.parse_terminated(Meta::parse, Token![,])?;

        for meta in punctuated {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("name") => {
                    if name.is_some() {
                        return Err(syn::Error::new_spanned(
                            nv.path,
                            "duplicate `name` parameter",
                        ));
                    }
                    match nv.value {
                        Expr::Lit(syn::ExprLit {
                            lit: Lit::Str(s), ..
                        }) => {
                            let value = s.value();
                            if value.is_empty() {
                                return Err(syn::Error::new_spanned(s, "name must not be empty"));
                            }
                            name = Some(value);
                        }
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "name must be a string literal, e.g. name = \"storage\"",
                            ));
                        }
                    }
                }
                Meta::NameValue(nv) if nv.path.is_ident("include") => {
                    if include.is_some() {
                        return Err(syn::Error::new_spanned(
                            nv.path,
                            "duplicate `include` parameter",
                        ));
                    }
                    let arr = match nv.value {
                        Expr::Array(arr) => arr,
                        other => {
                            return Err(syn::Error::new_spanned(
                                other,
                                "include must be an array of module types, e.g. include = [CoreModule]",
                            ));
                        }
                    };
                    let mut types = Vec::with_capacity(arr.elems.len());
                    for elem in arr.elems {
                        match elem {
                            Expr::Path(ep) => types.push(TypePath {
                                qself: ep.qself,
                                path: ep.path,
                            }),
                            other => {
                                return Err(syn::Error::new_spanned(
                                    other,
                                    "include entries must be type paths, e.g. include = [crate::core::CoreModule]",
                                ));
                            }
                        }
                    }
                    include = Some(types);
                }
                Meta::NameValue(nv) if nv.path.is_ident("ctor") => {
                    if ctor.is_some() {
                        return Err(syn::Error::new_spanned(
                            nv.path,
                            "duplicate `ctor` parameter",
                        ));
                    }
                    if let Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    {
                        return Err(syn::Error::new_spanned(
                            s,
                            "ctor must be a Rust expression, not a string literal. \
                 Use: ctor = MyModule::new()  (with parentheses), \
                 or:  ctor = Default::default()",
                        ));
                    }
                    ctor = Some(nv.value);
                }
                Meta::Path(p) if p.is_ident("inject") => {
                    if inject {
                        return Err(syn::Error::new_spanned(p, "duplicate `inject` flag"));
                    }
                    inject = true;
                }
                Meta::NameValue(nv) => return Err(unknown_param(&nv.path)),
                Meta::Path(p) => return Err(unknown_param(&p)),
                Meta::List(list) => return Err(unknown_param(&list.path)),
            }
        }

        if inject && ctor.is_some() {
            return Err(syn::Error::new(
                Span::call_site(),
                "`ctor` and `inject` are mutually exclusive: an injectable module is built by its #[inject] constructor",
            ));
        }

        Ok(ModuleConfig {
            name,
            include,
            ctor,
            inject,
        })
    }
}

/// Main #[module] attribute macro
///
/// Registers the annotated type in the module catalog and implements
/// `wirekit::ModuleType` for it. The type must implement `wirekit::Module`.
///
/// - `name = "..."`: catalog name (defaults to the snake_case type name)
/// - `include = [A, B]`: static dependency list; the constructor is then not inspected
/// - `ctor = expr`: expression building the module (defaults to `Default::default()`)
/// - `inject`: build through the `#[injectable]` constructor and derive dependencies
///   from its module-typed parameters
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as ModuleConfig);
    let input = parse_macro_input!(item as DeriveInput);

    match expand_module(config, &input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => {
            let err = e.to_compile_error();
            TokenStream::from(quote! { #input #err })
        }
    }
}

fn expand_module(config: ModuleConfig, input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[module] cannot be used on generic types; register each instantiation with ModuleClass instead",
        ));
    }

    let struct_ident = &input.ident;
    let struct_name_snake = struct_ident.to_string().to_snake_case();
    let name_lit = LitStr::new(
        config.name.as_deref().unwrap_or(&struct_name_snake),
        Span::call_site(),
    );

    let class = if config.inject {
        quote! { ::wirekit::ModuleClass::injectable::<#struct_ident>(#name_lit) }
    } else {
        let constructor = match &config.ctor {
            Some(expr) => quote! { #expr },
            None => quote! { <#struct_ident as ::core::default::Default>::default() },
        };
        quote! {
            ::wirekit::ModuleClass::new::<#struct_ident, _>(
                #name_lit,
                |_ctx| ::core::result::Result::Ok(#constructor),
            )
        }
    };

    let class = match &config.include {
        Some(types) => quote! {
            #class.with_static_dependencies(
                ::std::vec::Vec::<::wirekit::ModuleId>::from([
                    #(::wirekit::ModuleId::of::<#types>()),*
                ])
            )
        },
        None => class,
    };

    let inject_assert = if config.inject {
        quote! {
            const _: () = {
                #[allow(dead_code)]
                fn __wirekit_require_injectable_impl()
                where
                    #struct_ident: ::wirekit::Injectable,
                {}
            };
        }
    } else {
        quote! {}
    };

    let registrator_name = format_ident!("__{}_registrator", struct_name_snake);

    Ok(quote! {
        #input

        // Compile-time assertions (better errors if trait impls are missing)
        const _: () = {
            #[allow(dead_code)]
            fn __wirekit_require_module_impl()
            where
                #struct_ident: ::wirekit::Module,
            {}
        };
        #inject_assert

        impl ::wirekit::ModuleType for #struct_ident {
            fn module_class() -> ::wirekit::ModuleClass {
                #class
            }
        }

        impl #struct_ident {
            pub const MODULE_NAME: &'static str = #name_lit;
        }

        // Registrator that targets the catalog *builder*
        #[doc(hidden)]
        fn #registrator_name(b: &mut ::wirekit::CatalogBuilder) {
            b.register_type::<#struct_ident>();
        }

        ::wirekit::inventory::submit! {
            ::wirekit::Registrator(#registrator_name)
        }
    })
}

// ============================================================================
// Injectable constructor
// ============================================================================

enum InjectParam {
    Required(Type),
    Optional(Type),
}

/// Marks the designated constructor of a type.
///
/// Place it on an inherent impl block containing exactly one `#[inject]` function.
/// Its parameters must be `Arc<T>` or `Option<Arc<T>>`; it returns `Self` or
/// `Result<Self, E>` with `E: Into<anyhow::Error>`. Generates `wirekit::Injectable`.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut impl_item = parse_macro_input!(item as ItemImpl);

    let result = if attr.is_empty() {
        expand_injectable(&mut impl_item)
    } else {
        Err(syn::Error::new(
            Span::call_site(),
            "#[injectable] takes no arguments",
        ))
    };

    match result {
        Ok(generated) => TokenStream::from(quote! { #impl_item #generated }),
        Err(e) => {
            let err = e.to_compile_error();
            TokenStream::from(quote! { #impl_item #err })
        }
    }
}

fn expand_injectable(impl_item: &mut ItemImpl) -> syn::Result<proc_macro2::TokenStream> {
    if let Some((_, path, _)) = &impl_item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[injectable] must be placed on an inherent impl block",
        ));
    }
    if !impl_item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &impl_item.generics,
            "#[injectable] cannot be used on generic impl blocks",
        ));
    }

    // Find and strip the #[inject] markers
    let mut ctors = Vec::new();
    for item in &mut impl_item.items {
        if let ImplItem::Fn(f) = item {
            let before = f.attrs.len();
            f.attrs.retain(|a| !a.path().is_ident("inject"));
            if f.attrs.len() != before {
                ctors.push(f.sig.clone());
            }
        }
    }

    let sig = match ctors.len() {
        1 => ctors.remove(0),
        0 => {
            return Err(syn::Error::new_spanned(
                &impl_item.self_ty,
                "#[injectable] requires one function marked #[inject]",
            ))
        }
        _ => {
            return Err(syn::Error::new_spanned(
                &ctors[1].ident,
                "only one function may be marked #[inject]",
            ))
        }
    };

    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "#[inject] constructor cannot be async",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[inject] constructor cannot be generic",
        ));
    }

    let mut params = Vec::with_capacity(sig.inputs.len());
    for arg in &sig.inputs {
        match arg {
            FnArg::Receiver(r) => {
                return Err(syn::Error::new_spanned(
                    r,
                    "#[inject] constructor cannot take self",
                ))
            }
            FnArg::Typed(pt) => params.push(parse_inject_param(&pt.ty)?),
        }
    }

    let fallible = match &sig.output {
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "#[inject] constructor must return Self or Result<Self, E>",
            ))
        }
        ReturnType::Type(_, ty) => last_segment_is(ty, "Result"),
    };

    let self_ty = &impl_item.self_ty;
    let fn_name = &sig.ident;

    let param_types = params.iter().map(|p| match p {
        InjectParam::Required(ty) | InjectParam::Optional(ty) => {
            quote! { ::wirekit::ParamType::of::<#ty>() }
        }
    });
    let args = params.iter().map(|p| match p {
        InjectParam::Required(ty) => quote! { ctx.get::<#ty>()? },
        InjectParam::Optional(ty) => quote! { ctx.get_optional::<#ty>() },
    });

    let call = if fallible {
        quote! { Self::#fn_name(#(#args),*).map_err(::core::convert::Into::into) }
    } else {
        quote! { ::core::result::Result::Ok(Self::#fn_name(#(#args),*)) }
    };

    Ok(quote! {
        impl ::wirekit::Injectable for #self_ty {
            fn constructor_params() -> ::std::vec::Vec<::wirekit::ParamType> {
                ::std::vec![#(#param_types),*]
            }

            fn construct(ctx: &::wirekit::ConstructCtx<'_>) -> ::wirekit::Result<Self> {
                #call
            }
        }
    })
}

fn parse_inject_param(ty: &Type) -> syn::Result<InjectParam> {
    if let Some(inner) = single_generic_arg(ty, "Arc") {
        return Ok(InjectParam::Required(inner.clone()));
    }
    if let Some(inner) = single_generic_arg(ty, "Option").and_then(|t| single_generic_arg(t, "Arc"))
    {
        return Ok(InjectParam::Optional(inner.clone()));
    }
    Err(syn::Error::new_spanned(
        ty,
        "#[inject] parameters must be Arc<T> or Option<Arc<T>>",
    ))
}

/// `Wrapper<T>` -> `T` when the last path segment of `ty` is `wrapper`.
fn single_generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(tp) = ty else {
        return None;
    };
    let seg = tp.path.segments.last()?;
    if seg.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn last_segment_is(ty: &Type, ident: &str) -> bool {
    match ty {
        Type::Path(tp) => tp
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == ident),
        _ => false,
    }
}
