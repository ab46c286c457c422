// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

mod target;

use target::TargetCpu;

/// One entry of `#[multiversion(...)]`.
///
/// `"v3"` compiles the annotated body again under the `v3` target features.
/// `@"v3"` imports a hand-written specialization named `<name>_v3` from the
/// surrounding module. Extra features follow the cpu name, separated by
/// colons: `@"v4:avx512vpopcntdq"` imports `<name>_v4_avx512vpopcntdq`.
struct Version {
    target: syn::LitStr,
    import: bool,
}

impl syn::parse::Parse for Version {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let import = if input.peek(syn::Token![@]) {
            let _: syn::Token![@] = input.parse()?;
            true
        } else {
            false
        };
        let target: syn::LitStr = input.parse()?;
        Ok(Self { target, import })
    }
}

struct Versions(syn::punctuated::Punctuated<Version, syn::Token![,]>);

impl syn::parse::Parse for Versions {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        Ok(Versions(syn::punctuated::Punctuated::parse_terminated(
            input,
        )?))
    }
}

fn find_target_cpu(lit: &syn::LitStr, name: &str) -> syn::Result<&'static TargetCpu> {
    target::TARGET_CPUS
        .iter()
        .find(|target_cpu| target_cpu.target_cpu == name)
        .ok_or_else(|| syn::Error::new(lit.span(), format!("unknown target_cpu `{name}`")))
}

fn check_signature(sig: &syn::Signature) -> syn::Result<Vec<syn::Ident>> {
    if let Some(constness) = sig.constness {
        return Err(syn::Error::new_spanned(constness, "const functions are not supported"));
    }
    if let Some(asyncness) = sig.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "async functions are not supported"));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new_spanned(variadic, "variadic parameters are not supported"));
    }
    for param in sig.generics.params.iter() {
        if !matches!(param, syn::GenericParam::Lifetime(_)) {
            return Err(syn::Error::new_spanned(param, "generic parameters are not supported"));
        }
    }
    let mut arguments = Vec::new();
    for input in sig.inputs.iter() {
        match input {
            syn::FnArg::Typed(typed) => match &*typed.pat {
                syn::Pat::Ident(pat_ident) => arguments.push(pat_ident.ident.clone()),
                pat => {
                    return Err(syn::Error::new_spanned(pat, "patterns on parameters are not supported"));
                }
            },
            syn::FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(receiver, "receiver parameters are not supported"));
            }
        }
    }
    Ok(arguments)
}

/// Compiles a function once per listed target cpu and dispatches at runtime.
///
/// The first call probes the cpu in the listed order, stores the selected
/// specialization in a per-function cache and calls it. A `fallback`
/// function with the original body is always emitted, so tests in the same
/// module can compare specializations against it.
#[proc_macro_attribute]
pub fn multiversion(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let versions = syn::parse_macro_input!(attr as Versions);
    let item_fn = syn::parse_macro_input!(item as syn::ItemFn);
    match expand_multiversion(versions, item_fn) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand_multiversion(
    versions: Versions,
    item_fn: syn::ItemFn,
) -> syn::Result<proc_macro2::TokenStream> {
    let syn::ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item_fn;
    let arguments = check_signature(&sig)?;
    let name = sig.ident.to_string();
    let generics_params = &sig.generics.params;
    let generics_where = &sig.generics.where_clause;
    let inputs = &sig.inputs;
    let output = &sig.output;
    let mut specializations = quote::quote! {};
    let mut branches = quote::quote! {};
    for version in versions.0 {
        let target = version.target.value();
        let mut parts = target.split(':');
        let cpu = parts.next().unwrap_or_default();
        let additional_target_features = parts.collect::<Vec<_>>();
        let target_cpu = find_target_cpu(&version.target, cpu)?;
        let target_arch = target_cpu.target_arch;
        let cpu = target_cpu.target_cpu;
        let ident = syn::Ident::new(
            &format!("{name}_{}", target.replace([':', '.'], "_")),
            proc_macro2::Span::mixed_site(),
        );
        if !version.import {
            specializations.extend(quote::quote! {
                #[inline]
                #[cfg(target_arch = #target_arch)]
                #[crate::target_cpu(enable = #cpu)]
                #(#[target_feature(enable = #additional_target_features)])*
                fn #ident < #generics_params > (#inputs) #output #generics_where #block
            });
        }
        branches.extend(quote::quote! {
            #[cfg(target_arch = #target_arch)]
            if crate::is_cpu_detected!(#cpu) #(&& crate::is_feature_detected!(#additional_target_features))* {
                let selected: unsafe fn(#inputs) #output = #ident;
                CACHE.store(selected as *mut (), core::sync::atomic::Ordering::Relaxed);
                return unsafe { selected(#(#arguments,)*) };
            }
        });
    }
    Ok(quote::quote! {
        #specializations
        fn fallback < #generics_params > (#inputs) #output #generics_where #block
        #[inline(always)]
        #(#attrs)* #vis #sig {
            static CACHE: core::sync::atomic::AtomicPtr<()> = core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());
            let cache = CACHE.load(core::sync::atomic::Ordering::Relaxed);
            if !cache.is_null() {
                let selected = unsafe { core::mem::transmute::<*mut (), unsafe fn(#inputs) #output>(cache) };
                return unsafe { selected(#(#arguments,)*) };
            }
            #branches
            let selected: unsafe fn(#inputs) #output = fallback;
            CACHE.store(selected as *mut (), core::sync::atomic::Ordering::Relaxed);
            unsafe { selected(#(#arguments,)*) }
        }
    })
}

struct Enable {
    enable: syn::LitStr,
}

impl syn::parse::Parse for Enable {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key != "enable" {
            return Err(syn::Error::new(key.span(), "expected `enable = \"...\"`"));
        }
        let _: syn::Token![=] = input.parse()?;
        let enable: syn::LitStr = input.parse()?;
        Ok(Self { enable })
    }
}

/// Expands `#[target_cpu(enable = "v3")]` into the target features of `v3`.
#[proc_macro_attribute]
pub fn target_cpu(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let attr = syn::parse_macro_input!(attr as Enable);
    let mut result = quote::quote! {};
    for cpu in attr.enable.value().split(',') {
        let target_cpu = match find_target_cpu(&attr.enable, cpu) {
            Ok(target_cpu) => target_cpu,
            Err(e) => return e.to_compile_error().into(),
        };
        let target_features = target_cpu.target_features;
        result.extend(quote::quote!(
            #(#[target_feature(enable = #target_features)])*
        ));
    }
    result.extend(proc_macro2::TokenStream::from(item));
    result.into()
}

/// Defines `is_<arch>_cpu_detected!`, mapping each cpu name of the
/// architecture to `crate::internal::is_<cpu>_detected()`.
#[proc_macro]
pub fn define_is_cpu_detected(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let target_arch = syn::parse_macro_input!(input as syn::LitStr).value();
    let mut arms = quote::quote! {};
    for target_cpu in target::TARGET_CPUS {
        if target_cpu.target_arch != target_arch {
            continue;
        }
        let cpu = target_cpu.target_cpu;
        let ident = syn::Ident::new(
            &format!("is_{}_detected", cpu.replace('.', "_")),
            proc_macro2::Span::mixed_site(),
        );
        arms.extend(quote::quote! {
            (#cpu) => { $crate::internal::#ident() };
        });
    }
    let ident = syn::Ident::new(
        &format!("is_{target_arch}_cpu_detected"),
        proc_macro2::Span::mixed_site(),
    );
    quote::quote! {
        #[macro_export]
        macro_rules! #ident {
            #arms
        }
    }
    .into()
}

/// Makes a function or module `pub`, so that benches can reach
/// specializations behind the `internal` feature.
#[proc_macro_attribute]
pub fn public(
    _attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let mut item = syn::parse_macro_input!(item as syn::Item);
    let vis: syn::Visibility = syn::parse_quote!(pub);
    match &mut item {
        syn::Item::Fn(item_fn) => item_fn.vis = vis,
        syn::Item::Mod(item_mod) => item_mod.vis = vis,
        other => {
            return syn::Error::new_spanned(other, "only functions and modules are supported")
                .to_compile_error()
                .into();
        }
    }
    quote::quote!(#item).into()
}
