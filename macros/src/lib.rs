//! Procedural macros declaring extension capabilities for `any-caps`.
//!
//! Both macros take the same declaration shape and generate the same core
//! items: a capability tag, its operation entry, the `Capability` impl that
//! routes the entry into the ext slot, a target trait for concrete types to
//! opt into, and an extension trait putting the operation on `Any<S>` for
//! every set that declares the capability.
//!
//! [`member_capability!`] dispatches to a method on the stored value (via
//! the target trait). [`free_capability!`] dispatches to a named free
//! function and additionally emits a `<method>_targets!` helper that wires
//! the free function's per-type overloads into the target trait.

use proc_macro::TokenStream;
use proc_macro2::{Punct, Spacing};
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::{
    Attribute, Ident, Path, ReturnType, Token, Type, Visibility, braced, parenthesized,
    parse_macro_input,
};

struct CapabilityDef {
    attrs: Vec<Attribute>,
    vis: Visibility,
    name: Ident,
    method: Ident,
    args: Vec<(Ident, Type)>,
    ret: ReturnType,
    free_fn: Option<Path>,
}

impl Parse for CapabilityDef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        let kw: Ident = input.parse()?;
        if kw != "capability" {
            return Err(syn::Error::new(kw.span(), "expected `capability`"));
        }
        let name: Ident = input.parse()?;

        let body;
        braced!(body in input);
        body.parse::<Token![fn]>()?;
        let method: Ident = body.parse()?;

        let params;
        parenthesized!(params in body);
        params.parse::<Token![&]>()?;
        params.parse::<Token![self]>()?;
        let mut args = Vec::new();
        while !params.is_empty() {
            params.parse::<Token![,]>()?;
            if params.is_empty() {
                break;
            }
            let arg: Ident = params.parse()?;
            params.parse::<Token![:]>()?;
            let ty: Type = params.parse()?;
            args.push((arg, ty));
        }

        let ret: ReturnType = body.parse()?;
        let free_fn = if body.peek(Token![=]) {
            body.parse::<Token![=]>()?;
            Some(body.parse::<Path>()?)
        } else {
            None
        };
        body.parse::<Token![;]>()?;
        if !body.is_empty() {
            return Err(body.error("a capability declares exactly one operation"));
        }

        Ok(Self {
            attrs,
            vis,
            name,
            method,
            args,
            ret,
            free_fn,
        })
    }
}

/// Declares an extension capability dispatching to a method on the stored
/// value.
///
/// ```ignore
/// member_capability! {
///     /// Geometric area.
///     pub capability Area {
///         fn area(&self) -> f64;
///     }
/// }
/// ```
///
/// This generates (among the plumbing) a trait `AreaTarget` whose default
/// `area` body reports "no target" at runtime; types opt in by implementing
/// it, and types stored without a target keep working until `area` is
/// actually called on them. The operation itself lands on any
/// `Any<caps![.., Area, ..]>` through the generated `AreaExt` trait.
#[proc_macro]
pub fn member_capability(input: TokenStream) -> TokenStream {
    let def = parse_macro_input!(input as CapabilityDef);
    if let Some(path) = &def.free_fn {
        return syn::Error::new_spanned(path, "a member capability dispatches to a method; no function path allowed")
            .to_compile_error()
            .into();
    }
    expand(&def).into()
}

/// Declares an extension capability dispatching to a free function, named
/// after the `=`.
///
/// ```ignore
/// free_capability! {
///     pub capability Describe {
///         fn describe(&self) -> String = describe_impl;
///     }
/// }
///
/// fn describe_impl<T: std::fmt::Debug>(value: &T) -> String {
///     format!("{value:?}")
/// }
///
/// describe_targets!(i32, &'static str);
/// ```
///
/// `describe_targets!` wires the listed types to `describe_impl`; stored
/// types outside the list fall back to the runtime "no target" report.
#[proc_macro]
pub fn free_capability(input: TokenStream) -> TokenStream {
    let def = parse_macro_input!(input as CapabilityDef);
    if def.free_fn.is_none() {
        return syn::Error::new(def.method.span(), "a free capability needs `= path` naming its function")
            .to_compile_error()
            .into();
    }
    expand(&def).into()
}

fn expand(def: &CapabilityDef) -> proc_macro2::TokenStream {
    let CapabilityDef {
        attrs,
        vis,
        name,
        method,
        args,
        ret,
        free_fn,
    } = def;

    let entry_ident = format_ident!("{name}Entry");
    let target_ident = format_ident!("{name}Target");
    let ext_ident = format_ident!("{name}Ext");
    let shim_ident = format_ident!("__{method}_shim");
    let method_str = method.to_string();

    let arg_names: Vec<&Ident> = args.iter().map(|(n, _)| n).collect();
    let arg_types: Vec<&Type> = args.iter().map(|(_, t)| t).collect();
    let ret_type = match ret {
        ReturnType::Default => quote!(()),
        ReturnType::Type(_, ty) => quote!(#ty),
    };

    // Identity folds for the seven built-in slots.
    let passthrough = ["copy", "mov", "eq", "ord", "hash", "call", "render"]
        .iter()
        .map(|slot| {
            let mut camel = slot.to_string();
            camel[..1].make_ascii_uppercase();
            let fill_ty = format_ident!("Fill{camel}");
            let fill_fn = format_ident!("fill_{slot}");
            quote! {
                type #fill_ty<Tail: ::any_caps::Slot> = Tail;

                fn #fill_fn<Tail: ::any_caps::Slot>(_entry: Self::Entry, tail: Tail) -> Tail {
                    tail
                }
            }
        });

    let targets_macro = free_fn.as_ref().map(|path| {
        let macro_ident = format_ident!("{method}_targets");
        let dollar = Punct::new('$', Spacing::Alone);
        quote! {
            macro_rules! #macro_ident {
                (#dollar(#dollar ty:ty),+ #dollar(,)?) => {
                    #dollar(
                        impl #target_ident for #dollar ty {
                            fn #method(&self #(, #arg_names: #arg_types)*) #ret {
                                #path(self #(, #arg_names)*)
                            }
                        }
                    )+
                };
            }
        }
    });

    quote! {
        #(#attrs)*
        #vis struct #name;

        #[derive(Clone, Copy)]
        #vis struct #entry_ident {
            invoke: unsafe fn(*const u8 #(, #arg_types)*) -> #ret_type,
        }

        impl ::any_caps::Capability for #name {
            type Entry = #entry_ident;

            #(#passthrough)*

            type FillExt<Tail: ::any_caps::Slot> = (::any_caps::ExtNode<#name>, Tail);

            fn fill_ext<Tail: ::any_caps::Slot>(
                entry: #entry_ident,
                tail: Tail,
            ) -> (::any_caps::ExtNode<#name>, Tail) {
                (::any_caps::ExtNode { entry }, tail)
            }
        }

        /// Opt-in point for concrete types. The default body reports a
        /// missing target at runtime.
        #vis trait #target_ident {
            fn #method(&self #(, #arg_names: #arg_types)*) #ret {
                #(let _ = #arg_names;)*
                ::core::panic!(
                    "no `{}` target for `{}`",
                    #method_str,
                    ::core::any::type_name::<Self>(),
                )
            }
        }

        unsafe fn #shim_ident<T: #target_ident + 'static>(
            value: *const u8 #(, #arg_names: #arg_types)*
        ) -> #ret_type {
            // SAFETY: caller guarantees `value` points at a live `T`.
            unsafe { (*value.cast::<T>()).#method(#(#arg_names),*) }
        }

        impl<T: #target_ident + 'static> ::any_caps::ProvideEntry<T> for #name {
            fn entry(_class: ::any_caps::StorageClass) -> #entry_ident {
                #entry_ident {
                    invoke: #shim_ident::<T>,
                }
            }
        }

        /// Puts the operation on every container whose set declares the
        /// capability. The index parameter is inferred; never name it.
        #vis trait #ext_ident<I> {
            fn #method(&self #(, #arg_names: #arg_types)*) #ret;
        }

        impl<S, I> #ext_ident<I> for ::any_caps::Any<S>
        where
            S: ::any_caps::CapSet,
            S::ExtSlot: ::any_caps::FindExt<#name, I>,
        {
            fn #method(&self #(, #arg_names: #arg_types)*) #ret {
                match self.__ext_dispatch::<#name, I>() {
                    ::core::option::Option::Some((entry, value)) => {
                        // SAFETY: the entry was built for the held type.
                        unsafe { (entry.invoke)(value #(, #arg_names)*) }
                    }
                    ::core::option::Option::None => ::core::panic!(
                        "`{}` called on an empty container",
                        #method_str,
                    ),
                }
            }
        }

        #targets_macro
    }
}
