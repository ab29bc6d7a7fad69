// vim: tw=80
//! `#[double]` for traits.
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse2,
    spanned::Spanned,
    FnArg,
    GenericArgument,
    Ident,
    Item,
    ItemTrait,
    Pat,
    PathArguments,
    ReturnType,
    TraitItem,
    TraitItemFn,
    Type
};

/// A trait method the double can implement.
struct Method {
    sig: syn::Signature,
    /// Argument names and types, receiver excluded
    args: Vec<(Ident, Type)>,
}

pub(crate) fn do_double(attrs: TokenStream, input: TokenStream) -> TokenStream
{
    match expand(attrs, input) {
        Ok(ts) => ts,
        Err(e) => e.to_compile_error()
    }
}

fn expand(attrs: TokenStream, input: TokenStream) -> syn::Result<TokenStream> {
    if !attrs.is_empty() {
        return Err(syn::Error::new(attrs.span(),
            "#[double] takes no arguments"));
    }
    let item = match parse2::<Item>(input)? {
        Item::Trait(t) => t,
        other => return Err(syn::Error::new(other.span(),
            "#[double] may only be applied to traits"))
    };
    check_trait(&item)?;
    let methods = item.items.iter()
        .map(method)
        .collect::<syn::Result<Vec<_>>>()?;
    Ok(gen_double(&item, &methods))
}

fn check_trait(item: &ItemTrait) -> syn::Result<()> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(item.generics.span(),
            "#[double] does not support generic traits"));
    }
    if !item.supertraits.is_empty() {
        return Err(syn::Error::new(item.supertraits.span(),
            "#[double] does not support supertraits"));
    }
    Ok(())
}

fn method(item: &TraitItem) -> syn::Result<Method> {
    match item {
        TraitItem::Fn(f) => method_of(f),
        TraitItem::Const(c) => Err(syn::Error::new(c.span(),
            "#[double] does not support associated constants")),
        TraitItem::Type(t) => Err(syn::Error::new(t.span(),
            "#[double] does not support associated types")),
        other => Err(syn::Error::new(other.span(),
            "#[double] does not support this trait item"))
    }
}

fn method_of(f: &TraitItemFn) -> syn::Result<Method> {
    let mut sig = f.sig.clone();
    if let Some(a) = &sig.asyncness {
        return Err(syn::Error::new(a.span(),
            "#[double] does not support async methods"));
    }
    if sig.generics.type_params().next().is_some() ||
        sig.generics.const_params().next().is_some()
    {
        return Err(syn::Error::new(sig.generics.span(),
            "#[double] does not support generic methods"));
    }
    if sig.receiver().is_none() {
        return Err(syn::Error::new(sig.ident.span(),
            "#[double] does not support static methods"));
    }
    if let ReturnType::Type(_, ty) = &sig.output {
        if let Type::Reference(_) | Type::ImplTrait(_) = **ty {
            return Err(syn::Error::new(ty.span(),
                "#[double] methods must return owned values"));
        }
    }
    let mut args = Vec::new();
    for input in sig.inputs.iter_mut() {
        if let FnArg::Typed(pt) = input {
            match &mut *pt.pat {
                Pat::Ident(pi) => {
                    // The generated body only reads its arguments
                    pi.mutability = None;
                    args.push((pi.ident.clone(), (*pt.ty).clone()));
                },
                p => return Err(syn::Error::new(p.span(),
                    "#[double] arguments must be plain identifiers"))
            }
        }
    }
    Ok(Method{sig, args})
}

/// Expression converting one argument into a `Value`.
fn arg_value(ident: &Ident, ty: &Type) -> TokenStream {
    match ty {
        Type::Reference(_) => quote!(
            ::mockingbird::Value::from(::std::borrow::ToOwned::to_owned(&*#ident))
        ),
        _ => quote!(::mockingbird::Value::from(#ident))
    }
}

/// Is this `Result<T, E>`, by name?
fn is_result(ty: &Type) -> bool {
    let seg = match ty {
        Type::Path(tp) => tp.path.segments.last(),
        _ => None
    };
    match seg {
        Some(seg) if seg.ident == "Result" => match &seg.arguments {
            PathArguments::AngleBracketed(ab) => ab.args.iter()
                .filter(|a| matches!(a, GenericArgument::Type(_)))
                .count() == 2,
            _ => false
        },
        _ => false
    }
}

/// Wrap the dispatch expression `call` so it yields the method's return type.
fn return_conversion(output: &ReturnType, call: TokenStream) -> TokenStream {
    match output {
        ReturnType::Default => quote!(::mockingbird::__private::into_unit(#call)),
        ReturnType::Type(_, ty) if is_result(ty) =>
            quote!(::mockingbird::__private::into_result(#call)),
        ReturnType::Type(..) =>
            quote!(::mockingbird::__private::into_return(#call))
    }
}

fn gen_method(m: &Method) -> TokenStream {
    let sig = &m.sig;
    let name = sig.ident.to_string();
    let values = m.args.iter().map(|(i, ty)| arg_value(i, ty));
    let call = quote!(
        self.double.call_args(#name,
            ::mockingbird::CallArgs::from_positional(vec![#(#values),*]))
    );
    let body = return_conversion(&sig.output, call);
    quote!(#sig { #body })
}

fn gen_double(item: &ItemTrait, methods: &[Method]) -> TokenStream {
    let vis = &item.vis;
    let unsafety = &item.unsafety;
    let trait_ident = &item.ident;
    let name = trait_ident.to_string();
    let double_ident = format_ident!("Double{}", trait_ident);
    let doc = format!("Test double for [`{}`]", trait_ident);
    let members = methods.iter().map(|m| {
        let member = m.sig.ident.to_string();
        let params = m.args.iter().map(|(i, _)| i.to_string());
        quote!(.member(#member, ::mockingbird::Signature::new()
                       #(.param(#params))*))
    });
    let impls = methods.iter().map(gen_method);
    quote!(
        #[doc = #doc]
        #[derive(Clone)]
        #vis struct #double_ident {
            double: ::mockingbird::Double,
        }

        #[allow(dead_code)]
        impl #double_ident {
            /// A strict double that checks every declaration and call
            /// against the trait's method signatures.
            pub fn new() -> Self {
                Self::from_double(Self::builder().build())
            }

            /// The builder behind [`new`](Self::new), for adding originals
            /// or a substitution target.
            pub fn builder() -> ::mockingbird::DoubleBuilder {
                ::mockingbird::Double::builder(#name)
                    .strict(true)
                    .strict_signatures(Self::signatures())
            }

            pub fn from_double(double: ::mockingbird::Double) -> Self {
                #double_ident{double}
            }

            /// One signature per trait method.
            pub fn signatures() -> ::mockingbird::Signatures {
                ::mockingbird::Signatures::new()
                    #(#members)*
            }
        }

        impl ::std::default::Default for #double_ident {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::ops::Deref for #double_ident {
            type Target = ::mockingbird::Double;

            fn deref(&self) -> &::mockingbird::Double {
                &self.double
            }
        }

        #unsafety impl #trait_ident for #double_ident {
            #(#impls)*
        }
    )
}
