//! Procedural macros for tutor tool declarations

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, punctuated::Punctuated, token::Comma, Expr, ExprLit, FnArg, ItemFn, Lit,
    Meta, Type,
};

/// Attribute macro that turns a function into a model-callable tool
///
/// # Example
///
/// ```ignore
/// #[tool(name = "getUserProgressOverview", description = "Get the learner's progress")]
/// async fn user_progress_overview(
///     ctx: ToolContext,
///     args: ProgressOverviewArgs,
/// ) -> Result<ProgressReport, String> {
///     // Implementation
/// }
/// ```
///
/// This generates a module `user_progress_overview_tool` containing:
/// - `NAME`: the tool name the model sees
/// - `declaration()`: the `ToolDeclaration` built from the argument type's JSON Schema
/// - `execute`: re-export of the original function
/// - `registration(..)`: a complete `ToolRegistration`
///
/// A tool function takes either just its argument struct, or a context value
/// followed by the argument struct. With a context, `registration(ctx)` clones
/// the context into every invocation, which is how per-request state (the
/// signed-in user, database handles) reaches the tool.
///
/// # Attributes
///
/// - `description`: (required) what the tool does, shown to the model
/// - `name`: (optional) tool name, defaults to the function name
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = parse_macro_input!(attr with Punctuated::<Meta, Comma>::parse_terminated);
    let input_fn = parse_macro_input!(item as ItemFn);

    let mut description = None;
    let mut tool_name = None;

    for arg in attr_args {
        if let Meta::NameValue(nv) = arg {
            if let Expr::Lit(ExprLit { lit: Lit::Str(lit), .. }) = &nv.value {
                if nv.path.is_ident("description") {
                    description = Some(lit.value());
                } else if nv.path.is_ident("name") {
                    tool_name = Some(lit.value());
                }
            }
        }
    }

    let description = match description {
        Some(d) => d,
        None => {
            return syn::Error::new_spanned(
                &input_fn.sig,
                "tool attribute requires a 'description' parameter",
            )
            .to_compile_error()
            .into();
        }
    };

    let fn_name = &input_fn.sig.ident;
    let tool_name = tool_name.unwrap_or_else(|| fn_name.to_string());

    let param_types: Vec<&Type> = input_fn
        .sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => Some(&*pat_type.ty),
            FnArg::Receiver(_) => None,
        })
        .collect();

    let (context_type, arg_type) = match param_types.as_slice() {
        [args] => (None, strip_type_modifiers(args)),
        [ctx, args] => (Some(strip_type_modifiers(ctx)), strip_type_modifiers(args)),
        _ => {
            return syn::Error::new_spanned(
                &input_fn.sig,
                "tool function must take `(args)` or `(context, args)`",
            )
            .to_compile_error()
            .into();
        }
    };

    let module_name = syn::Ident::new(&format!("{}_tool", fn_name), fn_name.span());

    let mut pub_input_fn = input_fn.clone();
    pub_input_fn.vis = syn::parse_quote!(pub);

    let call = match context_type {
        Some(_) => quote! { execute(ctx.clone(), args) },
        None => quote! { execute(args) },
    };

    let finish = if input_fn.sig.asyncness.is_some() {
        quote! {
            let future = #call;
            Box::pin(async move {
                match future.await {
                    Ok(result) => ::serde_json::to_string(&result)
                        .map_err(|e| format!("Failed to serialize result: {}", e)),
                    Err(e) => Err(e),
                }
            }) as ::futures::future::BoxFuture<'static, Result<String, String>>
        }
    } else {
        quote! {
            let result = #call;
            Box::pin(async move {
                match result {
                    Ok(result) => ::serde_json::to_string(&result)
                        .map_err(|e| format!("Failed to serialize result: {}", e)),
                    Err(e) => Err(e),
                }
            }) as ::futures::future::BoxFuture<'static, Result<String, String>>
        }
    };

    let wrapper = quote! {
        let wrapper = move |args_json: ::serde_json::Value| {
            let args = match ::serde_json::from_value::<#arg_type>(args_json) {
                Ok(args) => args,
                Err(e) => {
                    let err_msg = format!("Failed to deserialize arguments: {}", e);
                    return Box::pin(async move { Err(err_msg) })
                        as ::futures::future::BoxFuture<'static, Result<String, String>>;
                }
            };
            #finish
        };
    };

    let registration = match context_type {
        Some(ctx_type) => quote! {
            /// Build a `ToolRegistration` bound to the given context
            pub fn registration(ctx: #ctx_type) -> ::odin_tutor::llm::tools::ToolRegistration {
                #wrapper
                ::odin_tutor::llm::tools::ToolRegistration {
                    name: NAME,
                    function: Box::new(wrapper),
                    declaration: declaration(),
                }
            }
        },
        None => quote! {
            /// Build a `ToolRegistration` for this tool
            pub fn registration() -> ::odin_tutor::llm::tools::ToolRegistration {
                #wrapper
                ::odin_tutor::llm::tools::ToolRegistration {
                    name: NAME,
                    function: Box::new(wrapper),
                    declaration: declaration(),
                }
            }
        },
    };

    let output = quote! {
        #pub_input_fn

        #[allow(dead_code)]
        pub mod #module_name {
            use super::*;

            /// The name of this tool as declared to the model
            pub const NAME: &str = #tool_name;

            /// The `ToolDeclaration` for this tool
            pub fn declaration() -> ::odin_tutor::llm::ToolDeclaration {
                ::odin_tutor::llm::tools::create_tool_declaration::<#arg_type>(
                    #tool_name,
                    #description,
                )
            }

            pub use super::#fn_name as execute;

            #registration
        }
    };

    TokenStream::from(output)
}

/// Strip references to get at the underlying type
fn strip_type_modifiers(ty: &Type) -> &Type {
    match ty {
        Type::Reference(type_ref) => strip_type_modifiers(&type_ref.elem),
        _ => ty,
    }
}
