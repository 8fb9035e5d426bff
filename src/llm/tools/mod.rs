//! Tool execution framework
//!
//! `ToolExecutor` is the seam the agent calls through; `FunctionRegistry` is
//! the implementation backed by functions annotated with `#[tool]`.

pub mod declaration;
pub mod executor;
pub mod registry;

pub use declaration::create_tool_declaration;
pub use executor::ToolExecutor;
pub use registry::{AsyncToolFn, FunctionRegistry, RegistryError, ToolRegistration};

/// Register several `#[tool]` functions sharing one context
///
/// Tool modules are named by identifier and must be in scope.
///
/// ```ignore
/// let mut registry = FunctionRegistry::new();
/// register_tools!(registry, ctx, list_topics_tool, search_web_tool)?;
/// ```
///
/// Expands to a `Result<(), RegistryError>` that stops at the first
/// duplicate name.
#[macro_export]
macro_rules! register_tools {
    ($registry:expr, $ctx:expr, $($tool_mod:ident),+ $(,)?) => {
        (|| -> ::std::result::Result<(), $crate::llm::tools::RegistryError> {
            $(
                $registry.register($tool_mod::registration($ctx.clone()))?;
            )+
            Ok(())
        })()
    };
}
