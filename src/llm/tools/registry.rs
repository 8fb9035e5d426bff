//! Function registry for tool execution

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::executor::ToolExecutor;
use crate::llm::core::types::ToolDeclaration;

/// Type-erased tool function: JSON arguments in, JSON result out
pub type AsyncToolFn =
    Box<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<String, String>> + Send + Sync>;

/// A tool ready to be registered, as produced by `#[tool]`'s `registration()`
pub struct ToolRegistration {
    pub name: &'static str,
    pub function: AsyncToolFn,
    pub declaration: ToolDeclaration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
}

struct Entry {
    function: AsyncToolFn,
    declaration: ToolDeclaration,
}

/// Registry of the tools the model may call during one conversation
///
/// Registration order is preserved so declarations reach the model in a
/// stable order.
#[derive(Default)]
pub struct FunctionRegistry {
    order: Vec<String>,
    entries: HashMap<String, Entry>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool produced by the `#[tool]` macro
    pub fn register(&mut self, registration: ToolRegistration) -> Result<(), RegistryError> {
        self.insert(
            registration.name.to_string(),
            registration.function,
            registration.declaration,
        )
    }

    /// Register a plain async function together with its declaration
    pub fn register_async<F, Args, R, Fut>(
        &mut self,
        declaration: ToolDeclaration,
        func: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let args = match serde_json::from_value::<Args>(args_json) {
                Ok(args) => args,
                Err(e) => {
                    let err_msg = format!("Failed to deserialize arguments: {}", e);
                    return Box::pin(async move { Err(err_msg) }) as BoxFuture<'static, _>;
                }
            };

            let future = func(args);
            Box::pin(async move {
                let result = future.await?;
                serde_json::to_string(&result)
                    .map_err(|e| format!("Failed to serialize result: {}", e))
            }) as BoxFuture<'static, _>
        };

        self.insert(declaration.name.clone(), Box::new(wrapper), declaration)
    }

    fn insert(
        &mut self,
        name: String,
        function: AsyncToolFn,
        declaration: ToolDeclaration,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.order.push(name.clone());
        self.entries.insert(
            name,
            Entry {
                function,
                declaration,
            },
        );
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn execute_function(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        match self.entries.get(name) {
            Some(entry) => (entry.function)(arguments).await,
            None => Err(format!("Unknown tool: {}", name)),
        }
    }
}

#[async_trait]
impl ToolExecutor for FunctionRegistry {
    async fn execute(
        &self,
        tool_use_id: String,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<String, String> {
        debug!(tool = %name, id = %tool_use_id, "executing tool");
        self.execute_function(&name, arguments).await
    }

    fn declarations(&self) -> Vec<ToolDeclaration> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| entry.declaration.clone())
            .collect()
    }
}
