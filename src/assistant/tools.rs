use crate::{ParleyError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A function the assistant may call while answering
#[async_trait]
pub trait Tool: Send + Sync {
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object
    fn input_schema(&self) -> Value;

    async fn execute(&self, input: Value) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
struct SalutationInput {
    name: String,
}

/// Greets a person by name
#[derive(Debug, Default, Clone, Copy)]
pub struct SalutationTool;

impl SalutationTool {
    pub const ID: &'static str = "salutationTool";
}

#[async_trait]
impl Tool for SalutationTool {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Read the result of the tool"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let input: SalutationInput = serde_json::from_value(input)
            .map_err(|e| ParleyError::ToolFailure(format!("{}: invalid arguments: {}", Self::ID, e)))?;

        Ok(json!({ "message": format!("Hello {}!", input.name) }))
    }
}

/// Tools available to one assistant, keyed by id
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    /// Add a tool, replacing any tool with the same id
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.id().to_string(), tool);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub async fn execute(&self, id: &str, input: Value) -> Result<Value> {
        let tool = self
            .get(id)
            .ok_or_else(|| ParleyError::ToolFailure(format!("unknown tool '{}'", id)))?;

        debug!("Executing tool {} with {}", id, input);
        tool.execute(input).await
    }

    /// Usage notes appended to the system prompt
    pub fn instructions(&self) -> String {
        if self.tools.is_empty() {
            return String::new();
        }

        let mut text = String::from(
            "You can call tools. To call one, reply with only [TOOL id]{json arguments}[/TOOL]. \
             You will then receive the result and should answer the user with it.\n\nTools:",
        );
        for tool in self.tools.values() {
            text.push_str(&format!(
                "\n- {}: {} Arguments schema: {}",
                tool.id(),
                tool.description(),
                tool.input_schema()
            ));
        }
        text
    }
}
