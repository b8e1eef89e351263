//! Parser for tool-call markers in model replies
//!
//! Calls look like `[TOOL salutationTool]{"name": "Ada"}[/TOOL]`. Text
//! outside the markers is kept as the visible part of the reply.

use crate::{ParleyError, Result};
use serde_json::Value;

const OPEN: &str = "[TOOL ";
const CLOSE: &str = "[/TOOL]";

/// A tool invocation requested by the model
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub arguments: Value,
}

/// A reply split into tool calls and the surrounding text
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedReply {
    pub calls: Vec<ToolCall>,
    pub text: String,
}

/// Extract every tool call from `reply`
///
/// An unterminated marker or arguments that are not a JSON object are a
/// `ToolFailure`. Empty arguments mean `{}`.
pub fn parse_tool_calls(reply: &str) -> Result<ParsedReply> {
    let mut parsed = ParsedReply::default();
    let mut rest = reply;

    while let Some(start) = rest.find(OPEN) {
        parsed.text.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let header_end = after_open
            .find(']')
            .ok_or_else(|| ParleyError::ToolFailure("unterminated tool marker".into()))?;
        let id = after_open[..header_end].trim();
        if id.is_empty() {
            return Err(ParleyError::ToolFailure("tool marker without id".into()));
        }

        let body = &after_open[header_end + 1..];
        let body_end = body
            .find(CLOSE)
            .ok_or_else(|| ParleyError::ToolFailure(format!("missing {} for {}", CLOSE, id)))?;

        let raw = body[..body_end].trim();
        let arguments = if raw.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str::<Value>(raw)
                .map_err(|e| ParleyError::ToolFailure(format!("{}: malformed arguments: {}", id, e)))?
        };

        if !arguments.is_object() {
            return Err(ParleyError::ToolFailure(format!(
                "{}: arguments must be a JSON object",
                id
            )));
        }

        parsed.calls.push(ToolCall {
            id: id.to_string(),
            arguments,
        });
        rest = &body[body_end + CLOSE.len()..];
    }

    parsed.text.push_str(rest);
    parsed.text = parsed.text.trim().to_string();
    Ok(parsed)
}
