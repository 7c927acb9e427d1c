//! Tool schema normalization.
//!
//! OpenAI-compatible endpoints reject function definitions whose parameter schema
//! declares `"type": "object"` without a usable `properties` map. Tool definitions
//! coming from MCP servers or hand-written JSON often omit it, send `null`, or send
//! an empty map the SDK later drops. [`normalize_tool_schemas`] walks
//! `tools[].function.parameters` and pins `properties` to `{}` in those cases.
//!
//! Anything that does not match the expected shape is left alone. The request body is
//! arbitrary JSON, so a shape mismatch is not an error.

use serde_json::{Map, Value};

/// Summary of a normalization pass, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Number of entries found in the `tools` array (mapping or not).
    pub tools_seen: usize,
    /// Number of parameter schemas that gained an empty `properties` map.
    pub schemas_fixed: usize,
}

impl NormalizeReport {
    pub fn changed(&self) -> bool {
        self.schemas_fixed > 0
    }
}

/// Repair every `tools[i].function.parameters` object schema in place.
pub fn normalize_tool_schemas(document: &mut Value) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    let Some(tools) = document.get_mut("tools").and_then(Value::as_array_mut) else {
        return report;
    };

    for tool in tools.iter_mut() {
        report.tools_seen += 1;
        if let Some(parameters) = parameters_mut(tool) {
            if fix_object_schema(parameters) {
                report.schemas_fixed += 1;
            }
        }
    }

    report
}

fn parameters_mut(tool: &mut Value) -> Option<&mut Map<String, Value>> {
    tool.as_object_mut()?
        .get_mut("function")?
        .as_object_mut()?
        .get_mut("parameters")?
        .as_object_mut()
}

/// Returns true when `properties` was rewritten.
fn fix_object_schema(schema: &mut Map<String, Value>) -> bool {
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return false;
    }

    // An empty map is already the repaired form. Non-null, non-map values are
    // someone else's problem.
    let needs_fix = matches!(schema.get("properties"), None | Some(Value::Null));

    if needs_fix {
        schema.insert("properties".to_string(), Value::Object(Map::new()));
    }
    needs_fix
}
