//! Wire envelope for workflow invocations.

use serde::{Deserialize, Serialize};

use crate::domain::attributes::AttributeEntry;

use super::InvocationRequest;

/// Default SCIM schema URN for launched-workflow resources.
pub const DEFAULT_INVOCATION_SCHEMA: &str =
    "urn:ietf:params:scim:schemas:gateway:1.0:LaunchedWorkflow";

/// `{schemas: [...], invocation: {operationName, input: [...]}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationEnvelope {
    pub schemas: Vec<String>,
    pub invocation: InvocationBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationBody {
    pub operation_name: String,
    pub input: Vec<AttributeEntry>,
}

impl InvocationEnvelope {
    pub fn new(schema: impl Into<String>, request: &InvocationRequest) -> Self {
        Self {
            schemas: vec![schema.into()],
            invocation: InvocationBody {
                operation_name: request.operation_name().to_string(),
                input: request.parameters().encode(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serializes_to_remote_shape() {
        let request = InvocationRequest::new("Echo").unwrap().with_param("x", "1");
        let envelope = InvocationEnvelope::new(DEFAULT_INVOCATION_SCHEMA, &request);

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "schemas": [DEFAULT_INVOCATION_SCHEMA],
                "invocation": {
                    "operationName": "Echo",
                    "input": [{"key": "x", "value": "1"}]
                }
            })
        );
    }
}
