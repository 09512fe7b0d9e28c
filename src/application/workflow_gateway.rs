//! WorkflowGateway - Invokes remote workflows over the SCIM transport.
//!
//! One `invoke` is one POST to the launch endpoint. Parameters are encoded
//! into the ordered `{key, value}` input sequence, the response is decoded
//! through the attribute bag, and nothing is retried.
//!
//! # Example
//!
//! ```ignore
//! let gateway = WorkflowGateway::new(transport);
//! let request = InvocationRequest::new("Echo")?.with_param("x", "1");
//! let result = gateway.invoke(&request, &credentials, Duration::from_secs(30)).await?;
//! let roles: Vec<String> = result.output_list("roles").into_inner();
//! ```

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::{ErrorKind, GatewayError};
use crate::domain::invocation::{
    InvocationEnvelope, InvocationRequest, InvocationResult, DEFAULT_INVOCATION_SCHEMA,
};
use crate::ports::{Credentials, RemoteTransport, TransportError, TransportRequest};

/// Default path of the workflow launch endpoint.
pub const DEFAULT_INVOKE_PATH: &str = "LaunchedWorkflows";

/// Errors from a workflow invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The remote answered with a non-2xx status.
    #[error("remote returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl InvocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InvocationError::Transport(e) => e.kind(),
            InvocationError::Remote { .. } => ErrorKind::RemoteRejected,
            InvocationError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            InvocationError::InvalidRequest(_) => ErrorKind::ValidationFailed,
        }
    }
}

impl From<InvocationError> for GatewayError {
    fn from(err: InvocationError) -> Self {
        match err {
            InvocationError::Remote { status, body } => {
                GatewayError::new(ErrorKind::RemoteRejected, format!("remote returned {}", status))
                    .with_payload(body)
            }
            other => GatewayError::new(other.kind(), other.to_string()),
        }
    }
}

/// Gateway for remote workflow invocations.
pub struct WorkflowGateway {
    transport: Arc<dyn RemoteTransport>,
    invoke_path: String,
    schema: String,
}

impl WorkflowGateway {
    pub fn new(transport: Arc<dyn RemoteTransport>) -> Self {
        Self {
            transport,
            invoke_path: DEFAULT_INVOKE_PATH.to_string(),
            schema: DEFAULT_INVOCATION_SCHEMA.to_string(),
        }
    }

    pub fn with_invoke_path(mut self, path: impl Into<String>) -> Self {
        self.invoke_path = path.into();
        self
    }

    /// Overrides the schema URN placed in the envelope's `schemas`.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Builds the JSON body for a request.
    pub fn envelope(&self, request: &InvocationRequest) -> InvocationEnvelope {
        InvocationEnvelope::new(self.schema.clone(), request)
    }

    /// Submits one invocation and decodes its result.
    pub async fn invoke(
        &self,
        request: &InvocationRequest,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<InvocationResult, InvocationError> {
        let body = serde_json::to_value(self.envelope(request))
            .map_err(|e| InvocationError::InvalidRequest(e.to_string()))?;

        tracing::debug!(
            operation = request.operation_name(),
            parameters = request.parameters().len(),
            principal = %credentials.principal_id(),
            "Invoking workflow"
        );

        let response = self
            .transport
            .call(
                credentials,
                TransportRequest::post(self.invoke_path.clone(), body, timeout),
            )
            .await?;

        if !response.is_success() {
            tracing::debug!(
                operation = request.operation_name(),
                status = response.status,
                "Workflow invocation rejected"
            );
            return Err(InvocationError::Remote {
                status: response.status,
                body: response.body,
            });
        }

        let parsed: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| InvocationError::MalformedResponse(e.to_string()))?;
        if !parsed.is_object() {
            return Err(InvocationError::MalformedResponse(
                "response body is not a JSON object".to_string(),
            ));
        }

        let result = InvocationResult::from_response(&parsed);
        for warning in &result.warnings {
            tracing::warn!(
                operation = request.operation_name(),
                %warning,
                "Invocation response decode warning"
            );
        }

        Ok(result)
    }
}
