//! One handler call from request view to response.

use std::time::Instant;

use bytes::Bytes;
use http::Response;
use portico_core::{
    Endpoint, ExitStatus, HandlerContractError, HandlerError, RequestView,
};
use portico_extract::{ResolveError, Resolved, Resolver};
use portico_telemetry::metrics;
use serde_json::Value;
use tracing::Instrument;

use crate::serialize::ResponseSerializer;
use crate::transport;

/// What happened to a dispatched request, before it becomes a response.
#[derive(Debug)]
pub enum Outcome {
    /// The handler ran and its output satisfied the contract.
    Success(crate::Serialized),
    /// The request could not be turned into arguments.
    Rejected(ResolveError),
    /// The handler raised an error on purpose.
    Failed(portico_core::ApiError),
    /// The handler broke its response contract.
    ContractViolation(HandlerContractError),
}

impl Outcome {
    /// Label for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Rejected(err) => err.outcome(),
            Self::Failed(_) => "handler_error",
            Self::ContractViolation(_) => "contract_violation",
        }
    }

    /// Translates the outcome into a response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        match self {
            Self::Success(serialized) => match transport::success_response(&serialized) {
                Ok(response) => response,
                Err(err) => transport::contract_error_response(&err),
            },
            Self::Rejected(err) => transport::resolve_error_response(&err),
            Self::Failed(err) => transport::api_error_response(&err),
            Self::ContractViolation(err) => transport::contract_error_response(&err),
        }
    }
}

/// Runs resolve, handler, teardown and serialize for one endpoint.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    resolver: Resolver,
    serializer: ResponseSerializer,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(resolver: Resolver, serializer: ResponseSerializer) -> Self {
        Self {
            resolver,
            serializer,
        }
    }

    /// The resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The serializer.
    #[must_use]
    pub fn serializer(&self) -> &ResponseSerializer {
        &self.serializer
    }

    /// Dispatches and translates the outcome into a response.
    pub async fn dispatch(&self, endpoint: &Endpoint, view: &dyn RequestView) -> Response<Bytes> {
        let started = Instant::now();
        let response = self.run(endpoint, view).await.into_response();
        metrics::record_dispatch(
            endpoint.operation_id(),
            response.status().as_u16(),
            started.elapsed(),
        );
        response
    }

    /// Dispatches without building a response.
    ///
    /// Teardowns of entered dependencies have run when this returns, with
    /// [`ExitStatus::Failed`] if the handler raised.
    pub async fn run(&self, endpoint: &Endpoint, view: &dyn RequestView) -> Outcome {
        let span = tracing::debug_span!(
            "dispatch",
            operation_id = %endpoint.operation_id(),
            method = %endpoint.method(),
            path = %endpoint.path(),
        );
        self.run_inner(endpoint, view).instrument(span).await
    }

    async fn run_inner(&self, endpoint: &Endpoint, view: &dyn RequestView) -> Outcome {
        let Resolved { args, scope } = match self.resolver.resolve(endpoint, view).await {
            Ok(resolved) => resolved,
            Err(err) => {
                metrics::record_resolution(err.outcome());
                match &err {
                    ResolveError::Validation(failures) => {
                        metrics::record_validation_failures(failures);
                        tracing::debug!(failures = failures.len(), "request validation failed");
                    }
                    ResolveError::Authentication(auth) => {
                        tracing::warn!(error = %auth, "authentication failed");
                    }
                    other => tracing::debug!(error = %other, "request rejected"),
                }
                return Outcome::Rejected(err);
            }
        };
        metrics::record_resolution("resolved");

        let output = endpoint.handler().call(args).await;
        let status = if output.is_ok() {
            ExitStatus::Completed
        } else {
            ExitStatus::Failed
        };
        scope.close(status).await;

        match output {
            Ok(value) => self.serialize(endpoint, value),
            Err(HandlerError::Api(err)) => {
                if err.category() == portico_core::ErrorCategory::Internal {
                    tracing::error!(error = %err, "handler failed");
                } else {
                    tracing::debug!(error = %err, "handler returned an error");
                }
                Outcome::Failed(err)
            }
            Err(HandlerError::Output(err)) => {
                self.violation(endpoint, HandlerContractError::Serialization(err))
            }
        }
    }

    fn serialize(&self, endpoint: &Endpoint, value: Option<Value>) -> Outcome {
        match self
            .serializer
            .serialize(value, endpoint.response(), endpoint.status_code())
        {
            Ok(serialized) => Outcome::Success(serialized),
            Err(err) => self.violation(endpoint, err),
        }
    }

    fn violation(&self, endpoint: &Endpoint, err: HandlerContractError) -> Outcome {
        metrics::record_handler_contract_error(endpoint.operation_id());
        match &err {
            HandlerContractError::Mismatch { failures } => {
                let paths: Vec<String> = failures.iter().map(ToString::to_string).collect();
                tracing::error!(
                    error = %err,
                    failures = ?paths,
                    "handler output violates its response contract"
                );
            }
            _ => tracing::error!(error = %err, "handler output violates its response contract"),
        }
        Outcome::ContractViolation(err)
    }
}
