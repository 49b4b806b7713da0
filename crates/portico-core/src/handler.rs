//! Type-erased handlers.
//!
//! Handlers receive [`ResolvedArguments`] and return any `Serialize` value.
//! The value is turned into JSON right away so the response serializer can
//! validate it against the endpoint's contract.

use crate::args::ResolvedArguments;
use crate::dependency::BoxFuture;
use crate::error::ApiError;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Why a handler call produced no output.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler raised an error on purpose.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The returned value could not be converted to JSON.
    #[error("handler output could not be serialized: {0}")]
    Output(#[source] serde_json::Error),
}

/// Output of a handler: `None` when it returned `()` or `null`.
pub type HandlerOutput = Result<Option<Value>, HandlerError>;

type HandlerFn = dyn Fn(ResolvedArguments) -> BoxFuture<'static, HandlerOutput> + Send + Sync;

/// A shared, type-erased handler.
///
/// # Example
///
/// ```
/// use portico_core::{ApiError, Handler, ResolvedArguments};
///
/// let handler = Handler::new(|args: ResolvedArguments| async move {
///     let id: u64 = args.get("item_id")?;
///     Ok::<_, ApiError>(serde_json::json!({"item_id": id}))
/// });
/// # let _ = handler;
/// ```
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

fn to_output<T: Serialize>(value: &T) -> HandlerOutput {
    match serde_json::to_value(value).map_err(HandlerError::Output)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

impl Handler {
    /// Wraps an async handler.
    pub fn new<F, Fut, T>(f: F) -> Self
    where
        F: Fn(ResolvedArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Serialize + 'static,
    {
        Self {
            inner: Arc::new(move |args| -> BoxFuture<'static, HandlerOutput> {
                let fut = f(args);
                Box::pin(async move {
                    let value = fut.await?;
                    to_output(&value)
                })
            }),
        }
    }

    /// Wraps a synchronous handler.
    pub fn sync<F, T>(f: F) -> Self
    where
        F: Fn(ResolvedArguments) -> Result<T, ApiError> + Send + Sync + 'static,
        T: Serialize + 'static,
    {
        Self {
            inner: Arc::new(move |args| -> BoxFuture<'static, HandlerOutput> {
                let output = f(args).map_err(HandlerError::from).and_then(|v| to_output(&v));
                Box::pin(async move { output })
            }),
        }
    }

    /// Calls the handler.
    pub fn call(&self, args: ResolvedArguments) -> BoxFuture<'static, HandlerOutput> {
        (self.inner)(args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}
