//! Dependency providers and request-scoped teardown.
//!
//! A dependency parameter is produced by a [`Provider`]. The produced value
//! may carry a [`Teardown`] that must run exactly once after the handler
//! finishes. Teardowns are collected in a [`DependencyScope`] and run in
//! reverse acquisition order, either through [`DependencyScope::close`] or,
//! if the scope is dropped first (cancelled request, panic), from `Drop`.

use crate::di::Container;
use crate::error::ApiError;
use crate::view::RequestView;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How the handler call ended, as seen by teardowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Handler returned successfully.
    Completed,
    /// Handler or resolution returned an error.
    Failed,
    /// The scope was dropped without being closed.
    Cancelled,
}

/// Cleanup attached to a provided value.
pub enum Teardown {
    /// Runs inline.
    Sync(Box<dyn FnOnce(ExitStatus) + Send>),
    /// Awaited.
    Async(Box<dyn FnOnce(ExitStatus) -> BoxFuture<'static, ()> + Send>),
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Teardown::Sync"),
            Self::Async(_) => f.write_str("Teardown::Async"),
        }
    }
}

/// A value produced by a provider plus its optional teardown.
pub struct Provided {
    value: Arc<dyn Any + Send + Sync>,
    teardown: Option<Teardown>,
}

impl Provided {
    /// Wraps an owned value.
    #[must_use]
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// Wraps an already shared value.
    #[must_use]
    pub fn shared<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value,
            teardown: None,
        }
    }

    /// Attaches a synchronous teardown.
    #[must_use]
    pub fn with_teardown(mut self, teardown: impl FnOnce(ExitStatus) + Send + 'static) -> Self {
        self.teardown = Some(Teardown::Sync(Box::new(teardown)));
        self
    }

    /// Attaches an asynchronous teardown.
    #[must_use]
    pub fn with_async_teardown<F, Fut>(mut self, teardown: F) -> Self
    where
        F: FnOnce(ExitStatus) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.teardown = Some(Teardown::Async(Box::new(move |status| {
            Box::pin(teardown(status))
        })));
        self
    }

    /// Splits into the value and the teardown.
    #[must_use]
    pub fn into_parts(self) -> (Arc<dyn Any + Send + Sync>, Option<Teardown>) {
        (self.value, self.teardown)
    }
}

impl fmt::Debug for Provided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provided")
            .field("teardown", &self.teardown)
            .finish_non_exhaustive()
    }
}

/// What a provider can see while producing its value.
#[derive(Clone, Copy)]
pub struct DependencyContext<'a> {
    /// The request being resolved.
    pub view: &'a dyn RequestView,
    /// Application services, if the facade has a container.
    pub container: Option<&'a Container>,
}

/// Produces a dependency value for one request.
///
/// Providers fail with an [`ApiError`]; its category decides the response
/// status (an `Internal` error becomes a 500).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Produces the value.
    async fn provide(&self, ctx: &DependencyContext<'_>) -> Result<Provided, ApiError>;
}

impl dyn Provider {
    /// A provider that resolves `T` from the facade's [`Container`].
    #[must_use]
    pub fn from_container<T: Send + Sync + 'static>() -> ContainerProvider<T> {
        ContainerProvider::new()
    }
}

/// [`Provider`] backed by an async closure that ignores the request.
pub struct FnProvider<F> {
    f: F,
}

/// Wraps a zero-argument async closure as a [`Provider`].
///
/// # Example
///
/// ```
/// use portico_core::{provider_fn, ApiError, ExitStatus, Provided};
///
/// let session = provider_fn(|| async {
///     Ok::<_, ApiError>(
///         Provided::value("session-1".to_string())
///             .with_teardown(|_status: ExitStatus| { /* release */ }),
///     )
/// });
/// # let _ = session;
/// ```
pub fn provider_fn<F, Fut>(f: F) -> FnProvider<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Provided, ApiError>> + Send + 'static,
{
    FnProvider { f }
}

#[async_trait]
impl<F, Fut> Provider for FnProvider<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Provided, ApiError>> + Send + 'static,
{
    async fn provide(&self, _ctx: &DependencyContext<'_>) -> Result<Provided, ApiError> {
        (self.f)().await
    }
}

/// Resolves a service registered in the [`Container`].
pub struct ContainerProvider<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContainerProvider<T> {
    /// Creates the provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ContainerProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Provider for ContainerProvider<T> {
    async fn provide(&self, ctx: &DependencyContext<'_>) -> Result<Provided, ApiError> {
        let container = ctx
            .container
            .ok_or_else(|| ApiError::internal("no service container is configured"))?;
        let service = container.require::<T>()?;
        Ok(Provided::shared(service))
    }
}

/// Teardowns entered during one request.
///
/// Dropping a scope that was never closed runs its teardowns with
/// [`ExitStatus::Cancelled`]. Async teardowns complete before `drop`
/// returns, except on a current-thread runtime: there they are spawned onto
/// the runtime and are lost if it shuts down first.
///
/// # Example
///
/// ```
/// use portico_core::{DependencyScope, ExitStatus, Teardown};
/// use std::sync::{Arc, Mutex};
///
/// # tokio_test::block_on(async {
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let mut scope = DependencyScope::new();
/// for name in ["db", "cache"] {
///     let log = Arc::clone(&log);
///     scope.push(name, Teardown::Sync(Box::new(move |_| log.lock().unwrap().push(name))));
/// }
/// scope.close(ExitStatus::Completed).await;
/// assert_eq!(*log.lock().unwrap(), vec!["cache", "db"]);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct DependencyScope {
    teardowns: Vec<(String, Teardown)>,
}

impl DependencyScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a teardown for the dependency `name`.
    pub fn push(&mut self, name: impl Into<String>, teardown: Teardown) {
        self.teardowns.push((name.into(), teardown));
    }

    /// Number of pending teardowns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.teardowns.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.teardowns.is_empty()
    }

    /// Runs every pending teardown, last entered first.
    pub async fn close(mut self, status: ExitStatus) {
        while let Some((name, teardown)) = self.teardowns.pop() {
            tracing::trace!(dependency = %name, ?status, "running teardown");
            match teardown {
                Teardown::Sync(f) => f(status),
                Teardown::Async(f) => f(status).await,
            }
        }
    }
}

impl Drop for DependencyScope {
    fn drop(&mut self) {
        if self.teardowns.is_empty() {
            return;
        }
        tracing::debug!(
            pending = self.teardowns.len(),
            "dependency scope dropped before close; running teardowns"
        );

        let pending: Vec<(String, Teardown)> = self.teardowns.drain(..).rev().collect();
        if pending
            .iter()
            .all(|(_, teardown)| matches!(teardown, Teardown::Sync(_)))
        {
            for (_, teardown) in pending {
                if let Teardown::Sync(f) = teardown {
                    f(ExitStatus::Cancelled);
                }
            }
            return;
        }

        let sequence = async move {
            for (_, teardown) in pending {
                match teardown {
                    Teardown::Sync(f) => f(ExitStatus::Cancelled),
                    Teardown::Async(f) => f(ExitStatus::Cancelled).await,
                }
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(sequence));
            }
            Ok(handle) => {
                handle.spawn(sequence);
            }
            Err(_) => match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(sequence),
                Err(err) => {
                    tracing::error!(error = %err, "could not run async teardowns");
                }
            },
        }
    }
}
