use crate::config::RouterConfig;
use crate::errors::RouterErrors;
use crate::source::{ResponseConverter, SourceId, SourceReporter, SourceTask};
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// [`SourceLoader`] is the async body of an [`AsyncSource`], it performs the actual fetch for a
/// request card. Returning `Ok(None)` means the source produced nothing, which is reported as
/// a failure with the configured error message
///
/// # Trait Implementation(s)
/// Any `Fn(Arc<C>) -> impl Future<Output = Result<Option<R>, E>>` closure is a loader
#[async_trait]
pub trait SourceLoader<C, R>: Send + Sync + 'static {
    type Error: Display + Send;

    async fn load(&self, card: Arc<C>) -> Result<Option<R>, Self::Error>;
}

#[async_trait]
impl<C, R, E, F, Fut> SourceLoader<C, R> for F
where
    C: Send + Sync + 'static,
    R: Send + 'static,
    E: Display + Send + 'static,
    F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<R>, E>> + Send,
{
    type Error = E;

    async fn load(&self, card: Arc<C>) -> Result<Option<R>, E> {
        self(card).await
    }
}

/// Represents a **spawned source task**, it wraps a [`SourceLoader`] and runs every request
/// as its own job on a tokio runtime. This is the glue most sources need, the loader only
/// describes how to fetch and the [`AsyncSource`] takes care of the [`SourceTask`] contract
///
/// # Behavior
/// - A new request aborts the job of the previous request of this source.
/// - [`SourceTask::cancel`] aborts the running job, an aborted job never reports a result.
/// - A loaded response goes through the [`ResponseConverter`] (by default `()`, which accepts
///   everything) before it is reported as a success.
/// - A loader (or converter) that panics fails the request with the panic message, or the
///   configured error message when the panic carries no text.
/// - [`SourceTask::destroy`] aborts the running job and turns every later request into a no-op.
///
/// # Example
/// ```ignore
/// use std::sync::Arc;
/// use sourcerouter::prelude::*;
///
/// let remote = AsyncSource::on_current_runtime(SourceId::Remote, |card: Arc<u32>| async move {
///     Ok::<_, String>(Some(*card * 2))
/// })?;
///
/// let sources = SourceSet::new().with(remote);
/// ```
pub struct AsyncSource<C, R, L> {
    source: SourceId,
    loader: Arc<L>,
    converter: Arc<dyn ResponseConverter<R>>,
    error_message: Arc<str>,
    runtime: Handle,
    job: Mutex<Option<AbortHandle>>,
    destroyed: AtomicBool,
    _card: PhantomData<fn(C)>,
}

impl<C, R, L> AsyncSource<C, R, L>
where
    C: Send + Sync + 'static,
    R: Send + 'static,
    L: SourceLoader<C, R>,
{
    /// Creates / Constructs a new [`AsyncSource`] running its jobs on ``runtime``
    ///
    /// # Argument(s)
    /// The [`SourceId`] this task is bound to, the [`SourceLoader`] doing the fetch and
    /// the tokio runtime [`Handle`] jobs are spawned on
    ///
    /// # See Also
    /// - [`AsyncSource::on_current_runtime`]
    pub fn new(source: SourceId, loader: L, runtime: Handle) -> Self {
        Self {
            source,
            loader: Arc::new(loader),
            converter: Arc::new(()),
            error_message: Arc::from(RouterConfig::DEFAULT_ERROR_MESSAGE),
            runtime,
            job: Mutex::new(None),
            destroyed: AtomicBool::new(false),
            _card: PhantomData,
        }
    }

    /// Same as [`AsyncSource::new`] but spawns on the runtime of the caller, fails
    /// with [`RouterErrors::NoRuntime`] outside a tokio runtime
    pub fn on_current_runtime(source: SourceId, loader: L) -> Result<Self, RouterErrors> {
        let runtime = Handle::try_current().map_err(|_| RouterErrors::NoRuntime)?;
        Ok(Self::new(source, loader, runtime))
    }

    pub fn with_converter(mut self, converter: impl ResponseConverter<R>) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Arc::from(message.into());
        self
    }

    /// Takes the error message of ``config``
    pub fn with_config(self, config: &RouterConfig) -> Self {
        let message = config.error_message().to_owned();
        self.with_error_message(message)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn abort_job(&self) -> bool {
        let job = self
            .job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match job {
            Some(job) => {
                job.abort();
                true
            }
            None => false,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

impl<C, R, L> SourceTask<C, R> for AsyncSource<C, R, L>
where
    C: Send + Sync + 'static,
    R: Send + 'static,
    L: SourceLoader<C, R>,
{
    fn source_id(&self) -> SourceId {
        self.source
    }

    fn request(&self, card: Arc<C>, reporter: SourceReporter<R>) {
        let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
        if self.destroyed.load(Ordering::Acquire) {
            tracing::debug!(source = %self.source, "Request on a destroyed source dropped");
            return;
        }

        let loader = self.loader.clone();
        let converter = self.converter.clone();
        let fallback = self.error_message.clone();
        let source = self.source;

        let handle = self.runtime.spawn(async move {
            let message = fallback.clone();
            let job = async move {
                match loader.load(card).await {
                    Ok(Some(response)) => match converter.check(&response) {
                        Ok(()) => Ok(response),
                        Err(message) => Err(message.unwrap_or_else(|| fallback.to_string())),
                    },
                    Ok(None) => Err(fallback.to_string()),
                    Err(err) => Err(err.to_string()),
                }
            };

            let outcome = match AssertUnwindSafe(job).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = panic_message(&*payload).unwrap_or_else(|| message.to_string());
                    tracing::warn!(%source, %message, "Source job panicked");
                    Err(message)
                }
            };

            tracing::trace!(%source, success = outcome.is_ok(), "Source job finished");
            reporter.report(outcome);
        });

        if let Some(previous) = job.replace(handle.abort_handle()) {
            previous.abort();
        }
    }

    fn cancel(&self) {
        if self.abort_job() {
            tracing::debug!(source = %self.source, "Source job aborted");
        }
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::Release);
        self.abort_job();
    }
}
