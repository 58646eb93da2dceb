pub mod converter; // skipcq: RS-D1001

pub mod spawned; // skipcq: RS-D1001

pub use converter::*;
pub use spawned::*;

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, Weak};

#[allow(unused_imports)]
use crate::proxy::RequestProxy;

/// Identifies one of the interchangeable origins a fetch can be satisfied from. It keys the
/// set of source tasks owned by a [`RequestProxy`] and names the steps of every policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    /// Data already on this side, a cache or a local store
    Local,

    /// Data on the other side, usually fetched over the network
    Remote,
}

impl SourceId {
    pub fn code(&self) -> u8 {
        match self {
            SourceId::Remote => 1,
            SourceId::Local => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<SourceId> {
        match code {
            1 => Some(SourceId::Remote),
            2 => Some(SourceId::Local),
            _ => None,
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceId::Local => f.write_str("local"),
            SourceId::Remote => f.write_str("remote"),
        }
    }
}

pub(crate) trait ResultSink<R>: Send + Sync {
    fn accept(&self, generation: u64, source: SourceId, outcome: Result<R, String>);

    /// The reporter of ``source`` was dropped without reporting
    fn abandon(&self, generation: u64, source: SourceId);
}

/// [`SourceReporter`] is the result channel handed to a [`SourceTask`] with every request. It is
/// consumed by the report, so a source can report at most once per request. Dropping the
/// reporter without reporting abandons the step, the step then fails with the
/// [`RouterConfig::abandoned_message`]. This is also what happens to the steps of a
/// source whose job panicked or was torn down
///
/// Reports that arrive after the owning [`RequestProxy`] moved on to another dispatch (or was
/// destroyed) are discarded silently
///
/// [`RouterConfig::abandoned_message`]: crate::config::RouterConfig::abandoned_message
pub struct SourceReporter<R> {
    sink: Option<Weak<dyn ResultSink<R>>>,
    generation: u64,
    source: SourceId,
}

impl<R: Send + 'static> SourceReporter<R> {
    pub(crate) fn new(sink: Weak<dyn ResultSink<R>>, generation: u64, source: SourceId) -> Self {
        Self {
            sink: Some(sink),
            generation,
            source,
        }
    }

    pub fn source_id(&self) -> SourceId {
        self.source
    }

    /// Whether anyone is still listening for this report
    pub fn is_attached(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| sink.strong_count() > 0)
    }

    pub fn success(self, payload: R) {
        self.report(Ok(payload));
    }

    pub fn failure(self, message: impl Into<String>) {
        self.report(Err(message.into()));
    }

    pub fn report(mut self, outcome: Result<R, String>) {
        if let Some(sink) = self.sink.take().and_then(|sink| sink.upgrade()) {
            sink.accept(self.generation, self.source, outcome);
        }
    }
}

impl<R> Drop for SourceReporter<R> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take().and_then(|sink| sink.upgrade()) {
            sink.abandon(self.generation, self.source);
        }
    }
}

impl<R> Debug for SourceReporter<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceReporter")
            .field("generation", &self.generation)
            .field("source", &self.source)
            .finish()
    }
}

/// [`SourceTask`] is the unit of work bound to exactly one [`SourceId`], it is the only place
/// where actual I/O happens. The [`RequestProxy`] hands every request a fresh [`SourceReporter`]
/// and never blocks on the task, so [`SourceTask::request`] must hand the work off and return
///
/// # Required Method(s)
/// - [`SourceTask::source_id`] returns the constant source this task is bound to
/// - [`SourceTask::request`] begins an operation, which must eventually report through the
///   ``reporter`` or be cancelled before doing so. A task may report inline
/// - [`SourceTask::cancel`] makes a best effort to abort the outstanding operation and to
///   suppress its result
/// - [`SourceTask::destroy`] releases the resources of the task, it may be called more than once
///
/// # Trait Implementation(s)
/// [`AsyncSource`] runs an async [`SourceLoader`] on a tokio runtime
///
/// # See Also
/// - [`SourceFactory`]
/// - [`SourceReporter`]
/// - [`AsyncSource`]
pub trait SourceTask<C, R>: Send + Sync + 'static {
    fn source_id(&self) -> SourceId;

    fn request(&self, card: Arc<C>, reporter: SourceReporter<R>);

    fn cancel(&self);

    fn destroy(&self);
}

/// Produces the source tasks of a [`RequestProxy`], zero or one per [`SourceId`]. It is invoked
/// once per source named by the policy when the proxy is constructed
pub trait SourceFactory<C, R> {
    fn create(&self, source: SourceId) -> Option<Arc<dyn SourceTask<C, R>>>;
}

impl<C, R, F> SourceFactory<C, R> for F
where
    F: Fn(SourceId) -> Option<Arc<dyn SourceTask<C, R>>>,
{
    fn create(&self, source: SourceId) -> Option<Arc<dyn SourceTask<C, R>>> {
        self(source)
    }
}

/// A ready-made [`SourceFactory`] holding at most one task per [`SourceId`]
pub struct SourceSet<C, R> {
    tasks: HashMap<SourceId, Arc<dyn SourceTask<C, R>>>,
}

impl<C: 'static, R: 'static> SourceSet<C, R> {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    /// Adds ``task`` under its own [`SourceId`], replacing any task previously added for it
    pub fn with(self, task: impl SourceTask<C, R>) -> Self {
        self.with_shared(Arc::new(task))
    }

    pub fn with_shared(mut self, task: Arc<dyn SourceTask<C, R>>) -> Self {
        self.tasks.insert(task.source_id(), task);
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<C: 'static, R: 'static> Default for SourceSet<C, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static, R: 'static> SourceFactory<C, R> for SourceSet<C, R> {
    fn create(&self, source: SourceId) -> Option<Arc<dyn SourceTask<C, R>>> {
        self.tasks.get(&source).cloned()
    }
}
