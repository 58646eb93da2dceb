use crate::callback::ResultCallback;
use crate::card::RequestCard;
use crate::chain::{ProcessChain, StepStatus};
use crate::config::RouterConfig;
use crate::errors::RouterErrors;
use crate::policy::Policy;
use crate::source::{ResultSink, SourceFactory, SourceId, SourceReporter, SourceTask};
use crate::strategy::{StepLauncher, StrategyHandler};
use std::collections::{HashMap, VecDeque};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use tracing::{debug, info, trace, warn};

static NEXT_PROXY_ID: AtomicU64 = AtomicU64::new(1);

type TaskMap<C, R> = HashMap<SourceId, Arc<dyn SourceTask<C, R>>>;

struct Report<R> {
    generation: u64,
    source: SourceId,
    outcome: Result<R, String>,
}

struct Delivery<R> {
    callback: Arc<dyn ResultCallback<R>>,
    outcome: Result<R, String>,
}

impl<R: 'static> Delivery<R> {
    fn run(self) {
        match self.outcome {
            Ok(payload) => self.callback.on_success(payload),
            Err(message) => self.callback.on_failure(message),
        }
    }
}

struct ProxyState<C, R> {
    chain: ProcessChain,
    card: Option<Arc<C>>,
    generation: u64,
    deliveries: usize,
    callback: Option<Arc<dyn ResultCallback<R>>>,
    sources: TaskMap<C, R>,
    destroyed: bool,
}

struct ProxyShared<C, R> {
    id: u64,
    policy: Policy,
    handler: Arc<dyn StrategyHandler>,
    dispatch_failure_message: Arc<str>,
    abandoned_message: Arc<str>,
    state: Mutex<ProxyState<C, R>>,
    inbox: Mutex<VecDeque<Report<R>>>,
    me: Weak<ProxyShared<C, R>>,
}

/// Starts the tasks a [`StrategyHandler`] asks for, each with a reporter stamped with the
/// generation of the dispatch it belongs to
struct ProxyLauncher<'a, C, R> {
    sources: &'a TaskMap<C, R>,
    card: &'a Arc<C>,
    generation: u64,
    sink: &'a Weak<ProxyShared<C, R>>,
    proxy: u64,
}

impl<C, R> StepLauncher for ProxyLauncher<'_, C, R>
where
    C: RequestCard,
    R: Send + 'static,
{
    fn is_available(&self, source: SourceId) -> bool {
        self.sources.contains_key(&source)
    }

    fn launch(&mut self, source: SourceId) -> bool {
        let Some(task) = self.sources.get(&source) else {
            return false;
        };

        debug!(proxy = self.proxy, %source, generation = self.generation, "Launching source");
        let sink: Weak<dyn ResultSink<R>> = self.sink.clone();
        task.request(
            self.card.clone(),
            SourceReporter::new(sink, self.generation, source),
        );
        true
    }
}

impl<C, R> ProxyShared<C, R>
where
    C: RequestCard,
    R: Send + 'static,
{
    fn lock(&self) -> MutexGuard<'_, ProxyState<C, R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_report(&self) -> Option<Report<R>> {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn has_reports(&self) -> bool {
        !self
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Dispatches the step(s) at the cursor for as long as the handler keeps asking to move on
    fn drive(&self, state: &mut ProxyState<C, R>, out: &mut Vec<Delivery<R>>) {
        for _ in 0..=state.chain.len() {
            if state.destroyed || state.chain.current_status() != StepStatus::Pending {
                return;
            }

            let ProxyState {
                chain,
                card,
                generation,
                sources,
                ..
            } = &mut *state;

            let Some(card) = card.as_ref() else {
                return;
            };

            let mut launcher = ProxyLauncher {
                sources,
                card,
                generation: *generation,
                sink: &self.me,
                proxy: self.id,
            };

            if self.handler.dispatch(chain, &mut launcher) {
                return;
            }

            let step = chain.current_step();
            warn!(proxy = self.id, policy = %self.policy, ?step, "Dispatch failed");
            let action = self.handler.on_dispatch_failed(chain);
            if action.delivers() {
                let message = self.dispatch_failure_message.to_string();
                self.deliver(state, Err(message), out);
            }

            if !action.continues() {
                return;
            }
        }
    }

    /// The single choke point every delivery of a dispatch goes through
    fn deliver(
        &self,
        state: &mut ProxyState<C, R>,
        outcome: Result<R, String>,
        out: &mut Vec<Delivery<R>>,
    ) {
        let limit = self.handler.max_deliveries();
        if state.deliveries >= limit {
            warn!(
                proxy = self.id,
                policy = %self.policy,
                limit,
                "Delivery suppressed, the dispatch already delivered"
            );
            return;
        }

        state.deliveries += 1;
        let Some(callback) = state.callback.clone() else {
            return;
        };

        debug!(
            proxy = self.id,
            policy = %self.policy,
            success = outcome.is_ok(),
            "Delivering result"
        );
        out.push(Delivery { callback, outcome });
    }

    fn settle(&self, state: &mut ProxyState<C, R>, report: Report<R>, out: &mut Vec<Delivery<R>>) {
        if state.destroyed || report.generation != state.generation {
            trace!(
                proxy = self.id,
                source = %report.source,
                generation = report.generation,
                "Result of an earlier dispatch dropped"
            );
            return;
        }

        let succeeded = report.outcome.is_ok();
        let action = self
            .handler
            .on_result(&mut state.chain, report.source, succeeded);

        debug!(
            proxy = self.id,
            source = %report.source,
            succeeded,
            ?action,
            "Result received"
        );

        if action.delivers() {
            self.deliver(state, report.outcome, out);
        }

        if action.continues() {
            self.drive(state, out);
        }
    }

    fn drain(&self, state: &mut ProxyState<C, R>, out: &mut Vec<Delivery<R>>) {
        while let Some(report) = self.next_report() {
            self.settle(state, report, out);
        }
    }

    /// Settles queued reports unless someone else holds the state, in which case the holder
    /// settles them before it lets go
    fn pump(&self) {
        loop {
            let deliveries = {
                let mut state = match self.state.try_lock() {
                    Ok(state) => state,
                    Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                    Err(TryLockError::WouldBlock) => return,
                };

                let mut deliveries = Vec::new();
                self.drain(&mut state, &mut deliveries);
                deliveries
            };

            deliveries.into_iter().for_each(Delivery::run);
            if !self.has_reports() {
                return;
            }
        }
    }
}

impl<C, R> ResultSink<R> for ProxyShared<C, R>
where
    C: RequestCard,
    R: Send + 'static,
{
    fn accept(&self, generation: u64, source: SourceId, outcome: Result<R, String>) {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Report {
                generation,
                source,
                outcome,
            });

        self.pump();
    }

    fn abandon(&self, generation: u64, source: SourceId) {
        debug!(proxy = self.id, %source, generation, "Source dropped its reporter");
        self.accept(generation, source, Err(self.abandoned_message.to_string()));
    }
}

/// [`RequestProxy`] is the per call site orchestrator of a fetch that can be satisfied by
/// more than one source. It owns one [`ProcessChain`], the source tasks produced for it, the
/// [`StrategyHandler`] of its [`Policy`] and the caller's [`ResultCallback`]
///
/// # Behavior
/// - [`RequestProxy::request`] with a card equal to the one in flight is dropped, there is at
///   most one dispatch per distinct card at any time.
/// - A different card preempts the dispatch in flight, its sources are cancelled and whatever
///   they still report is discarded.
/// - The callback sees exactly one delivery per dispatch, except for [`Policy::Parallel`]
///   where every source that completes is delivered on its own.
/// - A step that cannot be started fails like a source would, with the configured dispatch
///   failure message.
/// - A source dropping its [`SourceReporter`] without reporting fails its step with the
///   configured abandoned message, the step never stays in flight.
/// - [`RequestProxy::destroy`] (also run on drop) cancels and releases every source task,
///   results arriving afterward are dropped.
///
/// # Concurrency
/// Every decision is taken under one lock, so results racing in from several threads are
/// serialized. Sources are started under that lock and may report inline. The callback always
/// runs after the lock is released, it may submit a new request to the same proxy
///
/// # Example
/// ```ignore
/// use sourcerouter::prelude::*;
///
/// let sources = SourceSet::new().with(local).with(remote);
/// let (callback, mut results) = ChannelCallback::channel();
///
/// let proxy = RequestProxy::new(
///     sources,
///     Policy::LocalFirstThenRemote,
///     callback,
///     &RouterConfig::default(),
/// )?;
///
/// proxy.request(LoginCard::new("account", "password"));
/// let user = results.recv().await;
/// ```
///
/// # See Also
/// - [`Policy`]
/// - [`SourceTask`]
/// - [`RouterConfig`]
pub struct RequestProxy<C: RequestCard, R: Send + 'static> {
    shared: Arc<ProxyShared<C, R>>,
}

impl<C, R> RequestProxy<C, R>
where
    C: RequestCard,
    R: Send + 'static,
{
    /// Creates / Constructs a new [`RequestProxy`]
    ///
    /// # Argument(s)
    /// The [`SourceFactory`] asked once for every source the policy names, the [`Policy`]
    /// itself, the [`ResultCallback`] of the caller and the [`RouterConfig`] to resolve the
    /// strategy handler and the failure messages from
    ///
    /// # Returns
    /// The proxy, or one of the configuration errors of [`RouterErrors`] when no handler is
    /// registered for ``policy``, when its handler lists a source twice, when a produced task is bound to the wrong source or when
    /// a source is missing (see [`RouterConfig::require_all_sources`])
    pub fn new(
        factory: impl SourceFactory<C, R>,
        policy: Policy,
        callback: impl ResultCallback<R>,
        config: &RouterConfig,
    ) -> Result<Self, RouterErrors> {
        let handler = config
            .handler(policy)
            .ok_or(RouterErrors::UnregisteredPolicy(policy))?;
        let chain = ProcessChain::new(handler.process())?;

        let mut sources: TaskMap<C, R> = HashMap::new();
        for &source in chain.steps() {
            if sources.contains_key(&source) {
                continue;
            }

            match factory.create(source) {
                Some(task) => {
                    let produced = task.source_id();
                    if produced != source {
                        return Err(RouterErrors::MismatchedSource {
                            requested: source,
                            produced,
                        });
                    }
                    sources.insert(source, task);
                }

                None if config.require_all_sources() => {
                    return Err(RouterErrors::MissingSource(policy, source));
                }

                None => {
                    warn!(%policy, %source, "No task for a step of the policy, it will fail on dispatch");
                }
            }
        }

        if sources.is_empty() {
            return Err(RouterErrors::NoSources(policy));
        }

        let id = NEXT_PROXY_ID.fetch_add(1, Ordering::Relaxed);
        let callback: Arc<dyn ResultCallback<R>> = Arc::new(callback);
        let shared = Arc::new_cyclic(|me| ProxyShared {
            id,
            policy,
            handler,
            dispatch_failure_message: Arc::from(config.dispatch_failure_message()),
            abandoned_message: Arc::from(config.abandoned_message()),
            state: Mutex::new(ProxyState {
                chain,
                card: None,
                generation: 0,
                deliveries: 0,
                callback: Some(callback),
                sources,
                destroyed: false,
            }),
            inbox: Mutex::new(VecDeque::new()),
            me: me.clone(),
        });

        debug!(proxy = id, %policy, "Request proxy created");
        Ok(Self { shared })
    }

    /// Submits ``card``, see the behavior section of [`RequestProxy`] for how it interacts
    /// with a dispatch still in flight. Never blocks on a source
    pub fn request(&self, card: C) {
        let shared = &self.shared;
        let deliveries = {
            let mut guard = shared.lock();
            let state = &mut *guard;

            if state.destroyed {
                warn!(proxy = shared.id, "Request on a destroyed proxy dropped");
                return;
            }

            if state.chain.is_busy() {
                if state.card.as_deref() == Some(&card) {
                    debug!(proxy = shared.id, "Same card already in flight, request dropped");
                    return;
                }

                info!(
                    proxy = shared.id,
                    policy = %shared.policy,
                    "Card changed, preempting the dispatch in flight"
                );

                for source in state.chain.in_flight() {
                    if let Some(task) = state.sources.get(&source) {
                        task.cancel();
                    }
                }
            }

            state.chain.reset();
            state.generation += 1;
            state.deliveries = 0;
            state.card = Some(Arc::new(card.freeze().unwrap_or(card)));

            debug!(
                proxy = shared.id,
                policy = %shared.policy,
                generation = state.generation,
                "Dispatching"
            );

            let mut deliveries = Vec::new();
            shared.drive(state, &mut deliveries);
            shared.drain(state, &mut deliveries);
            deliveries
        };

        deliveries.into_iter().for_each(Delivery::run);
        shared.pump();
    }

    /// Cancels and destroys every source task and lets go of the callback. Results arriving
    /// afterward are dropped and so are later requests. Calling it again does nothing
    pub fn destroy(&self) {
        let shared = &self.shared;
        let tasks = {
            let mut state = shared.lock();
            if state.destroyed {
                return;
            }

            state.destroyed = true;
            state.generation += 1;
            state.callback = None;
            state.card = None;
            state.chain.mark_all_done();
            std::mem::take(&mut state.sources)
        };

        shared
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        for task in tasks.values() {
            task.cancel();
            task.destroy();
        }

        info!(proxy = shared.id, policy = %shared.policy, "Request proxy destroyed");
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn policy(&self) -> Policy {
        self.shared.policy
    }

    /// A copy of the step statuses of the current dispatch
    pub fn statuses(&self) -> Vec<StepStatus> {
        self.shared.lock().chain.statuses().to_vec()
    }

    /// Whether a step of the current dispatch awaits its result
    pub fn is_busy(&self) -> bool {
        self.shared.lock().chain.is_busy()
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.lock().destroyed
    }

    /// The snapshot of the card the current (or last) dispatch was issued for
    pub fn current_card(&self) -> Option<Arc<C>> {
        self.shared.lock().card.clone()
    }
}

impl<C: RequestCard, R: Send + 'static> Drop for RequestProxy<C, R> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<C: RequestCard, R: Send + 'static> Debug for RequestProxy<C, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("RequestProxy")
            .field("id", &self.shared.id)
            .field("policy", &self.shared.policy)
            .field("statuses", &state.chain.statuses())
            .field("generation", &state.generation)
            .field("destroyed", &state.destroyed)
            .finish()
    }
}
