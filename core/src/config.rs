use crate::policy::Policy;
use crate::strategy::{
    LocalFirstStrategy, OnlyLocalStrategy, OnlyRemoteStrategy, ParallelStrategy,
    RemoteFirstStrategy, StrategyHandler,
};
use dashmap::DashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use typed_builder::TypedBuilder;

#[allow(unused_imports)]
use crate::proxy::RequestProxy;

#[allow(unused_imports)]
use crate::source::{AsyncSource, SourceReporter};

/// [`StrategyRegistry`] maps every [`Policy`] to the [`StrategyHandler`] carrying it out. It is
/// shared by all clones of a [`RouterConfig`], so registering a handler later on is seen by
/// every proxy constructed afterward (proxies resolve their handler once, at construction)
pub struct StrategyRegistry {
    handlers: DashMap<Policy, Arc<dyn StrategyHandler>>,
}

impl StrategyRegistry {
    /// Creates / Constructs a [`StrategyRegistry`] with no handler at all
    pub fn empty() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Creates / Constructs a [`StrategyRegistry`] with the built-in handler of every policy
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        registry.register(Policy::OnlyRemote, OnlyRemoteStrategy);
        registry.register(Policy::OnlyLocal, OnlyLocalStrategy);
        registry.register(Policy::LocalFirstThenRemote, LocalFirstStrategy);
        registry.register(Policy::RemoteFirstThenLocal, RemoteFirstStrategy);
        registry.register(Policy::Parallel, ParallelStrategy);
        registry
    }

    pub fn register(&self, policy: Policy, handler: impl StrategyHandler) {
        self.register_shared(policy, Arc::new(handler));
    }

    pub fn register_shared(&self, policy: Policy, handler: Arc<dyn StrategyHandler>) {
        self.handlers.insert(policy, handler);
    }

    pub fn get(&self, policy: Policy) -> Option<Arc<dyn StrategyHandler>> {
        self.handlers.get(&policy).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, policy: Policy) -> bool {
        self.handlers.contains_key(&policy)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Debug for StrategyRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut policies: Vec<Policy> = self.handlers.iter().map(|entry| *entry.key()).collect();
        policies.sort_by_key(|policy| policy.code());
        f.debug_set().entries(policies).finish()
    }
}

/// This is the builder configs to use for building a [`RouterConfig`] instance.
/// By itself it should not be used, and it resides in [`RouterConfig::builder`]
#[derive(TypedBuilder)]
#[builder(build_method(into = RouterConfig))]
pub struct RouterConfigs {
    /// The failure message an [`AsyncSource`] reports when its loader produced nothing
    ///
    /// # Default Value
    /// [`RouterConfig::DEFAULT_ERROR_MESSAGE`]
    ///
    /// # Method Behavior
    /// This builder parameter method cannot be chained, as it is a typed builder,
    /// once set, you can never chain it
    #[builder(default = RouterConfig::DEFAULT_ERROR_MESSAGE.to_owned(), setter(into))]
    error_message: String,

    /// The failure message the caller gets when a [`RequestProxy`] could not start a
    /// single source for a request
    ///
    /// # Default Value
    /// [`RouterConfig::DEFAULT_DISPATCH_FAILURE_MESSAGE`]
    #[builder(default = RouterConfig::DEFAULT_DISPATCH_FAILURE_MESSAGE.to_owned(), setter(into))]
    dispatch_failure_message: String,

    /// The failure message a step gets when its source dropped the [`SourceReporter`]
    /// without reporting, for example because the job of the source panicked
    ///
    /// # Default Value
    /// [`RouterConfig::DEFAULT_ABANDONED_MESSAGE`]
    #[builder(default = RouterConfig::DEFAULT_ABANDONED_MESSAGE.to_owned(), setter(into))]
    abandoned_message: String,

    /// Whether constructing a [`RequestProxy`] fails when the source factory leaves a step
    /// of the policy without a task. When lenient, such a step fails at dispatch time instead
    ///
    /// # Default Value
    /// `true`
    #[builder(default = true)]
    require_all_sources: bool,

    /// Handlers replacing (or adding to) the built-in ones, applied in order
    ///
    /// # Default Value
    /// Empty, every policy uses its built-in handler
    #[builder(default)]
    handlers: Vec<(Policy, Arc<dyn StrategyHandler>)>,
}

impl From<RouterConfigs> for RouterConfig {
    fn from(configs: RouterConfigs) -> Self {
        let registry = StrategyRegistry::with_builtins();
        for (policy, handler) in configs.handlers {
            registry.register_shared(policy, handler);
        }

        Self {
            error_message: Arc::from(configs.error_message),
            dispatch_failure_message: Arc::from(configs.dispatch_failure_message),
            abandoned_message: Arc::from(configs.abandoned_message),
            require_all_sources: configs.require_all_sources,
            registry: Arc::new(registry),
        }
    }
}

/// [`RouterConfig`] holds what every [`RequestProxy`] built from it shares, the failure
/// messages, how strict construction is and the [`StrategyRegistry`]. Cloning is cheap, the
/// clones share one registry
///
/// # Constructor(s)
/// [`RouterConfig::default`] gives the built-in handlers with the default messages, for
/// anything else there is [`RouterConfig::builder`]
///
/// # Example
/// ```ignore
/// use sourcerouter::prelude::*;
///
/// let config = RouterConfig::builder()
///     .error_message("cache miss")
///     .require_all_sources(false)
///     .build();
///
/// assert_eq!(config.error_message(), "cache miss");
/// ```
#[derive(Clone)]
pub struct RouterConfig {
    error_message: Arc<str>,
    dispatch_failure_message: Arc<str>,
    abandoned_message: Arc<str>,
    require_all_sources: bool,
    registry: Arc<StrategyRegistry>,
}

impl RouterConfig {
    pub const DEFAULT_ERROR_MESSAGE: &'static str = "network data error";
    pub const DEFAULT_DISPATCH_FAILURE_MESSAGE: &'static str = "dispatch failed";
    pub const DEFAULT_ABANDONED_MESSAGE: &'static str = "source abandoned the request";

    /// Creates / Constructs a builder for the construction of [`RouterConfig`]
    ///
    /// # Returns
    /// The fully created [`RouterConfigsBuilder`] for [`RouterConfig`]
    pub fn builder() -> RouterConfigsBuilder {
        RouterConfigs::builder()
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn dispatch_failure_message(&self) -> &str {
        &self.dispatch_failure_message
    }

    pub fn abandoned_message(&self) -> &str {
        &self.abandoned_message
    }

    pub fn require_all_sources(&self) -> bool {
        self.require_all_sources
    }

    /// The handler registered for ``policy``, if any
    pub fn handler(&self, policy: Policy) -> Option<Arc<dyn StrategyHandler>> {
        self.registry.get(policy)
    }

    /// Registers ``handler`` for ``policy``, replacing the handler registered before it. The
    /// registry is shared with every clone of this config
    pub fn register(&self, policy: Policy, handler: impl StrategyHandler) {
        self.registry.register(policy, handler);
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Debug for RouterConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterConfig")
            .field("error_message", &self.error_message)
            .field("dispatch_failure_message", &self.dispatch_failure_message)
            .field("abandoned_message", &self.abandoned_message)
            .field("require_all_sources", &self.require_all_sources)
            .field("registry", &self.registry)
            .finish()
    }
}
