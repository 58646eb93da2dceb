pub use crate::callback::{ChannelCallback, ResultCallback};
pub use crate::card::RequestCard;
pub use crate::chain::{ProcessChain, StepStatus};
pub use crate::config::{RouterConfig, StrategyRegistry};
pub use crate::errors::RouterErrors;
pub use crate::policy::Policy;
pub use crate::proxy::RequestProxy;
pub use crate::source::{
    AsyncSource, EnvelopeCheck, ResponseConverter, ResponseEnvelope, SourceFactory, SourceId,
    SourceLoader, SourceReporter, SourceSet, SourceTask,
};
pub use crate::strategy::{
    LocalFirstStrategy, OnlyLocalStrategy, OnlyRemoteStrategy, ParallelStrategy,
    RemoteFirstStrategy, StepAction, StepLauncher, StrategyHandler,
};
