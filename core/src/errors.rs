use crate::chain::StepStatus;
use crate::policy::Policy;
use crate::source::SourceId;
use thiserror::Error;

#[allow(unused_imports)]
use crate::chain::ProcessChain;

#[allow(unused_imports)]
use crate::proxy::RequestProxy;

#[allow(unused_imports)]
use crate::config::RouterConfig;

/// [`RouterErrors`] is the main enum that contains all the errors which can be thrown by
/// sourcerouter itself, it uses under the hood [`thiserror`] to make adding more errors as
/// painless as possible. Failures reported by a source are **not** part of this enum, those
/// travel as plain messages through the result channel and reach the caller's callback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterErrors {
    /// This error is meant to happen when a [`ProcessChain`] is constructed
    /// without a single step to walk through
    #[error("Process chain requires at least one step")]
    EmptyProcess,

    /// This error is meant to happen when a [`ProcessChain`] is constructed from steps
    /// naming the same source more than once
    #[error("Source `{0}` is listed more than once in the process")]
    DuplicateStep(SourceId),

    /// This error is meant to happen when the source factory supplied to
    /// [`RequestProxy::new`] produced no task for any step of the policy
    #[error("Source factory produced no task for any step of policy `{0}`")]
    NoSources(Policy),

    /// This error is meant to happen when [`RouterConfig`] requires every step to be backed
    /// by a task and the source factory left one of the steps of the policy empty
    #[error("Policy `{0}` names source `{1}` but the source factory produced no task for it")]
    MissingSource(Policy, SourceId),

    /// This error is meant to happen when the source factory answers a request for
    /// one source with a task bound to another source
    #[error("Source factory was asked for `{requested}` but produced a `{produced}` task")]
    MismatchedSource {
        requested: SourceId,
        produced: SourceId,
    },

    #[error("No strategy handler is registered for policy `{0}`")]
    UnregisteredPolicy(Policy),

    /// This error is meant to happen when a step of the [`ProcessChain`] is asked to move
    /// backwards or to skip a state (every step only ever goes Pending -> InFlight -> Done)
    #[error("Step `{index}` cannot move from `{from:?}` to `{to:?}`")]
    IllegalTransition {
        index: usize,
        from: StepStatus,
        to: StepStatus,
    },

    #[error("Unknown policy `{0}`")]
    UnknownPolicy(String),

    #[error("No tokio runtime is running on the current thread")]
    NoRuntime,
}
