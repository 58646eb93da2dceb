use crate::chain::ProcessChain;
use crate::source::SourceId;
use crate::strategy::{StepAction, StrategyHandler, is_current_in_flight};

/// Represents a **fallback strategy** that asks the local source first. This strategy provides a
/// failover mechanism between the two sources of a proxy
///
/// # Behavior
/// - Dispatches the **local source** first.
/// - If the local source succeeds, the remote source is **never dispatched** and the local
///   payload is delivered.
/// - If the local source **fails**, the remote source is dispatched and its outcome, success
///   or failure, is the one delivered.
///
/// # See Also
/// - [`RemoteFirstStrategy`]
/// - [`StrategyHandler`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LocalFirstStrategy;

impl StrategyHandler for LocalFirstStrategy {
    fn process(&self) -> &'static [SourceId] {
        &[SourceId::Local, SourceId::Remote]
    }

    fn on_result(&self, chain: &mut ProcessChain, source: SourceId, succeeded: bool) -> StepAction {
        fall_back(chain, source, succeeded)
    }
}

/// Represents a **fallback strategy** that asks the remote source first, and only looks at
/// the local source when the remote one fails (for example signing in while offline). It
/// behaves exactly like [`LocalFirstStrategy`] with the two sources swapped
///
/// # See Also
/// - [`LocalFirstStrategy`]
/// - [`StrategyHandler`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemoteFirstStrategy;

impl StrategyHandler for RemoteFirstStrategy {
    fn process(&self) -> &'static [SourceId] {
        &[SourceId::Remote, SourceId::Local]
    }

    fn on_result(&self, chain: &mut ProcessChain, source: SourceId, succeeded: bool) -> StepAction {
        fall_back(chain, source, succeeded)
    }
}

/// The fallback completion rule, shared by both orders. A success settles the whole chain,
/// a failure moves to the next step and only the failure of the last step is delivered
pub fn fall_back(chain: &mut ProcessChain, source: SourceId, succeeded: bool) -> StepAction {
    if !is_current_in_flight(chain, source) {
        return StepAction::Continue;
    }

    if succeeded {
        chain.mark_all_done();
        return StepAction::Deliver;
    }

    chain.mark_done();
    if chain.is_exhausted() {
        StepAction::Deliver
    } else {
        StepAction::Continue
    }
}
