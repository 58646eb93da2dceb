pub mod fallback; // skipcq: RS-D1001

pub mod parallel; // skipcq: RS-D1001

pub mod single; // skipcq: RS-D1001

pub use fallback::*;
pub use parallel::*;
pub use single::*;

use crate::chain::{ProcessChain, StepStatus};
use crate::source::SourceId;

#[allow(unused_imports)]
use crate::proxy::RequestProxy;

#[allow(unused_imports)]
use crate::config::RouterConfig;

/// What a [`StrategyHandler`] tells the [`RequestProxy`] to do after it digested a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepAction {
    /// Move on to the next pending step, if there is one
    Continue,

    /// Hand the result to the caller
    Deliver,

    /// Hand the result to the caller and move on to the next pending step
    DeliverAndContinue,
}

impl StepAction {
    pub fn delivers(&self) -> bool {
        matches!(self, StepAction::Deliver | StepAction::DeliverAndContinue)
    }

    pub fn continues(&self) -> bool {
        matches!(self, StepAction::Continue | StepAction::DeliverAndContinue)
    }
}

/// The view of the source tasks a [`StrategyHandler`] gets while dispatching. Launching only
/// records the intent, the [`RequestProxy`] starts the source once its state lock is released
pub trait StepLauncher {
    /// Whether a task exists for ``source``
    fn is_available(&self, source: SourceId) -> bool;

    /// Launches the task of ``source`` with the card of the current dispatch, returns
    /// `false` when there is no such task
    fn launch(&mut self, source: SourceId) -> bool;
}

/// [`StrategyHandler`] binds the ordered steps of a policy to the completion rule deciding when
/// the caller gets a result. Handlers are stateless, one instance is shared by every
/// [`RequestProxy`] of the same [`RouterConfig`] and every method only works on the
/// [`ProcessChain`] it is handed
///
/// # Required Method(s)
/// Only [`StrategyHandler::process`] is required, every other method defaults to the shared
/// base rules ([`dispatch_current`], [`complete_current`] and [`abandon_current`]) which are
/// exactly what single step policies need
///
/// # Trait Implementation(s)
/// - [`OnlyRemoteStrategy`] and [`OnlyLocalStrategy`] for single step policies
/// - [`LocalFirstStrategy`] and [`RemoteFirstStrategy`] for fallback policies
/// - [`ParallelStrategy`] for asking every source at once
///
/// # Object Safety
/// [`StrategyHandler`] is object safe, the [`RouterConfig`] stores handlers as
/// `Arc<dyn StrategyHandler>`
pub trait StrategyHandler: Send + Sync + 'static {
    /// The step order the [`ProcessChain`] of a proxy is built from
    fn process(&self) -> &'static [SourceId];

    /// Attempts the current step(s), `false` means nothing could be started
    fn dispatch(&self, chain: &mut ProcessChain, launcher: &mut dyn StepLauncher) -> bool {
        dispatch_current(chain, launcher)
    }

    /// Digests the result ``source`` reported
    fn on_result(&self, chain: &mut ProcessChain, source: SourceId, _succeeded: bool) -> StepAction {
        complete_current(chain, source)
    }

    /// Decides what a failed [`StrategyHandler::dispatch`] turns into
    fn on_dispatch_failed(&self, chain: &mut ProcessChain) -> StepAction {
        abandon_current(chain)
    }

    /// The most deliveries the caller may see for a single dispatch
    fn max_deliveries(&self) -> usize {
        1
    }
}

/// Base dispatch rule, launches the step at the cursor when it is pending and backed by a task
pub fn dispatch_current(chain: &mut ProcessChain, launcher: &mut dyn StepLauncher) -> bool {
    let Some(source) = chain.current_step() else {
        return false;
    };

    if chain.current_status() != StepStatus::Pending || !launcher.is_available(source) {
        return false;
    }

    if chain.mark_in_flight().is_err() {
        return false;
    }

    launcher.launch(source)
}

/// Whether ``source`` is the step at the cursor and awaiting its result
pub fn is_current_in_flight(chain: &ProcessChain, source: SourceId) -> bool {
    chain.current_step() == Some(source) && chain.current_status() == StepStatus::InFlight
}

/// Base result rule, a result for a step which is not in flight is ignored, otherwise the step
/// completes and its result is terminal
pub fn complete_current(chain: &mut ProcessChain, source: SourceId) -> StepAction {
    if !is_current_in_flight(chain, source) {
        return StepAction::Continue;
    }

    chain.mark_done();
    StepAction::Deliver
}

/// Base dispatch failure rule, the step at the cursor counts as failed
pub fn abandon_current(chain: &mut ProcessChain) -> StepAction {
    chain.mark_done();
    if chain.is_exhausted() {
        StepAction::Deliver
    } else {
        StepAction::Continue
    }
}
