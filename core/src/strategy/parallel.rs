use crate::chain::{ProcessChain, StepStatus};
use crate::source::SourceId;
use crate::strategy::{StepAction, StepLauncher, StrategyHandler};

/// Represents a **parallel strategy** which asks every source at the same time. Unlike the
/// fallback strategies there is no merged result, every source that completes is delivered
/// on its own, in whatever order the sources finish
///
/// # Behavior
/// - Every pending step backed by a task is launched at once, a step without a task is
///   completed on the spot and never delivers.
/// - The dispatch only fails when not a single step could be launched.
/// - Each result completes the slot of its own source and is delivered, a second result
///   for the same slot is ignored.
///
/// # See Also
/// - [`StrategyHandler`]
/// - [`LocalFirstStrategy`]
///
/// [`LocalFirstStrategy`]: crate::strategy::LocalFirstStrategy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParallelStrategy;

impl StrategyHandler for ParallelStrategy {
    fn process(&self) -> &'static [SourceId] {
        &[SourceId::Local, SourceId::Remote]
    }

    fn dispatch(&self, chain: &mut ProcessChain, launcher: &mut dyn StepLauncher) -> bool {
        let mut launched = false;
        for index in 0..chain.len() {
            if chain.status_at(index) != StepStatus::Pending {
                continue;
            }

            let source = chain.steps()[index];
            if !launcher.is_available(source) {
                chain.mark_done_at(index);
                continue;
            }

            if chain.mark_in_flight_at(index).is_ok() && launcher.launch(source) {
                launched = true;
            }
        }

        launched
    }

    fn on_result(&self, chain: &mut ProcessChain, source: SourceId, _succeeded: bool) -> StepAction {
        let Some(index) = chain.position(source) else {
            return StepAction::Continue;
        };

        if chain.status_at(index) != StepStatus::InFlight {
            return StepAction::Continue;
        }

        chain.mark_done_at(index);
        StepAction::Deliver
    }

    fn on_dispatch_failed(&self, chain: &mut ProcessChain) -> StepAction {
        chain.mark_all_done();
        StepAction::Deliver
    }

    fn max_deliveries(&self) -> usize {
        self.process().len()
    }
}
