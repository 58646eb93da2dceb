use crate::source::SourceId;
use crate::strategy::StrategyHandler;

/// Asks the remote source and nothing else. Its single step is always terminal, whatever the
/// remote source reports is what the caller gets
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OnlyRemoteStrategy;

impl StrategyHandler for OnlyRemoteStrategy {
    fn process(&self) -> &'static [SourceId] {
        &[SourceId::Remote]
    }
}

/// Asks the local source and nothing else, the mirror of [`OnlyRemoteStrategy`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OnlyLocalStrategy;

impl StrategyHandler for OnlyLocalStrategy {
    fn process(&self) -> &'static [SourceId] {
        &[SourceId::Local]
    }
}
