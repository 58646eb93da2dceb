use crate::errors::RouterErrors;
use crate::source::SourceId;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// [`Policy`] names one of the five built-in arrangements of sources. A policy by itself is
/// nothing more than a tag, the steps and the completion rule both live in the
/// [`StrategyHandler`] that the [`RouterConfig`] binds to it
///
/// # Codes
/// Every policy also carries a stable numeric code (see [`Policy::code`]) for callers which
/// persist or transmit the chosen policy, alongside a kebab-case name used by
/// its [`Display`] and [`FromStr`] implementations
///
/// # See Also
/// - [`StrategyHandler`]
/// - [`RouterConfig`]
/// - [`SourceId`]
///
/// [`StrategyHandler`]: crate::strategy::StrategyHandler
/// [`RouterConfig`]: crate::config::RouterConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Only ever asks the remote source
    OnlyRemote,

    /// Only ever asks the local source
    OnlyLocal,

    /// Asks the local source first and falls back to the remote source when it fails
    LocalFirstThenRemote,

    /// Asks the remote source first and falls back to the local source when it fails
    RemoteFirstThenLocal,

    /// Asks both sources at once, every source that completes is delivered on its own
    Parallel,
}

impl Policy {
    pub const ALL: [Policy; 5] = [
        Policy::OnlyRemote,
        Policy::OnlyLocal,
        Policy::LocalFirstThenRemote,
        Policy::RemoteFirstThenLocal,
        Policy::Parallel,
    ];

    /// The ordered source steps of the built-in handler of this policy. A [`RequestProxy`]
    /// walks [`StrategyHandler::process`] of whatever handler is registered, which may differ
    /// once a custom handler replaces the built-in one
    ///
    /// [`RequestProxy`]: crate::proxy::RequestProxy
    /// [`StrategyHandler::process`]: crate::strategy::StrategyHandler::process
    pub fn steps(&self) -> &'static [SourceId] {
        match self {
            Policy::OnlyRemote => &[SourceId::Remote],
            Policy::OnlyLocal => &[SourceId::Local],
            Policy::LocalFirstThenRemote | Policy::Parallel => &[SourceId::Local, SourceId::Remote],
            Policy::RemoteFirstThenLocal => &[SourceId::Remote, SourceId::Local],
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Policy::OnlyRemote => 0,
            Policy::LocalFirstThenRemote => 1,
            Policy::Parallel => 2,
            Policy::RemoteFirstThenLocal => 3,
            Policy::OnlyLocal => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Policy> {
        Self::ALL.into_iter().find(|policy| policy.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Policy::OnlyRemote => "only-remote",
            Policy::OnlyLocal => "only-local",
            Policy::LocalFirstThenRemote => "local-first",
            Policy::RemoteFirstThenLocal => "remote-first",
            Policy::Parallel => "parallel",
        }
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = RouterErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|policy| policy.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| RouterErrors::UnknownPolicy(s.to_owned()))
    }
}
