#[allow(unused_imports)]
use crate::source::AsyncSource;

#[allow(unused_imports)]
use crate::config::RouterConfig;

/// [`ResponseConverter`] decides whether a response loaded by an [`AsyncSource`] counts as
/// a success. A rejected response becomes a failure carrying the returned message, or the
/// [`RouterConfig::error_message`] when the converter has nothing to say
///
/// # Trait Implementation(s)
/// - `()` accepts every response
/// - [`EnvelopeCheck`] defers to a response implementing [`ResponseEnvelope`]
pub trait ResponseConverter<R>: Send + Sync + 'static {
    fn check(&self, response: &R) -> Result<(), Option<String>>;
}

impl<R> ResponseConverter<R> for () {
    fn check(&self, _response: &R) -> Result<(), Option<String>> {
        Ok(())
    }
}

/// A response which wraps its payload together with a status, like most JSON API
/// envelopes do (`{"code": 0, "message": "...", "data": ...}`)
pub trait ResponseEnvelope {
    fn is_success(&self) -> bool;

    fn message(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeCheck;

impl<R: ResponseEnvelope> ResponseConverter<R> for EnvelopeCheck {
    fn check(&self, response: &R) -> Result<(), Option<String>> {
        if response.is_success() {
            return Ok(());
        }

        Err(response.message().filter(|message| !message.is_empty()))
    }
}
