#[allow(unused_imports)]
use crate::proxy::RequestProxy;

/// [`RequestCard`] is the caller-defined value holding the parameters of one logical fetch.
/// A [`RequestProxy`] compares the card of every new request with the card of the dispatch in
/// flight, an equal card is a resubmission and is dropped, a different card preempts the
/// dispatch in flight
///
/// # Snapshots
/// A card that shares state with the caller (for example one wrapping an `Arc<Mutex<_>>`)
/// can opt in to being frozen at submission time by overriding [`RequestCard::freeze`]. The
/// proxy keeps whatever ``freeze`` returns as its snapshot, and falls back to the submitted
/// value when ``freeze`` returns `None` (the default)
///
/// # Example
/// ```ignore
/// use sourcerouter::card::RequestCard;
///
/// #[derive(Clone, PartialEq)]
/// struct LoginCard {
///     account: String,
///     password: String,
/// }
///
/// impl RequestCard for LoginCard {}
/// ```
pub trait RequestCard: PartialEq + Send + Sync + 'static {
    fn freeze(&self) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

macro_rules! plain_request_card {
    ($($ty: ty),* $(,)?) => {
        $(impl RequestCard for $ty {})*
    };
}

plain_request_card!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    String,
    &'static str,
);

impl<T: RequestCard> RequestCard for Option<T> {}

impl<T: RequestCard> RequestCard for Vec<T> {}

impl<A: RequestCard, B: RequestCard> RequestCard for (A, B) {}
