#![allow(dead_code)]

use sourcerouter::prelude::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type InlineReply<C, R> = Box<dyn Fn(&C) -> Result<R, String> + Send + Sync>;

/// A source whose results are fired by hand. Reporters of every request are queued in
/// order, cancelling does not drop them so late results can be simulated
pub struct ManualSource<C, R> {
    source: SourceId,
    pending: Mutex<VecDeque<(Arc<C>, SourceReporter<R>)>>,
    cards: Mutex<Vec<Arc<C>>>,
    inline: Option<InlineReply<C, R>>,
    requests: AtomicUsize,
    cancels: AtomicUsize,
    destroys: AtomicUsize,
}

impl<C, R> ManualSource<C, R>
where
    C: Send + Sync + 'static,
    R: Send + 'static,
{
    pub fn new(source: SourceId) -> Arc<Self> {
        Arc::new(Self {
            source,
            pending: Mutex::new(VecDeque::new()),
            cards: Mutex::new(Vec::new()),
            inline: None,
            requests: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
        })
    }

    /// A source that reports from within `request` itself
    pub fn inline(
        source: SourceId,
        reply: impl Fn(&C) -> Result<R, String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            pending: Mutex::new(VecDeque::new()),
            cards: Mutex::new(Vec::new()),
            inline: Some(Box::new(reply)),
            requests: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
        })
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn cards(&self) -> Vec<Arc<C>> {
        self.cards.lock().unwrap().clone()
    }

    /// Takes the reporter of the oldest unanswered request
    pub fn take(&self) -> SourceReporter<R> {
        let (_, reporter) = self
            .pending
            .lock()
            .unwrap()
            .pop_front()
            .expect("no request awaits a result");
        reporter
    }

    pub fn succeed(&self, payload: R) {
        self.take().success(payload);
    }

    pub fn fail(&self, message: &str) {
        self.take().failure(message);
    }

    /// Drops the reporter of the oldest unanswered request without reporting
    pub fn abandon(&self) {
        drop(self.take());
    }
}

impl<C, R> SourceTask<C, R> for ManualSource<C, R>
where
    C: Send + Sync + 'static,
    R: Send + 'static,
{
    fn source_id(&self) -> SourceId {
        self.source
    }

    fn request(&self, card: Arc<C>, reporter: SourceReporter<R>) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.cards.lock().unwrap().push(card.clone());

        match &self.inline {
            Some(reply) => reporter.report(reply(&card)),
            None => self.pending.lock().unwrap().push_back((card, reporter)),
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

/// Collects every delivery a proxy makes
pub struct Recorder<R> {
    results: Arc<Mutex<Vec<Result<R, String>>>>,
}

impl<R: Clone + Send + 'static> Recorder<R> {
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn callback(&self) -> impl ResultCallback<R> + use<R> {
        let results = self.results.clone();
        move |result: Result<R, String>| results.lock().unwrap().push(result)
    }

    pub fn results(&self) -> Vec<Result<R, String>> {
        self.results.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.results.lock().unwrap().len()
    }
}

pub fn sources<C, R>(tasks: &[&Arc<ManualSource<C, R>>]) -> SourceSet<C, R>
where
    C: Send + Sync + 'static,
    R: Send + 'static,
{
    tasks.iter().fold(SourceSet::new(), |set, task| {
        set.with_shared((*task).clone())
    })
}

pub fn local_and_remote<C, R>() -> (Arc<ManualSource<C, R>>, Arc<ManualSource<C, R>>)
where
    C: Send + Sync + 'static,
    R: Send + 'static,
{
    (
        ManualSource::new(SourceId::Local),
        ManualSource::new(SourceId::Remote),
    )
}
