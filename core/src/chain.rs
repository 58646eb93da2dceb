use crate::errors::RouterErrors;
use crate::source::SourceId;

#[allow(unused_imports)]
use crate::strategy::StrategyHandler;

/// The status of one step inside a [`ProcessChain`]. A step only ever moves forward,
/// `Pending -> InFlight -> Done`, the sole way back to [`StepStatus::Pending`]
/// is [`ProcessChain::reset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepStatus {
    /// Not attempted yet
    Pending,

    /// Dispatched to its source and awaiting a result
    InFlight,

    /// A result was received, or the step was abandoned
    Done,
}

/// [`ProcessChain`] is the per-dispatch state machine of a [`RequestProxy`]. It holds one
/// [`StepStatus`] slot per step of the policy and a cursor which sequential strategies use to
/// walk the steps in order. Parallel strategies ignore the cursor and address the slots
/// directly via [`ProcessChain::mark_in_flight_at`] and [`ProcessChain::mark_done_at`]
///
/// # Mutation
/// The chain is exclusively owned by one [`RequestProxy`] and only ever mutated by
/// a [`StrategyHandler`] while the proxy holds its state lock
///
/// # See Also
/// - [`StepStatus`]
/// - [`StrategyHandler`]
///
/// [`RequestProxy`]: crate::proxy::RequestProxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessChain {
    steps: Vec<SourceId>,
    status: Vec<StepStatus>,
    cursor: usize,
}

impl ProcessChain {
    /// Creates / Constructs a new [`ProcessChain`] with every step [`StepStatus::Pending`]
    ///
    /// # Argument(s)
    /// The ordered ``steps`` declared by a [`StrategyHandler`], the same source may
    /// not be listed twice
    ///
    /// # Returns
    /// The chain, or [`RouterErrors::EmptyProcess`] when ``steps`` is empty and
    /// [`RouterErrors::DuplicateStep`] when a source is listed twice
    pub fn new(steps: &[SourceId]) -> Result<Self, RouterErrors> {
        if steps.is_empty() {
            return Err(RouterErrors::EmptyProcess);
        }

        for (index, step) in steps.iter().enumerate() {
            if steps[..index].contains(step) {
                return Err(RouterErrors::DuplicateStep(*step));
            }
        }

        Ok(Self {
            steps: steps.to_vec(),
            status: vec![StepStatus::Pending; steps.len()],
            cursor: 0,
        })
    }

    pub fn reset(&mut self) {
        self.status.fill(StepStatus::Pending);
        self.cursor = 0;
    }

    /// The source at the cursor, `None` once the cursor walked past the last step
    pub fn current_step(&self) -> Option<SourceId> {
        self.steps.get(self.cursor).copied()
    }

    /// The status at the cursor, an exhausted cursor reads as [`StepStatus::Done`]
    pub fn current_status(&self) -> StepStatus {
        self.status_at(self.cursor)
    }

    /// The status of the slot at ``index``, out of range slots read as [`StepStatus::Done`]
    pub fn status_at(&self, index: usize) -> StepStatus {
        self.status.get(index).copied().unwrap_or(StepStatus::Done)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn steps(&self) -> &[SourceId] {
        &self.steps
    }

    pub fn statuses(&self) -> &[StepStatus] {
        &self.status
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The slot index of ``source``
    pub fn position(&self, source: SourceId) -> Option<usize> {
        self.steps.iter().position(|step| *step == source)
    }

    /// Moves the step at the cursor from [`StepStatus::Pending`] to [`StepStatus::InFlight`]
    pub fn mark_in_flight(&mut self) -> Result<(), RouterErrors> {
        self.mark_in_flight_at(self.cursor)
    }

    pub fn mark_in_flight_at(&mut self, index: usize) -> Result<(), RouterErrors> {
        let from = self.status_at(index);
        if from != StepStatus::Pending {
            return Err(RouterErrors::IllegalTransition {
                index,
                from,
                to: StepStatus::InFlight,
            });
        }

        self.status[index] = StepStatus::InFlight;
        Ok(())
    }

    /// Completes the step at the cursor and advances the cursor by one. Does
    /// nothing once the chain is exhausted
    pub fn mark_done(&mut self) {
        if self.cursor >= self.status.len() {
            return;
        }

        self.status[self.cursor] = StepStatus::Done;
        self.cursor += 1;
    }

    /// Completes the slot at ``index`` without touching the cursor
    pub fn mark_done_at(&mut self, index: usize) {
        if let Some(slot) = self.status.get_mut(index) {
            *slot = StepStatus::Done;
        }
    }

    /// Force-completes every step from the cursor onwards, leaving the cursor exhausted
    pub fn mark_all_done(&mut self) {
        while self.cursor < self.status.len() {
            self.mark_done();
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.status.iter().all(|status| *status == StepStatus::Done)
    }

    /// Whether any step is awaiting a result
    pub fn is_busy(&self) -> bool {
        self.status.contains(&StepStatus::InFlight)
    }

    /// The sources of every slot currently [`StepStatus::InFlight`]
    pub fn in_flight(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.steps
            .iter()
            .zip(self.status.iter())
            .filter(|(_, status)| **status == StepStatus::InFlight)
            .map(|(step, _)| *step)
    }
}
