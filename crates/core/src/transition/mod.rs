//! Shrink → swap → grow state machine.
//!
//! A trigger contracts the current style immediately and schedules a swap
//! step; the swap installs the next shape and style and schedules a settle
//! step; the settle step returns the machine to [`Phase::Idle`]. At most one
//! delayed step is outstanding at any time. It is tracked by a single
//! [`CancelHandle`], and every step also carries the generation of the
//! trigger that issued it, so a superseded trigger can never apply.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::TimingConfig,
    persist::PersistedRecord,
    shape::ShapeKind,
    style::{self, ColorSource, Stage, VisualStyle},
    timeline::{TimerId, TimerQueue},
};

/// What a trigger changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionKind {
    /// Random shape and freshly generated style. Advances the color stage.
    Randomize,
    /// Next shape in order, same style.
    AdvanceShape,
}

impl TransitionKind {
    /// Degrees added to the rotation while contracting.
    pub fn rotation_delta(self) -> u32 {
        match self {
            TransitionKind::Randomize => 180,
            TransitionKind::AdvanceShape => 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Contracting,
    Settling,
}

impl Phase {
    pub fn is_transitioning(self) -> bool {
        !matches!(self, Phase::Idle)
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Contracting => "contracting",
            Phase::Settling => "settling",
        }
    }
}

/// Snapshot of the shape bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionState {
    pub current_shape: ShapeKind,
    /// Shape shown before the latest trigger; only kept for cross-fades.
    pub previous_shape: ShapeKind,
    pub is_transitioning: bool,
}

/// Payload of the machine's delayed steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStep {
    Swap { generation: u64, kind: TransitionKind },
    Settle { generation: u64 },
}

impl TransitionStep {
    pub fn generation(self) -> u64 {
        match self {
            TransitionStep::Swap { generation, .. } | TransitionStep::Settle { generation } => {
                generation
            }
        }
    }
}

/// Handle to the one outstanding delayed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelHandle {
    timer: TimerId,
    generation: u64,
}

impl CancelHandle {
    /// Removes the pending timer. Returns `false` if it already fired.
    pub fn cancel<E>(self, timers: &mut TimerQueue<E>) -> bool {
        timers.cancel(self.timer)
    }
}

/// Result of feeding a fired step back into the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step belonged to a superseded trigger and changed nothing.
    Stale,
    /// New shape and style installed; the record should be persisted now.
    Swapped(PersistedRecord),
    /// Transition finished.
    Settled,
}

#[derive(Debug, Clone)]
pub struct TransitionMachine {
    phase: Phase,
    shape: ShapeKind,
    previous_shape: ShapeKind,
    style: VisualStyle,
    colors: ColorSource,
    timing: TimingConfig,
    generation: u64,
    pending: Option<CancelHandle>,
}

impl TransitionMachine {
    /// Idle machine showing a circle in the palette's initial style.
    pub fn new(colors: ColorSource, timing: TimingConfig) -> Self {
        let style = VisualStyle::initial(colors.palette());
        Self {
            phase: Phase::Idle,
            shape: ShapeKind::Circle,
            previous_shape: ShapeKind::Circle,
            style,
            colors,
            timing,
            generation: 0,
            pending: None,
        }
    }

    /// Installs a persisted record as the resting state.
    pub fn restore(&mut self, record: PersistedRecord) {
        self.shape = record.shape;
        self.previous_shape = record.shape;
        self.style = record.style;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn style(&self) -> &VisualStyle {
        &self.style
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn previous_shape(&self) -> ShapeKind {
        self.previous_shape
    }

    pub fn state(&self) -> TransitionState {
        TransitionState {
            current_shape: self.shape,
            previous_shape: self.previous_shape,
            is_transitioning: self.phase.is_transitioning(),
        }
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.colors.stage()
    }

    pub fn stage_index(&self) -> Option<usize> {
        self.colors.stage_index()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending(&self) -> Option<CancelHandle> {
        self.pending
    }

    /// Starts a transition, superseding any that is still in flight.
    pub fn trigger<E>(&mut self, kind: TransitionKind, timers: &mut TimerQueue<E>)
    where
        E: From<TransitionStep>,
    {
        if self.cancel(timers) {
            tracing::debug!(
                generation = self.generation,
                "superseding in-flight transition"
            );
        }

        self.generation += 1;
        let generation = self.generation;

        self.previous_shape = self.shape;
        self.style = self.style.contracted(kind.rotation_delta());
        self.phase = Phase::Contracting;

        let timer = timers.schedule_once(
            self.timing.contract_ms,
            TransitionStep::Swap { generation, kind }.into(),
        );
        self.pending = Some(CancelHandle { timer, generation });
        tracing::debug!(generation, ?kind, shape = %self.shape, "transition triggered");
    }

    /// Applies a fired step.
    pub fn on_step<E, R>(
        &mut self,
        step: TransitionStep,
        timers: &mut TimerQueue<E>,
        rng: &mut R,
    ) -> StepOutcome
    where
        E: From<TransitionStep>,
        R: Rng + ?Sized,
    {
        if !self.is_current(step.generation()) {
            tracing::trace!(
                step = step.generation(),
                current = self.generation,
                "ignoring stale transition step"
            );
            return StepOutcome::Stale;
        }

        match step {
            TransitionStep::Swap { generation, kind } if self.phase == Phase::Contracting => {
                StepOutcome::Swapped(self.swap(generation, kind, timers, rng))
            }
            TransitionStep::Settle { .. } if self.phase == Phase::Settling => {
                self.phase = Phase::Idle;
                self.pending = None;
                tracing::debug!(generation = self.generation, shape = %self.shape, "transition settled");
                StepOutcome::Settled
            }
            _ => StepOutcome::Stale,
        }
    }

    /// Drops the outstanding step, if any. The machine keeps its current
    /// style; used on supersede and on teardown.
    pub fn cancel<E>(&mut self, timers: &mut TimerQueue<E>) -> bool {
        match self.pending.take() {
            Some(handle) => handle.cancel(timers),
            None => false,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
            && self
                .pending
                .map(|handle| handle.generation == generation)
                .unwrap_or(false)
    }

    fn swap<E, R>(
        &mut self,
        generation: u64,
        kind: TransitionKind,
        timers: &mut TimerQueue<E>,
        rng: &mut R,
    ) -> PersistedRecord
    where
        E: From<TransitionStep>,
        R: Rng + ?Sized,
    {
        let (shape, style) = match kind {
            TransitionKind::Randomize => {
                let shape = ShapeKind::random(rng);
                (shape, style::generate(self.colors.palette(), rng))
            }
            TransitionKind::AdvanceShape => (self.shape.next(), self.style.expanded()),
        };

        self.shape = shape;
        self.style = style;
        self.phase = Phase::Settling;
        if kind == TransitionKind::Randomize {
            self.colors.advance();
        }

        let timer = timers.schedule_once(
            self.timing.settle_ms,
            TransitionStep::Settle { generation }.into(),
        );
        self.pending = Some(CancelHandle { timer, generation });
        tracing::debug!(generation, shape = %self.shape, "swapped shape");

        PersistedRecord::new(self.style.clone(), self.shape)
    }
}
