//! The mounted widget: one owner for every piece of state.

use rand::Rng;

use crate::{
    autocycle::{AutoCycle, AutoCycleTick},
    config::WidgetConfig,
    input::{Action, InputAdapter, InputEvent},
    persist::{KeyValueStore, PersistedRecord, StylePersistence},
    render::{Frame, Surface},
    shape::ShapeKind,
    style::{Stage, VisualStyle},
    timeline::TimerQueue,
    transition::{
        Phase, StepOutcome, TransitionKind, TransitionMachine, TransitionState, TransitionStep,
    },
    Result,
};

/// Everything that can sit in the widget's timer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    Transition(TransitionStep),
    AutoCycle,
}

impl From<TransitionStep> for WidgetEvent {
    fn from(step: TransitionStep) -> Self {
        WidgetEvent::Transition(step)
    }
}

impl From<AutoCycleTick> for WidgetEvent {
    fn from(_: AutoCycleTick) -> Self {
        WidgetEvent::AutoCycle
    }
}

/// Store and surface handed back by [`Widget::unmount`].
#[derive(Debug)]
pub struct Detached<K, S> {
    pub store: K,
    pub surface: S,
}

/// Mounted widget instance.
///
/// `K` persists the last style, `S` draws frames and `R` supplies randomness.
/// Time only moves through [`Widget::advance`] and [`Widget::advance_to`],
/// which fire due timers one at a time in deadline order.
pub struct Widget<K, S, R> {
    machine: TransitionMachine,
    auto_cycle: AutoCycle,
    input: InputAdapter,
    timers: TimerQueue<WidgetEvent>,
    persistence: StylePersistence<K>,
    surface: S,
    rng: R,
}

impl<K, S, R> Widget<K, S, R>
where
    K: KeyValueStore,
    S: Surface,
    R: Rng,
{
    /// Builds the widget, restores the last saved style if there is a usable
    /// one and presents the first frame.
    pub fn mount(config: &WidgetConfig, store: K, surface: S, rng: R) -> Result<Self> {
        let colors = config.palette.build()?;
        let mut machine = TransitionMachine::new(colors, config.timing);
        let persistence = StylePersistence::new(store, config.storage_key.clone());

        match persistence.load(machine.style()) {
            Some(record) => {
                tracing::info!(shape = %record.shape, "restored saved style");
                machine.restore(record);
            }
            None => tracing::debug!("no saved style, using defaults"),
        }

        let mut widget = Self {
            machine,
            auto_cycle: AutoCycle::new(config.timing.auto_cycle_ms),
            input: InputAdapter::new(config.gesture),
            timers: TimerQueue::new(),
            persistence,
            surface,
            rng,
        };
        widget.present();
        Ok(widget)
    }

    pub fn style(&self) -> &VisualStyle {
        self.machine.style()
    }

    pub fn shape(&self) -> ShapeKind {
        self.machine.shape()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn state(&self) -> TransitionState {
        self.machine.state()
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.machine.stage()
    }

    pub fn stage_index(&self) -> Option<usize> {
        self.machine.stage_index()
    }

    pub fn is_auto_cycling(&self) -> bool {
        self.auto_cycle.is_running()
    }

    /// Current widget time in milliseconds.
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn persistence(&self) -> &StylePersistence<K> {
        &self.persistence
    }

    /// The record [`Widget::mount`] would restore right now.
    pub fn saved_record(&self) -> Option<PersistedRecord> {
        self.persistence.load(self.machine.style())
    }

    pub fn frame(&self) -> Frame {
        Frame::new(
            self.timers.now(),
            self.machine.shape(),
            self.machine.previous_shape(),
            self.machine.style().clone(),
            self.machine.phase(),
            self.auto_cycle.is_running(),
        )
    }

    pub fn trigger(&mut self, kind: TransitionKind) {
        self.machine.trigger(kind, &mut self.timers);
        self.present();
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        for action in self.input.handle(event) {
            self.apply(action);
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Trigger(kind) => self.trigger(kind),
            Action::ToggleAutoCycle => {
                self.toggle_auto_cycle();
            }
            Action::ToggleFullscreen => self.toggle_fullscreen(),
        }
    }

    /// See [`AutoCycle::start`].
    pub fn start_auto_cycle(&mut self) -> bool {
        let started = self.auto_cycle.start(&mut self.timers);
        if started {
            self.present();
        }
        started
    }

    /// See [`AutoCycle::stop`].
    pub fn stop_auto_cycle(&mut self) -> bool {
        let stopped = self.auto_cycle.stop(&mut self.timers);
        if stopped {
            self.present();
        }
        stopped
    }

    pub fn toggle_auto_cycle(&mut self) -> bool {
        let running = self.auto_cycle.toggle(&mut self.timers);
        self.present();
        running
    }

    pub fn toggle_fullscreen(&mut self) {
        if let Err(err) = self.surface.toggle_fullscreen() {
            tracing::warn!("fullscreen toggle failed: {}", err);
        }
    }

    /// Moves time forward by `delta_ms`.
    pub fn advance(&mut self, delta_ms: u64) {
        let target = self.timers.now().saturating_add(delta_ms);
        self.advance_to(target);
    }

    /// Fires every timer due up to `time`, then parks the clock there.
    pub fn advance_to(&mut self, time: u64) {
        while let Some((_, event)) = self.timers.pop_due(time) {
            self.dispatch(event);
        }
        self.timers.advance_to(time);
    }

    /// Runs until no transition step is pending. A running auto-cycle keeps
    /// re-arming, so only transition timers are waited for.
    pub fn settle(&mut self) {
        while self.machine.pending().is_some() {
            match self.timers.next_deadline() {
                Some(deadline) => self.advance_to(deadline),
                None => break,
            }
        }
    }

    /// Stops the auto-cycle, drops any in-flight transition step and hands
    /// back the store and surface.
    pub fn unmount(mut self) -> Detached<K, S> {
        self.auto_cycle.stop(&mut self.timers);
        self.machine.cancel(&mut self.timers);
        self.timers.clear();
        tracing::debug!(at_ms = self.timers.now(), "widget unmounted");
        Detached {
            store: self.persistence.into_store(),
            surface: self.surface,
        }
    }

    fn dispatch(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::AutoCycle => self.trigger(TransitionKind::Randomize),
            WidgetEvent::Transition(step) => {
                match self.machine.on_step(step, &mut self.timers, &mut self.rng) {
                    StepOutcome::Stale => {}
                    StepOutcome::Swapped(record) => {
                        if let Err(err) = self.persistence.save(&record) {
                            tracing::warn!("failed to persist style: {}", err);
                        }
                        self.present();
                    }
                    StepOutcome::Settled => self.present(),
                }
            }
        }
    }

    fn present(&mut self) {
        let frame = self.frame();
        if let Err(err) = self.surface.present(&frame) {
            tracing::warn!("render surface rejected frame: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{persist::MemoryStore, render::RecordingSurface};
    use rand::{rngs::StdRng, SeedableRng};

    type TestWidget = Widget<MemoryStore, RecordingSurface, StdRng>;

    fn mount(seed: u64) -> TestWidget {
        Widget::mount(
            &WidgetConfig::default(),
            MemoryStore::new(),
            RecordingSurface::new(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn mount_presents_default_frame() {
        let widget = mount(0);
        let frame = widget.surface().last().unwrap();
        assert_eq!(frame.shape, ShapeKind::Circle);
        assert_eq!(frame.phase, Phase::Idle);
        assert_eq!(frame.style.size, 300);
        assert!(widget.saved_record().is_none());
    }

    #[test]
    fn auto_cycle_fires_randomize_every_interval() {
        let mut widget = mount(4);
        assert!(widget.start_auto_cycle());
        assert!(!widget.start_auto_cycle());
        assert_eq!(widget.pending_timers(), 1);

        widget.advance(2_999);
        assert_eq!(widget.phase(), Phase::Idle);
        widget.advance(1);
        assert_eq!(widget.phase(), Phase::Contracting);

        widget.advance(800);
        assert_eq!(widget.phase(), Phase::Idle);
        assert_eq!(widget.stage_index(), Some(1));
        assert!(widget.saved_record().is_some());

        widget.advance(3_000);
        assert_eq!(widget.stage_index(), Some(2));
    }

    #[test]
    fn stop_when_not_running_changes_nothing() {
        let mut widget = mount(4);
        let frames = widget.surface().frames().len();

        assert!(!widget.stop_auto_cycle());
        assert!(!widget.is_auto_cycling());
        assert_eq!(widget.pending_timers(), 0);
        assert_eq!(widget.surface().frames().len(), frames);
    }

    #[test]
    fn input_routes_to_actions() {
        let mut widget = mount(6);
        widget.handle_input(InputEvent::Click {
            target: crate::input::ClickTarget::AutoCycleControl,
        });
        assert!(widget.is_auto_cycling());

        widget.handle_input(InputEvent::Click {
            target: crate::input::ClickTarget::FullscreenControl,
        });
        assert!(widget.surface().is_fullscreen());

        widget.handle_input(InputEvent::Click {
            target: crate::input::ClickTarget::AdvanceControl,
        });
        assert_eq!(widget.phase(), Phase::Contracting);
        assert_eq!(widget.style().rotation, 90);
    }

    #[test]
    fn unmount_cancels_all_timers() {
        let mut widget = mount(2);
        widget.start_auto_cycle();
        widget.trigger(TransitionKind::Randomize);
        assert_eq!(widget.pending_timers(), 2);

        let detached = widget.unmount();
        assert!(detached.surface.frames().len() >= 3);
        assert!(detached.store.get("alchemyStyle").unwrap().is_none());
    }

    #[test]
    fn settle_waits_for_transition_only() {
        let mut widget = mount(12);
        widget.start_auto_cycle();
        widget.trigger(TransitionKind::AdvanceShape);
        widget.settle();

        assert_eq!(widget.now(), 800);
        assert_eq!(widget.phase(), Phase::Idle);
        assert_eq!(widget.shape(), ShapeKind::Square);
        assert!(widget.is_auto_cycling());
    }

    #[test]
    fn trigger_after_clock_reaches_its_end() {
        let mut widget = mount(14);
        widget.advance(u64::MAX);
        assert_eq!(widget.now(), u64::MAX);

        widget.trigger(TransitionKind::Randomize);
        assert_eq!(widget.phase(), Phase::Contracting);
        assert_eq!(widget.next_deadline(), Some(u64::MAX));

        widget.settle();
        assert_eq!(widget.phase(), Phase::Idle);
        assert_eq!(widget.stage_index(), Some(1));
        assert!(widget.saved_record().is_some());
    }

    #[test]
    fn auto_cycle_at_end_of_clock_fires_once() {
        let mut widget = mount(15);
        widget.advance(u64::MAX);
        assert!(widget.start_auto_cycle());

        widget.advance(1);
        assert_eq!(widget.phase(), Phase::Idle);
        assert_eq!(widget.stage_index(), Some(1));
        assert_eq!(widget.pending_timers(), 0);
    }
}
