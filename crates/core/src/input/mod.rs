//! Translation of raw pointer input into widget actions.

use serde::{Deserialize, Serialize};

use crate::{config::GestureConfig, transition::TransitionKind};

/// Pointer or touch position at press or release time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerSample {
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl PointerSample {
    pub fn new(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self { x, y, timestamp_ms }
    }
}

/// Element a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClickTarget {
    /// Anywhere outside the widget's controls.
    Background,
    /// The shape's bounding region.
    Shape,
    /// Next-shape control, nested inside the shape region.
    AdvanceControl,
    /// Play/stop button of the auto-cycle.
    AutoCycleControl,
    FullscreenControl,
}

impl ClickTarget {
    /// The target followed by the elements a click on it bubbles through.
    pub fn bubble_path(self) -> &'static [ClickTarget] {
        match self {
            ClickTarget::Background => &[],
            ClickTarget::Shape => &[ClickTarget::Shape],
            ClickTarget::AdvanceControl => &[ClickTarget::AdvanceControl, ClickTarget::Shape],
            ClickTarget::AutoCycleControl => &[ClickTarget::AutoCycleControl],
            ClickTarget::FullscreenControl => &[ClickTarget::FullscreenControl],
        }
    }
}

/// Raw input delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    Press(PointerSample),
    Release(PointerSample),
    Click { target: ClickTarget },
}

/// What the widget should do in response to input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Trigger(TransitionKind),
    ToggleAutoCycle,
    ToggleFullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Propagation {
    Continue,
    Stop,
}

/// Swipe detection and click routing.
#[derive(Debug, Clone)]
pub struct InputAdapter {
    swipe_threshold: f32,
    press: Option<PointerSample>,
}

impl InputAdapter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            swipe_threshold: config.swipe_threshold,
            press: None,
        }
    }

    /// Returns the actions `event` maps to, in handler order.
    pub fn handle(&mut self, event: InputEvent) -> Vec<Action> {
        match event {
            InputEvent::Press(sample) => {
                self.press = Some(sample);
                Vec::new()
            }
            InputEvent::Release(sample) => self.release(sample).into_iter().collect(),
            InputEvent::Click { target } => Self::click(target),
        }
    }

    fn release(&mut self, sample: PointerSample) -> Option<Action> {
        let Some(press) = self.press.take() else {
            tracing::trace!("release without press");
            return None;
        };

        let dx = sample.x - press.x;
        if dx.abs() > self.swipe_threshold {
            tracing::debug!(
                dx,
                duration_ms = sample.timestamp_ms.saturating_sub(press.timestamp_ms),
                "swipe detected"
            );
            Some(Action::Trigger(TransitionKind::Randomize))
        } else {
            None
        }
    }

    fn click(target: ClickTarget) -> Vec<Action> {
        let mut actions = Vec::new();
        for element in target.bubble_path() {
            let (action, propagation) = match element {
                ClickTarget::Background => (None, Propagation::Continue),
                ClickTarget::Shape => (
                    Some(Action::Trigger(TransitionKind::Randomize)),
                    Propagation::Continue,
                ),
                ClickTarget::AdvanceControl => (
                    Some(Action::Trigger(TransitionKind::AdvanceShape)),
                    Propagation::Stop,
                ),
                ClickTarget::AutoCycleControl => {
                    (Some(Action::ToggleAutoCycle), Propagation::Continue)
                }
                ClickTarget::FullscreenControl => {
                    (Some(Action::ToggleFullscreen), Propagation::Continue)
                }
            };
            actions.extend(action);
            if propagation == Propagation::Stop {
                break;
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> InputAdapter {
        InputAdapter::new(GestureConfig::default())
    }

    fn swipe(adapter: &mut InputAdapter, from: f32, to: f32) -> Vec<Action> {
        adapter.handle(InputEvent::Press(PointerSample::new(from, 10.0, 0)));
        adapter.handle(InputEvent::Release(PointerSample::new(to, 12.0, 120)))
    }

    #[test]
    fn long_horizontal_swipes_randomize() {
        let mut adapter = adapter();
        let expected = vec![Action::Trigger(TransitionKind::Randomize)];
        assert_eq!(swipe(&mut adapter, 100.0, 151.0), expected);
        assert_eq!(swipe(&mut adapter, 300.0, 200.0), expected);
    }

    #[test]
    fn short_swipes_are_ignored() {
        let mut adapter = adapter();
        assert!(swipe(&mut adapter, 100.0, 150.0).is_empty());
        assert!(swipe(&mut adapter, 100.0, 70.0).is_empty());
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut adapter = adapter();
        let release = InputEvent::Release(PointerSample::new(500.0, 0.0, 0));
        assert!(adapter.handle(release).is_empty());

        swipe(&mut adapter, 0.0, 10.0);
        assert!(adapter.handle(release).is_empty());
    }

    #[test]
    fn advance_control_stops_propagation() {
        let mut adapter = adapter();
        let actions = adapter.handle(InputEvent::Click {
            target: ClickTarget::AdvanceControl,
        });
        assert_eq!(actions, vec![Action::Trigger(TransitionKind::AdvanceShape)]);
    }

    #[test]
    fn clicks_route_to_their_handlers() {
        let mut adapter = adapter();
        let click = |target| InputEvent::Click { target };

        assert_eq!(
            adapter.handle(click(ClickTarget::Shape)),
            vec![Action::Trigger(TransitionKind::Randomize)]
        );
        assert_eq!(
            adapter.handle(click(ClickTarget::AutoCycleControl)),
            vec![Action::ToggleAutoCycle]
        );
        assert_eq!(
            adapter.handle(click(ClickTarget::FullscreenControl)),
            vec![Action::ToggleFullscreen]
        );
        assert!(adapter.handle(click(ClickTarget::Background)).is_empty());
    }

    #[test]
    fn events_parse_from_json() {
        let event: InputEvent =
            serde_json::from_str(r#"{ "type": "click", "target": "advanceControl" }"#).unwrap();
        assert_eq!(
            event,
            InputEvent::Click {
                target: ClickTarget::AdvanceControl
            }
        );

        let event: InputEvent =
            serde_json::from_str(r#"{ "type": "press", "x": 12.5, "timestampMs": 40 }"#).unwrap();
        assert_eq!(event, InputEvent::Press(PointerSample::new(12.5, 0.0, 40)));
    }
}
