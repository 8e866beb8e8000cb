//! Core library for the Alchemy Shapes widget.
//!
//! A single decorative shape that shrinks, swaps and springs back into a new
//! form on click, swipe or a repeating timer, remembering the last style it
//! showed. Each module owns one piece: style generation, the transition state
//! machine, the auto-cycle timer, input translation, persistence and the
//! render surface contract. [`Widget`] wires them together and is the only
//! owner of mutable state.

pub mod autocycle;
pub mod config;
pub mod error;
pub mod input;
pub mod persist;
pub mod render;
pub mod shape;
pub mod style;
pub mod timeline;
pub mod transition;
pub mod widget;

pub use autocycle::{AutoCycle, AutoCycleTick};
pub use config::{GestureConfig, PaletteConfig, TimingConfig, WidgetConfig};
pub use error::{AlchemyError, Result};
pub use input::{Action, ClickTarget, InputAdapter, InputEvent, PointerSample};
pub use persist::{FileStore, KeyValueStore, MemoryStore, PersistedRecord, StylePersistence};
pub use render::{render_svg, Easing, Frame, Motion, RecordingSurface, Surface, SvgSurface};
pub use shape::ShapeKind;
pub use style::{generate, BorderPattern, Color, ColorSource, Palette, Stage, StageCycle, VisualStyle};
pub use timeline::{TimerId, TimerQueue};
pub use transition::{Phase, TransitionKind, TransitionMachine, TransitionState};
pub use widget::{Detached, Widget, WidgetEvent};
