//! # IslandTimer Core Library
//!
//! Countdown state shared between three isolated actors: the foreground
//! controller, a home-screen widget and an ambient (lock-screen) activity.
//! The only channel between them is a flat key-value namespace that
//! survives process death.
//!
//! ## Architecture
//!
//! - **Timer Controller**: a tick-driven state machine and the single writer
//!   of shared state. Scheduler, clock, store and device effects are all
//!   injected capabilities.
//! - **Shared State**: [`SharedStatePort`] over a [`KeyValueStore`]
//!   (in-memory or a SQLite file shared across processes), with read-side
//!   validation that clears torn or invalid data.
//! - **Staleness Validator**: decides at launch whether a persisted snapshot
//!   is resumed, surfaced as paused, or discarded.
//! - **Observers**: widget timelines with forward projection, and the
//!   ambient activity manager.
//! - **Presets**: built-in and custom presets with a versioned TOML schema.
//!
//! ## Key Components
//!
//! - [`TimerController`]: Primary controller state machine
//! - [`SharedState`]: Shared store adapter
//! - [`StalenessValidator`]: Startup recovery
//! - [`WidgetProvider`] / [`AmbientActivity`]: Observers
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod observer;
pub mod preset;
pub mod storage;
pub mod timer;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, PresetError, StoreError, ValidationError};
pub use events::Event;
pub use observer::{Activation, AmbientActivity, Timeline, WidgetEntry, WidgetProvider};
pub use preset::{find_preset, ColorTag, Preset, PresetStore};
pub use storage::{Config, KeyValueStore, MemoryStore, SharedState, SharedStatePort, SqliteStore};
pub use timer::{
    DeviceEffects, IntervalScheduler, Stopwatch, TickScheduler, TimerController, TimerSnapshot,
    TimerState,
};
pub use validator::{ClearReason, Recovery, StalenessValidator};
