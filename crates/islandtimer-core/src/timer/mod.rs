mod controller;
mod effects;
mod scheduler;
pub mod snapshot;
mod stopwatch;

pub use controller::{TimerController, TimerState, DEFAULT_TICK_INTERVAL};
pub use effects::{DeviceEffects, NoEffects, RecordingEffects};
pub use scheduler::{IntervalScheduler, ManualScheduler, TickScheduler};
pub use snapshot::TimerSnapshot;
pub use stopwatch::{Stopwatch, StopwatchState, STOPWATCH_TICK};
