//! Passive observers of the shared store. They never write timer state.

pub mod ambient;
pub mod widget;

pub use ambient::{
    ActivityAttributes, ActivityContent, ActivityError, ActivityHost, ActivityId, AmbientActivity,
};
pub use widget::{Timeline, WidgetEntry, WidgetProvider};

/// Why an observer is being asked to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// System-scheduled refresh (the poll).
    Scheduled,
    /// Host asked for a one-off snapshot.
    SnapshotRequest,
    /// Push hint that the controller wrote something.
    Invalidated,
}
