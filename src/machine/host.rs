//! The seam between this core and the host execution engine.

/// Outcome of handing work to the host scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// The work completed synchronously; draining may continue.
    Idle,
    /// The host scheduler has outstanding asynchronous work. Draining halts
    /// until the host raises the next closure callback.
    Busy,
}

/// The generic activity engine this core runs on top of.
///
/// The executor never stores a host reference - one is passed into each
/// entry point - so the persisted execution state stays free of
/// non-serializable resources across suspension points.
///
/// Cancellation is wholly host-owned: an abandoned instance simply stops
/// receiving callbacks, and its queue and flags persist coherently.
pub trait HostEngine {
    /// Close the named currently-open state.
    ///
    /// Return [`SchedulerStatus::Busy`] if closing scheduled asynchronous
    /// work (e.g. running activities still unwinding); the executor will
    /// resume on the next closure callback.
    fn close_state(&mut self, state: &str) -> SchedulerStatus;

    /// Begin executing the named child state's activities under the named
    /// parent.
    ///
    /// Return [`SchedulerStatus::Busy`] if execution was scheduled rather
    /// than completed inline.
    fn execute_child(&mut self, parent: &str, child: &str) -> SchedulerStatus;
}
