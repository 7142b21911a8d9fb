pub mod flow;

pub use flow::FlowCounter;

/// Flow Count Window (seconds)
///
/// For computing real-time flow rate.
pub const FLOW_COUNT_REALTIME_WINDOW: i64 = 30;
