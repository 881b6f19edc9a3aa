/// Target for structured allocation/rollback events. Filter on it to get a
/// clean event stream separate from the operational log.
pub const ANALYTICS_TARGET: &str = "smart_parking::analytics";
