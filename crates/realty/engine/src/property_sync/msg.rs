//! Messages understood by the property sync worker.

use realty_domain::property::PropertyCommand;

/// Messages consumed by the property sync worker.
#[derive(Debug)]
pub enum PropertySyncMsg {
    /// Apply a property command.
    Apply(PropertyCommand),
    /// Stop after every message queued before this one has been handled.
    Shutdown,
}
