//! Event type names written by the CLI.

pub const DECISION_COMPUTED: &str = "DECISION_COMPUTED";
pub const CHAMPION_PROMOTED: &str = "CHAMPION_PROMOTED";
pub const CHALLENGER_REJECTED: &str = "CHALLENGER_REJECTED";
pub const REGISTRY_WRITE_FAILED: &str = "REGISTRY_WRITE_FAILED";
pub const ALIAS_SET: &str = "ALIAS_SET";
pub const VERSION_REGISTERED: &str = "VERSION_REGISTERED";
