//! Temporally Consistent Ambiguous Frame Filter (TCAFF): turns a per-tick
//! stream of ambiguous SE(2) candidate transforms from registration into at
//! most one stable estimate per neighbor, explicit about "unknown" rather
//! than ever guessing.

pub mod config;
pub mod manager;
pub mod tree;

pub use config::{ConfigError, TcaffConfig};
pub use manager::{TcaffManager, TreeState};
