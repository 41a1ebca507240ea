//! Input/output helpers.
//!
//! - derived-set CSV exports (`export`)
//! - snapshot JSON read/write (`snapshot`)

pub mod export;
pub mod snapshot;

pub use export::*;
pub use snapshot::*;
