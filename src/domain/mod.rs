//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and normalized input rows (`PriceRow`, `PricePoint`)
//! - derived record sets (`FineRecord`, `SubRollup`, `MainRollup`)
//! - selection enums (`Level`, `ValueMode`) and the data `Source`

pub mod types;

pub use types::*;
