//! Seeded value generation for the six distributions a model variable can
//! declare, plus parameter introspection for diagnostics.

#![deny(missing_docs)]

mod error;
mod generator;
mod info;

pub use error::{DistributionError, Result};
pub use generator::DistributionGenerator;
pub use info::{all_distribution_info, distribution_info, DistributionInfo};
