//! Targeting algorithms. Pure functions over [`SpatialQueries`]; no systems live here.
//!
//! - [`chain`]: bolt + ricochet + nearest-enemy hops with damage falloff
//! - [`pierce`]: depth-ordered piercing ray with a pierce budget
//! - [`leap`]: ballistic leap solve and lead prediction
//! - [`bands`]: ranged retreat / hold / advance bands
//!
//! [`SpatialQueries`]: crate::plugins::spatial::SpatialQueries

pub mod bands;
pub mod chain;
pub mod leap;
pub mod pierce;

pub use bands::{BandMove, OptimalBandPolicy, PositioningBands};
pub use chain::{resolve_chain, ChainOutcome, ChainSpec, ChainStrike};
pub use leap::{LeadProfile, LeapPlan, LeapSolver};
pub use pierce::{resolve_pierce, PierceOutcome};

#[cfg(test)]
mod tests;
