pub mod registry;

pub use registry::{StakeRegistry, roulette};
