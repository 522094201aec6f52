pub mod model;

pub use model::{COINBASE_SENDER, Transaction};
