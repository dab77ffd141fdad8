pub mod random;
pub mod shutdown;
pub mod types;

pub use types::*;
