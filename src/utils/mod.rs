// Shared utilities

pub mod constants;
pub mod storage;
pub mod validation;
pub mod clock;

pub use constants::*;
pub use storage::*;
pub use validation::*;
pub use clock::*;
