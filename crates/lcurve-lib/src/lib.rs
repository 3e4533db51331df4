pub mod config;
pub mod error;
pub mod io;
pub mod plot;
pub mod precision;
pub mod sample;
pub mod signal;
pub mod stack;

pub use error::*;
pub use sample::*;
pub use signal::*;
pub use stack::*;
