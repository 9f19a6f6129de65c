#![forbid(unsafe_code)]

//! Shared test sources for the procsift workspace.

mod counting;
mod faulty;

pub use counting::CountingSource;
pub use faulty::FaultySource;
