//! Constants shared across the codec modules

pub mod constants;
