//! Lifecycle of an adapter handle.
//!
//! `Uninitialized` and `Configuring` live only inside `open`; a caller only
//! ever holds an adapter in one of the states below.

use crate::error::{CodecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Configured, nothing processed yet
    Ready,
    /// At least one encode or decode call went through
    Active,
    /// The engine reported an unrecoverable fault
    Error(i32),
    Closed,
}

impl AdapterState {
    /// Fails without touching the engine if the handle cannot be used.
    pub fn ensure_usable(self) -> Result<()> {
        match self {
            AdapterState::Ready | AdapterState::Active => Ok(()),
            AdapterState::Error(code) => Err(CodecError::EngineFatal(code)),
            AdapterState::Closed => Err(CodecError::Closed),
        }
    }

    /// Moves Ready to Active; other states are left alone.
    pub fn activate(&mut self) {
        if *self == AdapterState::Ready {
            *self = AdapterState::Active;
        }
    }

    pub fn is_closed(self) -> bool {
        self == AdapterState::Closed
    }
}
