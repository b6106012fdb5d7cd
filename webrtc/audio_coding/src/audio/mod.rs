//! Pipeline-facing audio types
//!
//! Owned frames and the codec traits the rest of a media pipeline talks to.

pub mod frame;
pub mod traits;

pub use frame::{AudioFrame, AudioSample};
pub use traits::{AudioDecoder, AudioEncoder};
