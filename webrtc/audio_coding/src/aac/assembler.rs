//! Decode loop that drains a multi-frame packet into a caller buffer.

use super::engine::{DecoderEngine, EngineError};
use super::stream_info::StreamInfoCache;
use crate::error::{CodecError, Result};

/// Outcome of one [`FrameAssembler::assemble`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Assembled {
    /// Samples per channel written across all frames
    pub samples_per_channel: usize,
    pub frames: usize,
    /// Samples per channel of the last frame, 0 if none was decoded
    pub frame_size: usize,
    /// True if this call reported the stream facts for the first time
    pub discovered_stream: bool,
}

/// Feeds one packet to a decoder engine and collects every frame it yields.
///
/// Capacity is checked before each decode call once the frame geometry is
/// known; before that the engine itself refuses to decode into a slice that
/// is too small. Either way nothing is written past `output.len()`.
pub struct FrameAssembler<'a, E: DecoderEngine> {
    engine: &'a mut E,
    stream_info: &'a mut StreamInfoCache,
}

impl<'a, E: DecoderEngine> FrameAssembler<'a, E> {
    pub fn new(engine: &'a mut E, stream_info: &'a mut StreamInfoCache) -> Self {
        Self {
            engine,
            stream_info,
        }
    }

    /// Decodes as many whole frames of `packet` as fit in `output`.
    ///
    /// Returns zero frames, not an error, when the engine needs more data
    /// than it has buffered; the rest of the frame can come with the next
    /// packet. Bytes the engine did not take stay unfed and the loop ends
    /// when no progress is possible.
    pub fn assemble(&mut self, packet: &[u8], output: &mut [i16]) -> Result<Assembled> {
        let mut cursor = 0;
        let mut written = 0;
        let mut result = Assembled::default();

        // Refuse before feeding so a retry with a larger buffer sees the same packet.
        if let Some(info) = self.stream_info.get() {
            let required = info.samples_per_frame();
            if required > output.len() {
                return Err(CodecError::BufferOverflow {
                    required: Some(required),
                    available: output.len(),
                });
            }
        }

        loop {
            let remaining = &packet[cursor..];
            let mut fed = 0;
            if !remaining.is_empty() {
                let valid = self
                    .engine
                    .fill(remaining)
                    .map_err(|e| Self::discard(output, written, e))?;
                fed = remaining.len().saturating_sub(valid);
                cursor += fed;
            }

            let available = output.len() - written;
            if let Some(info) = self.stream_info.get() {
                let required = info.samples_per_frame();
                if required > available {
                    if result.frames == 0 {
                        return Err(CodecError::BufferOverflow {
                            required: Some(required),
                            available,
                        });
                    }
                    break;
                }
            }

            match self.engine.decode_frame(&mut output[written..]) {
                Ok(()) => {}
                Err(EngineError::NotEnoughBits) => {
                    if fed > 0 && cursor < packet.len() {
                        continue;
                    }
                    break;
                }
                Err(EngineError::OutputTooSmall) => {
                    if result.frames == 0 {
                        return Err(CodecError::BufferOverflow {
                            required: None,
                            available,
                        });
                    }
                    break;
                }
                Err(e) => return Err(Self::discard(output, written, e)),
            }

            let info = match self.engine.stream_info().filter(|info| info.is_valid()) {
                Some(info) => info,
                None => {
                    output[..written].fill(0);
                    return Err(CodecError::EngineFatal(0));
                }
            };
            let frame_samples = info.samples_per_frame();
            if frame_samples > available {
                // The engine claims to have written past the slice it was given.
                output[..written].fill(0);
                return Err(CodecError::EngineFatal(0));
            }

            let frame_size = info.frame_size;
            if self.stream_info.record(info) {
                result.discovered_stream = true;
            }

            written += frame_samples;
            result.frames += 1;
            result.samples_per_channel += frame_size;
            result.frame_size = frame_size;
        }

        Ok(result)
    }

    /// Maps a hard failure and drops whatever this call already wrote.
    fn discard(output: &mut [i16], written: usize, err: EngineError) -> CodecError {
        output[..written].fill(0);
        match err {
            EngineError::Fatal(code) => CodecError::EngineFatal(code),
            other => CodecError::Decode(other),
        }
    }
}
