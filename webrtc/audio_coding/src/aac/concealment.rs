//! Packet-loss concealment loop.

use super::engine::{DecoderEngine, EngineError};
use super::stream_info::StreamInfoCache;
use crate::error::{CodecError, Result};

/// Outcome of a concealment request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Concealed {
    /// Samples per channel written
    pub samples_per_channel: usize,
    pub frames: usize,
    /// Samples per channel of the last synthesized frame
    pub frame_size: usize,
    /// Engine failure that cut the loop short after at least one frame
    pub fault: Option<EngineError>,
}

impl Concealed {
    pub fn is_partial(&self) -> bool {
        self.fault.is_some()
    }
}

/// Synthesizes frames for lost packets into a caller buffer.
pub struct ConcealmentEngine<'a, E: DecoderEngine> {
    engine: &'a mut E,
    stream_info: &'a StreamInfoCache,
}

impl<'a, E: DecoderEngine> ConcealmentEngine<'a, E> {
    pub fn new(engine: &'a mut E, stream_info: &'a StreamInfoCache) -> Self {
        Self {
            engine,
            stream_info,
        }
    }

    /// Produces `lost_frames * prior_samples` samples per channel, clamped
    /// to what `output` holds.
    ///
    /// `prior_samples` is the per-channel sample count of the last decoded
    /// or concealed frame; without it, or without stream facts, there is
    /// nothing to extrapolate from.
    ///
    /// Best effort: a failure after the first frame ends the loop and the
    /// samples produced so far are returned with [`Concealed::fault`] set.
    /// Only a failure of the first frame is an error.
    pub fn conceal(
        &mut self,
        prior_samples: Option<usize>,
        lost_frames: usize,
        output: &mut [i16],
    ) -> Result<Concealed> {
        let Some(info) = self.stream_info.get() else {
            return Err(CodecError::State(
                "concealment requested before any successful decode".to_string(),
            ));
        };
        let Some(prior) = prior_samples else {
            return Err(CodecError::State(
                "no previous frame to conceal from".to_string(),
            ));
        };

        let channels = (info.channels as usize).max(1);
        let capacity = output.len() / channels;
        let target = lost_frames.saturating_mul(prior).min(capacity);

        let mut result = Concealed::default();
        while result.samples_per_channel < target {
            // Re-read every iteration; the geometry is fixed per handle today.
            let frame_size = self.stream_info.get().map_or(0, |i| i.frame_size);
            if frame_size == 0 {
                break;
            }

            let wanted = (target - result.samples_per_channel).min(frame_size);
            let offset = result.samples_per_channel * channels;
            let status = if wanted == frame_size {
                self.engine
                    .conceal_frame(&mut output[offset..offset + frame_size * channels])
            } else {
                // Tail shorter than a frame: synthesize the whole frame aside
                // and keep only what was asked for.
                let mut scratch = vec![0i16; frame_size * channels];
                self.engine.conceal_frame(&mut scratch).map(|()| {
                    output[offset..offset + wanted * channels]
                        .copy_from_slice(&scratch[..wanted * channels]);
                })
            };

            match status {
                Ok(()) => {
                    result.samples_per_channel += wanted;
                    result.frames += 1;
                    result.frame_size = frame_size;
                }
                Err(err) if result.frames == 0 => {
                    return Err(match err {
                        EngineError::Fatal(code) => CodecError::EngineFatal(code),
                        other => CodecError::Conceal(other),
                    });
                }
                Err(err) => {
                    result.fault = Some(err);
                    break;
                }
            }
        }

        Ok(result)
    }
}
