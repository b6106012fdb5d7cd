//! Audio codec traits for encoding and decoding
//!
//! Object-safe counterparts of the AAC adapters for pipelines that pass
//! owned frames around instead of caller buffers.

use super::frame::AudioFrame;
use crate::aac::decoder::AacDecoder;
use crate::aac::encoder::AacEncoder;
use crate::aac::engine::{DecoderEngine, EncoderEngine};
use crate::common::constants::aac::MAX_DECODE_BUFFER_SAMPLES;
use crate::error::{CodecError, Result};

/// Trait for audio encoders
pub trait AudioEncoder {
    /// Encodes one frame of PCM.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - Encoded bytes, empty while the encoder is still
    ///   buffering input
    /// * `Err` - If the frame does not match the encoder or encoding fails
    fn encode_frame(&mut self, frame: &AudioFrame) -> Result<Vec<u8>>;

    /// Drains buffered input.
    fn flush_frames(&mut self) -> Result<Vec<u8>>;

    /// Codec name, e.g. for SDP negotiation.
    fn get_codec(&self) -> &str;

    /// Target bitrate in bits per second.
    fn get_bitrate(&self) -> u32 {
        0
    }
}

/// Trait for audio decoders
pub trait AudioDecoder {
    /// Decodes one packet.
    ///
    /// # Returns
    /// * `Ok(Some(frame))` - Decoded audio
    /// * `Ok(None)` - The packet did not complete a frame yet
    /// * `Err` - If decoding fails
    fn decode_packet(&mut self, data: &[u8]) -> Result<Option<AudioFrame>>;

    /// Synthesizes audio for `lost_frames` missing packets.
    fn conceal_loss(&mut self, lost_frames: usize) -> Result<AudioFrame>;

    /// Samples per channel in `data`, when known without decoding.
    fn packet_duration(&self, data: &[u8]) -> Result<Option<usize>>;

    fn get_codec(&self) -> &str;

    /// Channel count, once known.
    fn channels(&self) -> Option<u32>;
}

impl<E: EncoderEngine> AacEncoder<E> {
    fn encode_owned(&mut self, samples: &[i16], samples_per_channel: usize) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut chunk = vec![0u8; self.max_output_bytes()];
        // Hand the engine one frame at a time so a single output buffer of
        // max_output_bytes always suffices.
        let frame_samples = self.frame_size() * self.config().channels as usize;
        if samples_per_channel == 0 || frame_samples == 0 {
            let written = self.flush(&mut chunk)?;
            output.extend_from_slice(&chunk[..written]);
            return Ok(output);
        }

        let total = samples_per_channel * self.config().channels as usize;
        let samples = samples.get(..total).ok_or_else(|| {
            CodecError::InvalidInput(format!(
                "frame holds {} samples, {} announced",
                samples.len(),
                total
            ))
        })?;
        for piece in samples.chunks(frame_samples) {
            let per_channel = piece.len() / self.config().channels as usize;
            let written = self.encode(piece, per_channel, &mut chunk)?;
            output.extend_from_slice(&chunk[..written]);
        }
        Ok(output)
    }
}

impl<E: EncoderEngine> AudioEncoder for AacEncoder<E> {
    fn encode_frame(&mut self, frame: &AudioFrame) -> Result<Vec<u8>> {
        let config = self.config();
        if frame.channels != config.channels {
            return Err(CodecError::InvalidInput(format!(
                "Channel mismatch: encoder expects {}, got {}",
                config.channels, frame.channels
            )));
        }
        if frame.sample_rate != config.sample_rate {
            return Err(CodecError::InvalidInput(format!(
                "Sample rate mismatch: encoder expects {}, got {}",
                config.sample_rate, frame.sample_rate
            )));
        }
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        self.encode_owned(&frame.samples, frame.frame_count())
    }

    fn flush_frames(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        loop {
            let drained = self.encode_owned(&[], 0)?;
            if drained.is_empty() {
                return Ok(output);
            }
            output.extend_from_slice(&drained);
        }
    }

    fn get_codec(&self) -> &str {
        self.config().object_type.name()
    }

    fn get_bitrate(&self) -> u32 {
        self.config().bitrate
    }
}

impl<E: DecoderEngine> AudioDecoder for AacDecoder<E> {
    fn decode_packet(&mut self, data: &[u8]) -> Result<Option<AudioFrame>> {
        let mut output = vec![0i16; MAX_DECODE_BUFFER_SAMPLES];
        let samples = self.decode(data, &mut output)?;
        if samples == 0 {
            return Ok(None);
        }
        let (channels, sample_rate) = self
            .stream_info()
            .map(|info| (info.channels, info.sample_rate))
            .unwrap_or((1, 0));
        output.truncate(samples * channels as usize);
        Ok(Some(AudioFrame::new(output, channels, sample_rate)))
    }

    fn conceal_loss(&mut self, lost_frames: usize) -> Result<AudioFrame> {
        let mut output = vec![0i16; MAX_DECODE_BUFFER_SAMPLES];
        let samples = self.conceal(lost_frames, &mut output)?;
        let (channels, sample_rate) = self
            .stream_info()
            .map(|info| (info.channels, info.sample_rate))
            .unwrap_or((1, 0));
        output.truncate(samples * channels as usize);
        Ok(AudioFrame::concealed(output, channels, sample_rate))
    }

    fn packet_duration(&self, data: &[u8]) -> Result<Option<usize>> {
        AacDecoder::packet_duration(self, data)
    }

    fn get_codec(&self) -> &str {
        "AAC"
    }

    fn channels(&self) -> Option<u32> {
        AacDecoder::channels(self)
    }
}
