//! AAC decoder adapter.
//!
//! Owns one decoder engine and exposes decode, concealment and duration
//! queries over caller-owned buffers. All sample counts are per channel;
//! the interleaved output holds `count * channels` values.

use super::assembler::FrameAssembler;
use super::concealment::ConcealmentEngine;
use super::duration;
use super::engine::{ConfigStep, DecoderEngine, DecoderParam, EngineError};
use super::red::RedPacket;
use super::state::AdapterState;
use super::stream_info::{StreamInfo, StreamInfoCache};
use super::types::TransportType;
use crate::common::constants::aac::CONCEAL_METHOD_ENERGY_INTERPOLATION;
use crate::common::constants::logging::DECODER_LOG_INTERVAL;
use crate::error::{CodecError, Result};
use logging::{LogLevel, Logger};

pub struct AacDecoder<E: DecoderEngine> {
    engine: E,
    transport: TransportType,
    stream_info: StreamInfoCache,
    /// Samples per channel of the last decoded or concealed frame
    prior_samples: Option<usize>,
    state: AdapterState,
    logger: Logger,
    frame_count: u64,
    concealed_count: u64,
}

impl<E: DecoderEngine> AacDecoder<E> {
    /// Opens `engine` for `transport` and selects energy-interpolation
    /// concealment.
    ///
    /// Everything else (sample rate, channels, frame size) is learned from
    /// the bitstream on the first decoded frame.
    pub fn open(mut engine: E, transport: TransportType, logger: Logger) -> Result<Self> {
        logger.info(&format!("Initializing AAC decoder: transport={}", transport));

        if let Err(source) = engine.open(transport) {
            logger.error(&format!("Failed to open decoder for {}: {}", transport, source));
            return Err(CodecError::EngineInit {
                step: ConfigStep::Transport,
                source,
            });
        }

        if let Err(source) = engine.set_param(
            DecoderParam::ConcealMethod,
            CONCEAL_METHOD_ENERGY_INTERPOLATION,
        ) {
            logger.error(&format!("Decoder rejected concealment method: {}", source));
            engine.close();
            return Err(CodecError::EngineInit {
                step: ConfigStep::ConcealMethod,
                source,
            });
        }

        logger.info("AAC decoder initialized successfully");

        Ok(Self {
            engine,
            transport,
            stream_info: StreamInfoCache::new(),
            prior_samples: None,
            state: AdapterState::Ready,
            logger,
            frame_count: 0,
            concealed_count: 0,
        })
    }

    /// Decodes every frame of `packet` that fits into `output`.
    ///
    /// Returns samples per channel written. Zero is a valid result: the
    /// packet held no complete frame and the engine keeps the partial data
    /// for the next call.
    ///
    /// # Errors
    ///
    /// * `CodecError::BufferOverflow` - `output` cannot hold one frame.
    ///   Once the frame geometry is known the check happens before the
    ///   packet is fed, so the same packet can be retried. On the first
    ///   frame the geometry is not known yet: the packet stays buffered in
    ///   the engine and the retry must pass an empty packet
    /// * `CodecError::Decode` - the engine refused the bitstream; output
    ///   written by this call is zeroed
    /// * `CodecError::EngineFatal` - the engine is gone; reopen
    pub fn decode(&mut self, packet: &[u8], output: &mut [i16]) -> Result<usize> {
        self.state.ensure_usable()?;

        let result =
            FrameAssembler::new(&mut self.engine, &mut self.stream_info).assemble(packet, output);
        let assembled = match result {
            Ok(assembled) => assembled,
            Err(err) => return Err(self.fail("Decode", err)),
        };

        if assembled.discovered_stream {
            if let Some(info) = self.stream_info.get() {
                self.logger.info(&format!(
                    "Decoder stream: frame_size={} ({:.1} ms), channels={}, rate={}, delay={}",
                    info.frame_size,
                    info.frame_duration_ms(),
                    info.channels,
                    info.sample_rate,
                    info.delay
                ));
            }
        }

        if assembled.frames > 0 {
            self.prior_samples = Some(assembled.frame_size);
            self.state.activate();
            self.log_frames(assembled.frames as u64, packet.len());
        } else if self.logger.enabled(LogLevel::Trace) {
            self.logger.trace(&format!(
                "Packet of {} bytes held no complete frame",
                packet.len()
            ));
        }

        Ok(assembled.samples_per_channel)
    }

    /// Synthesizes audio for `lost_frames` missing frames.
    ///
    /// Needs a previous successful decode. Returns samples per channel
    /// written; when the engine fails partway the samples produced so far
    /// are returned.
    pub fn conceal(&mut self, lost_frames: usize, output: &mut [i16]) -> Result<usize> {
        self.state.ensure_usable()?;

        let result = ConcealmentEngine::new(&mut self.engine, &self.stream_info).conceal(
            self.prior_samples,
            lost_frames,
            output,
        );
        let concealed = match result {
            Ok(concealed) => concealed,
            Err(err) => return Err(self.fail("Concealment", err)),
        };

        if concealed.frames > 0 {
            self.prior_samples = Some(concealed.frame_size);
            self.concealed_count += concealed.frames as u64;
            self.state.activate();
        }

        if concealed.is_partial() {
            self.logger.warn(&format!(
                "Concealment degraded: {} of {} lost frames synthesized",
                concealed.frames, lost_frames
            ));
            if let Some(EngineError::Fatal(code)) = concealed.fault {
                self.logger
                    .error(&format!("Fatal decoder error 0x{:04x}, handle unusable", code));
                self.state = AdapterState::Error(code);
            }
        } else if self.logger.enabled(LogLevel::Trace) {
            self.logger.trace(&format!(
                "Concealed {} frames ({} samples)",
                concealed.frames, concealed.samples_per_channel
            ));
        }

        Ok(concealed.samples_per_channel)
    }

    /// Decodes the most recent redundant copy carried by a redundancy
    /// packet, or the packet itself if it carries none.
    pub fn decode_redundant(&mut self, packet: &[u8], output: &mut [i16]) -> Result<usize> {
        if duration::packet_has_fec(packet) {
            if let Some(block) = RedPacket::parse(packet).and_then(|red| red.latest_redundant()) {
                return self.decode(block.data, output);
            }
        }
        self.decode(packet, output)
    }

    /// Samples per channel in `packet`, if the transport reveals it
    /// without decoding. Framings without per-frame lengths always give
    /// `None`.
    pub fn packet_duration(&self, packet: &[u8]) -> Result<Option<usize>> {
        self.state.ensure_usable()?;
        if !self.transport.is_self_delimiting() {
            return Ok(None);
        }
        Ok(duration::estimate_packet_duration(&self.engine, packet))
    }

    /// Like [`AacDecoder::packet_duration`], but for the redundant copy of a
    /// redundancy packet.
    pub fn packet_duration_redundant(&self, packet: &[u8]) -> Result<Option<usize>> {
        if duration::packet_has_fec(packet) {
            self.state.ensure_usable()?;
            return Ok(duration::estimate_fec_duration(packet));
        }
        self.packet_duration(packet)
    }

    /// Drops bitstream data the engine holds but has not decoded yet, as
    /// after a stream discontinuity.
    ///
    /// Stream facts and the prior frame size survive, so concealment keeps
    /// working across the reset.
    pub fn reset(&mut self) -> Result<()> {
        self.state.ensure_usable()?;
        self.engine.reset();
        self.logger.debug(&format!(
            "AAC decoder reset after {} frames",
            self.frame_count
        ));
        Ok(())
    }

    /// Releases the engine. A second call is a usage error.
    pub fn close(&mut self) -> Result<()> {
        if self.state.is_closed() {
            return Err(CodecError::Closed);
        }
        self.engine.close();
        self.state = AdapterState::Closed;
        self.stream_info.invalidate();
        self.prior_samples = None;
        self.logger.info(&format!(
            "AAC decoder closed. Frames decoded: {}, concealed: {}",
            self.frame_count, self.concealed_count
        ));
        Ok(())
    }

    /// Channel count, once a frame has been decoded.
    pub fn channels(&self) -> Option<u32> {
        self.stream_info.get().map(|info| info.channels)
    }

    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.stream_info.get()
    }

    pub fn prior_samples(&self) -> Option<usize> {
        self.prior_samples
    }

    pub fn transport(&self) -> TransportType {
        self.transport
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    /// Records a fatal engine fault before handing the error back.
    fn fail(&mut self, operation: &str, err: CodecError) -> CodecError {
        match &err {
            CodecError::EngineFatal(code) => {
                self.logger.error(&format!(
                    "{} hit fatal decoder error 0x{:04x}, handle unusable",
                    operation, code
                ));
                self.state = AdapterState::Error(*code);
            }
            other => self.logger.debug(&format!("{} failed: {}", operation, other)),
        }
        err
    }

    fn log_frames(&mut self, frames: u64, packet_len: usize) {
        for _ in 0..frames {
            self.frame_count += 1;
            if self.frame_count.is_multiple_of(DECODER_LOG_INTERVAL) {
                self.logger.debug(&format!(
                    "Decoded audio frame #{}, concealed so far: {}",
                    self.frame_count, self.concealed_count
                ));
            }
        }
        if self.logger.enabled(LogLevel::Trace) {
            self.logger.trace(&format!(
                "Decoded {} frame(s) from {} bytes",
                frames, packet_len
            ));
        }
    }
}

impl<E: DecoderEngine> Drop for AacDecoder<E> {
    fn drop(&mut self) {
        if !self.state.is_closed() {
            self.engine.close();
            self.logger.info(&format!(
                "AAC decoder stopped. Total frames decoded: {}",
                self.frame_count
            ));
        }
    }
}
