//! AAC encoder adapter.
//!
//! Brings an encoder engine online with the fixed parameter sequence of an
//! [`EncoderConfig`] and turns it into an encode call over caller buffers.

use super::config::EncoderConfig;
use super::engine::{ConfigStep, EncoderEngine, EncoderInfo, EncoderParam, EngineError};
use super::state::AdapterState;
use super::stream_info::{StreamInfo, StreamInfoCache};
use crate::common::constants::logging::ENCODER_LOG_INTERVAL;
use crate::error::{CodecError, Result};
use logging::{LogLevel, Logger};

/// Encoder adapter owning one engine instance.
///
/// A value of this type always holds a fully configured engine; if any
/// configuration step fails, [`AacEncoder::open`] releases the engine and
/// no adapter exists.
pub struct AacEncoder<E: EncoderEngine> {
    engine: E,
    config: EncoderConfig,
    stream_info: StreamInfoCache,
    max_output_bytes: usize,
    state: AdapterState,
    logger: Logger,
    frame_count: u64,
    bytes_out: u64,
}

impl<E: EncoderEngine> AacEncoder<E> {
    /// Opens and configures `engine`.
    ///
    /// # Errors
    ///
    /// * `CodecError::Config` - `config` holds values no engine accepts
    /// * `CodecError::EngineInit` - the engine refused a step; the error
    ///   names it and the engine has been closed again
    pub fn open(mut engine: E, config: EncoderConfig, logger: Logger) -> Result<Self> {
        logger.info(&format!(
            "Initializing {} encoder: sample_rate={}, channels={}, bitrate={}, transport={}",
            config.object_type,
            config.sample_rate,
            config.channels,
            config.bitrate,
            config.transport
        ));

        config.validate()?;

        if let Err(source) = engine.open() {
            logger.error(&format!("Failed to allocate encoder: {}", source));
            return Err(CodecError::EngineInit {
                step: ConfigStep::Allocate,
                source,
            });
        }

        let info = match Self::configure(&mut engine, &config, &logger) {
            Ok(info) => info,
            Err((step, source)) => {
                logger.error(&format!("Encoder configuration failed at {}: {}", step, source));
                engine.close();
                return Err(CodecError::EngineInit { step, source });
            }
        };

        let mut stream_info = StreamInfoCache::new();
        stream_info.record(StreamInfo {
            frame_size: info.frame_length,
            channels: info.input_channels,
            sample_rate: config.sample_rate,
            delay: info.encoder_delay,
            config_header: info.config_header,
        });

        logger.info(&format!(
            "{} encoder ready: frame_length={}, max_output_bytes={}, delay={}, config={}",
            config.object_type,
            info.frame_length,
            info.max_output_bytes,
            info.encoder_delay,
            stream_info.get().map(StreamInfo::config_hex).unwrap_or_default()
        ));

        Ok(Self {
            engine,
            config,
            stream_info,
            max_output_bytes: info.max_output_bytes,
            state: AdapterState::Ready,
            logger,
            frame_count: 0,
            bytes_out: 0,
        })
    }

    /// Applies every parameter in order, then probes. Stops at the first
    /// refusal and reports which step it was.
    fn configure(
        engine: &mut E,
        config: &EncoderConfig,
        logger: &Logger,
    ) -> std::result::Result<EncoderInfo, (ConfigStep, EngineError)> {
        for (param, value) in config.parameter_sequence() {
            engine
                .set_param(param, value)
                .map_err(|e| (ConfigStep::Param(param), e))?;
            logger.debug(&format!("Encoder parameter set: {}={}", param, value));
        }

        let info = engine.probe().map_err(|e| (ConfigStep::Probe, e))?;
        if info.frame_length == 0 || info.input_channels == 0 {
            return Err((ConfigStep::Probe, EngineError::Unsupported));
        }
        Ok(info)
    }

    /// Encodes `samples_per_channel` interleaved samples from `pcm` into
    /// `output`.
    ///
    /// Returns the number of bytes written, which is 0 while the engine is
    /// still buffering a frame. Empty input drains the engine; once it is
    /// fully drained the call returns 0.
    ///
    /// # Errors
    ///
    /// * `CodecError::InvalidInput` - `pcm` holds fewer samples than announced
    /// * `CodecError::BufferOverflow` - `output` cannot hold the encoded data
    /// * `CodecError::EngineFatal` - the engine is gone; reopen
    /// * `CodecError::Encode` - any other engine failure
    pub fn encode(
        &mut self,
        pcm: &[i16],
        samples_per_channel: usize,
        output: &mut [u8],
    ) -> Result<usize> {
        self.state.ensure_usable()?;

        let input = if pcm.is_empty() || samples_per_channel == 0 {
            None
        } else {
            let needed = samples_per_channel
                .checked_mul(self.config.channels as usize)
                .filter(|&n| n <= pcm.len())
                .ok_or_else(|| {
                    CodecError::InvalidInput(format!(
                        "{} samples per channel announced, buffer holds {} interleaved samples of {} channels",
                        samples_per_channel,
                        pcm.len(),
                        self.config.channels
                    ))
                })?;
            Some(&pcm[..needed])
        };

        match self.engine.encode(input, output) {
            Ok(bytes) => {
                self.state.activate();
                self.record_output(bytes);
                Ok(bytes)
            }
            Err(EngineError::EndOfStream) => {
                self.logger.debug("Encoder drained");
                Ok(0)
            }
            Err(EngineError::OutputTooSmall) => Err(CodecError::BufferOverflow {
                required: Some(self.max_output_bytes),
                available: output.len(),
            }),
            Err(EngineError::Fatal(code)) => {
                self.logger
                    .error(&format!("Fatal encoder error 0x{:04x}, handle unusable", code));
                self.state = AdapterState::Error(code);
                Err(CodecError::EngineFatal(code))
            }
            Err(e) => Err(CodecError::Encode(e)),
        }
    }

    /// Drains buffered input. Same as [`AacEncoder::encode`] with no samples.
    pub fn flush(&mut self, output: &mut [u8]) -> Result<usize> {
        self.encode(&[], 0, output)
    }

    /// Changes the target bitrate of a running encoder.
    ///
    /// On refusal the encoder keeps its previous bitrate and stays usable.
    pub fn set_bitrate(&mut self, bitrate: u32) -> Result<()> {
        self.state.ensure_usable()?;

        let value = i32::try_from(bitrate).unwrap_or(i32::MAX);
        match self.engine.set_param(EncoderParam::Bitrate, value) {
            Ok(()) => {
                self.logger.info(&format!(
                    "Encoder bitrate changed: {} -> {}",
                    self.config.bitrate, bitrate
                ));
                self.config.bitrate = bitrate;
                Ok(())
            }
            Err(EngineError::Fatal(code)) => {
                self.logger
                    .error(&format!("Fatal encoder error 0x{:04x} on bitrate change", code));
                self.state = AdapterState::Error(code);
                Err(CodecError::EngineFatal(code))
            }
            Err(source) => {
                self.logger.warn(&format!(
                    "Bitrate {} rejected ({}), keeping {}",
                    bitrate, source, self.config.bitrate
                ));
                Err(CodecError::ParameterRejected {
                    parameter: EncoderParam::Bitrate,
                    value,
                    source,
                })
            }
        }
    }

    /// Releases the engine. A second call is a usage error.
    pub fn close(&mut self) -> Result<()> {
        if self.state.is_closed() {
            return Err(CodecError::Closed);
        }
        self.engine.close();
        self.state = AdapterState::Closed;
        self.stream_info.invalidate();
        self.logger.info(&format!(
            "{} encoder closed. Total frames encoded: {}, bytes: {}",
            self.config.object_type, self.frame_count, self.bytes_out
        ));
        Ok(())
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.stream_info.get()
    }

    /// Samples per channel the engine consumes per frame.
    pub fn frame_size(&self) -> usize {
        self.stream_info.get().map_or(0, |info| info.frame_size)
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    fn record_output(&mut self, bytes: usize) {
        if bytes == 0 {
            if self.frame_count == 0 {
                self.logger.trace("Encoder buffering initial samples");
            }
            return;
        }
        self.frame_count += 1;
        self.bytes_out += bytes as u64;

        if self.logger.enabled(LogLevel::Trace) {
            self.logger
                .trace(&format!("Encoded packet #{}: {} bytes", self.frame_count, bytes));
        }
        if self.frame_count.is_multiple_of(ENCODER_LOG_INTERVAL) {
            self.logger.debug(&format!(
                "Encoded packet #{}, size: {} bytes, total: {} bytes",
                self.frame_count, bytes, self.bytes_out
            ));
        }
    }
}

impl<E: EncoderEngine> Drop for AacEncoder<E> {
    fn drop(&mut self) {
        if !self.state.is_closed() {
            self.engine.close();
            self.logger.info(&format!(
                "{} encoder stopped. Total frames encoded: {}",
                self.config.object_type, self.frame_count
            ));
        }
    }
}
