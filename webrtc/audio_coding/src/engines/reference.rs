//! Deterministic in-tree engine pair.
//!
//! The "codec" is 16-bit big-endian PCM carried in genuine ADTS frames, so
//! a stream produced here has real framing, real headers and a real
//! AudioSpecificConfig while decoding stays bit exact. It implements the
//! full engine contract (parameter validation, probe geometry, partial
//! fills, multi-frame packets, drain, concealment) and is what the adapters
//! run on when no native codec library is linked.

use crate::aac::adts::{self, ADTS_HEADER_LEN, ADTS_MAX_FRAME_LEN, AdtsHeader};
use crate::aac::engine::{
    DecoderEngine, DecoderParam, EncoderEngine, EncoderInfo, EncoderParam, EngineError,
    EngineResult,
};
use crate::aac::stream_info::StreamInfo;
use crate::aac::types::{AudioObjectType, TransportType};
use crate::common::constants::aac::{
    DEFAULT_FRAME_SIZE, INTERNAL_BITSTREAM_BUFFER, LOW_DELAY_GRANULE,
};

/// Engine status codes.
pub mod codes {
    pub const INVALID_HANDLE: i32 = 0x0020;
    pub const INVALID_CONFIG: i32 = 0x0030;
    pub const TRANSPORT_SYNC_ERROR: i32 = 0x1001;
    pub const UNSUPPORTED_FORMAT: i32 = 0x2003;
    pub const DECODE_FRAME_ERROR: i32 = 0x4004;
    pub const NO_STREAM_INFO: i32 = 0x4005;
}

/// ADTS profile field used for every frame; HE profiles are signalled
/// implicitly through their LC core.
const ADTS_OBJECT_TYPE_LC: u8 = 2;

const SUPPORTED_CHANNELS: std::ops::RangeInclusive<u32> = 1..=2;

/// Parameters collected between open and probe.
#[derive(Debug, Default)]
struct PendingConfig {
    object_type: Option<AudioObjectType>,
    granule: Option<usize>,
    sample_rate: Option<u32>,
    channels: Option<u32>,
    bitrate: Option<i32>,
    transport: Option<TransportType>,
}

/// Geometry fixed by a successful probe.
#[derive(Debug, Clone, Copy)]
struct EncoderGeometry {
    object_type: AudioObjectType,
    sample_rate_index: u8,
    channels: u32,
    frame_length: usize,
}

impl EncoderGeometry {
    fn frame_samples(&self) -> usize {
        self.frame_length * self.channels as usize
    }

    fn frame_bytes(&self) -> usize {
        ADTS_HEADER_LEN + self.frame_samples() * 2
    }
}

#[derive(Debug, Default)]
pub struct ReferenceEncoder {
    opened: bool,
    pending: PendingConfig,
    geometry: Option<EncoderGeometry>,
    fifo: Vec<i16>,
}

impl ReferenceEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bitrate currently in force, if one was set.
    pub fn bitrate(&self) -> Option<i32> {
        self.pending.bitrate
    }

    fn invalid_config() -> EngineError {
        EngineError::Failed(codes::INVALID_CONFIG)
    }

    fn low_delay(&self) -> bool {
        self.pending
            .object_type
            .is_some_and(AudioObjectType::is_low_delay)
    }

    fn write_frame(geometry: &EncoderGeometry, samples: &[i16], output: &mut [u8]) -> usize {
        let payload_len = samples.len() * 2;
        let header = AdtsHeader::new(
            ADTS_OBJECT_TYPE_LC,
            geometry.sample_rate_index,
            geometry.channels as u8,
            payload_len,
        );
        output[..ADTS_HEADER_LEN].copy_from_slice(&header.to_bytes());
        for (chunk, sample) in output[ADTS_HEADER_LEN..ADTS_HEADER_LEN + payload_len]
            .chunks_exact_mut(2)
            .zip(samples)
        {
            chunk.copy_from_slice(&sample.to_be_bytes());
        }
        header.frame_length
    }

    /// Emits every whole frame held in the FIFO.
    fn emit_frames(&mut self, geometry: &EncoderGeometry, output: &mut [u8]) -> usize {
        let frame_samples = geometry.frame_samples();
        let mut written = 0;
        let mut consumed = 0;
        while self.fifo.len() - consumed >= frame_samples {
            let frame = &self.fifo[consumed..consumed + frame_samples];
            written += Self::write_frame(geometry, frame, &mut output[written..]);
            consumed += frame_samples;
        }
        self.fifo.drain(..consumed);
        written
    }
}

impl EncoderEngine for ReferenceEncoder {
    fn open(&mut self) -> EngineResult<()> {
        *self = Self {
            opened: true,
            ..Self::default()
        };
        Ok(())
    }

    fn set_param(&mut self, param: EncoderParam, value: i32) -> EngineResult<()> {
        if !self.opened {
            return Err(EngineError::Failed(codes::INVALID_HANDLE));
        }
        // Only the bitrate may change once the geometry is fixed.
        if self.geometry.is_some() && param != EncoderParam::Bitrate {
            return Err(EngineError::Unsupported);
        }

        match param {
            EncoderParam::AudioObjectType => {
                let aot = AudioObjectType::from_mpeg4_id(value).ok_or_else(Self::invalid_config)?;
                self.pending.object_type = Some(aot);
            }
            EncoderParam::SbrMode => {
                if !(-1..=1).contains(&value) {
                    return Err(Self::invalid_config());
                }
            }
            EncoderParam::GranuleLength => {
                if !self.low_delay() || !(value == 480 || value == 512) {
                    return Err(Self::invalid_config());
                }
                self.pending.granule = Some(value as usize);
            }
            EncoderParam::SampleRate => {
                let rate = u32::try_from(value).map_err(|_| Self::invalid_config())?;
                adts::sample_rate_index(rate).ok_or_else(Self::invalid_config)?;
                self.pending.sample_rate = Some(rate);
            }
            EncoderParam::ChannelMode => {
                let channels = u32::try_from(value).map_err(|_| Self::invalid_config())?;
                if !SUPPORTED_CHANNELS.contains(&channels) {
                    return Err(EngineError::Unsupported);
                }
                self.pending.channels = Some(channels);
            }
            EncoderParam::ChannelOrder | EncoderParam::Afterburner => {
                if !(0..=1).contains(&value) {
                    return Err(Self::invalid_config());
                }
            }
            EncoderParam::BitrateMode => {
                let valid = match value {
                    0..=5 => true,
                    8 => self.low_delay(),
                    _ => false,
                };
                if !valid {
                    return Err(Self::invalid_config());
                }
            }
            EncoderParam::Bitrate => {
                if !(8_000..=576_000).contains(&value) {
                    return Err(Self::invalid_config());
                }
                self.pending.bitrate = Some(value);
            }
            EncoderParam::Transmux => {
                let transport =
                    TransportType::from_engine_id(value).ok_or_else(Self::invalid_config)?;
                if transport != TransportType::Adts {
                    return Err(EngineError::Unsupported);
                }
                self.pending.transport = Some(transport);
            }
        }
        Ok(())
    }

    fn probe(&mut self) -> EngineResult<EncoderInfo> {
        if !self.opened {
            return Err(EngineError::Failed(codes::INVALID_HANDLE));
        }
        let pending = &self.pending;
        let (Some(object_type), Some(sample_rate), Some(channels), Some(_)) = (
            pending.object_type,
            pending.sample_rate,
            pending.channels,
            pending.transport,
        ) else {
            return Err(Self::invalid_config());
        };
        let sample_rate_index =
            adts::sample_rate_index(sample_rate).ok_or_else(Self::invalid_config)?;

        let frame_length = if object_type.is_low_delay() {
            pending.granule.unwrap_or(LOW_DELAY_GRANULE)
        } else {
            DEFAULT_FRAME_SIZE
        };
        let geometry = EncoderGeometry {
            object_type,
            sample_rate_index,
            channels,
            frame_length,
        };
        if geometry.frame_bytes() > ADTS_MAX_FRAME_LEN {
            return Err(Self::invalid_config());
        }
        self.geometry = Some(geometry);

        Ok(EncoderInfo {
            frame_length,
            max_output_bytes: geometry.frame_bytes(),
            input_channels: channels,
            encoder_delay: 0,
            config_header: adts::audio_specific_config(
                geometry.object_type.mpeg4_id(),
                sample_rate,
                channels as u8,
                frame_length,
            ),
        })
    }

    fn encode(&mut self, pcm: Option<&[i16]>, output: &mut [u8]) -> EngineResult<usize> {
        let geometry = self.geometry.ok_or(EngineError::Failed(codes::INVALID_HANDLE))?;
        let frame_samples = geometry.frame_samples();

        match pcm {
            Some(samples) => {
                let frames = (self.fifo.len() + samples.len()) / frame_samples;
                if output.len() < frames * geometry.frame_bytes() {
                    return Err(EngineError::OutputTooSmall);
                }
                self.fifo.extend_from_slice(samples);
                Ok(self.emit_frames(&geometry, output))
            }
            None => {
                if self.fifo.is_empty() {
                    return Err(EngineError::EndOfStream);
                }
                if output.len() < geometry.frame_bytes() {
                    return Err(EngineError::OutputTooSmall);
                }
                self.fifo.resize(frame_samples, 0);
                Ok(self.emit_frames(&geometry, output))
            }
        }
    }

    fn close(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug)]
pub struct ReferenceDecoder {
    opened: bool,
    conceal_method: i32,
    buffer: Vec<u8>,
    buffer_capacity: usize,
    info: Option<StreamInfo>,
    last_frame: Vec<i16>,
}

impl Default for ReferenceDecoder {
    fn default() -> Self {
        Self {
            opened: false,
            conceal_method: 0,
            buffer: Vec::new(),
            buffer_capacity: INTERNAL_BITSTREAM_BUFFER,
            info: None,
            last_frame: Vec::new(),
        }
    }
}

impl ReferenceDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the internal bitstream buffer, forcing packets to be fed in
    /// several rounds.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Drops bytes in front of the first sync word. Keeps a trailing 0xFF
    /// that may be the first half of one.
    fn resync(&mut self) {
        match adts::find_sync(&self.buffer) {
            Some(0) => {}
            Some(offset) => {
                self.buffer.drain(..offset);
            }
            None => {
                let keep = usize::from(self.buffer.last() == Some(&0xFF));
                let drop = self.buffer.len() - keep;
                self.buffer.drain(..drop);
            }
        }
    }

    /// Header of the next complete frame in the buffer, skipping bytes that
    /// cannot start one.
    fn next_frame_header(&mut self) -> EngineResult<AdtsHeader> {
        loop {
            self.resync();
            if self.buffer.len() < ADTS_HEADER_LEN {
                return Err(EngineError::NotEnoughBits);
            }
            match AdtsHeader::parse(&self.buffer) {
                Some(header) if header.frame_length <= self.buffer.len() => return Ok(header),
                Some(_) => return Err(EngineError::NotEnoughBits),
                None => {
                    // sync word without a valid header: skip it
                    self.buffer.drain(..1);
                }
            }
        }
    }

    fn frame_geometry(header: &AdtsHeader) -> EngineResult<(u32, u32, usize)> {
        let channels = u32::from(header.channel_config);
        let sample_rate = header
            .sample_rate()
            .ok_or(EngineError::Failed(codes::UNSUPPORTED_FORMAT))?;
        if !SUPPORTED_CHANNELS.contains(&channels) {
            return Err(EngineError::Failed(codes::UNSUPPORTED_FORMAT));
        }
        let payload = header.payload_len();
        let bytes_per_step = 2 * channels as usize;
        if payload == 0 || payload % bytes_per_step != 0 {
            return Err(EngineError::Failed(codes::DECODE_FRAME_ERROR));
        }
        Ok((sample_rate, channels, payload / bytes_per_step))
    }
}

impl DecoderEngine for ReferenceDecoder {
    fn open(&mut self, transport: TransportType) -> EngineResult<()> {
        if transport != TransportType::Adts {
            return Err(EngineError::Unsupported);
        }
        let capacity = self.buffer_capacity;
        *self = Self {
            opened: true,
            buffer_capacity: capacity,
            ..Self::default()
        };
        Ok(())
    }

    fn set_param(&mut self, param: DecoderParam, value: i32) -> EngineResult<()> {
        if !self.opened {
            return Err(EngineError::Failed(codes::INVALID_HANDLE));
        }
        match param {
            DecoderParam::ConcealMethod => {
                if !(0..=2).contains(&value) {
                    return Err(EngineError::Failed(codes::INVALID_CONFIG));
                }
                self.conceal_method = value;
            }
        }
        Ok(())
    }

    fn fill(&mut self, input: &[u8]) -> EngineResult<usize> {
        if !self.opened {
            return Err(EngineError::Failed(codes::INVALID_HANDLE));
        }
        let room = self.buffer_capacity.saturating_sub(self.buffer.len());
        let take = room.min(input.len());
        self.buffer.extend_from_slice(&input[..take]);
        Ok(input.len() - take)
    }

    fn decode_frame(&mut self, output: &mut [i16]) -> EngineResult<()> {
        if !self.opened {
            return Err(EngineError::Failed(codes::INVALID_HANDLE));
        }
        let header = self.next_frame_header()?;

        let geometry = Self::frame_geometry(&header);
        let (sample_rate, channels, frame_size) = match geometry {
            Ok(geometry) => geometry,
            Err(err) => {
                self.buffer.drain(..header.frame_length);
                return Err(err);
            }
        };
        if let Some(info) = &self.info {
            if info.channels != channels || info.sample_rate != sample_rate {
                self.buffer.drain(..header.frame_length);
                return Err(EngineError::Failed(codes::TRANSPORT_SYNC_ERROR));
            }
        }

        let samples = frame_size * channels as usize;
        if output.len() < samples {
            return Err(EngineError::OutputTooSmall);
        }

        let payload = &self.buffer[header.header_len()..header.frame_length];
        for (sample, bytes) in output[..samples].iter_mut().zip(payload.chunks_exact(2)) {
            *sample = i16::from_be_bytes([bytes[0], bytes[1]]);
        }
        self.buffer.drain(..header.frame_length);

        self.last_frame.clear();
        self.last_frame.extend_from_slice(&output[..samples]);
        self.info = Some(StreamInfo {
            frame_size,
            channels,
            sample_rate,
            delay: 0,
            config_header: adts::audio_specific_config(
                i32::from(header.object_type),
                sample_rate,
                header.channel_config,
                frame_size,
            ),
        });
        Ok(())
    }

    fn conceal_frame(&mut self, output: &mut [i16]) -> EngineResult<()> {
        let info = self
            .info
            .as_ref()
            .ok_or(EngineError::Failed(codes::NO_STREAM_INFO))?;
        let samples = info.samples_per_frame();
        if output.len() < samples {
            return Err(EngineError::OutputTooSmall);
        }

        if self.conceal_method == 0 || self.last_frame.len() != samples {
            output[..samples].fill(0);
            return Ok(());
        }
        fade_out(&mut self.last_frame, &mut output[..samples]);
        Ok(())
    }

    fn stream_info(&self) -> Option<StreamInfo> {
        self.info.clone()
    }

    fn estimate_duration(&self, packet: &[u8]) -> Option<usize> {
        let mut frames = adts::frames(packet);
        let mut total = 0;
        for (header, _) in frames.by_ref() {
            let (_, _, frame_size) = Self::frame_geometry(&header).ok()?;
            total += frame_size;
        }
        if total == 0 || !frames.remainder().is_empty() {
            return None;
        }
        Some(total)
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn close(&mut self) {
        let capacity = self.buffer_capacity;
        *self = Self {
            buffer_capacity: capacity,
            ..Self::default()
        };
    }
}

/// Repeats `last_frame` at half amplitude and keeps the attenuated copy, so
/// consecutive concealed frames fade towards silence.
pub(crate) fn fade_out(last_frame: &mut [i16], output: &mut [i16]) {
    for (held, out) in last_frame.iter_mut().zip(output.iter_mut()) {
        *held /= 2;
        *out = *held;
    }
}
