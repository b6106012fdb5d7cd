//! Engine pair backed by FFmpeg's native AAC codec.
//!
//! FFmpeg covers AAC-LC at a constant bitrate over ADTS. Everything else is
//! answered with [`EngineError::Unsupported`], which the adapters report as
//! an init failure naming the parameter.

use crate::aac::adts::{self, ADTS_HEADER_LEN, AdtsHeader};
use crate::aac::engine::{
    DecoderEngine, DecoderParam, EncoderEngine, EncoderInfo, EncoderParam, EngineError,
    EngineResult,
};
use crate::aac::stream_info::StreamInfo;
use crate::aac::types::{AudioObjectType, TransportType};
use crate::common::constants::aac::INTERNAL_BITSTREAM_BUFFER;
use crate::engines::reference::fade_out;
use ffmpeg_next as ffmpeg;
use std::collections::VecDeque;

/// Worst case for one raw AAC frame: 6144 bits per channel.
const MAX_RAW_FRAME_BYTES_PER_CHANNEL: usize = 768;

fn engine_error(err: ffmpeg::Error) -> EngineError {
    EngineError::Failed(i32::from(err))
}

fn is_again(err: &ffmpeg::Error) -> bool {
    matches!(err, ffmpeg::Error::Other { errno } if *errno == ffmpeg::util::error::EAGAIN)
}

fn channel_layout(channels: u32) -> Option<ffmpeg::ChannelLayout> {
    match channels {
        1 => Some(ffmpeg::ChannelLayout::MONO),
        2 => Some(ffmpeg::ChannelLayout::STEREO),
        _ => None,
    }
}

#[inline]
fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

#[inline]
fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

#[derive(Debug, Default)]
struct PendingEncoderConfig {
    sample_rate: Option<u32>,
    channels: Option<u32>,
    bitrate: Option<i32>,
}

struct RunningEncoder {
    encoder: ffmpeg::encoder::Audio,
    sample_rate: u32,
    sample_rate_index: u8,
    channels: u32,
    frame_length: usize,
    max_output_bytes: usize,
    pts: i64,
    eof_sent: bool,
}

/// AAC-LC encoder emitting ADTS frames.
#[derive(Default)]
pub struct FfmpegEncoder {
    opened: bool,
    pending: PendingEncoderConfig,
    running: Option<RunningEncoder>,
    fifo: Vec<i16>,
    packets: VecDeque<Vec<u8>>,
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn send_frame(running: &mut RunningEncoder, samples: &[i16]) -> EngineResult<()> {
        let channels = running.channels as usize;
        let layout = channel_layout(running.channels).ok_or(EngineError::Unsupported)?;
        let mut frame = ffmpeg::frame::Audio::new(
            ffmpeg::format::Sample::F32(ffmpeg::format::sample::Type::Planar),
            running.frame_length,
            layout,
        );
        frame.set_rate(running.sample_rate);
        frame.set_pts(Some(running.pts));
        for ch in 0..channels {
            let plane = frame.plane_mut::<f32>(ch);
            for (out, sample) in plane.iter_mut().zip(samples.iter().skip(ch).step_by(channels)) {
                *out = i16_to_f32(*sample);
            }
        }
        running.pts += running.frame_length as i64;
        running.encoder.send_frame(&frame).map_err(engine_error)
    }

    fn receive_packets(
        running: &mut RunningEncoder,
        packets: &mut VecDeque<Vec<u8>>,
    ) -> EngineResult<()> {
        let mut packet = ffmpeg::Packet::empty();
        loop {
            match running.encoder.receive_packet(&mut packet) {
                Ok(()) => {
                    let raw = packet.data().unwrap_or(&[]);
                    let header = AdtsHeader::new(
                        2,
                        running.sample_rate_index,
                        running.channels as u8,
                        raw.len(),
                    );
                    let mut framed = Vec::with_capacity(header.frame_length);
                    framed.extend_from_slice(&header.to_bytes());
                    framed.extend_from_slice(raw);
                    packets.push_back(framed);
                }
                Err(ffmpeg::Error::Eof) => return Ok(()),
                Err(err) if is_again(&err) => return Ok(()),
                Err(err) => return Err(engine_error(err)),
            }
        }
    }

    /// Moves queued packets into `output`, oldest first, as long as they fit.
    fn write_packets(&mut self, output: &mut [u8]) -> usize {
        let mut written = 0;
        while let Some(packet) = self.packets.front() {
            if written + packet.len() > output.len() {
                break;
            }
            output[written..written + packet.len()].copy_from_slice(packet);
            written += packet.len();
            self.packets.pop_front();
        }
        written
    }

    fn queued_bytes(&self) -> usize {
        self.packets.iter().map(Vec::len).sum()
    }
}

impl EncoderEngine for FfmpegEncoder {
    fn open(&mut self) -> EngineResult<()> {
        ffmpeg::init().map_err(engine_error)?;
        *self = Self {
            opened: true,
            ..Self::default()
        };
        Ok(())
    }

    fn set_param(&mut self, param: EncoderParam, value: i32) -> EngineResult<()> {
        if !self.opened {
            return Err(EngineError::Unsupported);
        }
        // libavcodec cannot retarget a running AAC encoder
        if self.running.is_some() {
            return Err(EngineError::Unsupported);
        }
        match param {
            EncoderParam::AudioObjectType => {
                if AudioObjectType::from_mpeg4_id(value) != Some(AudioObjectType::Lc) {
                    return Err(EngineError::Unsupported);
                }
            }
            EncoderParam::SampleRate => {
                let rate = u32::try_from(value).map_err(|_| EngineError::Unsupported)?;
                adts::sample_rate_index(rate).ok_or(EngineError::Unsupported)?;
                self.pending.sample_rate = Some(rate);
            }
            EncoderParam::ChannelMode => {
                let channels = u32::try_from(value).map_err(|_| EngineError::Unsupported)?;
                channel_layout(channels).ok_or(EngineError::Unsupported)?;
                self.pending.channels = Some(channels);
            }
            EncoderParam::BitrateMode => {
                if value != 0 {
                    return Err(EngineError::Unsupported);
                }
            }
            EncoderParam::Bitrate => self.pending.bitrate = Some(value),
            EncoderParam::Transmux => {
                if TransportType::from_engine_id(value) != Some(TransportType::Adts) {
                    return Err(EngineError::Unsupported);
                }
            }
            EncoderParam::SbrMode | EncoderParam::GranuleLength => {
                return Err(EngineError::Unsupported);
            }
            EncoderParam::ChannelOrder | EncoderParam::Afterburner => {}
        }
        Ok(())
    }

    fn probe(&mut self) -> EngineResult<EncoderInfo> {
        let (Some(sample_rate), Some(channels)) = (self.pending.sample_rate, self.pending.channels)
        else {
            return Err(EngineError::Unsupported);
        };
        let layout = channel_layout(channels).ok_or(EngineError::Unsupported)?;
        let sample_rate_index =
            adts::sample_rate_index(sample_rate).ok_or(EngineError::Unsupported)?;

        let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::AAC)
            .ok_or(EngineError::Unsupported)?
            .audio()
            .map_err(engine_error)?;
        let ctx = ffmpeg::codec::context::Context::new_with_codec(*codec);
        let mut encoder = ctx.encoder().audio().map_err(engine_error)?;

        encoder.set_rate(sample_rate as i32);
        encoder.set_format(ffmpeg::format::Sample::F32(ffmpeg::format::sample::Type::Planar));
        encoder.set_channel_layout(layout);
        if let Some(bitrate) = self.pending.bitrate {
            encoder.set_bit_rate(bitrate.max(0) as usize);
        }
        encoder.set_time_base((1, sample_rate as i32));

        let encoder = encoder.open_with(ffmpeg::Dictionary::new()).map_err(engine_error)?;
        let frame_length = encoder.frame_size() as usize;
        let max_output_bytes =
            ADTS_HEADER_LEN + MAX_RAW_FRAME_BYTES_PER_CHANNEL * channels as usize;

        self.running = Some(RunningEncoder {
            encoder,
            sample_rate,
            sample_rate_index,
            channels,
            frame_length,
            max_output_bytes,
            pts: 0,
            eof_sent: false,
        });

        Ok(EncoderInfo {
            frame_length,
            max_output_bytes,
            input_channels: channels,
            encoder_delay: 0,
            config_header: adts::audio_specific_config(
                AudioObjectType::Lc.mpeg4_id(),
                sample_rate,
                channels as u8,
                frame_length,
            ),
        })
    }

    fn encode(&mut self, pcm: Option<&[i16]>, output: &mut [u8]) -> EngineResult<usize> {
        let queued = self.queued_bytes();
        let Some(running) = self.running.as_mut() else {
            return Err(EngineError::Unsupported);
        };
        let frame_samples = running.frame_length * running.channels as usize;

        match pcm {
            Some(samples) => {
                let frames = (self.fifo.len() + samples.len()) / frame_samples;
                if output.len() < queued + frames * running.max_output_bytes {
                    return Err(EngineError::OutputTooSmall);
                }
                self.fifo.extend_from_slice(samples);
                let mut consumed = 0;
                while self.fifo.len() - consumed >= frame_samples {
                    Self::send_frame(running, &self.fifo[consumed..consumed + frame_samples])?;
                    consumed += frame_samples;
                    Self::receive_packets(running, &mut self.packets)?;
                }
                self.fifo.drain(..consumed);
            }
            None => {
                if !self.fifo.is_empty() {
                    self.fifo.resize(frame_samples, 0);
                    Self::send_frame(running, &self.fifo)?;
                    self.fifo.clear();
                }
                if !running.eof_sent {
                    running.encoder.send_eof().map_err(engine_error)?;
                    running.eof_sent = true;
                }
                Self::receive_packets(running, &mut self.packets)?;

                match self.packets.front() {
                    None => return Err(EngineError::EndOfStream),
                    Some(first) if first.len() > output.len() => {
                        return Err(EngineError::OutputTooSmall);
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(self.write_packets(output))
    }

    fn close(&mut self) {
        *self = Self::default();
    }
}

/// AAC decoder fed with ADTS frames.
pub struct FfmpegDecoder {
    decoder: Option<ffmpeg::decoder::Audio>,
    buffer: Vec<u8>,
    conceal_method: i32,
    pending: Option<Vec<i16>>,
    info: Option<StreamInfo>,
    last_frame: Vec<i16>,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self {
            decoder: None,
            buffer: Vec::with_capacity(INTERNAL_BITSTREAM_BUFFER),
            conceal_method: 0,
            pending: None,
            info: None,
            last_frame: Vec::new(),
        }
    }
}

impl FfmpegDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next complete ADTS frame in the buffer, dropping bytes in front of it.
    fn take_frame(&mut self) -> Option<Vec<u8>> {
        loop {
            match adts::find_sync(&self.buffer) {
                Some(offset) => {
                    self.buffer.drain(..offset);
                }
                None => {
                    let keep = usize::from(self.buffer.last() == Some(&0xFF));
                    let drop = self.buffer.len() - keep;
                    self.buffer.drain(..drop);
                    return None;
                }
            }
            match AdtsHeader::parse(&self.buffer) {
                Some(header) if header.frame_length <= self.buffer.len() => {
                    return Some(self.buffer.drain(..header.frame_length).collect());
                }
                Some(_) => return None,
                None if self.buffer.len() < ADTS_HEADER_LEN => return None,
                None => {
                    self.buffer.drain(..1);
                }
            }
        }
    }

    /// Interleaves a decoded frame into i16 samples.
    fn extract_samples(frame: &ffmpeg::frame::Audio) -> EngineResult<Vec<i16>> {
        let samples = frame.samples();
        let channels = frame.channels() as usize;
        let mut out = vec![0i16; samples * channels];

        match frame.format() {
            ffmpeg::format::Sample::F32(ffmpeg::format::sample::Type::Planar) => {
                for ch in 0..channels {
                    let plane = frame.plane::<f32>(ch);
                    for (i, sample) in plane.iter().take(samples).enumerate() {
                        out[i * channels + ch] = f32_to_i16(*sample);
                    }
                }
            }
            ffmpeg::format::Sample::I16(ffmpeg::format::sample::Type::Planar) => {
                for ch in 0..channels {
                    let plane = frame.plane::<i16>(ch);
                    for (i, sample) in plane.iter().take(samples).enumerate() {
                        out[i * channels + ch] = *sample;
                    }
                }
            }
            _ => return Err(EngineError::Unsupported),
        }
        Ok(out)
    }

    /// Decodes buffered ADTS frames until libavcodec hands back audio.
    fn next_pcm(&mut self) -> EngineResult<Vec<i16>> {
        let mut decoded = ffmpeg::frame::Audio::empty();
        loop {
            let decoder = self.decoder.as_mut().ok_or(EngineError::Unsupported)?;
            match decoder.receive_frame(&mut decoded) {
                Ok(()) => break,
                Err(err) if is_again(&err) => {}
                Err(err) => return Err(engine_error(err)),
            }
            let Some(frame) = self.take_frame() else {
                return Err(EngineError::NotEnoughBits);
            };
            let decoder = self.decoder.as_mut().ok_or(EngineError::Unsupported)?;
            decoder
                .send_packet(&ffmpeg::Packet::copy(&frame))
                .map_err(engine_error)?;
        }

        let pcm = Self::extract_samples(&decoded)?;
        let channels = decoded.channels() as u32;
        let sample_rate = decoded.rate();
        let frame_size = decoded.samples();
        self.info = Some(StreamInfo {
            frame_size,
            channels,
            sample_rate,
            delay: 0,
            config_header: adts::audio_specific_config(
                AudioObjectType::Lc.mpeg4_id(),
                sample_rate,
                channels as u8,
                frame_size,
            ),
        });
        Ok(pcm)
    }
}

impl DecoderEngine for FfmpegDecoder {
    fn open(&mut self, transport: TransportType) -> EngineResult<()> {
        if transport != TransportType::Adts {
            return Err(EngineError::Unsupported);
        }
        ffmpeg::init().map_err(engine_error)?;
        let codec = ffmpeg::decoder::find(ffmpeg::codec::Id::AAC).ok_or(EngineError::Unsupported)?;
        let ctx = ffmpeg::codec::context::Context::new_with_codec(codec);
        let decoder = ctx.decoder().audio().map_err(engine_error)?;

        *self = Self {
            decoder: Some(decoder),
            ..Self::default()
        };
        Ok(())
    }

    fn set_param(&mut self, param: DecoderParam, value: i32) -> EngineResult<()> {
        match param {
            DecoderParam::ConcealMethod if (0..=2).contains(&value) => {
                self.conceal_method = value;
                Ok(())
            }
            DecoderParam::ConcealMethod => Err(EngineError::Unsupported),
        }
    }

    fn fill(&mut self, input: &[u8]) -> EngineResult<usize> {
        let room = INTERNAL_BITSTREAM_BUFFER.saturating_sub(self.buffer.len());
        let take = room.min(input.len());
        self.buffer.extend_from_slice(&input[..take]);
        Ok(input.len() - take)
    }

    fn decode_frame(&mut self, output: &mut [i16]) -> EngineResult<()> {
        let pcm = match self.pending.take() {
            Some(pcm) => pcm,
            None => self.next_pcm()?,
        };
        if output.len() < pcm.len() {
            self.pending = Some(pcm);
            return Err(EngineError::OutputTooSmall);
        }
        output[..pcm.len()].copy_from_slice(&pcm);
        self.last_frame = pcm;
        Ok(())
    }

    fn conceal_frame(&mut self, output: &mut [i16]) -> EngineResult<()> {
        let samples = self
            .info
            .as_ref()
            .map(StreamInfo::samples_per_frame)
            .ok_or(EngineError::Unsupported)?;
        if output.len() < samples {
            return Err(EngineError::OutputTooSmall);
        }
        if self.conceal_method == 0 || self.last_frame.len() != samples {
            output[..samples].fill(0);
        } else {
            fade_out(&mut self.last_frame, &mut output[..samples]);
        }
        Ok(())
    }

    fn stream_info(&self) -> Option<StreamInfo> {
        self.info.clone()
    }

    fn estimate_duration(&self, packet: &[u8]) -> Option<usize> {
        // Raw AAC frames are 1024 samples per channel for every profile
        // FFmpeg encodes.
        let mut frames = adts::frames(packet);
        let count = frames.by_ref().count();
        (count > 0 && frames.remainder().is_empty()).then_some(count * 1024)
    }

    fn reset(&mut self) {
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.flush();
        }
        self.buffer.clear();
        self.pending = None;
    }

    fn close(&mut self) {
        *self = Self::default();
    }
}
