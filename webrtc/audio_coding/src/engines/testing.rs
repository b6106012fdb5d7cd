//! Scripted engines for unit tests.
//!
//! Their bitstream is trivial: every frame is [`FRAME_LEN`] bytes and
//! decodes to a constant sample value taken from its second byte. Failures
//! are injected by call number, and every open/close is counted so tests
//! can check that no engine instance outlives its adapter.

use crate::aac::engine::{
    ConfigStep, DecoderEngine, DecoderParam, EncoderEngine, EncoderInfo, EncoderParam,
    EngineError, EngineResult,
};
use crate::aac::stream_info::StreamInfo;
use crate::aac::types::TransportType;
use std::cell::RefCell;
use std::rc::Rc;

/// Bytes of one scripted frame.
pub const FRAME_LEN: usize = 4;

/// Bytes one scripted encoder frame occupies.
pub const ENCODED_FRAME_BYTES: usize = 16;

/// `n` consecutive frames decoding to the values 1, 2, ...
pub fn frame_bytes(n: usize) -> Vec<u8> {
    (0..n)
        .flat_map(|i| [0xA5, (i + 1) as u8, 0, 0])
        .collect()
}

#[derive(Default)]
struct EngineLogInner {
    opens: usize,
    closes: usize,
    steps: Vec<(ConfigStep, i32)>,
}

/// Shared record of what an engine went through, readable after the
/// engine has been moved into (and dropped with) an adapter.
#[derive(Clone, Default)]
pub struct EngineLog {
    inner: Rc<RefCell<EngineLogInner>>,
}

impl EngineLog {
    pub fn opens(&self) -> usize {
        self.inner.borrow().opens
    }

    pub fn closes(&self) -> usize {
        self.inner.borrow().closes
    }

    /// Engine instances opened and not closed.
    pub fn live(&self) -> usize {
        let inner = self.inner.borrow();
        inner.opens - inner.closes
    }

    /// Every accepted parameter, in order.
    pub fn steps(&self) -> Vec<(ConfigStep, i32)> {
        self.inner.borrow().steps.clone()
    }

    fn opened(&self) {
        self.inner.borrow_mut().opens += 1;
    }

    fn closed(&self) {
        self.inner.borrow_mut().closes += 1;
    }

    fn step(&self, step: ConfigStep, value: i32) {
        self.inner.borrow_mut().steps.push((step, value));
    }
}

pub struct ScriptedDecoder {
    frame_size: usize,
    channels: u32,
    buffer: Vec<u8>,
    buffer_capacity: usize,
    fill_chunk: usize,
    fill_calls: usize,
    decode_attempts: usize,
    decode_failure: Option<(usize, EngineError)>,
    conceal_calls: usize,
    conceal_failure: Option<(usize, EngineError)>,
    open_error: Option<EngineError>,
    param_error: Option<EngineError>,
    estimates_duration: bool,
    decoded_once: bool,
    log: EngineLog,
}

impl ScriptedDecoder {
    /// Sample value every concealed frame is filled with.
    pub const CONCEALED_SAMPLE: i16 = -1;

    pub fn new(frame_size: usize, channels: u32) -> Self {
        Self {
            frame_size,
            channels,
            buffer: Vec::new(),
            buffer_capacity: 1024,
            fill_chunk: usize::MAX,
            fill_calls: 0,
            decode_attempts: 0,
            decode_failure: None,
            conceal_calls: 0,
            conceal_failure: None,
            open_error: None,
            param_error: None,
            estimates_duration: false,
            decoded_once: false,
            log: EngineLog::default(),
        }
    }

    /// Takes at most `chunk` bytes per fill call.
    pub fn with_fill_chunk(mut self, chunk: usize) -> Self {
        self.fill_chunk = chunk;
        self
    }

    pub fn with_duration_estimates(mut self) -> Self {
        self.estimates_duration = true;
        self
    }

    pub fn reject_open(mut self, err: EngineError) -> Self {
        self.open_error = Some(err);
        self
    }

    pub fn reject_params(mut self, err: EngineError) -> Self {
        self.param_error = Some(err);
        self
    }

    /// Makes the `n`th decodable frame (1-based) fail with `err`.
    pub fn fail_decode_at(&mut self, n: usize, err: EngineError) {
        self.decode_failure = Some((n, err));
    }

    /// Makes the `n`th concealment call (1-based) fail with `err`.
    pub fn fail_conceal_at(&mut self, n: usize, err: EngineError) {
        self.conceal_failure = Some((n, err));
    }

    pub fn log(&self) -> EngineLog {
        self.log.clone()
    }

    pub fn fill_calls(&self) -> usize {
        self.fill_calls
    }

    pub fn conceal_calls(&self) -> usize {
        self.conceal_calls
    }

    pub fn has_buffered_frames(&self) -> bool {
        self.buffer.len() >= FRAME_LEN
    }

    fn frame_samples(&self) -> usize {
        self.frame_size * self.channels as usize
    }
}

impl DecoderEngine for ScriptedDecoder {
    fn open(&mut self, _transport: TransportType) -> EngineResult<()> {
        if let Some(err) = self.open_error {
            return Err(err);
        }
        self.log.opened();
        Ok(())
    }

    fn set_param(&mut self, _param: DecoderParam, value: i32) -> EngineResult<()> {
        if let Some(err) = self.param_error {
            return Err(err);
        }
        self.log.step(ConfigStep::ConcealMethod, value);
        Ok(())
    }

    fn fill(&mut self, input: &[u8]) -> EngineResult<usize> {
        self.fill_calls += 1;
        let room = self.buffer_capacity - self.buffer.len();
        let take = input.len().min(room).min(self.fill_chunk);
        self.buffer.extend_from_slice(&input[..take]);
        Ok(input.len() - take)
    }

    fn decode_frame(&mut self, output: &mut [i16]) -> EngineResult<()> {
        if self.buffer.len() < FRAME_LEN {
            return Err(EngineError::NotEnoughBits);
        }
        let samples = self.frame_samples();
        if output.len() < samples {
            return Err(EngineError::OutputTooSmall);
        }

        self.decode_attempts += 1;
        let frame: Vec<u8> = self.buffer.drain(..FRAME_LEN).collect();
        if let Some((n, err)) = self.decode_failure {
            if n == self.decode_attempts {
                return Err(err);
            }
        }

        output[..samples].fill(i16::from(frame[1]));
        self.decoded_once = true;
        Ok(())
    }

    fn conceal_frame(&mut self, output: &mut [i16]) -> EngineResult<()> {
        self.conceal_calls += 1;
        if let Some((n, err)) = self.conceal_failure {
            if n == self.conceal_calls {
                return Err(err);
            }
        }
        let samples = self.frame_samples();
        if output.len() < samples {
            return Err(EngineError::OutputTooSmall);
        }
        output[..samples].fill(Self::CONCEALED_SAMPLE);
        Ok(())
    }

    fn stream_info(&self) -> Option<StreamInfo> {
        self.decoded_once.then(|| StreamInfo {
            frame_size: self.frame_size,
            channels: self.channels,
            sample_rate: 48000,
            delay: 0,
            config_header: Vec::new(),
        })
    }

    fn estimate_duration(&self, packet: &[u8]) -> Option<usize> {
        if !self.estimates_duration || packet.len() % FRAME_LEN != 0 {
            return None;
        }
        Some(packet.len() / FRAME_LEN * self.frame_size)
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn close(&mut self) {
        self.log.closed();
    }
}

pub struct ScriptedEncoder {
    frame_length: usize,
    channels: u32,
    pending: usize,
    probed: bool,
    open_error: Option<EngineError>,
    param_error: Option<(EncoderParam, EngineError)>,
    live_param_error: Option<(EncoderParam, EngineError)>,
    probe_error: Option<EngineError>,
    next_encode_error: Option<EngineError>,
    log: EngineLog,
}

impl ScriptedEncoder {
    pub fn new(frame_length: usize, channels: u32) -> Self {
        Self {
            frame_length,
            channels,
            pending: 0,
            probed: false,
            open_error: None,
            param_error: None,
            live_param_error: None,
            probe_error: None,
            next_encode_error: None,
            log: EngineLog::default(),
        }
    }

    pub fn reject_open(mut self, err: EngineError) -> Self {
        self.open_error = Some(err);
        self
    }

    /// Rejects `param` while configuring.
    pub fn reject_param(mut self, param: EncoderParam, err: EngineError) -> Self {
        self.param_error = Some((param, err));
        self
    }

    /// Rejects `param` once the encoder is running.
    pub fn reject_live_param(mut self, param: EncoderParam, err: EngineError) -> Self {
        self.live_param_error = Some((param, err));
        self
    }

    pub fn fail_probe(mut self, err: EngineError) -> Self {
        self.probe_error = Some(err);
        self
    }

    pub fn fail_next_encode(&mut self, err: EngineError) {
        self.next_encode_error = Some(err);
    }

    pub fn log(&self) -> EngineLog {
        self.log.clone()
    }

    fn frame_samples(&self) -> usize {
        self.frame_length * self.channels as usize
    }
}

impl EncoderEngine for ScriptedEncoder {
    fn open(&mut self) -> EngineResult<()> {
        if let Some(err) = self.open_error {
            return Err(err);
        }
        self.log.opened();
        Ok(())
    }

    fn set_param(&mut self, param: EncoderParam, value: i32) -> EngineResult<()> {
        let rejection = if self.probed {
            self.live_param_error
        } else {
            self.param_error
        };
        if let Some((rejected, err)) = rejection {
            if rejected == param {
                return Err(err);
            }
        }
        self.log.step(ConfigStep::Param(param), value);
        Ok(())
    }

    fn probe(&mut self) -> EngineResult<EncoderInfo> {
        if let Some(err) = self.probe_error {
            return Err(err);
        }
        self.probed = true;
        Ok(EncoderInfo {
            frame_length: self.frame_length,
            max_output_bytes: ENCODED_FRAME_BYTES,
            input_channels: self.channels,
            encoder_delay: 0,
            config_header: vec![0x11, 0x88],
        })
    }

    fn encode(&mut self, pcm: Option<&[i16]>, output: &mut [u8]) -> EngineResult<usize> {
        if let Some(err) = self.next_encode_error.take() {
            return Err(err);
        }
        let frame_samples = self.frame_samples();

        let (frames, pending) = match pcm {
            Some(samples) => {
                let total = self.pending + samples.len();
                (total / frame_samples, total % frame_samples)
            }
            None if self.pending == 0 => return Err(EngineError::EndOfStream),
            None => (1, 0),
        };

        let bytes = frames * ENCODED_FRAME_BYTES;
        if output.len() < bytes {
            return Err(EngineError::OutputTooSmall);
        }
        self.pending = pending;
        output[..bytes].fill(0xAB);
        Ok(bytes)
    }

    fn close(&mut self) {
        self.log.closed();
    }
}
