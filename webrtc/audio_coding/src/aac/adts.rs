//! ADTS framing and MPEG-4 AudioSpecificConfig helpers.
//!
//! ADTS prefixes every AAC access unit with a 7-byte header (9 with CRC)
//! that carries the profile, sampling frequency index, channel configuration
//! and the frame length including the header. That makes an ADTS stream
//! self-delimiting, which is what the packet-level code in this crate
//! relies on.

/// Length of a header without CRC.
pub const ADTS_HEADER_LEN: usize = 7;

/// Largest value of the 13-bit frame length field.
pub const ADTS_MAX_FRAME_LEN: usize = 0x1FFF;

const SYNC_WORD: u16 = 0xFFF;
const BUFFER_FULLNESS_VBR: u16 = 0x7FF;

/// Sampling frequencies indexed by `sampling_frequency_index`.
const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

pub fn sample_rate_index(sample_rate: u32) -> Option<u8> {
    SAMPLE_RATES
        .iter()
        .position(|&rate| rate == sample_rate)
        .map(|idx| idx as u8)
}

pub fn sample_rate_from_index(index: u8) -> Option<u32> {
    SAMPLE_RATES.get(index as usize).copied()
}

/// True if `data` starts with the ADTS sync word.
pub fn has_sync(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && (data[1] & 0xF0) == 0xF0
}

/// Offset of the first ADTS sync word in `data`.
pub fn find_sync(data: &[u8]) -> Option<usize> {
    (0..data.len().saturating_sub(1)).find(|&i| has_sync(&data[i..]))
}

/// Fixed and variable header fields of one ADTS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    /// MPEG-4 audio object type (profile field + 1)
    pub object_type: u8,
    pub sample_rate_index: u8,
    pub channel_config: u8,
    /// Frame length in bytes, header included
    pub frame_length: usize,
    pub protection_absent: bool,
    /// Raw data blocks in the frame
    pub raw_blocks: u8,
}

impl AdtsHeader {
    /// Header for a single-block frame without CRC.
    pub fn new(
        object_type: u8,
        sample_rate_index: u8,
        channel_config: u8,
        payload_len: usize,
    ) -> Self {
        Self {
            object_type,
            sample_rate_index,
            channel_config,
            frame_length: payload_len + ADTS_HEADER_LEN,
            protection_absent: true,
            raw_blocks: 1,
        }
    }

    pub fn header_len(&self) -> usize {
        if self.protection_absent {
            ADTS_HEADER_LEN
        } else {
            ADTS_HEADER_LEN + 2
        }
    }

    pub fn payload_len(&self) -> usize {
        self.frame_length.saturating_sub(self.header_len())
    }

    pub fn sample_rate(&self) -> Option<u32> {
        sample_rate_from_index(self.sample_rate_index)
    }

    /// Parses the header at the start of `data`.
    ///
    /// Returns `None` without a sync word, on reserved field values, or if
    /// `data` is shorter than a header.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < ADTS_HEADER_LEN || !has_sync(data) {
            return None;
        }

        let layer = (data[1] >> 1) & 0x03;
        if layer != 0 {
            return None;
        }
        let protection_absent = data[1] & 0x01 == 1;
        let object_type = ((data[2] >> 6) & 0x03) + 1;
        let sample_rate_index = (data[2] >> 2) & 0x0F;
        sample_rate_from_index(sample_rate_index)?;
        let channel_config = ((data[2] & 0x01) << 2) | ((data[3] >> 6) & 0x03);
        let frame_length = (((data[3] & 0x03) as usize) << 11)
            | ((data[4] as usize) << 3)
            | ((data[5] >> 5) as usize);
        let raw_blocks = (data[6] & 0x03) + 1;

        let header = Self {
            object_type,
            sample_rate_index,
            channel_config,
            frame_length,
            protection_absent,
            raw_blocks,
        };
        if frame_length < header.header_len() {
            return None;
        }
        Some(header)
    }

    /// Serializes the header (MPEG-4, no CRC, VBR buffer fullness).
    pub fn to_bytes(&self) -> [u8; ADTS_HEADER_LEN] {
        let profile = self.object_type.saturating_sub(1) & 0x03;
        let len = self.frame_length & ADTS_MAX_FRAME_LEN;
        let protection = u8::from(self.protection_absent);
        let blocks = self.raw_blocks.saturating_sub(1) & 0x03;

        [
            (SYNC_WORD >> 4) as u8,
            (((SYNC_WORD & 0x0F) as u8) << 4) | protection,
            (profile << 6)
                | ((self.sample_rate_index & 0x0F) << 2)
                | ((self.channel_config >> 2) & 0x01),
            ((self.channel_config & 0x03) << 6) | ((len >> 11) as u8 & 0x03),
            ((len >> 3) & 0xFF) as u8,
            (((len & 0x07) as u8) << 5) | ((BUFFER_FULLNESS_VBR >> 6) as u8 & 0x1F),
            (((BUFFER_FULLNESS_VBR & 0x3F) as u8) << 2) | blocks,
        ]
    }
}

/// Iterator over the complete ADTS frames at the start of a buffer.
///
/// Stops at the first byte that does not start a valid header or at a
/// frame that runs past the end of the buffer.
pub struct AdtsFrames<'a> {
    data: &'a [u8],
}

impl<'a> AdtsFrames<'a> {
    /// Bytes not yet yielded.
    pub fn remainder(&self) -> &'a [u8] {
        self.data
    }
}

impl<'a> Iterator for AdtsFrames<'a> {
    type Item = (AdtsHeader, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let header = AdtsHeader::parse(self.data)?;
        if header.frame_length > self.data.len() {
            return None;
        }
        let (frame, rest) = self.data.split_at(header.frame_length);
        self.data = rest;
        Some((header, frame))
    }
}

pub fn frames(data: &[u8]) -> AdtsFrames<'_> {
    AdtsFrames { data }
}

/// MSB-first bit packer for configuration headers.
struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bit_len: 0,
        }
    }

    fn put(&mut self, value: u32, bits: u32) {
        for shift in (0..bits).rev() {
            if self.bit_len % 8 == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> shift) & 1) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= bit << (7 - (self.bit_len % 8));
            }
            self.bit_len += 1;
        }
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Builds the AudioSpecificConfig for a stream.
///
/// HE-AAC profiles use implicit SBR signalling and are described by their
/// AAC-LC core. `frame_length` selects the short frame flag (960 or 480).
pub fn audio_specific_config(
    object_type: i32,
    sample_rate: u32,
    channel_config: u8,
    frame_length: usize,
) -> Vec<u8> {
    let object_type = match object_type {
        5 | 29 => 2,
        other => other.max(0) as u32,
    };
    let short_frame = u32::from(frame_length == 960 || frame_length == 480);

    let mut writer = BitWriter::new();
    if object_type >= 32 {
        writer.put(31, 5);
        writer.put(object_type - 32, 6);
    } else {
        writer.put(object_type, 5);
    }
    match sample_rate_index(sample_rate) {
        Some(idx) => writer.put(u32::from(idx), 4),
        None => {
            writer.put(0x0F, 4);
            writer.put(sample_rate, 24);
        }
    }
    writer.put(u32::from(channel_config), 4);

    match object_type {
        // ER AAC-LD: GASpecificConfig with the error resilience flags, then epConfig
        23 => {
            writer.put(short_frame, 1);
            writer.put(0, 1);
            writer.put(1, 1);
            writer.put(0, 3);
            writer.put(0, 1);
            writer.put(0, 2);
        }
        // ER AAC-ELD: ELDSpecificConfig without SBR or extensions, then epConfig
        39 => {
            writer.put(short_frame, 1);
            writer.put(0, 3);
            writer.put(0, 1);
            writer.put(0, 4);
            writer.put(0, 2);
        }
        _ => {
            writer.put(short_frame, 1);
            writer.put(0, 1);
            writer.put(0, 1);
        }
    }
    writer.finish()
}
