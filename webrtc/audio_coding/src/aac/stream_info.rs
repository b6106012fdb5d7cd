//! Engine-reported stream facts and their per-handle cache.

/// Frame geometry and configuration header of a configured stream.
///
/// Derived from the engine, never configured: the encoder learns it from
/// the probe call after configuration, the decoder from the first frame it
/// decodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Samples per channel in one frame
    pub frame_size: usize,
    pub channels: u32,
    pub sample_rate: u32,
    /// Encoder or decoder delay in samples per channel
    pub delay: usize,
    /// Opaque configuration header (MPEG-4 AudioSpecificConfig)
    pub config_header: Vec<u8>,
}

impl StreamInfo {
    /// Interleaved samples in one frame.
    pub fn samples_per_frame(&self) -> usize {
        self.frame_size * self.channels as usize
    }

    pub fn frame_duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_size as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Configuration header as lowercase hex, the form SDP `config=`
    /// parameters use.
    pub fn config_hex(&self) -> String {
        self.config_header
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// True if the geometry can describe real audio.
    pub fn is_valid(&self) -> bool {
        self.frame_size > 0 && self.channels > 0
    }
}

/// Holds the StreamInfo of one handle once discovered.
#[derive(Debug, Default)]
pub struct StreamInfoCache {
    info: Option<StreamInfo>,
}

impl StreamInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&StreamInfo> {
        self.info.as_ref()
    }

    pub fn is_known(&self) -> bool {
        self.info.is_some()
    }

    /// Stores `info` unless facts are already known. Frame size is constant
    /// for the lifetime of a handle, so the first report wins.
    ///
    /// Returns true if this call populated the cache.
    pub fn record(&mut self, info: StreamInfo) -> bool {
        if self.info.is_some() {
            return false;
        }
        self.info = Some(info);
        true
    }

    /// Forgets the cached facts; the next report repopulates them.
    pub fn invalidate(&mut self) {
        self.info = None;
    }
}
