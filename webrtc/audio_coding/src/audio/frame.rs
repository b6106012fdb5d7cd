//! Owned PCM frame passed between the codec adapters and a pipeline.

/// Audio sample data type (16-bit PCM)
pub type AudioSample = i16;

/// Interleaved PCM samples with their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    /// Interleaved samples, `frame_count() * channels` of them
    pub samples: Vec<AudioSample>,
    pub channels: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Set when the samples were synthesized for lost packets
    pub concealed: bool,
}

impl AudioFrame {
    pub fn new(samples: Vec<AudioSample>, channels: u32, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
            concealed: false,
        }
    }

    /// Frame produced by packet-loss concealment.
    pub fn concealed(samples: Vec<AudioSample>, channels: u32, sample_rate: u32) -> Self {
        Self {
            concealed: true,
            ..Self::new(samples, channels, sample_rate)
        }
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 * 1000.0 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_geometry() {
        let frame = AudioFrame::new(vec![0; 1920], 2, 48000);
        assert_eq!(frame.frame_count(), 960);
        assert!((frame.duration_ms() - 20.0).abs() < f64::EPSILON);
        assert!(!frame.concealed);
    }

    #[test]
    fn test_degenerate_frames() {
        let frame = AudioFrame::new(vec![1, 2], 0, 0);
        assert_eq!(frame.frame_count(), 0);
        assert_eq!(frame.duration_ms(), 0.0);
        assert!(AudioFrame::concealed(Vec::new(), 1, 48000).is_empty());
    }
}
