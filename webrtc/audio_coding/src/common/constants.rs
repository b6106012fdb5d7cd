//! Common constants shared across codec modules

/// Logging intervals for frame processing
pub mod logging {
    /// Log progress every N frames (encoder)
    pub const ENCODER_LOG_INTERVAL: u64 = 100;
    /// Log progress every N frames (decoder)
    pub const DECODER_LOG_INTERVAL: u64 = 100;
}

/// AAC framing and engine limits
pub mod aac {
    /// Samples per channel in one frame when the engine does not say
    /// otherwise: 20 ms at 48 kHz.
    pub const DEFAULT_FRAME_SIZE: usize = 960;

    /// Granule length used by the low-delay profiles.
    pub const LOW_DELAY_GRANULE: usize = 480;

    /// Largest interleaved decode output the pipeline ever asks for
    /// (2048 samples, 8 channels, doubled for SBR).
    pub const MAX_DECODE_BUFFER_SAMPLES: usize = 2048 * 2 * 8;

    /// Bytes the decoder engine buffers internally between fill calls.
    pub const INTERNAL_BITSTREAM_BUFFER: usize = 8192;

    /// Engine concealment method: energy interpolation.
    pub const CONCEAL_METHOD_ENERGY_INTERPOLATION: i32 = 2;

    /// SBR mode value that lets the engine decide.
    pub const SBR_MODE_DEFAULT: i32 = -1;

    /// Channel order value for WAV (interleaved, L/R/C/...) ordering.
    pub const CHANNEL_ORDER_WAV: i32 = 1;
}
