use audio_coding::aac::adts::AdtsHeader;
use audio_coding::aac::engine::{ConfigStep, EncoderParam};
use audio_coding::{
    AacDecoder, AacEncoder, AdapterState, AudioObjectType, CodecError, EncoderConfig,
    ReferenceDecoder, ReferenceEncoder, TransportType,
};
use logging::{LogLevel, Logger, MemoryLog};

const RATE: u32 = 48000;

fn logger() -> (Logger, MemoryLog) {
    Logger::in_memory(LogLevel::Debug)
}

fn lc_encoder(channels: u32) -> AacEncoder<ReferenceEncoder> {
    let (logger, _) = logger();
    AacEncoder::open(
        ReferenceEncoder::new(),
        EncoderConfig::new(AudioObjectType::Lc, RATE, channels),
        logger,
    )
    .unwrap()
}

fn adts_decoder() -> AacDecoder<ReferenceDecoder> {
    let (logger, _) = logger();
    AacDecoder::open(ReferenceDecoder::new(), TransportType::Adts, logger).unwrap()
}

fn encode_all(encoder: &mut AacEncoder<ReferenceEncoder>, pcm: &[i16]) -> Vec<u8> {
    let channels = encoder.config().channels as usize;
    let mut out = vec![0u8; encoder.max_output_bytes() * (pcm.len() / channels / 960 + 1)];
    let written = encoder.encode(pcm, pcm.len() / channels, &mut out).unwrap();
    out.truncate(written);
    out
}

fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| ((i * 37) % 20000) as i16 - 10000).collect()
}

#[test]
fn test_one_second_of_silence_round_trips() {
    let mut encoder = lc_encoder(1);
    let mut decoder = adts_decoder();
    let chunk = vec![0i16; 480];
    let mut packet = vec![0u8; encoder.max_output_bytes()];
    let mut pcm = vec![0i16; 4096];
    let mut decoded = 0;
    let mut packets = 0;

    for _ in 0..100 {
        let bytes = encoder.encode(&chunk, 480, &mut packet).unwrap();
        if bytes > 0 {
            packets += 1;
            decoded += decoder.decode(&packet[..bytes], &mut pcm).unwrap();
            assert!(pcm[..960].iter().all(|&s| s == 0));
        }
    }
    loop {
        let bytes = encoder.flush(&mut packet).unwrap();
        if bytes == 0 {
            break;
        }
        decoded += decoder.decode(&packet[..bytes], &mut pcm).unwrap();
    }

    assert_eq!(packets, 50);
    assert_eq!(decoded, 48000);
}

#[test]
fn test_single_frame_scenario() {
    let mut encoder = lc_encoder(1);
    let mut decoder = adts_decoder();
    let pcm = ramp(960);

    let packet = encode_all(&mut encoder, &pcm);
    assert!(!packet.is_empty());
    assert!(packet.len() <= encoder.max_output_bytes());
    assert_eq!(encoder.frame_size(), 960);

    let mut out = vec![0i16; 2048];
    assert_eq!(decoder.decode(&packet, &mut out).unwrap(), 960);
    assert_eq!(&out[..960], pcm.as_slice());

    let info = decoder.stream_info().unwrap();
    assert_eq!(info.frame_size, 960);
    assert_eq!(info.channels, 1);
    assert_eq!(info.sample_rate, RATE);
    assert_eq!(info.config_hex(), "118c");
    assert_eq!(decoder.channels(), Some(1));
}

#[test]
fn test_stereo_is_sample_exact() {
    let mut encoder = lc_encoder(2);
    let mut decoder = adts_decoder();
    let pcm = ramp(1920);

    let packet = encode_all(&mut encoder, &pcm);
    let mut out = vec![0i16; 4096];
    assert_eq!(decoder.decode(&packet, &mut out).unwrap(), 960);
    assert_eq!(&out[..1920], pcm.as_slice());
}

#[test]
fn test_multi_frame_packet() {
    let mut encoder = lc_encoder(1);
    let mut decoder = adts_decoder();
    let pcm = ramp(2880);

    let packet = encode_all(&mut encoder, &pcm);
    assert_eq!(decoder.packet_duration(&packet).unwrap(), Some(2880));

    let mut out = vec![0i16; 4096];
    assert_eq!(decoder.decode(&packet, &mut out).unwrap(), 2880);
    assert_eq!(&out[..2880], pcm.as_slice());
    assert_eq!(decoder.prior_samples(), Some(960));
}

#[test]
fn test_packet_split_across_calls() {
    let mut encoder = lc_encoder(1);
    let mut decoder = adts_decoder();
    let pcm = ramp(960);
    let packet = encode_all(&mut encoder, &pcm);
    let mut out = vec![0i16; 2048];

    assert_eq!(decoder.decode(&[], &mut out).unwrap(), 0);
    assert_eq!(decoder.decode(&packet[..1000], &mut out).unwrap(), 0);
    assert!(decoder.stream_info().is_none());
    assert_eq!(decoder.decode(&packet[1000..], &mut out).unwrap(), 960);
    assert_eq!(&out[..960], pcm.as_slice());
}

#[test]
fn test_small_output_keeps_buffered_frame() {
    let mut encoder = lc_encoder(1);
    let mut decoder = adts_decoder();
    let packet = encode_all(&mut encoder, &ramp(960));

    let mut small = vec![0i16; 100];
    let err = decoder.decode(&packet, &mut small).unwrap_err();
    assert!(matches!(err, CodecError::BufferOverflow { available: 100, .. }));

    let mut out = vec![0i16; 960];
    assert_eq!(decoder.decode(&[], &mut out).unwrap(), 960);
}

#[test]
fn test_overflow_retry_decodes_packet_once() {
    let mut encoder = lc_encoder(1);
    let mut decoder = adts_decoder();
    let first = encode_all(&mut encoder, &ramp(960));
    let second = encode_all(&mut encoder, &vec![500i16; 960]);
    let mut out = vec![0i16; 4096];
    assert_eq!(decoder.decode(&first, &mut out).unwrap(), 960);

    let mut small = vec![0i16; 100];
    let err = decoder.decode(&second, &mut small).unwrap_err();
    assert!(matches!(
        err,
        CodecError::BufferOverflow {
            required: Some(960),
            available: 100
        }
    ));

    assert_eq!(decoder.decode(&second, &mut out).unwrap(), 960);
    assert!(out[..960].iter().all(|&s| s == 500));
    assert_eq!(decoder.decode(&[], &mut out).unwrap(), 0);
}

#[test]
fn test_reset_drops_stale_bytes() {
    let mut encoder = lc_encoder(1);
    let mut decoder = adts_decoder();
    let first = encode_all(&mut encoder, &vec![100i16; 960]);
    let second = encode_all(&mut encoder, &vec![200i16; 960]);
    let third = encode_all(&mut encoder, &vec![300i16; 960]);
    let mut out = vec![0i16; 4096];
    assert_eq!(decoder.decode(&first, &mut out).unwrap(), 960);

    // half of a frame arrives, then the stream jumps
    assert_eq!(decoder.decode(&second[..1000], &mut out).unwrap(), 0);
    decoder.reset().unwrap();
    assert_eq!(decoder.decode(&third, &mut out).unwrap(), 960);
    assert!(out[..960].iter().all(|&s| s == 300));
    assert_eq!(decoder.prior_samples(), Some(960));
    assert_eq!(decoder.stream_info().map(|info| info.frame_size), Some(960));
}

#[test]
fn test_concealment_after_decode() {
    let mut encoder = lc_encoder(1);
    let mut decoder = adts_decoder();
    let mut out = vec![0i16; 4096];

    let err = decoder.conceal(1, &mut out).unwrap_err();
    assert!(matches!(err, CodecError::State(_)));

    let packet = encode_all(&mut encoder, &vec![8000i16; 960]);
    decoder.decode(&packet, &mut out).unwrap();

    assert_eq!(decoder.conceal(2, &mut out).unwrap(), 1920);
    assert_eq!(out[0], 4000);
    assert_eq!(out[960], 2000);

    // clamped to what the buffer holds
    let mut short = vec![0i16; 1000];
    assert_eq!(decoder.conceal(3, &mut short).unwrap(), 1000);
    assert_eq!(decoder.conceal(0, &mut out).unwrap(), 0);
}

#[test]
fn test_redundant_copy_is_decoded() {
    // low-delay frames stay under the 10-bit block length limit
    let config =
        EncoderConfig::new(AudioObjectType::Eld, RATE, 1).with_transport(TransportType::Adts);
    let (logger, _) = logger();
    let mut encoder = AacEncoder::open(ReferenceEncoder::new(), config, logger).unwrap();
    let mut decoder = adts_decoder();
    let earlier = encode_all(&mut encoder, &vec![100i16; 480]);
    let current = encode_all(&mut encoder, &vec![200i16; 480]);
    assert!(earlier.len() < 1024);

    let offset: u16 = 480;
    let len = earlier.len();
    let mut red = vec![
        0x80 | 97,
        (offset >> 6) as u8,
        (((offset & 0x3F) as u8) << 2) | ((len >> 8) as u8 & 0x03),
        (len & 0xFF) as u8,
        97,
    ];
    red.extend_from_slice(&earlier);
    red.extend_from_slice(&current);

    assert_eq!(decoder.packet_duration_redundant(&red).unwrap(), Some(480));
    // a bare frame carries no redundancy: falls back to the frame itself
    assert_eq!(decoder.packet_duration_redundant(&current).unwrap(), Some(480));

    let mut out = vec![0i16; 2048];
    assert_eq!(decoder.decode_redundant(&red, &mut out).unwrap(), 480);
    assert!(out[..480].iter().all(|&s| s == 100));

    assert_eq!(decoder.decode_redundant(&current, &mut out).unwrap(), 480);
    assert!(out[..480].iter().all(|&s| s == 200));
}

#[test]
fn test_corrupt_frame_is_decode_error() {
    let mut decoder = adts_decoder();
    // odd payload length cannot hold 16-bit samples
    let mut frame = AdtsHeader::new(2, 3, 1, 3).to_bytes().to_vec();
    frame.extend_from_slice(&[1, 2, 3]);

    let mut out = vec![0i16; 2048];
    let err = decoder.decode(&frame, &mut out).unwrap_err();
    assert!(matches!(err, CodecError::Decode(_)));
    assert_eq!(decoder.state(), AdapterState::Ready);
}

#[test]
fn test_eld_defaults_need_loas() {
    let (logger, log) = logger();
    let result = AacEncoder::open(
        ReferenceEncoder::new(),
        EncoderConfig::new(AudioObjectType::Eld, RATE, 1),
        logger,
    );
    match result {
        Err(CodecError::EngineInit { step, .. }) => {
            assert_eq!(step, ConfigStep::Param(EncoderParam::Transmux));
        }
        other => panic!("expected init failure, got {:?}", other.map(|_| ())),
    }
    assert!(log.contains("configuration failed at transport"));
}

#[test]
fn test_eld_over_adts_uses_granule() {
    let (logger, log) = logger();
    let config =
        EncoderConfig::new(AudioObjectType::Eld, RATE, 1).with_transport(TransportType::Adts);
    let mut encoder = AacEncoder::open(ReferenceEncoder::new(), config, logger).unwrap();
    assert_eq!(encoder.frame_size(), 480);
    assert!(log.contains("frame_length=480"));

    let mut decoder = adts_decoder();
    let packet = encode_all(&mut encoder, &ramp(480));
    let mut out = vec![0i16; 1024];
    assert_eq!(decoder.decode(&packet, &mut out).unwrap(), 480);
}

#[test]
fn test_decoder_rejects_other_framings() {
    let (logger, _) = logger();
    let result = AacDecoder::open(ReferenceDecoder::new(), TransportType::Loas, logger);
    assert!(matches!(
        result,
        Err(CodecError::EngineInit {
            step: ConfigStep::Transport,
            ..
        })
    ));
}

#[test]
fn test_live_bitrate_change() {
    let mut encoder = lc_encoder(1);
    encoder.set_bitrate(64000).unwrap();
    assert_eq!(encoder.config().bitrate, 64000);

    let err = encoder.set_bitrate(100).unwrap_err();
    assert!(matches!(err, CodecError::ParameterRejected { .. }));
    assert_eq!(encoder.config().bitrate, 64000);
    assert_eq!(encoder.state(), AdapterState::Ready);
}

#[test]
fn test_close_twice() {
    let mut encoder = lc_encoder(1);
    let mut decoder = adts_decoder();

    encoder.close().unwrap();
    assert!(matches!(encoder.close(), Err(CodecError::Closed)));
    let mut out = vec![0u8; 4096];
    assert!(matches!(
        encoder.encode(&[0; 960], 960, &mut out),
        Err(CodecError::Closed)
    ));

    decoder.close().unwrap();
    assert!(matches!(decoder.close(), Err(CodecError::Closed)));
    assert!(matches!(
        decoder.packet_duration(&[0xFF]),
        Err(CodecError::Closed)
    ));
}
