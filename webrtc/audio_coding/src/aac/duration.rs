//! Packet duration estimates without a full decode.

use super::adts;
use super::engine::DecoderEngine;
use super::red::RedPacket;

/// Samples per channel carried by `packet`, or `None` when the engine's
/// framing cannot tell without decoding.
pub fn estimate_packet_duration<E: DecoderEngine>(engine: &E, packet: &[u8]) -> Option<usize> {
    if packet.is_empty() {
        return None;
    }
    engine.estimate_duration(packet)
}

/// True if `packet` is a redundancy payload that carries at least one
/// earlier frame.
///
/// Looks only at header bytes: same input, same answer, whatever state any
/// decoder is in. An ADTS frame is never mistaken for a redundancy header
/// even though its first byte has the follow bit set.
pub fn packet_has_fec(packet: &[u8]) -> bool {
    if adts::has_sync(packet) {
        return false;
    }
    RedPacket::parse(packet).is_some_and(|red| {
        red.redundant_blocks()
            .any(|block| block.timestamp_offset > 0 && !block.data.is_empty())
    })
}

/// Duration of the most recent redundant frame in `packet`, read from its
/// timestamp offset.
///
/// The offset is in RTP clock units, which for AAC is the sample rate, so
/// it equals samples per channel.
pub fn estimate_fec_duration(packet: &[u8]) -> Option<usize> {
    if !packet_has_fec(packet) {
        return None;
    }
    RedPacket::parse(packet)
        .and_then(|red| red.latest_redundant())
        .map(|block| usize::from(block.timestamp_offset))
}
