//! RTP redundancy payload (RFC 2198) parsing.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |F|   block PT  |  timestamp offset         |   block length    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Every redundant block has a 4-byte header with F set; the primary block
//! ends the header list with a single byte (F clear, payload type). Block
//! data follows in header order, primary last. Parsing borrows from the
//! packet and never allocates.

const REDUNDANT_HEADER_LEN: usize = 4;
const FOLLOW_BIT: u8 = 0x80;

/// One block of a redundancy packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedBlock<'a> {
    pub payload_type: u8,
    /// How far (in RTP clock units) the block precedes the primary
    pub timestamp_offset: u16,
    pub data: &'a [u8],
}

/// A structurally valid redundancy packet.
#[derive(Debug, Clone, Copy)]
pub struct RedPacket<'a> {
    headers: &'a [u8],
    redundant_count: usize,
    primary_payload_type: u8,
    payload: &'a [u8],
}

impl<'a> RedPacket<'a> {
    /// Walks the header list and checks that every announced block fits.
    ///
    /// Returns `None` for anything that is not a well-formed RFC 2198
    /// payload.
    pub fn parse(packet: &'a [u8]) -> Option<Self> {
        let mut pos = 0;
        let mut redundant_count = 0;
        let mut redundant_bytes = 0usize;

        let primary_payload_type = loop {
            let first = *packet.get(pos)?;
            if first & FOLLOW_BIT == 0 {
                pos += 1;
                break first & 0x7F;
            }
            let header = packet.get(pos..pos + REDUNDANT_HEADER_LEN)?;
            redundant_bytes += block_length(header);
            redundant_count += 1;
            pos += REDUNDANT_HEADER_LEN;
        };

        let payload = &packet[pos..];
        if redundant_bytes > payload.len() {
            return None;
        }

        Some(Self {
            headers: &packet[..pos - 1],
            redundant_count,
            primary_payload_type,
            payload,
        })
    }

    pub fn redundant_count(&self) -> usize {
        self.redundant_count
    }

    /// Redundant blocks, oldest first.
    pub fn redundant_blocks(&self) -> RedBlocks<'a> {
        RedBlocks {
            headers: self.headers,
            payload: self.payload,
        }
    }

    /// The redundant block closest in time to the primary.
    pub fn latest_redundant(&self) -> Option<RedBlock<'a>> {
        self.redundant_blocks().last()
    }

    pub fn primary(&self) -> RedBlock<'a> {
        let redundant_bytes: usize = self
            .headers
            .chunks_exact(REDUNDANT_HEADER_LEN)
            .map(block_length)
            .sum();
        RedBlock {
            payload_type: self.primary_payload_type,
            timestamp_offset: 0,
            data: &self.payload[redundant_bytes..],
        }
    }
}

/// Iterator over the redundant blocks of a [`RedPacket`].
pub struct RedBlocks<'a> {
    headers: &'a [u8],
    payload: &'a [u8],
}

impl<'a> Iterator for RedBlocks<'a> {
    type Item = RedBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.headers.get(..REDUNDANT_HEADER_LEN)?;
        let (data, rest) = self.payload.split_at(block_length(header));
        self.headers = &self.headers[REDUNDANT_HEADER_LEN..];
        self.payload = rest;
        Some(RedBlock {
            payload_type: header[0] & 0x7F,
            timestamp_offset: timestamp_offset(header),
            data,
        })
    }
}

fn timestamp_offset(header: &[u8]) -> u16 {
    (u16::from(header[1]) << 6) | (u16::from(header[2]) >> 2)
}

fn block_length(header: &[u8]) -> usize {
    ((usize::from(header[2]) & 0x03) << 8) | usize::from(header[3])
}
