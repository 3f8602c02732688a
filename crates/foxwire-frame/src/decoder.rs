use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::codec::{Frame, CHECKSUM_SIZE, HEADER_SIZE, MAGIC};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Incremental frame decoder over a noisy byte stream.
///
/// `feed` may be called repeatedly as bytes trickle in from the modem; only
/// the unconsumed tail is retained between calls. Corrupt input is recovered
/// from by scanning forward to the next magic marker — a single garbled frame
/// never desynchronizes the frames behind it.
pub struct FrameDecoder {
    buf: BytesMut,
    max_payload: usize,
    resyncs: u64,
}

impl FrameDecoder {
    /// Create a decoder with the default payload limit.
    pub fn new() -> Self {
        Self::with_max_payload(crate::codec::DEFAULT_MAX_PAYLOAD)
    }

    /// Create a decoder with an explicit payload limit.
    ///
    /// Frames declaring a larger payload are treated as line noise and
    /// resynchronized past, so both ends must agree on the limit.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload,
            resyncs: 0,
        }
    }

    /// Append received bytes and decode every complete frame now available.
    ///
    /// Never blocks. Returns zero or more frames; anything between frames
    /// that does not checksum is skipped.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        if !bytes.is_empty() {
            self.buf.extend_from_slice(bytes);
        }

        let mut frames = Vec::new();
        loop {
            if !self.align() {
                break;
            }
            if self.buf.len() < HEADER_SIZE {
                break; // header still incomplete
            }

            let flags = self.buf[2];
            let length = u16::from_le_bytes([self.buf[3], self.buf[4]]) as usize;
            if length > self.max_payload {
                // Implausible length; the marker was noise.
                self.slip("declared length over limit");
                continue;
            }

            let total = HEADER_SIZE + length + CHECKSUM_SIZE;
            if self.buf.len() < total {
                break; // wait for the rest of the frame
            }

            let mut hasher = crc32fast::Hasher::new();
            hasher.update(&self.buf[2..HEADER_SIZE + length]);
            let actual = hasher.finalize();
            let declared =
                u32::from_le_bytes(self.buf[total - CHECKSUM_SIZE..total].try_into().unwrap());
            if actual != declared {
                self.slip("checksum mismatch");
                continue;
            }

            self.buf.advance(HEADER_SIZE);
            let payload = self.buf.split_to(length).freeze();
            self.buf.advance(CHECKSUM_SIZE);
            trace!(len = payload.len(), flags, "frame decoded");
            frames.push(Frame { flags, payload });
        }
        frames
    }

    /// Bytes currently retained awaiting more input.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer holds the start of a frame that has not finished
    /// arriving.
    pub fn has_partial(&self) -> bool {
        self.buf.len() >= MAGIC.len() && self.buf[..MAGIC.len()] == MAGIC
    }

    /// How many times decoding lost sync and had to scan for a new marker.
    pub fn resync_count(&self) -> u64 {
        self.resyncs
    }

    /// Discard bytes until the buffer starts with a full magic marker.
    ///
    /// Returns false when the buffer is drained down to (at most) a possible
    /// marker prefix and decoding should wait for more input.
    fn align(&mut self) -> bool {
        let mut skipped = 0usize;
        loop {
            match self.buf.iter().position(|&b| b == MAGIC[0]) {
                Some(pos) => {
                    skipped += pos;
                    self.buf.advance(pos);
                    if self.buf.len() < MAGIC.len() {
                        // Could be a marker split across feeds; keep it.
                        self.note_skipped(skipped);
                        return false;
                    }
                    if self.buf[1] == MAGIC[1] {
                        self.note_skipped(skipped);
                        return true;
                    }
                    // False start; step past the first byte and rescan.
                    self.buf.advance(1);
                    skipped += 1;
                }
                None => {
                    skipped += self.buf.len();
                    self.buf.clear();
                    self.note_skipped(skipped);
                    return false;
                }
            }
        }
    }

    /// Step one byte past the current marker candidate and rescan.
    fn slip(&mut self, reason: &str) {
        self.buf.advance(1);
        self.resyncs += 1;
        debug!(reason, resyncs = self.resyncs, "frame sync lost, scanning for next marker");
    }

    fn note_skipped(&self, skipped: usize) {
        if skipped > 0 {
            trace!(skipped, "discarded inter-frame noise");
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::codec::{encode_frame, DEFAULT_MAX_PAYLOAD, FLAG_ENCRYPTED};

    fn wire(payload: &[u8], encrypted: bool) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(payload, encrypted, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn roundtrip_single_frame() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&wire(b"HELLO", false));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"HELLO");
        assert!(!frames[0].encrypted());
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn roundtrip_all_lengths_up_to_max() {
        let mut decoder = FrameDecoder::new();
        for len in (0..=512).chain([DEFAULT_MAX_PAYLOAD]) {
            let payload: Vec<u8> = (0..len).map(|i| (i * 31) as u8).collect();
            let frames = decoder.feed(&wire(&payload, false));
            assert_eq!(frames.len(), 1, "length {len}");
            assert_eq!(frames[0].payload.as_ref(), payload.as_slice());
        }
        assert_eq!(decoder.resync_count(), 0);
    }

    #[test]
    fn encrypted_flag_survives_decode() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&wire(b"sealed", true));
        assert_eq!(frames.len(), 1);
        assert!(frames[0].encrypted());
        assert_eq!(frames[0].flags, FLAG_ENCRYPTED);
    }

    #[test]
    fn incremental_feed_byte_by_byte() {
        let mut decoder = FrameDecoder::new();
        let stream = wire(b"trickle", false);

        let mut decoded = Vec::new();
        for byte in &stream {
            decoded.extend(decoder.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].payload.as_ref(), b"trickle");
    }

    #[test]
    fn feed_with_no_bytes_is_idempotent() {
        let mut decoder = FrameDecoder::new();
        let partial = &wire(b"waiting", false)[..6];
        assert!(decoder.feed(partial).is_empty());
        let pending = decoder.pending();

        assert!(decoder.feed(&[]).is_empty());
        assert_eq!(decoder.pending(), pending);
        assert!(decoder.has_partial());
    }

    #[test]
    fn two_frames_with_garbage_between() {
        let mut stream = wire(b"first", false);
        stream.extend_from_slice(&[0x17, 0x2A, 0x99]);
        stream.extend_from_slice(&wire(b"second", false));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&stream);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload.as_ref(), b"first");
        assert_eq!(frames[1].payload.as_ref(), b"second");
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn garbage_containing_marker_bytes_is_skipped() {
        let mut stream = vec![MAGIC[0], MAGIC[1], 0x00, 0xFF, 0xFF]; // fake header, absurd length
        stream.extend_from_slice(&wire(b"real", false));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"real");
        assert!(decoder.resync_count() > 0);
    }

    #[test]
    fn flipped_payload_byte_recovers_following_frames() {
        let mut stream = wire(b"alpha", false);
        let mut corrupt = wire(b"bravo", false);
        corrupt[HEADER_SIZE + 2] ^= 0x40; // flip one payload byte
        stream.extend_from_slice(&corrupt);
        stream.extend_from_slice(&wire(b"charlie", false));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&stream);
        let payloads: Vec<&[u8]> = frames.iter().map(|f| f.payload.as_ref()).collect();
        assert_eq!(payloads, vec![b"alpha".as_ref(), b"charlie".as_ref()]);
        assert!(decoder.resync_count() > 0);
    }

    #[test]
    fn truncated_frame_then_next_frame_recovers() {
        let full = wire(b"lost-to-fading", false);
        let mut stream = full[..full.len() - 6].to_vec(); // tail never arrives
        stream.extend_from_slice(&wire(b"next", false));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"next");
    }

    #[test]
    fn marker_split_across_feeds() {
        let stream = wire(b"split", false);
        let mut decoder = FrameDecoder::new();

        assert!(decoder.feed(&stream[..1]).is_empty()); // just 0xAA so far
        let frames = decoder.feed(&stream[1..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"split");
    }

    #[test]
    fn pure_noise_is_discarded() {
        let mut decoder = FrameDecoder::new();
        let noise: Vec<u8> = (0..200).map(|i| (i * 7 + 3) as u8).collect();
        assert!(decoder.feed(&noise).is_empty());
        // At most a possible marker prefix survives.
        assert!(decoder.pending() <= MAGIC.len());
    }

    #[test]
    fn over_limit_declared_length_resyncs() {
        let mut decoder = FrameDecoder::with_max_payload(16);
        let mut stream = wire(b"0123456789ABCDEF0", false); // 17 bytes, over the limit
        stream.extend_from_slice(&wire(b"ok", false));

        let frames = decoder.feed(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"ok");
    }

    #[test]
    fn back_to_back_frames_decode_in_order() {
        let mut stream = Vec::new();
        for word in ["one", "two", "three", "four"] {
            stream.extend_from_slice(&wire(word.as_bytes(), false));
        }

        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(&stream);
        let payloads: Vec<&[u8]> = frames.iter().map(|f| f.payload.as_ref()).collect();
        assert_eq!(
            payloads,
            vec![b"one".as_ref(), b"two".as_ref(), b"three".as_ref(), b"four".as_ref()]
        );
    }
}
