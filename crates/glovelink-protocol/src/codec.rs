//! Tokio codec for glove sample streams.
//!
//! Some bridges expose the glove as a plain byte stream (USB serial, a TCP
//! relay) instead of BLE notifications. `GloveCodec` wraps the
//! [`FrameReassembler`] and the decoder so such a stream can be read with
//! Tokio's `FramedRead`:
//!
//! ```text
//! byte stream -> FrameReassembler -> frame -> decode -> Sample
//! Sample -> encode_frame -> "a,b,c,d,e\n"
//! ```
//!
//! Malformed frames are dropped and counted, never returned as errors, so a
//! single garbled line does not end the stream.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use tokio_util::codec::FramedRead;
//! use glovelink_protocol::GloveCodec;
//!
//! # async fn example(port: tokio::io::DuplexStream) {
//! let mut samples = FramedRead::new(port, GloveCodec::new());
//! while let Some(Ok(sample)) = samples.next().await {
//!     println!("{sample}");
//! }
//! # }
//! ```

use bytes::BytesMut;
use std::collections::VecDeque;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::{FrameReassembler, decoder};
use glovelink_core::{Error, Result, Sample};

/// Codec decoding glove frames into [`Sample`]s.
#[derive(Debug, Default)]
pub struct GloveCodec {
    reassembler: FrameReassembler,

    /// Samples decoded from the last chunk but not yet yielded.
    pending: VecDeque<Sample>,

    /// Frames rejected by the decoder.
    malformed: u64,
}

impl GloveCodec {
    /// Create a codec with the default reassembly limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with a custom reassembly limit.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            reassembler: FrameReassembler::with_limit(limit),
            ..Self::default()
        }
    }

    /// Frames dropped by the decoder so far.
    pub fn malformed_count(&self) -> u64 {
        self.malformed
    }

    /// Safety-valve resets in the underlying reassembler.
    pub fn overflow_count(&self) -> u64 {
        self.reassembler.overflow_count()
    }

    fn enqueue(&mut self, frame: &str) {
        match decoder::decode(frame) {
            Ok(sample) => self.pending.push_back(sample),
            Err(e) => {
                self.malformed += 1;
                debug!("dropping frame: {}", e);
            }
        }
    }
}

impl Decoder for GloveCodec {
    type Item = Sample;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Sample>> {
        if !src.is_empty() {
            let chunk = src.split();
            for frame in self.reassembler.push_bytes(&chunk) {
                self.enqueue(&frame);
            }
        }

        Ok(self.pending.pop_front())
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Sample>> {
        if let Some(sample) = self.decode(src)? {
            return Ok(Some(sample));
        }

        if let Some(frame) = self.reassembler.flush() {
            self.enqueue(&frame);
        }

        Ok(self.pending.pop_front())
    }
}

impl Encoder<Sample> for GloveCodec {
    type Error = Error;

    fn encode(&mut self, item: Sample, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(decoder::encode_frame(item.channels()).as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_partial_then_complete() {
        let mut codec = GloveCodec::new();
        let mut buffer = BytesMut::from(&b"10,20,3"[..]);

        assert!(codec.decode(&mut buffer).unwrap().is_none());
        assert!(buffer.is_empty());

        buffer.extend_from_slice(b"0,40,50\n");
        let sample = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(sample.channels(), &[10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_decode_multiple_samples_from_one_chunk() {
        let mut codec = GloveCodec::new();
        let mut buffer = BytesMut::from(&b"1,1,1,1,1\n2,2,2,2,2\n"[..]);

        let first = codec.decode(&mut buffer).unwrap().unwrap();
        let second = codec.decode(&mut buffer).unwrap().unwrap();

        assert_eq!(first.channels(), &[1, 1, 1, 1, 1]);
        assert_eq!(second.channels(), &[2, 2, 2, 2, 2]);
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_malformed_frames_are_skipped() {
        let mut codec = GloveCodec::new();
        let mut buffer = BytesMut::from(&b"a,b,c,d,e\n1,2\n3,3,3,3,3\n"[..]);

        let sample = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(sample.channels(), &[3, 3, 3, 3, 3]);
        assert_eq!(codec.malformed_count(), 2);
    }

    #[test]
    fn test_decode_eof_flushes_held_packet() {
        let mut codec = GloveCodec::new();
        let mut buffer = BytesMut::from(&b"1,1,1,1,1\n9,8,7,6,5"[..]);

        let first = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(first.channels(), &[1, 1, 1, 1, 1]);
        assert!(codec.decode(&mut buffer).unwrap().is_none());
        let sample = codec.decode_eof(&mut buffer).unwrap().unwrap();
        assert_eq!(sample.channels(), &[9, 8, 7, 6, 5]);
    }

    #[test]
    fn test_encode_writes_line() {
        let mut codec = GloveCodec::new();
        let mut buffer = BytesMut::new();

        codec
            .encode(Sample::now([0, 90, 180, 45, 135]), &mut buffer)
            .unwrap();

        assert_eq!(&buffer[..], b"0,90,180,45,135\n");
    }
}
