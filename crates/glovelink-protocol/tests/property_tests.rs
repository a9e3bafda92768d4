//! Property-based tests for frame reassembly and decoding.
//!
//! These tests use proptest to generate arbitrary chunkings of valid glove
//! streams and verify that reassembly is independent of where the transport
//! cuts the bytes.

use glovelink_protocol::{FrameReassembler, decode, encode_frame};
use proptest::prelude::*;

/// Strategy for generating in-range channel values.
fn valid_channels() -> impl Strategy<Value = [i32; 5]> {
    prop::array::uniform5(0i32..=180)
}

/// Strategy for a newline-terminated stream of 1-20 frames.
fn valid_stream() -> impl Strategy<Value = (Vec<[i32; 5]>, bool)> {
    (prop::collection::vec(valid_channels(), 1..20), any::<bool>())
}

/// Split `text` at the given (unsorted, possibly duplicate) cut points.
fn split_at_points(text: &str, mut cuts: Vec<usize>) -> Vec<&str> {
    cuts.iter_mut().for_each(|c| *c %= text.len() + 1);
    cuts.sort_unstable();

    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        chunks.push(&text[start..cut]);
        start = cut;
    }
    chunks.push(&text[start..]);
    chunks
}

/// A reassembler joining a stream that has already sent a line terminator.
fn joined_line_stream() -> FrameReassembler {
    let mut reassembler = FrameReassembler::new();
    reassembler.push("\n");
    reassembler
}

/// Split an unterminated packet after its first separator and no later than
/// its last one.
fn split_packet(packet: &str, seed: usize) -> (&str, &str) {
    let first = packet.find(',').unwrap_or(0);
    let last = packet.rfind(',').unwrap_or(0);
    let cut = first + 1 + seed % (last - first).max(1);
    packet.split_at(cut.min(packet.len()))
}

fn render((frames, crlf): &(Vec<[i32; 5]>, bool)) -> String {
    frames
        .iter()
        .map(|c| {
            let line = encode_frame(c);
            if *crlf { line.replace('\n', "\r\n") } else { line }
        })
        .collect()
}

proptest! {
    /// Property: the fixed two-frame stream reassembles identically under
    /// any chunking.
    #[test]
    fn prop_reference_stream_any_chunking(cuts in prop::collection::vec(any::<usize>(), 0..12)) {
        let stream = "10,20,30,40,50\n60,70,80,90,100\n";
        let mut reassembler = joined_line_stream();

        let frames: Vec<String> = split_at_points(stream, cuts)
            .into_iter()
            .flat_map(|chunk| reassembler.push(chunk))
            .collect();

        prop_assert_eq!(frames, vec!["10,20,30,40,50", "60,70,80,90,100"]);
        prop_assert!(reassembler.is_empty());
    }

    /// Property: any newline-terminated stream of valid frames yields every
    /// frame, in order, regardless of chunk boundaries.
    #[test]
    fn prop_stream_any_chunking(
        stream in valid_stream(),
        cuts in prop::collection::vec(any::<usize>(), 0..40),
    ) {
        let text = render(&stream);
        let mut reassembler = joined_line_stream();

        let decoded: Vec<[i32; 5]> = split_at_points(&text, cuts)
            .into_iter()
            .flat_map(|chunk| reassembler.push(chunk))
            .map(|frame| *decode(&frame).unwrap().channels())
            .collect();

        prop_assert_eq!(decoded, stream.0);
    }

    /// Property: unterminated packets split inside their field list all come
    /// out, in order.
    #[test]
    fn prop_fragmented_unterminated_packets(
        packets in prop::collection::vec(valid_channels(), 1..20),
        seeds in prop::collection::vec(any::<usize>(), 20),
    ) {
        let mut reassembler = FrameReassembler::new();
        let mut frames = Vec::new();

        for (channels, seed) in packets.iter().zip(&seeds) {
            let packet = encode_frame(channels).trim_end().to_string();
            let (head, tail) = split_packet(&packet, *seed);
            frames.extend(reassembler.push(head));
            frames.extend(reassembler.push(tail));
        }
        frames.extend(reassembler.flush());

        let decoded: Vec<[i32; 5]> = frames
            .iter()
            .map(|frame| *decode(frame).unwrap().channels())
            .collect();
        prop_assert_eq!(decoded, packets);
        prop_assert_eq!(reassembler.overflow_count(), 0);
    }

    /// Property: the buffer never exceeds its limit, whatever is pushed.
    #[test]
    fn prop_buffer_stays_bounded(chunks in prop::collection::vec(".{0,40}", 0..30)) {
        let mut reassembler = FrameReassembler::new();

        for chunk in &chunks {
            reassembler.push(chunk);
            prop_assert!(reassembler.len() <= reassembler.limit());
        }
    }

    /// Property: decoding never panics, and accepted frames have five
    /// integer fields.
    #[test]
    fn prop_decode_total(frame in "[0-9a-z, \\-]{0,30}") {
        if let Ok(sample) = decode(&frame) {
            prop_assert!(frame.split(',').count() >= 5);
            prop_assert_eq!(sample.channels().len(), 5);
        }
    }
}
