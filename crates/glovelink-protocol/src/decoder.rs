//! Frame decoding.
//!
//! A frame is one line of comma-separated channel values. Decoding is a
//! pure validation step: the first five fields must parse as integers,
//! extra fields are ignored, and values are passed through unmodified.
//! Range enforcement belongs to the source, not the decoder.
//!
//! ```
//! use glovelink_protocol::decode;
//!
//! let sample = decode(" 10, 20 ,30,40,50").unwrap();
//! assert_eq!(sample.channels(), &[10, 20, 30, 40, 50]);
//!
//! assert!(decode("a,20,30,40,50").is_err());
//! assert!(decode("10,20,30,40").is_err());
//! ```

use chrono::{DateTime, Local};
use glovelink_core::constants::{CHANNEL_COUNT, FIELD_SEPARATOR, LINE_TERMINATOR};
use glovelink_core::{Error, Result, Sample};

/// Decode a frame, stamping the sample with the current wall-clock second.
///
/// # Errors
/// Returns `Error::MalformedFrame` if the frame has fewer than five fields
/// or any of the first five is not an integer.
pub fn decode(frame: &str) -> Result<Sample> {
    decode_at(frame, Local::now())
}

/// Decode a frame with an explicit timestamp.
///
/// # Errors
/// Same as [`decode`].
pub fn decode_at(frame: &str, timestamp: DateTime<Local>) -> Result<Sample> {
    let fields: Vec<&str> = frame.split(FIELD_SEPARATOR).map(str::trim).collect();

    if fields.len() < CHANNEL_COUNT {
        return Err(Error::malformed(
            frame,
            format!("expected {CHANNEL_COUNT} fields, got {}", fields.len()),
        ));
    }

    let mut channels = [0i32; CHANNEL_COUNT];
    for (slot, field) in channels.iter_mut().zip(&fields) {
        *slot = field
            .parse()
            .map_err(|_| Error::malformed(frame, format!("'{field}' is not a number")))?;
    }

    Ok(Sample::at(timestamp, channels))
}

/// Format channel values as a newline-terminated wire frame.
///
/// ```
/// use glovelink_protocol::encode_frame;
///
/// assert_eq!(encode_frame(&[10, 20, 30, 40, 50]), "10,20,30,40,50\n");
/// ```
#[must_use]
pub fn encode_frame(channels: &[i32; CHANNEL_COUNT]) -> String {
    let mut line = channels
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(&FIELD_SEPARATOR.to_string());
    line.push(LINE_TERMINATOR);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_decode_valid_frame() {
        let sample = decode("10,20,30,40,50").unwrap();
        assert_eq!(sample.channels(), &[10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let sample = decode("  10 ,\t20, 30 ,40 , 50  ").unwrap();
        assert_eq!(sample.channels(), &[10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let sample = decode("1,2,3,4,5,6,junk").unwrap();
        assert_eq!(sample.channels(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_decode_passes_out_of_range_values_through() {
        let sample = decode("-5,200,30,40,50").unwrap();
        assert_eq!(sample.channels(), &[-5, 200, 30, 40, 50]);
        assert!(!sample.is_in_range());
    }

    #[rstest]
    #[case("a,20,30,40,50")]
    #[case("10,20,30,40")]
    #[case("10,20,,40,50")]
    #[case("10,20,3.5,40,50")]
    #[case("")]
    #[case("garbage")]
    #[case("10,20,30,40,NaN")]
    fn test_decode_rejects(#[case] frame: &str) {
        let result = decode(frame);
        assert!(matches!(result, Err(Error::MalformedFrame { .. })));
    }

    #[test]
    fn test_rejection_names_the_frame() {
        let err = decode("10,20,30,40").unwrap_err();
        assert!(err.to_string().contains("10,20,30,40"));
        assert!(err.to_string().contains("got 4"));
    }

    #[test]
    fn test_decode_at_uses_given_time() {
        let now = Local::now();
        let sample = decode_at("1,2,3,4,5", now).unwrap();
        assert_eq!(sample.timestamp().timestamp(), now.timestamp());
    }

    #[test]
    fn test_encode_frame_decodes_back() {
        let line = encode_frame(&[0, 45, 90, 135, 180]);
        let sample = decode(line.trim_end()).unwrap();
        assert_eq!(sample.channels(), &[0, 45, 90, 135, 180]);
    }
}
