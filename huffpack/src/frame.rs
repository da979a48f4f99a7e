//! Header + payload framing.
//!
//! Two layouts are understood:
//!
//! ```text
//! LengthPrefixed:  "HUF1" | header length (u32, little endian) | header | payload
//! Delimited:       header | DELIMITER | payload
//! ```
//!
//! The header is the frequency map as a JSON object. `serde_json` escapes every control character,
//! so a header never contains a NUL byte, which makes the first occurrence of [`DELIMITER`] the
//! real boundary even if the same bytes show up again inside the payload.

use crate::error::{Error, Result};
use crate::frequency::FrequencyMap;

pub const MAGIC: &[u8; 4] = b"HUF1";
pub const DELIMITER: &[u8] = b"\0\0HUFFMAN\0\0";

const LENGTH_PREFIX_SIZE: usize = 4;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FrameFormat {
    #[default]
    LengthPrefixed,
    Delimited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frequencies: FrequencyMap,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn encode(&self, format: FrameFormat) -> Result<Vec<u8>> {
        let header = serde_json::to_vec(&self.frequencies)?;
        let mut buffer = Vec::with_capacity(header.len() + self.payload.len() + 16);

        match format {
            FrameFormat::LengthPrefixed => {
                let header_len = u32::try_from(header.len()).map_err(|_| {
                    Error::MalformedFrame(format!("header too long: {} bytes", header.len()))
                })?;

                buffer.extend_from_slice(MAGIC);
                buffer.extend_from_slice(&header_len.to_le_bytes());
                buffer.extend_from_slice(&header);
            }
            FrameFormat::Delimited => {
                buffer.extend_from_slice(&header);
                buffer.extend_from_slice(DELIMITER);
            }
        }
        buffer.extend_from_slice(&self.payload);

        log::debug!(
            "framed {:?}: header {} bytes, payload {} bytes",
            format,
            header.len(),
            self.payload.len()
        );

        Ok(buffer)
    }

    pub fn decode(data: &[u8]) -> Result<Frame> {
        let (header, payload) = split(data)?;

        let frequencies: FrequencyMap = serde_json::from_slice(header)?;
        if frequencies.is_empty() {
            return Err(Error::MalformedFrame("header has no symbols".to_string()));
        }

        Ok(Frame {
            frequencies,
            payload: payload.to_vec(),
        })
    }
}

pub fn detect_format(data: &[u8]) -> FrameFormat {
    if data.starts_with(MAGIC) {
        FrameFormat::LengthPrefixed
    } else {
        FrameFormat::Delimited
    }
}

/// Splits a frame into its header and payload bytes.
pub fn split(data: &[u8]) -> Result<(&[u8], &[u8])> {
    match detect_format(data) {
        FrameFormat::LengthPrefixed => {
            let rest = &data[MAGIC.len()..];
            if rest.len() < LENGTH_PREFIX_SIZE {
                return Err(Error::MalformedFrame("truncated length prefix".to_string()));
            }

            let (prefix, rest) = rest.split_at(LENGTH_PREFIX_SIZE);
            let mut len_bytes = [0u8; LENGTH_PREFIX_SIZE];
            len_bytes.copy_from_slice(prefix);
            let header_len = u32::from_le_bytes(len_bytes) as usize;

            if header_len > rest.len() {
                return Err(Error::MalformedFrame(format!(
                    "header length {} exceeds frame size {}",
                    header_len,
                    rest.len()
                )));
            }

            Ok(rest.split_at(header_len))
        }
        FrameFormat::Delimited => {
            let position = data
                .windows(DELIMITER.len())
                .position(|window| window == DELIMITER)
                .ok_or_else(|| Error::MalformedFrame("delimiter not found".to_string()))?;

            Ok((&data[..position], &data[position + DELIMITER.len()..]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame(payload: Vec<u8>) -> Frame {
        Frame {
            frequencies: FrequencyMap::survey(b"aaabb"),
            payload,
        }
    }

    #[test]
    fn length_prefixed_layout() {
        let encoded = sample_frame(vec![0xe0]).encode(FrameFormat::LengthPrefixed).unwrap();

        let header = br#"{"a":3,"b":2}"#;
        let mut expected = b"HUF1".to_vec();
        expected.extend_from_slice(&(header.len() as u32).to_le_bytes());
        expected.extend_from_slice(header);
        expected.push(0xe0);

        assert_eq!(encoded, expected);
        assert_eq!(Frame::decode(&encoded).unwrap(), sample_frame(vec![0xe0]));
    }

    #[test]
    fn delimited_layout() {
        let encoded = sample_frame(vec![0xe0]).encode(FrameFormat::Delimited).unwrap();

        let mut expected = br#"{"a":3,"b":2}"#.to_vec();
        expected.extend_from_slice(DELIMITER);
        expected.push(0xe0);

        assert_eq!(encoded, expected);
        assert_eq!(detect_format(&encoded), FrameFormat::Delimited);
        assert_eq!(Frame::decode(&encoded).unwrap(), sample_frame(vec![0xe0]));
    }

    #[test]
    fn delimiter_inside_payload_is_kept() {
        let mut payload = vec![1, 2, 3];
        payload.extend_from_slice(DELIMITER);
        payload.extend_from_slice(&[4, 5]);
        payload.extend_from_slice(DELIMITER);

        let frame = sample_frame(payload);
        let encoded = frame.encode(FrameFormat::Delimited).unwrap();

        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn empty_payload_is_allowed_by_the_framing() {
        let frame = sample_frame(Vec::new());
        for format in [FrameFormat::LengthPrefixed, FrameFormat::Delimited] {
            let encoded = frame.encode(format).unwrap();
            assert_eq!(Frame::decode(&encoded).unwrap(), frame);
        }
    }

    #[test]
    fn malformed_frames_are_rejected() {
        let cases: [&[u8]; 9] = [
            b"",
            b"no delimiter here",
            b"HUF1\x05\x00",
            b"HUF1\xff\x00\x00\x00{}",
            b"not json\0\0HUFFMAN\0\0\x01",
            b"{}\0\0HUFFMAN\0\0\x01",
            b"{\"a\":0}\0\0HUFFMAN\0\0\x01",
            b"[\"a\",1]\0\0HUFFMAN\0\0",
            b"{\"a\":9223372036854775808,\"b\":9223372036854775808}\0\0HUFFMAN\0\0",
        ];

        for case in cases {
            assert!(
                matches!(Frame::decode(case), Err(Error::MalformedFrame(_))),
                "accepted {:?}",
                case
            );
        }
    }
}
