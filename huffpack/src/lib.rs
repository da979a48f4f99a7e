//! # huffpack
//!
//! Lossless byte-oriented Huffman compression.
//!
//! The frame carries only the symbol frequencies; the decoder rebuilds the same tree from them,
//! so tree construction must be deterministic (ties break by insertion order). The exact bit
//! count of the payload follows from the frequencies as well, which lets the final partial byte
//! be zero-padded without losing its bits.
//!
//! ```
//! use huffpack::{compress, decompress, CodecOptions};
//!
//! let frame = compress(b"aaabb", &CodecOptions::default())?;
//! assert_eq!(decompress(&frame)?, b"aaabb");
//! # Ok::<(), huffpack::Error>(())
//! ```

pub mod bitio;
pub mod codec;
pub mod error;
pub mod frame;
pub mod frequency;
pub mod huffman;

pub use codec::{compress, compress_with_stats, decompress, CodecOptions, CompressionStats};
pub use error::{Error, Result};
pub use frame::{Frame, FrameFormat};
pub use frequency::FrequencyMap;
pub use huffman::{HuffmanTable, HuffmanTree, PrefixCode};
