use crate::bitio::{pack, BitReader};
use crate::error::{Error, Result};
use crate::frame::{Frame, FrameFormat};
use crate::frequency::FrequencyMap;
use crate::huffman::{HuffmanTable, HuffmanTree};

#[derive(Debug, Default, Clone, Copy)]
pub struct CodecOptions {
    pub format: FrameFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    pub input_bytes: usize,
    pub output_bytes: usize,
    pub distinct_symbols: usize,
    pub payload_bits: u64,
}

pub fn compress(input: &[u8], options: &CodecOptions) -> Result<Vec<u8>> {
    compress_with_stats(input, options).map(|(frame, _)| frame)
}

pub fn compress_with_stats(
    input: &[u8],
    options: &CodecOptions,
) -> Result<(Vec<u8>, CompressionStats)> {
    let frequencies = FrequencyMap::survey(input);
    if frequencies.is_empty() {
        return Err(Error::EmptyInput);
    }
    log::debug!("frequencies: {:?}", frequencies);

    let tree = HuffmanTree::build(&frequencies)?;
    let table = HuffmanTable::from(&tree);
    let payload_bits = table.encoded_bit_len(&frequencies)?;

    let payload = pack(input, &table)?;
    let distinct_symbols = frequencies.len();
    let frame = Frame {
        frequencies,
        payload,
    }
    .encode(options.format)?;

    let stats = CompressionStats {
        input_bytes: input.len(),
        output_bytes: frame.len(),
        distinct_symbols,
        payload_bits,
    };
    log::info!(
        "compressed {} bytes into {} bytes ({} symbols, {} payload bits)",
        stats.input_bytes,
        stats.output_bytes,
        stats.distinct_symbols,
        stats.payload_bits
    );

    Ok((frame, stats))
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let frame = Frame::decode(data)?;
    let tree = HuffmanTree::build(&frame.frequencies)?;

    let output = decode_symbols(&tree, &frame.frequencies, &frame.payload)?;
    log::info!(
        "decompressed {} bytes into {} bytes",
        data.len(),
        output.len()
    );

    Ok(output)
}

/// Walks `payload` through `tree` until every symbol counted in `frequencies` has been emitted.
pub fn decode_symbols(
    tree: &HuffmanTree,
    frequencies: &FrequencyMap,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let num_symbols = frequencies.total();
    let table = HuffmanTable::from(tree);
    let expected_bits = table.encoded_bit_len(frequencies)?;
    let expected_bytes = expected_bits.div_ceil(8);

    if (payload.len() as u64) < expected_bytes {
        return Err(Error::CorruptPayload(format!(
            "payload holds {} bytes, {} needed",
            payload.len(),
            expected_bytes
        )));
    }
    if (payload.len() as u64) > expected_bytes {
        return Err(Error::CorruptPayload(format!(
            "{} trailing bytes after payload",
            payload.len() as u64 - expected_bytes
        )));
    }

    let mut reader = BitReader::new(payload);
    let mut output = Vec::with_capacity(num_symbols.min(expected_bits) as usize);
    let mut iter = tree.create_walk_iter();

    while (output.len() as u64) < num_symbols {
        let bit = reader.read_bit()?.ok_or_else(|| {
            Error::CorruptPayload(format!(
                "bitstream ended after {} of {} symbols",
                output.len(),
                num_symbols
            ))
        })?;

        if iter.leaf {
            // Single symbol alphabet: the placeholder bit only marks one occurrence.
            output.push(symbol_at(tree, iter.idx)?);
            continue;
        }

        iter = tree.walk(iter, bit);
        if iter.leaf {
            output.push(symbol_at(tree, iter.idx)?);
            iter = tree.create_walk_iter();
        }
    }

    Ok(output)
}

fn symbol_at(tree: &HuffmanTree, idx: usize) -> Result<u8> {
    tree.symbol(idx)
        .ok_or_else(|| Error::CorruptPayload(format!("node {idx} is not a leaf")))
}
