use crate::error::{Error, Result};
use crate::frequency::FrequencyMap;
use bitvec::prelude::*;
use std::cmp::Reverse;
use std::collections::binary_heap::BinaryHeap;
use std::fmt;

pub struct HuffmanTree {
    nodes: Vec<Node>,
    num_symbols: usize,
}

#[derive(Debug, Clone)]
pub struct HuffmanTable {
    codes: Vec<Option<PrefixCode>>,
    num_codes: usize,
}

#[derive(Default, Clone, PartialEq, Eq, Hash)]
pub struct PrefixCode {
    bits: BitVec<u8, Msb0>,
}

#[derive(Debug, Clone, Copy)]
pub struct WalkIterator {
    pub idx: usize,
    pub leaf: bool,
}

#[derive(Debug, Copy, Clone)]
struct Node {
    freq: u64,
    symbol: u8,
    left: Option<u32>,
    right: Option<u32>,
}

// Ordered by frequency first, then by arena index. Leaves take indices in frequency-map order and
// internal nodes are numbered as they are created, so ties resolve by insertion order.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    freq: u64,
    idx: u32,
}

impl PrefixCode {
    fn update(&self, bit: bool) -> PrefixCode {
        let mut bits = self.bits.clone();
        bits.push(bit);
        PrefixCode { bits }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &BitSlice<u8, Msb0> {
        &self.bits
    }

    pub fn is_prefix_of(&self, other: &PrefixCode) -> bool {
        other.bits.starts_with(self.bits.as_bitslice())
    }
}

impl fmt::Display for PrefixCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter().by_vals() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for PrefixCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrefixCode({self})")
    }
}

impl From<&str> for PrefixCode {
    fn from(bits: &str) -> Self {
        PrefixCode {
            bits: bits.chars().map(|c| c == '1').collect(),
        }
    }
}

impl HuffmanTree {
    pub fn build(freqs: &FrequencyMap) -> Result<HuffmanTree> {
        let num_symbols = freqs.len();
        if num_symbols == 0 {
            return Err(Error::EmptyInput);
        }

        let mut nodes = Vec::<Node>::with_capacity(2 * num_symbols - 1);
        let mut heap = BinaryHeap::<Reverse<HeapEntry>>::new(); // reverse so that it becomes a min heap

        for (idx, (symbol, freq)) in freqs.iter().enumerate() {
            nodes.push(Node {
                freq,
                symbol,
                left: None,
                right: None,
            });
            heap.push(Reverse(HeapEntry {
                freq,
                idx: idx as u32,
            }));
        }

        // Pop the two smallest entries and join them under a new internal node, until one is left.
        // A single-symbol map never enters the loop and its root is the lone leaf.
        while heap.len() > 1 {
            let (Some(Reverse(first)), Some(Reverse(second))) = (heap.pop(), heap.pop()) else {
                break;
            };

            let freq = first.freq.checked_add(second.freq).ok_or_else(|| {
                Error::MalformedFrame("symbol counts overflow".to_string())
            })?;
            let internal_node = Node {
                freq,
                symbol: 0,
                left: Some(first.idx),
                right: Some(second.idx),
            };

            let internal_node_idx = nodes.len() as u32;
            heap.push(Reverse(HeapEntry {
                freq: internal_node.freq,
                idx: internal_node_idx,
            }));
            nodes.push(internal_node);
        }

        log::debug!(
            "built huffman tree: {} symbols, {} nodes",
            num_symbols,
            nodes.len()
        );

        Ok(HuffmanTree { nodes, num_symbols })
    }

    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    pub fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_leaf(&self, idx: usize) -> bool {
        idx < self.num_symbols
    }

    pub fn symbol(&self, idx: usize) -> Option<u8> {
        if self.is_leaf(idx) {
            Some(self.nodes[idx].symbol)
        } else {
            None
        }
    }

    pub fn freq(&self, idx: usize) -> u64 {
        self.nodes[idx].freq
    }

    pub fn create_walk_iter(&self) -> WalkIterator {
        let idx = self.root();
        WalkIterator {
            idx,
            leaf: self.is_leaf(idx),
        }
    }

    /// Moves one edge down from an internal node: `false` goes left, `true` goes right.
    pub fn walk(&self, iter: WalkIterator, bit: bool) -> WalkIterator {
        debug_assert!(!iter.leaf, "cannot walk below a leaf");

        let node = &self.nodes[iter.idx];
        let next = if bit { node.right } else { node.left };
        // Internal nodes always carry both children.
        let idx = next.map_or(iter.idx, |idx| idx as usize);

        WalkIterator {
            idx,
            leaf: self.is_leaf(idx),
        }
    }
}

impl HuffmanTable {
    pub fn code(&self, symbol: u8) -> Option<&PrefixCode> {
        self.codes[symbol as usize].as_ref()
    }

    pub fn len(&self) -> usize {
        self.num_codes
    }

    pub fn is_empty(&self) -> bool {
        self.num_codes == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &PrefixCode)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.as_ref().map(|code| (symbol as u8, code)))
    }

    /// Exact number of bits produced by encoding a text with these frequencies.
    pub fn encoded_bit_len(&self, freqs: &FrequencyMap) -> Result<u64> {
        freqs.iter().try_fold(0u64, |total, (symbol, freq)| {
            let code = self.code(symbol).ok_or_else(|| {
                Error::CorruptPayload(format!("no code for symbol {symbol:#04x}"))
            })?;
            freq.checked_mul(code.len() as u64)
                .and_then(|bits| bits.checked_add(total))
                .ok_or_else(|| Error::MalformedFrame("encoded length overflows".to_string()))
        })
    }
}

impl From<&HuffmanTree> for HuffmanTable {
    fn from(tree: &HuffmanTree) -> Self {
        let mut table = HuffmanTable {
            codes: vec![None; 256],
            num_codes: tree.num_symbols,
        };

        let root = tree.root();
        if tree.is_leaf(root) {
            // A lone leaf sits at depth zero. Give it a one bit code so that every occurrence
            // still takes up room in the payload.
            log::debug!("single symbol alphabet, assigning placeholder code 0");
            table.codes[tree.nodes[root].symbol as usize] = Some(PrefixCode::from("0"));
            return table;
        }

        // Explicit stack: skewed frequencies can make the tree as deep as the alphabet.
        let mut stack = vec![(root, PrefixCode::default())];
        while let Some((idx, code)) = stack.pop() {
            let node = &tree.nodes[idx];

            if tree.is_leaf(idx) {
                log::trace!("symbol {:?} -> {}", node.symbol as char, code);
                table.codes[node.symbol as usize] = Some(code);
                continue;
            }

            if let Some(right) = node.right {
                stack.push((right as usize, code.update(true)));
            }
            if let Some(left) = node.left {
                stack.push((left as usize, code.update(false)));
            }
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_for(text: &[u8]) -> HuffmanTable {
        let freqs = FrequencyMap::survey(text);
        let tree = HuffmanTree::build(&freqs).unwrap();
        HuffmanTable::from(&tree)
    }

    fn code_str(table: &HuffmanTable, symbol: u8) -> String {
        table.code(symbol).unwrap().to_string()
    }

    #[test]
    fn two_symbols_break_ties_by_frequency() {
        // {a:3, b:2}: b is popped first and becomes the left child.
        let table = table_for(b"aaabb");

        assert_eq!(code_str(&table, b'b'), "0");
        assert_eq!(code_str(&table, b'a'), "1");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn equal_frequencies_resolve_by_insertion_order() {
        let table = table_for(b"abcd");

        assert_eq!(code_str(&table, b'a'), "00");
        assert_eq!(code_str(&table, b'b'), "01");
        assert_eq!(code_str(&table, b'c'), "10");
        assert_eq!(code_str(&table, b'd'), "11");

        let table = table_for(b"dcba");
        assert_eq!(code_str(&table, b'd'), "00");
        assert_eq!(code_str(&table, b'a'), "11");
    }

    #[test]
    fn single_symbol_gets_placeholder_code() {
        let freqs = FrequencyMap::survey(b"zzzz");
        let tree = HuffmanTree::build(&freqs).unwrap();

        assert!(tree.is_leaf(tree.root()));
        assert_eq!(tree.symbol(tree.root()), Some(b'z'));

        let table = HuffmanTable::from(&tree);
        assert_eq!(code_str(&table, b'z'), "0");
        assert_eq!(table.encoded_bit_len(&freqs).unwrap(), 4);
    }

    #[test]
    fn empty_map_is_rejected() {
        assert!(matches!(
            HuffmanTree::build(&FrequencyMap::new()),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn root_frequency_is_total() {
        let freqs = FrequencyMap::survey(b"mississippi river");
        let tree = HuffmanTree::build(&freqs).unwrap();

        assert_eq!(tree.freq(tree.root()), freqs.total());
        assert_eq!(tree.num_symbols(), freqs.len());
    }

    #[test]
    fn skewed_frequencies_build_a_deep_tree() {
        // Fibonacci-like counts produce a fully skewed tree.
        let mut freqs = FrequencyMap::new();
        let (mut a, mut b) = (1u64, 1u64);
        for symbol in 0..40u8 {
            freqs.insert(symbol, a).unwrap();
            (a, b) = (b, a + b);
        }

        let tree = HuffmanTree::build(&freqs).unwrap();
        let table = HuffmanTable::from(&tree);

        let longest = table.iter().map(|(_, code)| code.len()).max().unwrap();
        assert_eq!(longest, 39);
    }

    #[test]
    fn walking_a_code_reaches_its_leaf() {
        let freqs = FrequencyMap::survey(b"abracadabra");
        let tree = HuffmanTree::build(&freqs).unwrap();
        let table = HuffmanTable::from(&tree);

        for (symbol, code) in table.iter() {
            let mut iter = tree.create_walk_iter();
            for bit in code.bits().iter().by_vals() {
                assert!(!iter.leaf);
                iter = tree.walk(iter, bit);
            }
            assert!(iter.leaf);
            assert_eq!(tree.symbol(iter.idx), Some(symbol));
        }
    }

    #[test]
    fn encoded_bit_len_overflow_is_an_error() {
        // c = 0, a = 10, b = 11: 5 * 2^62 bits.
        let mut freqs = FrequencyMap::new();
        for symbol in [b'a', b'b', b'c'] {
            freqs.insert(symbol, 1 << 62).unwrap();
        }
        let table = HuffmanTable::from(&HuffmanTree::build(&freqs).unwrap());

        assert!(matches!(
            table.encoded_bit_len(&freqs),
            Err(Error::MalformedFrame(_))
        ));
    }

    #[test]
    fn encoded_bit_len_sums_weighted_lengths() {
        let freqs = FrequencyMap::survey(b"aaabb");
        let table = table_for(b"aaabb");

        assert_eq!(table.encoded_bit_len(&freqs).unwrap(), 5);
    }

    #[test]
    fn prefix_code_display_and_prefix_check() {
        let short = PrefixCode::from("10");
        let long = PrefixCode::from("1011");

        assert_eq!(long.to_string(), "1011");
        assert!(short.is_prefix_of(&long));
        assert!(!long.is_prefix_of(&short));
        assert!(!PrefixCode::from("11").is_prefix_of(&long));
    }
}
