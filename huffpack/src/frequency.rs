//! Symbol frequency survey.
//!
//! A [`FrequencyMap`] remembers the order in which symbols were first seen. That order is what the
//! tree builder uses to break ties, and it is preserved through the JSON header, so the decoder
//! rebuilds exactly the tree the encoder used.

use crate::error::{Error, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const NUM_SYMBOLS: usize = 256;

#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyMap {
    entries: Vec<(u8, u64)>,
    // Sum of all counts. Kept below `u64::MAX` so that tree weights never overflow.
    total: u64,
    // Position of each symbol inside `entries`.
    slots: [Option<u16>; NUM_SYMBOLS],
}

impl FrequencyMap {
    pub fn new() -> Self {
        FrequencyMap {
            entries: Vec::new(),
            total: 0,
            slots: [None; NUM_SYMBOLS],
        }
    }

    /// Counts every byte of `data`, keeping first-seen order.
    pub fn survey(data: &[u8]) -> Self {
        let mut map = Self::new();

        for &symbol in data {
            match map.slots[symbol as usize] {
                Some(slot) => map.entries[slot as usize].1 += 1,
                None => {
                    map.slots[symbol as usize] = Some(map.entries.len() as u16);
                    map.entries.push((symbol, 1));
                }
            }
        }
        map.total = data.len() as u64;

        map
    }

    /// Appends a new symbol. Counts must be positive and symbols unique.
    pub fn insert(&mut self, symbol: u8, freq: u64) -> Result<()> {
        if freq == 0 {
            return Err(Error::MalformedFrame(format!(
                "symbol {symbol:#04x} has a zero count"
            )));
        }
        if self.slots[symbol as usize].is_some() {
            return Err(Error::MalformedFrame(format!(
                "symbol {symbol:#04x} appears twice"
            )));
        }

        let total = self.total.checked_add(freq).ok_or_else(|| {
            Error::MalformedFrame(format!("counts overflow at symbol {symbol:#04x}"))
        })?;

        self.slots[symbol as usize] = Some(self.entries.len() as u16);
        self.entries.push((symbol, freq));
        self.total = total;

        Ok(())
    }

    pub fn get(&self, symbol: u8) -> Option<u64> {
        self.slots[symbol as usize].map(|slot| self.entries[slot as usize].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of symbols the map describes, i.e. the length of the original text.
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl Default for FrequencyMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrequencyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(symbol, freq)| (*symbol as char, freq)))
            .finish()
    }
}

// Keys are one-character strings. Reading the byte as a Latin-1 code point makes every value in
// 0..=255 a valid `char`.
impl Serialize for FrequencyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (symbol, freq) in &self.entries {
            map.serialize_entry(&(*symbol as char), freq)?;
        }
        map.end()
    }
}

struct FrequencyMapVisitor;

impl<'de> Visitor<'de> for FrequencyMapVisitor {
    type Value = FrequencyMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping single-byte symbols to positive counts")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<FrequencyMap, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = FrequencyMap::new();

        while let Some((key, freq)) = access.next_entry::<String, u64>()? {
            let mut chars = key.chars();
            let symbol = match (chars.next(), chars.next()) {
                (Some(c), None) if (c as u32) < NUM_SYMBOLS as u32 => c as u8,
                _ => {
                    let msg = format!("invalid symbol key {key:?}");
                    return Err(<A::Error as de::Error>::custom(msg));
                }
            };

            map.insert(symbol, freq)
                .map_err(<A::Error as de::Error>::custom)?;
        }

        Ok(map)
    }
}

impl<'de> Deserialize<'de> for FrequencyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(FrequencyMapVisitor)
    }
}
