use std::hash::Hash;
use ahash::AHashMap;

/// One exact-anchor hit in the combined value; outranks any search count.
pub const EXACT_UNIT: u32 = 0x1_0000;

/// Largest search count the low half of the combined value can hold.
pub const MAX_SEARCH_COUNT: u32 = EXACT_UNIT - 1;

const MAX_EXACT_COUNT: u32 = u32::MAX / EXACT_UNIT;

/// Per-candidate support tallies packed into one ordering value per key.
///
/// The low 16 bits hold the number of documents linking to the key, the high
/// 16 bits the number of documents whose anchor matched the phrase. Because
/// the document cap keeps search support below [`EXACT_UNIT`], sorting by the
/// packed value ranks any exact support above pure co-occurrence.
#[derive(Debug, Clone)]
pub struct SupportCounter<K> {
    counts: AHashMap<K, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportEntry<K> {
    pub key: K,
    pub combined: u32,
}

impl<K> SupportEntry<K> {
    pub fn search(&self) -> u32 {
        self.combined & MAX_SEARCH_COUNT
    }

    pub fn exact(&self) -> u32 {
        self.combined / EXACT_UNIT
    }
}

impl<K> Default for SupportCounter<K> {
    fn default() -> Self {
        Self {
            counts: AHashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Ord + Clone> SupportCounter<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one document in which `key` appears as a link target.
    pub fn add_search(&mut self, key: K) {
        let value = self.counts.entry(key).or_insert(0);
        debug_assert!(*value & MAX_SEARCH_COUNT < MAX_SEARCH_COUNT, "search support overflow");
        *value += 1;
    }

    /// Counts one document in which `key` is linked by the exact phrase.
    pub fn add_exact(&mut self, key: K) {
        let value = self.counts.entry(key).or_insert(0);
        if *value / EXACT_UNIT < MAX_EXACT_COUNT {
            *value += EXACT_UNIT;
        }
    }

    pub fn get(&self, key: &K) -> Option<SupportEntry<K>> {
        self.counts.get(key).map(|&combined| SupportEntry {
            key: key.clone(),
            combined,
        })
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries sorted by descending combined value, ties by ascending key.
    pub fn descending(&self) -> Vec<SupportEntry<K>> {
        let mut entries: Vec<SupportEntry<K>> = self
            .counts
            .iter()
            .map(|(key, &combined)| SupportEntry {
                key: key.clone(),
                combined,
            })
            .collect();
        entries.sort_unstable_by(|a, b| b.combined.cmp(&a.combined).then_with(|| a.key.cmp(&b.key)));
        entries
    }
}
