use std::sync::Arc;
use ahash::AHashSet;

/// Deduplicates strings so that equal titles and keys share one allocation.
///
/// The backing store is an open-addressed hash set holding the shared
/// instances themselves, so each distinct string costs one `Arc<str>` plus a
/// table slot. Nothing is ever evicted.
#[derive(Debug, Default)]
pub struct StringInterner {
    strings: AHashSet<Arc<str>>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            strings: AHashSet::with_capacity(capacity),
        }
    }

    /// Returns the shared instance equal to `s`, allocating only on first sight.
    pub fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(s);
        self.strings.insert(Arc::clone(&shared));
        shared
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_share_one_instance() {
        let mut interner = StringInterner::new();
        let a = interner.intern("en:Paris");
        let b = interner.intern(&String::from("en:Paris"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_strings_are_kept_apart() {
        let mut interner = StringInterner::with_capacity(4);
        let a = interner.intern("en:Paris");
        let b = interner.intern("fr:Paris");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 2);
        assert!(!interner.is_empty());
    }
}
