use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use ahash::AHashMap;
use log::{info, debug};
use crate::error::{Error, Result};
use crate::utils::interner::StringInterner;
use crate::utils::io::{open_input, trim_line_end};

/// Joins the source identifier and representative title of a canonical key.
pub const KEY_SEPARATOR: char = '|';

/// Lookup from `language:title` to the canonical entity key.
#[derive(Debug, Clone, Default)]
pub struct EntityIdentityMap {
    entries: AHashMap<Arc<str>, Arc<str>>,
}

impl PartialEq for EntityIdentityMap {
    fn eq(&self, other: &Self) -> bool {
        *self.entries == *other.entries
    }
}

impl EntityIdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P, interner: &mut StringInterner) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading entity identity table from {:?}", path);
        let map = Self::from_reader(open_input(path)?, path, interner)?;
        info!("Read {} entity identity mappings", map.len());
        Ok(map)
    }

    /// Reads a header of language codes followed by `id<TAB>title...` rows.
    ///
    /// A row whose width differs from the header is corrupt input and aborts
    /// the load; `source` only names the input in that error.
    pub fn from_reader<R: BufRead>(mut reader: R, source: &Path, interner: &mut StringInterner) -> Result<Self> {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(Error::corrupt(source, 1, 2, 0));
        }
        let header: Vec<String> = trim_line_end(line.trim_end_matches('\n'))
            .split('\t')
            .map(str::to_string)
            .collect();
        if header.len() < 2 {
            return Err(Error::corrupt(source, 1, 2, header.len()));
        }
        debug!("Identity table languages: {:?}", &header[1..]);

        let mut map = Self::new();
        let mut key_buf = String::new();
        let mut line_number = 1;
        let mut rows = 0usize;
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_number += 1;
            let row = trim_line_end(line.trim_end_matches('\n'));
            if row.is_empty() {
                continue;
            }
            let cols: Vec<&str> = row.split('\t').collect();
            if cols.len() != header.len() {
                return Err(Error::corrupt(source, line_number, header.len(), cols.len()));
            }
            rows += 1;

            let mut representative: Option<Arc<str>> = None;
            for (language, title) in header.iter().zip(cols.iter()).skip(1) {
                if title.is_empty() {
                    continue;
                }
                let canonical = representative.get_or_insert_with(|| {
                    key_buf.clear();
                    key_buf.push_str(cols[0]);
                    key_buf.push(KEY_SEPARATOR);
                    key_buf.push_str(title);
                    interner.intern(&key_buf)
                });
                key_buf.clear();
                key_buf.push_str(language);
                key_buf.push(':');
                key_buf.push_str(title);
                let key = interner.intern(&key_buf);
                if let Some(previous) = map.entries.insert(key, Arc::clone(canonical)) {
                    debug!("Duplicate title {} (was {}, now {})", key_buf, previous, canonical);
                }
            }
        }
        debug!("Read {} identity rows", rows);
        Ok(map)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<str>> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: Arc<str>, canonical: Arc<str>) -> Option<Arc<str>> {
        self.entries.insert(key, canonical)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<EntityIdentityMap> {
        let mut interner = StringInterner::new();
        EntityIdentityMap::from_reader(Cursor::new(text), Path::new("test.tsv"), &mut interner)
    }

    #[test]
    fn every_language_maps_to_the_first_present_title() {
        let map = parse("ID\ten\tde\nQ90\tParis\tParis\nQ64\tBerlin\tBerlin (Stadt)\n").unwrap();
        assert_eq!(map.get("en:Paris").map(|k| &**k), Some("Q90|Paris"));
        assert_eq!(map.get("de:Paris").map(|k| &**k), Some("Q90|Paris"));
        assert_eq!(map.get("de:Berlin (Stadt)").map(|k| &**k), Some("Q64|Berlin"));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn missing_language_cell_still_maps_the_present_one() {
        let map = parse("ID\ten\tde\nQ1\t\tNurDeutsch\nQ2\tOnlyEnglish\t\n").unwrap();
        assert_eq!(map.get("de:NurDeutsch").map(|k| &**k), Some("Q1|NurDeutsch"));
        assert!(map.get("en:").is_none());
        assert_eq!(map.get("en:OnlyEnglish").map(|k| &**k), Some("Q2|OnlyEnglish"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn width_mismatch_is_corrupt_input() {
        let err = parse("ID\ten\tde\nQ1\tOnly\n").unwrap_err();
        match err {
            Error::CorruptInput { line, expected, found, .. } => {
                assert_eq!((line, expected, found), (2, 3, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(parse("").is_err());
    }

    #[test]
    fn canonical_keys_are_shared_across_languages() {
        let map = parse("ID\ten\tfr\nQ90\tParis\tParis\n").unwrap();
        let en = map.get("en:Paris").unwrap();
        let fr = map.get("fr:Paris").unwrap();
        assert!(Arc::ptr_eq(en, fr));
    }
}
