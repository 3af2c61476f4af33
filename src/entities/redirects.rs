use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use ahash::{AHashMap, AHashSet};
use log::{info, warn, debug};
use crate::error::{Error, Result};
use crate::utils::interner::StringInterner;
use crate::utils::io::{open_input, trim_line_end};
use super::identity::EntityIdentityMap;

const PROGRESS_INTERVAL: usize = 1_000_000;

/// Title to redirect-target table, keyed like the identity map.
#[derive(Debug, Clone, Default)]
pub struct RedirectResolver {
    redirects: AHashMap<Arc<str>, Arc<str>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureStats {
    pub redirects: usize,
    /// Redirect sources that ended up with a canonical key
    pub resolved: usize,
    pub cycles: usize,
}

impl RedirectResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P, interner: &mut StringInterner) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading redirects from {:?}", path);
        let resolver = Self::from_reader(open_input(path)?, path, interner)?;
        info!("Read {} redirects", resolver.len());
        Ok(resolver)
    }

    pub fn from_reader<R: BufRead>(mut reader: R, source: &Path, interner: &mut StringInterner) -> Result<Self> {
        let mut resolver = Self::new();
        let mut line = String::new();
        let mut line_number = 0;
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
            let mut cols = row.split('\t');
            match (cols.next(), cols.next(), cols.next()) {
                (Some(from), Some(to), None) => {
                    let from = interner.intern(from);
                    let to = interner.intern(to);
                    resolver.redirects.insert(from, to);
                }
                _ => {
                    return Err(Error::corrupt(source, line_number, 2, row.split('\t').count()));
                }
            }
        }
        Ok(resolver)
    }

    pub fn len(&self) -> usize {
        self.redirects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.redirects.is_empty()
    }

    /// Points every redirect source at the canonical key of the last
    /// identity-bearing title along its chain.
    ///
    /// Walks stop at the end of the chain or at the first repeated title;
    /// cycles are logged and the walk keeps whatever key it found before
    /// the repeat. Sources that reach no identity-bearing title keep their
    /// previous mapping, if any.
    pub fn compute_closure(&self, identities: &mut EntityIdentityMap) -> ClosureStats {
        info!("Computing transitive closure of {} redirects", self.redirects.len());
        let mut stats = ClosureStats {
            redirects: self.redirects.len(),
            ..ClosureStats::default()
        };
        let mut seen: AHashSet<&str> = AHashSet::new();

        for (i, (key, target)) in self.redirects.iter().enumerate() {
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                info!("Computing closure progress: {}", i + 1);
            }
            seen.clear();
            seen.insert(key);
            seen.insert(target);

            let mut best = identities.get(key).cloned();
            let mut current = target;
            loop {
                if let Some(canonical) = identities.get(current) {
                    best = Some(Arc::clone(canonical));
                }
                let Some(next) = self.redirects.get(&**current) else {
                    break;
                };
                if !seen.insert(next) {
                    warn!("Redirect cycle detected involving {} > {} > {}", key, current, next);
                    stats.cycles += 1;
                    break;
                }
                current = next;
            }

            if let Some(best) = best {
                identities.insert(Arc::clone(key), best);
                stats.resolved += 1;
            }
        }

        debug!("Closure stats: {:?}", stats);
        stats
    }
}
