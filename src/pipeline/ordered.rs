// src/pipeline/ordered.rs
use std::io::Write;
use std::time::{Duration, Instant};
use ahash::AHashMap;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info, warn};
use crate::error::Result;
use crate::types::{Completion, Verdict};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub resolved: usize,
    pub dead: usize,
    pub failed: usize,
    /// Candidates whose completion never arrived because every worker is gone
    pub lost: usize,
}

/// Emits verdicts in input order, however out of order they complete.
///
/// The order channel carries sequence numbers in input order; completions
/// arrive in any order and are parked until their turn. The writer never
/// moves past the oldest candidate still being evaluated.
pub struct OrderedWriter<W: Write> {
    out: W,
    pending: AHashMap<u64, Verdict>,
    completions_open: bool,
    stall_warning: Duration,
    stats: WriterStats,
}

impl<W: Write> OrderedWriter<W> {
    pub fn new(out: W, stall_warning: Duration) -> Self {
        Self {
            out,
            pending: AHashMap::new(),
            completions_open: true,
            stall_warning,
            stats: WriterStats::default(),
        }
    }

    pub fn run(mut self, order: Receiver<u64>, completions: Receiver<Completion>) -> Result<WriterStats> {
        for seq in order.iter() {
            match self.await_verdict(seq, &completions) {
                Some(Verdict::Resolved(resolution)) => {
                    writeln!(self.out, "{}", resolution)?;
                    self.stats.resolved += 1;
                }
                Some(Verdict::Dead) => self.stats.dead += 1,
                Some(Verdict::Failed(reason)) => {
                    debug!("Dropping candidate #{}: {}", seq, reason);
                    self.stats.failed += 1;
                }
                None => {
                    warn!("Candidate #{} was never completed; all workers have stopped", seq);
                    self.stats.lost += 1;
                }
            }
        }
        self.out.flush()?;
        if !self.pending.is_empty() {
            warn!("{} completions arrived for candidates never queued for output", self.pending.len());
        }
        info!("Output thread has finished");
        Ok(self.stats)
    }

    fn await_verdict(&mut self, seq: u64, completions: &Receiver<Completion>) -> Option<Verdict> {
        let started = Instant::now();
        loop {
            if let Some(verdict) = self.pending.remove(&seq) {
                return Some(verdict);
            }
            if !self.completions_open {
                return None;
            }
            match completions.recv_timeout(self.stall_warning) {
                Ok(completion) => {
                    self.pending.insert(completion.seq, completion.verdict);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!("Still waiting on candidate #{} after {:?}", seq, started.elapsed());
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.completions_open = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Resolution;
    use crossbeam_channel::unbounded;

    fn resolved(phrase: &str) -> Verdict {
        Verdict::Resolved(Resolution {
            phrase: phrase.to_string(),
            forms: vec![phrase.to_string()],
            total_hits: 1,
            weight: 17,
            targets: Vec::new(),
        })
    }

    #[test]
    fn out_of_order_completions_are_written_in_order() {
        let (order_tx, order_rx) = unbounded();
        let (done_tx, done_rx) = unbounded();
        for seq in 0..4 {
            order_tx.send(seq).unwrap();
        }
        drop(order_tx);
        for (seq, verdict) in [(3, resolved("d")), (1, Verdict::Dead), (2, resolved("c")), (0, resolved("a"))] {
            done_tx.send(Completion { seq, verdict }).unwrap();
        }
        drop(done_tx);

        let mut out = Vec::new();
        let stats = OrderedWriter::new(&mut out, Duration::from_secs(1)).run(order_rx, done_rx).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\ta\t1\t17\nc\tc\t1\t17\nd\td\t1\t17\n");
        assert_eq!(stats, WriterStats { resolved: 3, dead: 1, failed: 0, lost: 0 });
    }

    #[test]
    fn missing_completion_after_disconnect_is_lost_not_deadlocked() {
        let (order_tx, order_rx) = unbounded();
        let (done_tx, done_rx) = unbounded();
        order_tx.send(0).unwrap();
        order_tx.send(1).unwrap();
        drop(order_tx);
        done_tx.send(Completion { seq: 1, verdict: resolved("b") }).unwrap();
        drop(done_tx);

        let mut out = Vec::new();
        let stats = OrderedWriter::new(&mut out, Duration::from_millis(10)).run(order_rx, done_rx).unwrap();
        assert_eq!(stats.lost, 1);
        assert_eq!(stats.resolved, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "b\tb\t1\t17\n");
    }
}
