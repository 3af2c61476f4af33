// src/pipeline/mod.rs
pub mod ordered;

use std::io::{BufRead, ErrorKind, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use indicatif::ProgressBar;
use log::{info, debug, warn, error};
use crate::config::subsystems::PipelineConfig;
use crate::error::{Error, Result};
use crate::scoring::{CandidateEvaluator, EvaluationScratch};
use crate::search::SearchIndexClient;
use crate::types::{Candidate, Completion, Verdict};

pub use self::ordered::{OrderedWriter, WriterStats};

/// Input lines with this prefix are extraction artifacts, not phrases.
pub const SKIP_PREFIX: &str = "category ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Candidates handed to the workers
    pub read: usize,
    pub skipped: usize,
    pub resolved: usize,
    pub dead: usize,
    pub failed: usize,
    pub lost: usize,
    pub failed_workers: usize,
    pub interrupted: bool,
}

#[derive(Debug, Default)]
struct ReaderStats {
    read: usize,
    skipped: usize,
    interrupted: bool,
}

/// Reports a candidate as failed if its worker unwinds before completing it.
struct CompletionGuard<'a> {
    seq: Option<u64>,
    completions: &'a Sender<Completion>,
}

impl<'a> CompletionGuard<'a> {
    fn new(seq: u64, completions: &'a Sender<Completion>) -> Self {
        Self { seq: Some(seq), completions }
    }

    fn complete(mut self, verdict: Verdict) {
        if let Some(seq) = self.seq.take() {
            if self.completions.send(Completion { seq, verdict }).is_err() {
                debug!("Writer gone; dropping completion for #{}", seq);
            }
        }
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if let Some(seq) = self.seq.take() {
            let verdict = Verdict::Failed("worker terminated abnormally".to_string());
            let _ = self.completions.send(Completion { seq, verdict });
        }
    }
}

/// One reader, N scoring workers and an ordered writer around bounded channels.
///
/// The reader sends each candidate to the work channel and its sequence
/// number to the order channel; both are bounded, so a slow writer or slow
/// workers throttle the reader. Shutdown is by disconnection: once input is
/// exhausted (or interrupted) the reader drops its senders and every stage
/// drains what is left.
pub struct CandidatePipeline<S> {
    evaluator: CandidateEvaluator<S>,
    workers: usize,
    queue_capacity: usize,
    stall_warning: Duration,
    progress: ProgressBar,
    interrupted: Arc<AtomicBool>,
}

impl<S: SearchIndexClient> CandidatePipeline<S> {
    pub fn new(evaluator: CandidateEvaluator<S>, config: &PipelineConfig) -> Self {
        Self {
            evaluator,
            workers: config.effective_workers(),
            queue_capacity: config.queue_capacity.max(1),
            stall_warning: config.stall_warning(),
            progress: ProgressBar::hidden(),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Overrides the worker count without consulting the core count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Stops reading new candidates once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    pub fn run<R: BufRead, W: Write + Send>(&self, input: R, output: W) -> Result<PipelineStats> {
        let start_time = Instant::now();
        info!("Starting pipeline with {} workers, queue capacity {}", self.workers, self.queue_capacity);

        let (work_tx, work_rx) = bounded::<Candidate>(self.queue_capacity);
        let (order_tx, order_rx) = bounded::<u64>(self.queue_capacity + 1);
        // In-flight candidates are bounded by the order channel, so this never grows past it.
        let (done_tx, done_rx) = unbounded::<Completion>();

        let stall_warning = self.stall_warning;
        let (reader_result, worker_results, writer_result) = thread::scope(|scope| -> Result<_> {
            let writer = thread::Builder::new()
                .name("writer".to_string())
                .spawn_scoped(scope, move || OrderedWriter::new(output, stall_warning).run(order_rx, done_rx))?;

            let mut workers = Vec::with_capacity(self.workers);
            for id in 0..self.workers {
                let work_rx = work_rx.clone();
                let done_tx = done_tx.clone();
                workers.push(
                    thread::Builder::new()
                        .name(format!("worker-{}", id))
                        .spawn_scoped(scope, move || self.work(id, work_rx, done_tx))?,
                );
            }
            drop(work_rx);
            drop(done_tx);

            let reader_result = self.read_candidates(input, work_tx, order_tx);

            let worker_results: Vec<thread::Result<bool>> = workers.into_iter().map(|h| h.join()).collect();
            let writer_result = writer.join();
            Ok((reader_result, worker_results, writer_result))
        })?;

        let mut failed_workers = 0;
        for result in worker_results {
            match result {
                Ok(true) => {}
                Ok(false) => failed_workers += 1,
                Err(_) => {
                    error!("A worker thread panicked");
                    failed_workers += 1;
                }
            }
        }
        let written = writer_result.map_err(|_| Error::pipeline("writer thread panicked"))??;
        let reader = reader_result?;

        let stats = PipelineStats {
            read: reader.read,
            skipped: reader.skipped,
            resolved: written.resolved,
            dead: written.dead,
            failed: written.failed,
            lost: written.lost,
            failed_workers,
            interrupted: reader.interrupted,
        };
        self.progress.finish_and_clear();
        info!("Pipeline finished in {:?}: {:?}", start_time.elapsed(), stats);
        if failed_workers > 0 {
            warn!("{} of {} workers stopped early", failed_workers, self.workers);
        }
        Ok(stats)
    }

    fn read_candidates<R: BufRead>(
        &self,
        input: R,
        work: Sender<Candidate>,
        order: Sender<u64>,
    ) -> Result<ReaderStats> {
        let mut stats = ReaderStats::default();
        let mut seq: u64 = 0;
        for line in input.lines() {
            if self.interrupted.load(Ordering::Relaxed) {
                info!("Interrupted; finishing {} queued candidates", work.len());
                stats.interrupted = true;
                break;
            }
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    warn!("Skipping undecodable input line after #{}: {}", seq, e);
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let phrase = line.trim_end_matches('\r');
            if phrase.starts_with(SKIP_PREFIX) || phrase.trim().is_empty() {
                stats.skipped += 1;
                continue;
            }

            if work.send(Candidate::new(seq, phrase)).is_err() {
                error!("All workers have stopped; abandoning input at candidate #{}", seq);
                break;
            }
            if order.send(seq).is_err() {
                error!("Output thread has stopped; abandoning input at candidate #{}", seq);
                break;
            }
            seq += 1;
            stats.read += 1;
        }
        debug!("Reader finished: {} candidates, {} skipped", stats.read, stats.skipped);
        Ok(stats)
    }

    /// Returns `false` if the worker stopped on an evaluation error.
    fn work(&self, id: usize, candidates: Receiver<Candidate>, completions: Sender<Completion>) -> bool {
        let mut scratch = EvaluationScratch::new();
        for candidate in candidates.iter() {
            let guard = CompletionGuard::new(candidate.seq, &completions);
            match self.evaluator.evaluate(&candidate.phrase, &mut scratch) {
                Ok(verdict) => {
                    guard.complete(verdict);
                    self.progress.inc(1);
                }
                Err(e) => {
                    error!("worker-{} failed on {:?}: {}", id, candidate.phrase, e);
                    guard.complete(Verdict::Failed(e.to_string()));
                    return false;
                }
            }
        }
        debug!("worker-{} finished", id);
        true
    }
}
