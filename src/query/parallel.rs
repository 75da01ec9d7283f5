//! Parallel search: vertex distribution, worker pool, partition merge.
//!
//! Workers share nothing mutable during the search phase. Each owns a fresh
//! clone of the compiled pattern and a private result partition; the only
//! shared mutable state is the distributor's cursor, advanced with a single
//! atomic fetch-and-add. The calling thread acts as one of the workers.
//!
//! After the search the partitions are merged into one table, either by
//! recursively halving the partition range (row merge) or by handing out
//! columns through the same atomic-claim pattern (column merge), whichever
//! spawns fewer tasks for the given worker and column counts.

use std::panic;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, trace};

use crate::graph::{Element, Graph};
use crate::query::matcher::Matcher;
use crate::query::pattern::CompiledPattern;
use crate::query::results::MatchTable;
use crate::types::{EngineError, Result};

/// Hands out contiguous vertex-index ranges to competing workers.
///
/// Every range is claimed exactly once; the cursor is the only shared
/// mutable word, so claims never serialize behind a lock.
pub struct VertexDistributor {
    cursor: AtomicUsize,
    total: usize,
    range_size: usize,
}

impl VertexDistributor {
    /// Creates a distributor over `[0, total)` handing out ranges of
    /// `range_size` vertices.
    pub fn new(total: usize, range_size: usize) -> Self {
        debug_assert!(range_size > 0, "range size must be positive");
        Self {
            cursor: AtomicUsize::new(0),
            total,
            range_size,
        }
    }

    /// Claims the next unclaimed range, or `None` once the vertex array is
    /// exhausted.
    pub fn claim(&self) -> Option<(usize, usize)> {
        let start = self.cursor.fetch_add(self.range_size, Ordering::Relaxed);
        if start >= self.total {
            return None;
        }
        Some((start, (start + self.range_size).min(self.total)))
    }
}

/// Tuning knobs for the parallel matcher.
#[derive(Clone)]
pub struct ParallelConfig {
    /// Number of workers, the calling thread included.
    pub workers: usize,
    /// Vertices per distributor range.
    pub range_size: usize,
    /// Optional stop flag polled between range claims; tripping it makes
    /// the search return [`EngineError::Cancelled`].
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map_or(4, usize::from),
            range_size: 1024,
            cancel: None,
        }
    }
}

/// Multi-threaded matcher front end.
pub struct ParallelMatcher<'g> {
    graph: &'g Graph,
    config: ParallelConfig,
}

impl<'g> ParallelMatcher<'g> {
    /// Creates a parallel matcher with default configuration.
    pub fn new(graph: &'g Graph) -> Self {
        Self::with_config(graph, ParallelConfig::default())
    }

    /// Creates a parallel matcher with explicit configuration.
    pub fn with_config(graph: &'g Graph, config: ParallelConfig) -> Self {
        Self { graph, config }
    }

    /// Runs the search across the worker pool and returns the merged table.
    ///
    /// Rows across partitions keep no order beyond grouping by worker; rows
    /// within one partition appear in that worker's visitation order.
    pub fn run(&self, pattern: &CompiledPattern) -> Result<MatchTable> {
        if self.config.workers == 0 {
            return Err(EngineError::Invalid("parallel matcher needs at least one worker"));
        }
        if self.config.range_size == 0 {
            return Err(EngineError::Invalid("vertex range size must be positive"));
        }
        let workers = self.config.workers;
        let distributor = VertexDistributor::new(self.graph.vertex_count(), self.config.range_size);
        let graph = self.graph;
        let cancel = self.config.cancel.as_deref();

        let outcomes: Vec<Result<MatchTable>> = thread::scope(|scope| {
            let handles: Vec<_> = (1..workers)
                .map(|_| scope.spawn(|| search_worker(graph, pattern, &distributor, cancel)))
                .collect();
            let mut outcomes = Vec::with_capacity(workers);
            outcomes.push(search_worker(graph, pattern, &distributor, cancel));
            for handle in handles {
                outcomes.push(match handle.join() {
                    Ok(outcome) => outcome,
                    Err(payload) => panic::resume_unwind(payload),
                });
            }
            outcomes
        });
        let mut partitions = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

        if partitions.len() == 1 {
            return Ok(partitions.remove(0));
        }
        let columns = pattern.slot_count();
        let row_merge = workers / 2 > columns;
        debug!(
            workers,
            columns,
            strategy = if row_merge { "rows" } else { "columns" },
            "merging result partitions"
        );
        if row_merge {
            merge_rows_recursive(&mut partitions);
            Ok(partitions.swap_remove(0))
        } else {
            Ok(merge_columns(&partitions, columns, workers))
        }
    }
}

fn search_worker(
    graph: &Graph,
    pattern: &CompiledPattern,
    distributor: &VertexDistributor,
    cancel: Option<&AtomicBool>,
) -> Result<MatchTable> {
    let mut matcher = Matcher::new(graph, pattern);
    loop {
        if let Some(flag) = cancel {
            if flag.load(Ordering::SeqCst) {
                return Err(EngineError::Cancelled);
            }
        }
        match distributor.claim() {
            Some((start, end)) => {
                trace!(start, end, "searching vertex range");
                matcher.run_range(start, end);
            }
            None => break,
        }
    }
    Ok(matcher.into_results())
}

/// Collapses the slice into its first partition by recursively halving the
/// partition range; ranges of at most three partitions merge sequentially.
fn merge_rows_recursive(partitions: &mut [MatchTable]) {
    if partitions.len() <= 3 {
        if let Some((head, rest)) = partitions.split_first_mut() {
            for src in rest {
                head.merge_rows(src);
            }
        }
        return;
    }
    let mid = partitions.len() / 2;
    {
        let (low, high) = partitions.split_at_mut(mid);
        thread::scope(|scope| {
            scope.spawn(|| merge_rows_recursive(low));
            merge_rows_recursive(high);
        });
    }
    let (low, high) = partitions.split_at_mut(mid);
    low[0].merge_rows(&mut high[0]);
}

/// Merges by column: workers claim column indexes through an atomic cursor
/// and each walks its column across every partition in worker order.
fn merge_columns(partitions: &[MatchTable], column_count: usize, workers: usize) -> MatchTable {
    let claim = AtomicUsize::new(0);
    let tasks = workers.min(column_count).max(1);
    let mut collected: Vec<(usize, Vec<Element>)> = thread::scope(|scope| {
        let handles: Vec<_> = (1..tasks)
            .map(|_| scope.spawn(|| column_merge_worker(partitions, &claim, column_count)))
            .collect();
        let mut collected = column_merge_worker(partitions, &claim, column_count);
        for handle in handles {
            match handle.join() {
                Ok(columns) => collected.extend(columns),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        collected
    });
    collected.sort_by_key(|&(column, _)| column);
    MatchTable::from_columns(collected.into_iter().map(|(_, column)| column).collect())
}

fn column_merge_worker(
    partitions: &[MatchTable],
    claim: &AtomicUsize,
    column_count: usize,
) -> Vec<(usize, Vec<Element>)> {
    let total: usize = partitions.iter().map(MatchTable::row_count).sum();
    let mut out = Vec::new();
    loop {
        let column = claim.fetch_add(1, Ordering::Relaxed);
        if column >= column_count {
            return out;
        }
        let mut merged = Vec::with_capacity(total);
        for partition in partitions {
            merged.extend_from_slice(partition.column(column));
        }
        out.push((column, merged));
    }
}
