//! Shared cursor handing out batches of image rows to workers.
//!
//! The cursor owns mutable access to the whole image buffer and splits it
//! into disjoint row batches as they are claimed, so workers write their
//! rows without further locking.

use std::{
    ops::Range,
    slice::ChunksMut,
    sync::{Mutex, PoisonError},
};

/// A claimed run of consecutive rows and the pixels backing them.
#[derive(Debug)]
pub struct Batch<'a, T> {
    pub rows: Range<usize>,
    pub pixels: &'a mut [T],
}

pub struct RowCursor<'a, T> {
    state: Mutex<Rows<'a, T>>,
}

struct Rows<'a, T> {
    chunks: ChunksMut<'a, T>,
    width: usize,
    height: usize,
    next: usize,
    reported_percent: usize,
}

impl<'a, T> RowCursor<'a, T> {
    /// Splits `buffer`, `width` pixels per row, into batches of `batch` rows.
    /// The last batch may be shorter.
    ///
    /// Panics if `width` or `batch` is zero, or the buffer is not a whole
    /// number of rows.
    pub fn new(buffer: &'a mut [T], width: usize, batch: usize) -> Self {
        assert!(width > 0 && batch > 0, "rows and batches must be non-empty");
        assert_eq!(buffer.len() % width, 0, "buffer is not a whole number of rows");
        let height = buffer.len() / width;
        RowCursor {
            state: Mutex::new(Rows {
                chunks: buffer.chunks_mut(width.saturating_mul(batch)),
                width,
                height,
                next: 0,
                reported_percent: 0,
            }),
        }
    }

    /// Claims the next batch, or `None` once every row has been handed out.
    pub fn claim(&self) -> Option<Batch<'a, T>> {
        // The state is consistent between claims, even if a claimant panicked.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let pixels = state.chunks.next()?;
        let start = state.next;
        state.next += pixels.len() / state.width;
        let rows = start..state.next;

        tracing::trace!(?rows, "claimed rows");
        let percent = state.next * 100 / state.height;
        if percent > state.reported_percent {
            state.reported_percent = percent;
            tracing::debug!("{}% of rows claimed", percent);
        }
        Some(Batch { rows, pixels })
    }

    /// Whether every row has been handed out.
    pub fn is_exhausted(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next == state.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_cover_rows_in_order() {
        let mut buffer = vec![0u8; 3 * 7];
        let cursor = RowCursor::new(&mut buffer, 3, 3);
        let rows: Vec<Range<usize>> = std::iter::from_fn(|| cursor.claim())
            .map(|batch| {
                assert_eq!(batch.pixels.len(), batch.rows.len() * 3);
                batch.rows
            })
            .collect();
        assert_eq!(rows, vec![0..3, 3..6, 6..7]);
        assert!(cursor.is_exhausted());
        assert!(cursor.claim().is_none());
    }

    #[test]
    fn empty_buffer_is_exhausted() {
        let mut buffer: Vec<u8> = Vec::new();
        let cursor = RowCursor::new(&mut buffer, 5, 1);
        assert!(cursor.is_exhausted());
        assert!(cursor.claim().is_none());
    }

    #[test]
    #[should_panic]
    fn zero_batch_panics() {
        let mut buffer = vec![0u8; 4];
        RowCursor::new(&mut buffer, 2, 0);
    }

    /// Every row is claimed exactly once, whatever the thread and batch counts.
    #[test]
    fn concurrent_claims_partition_rows() {
        const WIDTH: usize = 3;
        for height in [0, 1, 2, 7, 64, 101] {
            for batch in [1, 2, 5, 200] {
                for threads in [1, 2, 3, 8] {
                    let mut claims = vec![0u32; WIDTH * height];
                    let cursor = RowCursor::new(&mut claims, WIDTH, batch);
                    let ranges: Vec<Vec<Range<usize>>> = std::thread::scope(|scope| {
                        let handles: Vec<_> = (0..threads)
                            .map(|_| {
                                scope.spawn(|| {
                                    let mut mine = Vec::new();
                                    while let Some(batch) = cursor.claim() {
                                        batch.pixels.iter_mut().for_each(|p| *p += 1);
                                        mine.push(batch.rows);
                                    }
                                    mine
                                })
                            })
                            .collect();
                        handles
                            .into_iter()
                            .map(|h| h.join().unwrap())
                            .collect()
                    });
                    drop(cursor);

                    assert!(claims.iter().all(|c| *c == 1), "{height}x{batch}x{threads}");
                    let mut rows: Vec<usize> = ranges.into_iter().flatten().flatten().collect();
                    rows.sort_unstable();
                    assert_eq!(rows, (0..height).collect::<Vec<_>>());
                }
            }
        }
    }
}
