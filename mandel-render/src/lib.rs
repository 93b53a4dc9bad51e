//! Parallel renderer for Mandel.
//!
//! Every pixel of an escape-time fractal is independent, so rendering is
//! split by rows:
//! -   A fixed pool of worker threads is created for the job.
//! -   Each worker repeatedly claims the next batch of rows from a shared
//!     cursor and computes every pixel in it. Batches are disjoint slices of
//!     the output buffer, so writes need no locking.
//! -   When the rows run out, the workers' outcomes are collected. A worker
//!     that fails stops; the others carry on until every row is claimed.

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::atomic::{AtomicBool, Ordering},
};

use mandel_core::{error::EvalError, FractalSet, PlotArea, Size};

mod colorize;
mod cursor;

pub use colorize::{ColorError, Colorizer};
pub use cursor::{Batch, RowCursor};

/// Why a worker stopped before the rows ran out.
#[derive(Clone, Debug, PartialEq)]
pub enum FaultCause {
    Eval(EvalError),
    Panic(String),
}

impl fmt::Display for FaultCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultCause::Eval(err) => write!(f, "{}", err),
            FaultCause::Panic(msg) => write!(f, "worker panicked: {}", msg),
        }
    }
}

/// A failure captured inside one render worker.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerFault {
    pub worker: usize,
    pub cause: FaultCause,
}

impl fmt::Display for WorkerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)
    }
}

/// Errors that can occur during rendering.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    InvalidArgument(String),
    Internal(String),
    Cancelled,
    /// One entry per failed worker; never empty.
    Faults(Vec<WorkerFault>),
}

impl Error {
    /// Worker failures, if the render failed inside workers.
    pub fn faults(&self) -> &[WorkerFault] {
        match self {
            Error::Faults(faults) => faults,
            _ => &[],
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::Internal(msg) => write!(f, "internal error: {}", msg),
            Error::Cancelled => write!(f, "render cancelled"),
            // Only the first failure is reported.
            Error::Faults(faults) => match faults.first() {
                Some(fault) => write!(f, "{}", fault),
                None => write!(f, "render failed"),
            },
        }
    }
}

impl std::error::Error for Error {}

/// A render of one set over one area, at a fixed pixel size.
pub struct RenderJob<'a> {
    set: &'a FractalSet,
    area: PlotArea,
    size: Size,
    threads: usize,
    batch: usize,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> RenderJob<'a> {
    /// A job using as many threads as rayon would, claiming one row at a time.
    pub fn new(set: &'a FractalSet, area: PlotArea, size: Size) -> Self {
        RenderJob {
            set,
            area,
            size,
            threads: rayon::current_num_threads(),
            batch: 1,
            cancel: None,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Number of rows a worker claims at once.
    pub fn with_batch(mut self, batch: usize) -> Self {
        self.batch = batch;
        self
    }

    /// Workers stop claiming rows once `flag` is set. The render then fails
    /// with [Error::Cancelled] if any rows were left unclaimed.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Renders into a new row-major buffer of escape values.
    pub fn render(&self) -> Result<Vec<f32>, Error> {
        let mut buffer = vec![0f32; self.size.area()];
        self.render_into(&mut buffer)?;
        Ok(buffer)
    }

    /// Renders into `buffer`, which must hold `width * height` values.
    pub fn render_into(&self, buffer: &mut [f32]) -> Result<(), Error> {
        let span = tracing::info_span!("render", set = %self.set);
        let _guard = span.enter();
        tracing::info!(
            width = self.size.width,
            height = self.size.height,
            threads = self.threads,
            batch = self.batch,
            "starting render"
        );

        self.run(buffer, |row, column| {
            let (x, y) = self.area.point(self.size, row, column);
            self.set.escape_value(x, y)
        })?;

        tracing::debug!("render complete");
        Ok(())
    }

    /// Fills `buffer` by calling `pixel(row, column)` on the worker pool.
    fn run<F>(&self, buffer: &mut [f32], pixel: F) -> Result<(), Error>
    where
        F: Fn(usize, usize) -> Result<f32, EvalError> + Sync,
    {
        if self.threads < 1 {
            return Err(Error::InvalidArgument("must provide >=1 thread".to_string()));
        }
        if self.batch < 1 {
            return Err(Error::InvalidArgument("batch must hold >=1 row".to_string()));
        }
        if buffer.len() != self.size.area() {
            return Err(Error::InvalidArgument(format!(
                "buffer size != width * height: {} != {} * {}",
                buffer.len(),
                self.size.width,
                self.size.height
            )));
        }
        if buffer.is_empty() {
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|idx| format!("mandel-worker-{}", idx))
            .build()
            .map_err(|err| Error::Internal(format!("error creating thread pool: {}", err)))?;

        let cursor = RowCursor::new(buffer, self.size.width, self.batch);
        // Runs once on every pool thread and waits for all of them.
        let outcomes = pool.broadcast(|ctx| {
            let worker = ctx.index();
            panic::catch_unwind(AssertUnwindSafe(|| self.work(&cursor, &pixel)))
                .unwrap_or_else(|payload| Err(FaultCause::Panic(panic_message(payload))))
                .map_err(|cause| {
                    tracing::error!(worker, %cause, "render worker failed");
                    WorkerFault { worker, cause }
                })
        });

        let faults: Vec<WorkerFault> = outcomes.into_iter().filter_map(Result::err).collect();
        if !faults.is_empty() {
            return Err(Error::Faults(faults));
        }
        // A flag raised after the last claim cancelled nothing.
        if self.is_cancelled() && !cursor.is_exhausted() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Body of one worker: claim batches until none are left.
    fn work<F>(&self, cursor: &RowCursor<'_, f32>, pixel: &F) -> Result<(), FaultCause>
    where
        F: Fn(usize, usize) -> Result<f32, EvalError>,
    {
        while let Some(Batch { rows, pixels }) = self.next_batch(cursor) {
            for (row, line) in rows.zip(pixels.chunks_mut(self.size.width)) {
                for (column, out) in line.iter_mut().enumerate() {
                    *out = pixel(row, column).map_err(FaultCause::Eval)?;
                }
            }
        }
        Ok(())
    }

    fn next_batch<'b>(&self, cursor: &RowCursor<'b, f32>) -> Option<Batch<'b, f32>> {
        if self.is_cancelled() {
            return None;
        }
        cursor.claim()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
