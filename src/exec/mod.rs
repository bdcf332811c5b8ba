//! Execution backends for the per-tick kernels.
//!
//! A kernel is a closure run once per row of an output buffer. Shared borrows
//! captured by the closure are its read bindings and the row slice is its
//! only write binding, so rows never alias. Every dispatch returns after all
//! rows have completed, which is the barrier between pipeline stages.

#[cfg(feature = "gpu-compute")]
pub mod gpu;

use rayon::prelude::*;

use crate::params::{BackendKind, ExecutionConfig};

/// CPU executor for row kernels
#[derive(Debug)]
pub enum Executor {
    /// Rows run in order on the calling thread
    Serial,
    /// Rows are distributed over a dedicated rayon pool
    ThreadPool(rayon::ThreadPool),
}

impl Executor {
    /// Create executor for the configured CPU backend
    ///
    /// `BackendKind::Gpu` maps to the thread pool; the GPU pipeline is built
    /// separately by the simulation state.
    pub fn from_config(config: &ExecutionConfig) -> Self {
        match config.backend {
            BackendKind::Serial => Executor::Serial,
            BackendKind::Threads | BackendKind::Gpu => Self::thread_pool(config.threads),
        }
    }

    /// Build a rayon pool, falling back to serial execution if the pool cannot start
    pub fn thread_pool(threads: Option<usize>) -> Self {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("fftocean-{}", i));
        if let Some(count) = threads {
            builder = builder.num_threads(count);
        }

        match builder.build() {
            Ok(pool) => {
                log::debug!("Thread pool started with {} workers", pool.current_num_threads());
                Executor::ThreadPool(pool)
            }
            Err(e) => {
                log::warn!("Failed to start thread pool ({}), running serially", e);
                Executor::Serial
            }
        }
    }

    /// Worker count (1 for serial)
    pub fn parallelism(&self) -> usize {
        match self {
            Executor::Serial => 1,
            Executor::ThreadPool(pool) => pool.current_num_threads(),
        }
    }

    /// Run `kernel(row_index, row)` for every `width`-long row of `out`
    pub fn dispatch_rows<T, F>(&self, out: &mut [T], width: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        match self {
            Executor::Serial => out
                .chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| kernel(y, row)),
            Executor::ThreadPool(pool) => pool.install(|| {
                out.par_chunks_mut(width)
                    .enumerate()
                    .for_each(|(y, row)| kernel(y, row))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_visits_every_row_once() {
        for exec in [Executor::Serial, Executor::thread_pool(Some(3))] {
            let width = 5;
            let mut out = vec![0usize; width * 7];
            exec.dispatch_rows(&mut out, width, |y, row| {
                for (x, v) in row.iter_mut().enumerate() {
                    *v += y * width + x + 1;
                }
            });
            let expected: Vec<usize> = (1..=width * 7).collect();
            assert_eq!(out, expected);
        }
    }

    #[test]
    fn test_backend_selection() {
        let serial = Executor::from_config(&ExecutionConfig {
            backend: BackendKind::Serial,
            threads: None,
        });
        assert_eq!(serial.parallelism(), 1);

        let pooled = Executor::from_config(&ExecutionConfig {
            backend: BackendKind::Threads,
            threads: Some(2),
        });
        assert_eq!(pooled.parallelism(), 2);
    }
}
