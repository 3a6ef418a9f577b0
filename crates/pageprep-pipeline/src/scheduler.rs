use rayon::prelude::*;

use pageprep_core::{PageRequest, PageResponse};

/// Dispatches pages across a bounded worker pool.
///
/// Each page runs as one isolated invocation with no shared mutable state
/// between pages; the pool only bounds how many run concurrently.
/// Response order always matches request order.
pub struct PageScheduler {
    pool: Option<rayon::ThreadPool>,
    workers: usize,
}

impl PageScheduler {
    /// Build a scheduler with a dedicated pool of `workers` threads.
    /// `0` (or a pool build failure) uses the process-global pool.
    pub fn new(workers: usize) -> Self {
        let pool = if workers == 0 {
            None
        } else {
            rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("pageprep-worker-{i}"))
                .build()
                .map_err(|e| {
                    tracing::warn!(error = %e, "worker pool unavailable, using global pool");
                })
                .ok()
        };
        Self { pool, workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `process` over every request in parallel, preserving order.
    pub fn dispatch<F>(&self, requests: Vec<PageRequest>, process: F) -> Vec<PageResponse>
    where
        F: Fn(PageRequest) -> PageResponse + Sync,
    {
        let run = || requests.into_par_iter().map(&process).collect();
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageprep_core::PageBitmap;

    fn request(page_number: u64) -> PageRequest {
        PageRequest {
            bitmap: PageBitmap::new(2, 2, vec![255u8; 16]).unwrap(),
            page_number,
        }
    }

    #[test]
    fn dispatch_preserves_request_order() {
        let scheduler = PageScheduler::new(3);
        let requests: Vec<_> = (0..32).map(request).collect();
        let responses = scheduler.dispatch(requests, |r| PageResponse::Failure {
            page_number: r.page_number,
            error: "probe".into(),
        });
        let order: Vec<_> = responses.iter().map(|r| r.page_number()).collect();
        assert_eq!(order, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn zero_workers_falls_back_to_global_pool() {
        let scheduler = PageScheduler::new(0);
        let responses = scheduler.dispatch(vec![request(7)], |r| PageResponse::Failure {
            page_number: r.page_number,
            error: "probe".into(),
        });
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].page_number(), 7);
    }
}
