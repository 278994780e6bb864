//! Parallel kernel execution
//!
//! Forks one worker per partition and joins all of them before returning.
//! Workers never share a writable index, so C needs no locking.

use futures::future::join_all;
use std::sync::Arc;
use std::thread;
use tracing::debug;

use super::{apply, check_lengths, KernelError, PartitionPlan};
use crate::models::Shape;

/// Fork/join executor for `C = A + k*B`
#[derive(Clone, Debug)]
pub struct ParallelExecutor {
    threads: usize,
}

impl ParallelExecutor {
    pub fn new(threads: usize) -> Self {
        Self { threads }
    }

    /// Build the partition plan for a shape.
    ///
    /// Matrices are split on row boundaries.
    pub fn plan(&self, shape: Shape) -> Result<PartitionPlan, KernelError> {
        match shape {
            Shape::Flat { len } => PartitionPlan::new(len, self.threads),
            Shape::Matrix { rows, cols } => PartitionPlan::over_rows(rows, cols, self.threads),
        }
    }

    fn prepare(
        &self,
        shape: Shape,
        a: &[i32],
        b: &[i32],
        c: &[i32],
    ) -> Result<PartitionPlan, KernelError> {
        let plan = self.plan(shape)?;
        check_lengths(a, b, c)?;
        if plan.len() != a.len() {
            return Err(KernelError::ShapeMismatch {
                expected: plan.len(),
                actual: a.len(),
            });
        }
        Ok(plan)
    }

    /// Compute on scoped OS threads.
    ///
    /// Returns the number of workers dispatched. Empty partitions are not
    /// dispatched.
    pub fn compute(
        &self,
        shape: Shape,
        a: &[i32],
        b: &[i32],
        c: &mut [i32],
        k: i32,
    ) -> Result<usize, KernelError> {
        let plan = self.prepare(shape, a, b, c)?;
        debug!("Partition grains: {:?}", plan.grain_sizes());
        fork_join(&plan, a, b, c, |a, b, out| apply(a, b, out, k))
    }

    /// Compute on blocking tasks of the current tokio runtime.
    ///
    /// Each task produces its own chunk; chunks are copied into C only after
    /// every task has been joined successfully.
    pub async fn compute_async(
        &self,
        shape: Shape,
        a: &Arc<[i32]>,
        b: &Arc<[i32]>,
        c: &mut [i32],
        k: i32,
    ) -> Result<usize, KernelError> {
        let plan = self.prepare(shape, a, b, c)?;
        fork_join_tasks(&plan, a, b, c, move |a, b, out| apply(a, b, out, k)).await
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(thread::available_parallelism().map_or(4, |n| n.get()))
    }
}

/// Run `body` over every non-empty partition on its own scoped thread.
///
/// All spawned workers are joined before returning, including when a spawn
/// or a worker fails; the first failure is reported.
pub(crate) fn fork_join<F>(
    plan: &PartitionPlan,
    a: &[i32],
    b: &[i32],
    c: &mut [i32],
    body: F,
) -> Result<usize, KernelError>
where
    F: Fn(&[i32], &[i32], &mut [i32]) + Sync,
{
    if plan.is_empty() {
        return Ok(0);
    }

    let body = &body;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(plan.workers());
        let mut failure = None;

        for (worker, (range, out)) in plan.ranges().iter().zip(plan.split_mut(c)).enumerate() {
            if range.is_empty() {
                continue;
            }
            let a = &a[range.clone()];
            let b = &b[range.clone()];

            debug!("Dispatching worker {} over {:?}", worker, range);
            let spawned = thread::Builder::new()
                .name(format!("kernel-worker-{worker}"))
                .spawn_scoped(scope, move || body(a, b, out));

            match spawned {
                Ok(handle) => handles.push((worker, handle)),
                Err(source) => {
                    failure = Some(KernelError::Spawn { worker, source });
                    break;
                }
            }
        }

        let dispatched = handles.len();
        for (worker, handle) in handles {
            if handle.join().is_err() && failure.is_none() {
                failure = Some(KernelError::WorkerPanicked { worker });
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(dispatched),
        }
    })
}

/// Run `body` over every non-empty partition as a blocking tokio task.
///
/// Each task fills its own chunk. C is written only after every task has been
/// joined successfully; otherwise the first failed task is reported and C is
/// left as it was.
pub(crate) async fn fork_join_tasks<F>(
    plan: &PartitionPlan,
    a: &Arc<[i32]>,
    b: &Arc<[i32]>,
    c: &mut [i32],
    body: F,
) -> Result<usize, KernelError>
where
    F: Fn(&[i32], &[i32], &mut [i32]) + Send + Sync + 'static,
{
    let body = Arc::new(body);
    let mut workers = Vec::new();
    let mut handles = Vec::new();
    for (worker, range) in plan.ranges().iter().enumerate() {
        if range.is_empty() {
            continue;
        }
        let a = Arc::clone(a);
        let b = Arc::clone(b);
        let body = Arc::clone(&body);
        let range = range.clone();

        debug!("Dispatching task {} over {:?}", worker, range);
        workers.push(worker);
        handles.push(tokio::task::spawn_blocking(move || {
            let mut chunk: Vec<i32> = vec![0; range.len()];
            body(&a[range.clone()], &b[range], &mut chunk);
            chunk
        }));
    }

    let dispatched = handles.len();
    let mut chunks = Vec::with_capacity(dispatched);
    let mut failure = None;
    for (worker, joined) in workers.into_iter().zip(join_all(handles).await) {
        match joined {
            Ok(chunk) => chunks.push(chunk),
            Err(source) => {
                if failure.is_none() {
                    failure = Some(KernelError::TaskFailed { worker, source });
                }
            }
        }
    }
    if let Some(err) = failure {
        return Err(err);
    }

    let targets = plan
        .ranges()
        .iter()
        .zip(plan.split_mut(c))
        .filter(|(range, _)| !range.is_empty())
        .map(|(_, out)| out);
    for (out, chunk) in targets.zip(chunks) {
        out.copy_from_slice(&chunk);
    }

    Ok(dispatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::compute_sequential;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_vec(rng: &mut StdRng, len: usize) -> Vec<i32> {
        (0..len).map(|_| rng.random()).collect()
    }

    #[test]
    fn test_parallel_basic() {
        let a = [1, 2, 3, 4, 5, 6];
        let b = [1; 6];
        let mut c = [0; 6];

        let executor = ParallelExecutor::new(3);
        let plan = executor.plan(Shape::flat(6)).unwrap();
        assert_eq!(plan.ranges(), &[0..2, 2..4, 4..6]);

        let dispatched = executor
            .compute(Shape::flat(6), &a, &b, &mut c, 5)
            .unwrap();
        assert_eq!(dispatched, 3);
        assert_eq!(c, [6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in [1, 2, 7, 100, 1023] {
            let a = random_vec(&mut rng, len);
            let b = random_vec(&mut rng, len);
            let k: i32 = rng.random();

            let mut expected = vec![0; len];
            compute_sequential(&a, &b, &mut expected, k).unwrap();

            for threads in [1, 2, 3, 8, len + 3] {
                let mut c = vec![0; len];
                ParallelExecutor::new(threads)
                    .compute(Shape::flat(len), &a, &b, &mut c, k)
                    .unwrap();
                assert_eq!(c, expected, "len={len} threads={threads}");
            }
        }
    }

    #[test]
    fn test_parallel_wraps_like_sequential() {
        let a = vec![i32::MAX; 9];
        let b = vec![i32::MAX; 9];
        let mut expected = vec![0; 9];
        let mut c = vec![0; 9];

        compute_sequential(&a, &b, &mut expected, 3).unwrap();
        ParallelExecutor::new(4)
            .compute(Shape::flat(9), &a, &b, &mut c, 3)
            .unwrap();
        assert_eq!(c, expected);
    }

    #[test]
    fn test_single_worker_matches_sequential() {
        let a: Vec<i32> = (0..50).collect();
        let b: Vec<i32> = (0..50).rev().collect();
        let mut expected = vec![0; 50];
        let mut c = vec![0; 50];

        compute_sequential(&a, &b, &mut expected, -2).unwrap();
        let dispatched = ParallelExecutor::new(1)
            .compute(Shape::flat(50), &a, &b, &mut c, -2)
            .unwrap();
        assert_eq!(dispatched, 1);
        assert_eq!(c, expected);
    }

    #[test]
    fn test_empty_input_dispatches_nothing() {
        let mut c: Vec<i32> = Vec::new();
        let dispatched = ParallelExecutor::new(4)
            .compute(Shape::flat(0), &[], &[], &mut c, 5)
            .unwrap();
        assert_eq!(dispatched, 0);
        assert!(c.is_empty());
    }

    #[test]
    fn test_more_threads_than_elements() {
        let mut c = [0; 3];
        let dispatched = ParallelExecutor::new(8)
            .compute(Shape::flat(3), &[1, 2, 3], &[1, 1, 1], &mut c, 1)
            .unwrap();
        assert_eq!(dispatched, 3);
        assert_eq!(c, [2, 3, 4]);
    }

    #[test]
    fn test_zero_threads_leaves_output_untouched() {
        let a = vec![1; 10];
        let b = vec![1; 10];
        let mut c = vec![-1; 10];
        let err = ParallelExecutor::new(0)
            .compute(Shape::flat(10), &a, &b, &mut c, 5)
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidThreadCount(0)));
        assert!(c.iter().all(|&v| v == -1));
    }

    #[test]
    fn test_length_mismatch() {
        let mut c = [0; 3];
        let err = ParallelExecutor::new(2)
            .compute(Shape::flat(3), &[1, 2, 3], &[1, 2], &mut c, 1)
            .unwrap_err();
        assert!(matches!(err, KernelError::LengthMismatch { .. }));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut c = [0; 4];
        let err = ParallelExecutor::new(2)
            .compute(Shape::matrix(3, 3), &[0; 4], &[0; 4], &mut c, 1)
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::ShapeMismatch {
                expected: 9,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_matrix_rows_stay_whole() {
        let shape = Shape::matrix(5, 3);
        let plan = ParallelExecutor::new(2).plan(shape).unwrap();
        assert!(plan.ranges().iter().all(|r| r.start % 3 == 0 && r.end % 3 == 0));

        let a: Vec<i32> = (0..15).collect();
        let b = vec![2; 15];
        let mut c = vec![0; 15];
        ParallelExecutor::new(2)
            .compute(shape, &a, &b, &mut c, 10)
            .unwrap();
        let expected: Vec<i32> = (0..15).map(|x| x + 20).collect();
        assert_eq!(c, expected);
    }

    #[test]
    fn test_worker_panic_surfaces_at_join() {
        let plan = PartitionPlan::new(8, 4).unwrap();
        let a = [0; 8];
        let b = [0; 8];
        let mut c = [0; 8];

        let result = fork_join(&plan, &a, &b, &mut c, |_, _, out| {
            if thread::current().name() == Some("kernel-worker-2") {
                panic!("injected fault");
            }
            out.fill(1);
        });

        assert!(matches!(result, Err(KernelError::WorkerPanicked { worker: 2 })));
    }

    #[tokio::test]
    async fn test_async_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(7);
        let len = 1000;
        let a: Arc<[i32]> = random_vec(&mut rng, len).into();
        let b: Arc<[i32]> = random_vec(&mut rng, len).into();

        let mut expected = vec![0; len];
        compute_sequential(&a, &b, &mut expected, 9).unwrap();

        for threads in [1, 3, 4, 16] {
            let mut c = vec![0; len];
            let dispatched = ParallelExecutor::new(threads)
                .compute_async(Shape::flat(len), &a, &b, &mut c, 9)
                .await
                .unwrap();
            assert_eq!(dispatched, threads);
            assert_eq!(c, expected);
        }
    }

    #[tokio::test]
    async fn test_task_panic_surfaces_at_join() {
        let plan = PartitionPlan::new(8, 4).unwrap();
        let a: Arc<[i32]> = vec![0, 0, 0, 0, 99, 99, 0, 0].into();
        let b: Arc<[i32]> = vec![0; 8].into();
        let mut c = vec![-1; 8];

        let result = fork_join_tasks(&plan, &a, &b, &mut c, |a, _, out| {
            if a[0] == 99 {
                panic!("injected fault");
            }
            out.fill(1);
        })
        .await;

        match result {
            Err(KernelError::TaskFailed { worker, source }) => {
                assert_eq!(worker, 2);
                assert!(source.is_panic());
            }
            other => panic!("Expected TaskFailed, got {other:?}"),
        }
        assert!(c.iter().all(|&v| v == -1));
    }

    #[tokio::test]
    async fn test_async_zero_threads() {
        let a: Arc<[i32]> = vec![1; 10].into();
        let b: Arc<[i32]> = vec![1; 10].into();
        let mut c = vec![0; 10];
        let err = ParallelExecutor::new(0)
            .compute_async(Shape::flat(10), &a, &b, &mut c, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidThreadCount(0)));
        assert!(c.iter().all(|&v| v == 0));
    }

    #[tokio::test]
    async fn test_async_empty_input() {
        let empty: Arc<[i32]> = Vec::new().into();
        let mut c: Vec<i32> = Vec::new();
        let dispatched = ParallelExecutor::new(2)
            .compute_async(Shape::flat(0), &empty, &empty, &mut c, 1)
            .await
            .unwrap();
        assert_eq!(dispatched, 0);
    }
}
