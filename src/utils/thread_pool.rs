use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;
use std::sync::LazyLock;

static HASH_POOL: OnceCell<Arc<rayon::ThreadPool>> = OnceCell::new();

static NUM_CPUS: LazyLock<usize> = LazyLock::new(|| {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
});

/// Number of hardware threads available to this process.
#[must_use]
pub fn available_threads() -> usize {
    *NUM_CPUS
}

/// Get the hashing pool, building it with `num_threads` workers on first use.
///
/// The first caller fixes the size; later calls reuse the same pool.
///
/// # Errors
///
/// Returns an error if rayon cannot spawn the worker threads.
pub fn hashing_pool(num_threads: usize) -> anyhow::Result<Arc<rayon::ThreadPool>> {
    HASH_POOL
        .get_or_try_init(|| {
            let pool = ThreadPoolBuilder::new()
                .num_threads(num_threads.max(1))
                .thread_name(|i| format!("dirsnap-hash-{i}"))
                .build()?;
            Ok(Arc::new(pool))
        })
        .cloned()
}

/// Run a function inside the hashing pool
///
/// # Errors
///
/// Returns an error if the pool cannot be created.
pub fn run_in_pool<F, R>(num_threads: usize, f: F) -> anyhow::Result<R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    let pool = hashing_pool(num_threads)?;
    Ok(pool.install(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_available_threads_positive() {
        assert!(available_threads() >= 1);
    }

    #[test]
    fn test_run_in_pool_preserves_order() -> anyhow::Result<()> {
        let doubled: Vec<u32> = run_in_pool(2, || (0..64u32).into_par_iter().map(|n| n * 2).collect())?;
        assert_eq!(doubled, (0..64u32).map(|n| n * 2).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_pool_is_reused() -> anyhow::Result<()> {
        let first = hashing_pool(2)?;
        let second = hashing_pool(4)?;
        assert!(Arc::ptr_eq(&first, &second));
        Ok(())
    }
}
