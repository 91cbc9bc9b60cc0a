//! Chunked data-parallel helpers for per-voxel passes.
//!
//! Reductions split the input into fixed-size chunks, fold each chunk on its
//! own and merge the partials in chunk order. The partition does not depend on
//! the thread pool, so floating-point sums are reproducible run to run.

use rayon::prelude::*;

/// Inputs shorter than this run on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 1 << 16;

/// Voxels per reduction chunk.
pub const CHUNK_LEN: usize = 1 << 12;

/// Folds every chunk with `fold_chunk(offset, chunk)` and merges the partial
/// results left to right starting from `init`.
pub fn chunked_fold_reduce<T, A, F, R>(data: &[T], init: A, fold_chunk: F, merge: R) -> A
where
    T: Sync,
    A: Send,
    F: Fn(usize, &[T]) -> A + Sync,
    R: Fn(A, A) -> A,
{
    let partials: Vec<A> = if data.len() >= PARALLEL_THRESHOLD {
        data.par_chunks(CHUNK_LEN)
            .enumerate()
            .map(|(i, chunk)| fold_chunk(i * CHUNK_LEN, chunk))
            .collect()
    } else {
        data.chunks(CHUNK_LEN)
            .enumerate()
            .map(|(i, chunk)| fold_chunk(i * CHUNK_LEN, chunk))
            .collect()
    };

    partials.into_iter().fold(init, merge)
}

/// Element-wise map, parallel above [`PARALLEL_THRESHOLD`].
pub fn parallel_map<T, U, F>(data: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    if data.len() >= PARALLEL_THRESHOLD {
        data.par_iter().map(f).collect()
    } else {
        data.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{CHUNK_LEN, PARALLEL_THRESHOLD, chunked_fold_reduce, parallel_map};

    #[test]
    fn offsets_cover_every_element_once() {
        let data: Vec<u64> = (0..(CHUNK_LEN as u64 * 3 + 17)).collect();
        let (count, index_sum) = chunked_fold_reduce(
            &data,
            (0usize, 0u64),
            |offset, chunk| {
                let mut s = 0u64;
                for (i, &v) in chunk.iter().enumerate() {
                    assert_eq!(v, (offset + i) as u64);
                    s += v;
                }
                (chunk.len(), s)
            },
            |a, b| (a.0 + b.0, a.1 + b.1),
        );
        assert_eq!(count, data.len());
        assert_eq!(index_sum, data.iter().sum::<u64>());
    }

    #[test]
    fn parallel_sum_is_reproducible() {
        let data: Vec<f64> = (0..PARALLEL_THRESHOLD * 2)
            .map(|i| ((i * 7919) % 1013) as f64 * 1e-3 + 1e-9)
            .collect();
        let sum = |d: &[f64]| {
            chunked_fold_reduce(d, 0.0f64, |_, c| c.iter().sum::<f64>(), |a, b| a + b)
        };
        let first = sum(&data);
        for _ in 0..4 {
            assert_eq!(sum(&data).to_bits(), first.to_bits());
        }
    }

    #[test]
    fn map_preserves_order() {
        let data: Vec<i32> = (0..(PARALLEL_THRESHOLD as i32 + 5)).collect();
        let out = parallel_map(&data, |v| v * 2);
        assert_eq!(out.len(), data.len());
        assert!(out.iter().enumerate().all(|(i, &v)| v == 2 * i as i32));

        let empty: Vec<i32> = Vec::new();
        assert!(parallel_map(&empty, |v| *v).is_empty());
    }
}
