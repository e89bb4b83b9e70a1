//! Parallelism selection for the kernels that can fan work out.
//!
//! Only the row updates of the `L·D·Lᵗ` factorization use it today: for a
//! fixed pivot the rows below it are independent, so they are dispatched
//! together and joined before the next pivot starts.

/// Parallelism strategy passed to the factorizations that support it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// Run sequentially on the calling thread.
    #[default]
    None,
    /// Run on the active rayon thread pool. Only available with the `rayon`
    /// feature.
    ///
    /// The value bounds the number of workers an operation should split
    /// into. `0` means `rayon::current_num_threads()`.
    #[cfg(feature = "rayon")]
    Rayon(usize),
}

/// Rows handed to a single worker are never fewer than this.
#[cfg(feature = "rayon")]
const MIN_ROWS_PER_TASK: usize = 64;

impl Parallelism {
    /// Number of threads this strategy would ideally use.
    pub fn degree(self) -> usize {
        match self {
            Parallelism::None => 1,
            #[cfg(feature = "rayon")]
            Parallelism::Rayon(0) => rayon::current_num_threads(),
            #[cfg(feature = "rayon")]
            Parallelism::Rayon(n) => n,
        }
    }
}

/// Apply `op(i, &mut items[i])` to every element, possibly in parallel.
///
/// Returns only after every element has been visited.
#[inline]
pub(crate) fn for_each_indexed<T: Send>(
    items: &mut [T],
    op: impl Send + Sync + Fn(usize, &mut T),
    parallelism: Parallelism,
) {
    match parallelism {
        Parallelism::None => items.iter_mut().enumerate().for_each(|(i, x)| op(i, x)),
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(_) => {
            let n_threads = parallelism.degree();
            if n_threads <= 1 || items.len() < 2 * MIN_ROWS_PER_TASK {
                items.iter_mut().enumerate().for_each(|(i, x)| op(i, x));
                return;
            }
            use rayon::prelude::*;
            let min_len = items.len().div_ceil(n_threads).max(MIN_ROWS_PER_TASK);
            items
                .par_iter_mut()
                .enumerate()
                .with_min_len(min_len)
                .for_each(|(i, x)| op(i, x));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_visits_every_index() {
        let mut v = [0usize; 10];
        for_each_indexed(&mut v, |i, x| *x = i * i, Parallelism::None);
        assert_eq!(v[3], 9);
        assert_eq!(v[9], 81);
    }

    #[test]
    fn default_is_sequential() {
        assert_eq!(Parallelism::default(), Parallelism::None);
        assert_eq!(Parallelism::None.degree(), 1);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn rayon_matches_sequential() {
        let mut a = [0.0f64; 1000];
        let mut b = [0.0f64; 1000];
        let f = |i: usize, x: &mut f64| *x = (i as f64).sqrt();
        for_each_indexed(&mut a, f, Parallelism::None);
        for_each_indexed(&mut b, f, Parallelism::Rayon(4));
        assert_eq!(a, b);
    }
}
