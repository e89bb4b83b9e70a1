//! Compute-once storage for derived factor views.

#[cfg(not(feature = "std"))]
type Cell<V> = core::cell::OnceCell<V>;
#[cfg(feature = "std")]
type Cell<V> = std::sync::OnceLock<V>;

/// Whether the backing factor data can still produce views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FactorState {
    Valid,
    /// A soft factorization stopped at an exactly-zero pivot.
    Undefined,
}

/// A lazily computed value that is stored on first access and returned by
/// reference afterwards. Never invalidated.
#[derive(Debug)]
pub(crate) struct Cached<V> {
    cell: Cell<V>,
}

impl<V> Cached<V> {
    pub(crate) const fn new() -> Self {
        Self { cell: Cell::new() }
    }

    #[inline]
    pub(crate) fn get_or_init(&self, f: impl FnOnce() -> V) -> &V {
        self.cell.get_or_init(f)
    }

    #[cfg(test)]
    pub(crate) fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<V> Default for Cached<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for Cached<V> {
    fn clone(&self) -> Self {
        let cell = match self.cell.get() {
            Some(v) => Cell::from(v.clone()),
            None => Cell::new(),
        };
        Self { cell }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell as Counter;

    #[test]
    fn computes_once() {
        let calls = Counter::new(0);
        let c: Cached<u32> = Cached::new();
        assert!(!c.is_initialized());
        let a = c.get_or_init(|| {
            calls.set(calls.get() + 1);
            7
        }) as *const u32;
        let b = c.get_or_init(|| {
            calls.set(calls.get() + 1);
            8
        }) as *const u32;
        assert_eq!(calls.get(), 1);
        assert!(core::ptr::eq(a, b));
        assert!(c.is_initialized());
    }

    #[test]
    fn clone_carries_value() {
        let c: Cached<u32> = Cached::new();
        c.get_or_init(|| 3);
        let d = c.clone();
        assert!(d.is_initialized());
        assert_eq!(*d.get_or_init(|| 4), 3);
    }

    #[test]
    fn clone_of_empty_stays_empty() {
        let c: Cached<u32> = Cached::new();
        let d = c.clone();
        assert!(!d.is_initialized());
        assert_eq!(*d.get_or_init(|| 5), 5);
        assert!(!c.is_initialized());
    }
}
