//! Compatibility layer for rayon/sequential execution.
//!
//! With the `parallel` feature enabled this re-exports rayon's parallel
//! iterators. Without it, a sequential stand-in provides the same method
//! names so call sites compile unchanged.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    ///
    /// `into_par_iter()` resolves to `into_iter()`, so the rest of the
    /// chain (`.map()`, `.filter()`, `.collect()`) uses the standard
    /// `Iterator` methods.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }

    /// Sequential stand-in for `rayon::prelude::ParallelSliceMut`.
    pub trait ParallelSliceMut<T> {
        fn par_sort_unstable_by<F>(&mut self, compare: F)
        where
            F: Fn(&T, &T) -> std::cmp::Ordering;
    }

    impl<T> ParallelSliceMut<T> for [T] {
        fn par_sort_unstable_by<F>(&mut self, compare: F)
        where
            F: Fn(&T, &T) -> std::cmp::Ordering,
        {
            self.sort_unstable_by(compare);
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
