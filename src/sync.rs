//! Atomics and shared ownership, switched to `portable-atomic` on targets
//! without native pointer-sized atomic operations.

cfg_if::cfg_if! {
    if #[cfg(feature = "portable-atomic")] {
        pub(crate) use portable_atomic::{AtomicUsize, Ordering};
        pub use portable_atomic_util::Arc;
    } else {
        pub(crate) use core::sync::atomic::{AtomicUsize, Ordering};
        pub use alloc::sync::Arc;
    }
}
