//! Committing the final address into a caller's indirection-table slot.
use crate::{
    Result,
    error::patch_error,
    symbol::Address,
    sync::{Arc, AtomicUsize, Ordering},
};
use alloc::{boxed::Box, format, vec::Vec};

/// Writes the final resolved value into a slot.
///
/// The write is not guaranteed to be atomic with respect to other threads
/// reading the same slot; callers that need that must serialize binding.
pub trait SlotWriter {
    fn write(&self, slot: Address, value: Address) -> Result<()>;
}

impl<W: SlotWriter + ?Sized> SlotWriter for &W {
    #[inline]
    fn write(&self, slot: Address, value: Address) -> Result<()> {
        (**self).write(slot, value)
    }
}

impl<W: SlotWriter + ?Sized> SlotWriter for Arc<W> {
    #[inline]
    fn write(&self, slot: Address, value: Address) -> Result<()> {
        (**self).write(slot, value)
    }
}

/// Writes through the raw slot address, like a loader patching a GOT entry.
#[derive(Debug, Clone, Copy)]
pub struct RawSlots {
    _private: (),
}

impl RawSlots {
    /// # Safety
    /// Every slot address that reaches this writer must point to a valid,
    /// aligned, writable `usize` that nobody else is accessing during the write.
    #[inline]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl SlotWriter for RawSlots {
    #[inline]
    fn write(&self, slot: Address, value: Address) -> Result<()> {
        let ptr = slot.as_mut_ptr::<usize>();
        if ptr.is_null() || !ptr.is_aligned() {
            return Err(patch_error(format!("unaligned or null slot {slot}")));
        }
        // SAFETY: guaranteed by the contract of `RawSlots::new`.
        unsafe { ptr.write(value.get()) };
        Ok(())
    }
}

/// A fixed-size table of slots owned by the caller.
///
/// Slot addresses are the real addresses of the table cells, so they can be
/// handed to providers like any other slot address. Writes that do not hit a
/// cell are rejected instead of touching memory.
pub struct IndirectionTable {
    cells: Box<[AtomicUsize]>,
}

impl IndirectionTable {
    /// Creates a table of `len` zeroed slots.
    pub fn new(len: usize) -> Self {
        let cells: Vec<AtomicUsize> = (0..len).map(|_| AtomicUsize::new(0)).collect();
        Self {
            cells: cells.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Gets the address of slot `idx`.
    ///
    /// # Panics
    /// Panics if `idx` is out of bounds.
    #[inline]
    pub fn slot(&self, idx: usize) -> Address {
        Address::from_ptr(&self.cells[idx] as *const AtomicUsize)
    }

    /// Gets the current value of slot `idx`.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<usize> {
        self.cells.get(idx).map(|c| c.load(Ordering::Acquire))
    }

    /// Maps a slot address back to its index.
    pub fn index_of(&self, slot: Address) -> Option<usize> {
        let base = self.cells.as_ptr() as usize;
        let off = slot.get().checked_sub(base)?;
        if off % size_of::<AtomicUsize>() != 0 {
            return None;
        }
        let idx = off / size_of::<AtomicUsize>();
        (idx < self.cells.len()).then_some(idx)
    }
}

impl SlotWriter for IndirectionTable {
    fn write(&self, slot: Address, value: Address) -> Result<()> {
        let Some(idx) = self.index_of(slot) else {
            return Err(patch_error(format!(
                "slot {slot} is outside the indirection table"
            )));
        };
        self.cells[idx].store(value.get(), Ordering::Release);
        Ok(())
    }
}

impl core::fmt::Debug for IndirectionTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IndirectionTable")
            .field("base", &Address::from_ptr(self.cells.as_ptr()))
            .field("len", &self.cells.len())
            .finish()
    }
}
