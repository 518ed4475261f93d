//! Values that describe one in-flight symbol resolution.
use core::{
    fmt::{Debug, Display, LowerHex},
    ops::{Add, Sub},
};

define_name!(
    /// The name of a function or data symbol requested by one module and
    /// defined by another.
    ///
    /// A provider may replace the requested name during the lookup phase; the
    /// original name is kept alongside the replacement for provenance.
    SymbolName
);

define_name!(
    /// Identifies a loaded module (the main program or a shared component) by
    /// its load name.
    ///
    /// Ids are only meaningful while the module stays loaded.
    ModuleId
);

/// An opaque, pointer-sized address.
///
/// The dispatcher never dereferences an `Address` itself, except through a
/// [`SlotWriter`](crate::slot::SlotWriter) when the final value is committed.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Address(pub usize);

impl Address {
    #[inline]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    #[inline]
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr as usize)
    }

    #[inline]
    pub const fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    #[inline]
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

impl Add<isize> for Address {
    type Output = Self;

    #[inline]
    fn add(self, rhs: isize) -> Self::Output {
        Address(self.0.wrapping_add_signed(rhs))
    }
}

impl Add<usize> for Address {
    type Output = Self;

    #[inline]
    fn add(self, rhs: usize) -> Self::Output {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<usize> for Address {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: usize) -> Self::Output {
        Address(self.0.wrapping_sub(rhs))
    }
}

impl From<usize> for Address {
    #[inline]
    fn from(addr: usize) -> Self {
        Self(addr)
    }
}

impl From<Address> for usize {
    #[inline]
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Address({:#x})", self.0)
    }
}

impl LowerHex for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        LowerHex::fmt(&self.0, f)
    }
}

/// An unresolved cross-module reference the loader needs satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The symbol the caller asks for.
    pub symbol: SymbolName,
    /// The module holding the reference.
    pub caller: ModuleId,
    /// The caller's indirection-table slot that receives the final address.
    pub slot: Address,
}

impl Reference {
    pub fn new(
        symbol: impl Into<SymbolName>,
        caller: impl Into<ModuleId>,
        slot: impl Into<Address>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            caller: caller.into(),
            slot: slot.into(),
        }
    }
}

/// A symbol definition found by the low-level search routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymDef {
    /// The module that defines the symbol.
    pub definer: ModuleId,
    /// The address of the definition.
    pub address: Address,
}
