use crate::symbol::{ModuleId, SymbolName};
use alloc::borrow::Cow;
use core::fmt::Display;

/// Why a forced module could not satisfy a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedModuleError {
    /// No loaded module carries the forced id.
    NotLoaded,
    /// The module is loaded but does not define the symbol.
    MissingSymbol,
}

/// Error types used throughout the `resolve_hooks` library.
///
/// Resolution errors are never retried by the dispatcher. Whether to
/// re-attempt is up to the layer that triggered the original reference.
#[derive(Debug, Clone)]
pub enum Error {
    /// No module in scope defines the (possibly redirected) symbol.
    ///
    /// Fatal to the load operation that triggered the reference.
    UnresolvedSymbol {
        /// The name that was searched for, after redirection.
        symbol: SymbolName,
        /// The module that holds the reference.
        caller: ModuleId,
    },

    /// The module forced by a provider's redirect could not satisfy the lookup.
    ///
    /// The provider's forcing decision is authoritative, so this is never
    /// followed by an unforced search.
    InvalidForcedModule {
        /// The name that was searched for, after redirection.
        symbol: SymbolName,
        /// The module the provider forced.
        module: ModuleId,
        /// Whether the module was missing or just lacked the symbol.
        reason: ForcedModuleError,
    },

    /// The hook provider failed to initialize.
    ///
    /// The provider stays permanently inactive afterwards.
    ProviderInit {
        /// A descriptive message about the initialization failure.
        msg: Cow<'static, str>,
    },

    /// The final address could not be written into the indirection-table slot.
    Patch {
        /// A descriptive message about the failed write.
        msg: Cow<'static, str>,
    },

    /// An error occurred in a user-defined callback or handler.
    Custom {
        /// A descriptive message about the custom error.
        msg: Cow<'static, str>,
    },
}

impl Error {
    /// Returns true for every flavour of "the symbol could not be found",
    /// forced or not. Both are handled the same way by a loader.
    #[inline]
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedSymbol { .. } | Error::InvalidForcedModule { .. }
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::UnresolvedSymbol { symbol, caller } => {
                write!(f, "Unresolved symbol: [{symbol}] referenced by [{caller}]")
            }
            Error::InvalidForcedModule {
                symbol,
                module,
                reason,
            } => match reason {
                ForcedModuleError::NotLoaded => write!(
                    f,
                    "Invalid forced module: [{module}] is not loaded, symbol [{symbol}]"
                ),
                ForcedModuleError::MissingSymbol => write!(
                    f,
                    "Invalid forced module: [{module}] does not define [{symbol}]"
                ),
            },
            Error::ProviderInit { msg } => write!(f, "Hook provider initialization error: {msg}"),
            Error::Patch { msg } => write!(f, "Slot patch error: {msg}"),
            Error::Custom { msg } => write!(f, "Custom error: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

#[cold]
#[inline(never)]
pub(crate) fn unresolved_error(symbol: &SymbolName, caller: &ModuleId) -> Error {
    Error::UnresolvedSymbol {
        symbol: symbol.clone(),
        caller: caller.clone(),
    }
}

#[cold]
#[inline(never)]
pub(crate) fn forced_module_error(
    symbol: &SymbolName,
    module: &ModuleId,
    reason: ForcedModuleError,
) -> Error {
    Error::InvalidForcedModule {
        symbol: symbol.clone(),
        module: module.clone(),
        reason,
    }
}

/// Creates a provider initialization error with the specified message.
///
/// Providers return this from [`HookProvider::initialize`](crate::HookProvider::initialize).
#[cold]
#[inline(never)]
pub fn init_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::ProviderInit { msg: msg.into() }
}

/// Creates a slot patch error with the specified message.
#[cold]
#[inline(never)]
pub fn patch_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Patch { msg: msg.into() }
}

/// Creates a custom error with the specified message.
#[cold]
#[inline(never)]
pub fn custom_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Custom { msg: msg.into() }
}
