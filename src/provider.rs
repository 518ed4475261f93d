//! The pluggable hook provider and the outcome of its redirect capability.
use crate::{
    Result,
    event::{Definition, EventKind},
    symbol::{Address, ModuleId, SymbolName},
    sync::Arc,
};
use alloc::boxed::Box;

/// What a provider decided in the lookup phase.
///
/// A `symbol` equal to the requested one is not a redirection, but a forced
/// `module` is still honored in that case.
///
/// # Examples
/// ```rust
/// use resolve_hooks::Redirection;
///
/// // search for "bar" instead, and only in "libB.so"
/// let r = Redirection::to("bar").force("libB.so");
/// assert!(r.is_redirect("foo"));
/// assert!(!Redirection::none().is_redirect("foo"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirection {
    /// The name to resolve instead of the requested one.
    pub symbol: Option<SymbolName>,
    /// The only module to search.
    pub module: Option<ModuleId>,
}

impl Redirection {
    /// Leaves the reference untouched.
    #[inline]
    pub const fn none() -> Self {
        Self {
            symbol: None,
            module: None,
        }
    }

    /// Resolves `symbol` instead of the requested name.
    #[inline]
    pub fn to(symbol: impl Into<SymbolName>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            module: None,
        }
    }

    /// Restricts the search to `module`.
    #[inline]
    pub fn force(mut self, module: impl Into<ModuleId>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Whether this outcome renames `requested`.
    #[inline]
    pub fn is_redirect(&self, requested: &str) -> bool {
        self.symbol
            .as_ref()
            .is_some_and(|s| s.as_str() != requested)
    }
}

/// A component observing, and optionally steering, symbol resolution.
///
/// One provider is installed per [`Dispatcher`](crate::Dispatcher). Every
/// capability is a direct, blocking call on the resolving thread, so
/// implementations should return quickly. Concurrent resolutions call into the
/// same provider; any shared state it mutates must be synchronized internally.
///
/// Only [`redirect`](HookProvider::redirect) and
/// [`offset_for`](HookProvider::offset_for) influence the outcome. The
/// notifications are strictly observational.
///
/// All capabilities have pass-through defaults, so a provider only implements
/// what it needs. String arguments are borrowed for the duration of the call.
///
/// # Examples
/// ```rust
/// use resolve_hooks::{EventKind, HookProvider, Redirection};
///
/// struct Wrap;
///
/// impl HookProvider for Wrap {
///     fn gate(&self, kind: EventKind) -> bool {
///         kind == EventKind::Lookup
///     }
///
///     fn redirect(&self, symbol: &str, _caller: &str) -> Redirection {
///         if symbol == "malloc" {
///             Redirection::to("traced_malloc")
///         } else {
///             Redirection::none()
///         }
///     }
/// }
/// ```
pub trait HookProvider {
    /// Called exactly once, before any other capability.
    ///
    /// On error the provider is treated as inactive for the lifetime of the
    /// dispatcher: its gate is never consulted again.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Decides whether the capability paired with `kind` runs.
    ///
    /// Consulted before every capability call, every time.
    fn gate(&self, _kind: EventKind) -> bool {
        true
    }

    /// Optionally redirects a reference before it is searched for.
    fn redirect(&self, _symbol: &str, _caller: &str) -> Redirection {
        Redirection::none()
    }

    /// Returns a signed adjustment added to the resolved address.
    ///
    /// `symbol` and `definer` describe the final, post-redirection definition.
    fn offset_for(&self, _symbol: &str, _definer: &str) -> isize {
        0
    }

    /// Read-only notification of what was found. The return value is advisory.
    fn observe_definition(&self, _def: &Definition<'_>) -> bool {
        true
    }

    /// Notification fired when the low-level search routine completes. The
    /// return value is advisory.
    fn on_symbol_defined(&self, _symbol: &str, _definer: &str, _address: Address) -> bool {
        true
    }
}

/// The inactive provider: every gate is closed.
impl HookProvider for () {
    fn gate(&self, _kind: EventKind) -> bool {
        false
    }
}

impl<P: HookProvider + ?Sized> HookProvider for &P {
    fn initialize(&self) -> Result<()> {
        (**self).initialize()
    }

    fn gate(&self, kind: EventKind) -> bool {
        (**self).gate(kind)
    }

    fn redirect(&self, symbol: &str, caller: &str) -> Redirection {
        (**self).redirect(symbol, caller)
    }

    fn offset_for(&self, symbol: &str, definer: &str) -> isize {
        (**self).offset_for(symbol, definer)
    }

    fn observe_definition(&self, def: &Definition<'_>) -> bool {
        (**self).observe_definition(def)
    }

    fn on_symbol_defined(&self, symbol: &str, definer: &str, address: Address) -> bool {
        (**self).on_symbol_defined(symbol, definer, address)
    }
}

impl<P: HookProvider + ?Sized> HookProvider for Box<P> {
    fn initialize(&self) -> Result<()> {
        (**self).initialize()
    }

    fn gate(&self, kind: EventKind) -> bool {
        (**self).gate(kind)
    }

    fn redirect(&self, symbol: &str, caller: &str) -> Redirection {
        (**self).redirect(symbol, caller)
    }

    fn offset_for(&self, symbol: &str, definer: &str) -> isize {
        (**self).offset_for(symbol, definer)
    }

    fn observe_definition(&self, def: &Definition<'_>) -> bool {
        (**self).observe_definition(def)
    }

    fn on_symbol_defined(&self, symbol: &str, definer: &str, address: Address) -> bool {
        (**self).on_symbol_defined(symbol, definer, address)
    }
}

impl<P: HookProvider + ?Sized> HookProvider for Arc<P> {
    fn initialize(&self) -> Result<()> {
        (**self).initialize()
    }

    fn gate(&self, kind: EventKind) -> bool {
        (**self).gate(kind)
    }

    fn redirect(&self, symbol: &str, caller: &str) -> Redirection {
        (**self).redirect(symbol, caller)
    }

    fn offset_for(&self, symbol: &str, definer: &str) -> isize {
        (**self).offset_for(symbol, definer)
    }

    fn observe_definition(&self, def: &Definition<'_>) -> bool {
        (**self).observe_definition(def)
    }

    fn on_symbol_defined(&self, symbol: &str, definer: &str, address: Address) -> bool {
        (**self).on_symbol_defined(symbol, definer, address)
    }
}
