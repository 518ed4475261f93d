//! Event kinds and the borrowed event views handed out during a resolution.
use crate::{
    Error,
    error::custom_error,
    symbol::{Address, ModuleId, SymbolName},
};
use alloc::format;

/// Numeric code of the internal forced-lookup signal.
///
/// It is never accepted by [`EventKind::try_from`], so it cannot reach a gate.
pub const FORCE_LOOKUP_CODE: i32 = -10;

/// The event kinds a provider can gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EventKind {
    /// Before the search, when the provider may redirect the reference.
    Lookup = 10,
    /// After the search, read-only view of what was found.
    Definition = 20,
    /// Before the slot is patched, when the provider may adjust the address.
    Offset = 30,
    /// After the low-level search routine has completed.
    SymbolDefined = 40,
}

impl EventKind {
    /// All gate-visible kinds, in the order they fire.
    pub const ALL: [EventKind; 4] = [
        EventKind::Lookup,
        EventKind::Definition,
        EventKind::Offset,
        EventKind::SymbolDefined,
    ];

    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::Lookup => "lookup",
            EventKind::Definition => "definition",
            EventKind::Offset => "offset",
            EventKind::SymbolDefined => "symdef",
        }
    }
}

impl TryFrom<i32> for EventKind {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self, Error> {
        match code {
            10 => Ok(EventKind::Lookup),
            20 => Ok(EventKind::Definition),
            30 => Ok(EventKind::Offset),
            40 => Ok(EventKind::SymbolDefined),
            FORCE_LOOKUP_CODE => Err(custom_error("force lookup is not a gated event")),
            _ => Err(custom_error(format!("unknown event code: {code}"))),
        }
    }
}

/// Everything the observe-definition capability gets to see.
///
/// All fields are borrowed for the duration of the call. A provider that
/// wants to keep any of them must copy.
#[derive(Debug, Clone, Copy)]
pub struct Definition<'a> {
    /// The symbol that was actually resolved.
    pub symbol: &'a str,
    /// The module containing the definition.
    pub definer: &'a str,
    /// Address of the definition, before any offset adjustment.
    pub address: Address,
    /// The symbol the caller originally asked for.
    pub requested: &'a str,
    /// The module holding the reference.
    pub caller: &'a str,
    /// The caller's slot that will receive the final address.
    pub slot: Address,
}

impl Definition<'_> {
    /// Whether the resolved symbol differs from the requested one.
    #[inline]
    pub fn is_redirected(&self) -> bool {
        self.symbol != self.requested
    }
}

/// A borrowed view of the event the dispatcher is processing.
#[derive(Debug, Clone, Copy)]
pub enum ResolutionEvent<'a> {
    /// Internal re-dispatch into a single forced module. Never gated.
    ForceLookup {
        symbol: &'a str,
        module: &'a str,
        requested: &'a str,
        caller: &'a str,
        slot: Address,
    },
    /// The reference is about to be searched for.
    ///
    /// `symbol` is the name that will be searched, `requested` the one the
    /// caller asked for. They differ once a redirect has been applied.
    Lookup {
        symbol: &'a str,
        requested: &'a str,
        caller: &'a str,
        slot: Address,
    },
    /// A definition has been found.
    Definition(Definition<'a>),
    /// An address adjustment is about to be computed.
    Offset {
        symbol: &'a str,
        definer: &'a str,
        address: Address,
        requested: &'a str,
        caller: &'a str,
        slot: Address,
    },
    /// The low-level search routine has completed.
    ///
    /// Bookkeeping only, so it carries no caller.
    SymbolDefined {
        symbol: &'a str,
        definer: &'a str,
        address: Address,
    },
}

impl<'a> ResolutionEvent<'a> {
    /// The gate-visible kind of this event, `None` for a forced lookup.
    #[inline]
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            ResolutionEvent::ForceLookup { .. } => None,
            ResolutionEvent::Lookup { .. } => Some(EventKind::Lookup),
            ResolutionEvent::Definition(_) => Some(EventKind::Definition),
            ResolutionEvent::Offset { .. } => Some(EventKind::Offset),
            ResolutionEvent::SymbolDefined { .. } => Some(EventKind::SymbolDefined),
        }
    }

    #[inline]
    pub fn code(&self) -> i32 {
        self.kind().map_or(FORCE_LOOKUP_CODE, EventKind::code)
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind().map_or("force-lookup", EventKind::name)
    }

    /// The symbol name the event is about.
    #[inline]
    pub fn symbol(&self) -> &'a str {
        match *self {
            ResolutionEvent::ForceLookup { symbol, .. }
            | ResolutionEvent::Lookup { symbol, .. }
            | ResolutionEvent::Offset { symbol, .. }
            | ResolutionEvent::SymbolDefined { symbol, .. } => symbol,
            ResolutionEvent::Definition(def) => def.symbol,
        }
    }

    pub(crate) fn lookup(
        symbol: &'a SymbolName,
        requested: &'a SymbolName,
        caller: &'a ModuleId,
        slot: Address,
    ) -> Self {
        ResolutionEvent::Lookup {
            symbol,
            requested,
            caller,
            slot,
        }
    }
}
