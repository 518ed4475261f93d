//! Table-driven redirection.
use crate::{
    event::EventKind,
    provider::{HookProvider, Redirection},
    symbol::{ModuleId, SymbolName},
};
use alloc::vec::Vec;
use bitflags::bitflags;
use foldhash::fast::FixedState;
use hashbrown::HashMap;

bitflags! {
    /// The event kinds a table-driven provider opens its gate for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u8 {
        const LOOKUP = 1 << 0;
        const DEFINITION = 1 << 1;
        const OFFSET = 1 << 2;
        const SYMBOL_DEFINED = 1 << 3;
    }
}

impl From<EventKind> for EventMask {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Lookup => EventMask::LOOKUP,
            EventKind::Definition => EventMask::DEFINITION,
            EventKind::Offset => EventMask::OFFSET,
            EventKind::SymbolDefined => EventMask::SYMBOL_DEFINED,
        }
    }
}

struct Rule {
    /// `None` matches every caller.
    caller: Option<ModuleId>,
    outcome: Redirection,
}

/// A provider that redirects and offsets symbols from fixed tables.
///
/// A rule restricted to a caller wins over one that matches every caller,
/// whatever the insertion order.
///
/// # Examples
/// ```rust
/// use resolve_hooks::{HookProvider, Redirection};
/// use resolve_hooks::providers::{EventMask, RedirectTable};
///
/// let table = RedirectTable::builder()
///     .redirect("write", Redirection::to("logged_write"))
///     .redirect_from("libtest.so", "write", Redirection::none())
///     .offset("logged_write", "libtrace.so", 16)
///     .mask(EventMask::LOOKUP | EventMask::OFFSET)
///     .build();
///
/// assert_eq!(table.redirect("write", "app").symbol.as_deref(), Some("logged_write"));
/// assert_eq!(table.redirect("write", "libtest.so"), Redirection::none());
/// assert_eq!(table.offset_for("logged_write", "libtrace.so"), 16);
/// ```
pub struct RedirectTable {
    rules: HashMap<SymbolName, Vec<Rule>, FixedState>,
    offsets: HashMap<SymbolName, HashMap<ModuleId, isize, FixedState>, FixedState>,
    mask: EventMask,
}

impl RedirectTable {
    pub fn builder() -> RedirectTableBuilder {
        RedirectTableBuilder {
            table: RedirectTable {
                rules: HashMap::default(),
                offsets: HashMap::default(),
                mask: EventMask::all(),
            },
        }
    }

    #[inline]
    pub fn mask(&self) -> EventMask {
        self.mask
    }
}

/// Builder for [`RedirectTable`].
pub struct RedirectTableBuilder {
    table: RedirectTable,
}

impl RedirectTableBuilder {
    /// Redirects `symbol` for every caller.
    pub fn redirect(self, symbol: &str, outcome: Redirection) -> Self {
        self.rule(None, symbol, outcome)
    }

    /// Redirects `symbol` only when referenced from `caller`.
    pub fn redirect_from(self, caller: &str, symbol: &str, outcome: Redirection) -> Self {
        self.rule(Some(ModuleId::new(caller)), symbol, outcome)
    }

    /// Adds `offset` to `symbol` whenever it is defined by `definer`.
    pub fn offset(mut self, symbol: &str, definer: &str, offset: isize) -> Self {
        self.table
            .offsets
            .entry(SymbolName::new(symbol))
            .or_default()
            .insert(ModuleId::new(definer), offset);
        self
    }

    /// Selects which event kinds the gate lets through. Defaults to all.
    pub fn mask(mut self, mask: EventMask) -> Self {
        self.table.mask = mask;
        self
    }

    pub fn build(self) -> RedirectTable {
        self.table
    }

    fn rule(mut self, caller: Option<ModuleId>, symbol: &str, outcome: Redirection) -> Self {
        let rules = self.table.rules.entry(SymbolName::new(symbol)).or_default();
        match rules.iter_mut().find(|r| r.caller == caller) {
            Some(rule) => rule.outcome = outcome,
            None => rules.push(Rule { caller, outcome }),
        }
        self
    }
}

impl HookProvider for RedirectTable {
    fn gate(&self, kind: EventKind) -> bool {
        self.mask.contains(kind.into())
    }

    fn redirect(&self, symbol: &str, caller: &str) -> Redirection {
        let Some(rules) = self.rules.get(symbol) else {
            return Redirection::none();
        };
        rules
            .iter()
            .find(|r| r.caller.as_ref().is_some_and(|c| c.as_str() == caller))
            .or_else(|| rules.iter().find(|r| r.caller.is_none()))
            .map(|r| r.outcome.clone())
            .unwrap_or_default()
    }

    fn offset_for(&self, symbol: &str, definer: &str) -> isize {
        self.offsets
            .get(symbol)
            .and_then(|m| m.get(definer))
            .copied()
            .unwrap_or(0)
    }
}
