//! A passive provider that counts what it sees.
use crate::{
    event::{Definition, EventKind},
    provider::HookProvider,
    symbol::Address,
    sync::{AtomicUsize, Ordering},
};

const fn slot(kind: EventKind) -> usize {
    match kind {
        EventKind::Lookup => 0,
        EventKind::Definition => 1,
        EventKind::Offset => 2,
        EventKind::SymbolDefined => 3,
    }
}

/// Counts gate checks and capability calls per event kind.
///
/// Never redirects and never offsets. With the `log` feature every
/// notification is also logged at debug level.
#[derive(Debug, Default)]
pub struct EventCounter {
    gates: [AtomicUsize; 4],
    calls: [AtomicUsize; 4],
}

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the gate was consulted for `kind`.
    #[inline]
    pub fn gate_checks(&self, kind: EventKind) -> usize {
        self.gates[slot(kind)].load(Ordering::Relaxed)
    }

    /// How many times the capability paired with `kind` ran.
    #[inline]
    pub fn calls(&self, kind: EventKind) -> usize {
        self.calls[slot(kind)].load(Ordering::Relaxed)
    }

    #[inline]
    fn hit(&self, kind: EventKind) {
        self.calls[slot(kind)].fetch_add(1, Ordering::Relaxed);
    }
}

impl HookProvider for EventCounter {
    fn gate(&self, kind: EventKind) -> bool {
        self.gates[slot(kind)].fetch_add(1, Ordering::Relaxed);
        true
    }

    fn redirect(&self, _symbol: &str, _caller: &str) -> crate::Redirection {
        self.hit(EventKind::Lookup);
        crate::Redirection::none()
    }

    fn offset_for(&self, _symbol: &str, _definer: &str) -> isize {
        self.hit(EventKind::Offset);
        0
    }

    fn observe_definition(&self, def: &Definition<'_>) -> bool {
        self.hit(EventKind::Definition);
        #[cfg(feature = "log")]
        log::debug!(
            "[{}] [{}] defined by [{}] at {}, slot {}",
            def.caller,
            def.symbol,
            def.definer,
            def.address,
            def.slot
        );
        #[cfg(not(feature = "log"))]
        let _ = def;
        true
    }

    fn on_symbol_defined(&self, symbol: &str, definer: &str, address: Address) -> bool {
        self.hit(EventKind::SymbolDefined);
        #[cfg(feature = "log")]
        log::debug!("symdef [{symbol}] in [{definer}] at {address}");
        #[cfg(not(feature = "log"))]
        let _ = (symbol, definer, address);
        true
    }
}
