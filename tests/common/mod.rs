#![allow(dead_code)]

use resolve_hooks::{
    Address, Definition, EventKind, HookProvider, LoadedModule, Redirection, Result, init_error,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// libA calls into libB and libC; libB defines "bar" at 0x1000.
pub fn scope() -> Vec<LoadedModule> {
    vec![
        LoadedModule::new("app").define("main", 0x400),
        LoadedModule::new("libA.so").define("foo", 0x500),
        LoadedModule::new("libB.so")
            .define("bar", 0x1000)
            .define("foo", 0x1800),
        LoadedModule::new("libC.so").define("baz", 0x2000),
    ]
}

/// One capability call, with owned copies of its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init,
    Gate(EventKind),
    Redirect {
        symbol: String,
        caller: String,
    },
    Offset {
        symbol: String,
        definer: String,
    },
    Definition {
        symbol: String,
        definer: String,
        address: usize,
        requested: String,
        caller: String,
        slot: usize,
    },
    SymbolDefined {
        symbol: String,
        definer: String,
        address: usize,
    },
}

/// A provider that records every call and answers from configurable tables.
#[derive(Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<Call>>,
    pub closed: Vec<EventKind>,
    pub redirects: HashMap<String, Redirection>,
    pub offsets: HashMap<(String, String), isize>,
    pub fail_init: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(mut self, kind: EventKind) -> Self {
        self.closed.push(kind);
        self
    }

    pub fn redirect(mut self, symbol: &str, outcome: Redirection) -> Self {
        self.redirects.insert(symbol.to_string(), outcome);
        self
    }

    pub fn offset(mut self, symbol: &str, definer: &str, offset: isize) -> Self {
        self.offsets
            .insert((symbol.to_string(), definer.to_string()), offset);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than gate checks.
    pub fn capability_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Gate(_)))
            .collect()
    }

    pub fn gate_checks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Gate(_)))
            .count()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl HookProvider for Recorder {
    fn initialize(&self) -> Result<()> {
        self.push(Call::Init);
        if self.fail_init {
            return Err(init_error("no configuration"));
        }
        Ok(())
    }

    fn gate(&self, kind: EventKind) -> bool {
        self.push(Call::Gate(kind));
        !self.closed.contains(&kind)
    }

    fn redirect(&self, symbol: &str, caller: &str) -> Redirection {
        self.push(Call::Redirect {
            symbol: symbol.to_string(),
            caller: caller.to_string(),
        });
        self.redirects.get(symbol).cloned().unwrap_or_default()
    }

    fn offset_for(&self, symbol: &str, definer: &str) -> isize {
        self.push(Call::Offset {
            symbol: symbol.to_string(),
            definer: definer.to_string(),
        });
        self.offsets
            .get(&(symbol.to_string(), definer.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn observe_definition(&self, def: &Definition<'_>) -> bool {
        self.push(Call::Definition {
            symbol: def.symbol.to_string(),
            definer: def.definer.to_string(),
            address: def.address.get(),
            requested: def.requested.to_string(),
            caller: def.caller.to_string(),
            slot: def.slot.get(),
        });
        false
    }

    fn on_symbol_defined(&self, symbol: &str, definer: &str, address: Address) -> bool {
        self.push(Call::SymbolDefined {
            symbol: symbol.to_string(),
            definer: definer.to_string(),
            address: address.get(),
        });
        false
    }
}

/// A provider whose gate counts calls and opens for nothing.
#[derive(Default)]
pub struct Closed {
    pub gates: AtomicUsize,
}

impl HookProvider for Closed {
    fn gate(&self, _kind: EventKind) -> bool {
        self.gates.fetch_add(1, Ordering::Relaxed);
        false
    }

    fn redirect(&self, _symbol: &str, _caller: &str) -> Redirection {
        Redirection::to("never").force("nowhere")
    }

    fn offset_for(&self, _symbol: &str, _definer: &str) -> isize {
        0x7777
    }
}
