//! The loader's symbol search, as seen by the dispatcher.
//!
//! The dispatcher does not know how symbols are located. It only needs a list
//! of modules in search order and a way to ask one module for one name.
use crate::symbol::{Address, ModuleId, SymDef, SymbolName};
use alloc::vec::Vec;
use foldhash::fast::FixedState;
use hashbrown::HashMap;

/// A loaded module that can be asked for its exported symbols.
pub trait ModuleSymbols {
    /// The module's load name.
    fn id(&self) -> &ModuleId;

    /// Finds the address of `name` in this module only.
    fn lookup(&self, name: &str) -> Option<Address>;
}

/// The set of loaded modules a reference may bind to.
///
/// Implemented for slices and vectors of modules, searched front to back.
pub trait SymbolScope {
    type Module: ModuleSymbols;

    /// All modules in search order.
    fn modules(&self) -> &[Self::Module];

    /// Finds a loaded module by id.
    fn find_module(&self, id: &str) -> Option<&Self::Module> {
        self.modules().iter().find(|m| m.id().as_str() == id)
    }

    /// Searches every module in order and returns the first definition.
    fn search(&self, name: &str) -> Option<SymDef> {
        self.modules().iter().find_map(|m| {
            m.lookup(name).map(|address| SymDef {
                definer: m.id().clone(),
                address,
            })
        })
    }
}

impl<M: ModuleSymbols> SymbolScope for [M] {
    type Module = M;

    #[inline]
    fn modules(&self) -> &[M] {
        self
    }
}

impl<M: ModuleSymbols> SymbolScope for Vec<M> {
    type Module = M;

    #[inline]
    fn modules(&self) -> &[M] {
        self
    }
}

impl<S: SymbolScope + ?Sized> SymbolScope for &S {
    type Module = S::Module;

    #[inline]
    fn modules(&self) -> &[S::Module] {
        (**self).modules()
    }

    #[inline]
    fn find_module(&self, id: &str) -> Option<&S::Module> {
        (**self).find_module(id)
    }

    #[inline]
    fn search(&self, name: &str) -> Option<SymDef> {
        (**self).search(name)
    }
}

/// An in-memory module: a name and its exported symbols.
///
/// # Examples
/// ```rust
/// use resolve_hooks::LoadedModule;
///
/// let libb = LoadedModule::new("libB.so")
///     .define("bar", 0x1000)
///     .define("baz", 0x2000);
/// ```
#[derive(Debug, Clone)]
pub struct LoadedModule {
    id: ModuleId,
    symbols: HashMap<SymbolName, Address, FixedState>,
}

impl LoadedModule {
    pub fn new(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            symbols: HashMap::default(),
        }
    }

    /// Adds or replaces an exported symbol.
    pub fn define(mut self, name: &str, address: usize) -> Self {
        self.insert(name, address);
        self
    }

    pub fn insert(&mut self, name: &str, address: usize) -> Option<Address> {
        self.symbols
            .insert(SymbolName::new(name), Address::new(address))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl ModuleSymbols for LoadedModule {
    #[inline]
    fn id(&self) -> &ModuleId {
        &self.id
    }

    #[inline]
    fn lookup(&self, name: &str) -> Option<Address> {
        self.symbols.get(name).copied()
    }
}
