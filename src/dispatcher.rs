//! The event dispatcher.
//!
//! For every reference the loader has to satisfy, the dispatcher drives the
//! installed [`HookProvider`] through a fixed sequence of events and applies
//! any redirection or offset it returns:
//!
//! ```text
//! Idle -> AwaitingLookup -> Searching -> AwaitingDefinition -> AwaitingOffset
//!      -> Patched -> AwaitingSymDefined -> Idle
//! ```
//!
//! A failed search ends the resolution in `Idle` without patching the slot
//! and without running any later hook.
use crate::{
    Error, Result,
    error::{ForcedModuleError, custom_error, forced_module_error, unresolved_error},
    event::{Definition, EventKind, ResolutionEvent},
    gate::{Activation, ProviderStatus},
    provider::{HookProvider, Redirection},
    scope::{ModuleSymbols, SymbolScope},
    slot::SlotWriter,
    symbol::{Address, ModuleId, Reference, SymDef, SymbolName},
};
use alloc::vec::Vec;

/// Input of the low-level search routine.
///
/// A forced lookup is a single step into one module. Nothing on that path
/// calls back into the gate or the redirect capability.
pub(crate) enum SearchRequest<'a> {
    Lookup {
        symbol: &'a SymbolName,
        caller: &'a ModuleId,
    },
    ForceLookup {
        symbol: &'a SymbolName,
        caller: &'a ModuleId,
        module: &'a ModuleId,
    },
}

/// Dispatches resolution events to a hook provider.
///
/// One dispatcher serves the whole process and can be shared across threads.
/// Each call to [`resolve`](Dispatcher::resolve) runs its own [`Resolution`],
/// so concurrent resolutions never contend on dispatcher state.
///
/// # Examples
/// ```rust
/// use resolve_hooks::{Dispatcher, IndirectionTable, LoadedModule, Redirection, Reference};
/// use resolve_hooks::providers::RedirectTable;
///
/// let scope = vec![
///     LoadedModule::new("libA.so").define("foo", 0x500),
///     LoadedModule::new("libB.so").define("bar", 0x1000),
/// ];
/// let got = IndirectionTable::new(1);
/// let provider = RedirectTable::builder()
///     .redirect("foo", Redirection::to("bar").force("libB.so"))
///     .offset("bar", "libB.so", 4)
///     .build();
/// let dispatcher = Dispatcher::builder(scope, &got).provider(provider).build();
///
/// let binding = dispatcher
///     .resolve(Reference::new("foo", "libA.so", got.slot(0)))
///     .unwrap();
/// assert_eq!(got.get(0), Some(0x1004));
/// assert!(binding.is_redirected());
/// ```
pub struct Dispatcher<S, W, P = ()> {
    scope: S,
    slots: W,
    hooks: Activation<P>,
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder<S, W, P = ()> {
    scope: S,
    slots: W,
    provider: Option<P>,
}

impl<S, W> Dispatcher<S, W, ()>
where
    S: SymbolScope,
    W: SlotWriter,
{
    /// Starts building a dispatcher over `scope` that patches slots through `slots`.
    ///
    /// Without a provider the dispatcher behaves like a plain loader.
    pub fn builder(scope: S, slots: W) -> DispatcherBuilder<S, W, ()> {
        DispatcherBuilder {
            scope,
            slots,
            provider: None,
        }
    }
}

impl<S, W, P> DispatcherBuilder<S, W, P>
where
    S: SymbolScope,
    W: SlotWriter,
    P: HookProvider,
{
    /// Installs the hook provider.
    pub fn provider<P2: HookProvider>(self, provider: P2) -> DispatcherBuilder<S, W, P2> {
        DispatcherBuilder {
            scope: self.scope,
            slots: self.slots,
            provider: Some(provider),
        }
    }

    /// Replaces the slot writer.
    pub fn slots<W2: SlotWriter>(self, slots: W2) -> DispatcherBuilder<S, W2, P> {
        DispatcherBuilder {
            scope: self.scope,
            slots,
            provider: self.provider,
        }
    }

    /// Builds the dispatcher, initializing the provider.
    ///
    /// This is the only place `initialize` is called. If it fails the
    /// provider stays installed but inactive; see [`Dispatcher::status`].
    pub fn build(self) -> Dispatcher<S, W, P> {
        Dispatcher {
            scope: self.scope,
            slots: self.slots,
            hooks: Activation::new(self.provider),
        }
    }
}

impl<S, W, P> Dispatcher<S, W, P>
where
    S: SymbolScope,
    W: SlotWriter,
    P: HookProvider,
{
    /// Gets the provider status.
    #[inline]
    pub fn status(&self) -> ProviderStatus {
        self.hooks.status()
    }

    /// Gets the error the provider's `initialize` returned, if it failed.
    #[inline]
    pub fn init_error(&self) -> Option<&Error> {
        self.hooks.init_error()
    }

    /// Evaluates the activation gate for `kind` right now.
    #[inline]
    pub fn is_active(&self, kind: EventKind) -> bool {
        self.hooks.is_active(kind)
    }

    #[inline]
    pub fn scope(&self) -> &S {
        &self.scope
    }

    #[inline]
    pub fn slots(&self) -> &W {
        &self.slots
    }

    /// Starts a step-by-step resolution of `reference`.
    #[inline]
    pub fn begin(&self, reference: Reference) -> Resolution<'_, S, W, P> {
        Resolution::new(self, reference)
    }

    /// Resolves `reference` and patches its slot.
    pub fn resolve(&self, reference: Reference) -> Result<Binding> {
        self.begin(reference).run()
    }

    /// Resolves a batch of references in order, stopping at the first error.
    ///
    /// This is eager binding: every slot is patched before the call returns.
    /// Slots patched before a failure stay patched.
    pub fn bind_all<I>(&self, refs: I) -> Result<Vec<Binding>>
    where
        I: IntoIterator<Item = Reference>,
    {
        refs.into_iter().map(|r| self.resolve(r)).collect()
    }

    /// Looks `symbol` up with the low-level search routine only.
    ///
    /// There is no redirection, no definition or offset phase and no slot
    /// write. The symbol-defined notification still fires on success.
    pub fn find_symbol(&self, symbol: &str, caller: &str) -> Result<SymDef> {
        let symbol = SymbolName::new(symbol);
        let caller = ModuleId::new(caller);
        let def = self.search(SearchRequest::Lookup {
            symbol: &symbol,
            caller: &caller,
        })?;
        self.notify_symbol_defined(&symbol, &def);
        Ok(def)
    }

    /// The low-level search routine.
    fn search(&self, req: SearchRequest<'_>) -> Result<SymDef> {
        match req {
            SearchRequest::Lookup { symbol, caller } => {
                let def = self
                    .scope
                    .search(symbol)
                    .ok_or_else(|| unresolved_error(symbol, caller))?;
                #[cfg(feature = "log")]
                log::trace!(
                    "binding file [{}] to [{}]: symbol [{}]",
                    caller,
                    def.definer,
                    symbol
                );
                Ok(def)
            }
            SearchRequest::ForceLookup {
                symbol,
                caller,
                module,
            } => {
                #[cfg(feature = "log")]
                log::trace!(
                    "binding file [{}] to [{}] (forced): symbol [{}]",
                    caller,
                    module,
                    symbol
                );
                #[cfg(not(feature = "log"))]
                let _ = caller;
                let lib = self.scope.find_module(module).ok_or_else(|| {
                    forced_module_error(symbol, module, ForcedModuleError::NotLoaded)
                })?;
                let address = lib.lookup(symbol).ok_or_else(|| {
                    forced_module_error(symbol, module, ForcedModuleError::MissingSymbol)
                })?;
                Ok(SymDef {
                    definer: lib.id().clone(),
                    address,
                })
            }
        }
    }

    fn notify_symbol_defined(&self, symbol: &SymbolName, def: &SymDef) {
        if let Some(p) = self.hooks.check(EventKind::SymbolDefined) {
            p.on_symbol_defined(symbol, &def.definer, def.address);
        }
    }
}

/// The states of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingLookup,
    Searching,
    AwaitingDefinition,
    AwaitingOffset,
    Patched,
    AwaitingSymDefined,
}

/// What is known about an in-flight resolution.
///
/// Definer and address stay unset until the search has completed.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    requested: SymbolName,
    caller: ModuleId,
    slot: Address,
    symbol: SymbolName,
    forced: Option<ModuleId>,
    definer: Option<ModuleId>,
    address: Option<Address>,
    offset: isize,
}

impl ResolutionContext {
    fn new(reference: Reference) -> Self {
        Self {
            symbol: reference.symbol.clone(),
            requested: reference.symbol,
            caller: reference.caller,
            slot: reference.slot,
            forced: None,
            definer: None,
            address: None,
            offset: 0,
        }
    }

    /// The name the caller asked for.
    #[inline]
    pub fn requested(&self) -> &SymbolName {
        &self.requested
    }

    /// The name being resolved, after redirection.
    #[inline]
    pub fn symbol(&self) -> &SymbolName {
        &self.symbol
    }

    #[inline]
    pub fn caller(&self) -> &ModuleId {
        &self.caller
    }

    #[inline]
    pub fn slot(&self) -> Address {
        self.slot
    }

    /// The module a provider forced the search into.
    #[inline]
    pub fn forced(&self) -> Option<&ModuleId> {
        self.forced.as_ref()
    }

    #[inline]
    pub fn definer(&self) -> Option<&ModuleId> {
        self.definer.as_ref()
    }

    #[inline]
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn is_redirected(&self) -> bool {
        self.symbol != self.requested
    }
}

/// The outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The name the caller asked for.
    pub requested: SymbolName,
    /// The name that was resolved.
    pub symbol: SymbolName,
    pub caller: ModuleId,
    pub definer: ModuleId,
    /// Address of the definition.
    pub address: Address,
    /// Adjustment returned by the offset phase, zero if it did not run.
    pub offset: isize,
    /// The value written into the slot: `address + offset`.
    pub value: Address,
    pub slot: Address,
}

impl Binding {
    #[inline]
    pub fn is_redirected(&self) -> bool {
        self.symbol != self.requested
    }
}

/// One reference travelling through the dispatcher's state machine.
///
/// [`step`](Resolution::step) performs exactly one transition. Most callers
/// just use [`run`](Resolution::run) or [`Dispatcher::resolve`].
pub struct Resolution<'d, S, W, P> {
    dispatcher: &'d Dispatcher<S, W, P>,
    ctx: ResolutionContext,
    phase: Phase,
    started: bool,
    done: bool,
    found: Option<Result<SymDef>>,
    binding: Option<Binding>,
    failure: Option<Error>,
}

impl<'d, S, W, P> Resolution<'d, S, W, P>
where
    S: SymbolScope,
    W: SlotWriter,
    P: HookProvider,
{
    fn new(dispatcher: &'d Dispatcher<S, W, P>, reference: Reference) -> Self {
        Self {
            dispatcher,
            ctx: ResolutionContext::new(reference),
            phase: Phase::Idle,
            started: false,
            done: false,
            found: None,
            binding: None,
            failure: None,
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn context(&self) -> &ResolutionContext {
        &self.ctx
    }

    /// Whether the resolution is back in `Idle`, successfully or not.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// The event the next [`step`](Resolution::step) will process, if that
    /// step involves one.
    pub fn event(&self) -> Option<ResolutionEvent<'_>> {
        if self.done {
            return None;
        }
        let ctx = &self.ctx;
        match self.phase {
            Phase::Idle => Some(ResolutionEvent::lookup(
                &ctx.requested,
                &ctx.requested,
                &ctx.caller,
                ctx.slot,
            )),
            Phase::AwaitingLookup => Some(match &ctx.forced {
                Some(module) => ResolutionEvent::ForceLookup {
                    symbol: &ctx.symbol,
                    module,
                    requested: &ctx.requested,
                    caller: &ctx.caller,
                    slot: ctx.slot,
                },
                None => ResolutionEvent::lookup(
                    &ctx.symbol,
                    &ctx.requested,
                    &ctx.caller,
                    ctx.slot,
                ),
            }),
            Phase::AwaitingDefinition => Some(ResolutionEvent::Definition(Definition {
                symbol: &ctx.symbol,
                definer: ctx.definer.as_deref()?,
                address: ctx.address?,
                requested: &ctx.requested,
                caller: &ctx.caller,
                slot: ctx.slot,
            })),
            Phase::AwaitingOffset => Some(ResolutionEvent::Offset {
                symbol: &ctx.symbol,
                definer: ctx.definer.as_deref()?,
                address: ctx.address?,
                requested: &ctx.requested,
                caller: &ctx.caller,
                slot: ctx.slot,
            }),
            Phase::AwaitingSymDefined => Some(ResolutionEvent::SymbolDefined {
                symbol: &ctx.symbol,
                definer: ctx.definer.as_deref()?,
                address: ctx.address?,
            }),
            Phase::Searching | Phase::Patched => None,
        }
    }

    /// Performs one transition and returns the phase reached.
    ///
    /// Once the resolution is finished this is a no-op returning `Idle`.
    pub fn step(&mut self) -> Result<Phase> {
        if self.done {
            return Ok(Phase::Idle);
        }
        #[cfg(feature = "log")]
        if let Some(event) = self.event() {
            log::trace!(
                "[{}] {} event ({}): {:?}",
                self.ctx.caller,
                event.name(),
                event.code(),
                event
            );
        }
        let next = match self.phase {
            Phase::Idle if !self.started => {
                self.started = true;
                self.lookup();
                Phase::AwaitingLookup
            }
            Phase::Idle => Phase::Idle,
            Phase::AwaitingLookup => {
                self.found = Some(self.dispatcher.search(self.request()));
                Phase::Searching
            }
            Phase::Searching => match self.found.take() {
                Some(Ok(def)) => {
                    self.ctx.definer = Some(def.definer);
                    self.ctx.address = Some(def.address);
                    Phase::AwaitingDefinition
                }
                Some(Err(err)) => return Err(self.fail(err)),
                None => return Err(self.fail(custom_error("search result missing"))),
            },
            Phase::AwaitingDefinition => {
                self.observe_definition();
                Phase::AwaitingOffset
            }
            Phase::AwaitingOffset => {
                self.ctx.offset = self.offset();
                Phase::Patched
            }
            Phase::Patched => {
                if let Err(err) = self.patch() {
                    return Err(self.fail(err));
                }
                Phase::AwaitingSymDefined
            }
            Phase::AwaitingSymDefined => {
                self.symbol_defined();
                self.finish();
                Phase::Idle
            }
        };
        self.phase = next;
        Ok(next)
    }

    /// Drives the resolution to completion.
    pub fn run(mut self) -> Result<Binding> {
        loop {
            if let Some(binding) = self.binding.take() {
                return Ok(binding);
            }
            if self.done {
                return Err(self
                    .failure
                    .take()
                    .unwrap_or_else(|| custom_error("resolution already finished")));
            }
            self.step()?;
        }
    }

    /// Idle -> AwaitingLookup: let the provider redirect the reference.
    fn lookup(&mut self) {
        let Some(p) = self.dispatcher.hooks.check(EventKind::Lookup) else {
            return;
        };
        let Redirection { symbol, module } = p.redirect(&self.ctx.requested, &self.ctx.caller);
        if let Some(symbol) = symbol
            && symbol != self.ctx.requested
        {
            #[cfg(feature = "log")]
            log::debug!(
                "[{}] redirect [{}] -> [{}]",
                self.ctx.caller,
                self.ctx.requested,
                symbol
            );
            self.ctx.symbol = symbol;
        }
        if let Some(module) = module {
            #[cfg(feature = "log")]
            log::debug!(
                "[{}] force [{}] into [{}]",
                self.ctx.caller,
                self.ctx.symbol,
                module
            );
            self.ctx.forced = Some(module);
        }
    }

    fn request(&self) -> SearchRequest<'_> {
        match &self.ctx.forced {
            Some(module) => SearchRequest::ForceLookup {
                symbol: &self.ctx.symbol,
                caller: &self.ctx.caller,
                module,
            },
            None => SearchRequest::Lookup {
                symbol: &self.ctx.symbol,
                caller: &self.ctx.caller,
            },
        }
    }

    fn observe_definition(&self) {
        let Some(p) = self.dispatcher.hooks.check(EventKind::Definition) else {
            return;
        };
        let ctx = &self.ctx;
        if let (Some(definer), Some(address)) = (&ctx.definer, ctx.address) {
            p.observe_definition(&Definition {
                symbol: &ctx.symbol,
                definer,
                address,
                requested: &ctx.requested,
                caller: &ctx.caller,
                slot: ctx.slot,
            });
        }
    }

    fn offset(&self) -> isize {
        let (Some(p), Some(definer)) = (
            self.dispatcher.hooks.check(EventKind::Offset),
            &self.ctx.definer,
        ) else {
            return 0;
        };
        p.offset_for(&self.ctx.symbol, definer)
    }

    fn patch(&self) -> Result<()> {
        let address = self
            .ctx
            .address
            .ok_or_else(|| custom_error("patching before the search completed"))?;
        let value = address + self.ctx.offset;
        #[cfg(feature = "log")]
        log::trace!(
            "[{}] patch slot {}: [{}] = {} ({:+})",
            self.ctx.caller,
            self.ctx.slot,
            self.ctx.symbol,
            value,
            self.ctx.offset
        );
        self.dispatcher.slots.write(self.ctx.slot, value)
    }

    fn symbol_defined(&self) {
        if let (Some(definer), Some(address)) = (&self.ctx.definer, self.ctx.address) {
            self.dispatcher.notify_symbol_defined(
                &self.ctx.symbol,
                &SymDef {
                    definer: definer.clone(),
                    address,
                },
            );
        }
    }

    fn finish(&mut self) {
        self.done = true;
        let ctx = &self.ctx;
        if let (Some(definer), Some(address)) = (&ctx.definer, ctx.address) {
            self.binding = Some(Binding {
                requested: ctx.requested.clone(),
                symbol: ctx.symbol.clone(),
                caller: ctx.caller.clone(),
                definer: definer.clone(),
                address,
                offset: ctx.offset,
                value: address + ctx.offset,
                slot: ctx.slot,
            });
        }
    }

    #[cold]
    fn fail(&mut self, err: Error) -> Error {
        #[cfg(feature = "log")]
        log::trace!("[{}] resolution failed: {}", self.ctx.caller, err);
        self.done = true;
        self.phase = Phase::Idle;
        self.failure = Some(err.clone());
        err
    }
}
