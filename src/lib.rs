//! # resolve_hooks
//! Interception seams for the symbol resolution of a dynamic loader.
//!
//! A loader embeds a [`Dispatcher`] and hands it every cross-module reference
//! it has to bind. The dispatcher drives a pluggable [`HookProvider`] through a
//! fixed sequence of events, and lets it:
//!
//! * redirect a reference to another symbol name, or force the search into
//!   one specific module ([`Redirection`]);
//! * watch what definition was found, and for whom;
//! * adjust the resolved address before it is written into the caller's
//!   indirection-table slot.
//!
//! How symbols are actually located is left to the loader, through
//! [`SymbolScope`]. How slots are written is left to a [`SlotWriter`].
//!
//! ## Example
//! ```rust
//! use resolve_hooks::{Dispatcher, EventKind, HookProvider, IndirectionTable, LoadedModule,
//!     Redirection, Reference};
//!
//! struct Shim;
//!
//! impl HookProvider for Shim {
//!     fn redirect(&self, symbol: &str, _caller: &str) -> Redirection {
//!         match symbol {
//!             "foo" => Redirection::to("bar").force("libB.so"),
//!             _ => Redirection::none(),
//!         }
//!     }
//!
//!     fn offset_for(&self, symbol: &str, definer: &str) -> isize {
//!         if (symbol, definer) == ("bar", "libB.so") { 4 } else { 0 }
//!     }
//! }
//!
//! let scope = vec![
//!     LoadedModule::new("libA.so").define("foo", 0x500),
//!     LoadedModule::new("libB.so").define("bar", 0x1000),
//! ];
//! let got = IndirectionTable::new(4);
//! let dispatcher = Dispatcher::builder(scope, &got).provider(Shim).build();
//!
//! let binding = dispatcher.resolve(Reference::new("foo", "libA.so", got.slot(0))).unwrap();
//! assert_eq!(binding.definer, "libB.so");
//! assert_eq!(got.get(0), Some(0x1004));
//! ```
#![no_std]
#![warn(
    clippy::unnecessary_wraps,
    clippy::collapsible_if,
    clippy::explicit_iter_loop,
    clippy::needless_question_mark,
    clippy::needless_return,
    clippy::redundant_clone,
    clippy::redundant_else
)]
extern crate alloc;

#[macro_use]
mod macros;

mod dispatcher;
mod error;
pub mod event;
mod gate;
mod provider;
pub mod providers;
pub mod scope;
pub mod slot;
mod symbol;
mod sync;

pub use dispatcher::{
    Binding, Dispatcher, DispatcherBuilder, Phase, Resolution, ResolutionContext,
};
pub use error::{Error, ForcedModuleError, custom_error, init_error, patch_error};
pub use event::{Definition, EventKind, ResolutionEvent};
pub use gate::ProviderStatus;
pub use provider::{HookProvider, Redirection};
pub use scope::{LoadedModule, ModuleSymbols, SymbolScope};
pub use slot::{IndirectionTable, RawSlots, SlotWriter};
pub use symbol::{Address, ModuleId, Reference, SymDef, SymbolName};
pub use sync::Arc;

/// A type alias for `Result`s returned by `resolve_hooks` functions.
pub type Result<T> = core::result::Result<T, Error>;
