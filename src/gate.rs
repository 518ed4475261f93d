//! The activation gate in front of every provider capability.
use crate::{Error, event::EventKind, provider::HookProvider};

/// Where the installed provider stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    /// No provider installed. Resolution behaves as if every gate were closed.
    Absent,
    /// The provider initialized and is consulted on every event.
    Active,
    /// The provider failed to initialize and is never consulted again.
    Failed,
}

/// Owns the optional provider and answers "may this capability run?".
pub(crate) struct Activation<P> {
    provider: Option<P>,
    status: ProviderStatus,
    init_error: Option<Error>,
}

impl<P: HookProvider> Activation<P> {
    /// Initializes `provider`, if any. This is the only call to `initialize`.
    pub(crate) fn new(provider: Option<P>) -> Self {
        let Some(provider) = provider else {
            return Self {
                provider: None,
                status: ProviderStatus::Absent,
                init_error: None,
            };
        };
        match provider.initialize() {
            Ok(()) => Self {
                provider: Some(provider),
                status: ProviderStatus::Active,
                init_error: None,
            },
            Err(err) => {
                #[cfg(feature = "log")]
                log::warn!("hook provider disabled: {err}");
                Self {
                    provider: Some(provider),
                    status: ProviderStatus::Failed,
                    init_error: Some(err),
                }
            }
        }
    }

    #[inline]
    pub(crate) fn status(&self) -> ProviderStatus {
        self.status
    }

    #[inline]
    pub(crate) fn init_error(&self) -> Option<&Error> {
        self.init_error.as_ref()
    }

    /// Returns the provider if the capability paired with `kind` may run.
    ///
    /// The provider's gate is re-evaluated on every call.
    #[inline]
    pub(crate) fn check(&self, kind: EventKind) -> Option<&P> {
        if self.status != ProviderStatus::Active {
            return None;
        }
        self.provider.as_ref().filter(|p| p.gate(kind))
    }

    /// Whether the capability paired with `kind` may run.
    #[inline]
    pub(crate) fn is_active(&self, kind: EventKind) -> bool {
        self.check(kind).is_some()
    }
}
