mod common;

use common::{Call, Recorder, scope};
use resolve_hooks::{
    Dispatcher, EventKind, IndirectionTable, Phase, Redirection, Reference, ResolutionEvent,
    event::FORCE_LOOKUP_CODE,
};

#[test]
fn phases_follow_the_state_machine() {
    let got = IndirectionTable::new(1);
    let rec = Recorder::new().offset("bar", "libB.so", 2);
    let dispatcher = Dispatcher::builder(scope(), &got).provider(&rec).build();
    let mut resolution = dispatcher.begin(Reference::new("bar", "app", got.slot(0)));

    assert_eq!(resolution.phase(), Phase::Idle);
    let mut phases = Vec::new();
    while !resolution.is_finished() {
        phases.push(resolution.step().unwrap());
        if resolution.phase() == Phase::AwaitingDefinition {
            assert_eq!(resolution.context().definer().unwrap(), "libB.so");
            assert_eq!(got.get(0), Some(0));
        }
    }

    assert_eq!(
        phases,
        vec![
            Phase::AwaitingLookup,
            Phase::Searching,
            Phase::AwaitingDefinition,
            Phase::AwaitingOffset,
            Phase::Patched,
            Phase::AwaitingSymDefined,
            Phase::Idle,
        ]
    );
    assert_eq!(resolution.context().offset(), 2);
    assert_eq!(got.get(0), Some(0x1002));
    // finished resolutions stay put
    assert_eq!(resolution.step().unwrap(), Phase::Idle);
    assert!(resolution.event().is_none());
}

#[test]
fn definer_unknown_until_search_completes() {
    let got = IndirectionTable::new(1);
    let dispatcher = Dispatcher::builder(scope(), &got).build();
    let mut resolution = dispatcher.begin(Reference::new("baz", "app", got.slot(0)));

    while resolution.phase() != Phase::AwaitingDefinition {
        assert!(resolution.context().definer().is_none());
        assert!(resolution.context().address().is_none());
        resolution.step().unwrap();
    }
    assert_eq!(resolution.context().address().unwrap().get(), 0x2000);
}

#[test]
fn events_carry_codes_and_force_lookup_is_ungated() {
    let got = IndirectionTable::new(1);
    let rec = Recorder::new().redirect("foo", Redirection::to("bar").force("libB.so"));
    let dispatcher = Dispatcher::builder(scope(), &got).provider(&rec).build();
    let mut resolution = dispatcher.begin(Reference::new("foo", "libA.so", got.slot(0)));

    let slot = got.slot(0);
    let mut codes = Vec::new();
    let mut symbols = Vec::new();
    while !resolution.is_finished() {
        if let Some(event) = resolution.event() {
            codes.push(event.code());
            symbols.push(event.symbol().to_string());
            match event {
                ResolutionEvent::ForceLookup {
                    module,
                    requested,
                    caller,
                    slot: event_slot,
                    ..
                } => {
                    assert_eq!(module, "libB.so");
                    assert_eq!(requested, "foo");
                    assert_eq!(caller, "libA.so");
                    assert_eq!(event_slot, slot);
                    assert!(event.kind().is_none());
                    assert_eq!(event.name(), "force-lookup");
                }
                ResolutionEvent::Offset {
                    symbol,
                    definer,
                    requested,
                    caller,
                    slot: event_slot,
                    ..
                } => {
                    assert_eq!(symbol, "bar");
                    assert_eq!(definer, "libB.so");
                    assert_eq!(requested, "foo");
                    assert_eq!(caller, "libA.so");
                    assert_eq!(event_slot, slot);
                }
                _ => {}
            }
        }
        resolution.step().unwrap();
    }

    assert_eq!(
        codes,
        vec![
            EventKind::Lookup.code(),
            FORCE_LOOKUP_CODE,
            EventKind::Definition.code(),
            EventKind::Offset.code(),
            EventKind::SymbolDefined.code(),
        ]
    );
    assert_eq!(symbols, ["foo", "bar", "bar", "bar", "bar"]);
    // the forced step never went back to the gate or to redirect
    let lookups = rec
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Gate(EventKind::Lookup) | Call::Redirect { .. }))
        .count();
    assert_eq!(lookups, 2);
}

#[test]
fn failure_returns_to_idle() {
    let got = IndirectionTable::new(1);
    let dispatcher = Dispatcher::builder(scope(), &got).build();
    let mut resolution = dispatcher.begin(Reference::new("missing", "app", got.slot(0)));

    assert_eq!(resolution.step().unwrap(), Phase::AwaitingLookup);
    assert_eq!(resolution.step().unwrap(), Phase::Searching);
    let err = resolution.step().unwrap_err();
    assert!(err.is_unresolved());
    assert!(resolution.is_finished());
    assert_eq!(resolution.phase(), Phase::Idle);
    // the failure is reported again, not replaced
    assert!(resolution.run().unwrap_err().is_unresolved());
    assert_eq!(got.get(0), Some(0));
}

#[test]
fn lookup_event_keeps_requested_name_after_redirect() {
    let got = IndirectionTable::new(1);
    let rec = Recorder::new().redirect("main", Redirection::to("baz"));
    let dispatcher = Dispatcher::builder(scope(), &got).provider(&rec).build();
    let mut resolution = dispatcher.begin(Reference::new("main", "libA.so", got.slot(0)));

    assert_eq!(resolution.step().unwrap(), Phase::AwaitingLookup);
    match resolution.event() {
        Some(ResolutionEvent::Lookup {
            symbol,
            requested,
            caller,
            ..
        }) => {
            assert_eq!(symbol, "baz");
            assert_eq!(requested, "main");
            assert_eq!(caller, "libA.so");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(resolution.run().unwrap().value.get(), 0x2000);
}

#[test]
fn forced_failure_survives_run() {
    let got = IndirectionTable::new(1);
    let rec = Recorder::new().redirect("foo", Redirection::to("bar").force("libZ.so"));
    let dispatcher = Dispatcher::builder(scope(), &got).provider(&rec).build();
    let mut resolution = dispatcher.begin(Reference::new("foo", "libA.so", got.slot(0)));

    assert_eq!(resolution.step().unwrap(), Phase::AwaitingLookup);
    assert_eq!(resolution.step().unwrap(), Phase::Searching);
    assert!(resolution.step().is_err());
    assert!(resolution.is_finished());
    let err = resolution.run().unwrap_err();
    assert!(matches!(
        err,
        resolve_hooks::Error::InvalidForcedModule {
            reason: resolve_hooks::ForcedModuleError::NotLoaded,
            ..
        }
    ));
}
