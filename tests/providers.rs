mod common;

use common::scope;
use resolve_hooks::providers::{EventCounter, EventMask, RedirectTable};
use resolve_hooks::{Dispatcher, EventKind, HookProvider, IndirectionTable, Redirection, Reference};

#[test]
fn caller_rule_wins_over_wildcard() {
    let table = RedirectTable::builder()
        .redirect_from("libA.so", "foo", Redirection::to("baz"))
        .redirect("foo", Redirection::to("bar"))
        .build();

    assert_eq!(
        table.redirect("foo", "libA.so"),
        Redirection::to("baz")
    );
    assert_eq!(table.redirect("foo", "app"), Redirection::to("bar"));
    assert_eq!(table.redirect("main", "app"), Redirection::none());
}

#[test]
fn later_rule_replaces_earlier_one() {
    let table = RedirectTable::builder()
        .redirect("foo", Redirection::to("bar"))
        .redirect("foo", Redirection::to("baz").force("libC.so"))
        .build();

    assert_eq!(
        table.redirect("foo", "app"),
        Redirection::to("baz").force("libC.so")
    );
}

#[test]
fn offsets_are_keyed_by_definer() {
    let table = RedirectTable::builder()
        .offset("bar", "libB.so", 4)
        .offset("bar", "libC.so", -4)
        .build();

    assert_eq!(table.offset_for("bar", "libB.so"), 4);
    assert_eq!(table.offset_for("bar", "libC.so"), -4);
    assert_eq!(table.offset_for("bar", "libA.so"), 0);
    assert_eq!(table.offset_for("baz", "libB.so"), 0);
}

#[test]
fn mask_controls_the_gate() {
    let table = RedirectTable::builder()
        .redirect("foo", Redirection::to("bar"))
        .offset("foo", "libA.so", 8)
        .mask(EventMask::OFFSET)
        .build();
    assert!(!table.gate(EventKind::Lookup));
    assert!(table.gate(EventKind::Offset));
    assert_eq!(EventMask::from(EventKind::SymbolDefined), EventMask::SYMBOL_DEFINED);

    let got = IndirectionTable::new(1);
    let dispatcher = Dispatcher::builder(scope(), &got).provider(table).build();
    let binding = dispatcher
        .resolve(Reference::new("foo", "app", got.slot(0)))
        .unwrap();

    assert!(!binding.is_redirected());
    assert_eq!(got.get(0), Some(0x508));
}

#[test]
fn table_drives_a_full_resolution() {
    let got = IndirectionTable::new(1);
    let table = RedirectTable::builder()
        .redirect("foo", Redirection::to("bar").force("libB.so"))
        .offset("bar", "libB.so", 4)
        .build();
    let dispatcher = Dispatcher::builder(scope(), &got).provider(table).build();

    dispatcher
        .resolve(Reference::new("foo", "libA.so", got.slot(0)))
        .unwrap();
    assert_eq!(got.get(0), Some(0x1004));
}

#[test]
fn counter_sees_every_event() {
    let got = IndirectionTable::new(2);
    let counter = EventCounter::new();
    let dispatcher = Dispatcher::builder(scope(), &got)
        .provider(&counter)
        .build();

    dispatcher
        .resolve(Reference::new("bar", "app", got.slot(0)))
        .unwrap();
    dispatcher
        .resolve(Reference::new("missing", "app", got.slot(1)))
        .unwrap_err();
    dispatcher.find_symbol("baz", "app").unwrap();

    assert_eq!(counter.gate_checks(EventKind::Lookup), 2);
    assert_eq!(counter.calls(EventKind::Lookup), 2);
    assert_eq!(counter.calls(EventKind::Definition), 1);
    assert_eq!(counter.calls(EventKind::Offset), 1);
    assert_eq!(counter.calls(EventKind::SymbolDefined), 2);
}
