//! Tests for anchor naming through macro expansions and scratch buffers.

use xref_core::config::XrefConfig;
use xref_observer::schema::{Claimability, EdgeKind, NodeKind, PropertyKind};
use xref_observer::{
    AnchorRecording, ClaimPolicy, FileTracking, InMemorySourceMap, IndexingObserver, MemoryRecorder, NodeId,
    Range, SourceLocation, SourceRange, StaticClaimClient,
};

type TestObserver<'a> = IndexingObserver<MemoryRecorder, StaticClaimClient, &'a InMemorySourceMap>;

fn observer_with<'a>(sm: &'a InMemorySourceMap, config: &XrefConfig) -> TestObserver<'a> {
    IndexingObserver::new(MemoryRecorder::new(), StaticClaimClient::default(), sm, config).unwrap()
}

fn observer(sm: &InMemorySourceMap) -> TestObserver<'_> {
    observer_with(sm, &XrefConfig::default())
}

const MACRO_SOURCE: &str = "#define GET(x) x.value\nint a = GET(p);\nint b = GET(q);\n";

/// Two expansions of the same macro body get distinct anchors.
#[test]
fn test_expansions_of_one_macro_are_distinct() {
    let mut sm = InMemorySourceMap::new();
    let file = sm.add_file("main.cc", MACRO_SOURCE);
    let first = sm.add_expansion(sm.loc(file, 31), sm.loc(file, 15));
    let second = sm.add_expansion(sm.loc(file, 47), sm.loc(file, 15));
    let mut obs = observer(&sm);
    obs.push_file(SourceLocation::Invalid, sm.loc(file, 0)).unwrap();

    let value = NodeId::new(obs.default_claim_token(), "S::value");
    let in_first = Range::physical(sm.macro_loc(first, 2), sm.macro_loc(first, 7));
    let in_second = Range::physical(sm.macro_loc(second, 2), sm.macro_loc(second, 7));
    obs.record_decl_use_location(&in_first, &value, Claimability::Claimable)
        .unwrap();
    obs.record_decl_use_location(&in_second, &value, Claimability::Claimable)
        .unwrap();

    let first_vname = obs.vname_from_range(&in_first);
    let second_vname = obs.vname_from_range(&in_second);
    assert_ne!(first_vname.signature, second_vname.signature);
    assert_eq!(first_vname.path, "main.cc");
    assert_eq!(obs.recorder().nodes_of_kind(NodeKind::Anchor).len(), 2);
    assert_eq!(obs.recorder().edges_of_kind(EdgeKind::Ref).len(), 2);
}

/// Macro ranges take their byte offsets from the expansion site.
#[test]
fn test_macro_anchors_use_expansion_offsets() {
    let mut sm = InMemorySourceMap::new();
    let file = sm.add_file("main.cc", MACRO_SOURCE);
    let expansion = sm.add_expansion(sm.loc(file, 31), sm.loc(file, 15));
    let mut obs = observer(&sm);
    obs.push_file(SourceLocation::Invalid, sm.loc(file, 0)).unwrap();
    let value = NodeId::new(obs.default_claim_token(), "S::value");

    let in_macro = Range::physical(sm.macro_loc(expansion, 2), sm.macro_loc(expansion, 7));
    obs.record_decl_use_location(&in_macro, &value, Claimability::Claimable)
        .unwrap();
    let anchor = obs.vname_from_range(&in_macro);
    let recorder = obs.recorder();
    assert_eq!(recorder.property_values(&anchor, PropertyKind::LocationStart), vec!["31"]);
    assert_eq!(recorder.property_values(&anchor, PropertyKind::LocationEnd), vec!["31"]);

    let mixed = Range::physical(sm.macro_loc(expansion, 0), sm.loc(file, 37));
    obs.record_decl_use_location(&mixed, &value, Claimability::Claimable)
        .unwrap();
    let anchor = obs.vname_from_range(&mixed);
    assert_eq!(obs.recorder().property_values(&anchor, PropertyKind::LocationEnd), vec!["37"]);
}

/// Locations inside a macro are claimed through the file they expand in.
#[test]
fn test_macro_locations_claim_through_expansion_site() {
    let mut sm = InMemorySourceMap::new();
    let file = sm.add_file("main.cc", MACRO_SOURCE);
    let expansion = sm.add_expansion(sm.loc(file, 31), sm.loc(file, 15));
    let mut obs = observer(&sm);
    obs.push_file(SourceLocation::Invalid, sm.loc(file, 0)).unwrap();

    let direct = obs.claim_token_for_location(sm.loc(file, 31));
    let through_macro = obs.claim_token_for_location(sm.macro_loc(expansion, 2));
    assert_eq!(direct, through_macro);
    assert_eq!(through_macro.path(), "main.cc");
    assert_eq!(
        obs.claim_token_for_range(&SourceRange::point(sm.macro_loc(expansion, 0))),
        direct
    );
}

/// Invalid locations and files never pushed fall back to the default token.
#[test]
fn test_unknown_locations_use_default_token() {
    let mut sm = InMemorySourceMap::new();
    let file = sm.add_file("main.cc", MACRO_SOURCE);
    let never_pushed = sm.add_file("other.cc", "");
    let mut obs = observer(&sm);
    obs.push_file(SourceLocation::Invalid, sm.loc(file, 0)).unwrap();

    assert_eq!(obs.claim_token_for_location(SourceLocation::Invalid), obs.default_claim_token());
    assert_eq!(
        obs.claim_token_for_location(sm.loc(never_pushed, 0)),
        obs.default_claim_token()
    );
    assert!(obs.claim_location(SourceLocation::Invalid));
}

/// Expansion chains past the configured depth degrade instead of failing.
#[test]
fn test_deep_expansion_chain_degrades() {
    let mut sm = InMemorySourceMap::new();
    let file = sm.add_file("main.cc", "#define A B\nA\n");
    let mut loc = sm.loc(file, 12);
    for _ in 0..6 {
        let expansion = sm.add_expansion(loc, sm.loc(file, 10));
        loc = sm.macro_loc(expansion, 0);
    }
    let mut config = XrefConfig::default();
    config.observer.max_expansion_depth = Some(4);
    let mut obs = observer_with(&sm, &config);
    obs.push_file(SourceLocation::Invalid, sm.loc(file, 0)).unwrap();

    let range = Range::physical(loc, loc);
    let anchor = obs.vname_from_range(&range);
    assert!(anchor.signature.contains("!unresolved"));
    assert_eq!(obs.claim_token_for_location(loc), obs.default_claim_token());

    let node = NodeId::new(obs.default_claim_token(), "B");
    obs.record_expands_range(&range, &node).unwrap();
    assert_eq!(obs.recorder().edges_of_kind(EdgeKind::RefExpands).len(), 1);
}

/// Text spelled in a buffer with no file is named by a hash of the token.
#[test]
fn test_scratch_buffer_spelling_is_hashed() {
    let mut sm = InMemorySourceMap::new();
    let predefines = sm.add_scratch_buffer("#define VERSION 3\n");
    let file = sm.add_file("main.cc", "int v = VERSION;\n");
    let expansion = sm.add_expansion(sm.loc(file, 8), sm.loc(predefines, 8));
    let mut obs = observer(&sm);
    obs.push_file(SourceLocation::Invalid, sm.loc(file, 0)).unwrap();

    let range = Range::physical(sm.macro_loc(expansion, 0), sm.macro_loc(expansion, 0));
    let anchor = obs.vname_from_range(&range);
    assert!(anchor.signature.starts_with("8main.cc@"));
    assert!(!anchor.signature.contains("VERSION"));
    assert_eq!(anchor.path, "main.cc");
}

/// A range spanning two files names both of them.
#[test]
fn test_cross_file_range_names_both_files() {
    let mut sm = InMemorySourceMap::new();
    let main = sm.add_file("main.cc", "#include \"a.h\"\n");
    let header = sm.add_file("a.h", "int a;\n");
    let mut config = XrefConfig::default();
    config.vnames.default_corpus = Some("corp".into());
    let mut obs = observer_with(&sm, &config);
    obs.push_file(SourceLocation::Invalid, sm.loc(main, 0)).unwrap();

    let range = Range::physical(sm.loc(main, 10), sm.loc(header, 3));
    let anchor = obs.vname_from_range(&range);
    assert_eq!(anchor.signature, "10corp/main.cc3corp/a.h");
    assert_eq!(anchor.corpus, "corp");
    assert_eq!(anchor.language, "c++");

    let node = NodeId::new(obs.default_claim_token(), "a");
    obs.record_decl_use_location(&range, &node, Claimability::Claimable)
        .unwrap();
    assert!(obs
        .recorder()
        .property_values(&anchor, PropertyKind::LocationEnd)
        .is_empty());
}

/// Long encodings are hashed to a fixed width.
#[test]
fn test_long_anchor_signatures_are_compressed() {
    let long_path = format!("{}/deep.cc", "nested".repeat(40));
    let mut sm = InMemorySourceMap::new();
    let file = sm.add_file(&long_path, "int a;\n");
    let obs = observer(&sm);

    let anchor = obs.vname_from_range(&Range::physical(sm.loc(file, 4), sm.loc(file, 5)));
    assert_eq!(anchor.signature.len(), 32);
    assert_eq!(anchor.path, long_path);
}
