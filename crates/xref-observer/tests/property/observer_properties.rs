use proptest::prelude::*;
use xref_core::config::XrefConfig;
use xref_observer::schema::{Claimability, EdgeKind, NodeKind};
use xref_observer::{
    AnchorRecording, ClaimPolicy, FileTracking, InMemorySourceMap, IndexingObserver, MemoryRecorder, NodeId,
    NodeRecording, Range, SourceLocation, StaticClaimClient,
};

type TestObserver<'a> = IndexingObserver<MemoryRecorder, StaticClaimClient, &'a InMemorySourceMap>;

fn observer(sm: &InMemorySourceMap, claims: StaticClaimClient) -> TestObserver<'_> {
    IndexingObserver::new(MemoryRecorder::new(), claims, sm, &XrefConfig::default()).unwrap()
}

// ── One anchor node per range, one edge per record ──────────────────────

proptest! {
    #[test]
    fn anchors_dedup_while_edges_repeat(begin in 0u32..32, len in 1u32..16, repeats in 1usize..8) {
        let mut sm = InMemorySourceMap::new();
        let file = sm.add_file("a.cc", &"x".repeat(64));
        let mut obs = observer(&sm, StaticClaimClient::default());
        obs.push_file(SourceLocation::Invalid, sm.loc(file, 0)).unwrap();
        let node = NodeId::new(obs.default_claim_token(), "x");
        let range = Range::physical(sm.loc(file, begin), sm.loc(file, begin + len));

        for _ in 0..repeats {
            obs.record_decl_use_location(&range, &node, Claimability::Claimable).unwrap();
        }
        prop_assert_eq!(obs.recorder().nodes_of_kind(NodeKind::Anchor).len(), 1);
        prop_assert_eq!(obs.recorder().edges_of_kind(EdgeKind::Ref).len(), repeats);
    }
}

// ── Balanced push/pop empties the stack and the anchor dedup ────────────

proptest! {
    #[test]
    fn balanced_nesting_resets_range_state(depth in 1usize..8) {
        let mut sm = InMemorySourceMap::new();
        let files: Vec<_> = (0..depth)
            .map(|i| sm.add_file(&format!("f{i}.h"), "int v;\n"))
            .collect();
        let mut obs = observer(&sm, StaticClaimClient::default());

        let mut blame = SourceLocation::Invalid;
        for file in &files {
            obs.push_file(blame, sm.loc(*file, 0)).unwrap();
            let node = NodeId::new(obs.default_claim_token(), "v");
            let range = Range::physical(sm.loc(*file, 4), sm.loc(*file, 5));
            obs.record_definition_binding_range(&range, &node).unwrap();
            blame = sm.loc(*file, 0);
        }
        prop_assert_eq!(obs.file_depth(), depth);
        prop_assert!(obs.pending_range_dedup_len() > 0);

        for remaining in (0..depth).rev() {
            obs.pop_file().unwrap();
            prop_assert_eq!(obs.file_depth(), remaining);
        }
        prop_assert_eq!(obs.pending_range_dedup_len(), 0);
        prop_assert!(obs.pop_file().is_err());
    }
}

// ── Claimable anchors survive iff their range or target is claimed ──────

proptest! {
    #[test]
    fn claim_gate_matches_ownership(file_claimed in any::<bool>(), target_claimed in any::<bool>()) {
        let mut sm = InMemorySourceMap::new();
        let file = sm.add_file("a.cc", "int v;\n");
        let mut obs = observer(&sm, StaticClaimClient::new(file_claimed));
        obs.push_file(SourceLocation::Invalid, sm.loc(file, 0)).unwrap();

        let token = if target_claimed {
            obs.default_claim_token()
        } else {
            obs.claim_token_for_location(sm.loc(file, 0))
        };
        let node = NodeId::new(token, "v");
        let range = Range::physical(sm.loc(file, 4), sm.loc(file, 5));
        obs.record_decl_use_location(&range, &node, Claimability::Claimable).unwrap();

        let expected = usize::from(file_claimed || target_claimed);
        prop_assert_eq!(obs.recorder().edges_of_kind(EdgeKind::Ref).len(), expected);
        prop_assert_eq!(obs.stats().anchors_dropped, 1 - expected as u64);

        obs.record_decl_use_location(&range, &node, Claimability::Unclaimable).unwrap();
        prop_assert_eq!(obs.recorder().edges_of_kind(EdgeKind::Ref).len(), expected + 1);
    }
}

// ── Macro expansion sites disambiguate anchors ──────────────────────────

proptest! {
    #[test]
    fn expansion_sites_disambiguate(sites in prop::collection::btree_set(20u32..60, 1..6)) {
        let mut sm = InMemorySourceMap::new();
        let file = sm.add_file("a.cc", &format!("#define M x\n{}", "M ".repeat(30)));
        let expansions: Vec<_> = sites
            .iter()
            .map(|site| sm.add_expansion(sm.loc(file, *site), sm.loc(file, 10)))
            .collect();
        let mut obs = observer(&sm, StaticClaimClient::default());
        obs.push_file(SourceLocation::Invalid, sm.loc(file, 0)).unwrap();
        let node = NodeId::new(obs.default_claim_token(), "x");

        for expansion in expansions {
            let loc = sm.macro_loc(expansion, 0);
            obs.record_decl_use_location(&Range::physical(loc, loc), &node, Claimability::Claimable)
                .unwrap();
        }
        prop_assert_eq!(obs.recorder().nodes_of_kind(NodeKind::Anchor).len(), sites.len());
    }
}

// ── Preprocessor contexts prefix file signatures ────────────────────────

proptest! {
    #[test]
    fn contexts_prefix_file_signatures(context in "[a-z0-9]{1,12}", offset in 0u32..32) {
        let mut sm = InMemorySourceMap::new();
        let main = sm.add_file("main.cc", &"x".repeat(40));
        let header = sm.add_file("a.h", "");
        let mut obs = observer(&sm, StaticClaimClient::default());
        obs.add_context_information("main.cc", "", offset, &context);

        obs.push_file(SourceLocation::Invalid, sm.loc(main, 0)).unwrap();
        obs.push_file(sm.loc(main, offset), sm.loc(header, 0)).unwrap();
        let vname = obs.current_file_vname().cloned().unwrap();
        prop_assert_eq!(vname.signature, context);
        prop_assert_eq!(vname.path, "a.h");
        prop_assert_eq!(obs.stats().degraded_context_lookups, 0);
    }
}

// ── Type applications are ordered ───────────────────────────────────────

proptest! {
    #[test]
    fn tapp_identity_depends_on_order(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        prop_assume!(a != b);
        let sm = InMemorySourceMap::new();
        let mut obs = observer(&sm, StaticClaimClient::default());
        let tycon = obs.node_id_for_builtin_type("ptr").unwrap();
        let first = NodeId::new(obs.type_claim_token(), &a);
        let second = NodeId::new(obs.type_claim_token(), &b);

        let forward = obs.record_tapp_node(&tycon, &[first.clone(), second.clone()], 2).unwrap();
        let backward = obs.record_tapp_node(&tycon, &[second, first], 2).unwrap();
        prop_assert_ne!(forward, backward);
    }
}
