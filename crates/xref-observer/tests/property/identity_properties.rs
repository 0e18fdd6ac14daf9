use std::sync::Arc;

use proptest::prelude::*;
use xref_observer::hashing::compress_string;
use xref_observer::location::LocationEncoder;
use xref_observer::{ClaimToken, FileVNames, InMemorySourceMap, NameEqClass, NameId, NodeId, Range, SourceRange};

fn arb_eq_class() -> impl Strategy<Value = NameEqClass> {
    prop_oneof![
        Just(NameEqClass::None),
        Just(NameEqClass::Class),
        Just(NameEqClass::Union),
        Just(NameEqClass::Macro),
    ]
}

fn token() -> Arc<ClaimToken> {
    Arc::new(ClaimToken::unowned())
}

// ── Compression is deterministic and bounded ────────────────────────────

proptest! {
    #[test]
    fn compress_is_deterministic(input in ".{0,300}", threshold in 1usize..256) {
        let first = compress_string(&input, false, threshold);
        let second = compress_string(&input, false, threshold);
        prop_assert_eq!(&first, &second);
        if input.len() <= threshold {
            prop_assert_eq!(first, input);
        } else {
            prop_assert_eq!(first.len(), 32);
        }
    }

    #[test]
    fn forced_compression_is_fixed_width(input in ".{0,64}") {
        let forced = compress_string(&input, true, usize::MAX);
        prop_assert_eq!(forced.len(), 32);
        prop_assert!(forced.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

// ── Range encodings depend only on the range ────────────────────────────

proptest! {
    #[test]
    fn range_encoding_is_deterministic(begin in 0u32..64, len in 0u32..64, context in "[a-z]{1,8}") {
        let mut sm = InMemorySourceMap::new();
        let file = sm.add_file("src/a.cc", &"x".repeat(128));
        let names = FileVNames::new("corp", None);
        let encoder = LocationEncoder::new(&sm, &names, 64);
        let physical = SourceRange::new(sm.loc(file, begin), sm.loc(file, begin + len));

        let plain = Range::Physical(physical);
        prop_assert_eq!(encoder.encode_range(&plain), encoder.encode_range(&plain.clone()));

        let wraith = Range::wraith(physical, NodeId::new(token(), &context));
        let encoded = encoder.encode_range(&wraith);
        prop_assert_eq!(&encoded, &encoder.encode_range(&wraith));
        prop_assert_ne!(encoded, encoder.encode_range(&plain));
        prop_assert_eq!(wraith.without_context(), plain);
    }

    #[test]
    fn distinct_offsets_encode_distinctly(a in 0u32..100, b in 0u32..100) {
        prop_assume!(a != b);
        let mut sm = InMemorySourceMap::new();
        let file = sm.add_file("a.cc", "");
        let names = FileVNames::default();
        let encoder = LocationEncoder::new(&sm, &names, 64);
        let first = Range::physical(sm.loc(file, a), sm.loc(file, a));
        let second = Range::physical(sm.loc(file, b), sm.loc(file, b));
        prop_assert_ne!(encoder.encode_range(&first), encoder.encode_range(&second));
    }
}

// ── Name identities are stable ──────────────────────────────────────────

proptest! {
    #[test]
    fn name_ids_render_stably(path in "[a-z:]{1,24}", eq_class in arb_eq_class()) {
        let name = NameId::new(path.clone(), eq_class);
        let rendered = name.to_string();
        prop_assert!(rendered.starts_with(&path));
        prop_assert_eq!(rendered, NameId::new(path, eq_class).to_string());
    }

    #[test]
    fn node_ids_compare_by_token_and_identity(identity in "[a-zA-Z#:]{1,40}") {
        let first = NodeId::new(token(), &identity);
        let second = NodeId::new(token(), &identity);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.to_claimed_string(), identity);

        let owned = Arc::new(ClaimToken::from_vname(
            &xref_observer::VName::file("corp", "", "a.h"),
            true,
        ));
        let elsewhere = NodeId::new(owned, second.identity());
        prop_assert_ne!(&first, &elsewhere);
        prop_assert_eq!(elsewhere.to_claimed_string(), format!("{}#corp#a.h", second.identity()));
    }
}
