use proptest::prelude::*;
use sledge_perms::access::AssertionSet;
use sledge_perms::Assertion;

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 1..5).prop_map(|segs| segs.join("."))
}

fn entries_strategy() -> impl Strategy<Value = Vec<(String, bool)>> {
    prop::collection::vec((path_strategy(), any::<bool>()), 0..12)
}

proptest! {
    /// Point queries never panic and resolve deterministically no matter the
    /// insertion order of distinct paths.
    #[test]
    fn prop_closest_ignores_insertion_order(
        entries in entries_strategy(),
        query in path_strategy(),
        seed in any::<u64>(),
    ) {
        let mut forward = AssertionSet::new();
        let mut dedup = std::collections::BTreeMap::new();
        for (p, g) in &entries {
            forward.set(p, *g).unwrap();
            dedup.insert(p.clone(), *g);
        }

        let mut shuffled: Vec<(String, bool)> = dedup.into_iter().collect();
        let len = shuffled.len().max(1);
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();
        let mut backward = AssertionSet::new();
        for (p, g) in &shuffled {
            backward.set(p, *g).unwrap();
        }

        prop_assert_eq!(forward.closest(&query), backward.closest(&query));
        prop_assert_eq!(forward.is_authorized(&query), backward.is_authorized(&query));
    }

    /// The governing assertion is the exact path when present, otherwise the
    /// longest ancestor present, otherwise nothing.
    #[test]
    fn prop_closest_is_longest_ancestor(entries in entries_strategy(), query in path_strategy()) {
        let set = AssertionSet::from_assertions(
            entries.iter().map(|(p, g)| Assertion::new(p, *g).unwrap()),
        );
        let segments: Vec<&str> = query.split('.').collect();
        let expected = (1..=segments.len())
            .rev()
            .map(|n| segments[..n].join("."))
            .find_map(|prefix| set.explicit(&prefix).cloned());
        prop_assert_eq!(set.closest(&query).cloned(), expected);
    }

    /// Every descendant reported for a root sits strictly beneath it.
    #[test]
    fn prop_descendants_within_root(entries in entries_strategy(), root in path_strategy()) {
        let set = AssertionSet::from_assertions(
            entries.iter().map(|(p, g)| Assertion::new(p, *g).unwrap()),
        );
        for a in set.descendants_of(&root) {
            prop_assert!(a.is_within(&root));
            prop_assert_ne!(a.path(), root.as_str());
        }
        let count = set.iter().filter(|a| a.is_within(&root)).count();
        prop_assert_eq!(set.descendants_of(&root).len(), count);
    }
}
