use std::collections::HashSet;

use menugen::names::{capitalize, function_names, sanitize, static_symbols};
use menukit::data::{ItemKindTag, MenuItem, MenuTree, NodeId};
use proptest::prelude::*;

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Build a tree from `(parent slot, name, is_normal)` triples; each parent
/// slot picks one of the Normal nodes created so far.
fn build(nodes: &[(usize, String, bool)]) -> MenuTree {
    let mut tree = MenuTree::new();
    let root = tree
        .add_item(None, MenuItem::new("Main", ItemKindTag::Normal))
        .unwrap();
    let mut containers: Vec<NodeId> = vec![root];
    for (slot, name, normal) in nodes {
        let parent = containers[slot % containers.len()];
        let tag = if *normal {
            ItemKindTag::Normal
        } else {
            ItemKindTag::Application
        };
        let id = tree.add_item(Some(parent), MenuItem::new(name.clone(), tag)).unwrap();
        if *normal {
            containers.push(id);
        }
    }
    tree
}

fn tree_nodes() -> impl Strategy<Value = Vec<(usize, String, bool)>> {
    prop::collection::vec((0..16usize, "[a-cA-C _1]{0,4}", any::<bool>()), 0..24)
}

proptest! {
    #[test]
    fn sanitize_yields_identifier(s in ".*") {
        let out = sanitize(&s);
        prop_assert!(is_identifier(&out), "`{}` -> `{}`", s, out);
    }

    #[test]
    fn sanitize_and_capitalize_are_idempotent(s in ".*") {
        let once = sanitize(&s);
        prop_assert_eq!(sanitize(&once), once.clone());
        let cap = capitalize(&s);
        prop_assert!(is_identifier(&cap));
        prop_assert_eq!(capitalize(&cap), cap);
    }

    #[test]
    fn function_names_are_unique_and_stable(nodes in tree_nodes()) {
        let tree = build(&nodes);
        let names = function_names(&tree);
        prop_assert_eq!(names.len(), tree.len() - 1);

        let distinct: HashSet<&String> = names.values().collect();
        prop_assert_eq!(distinct.len(), names.len());
        prop_assert!(!distinct.iter().any(|n| n.as_str() == "Create_Main_Menu"));

        let again = build(&nodes);
        prop_assert_eq!(function_names(&again), names);
    }

    #[test]
    fn static_symbols_are_unique(nodes in tree_nodes()) {
        let tree = build(&nodes);
        let symbols = static_symbols(&tree);
        prop_assert_eq!(symbols.len(), tree.len());
        let distinct: HashSet<&String> = symbols.values().collect();
        prop_assert_eq!(distinct.len(), symbols.len());
    }
}
