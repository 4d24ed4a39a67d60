use std::any::Any;
use std::collections::HashSet;

use proptest::prelude::*;
use wirekit::{Binder, Module, ModuleCatalog, ModuleClass, ModuleId, ModuleListBuilder};

const SIZE: usize = 8;
const NAMES: [&str; SIZE] = ["n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7"];

#[derive(Default)]
struct Node<const N: usize>;

impl<const N: usize> Module for Node<N> {
    fn configure(&self, _binder: &mut dyn Binder) -> anyhow::Result<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

macro_rules! nodes {
    ($($n:literal),*) => {
        fn node_id(i: usize) -> ModuleId {
            match i {
                $($n => ModuleId::of::<Node<$n>>(),)*
                _ => unreachable!("node index out of range: {i}"),
            }
        }

        fn node_class(i: usize) -> ModuleClass {
            match i {
                $($n => ModuleClass::of_default::<Node<$n>>(NAMES[$n]),)*
                _ => unreachable!("node index out of range: {i}"),
            }
        }
    };
}

nodes!(0, 1, 2, 3, 4, 5, 6, 7);

/// Node `i` may only depend on nodes with a lower index, so the graph is acyclic.
fn graph(raw: &[Vec<usize>]) -> Vec<Vec<usize>> {
    raw.iter()
        .enumerate()
        .map(|(i, deps)| {
            let mut seen = HashSet::new();
            deps.iter()
                .copied()
                .filter(|&j| j < i && seen.insert(j))
                .collect()
        })
        .collect()
}

fn catalog(edges: &[Vec<usize>]) -> ModuleCatalog {
    let mut b = ModuleCatalog::builder();
    for (i, deps) in edges.iter().enumerate() {
        b.register(node_class(i).with_static_dependencies(deps.iter().map(|&j| node_id(j))));
    }
    b.build().unwrap()
}

fn reachable(edges: &[Vec<usize>], roots: &[usize]) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut todo: Vec<usize> = roots.to_vec();
    while let Some(i) = todo.pop() {
        if seen.insert(i) {
            todo.extend(edges[i].iter().copied());
        }
    }
    seen
}

fn index_of(id: ModuleId) -> usize {
    (0..SIZE).find(|&i| node_id(i) == id).unwrap()
}

proptest! {
    #[test]
    fn resolved_list_is_ordered_deduplicated_and_complete(
        raw in prop::collection::vec(prop::collection::vec(0usize..SIZE, 0..4), SIZE),
        includes in prop::collection::vec(0usize..SIZE, 1..5),
        excludes in prop::collection::vec(0usize..SIZE, 0..3),
    ) {
        let edges = graph(&raw);
        let catalog = catalog(&edges);

        let list = ModuleListBuilder::new()
            .include_all(includes.iter().map(|&i| node_id(i)))
            .exclude_all(excludes.iter().map(|&i| node_id(i)))
            .build(&catalog)
            .unwrap();
        let order: Vec<usize> = list.ids().into_iter().map(index_of).collect();

        // each identity at most once
        let unique: HashSet<usize> = order.iter().copied().collect();
        prop_assert_eq!(unique.len(), order.len());

        // exactly the reachable, non-excluded identities
        let excluded: HashSet<usize> = excludes.iter().copied().collect();
        let expected: HashSet<usize> = reachable(&edges, &includes)
            .difference(&excluded)
            .copied()
            .collect();
        prop_assert_eq!(&unique, &expected);

        // every dependency precedes its dependent
        for (pos, &i) in order.iter().enumerate() {
            for dep in &edges[i] {
                if let Some(dep_pos) = order.iter().position(|x| x == dep) {
                    prop_assert!(dep_pos < pos, "n{} must precede n{}", dep, i);
                }
            }
        }
    }

    #[test]
    fn resolving_twice_gives_the_same_order(
        raw in prop::collection::vec(prop::collection::vec(0usize..SIZE, 0..4), SIZE),
        includes in prop::collection::vec(0usize..SIZE, 1..5),
    ) {
        let edges = graph(&raw);
        let catalog = catalog(&edges);
        let builder = ModuleListBuilder::new().include_all(includes.iter().map(|&i| node_id(i)));

        let first = builder.build(&catalog).unwrap();
        let second = builder.build(&catalog).unwrap();
        prop_assert_eq!(first.names(), second.names());
    }
}
