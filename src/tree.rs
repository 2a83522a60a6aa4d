//! Flat-to-hierarchy tree building.
//!
//! Pure transformations from flat, parent-referencing collections (or
//! pre-nested ones) into caller-defined tree nodes. The node mapper receives
//! the source item together with its already-built children and returns the
//! target node, so output types stay fully caller-shaped.

use std::collections::HashSet;
use std::hash::Hash;

/// Build a tree from a flat list of parent-referencing items.
///
/// Children of `root` are the items whose parent id equals it (`None`
/// matches items without a parent). Each matched item becomes a node via
/// `map` and is then used as the parent for the next level. An item can
/// never be its own parent, and already-visited ids are skipped, so cyclic
/// parent chains terminate instead of recursing unboundedly.
pub fn from_parent_list<S, T, K, I, P, M>(
  items: &[S],
  root: Option<&K>,
  id_of: I,
  parent_of: P,
  map: M,
) -> Vec<T>
where
  K: Eq + Hash + Clone,
  I: Fn(&S) -> K,
  P: Fn(&S) -> Option<K>,
  M: Fn(&S, Vec<T>) -> T,
{
  let mut visited = HashSet::new();
  collect_children(items, root, &id_of, &parent_of, &map, &mut visited)
}

fn collect_children<S, T, K, I, P, M>(
  items: &[S],
  parent: Option<&K>,
  id_of: &I,
  parent_of: &P,
  map: &M,
  visited: &mut HashSet<K>,
) -> Vec<T>
where
  K: Eq + Hash + Clone,
  I: Fn(&S) -> K,
  P: Fn(&S) -> Option<K>,
  M: Fn(&S, Vec<T>) -> T,
{
  let mut nodes = Vec::new();

  for item in items {
    let item_parent = parent_of(item);
    if item_parent.as_ref() != parent {
      continue;
    }

    let id = id_of(item);
    if item_parent.as_ref() == Some(&id) {
      // an item cannot be its own parent
      continue;
    }
    if !visited.insert(id.clone()) {
      continue;
    }

    let children = collect_children(items, Some(&id), id_of, parent_of, map, visited);
    nodes.push(map(item, children));
  }

  nodes
}

/// Build a tree from items carrying embedded children collections.
///
/// Walks each item's children recursively, building target nodes bottom-up
/// through the same mapper contract as [`from_parent_list`].
pub fn from_nested<S, T, C, M>(items: &[S], children_of: C, map: M) -> Vec<T>
where
  C: Fn(&S) -> &[S],
  M: Fn(&S, Vec<T>) -> T,
{
  walk_nested(items, &children_of, &map)
}

fn walk_nested<S, T, C, M>(items: &[S], children_of: &C, map: &M) -> Vec<T>
where
  C: Fn(&S) -> &[S],
  M: Fn(&S, Vec<T>) -> T,
{
  items
    .iter()
    .map(|item| {
      let children = walk_nested(children_of(item), children_of, map);
      map(item, children)
    })
    .collect()
}
