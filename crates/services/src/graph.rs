use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Returns true when adding `from -> to` to `edges` closes a cycle, i.e. when
/// `from` is already reachable from `to`.
pub fn would_create_cycle<N>(edges: &[(N, N)], from: N, to: N) -> bool
where
    N: Copy + Eq + Hash,
{
    if from == to {
        return true;
    }

    let mut adjacency: HashMap<N, Vec<N>> = HashMap::new();
    for &(a, b) in edges {
        adjacency.entry(a).or_default().push(b);
    }

    let mut seen = HashSet::new();
    let mut stack = vec![to];
    while let Some(node) = stack.pop() {
        if node == from {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = adjacency.get(&node) {
            stack.extend(next.iter().copied().filter(|n| !seen.contains(n)));
        }
    }
    false
}
