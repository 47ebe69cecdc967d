//! Cycle detection by three-color depth-first search.

use std::collections::{BTreeSet, HashMap};

use crate::graph::GraphInner;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

/// Collect every cycle closed by a back edge.
///
/// Iterative DFS, O(V+E): a black (finished) vertex is never re-entered.
/// Roots are visited in sorted id order so the result is a pure function of
/// the graph's contents.
pub(crate) fn detect(inner: &GraphInner) -> Vec<Vec<String>> {
    let mut roots: Vec<&str> = inner.outgoing.keys().map(String::as_str).collect();
    roots.sort_unstable();

    let mut color: HashMap<&str, Color> = HashMap::with_capacity(roots.len());
    let mut found: BTreeSet<Vec<String>> = BTreeSet::new();

    for root in roots {
        if color.contains_key(root) {
            continue;
        }
        color.insert(root, Color::Gray);
        // (vertex, index of the next neighbor to explore); doubles as the DFS path.
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let neighbors = inner.outgoing.get(node).map(Vec::as_slice).unwrap_or(&[]);
            if frame.1 >= neighbors.len() {
                color.insert(node, Color::Black);
                stack.pop();
                continue;
            }
            let next = neighbors[frame.1].as_str();
            frame.1 += 1;

            match color.get(next) {
                None => {
                    color.insert(next, Color::Gray);
                    stack.push((next, 0));
                }
                Some(Color::Gray) => {
                    if let Some(pos) = stack.iter().position(|(n, _)| *n == next) {
                        let cycle: Vec<String> =
                            stack[pos..].iter().map(|(n, _)| n.to_string()).collect();
                        found.insert(canonical_rotation(cycle));
                    }
                }
                Some(Color::Black) => {}
            }
        }
    }
    found.into_iter().collect()
}

/// Rotate so the smallest id comes first.
fn canonical_rotation(mut cycle: Vec<String>) -> Vec<String> {
    if let Some(min_pos) = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
    {
        cycle.rotate_left(min_pos);
    }
    cycle
}
