use std::collections::BTreeMap;

/// Tarjan's strongly-connected-components algorithm, run with an explicit frame stack so deep
/// graphs cannot exhaust the call stack. Returns components in reverse topological order: a
/// component is emitted only after every component it points into.
///
/// `graph[q]` is the list of arcs from (or, for an inflow graph, into) node `q`; all nodes are
/// numbered `0..graph.len()`.
pub fn strongly_connected_components(graph: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let size = graph.len();
    let mut index: Vec<Option<usize>> = vec![None; size];
    let mut on_stack = vec![false; size];
    let mut stack: Vec<usize> = Vec::new();
    let mut output: Vec<Vec<usize>> = Vec::new();
    // Simulated call frames: (node, next arc to inspect, low-link so far).
    let mut frames: Vec<(usize, usize, usize)> = Vec::new();

    fn push_node(
        q: usize,
        stack: &mut Vec<usize>,
        index: &mut [Option<usize>],
        on_stack: &mut [bool],
    ) -> usize {
        let position = stack.len();
        index[q] = Some(position);
        on_stack[q] = true;
        stack.push(q);
        position
    }

    for root in 0..size {
        if index[root].is_some() {
            continue;
        }
        let low = push_node(root, &mut stack, &mut index, &mut on_stack);
        frames.push((root, 0, low));
        while let Some(&(q, arc, low)) = frames.last() {
            if arc < graph[q].len() {
                frames.last_mut().unwrap().1 += 1;
                let r = graph[q][arc];
                if index[r].is_none() {
                    let entry = push_node(r, &mut stack, &mut index, &mut on_stack);
                    frames.push((r, 0, entry));
                } else if on_stack[r] {
                    let reached = index[r].unwrap();
                    let top = frames.last_mut().unwrap();
                    top.2 = top.2.min(reached);
                }
            } else {
                frames.pop();
                if low == index[q].unwrap() {
                    // Node q is the root of a component.
                    let component = stack.split_off(low);
                    for &r in &component {
                        on_stack[r] = false;
                    }
                    output.push(component);
                }
                if let Some(parent) = frames.last_mut() {
                    parent.2 = parent.2.min(low);
                }
            }
        }
    }
    output
}

/// Adapt Tarjan's algorithm for hashable node labels rather than strictly integers.
/// Arcs to labels absent from the map are ignored.
pub fn strongly_connected_components_hashable(graph: &BTreeMap<String, Vec<String>>) -> Vec<Vec<String>> {
    let table: Vec<&String> = graph.keys().collect();
    let index: BTreeMap<&String, usize> = table.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let prime: Vec<Vec<usize>> = graph
        .values()
        .map(|arcs| arcs.iter().filter_map(|a| index.get(a).copied()).collect())
        .collect();
    strongly_connected_components(&prime)
        .into_iter()
        .map(|component| component.into_iter().map(|q| table[q].clone()).collect())
        .collect()
}
