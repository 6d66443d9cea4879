use super::{BreadthFirstTraversal, TraversalLedger};
use std::collections::HashMap;
use std::hash::Hash;

impl<K: Clone + Eq + Hash> BreadthFirstTraversal<K> {
    pub fn new() -> Self {
        Self {
            traversal: Vec::new(),
            catalog: HashMap::new(),
            current: None,
            ledger: TraversalLedger::default(),
        }
    }

    /// Number of keys seen so far; also the id the next novel key will receive.
    pub fn len(&self) -> usize {
        self.traversal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traversal.is_empty()
    }

    /// The canonical key assigned to `id`.
    pub fn key(&self, id: usize) -> &K {
        &self.traversal[id]
    }

    /// Mark which work-list entry is being visited, so novel keys record their predecessor.
    pub fn set_current(&mut self, id: usize) {
        self.current = Some(id);
    }

    /// Translate a key to its id, assigning the next id to a novel key and appending it to
    /// the work list. The breadcrumb is the symbol whose shift caused the entry to exist.
    pub fn lookup(&mut self, key: K, breadcrumb: Option<&str>) -> usize {
        match self.catalog.get(&key) {
            Some(&id) => id,
            None => {
                let id = self.traversal.len();
                self.traversal.push(key.clone());
                self.catalog.insert(key, id);
                self.ledger.earliest_predecessor.push(self.current);
                self.ledger.breadcrumbs.push(breadcrumb.map(str::to_owned));
                id
            }
        }
    }

    pub fn breadcrumb(&self, id: usize) -> Option<&str> {
        self.ledger.breadcrumbs[id].as_deref()
    }

    pub fn shortest_path_to(&self, index: usize) -> Vec<usize> {
        self.ledger.shortest_path_to(index)
    }

    /// Tear down into the work list, the key catalog, and the path ledger.
    pub fn into_parts(self) -> (Vec<K>, HashMap<K, usize>, TraversalLedger) {
        (self.traversal, self.catalog, self.ledger)
    }
}

impl TraversalLedger {
    /// Return a minimal list of nodes traversed, from a root to the given node index, in
    /// normal order.
    pub fn shortest_path_to(&self, index: usize) -> Vec<usize> {
        let mut path = vec![index];
        let mut index = index;
        while let Some(p) = self.earliest_predecessor[index] {
            path.push(p);
            index = p;
        }
        path.reverse();
        path
    }

    /// How many breadcrumbs stand between each node and its root.
    pub fn depth_list(&self) -> Vec<usize> {
        let mut result = Vec::with_capacity(self.earliest_predecessor.len());
        for p in &self.earliest_predecessor {
            result.push(match p {
                None => 0,
                Some(p) => 1 + result[*p],
            });
        }
        result
    }
}
