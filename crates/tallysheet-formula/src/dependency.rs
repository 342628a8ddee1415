use std::collections::{HashMap, HashSet, VecDeque};

use tallysheet_core::{is_formula, CellId, CellRange, CellStore};

use crate::ast::RefTarget;
use crate::parser::parse;

/// Ranges larger than this are tracked as whole ranges instead of cell by cell
pub const MAX_DEPENDENCY_RANGE_CELLS: u64 = 1_000_000;

/// Extract every cell a formula reads: single references plus every cell of
/// every range, de-duplicated in first-seen order.
///
/// Ranges over [`MAX_DEPENDENCY_RANGE_CELLS`] are not expanded here; see
/// [`extract_large_ranges`]. Non-formulas and malformed formulas have no
/// dependencies.
pub fn extract_dependencies(raw: &str) -> Vec<CellId> {
    if !is_formula(raw) {
        return Vec::new();
    }
    let Ok(expr) = parse(raw) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    let mut push = |id: CellId| {
        if seen.insert(id) {
            deps.push(id);
        }
    };

    expr.for_each_ref(&mut |target| match target {
        RefTarget::Cell(id) => push(id),
        RefTarget::Range(range) => {
            if range.cell_count() <= MAX_DEPENDENCY_RANGE_CELLS {
                range.iter().for_each(&mut push);
            }
        }
    });

    deps
}

/// Ranges a formula reads that are too large to expand into single cells
pub fn extract_large_ranges(raw: &str) -> Vec<CellRange> {
    if !is_formula(raw) {
        return Vec::new();
    }
    let Ok(expr) = parse(raw) else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    expr.for_each_ref(&mut |target| {
        if let RefTarget::Range(range) = target {
            if range.cell_count() > MAX_DEPENDENCY_RANGE_CELLS && !ranges.contains(&range) {
                ranges.push(range);
            }
        }
    });
    ranges
}

/// Inverse of every formula's reference list: for each referenced cell, the
/// cells whose formulas read it.
///
/// Dependent lists keep insertion order and hold no duplicates. A key whose
/// list becomes empty is removed. Oversized ranges are kept as
/// `(range, reader)` pairs and matched by containment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependents: HashMap<CellId, Vec<CellId>>,
    ranges: Vec<(CellRange, CellId)>,
}

/// Evaluation plan for the cells affected by an edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcPlan {
    /// Affected cells with every precedent ahead of its dependents
    pub ordered: Vec<CellId>,
    /// Affected cells on or downstream of a cycle
    pub cyclic: Vec<CellId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every formula in the store
    pub fn from_store(store: &CellStore) -> Self {
        let mut graph = DependencyGraph::new();
        for cell in store.iter().filter(|c| c.is_formula()) {
            graph.link_formula(cell.id, &cell.raw);
        }
        graph
    }

    /// Install every edge `raw` implies for `cell`, large ranges included
    pub fn link_formula(&mut self, cell: CellId, raw: &str) {
        self.link(cell, &extract_dependencies(raw));
        for range in extract_large_ranges(raw) {
            if !self.ranges.contains(&(range, cell)) {
                self.ranges.push((range, cell));
            }
        }
    }

    /// Remove every edge `raw` implied for `cell`
    pub fn unlink_formula(&mut self, cell: CellId, raw: &str) {
        self.unlink(cell, &extract_dependencies(raw));
        let large = extract_large_ranges(raw);
        if !large.is_empty() {
            self.ranges
                .retain(|(range, reader)| *reader != cell || !large.contains(range));
        }
    }

    /// Record that `dependent` reads `precedent`
    pub fn add_dependent(&mut self, precedent: CellId, dependent: CellId) {
        let list = self.dependents.entry(precedent).or_default();
        if !list.contains(&dependent) {
            list.push(dependent);
        }
    }

    /// Forget that `dependent` reads `precedent`, pruning empty entries
    pub fn remove_dependent(&mut self, precedent: CellId, dependent: CellId) {
        if let Some(list) = self.dependents.get_mut(&precedent) {
            list.retain(|d| *d != dependent);
            if list.is_empty() {
                self.dependents.remove(&precedent);
            }
        }
    }

    /// Install edges from each of `deps` to `cell`
    pub fn link(&mut self, cell: CellId, deps: &[CellId]) {
        for dep in deps {
            self.add_dependent(*dep, cell);
        }
    }

    /// Remove edges from each of `deps` to `cell`
    pub fn unlink(&mut self, cell: CellId, deps: &[CellId]) {
        for dep in deps {
            self.remove_dependent(*dep, cell);
        }
    }

    /// Cells that read `id` through a single reference or a range expanded
    /// cell by cell
    pub fn dependents(&self, id: CellId) -> &[CellId] {
        self.dependents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells reading `id` through an oversized range
    pub fn range_dependents(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.ranges
            .iter()
            .filter(move |(range, _)| range.contains(id))
            .map(|(_, reader)| *reader)
    }

    /// Every cell that reads `id`
    pub fn readers(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.dependents(id)
            .iter()
            .copied()
            .chain(self.range_dependents(id))
    }

    pub fn has_dependents(&self, id: CellId) -> bool {
        self.readers(id).next().is_some()
    }

    /// Number of referenced cells
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty() && self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
        self.ranges.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellId, &[CellId])> + '_ {
        self.dependents.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// The roots and everything transitively reading them, in breadth-first order
    pub fn affected(&self, roots: &[CellId]) -> Vec<CellId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<CellId> = roots.iter().copied().collect();

        while let Some(cell) = queue.pop_front() {
            if !visited.insert(cell) {
                continue;
            }
            order.push(cell);
            queue.extend(self.readers(cell));
        }
        order
    }

    /// Topological plan (Kahn's algorithm) over the cells affected by `roots`.
    ///
    /// Cells that can never reach in-degree zero sit on a cycle or behind one;
    /// they are returned separately in breadth-first order.
    pub fn recalc_plan(&self, roots: &[CellId]) -> RecalcPlan {
        let affected = self.affected(roots);
        let members: HashSet<CellId> = affected.iter().copied().collect();

        let mut in_degree: HashMap<CellId, usize> = affected.iter().map(|c| (*c, 0)).collect();
        for cell in &affected {
            for dep in self.readers(*cell) {
                if let Some(d) = in_degree.get_mut(&dep) {
                    *d += 1;
                }
            }
        }

        let mut queue: VecDeque<CellId> = affected
            .iter()
            .copied()
            .filter(|c| in_degree[c] == 0)
            .collect();
        let mut ordered = Vec::with_capacity(affected.len());

        while let Some(cell) = queue.pop_front() {
            ordered.push(cell);
            for dep in self.readers(cell) {
                if !members.contains(&dep) {
                    continue;
                }
                if let Some(d) = in_degree.get_mut(&dep) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(dep);
                    }
                }
            }
        }

        let placed: HashSet<CellId> = ordered.iter().copied().collect();
        let cyclic = affected.into_iter().filter(|c| !placed.contains(c)).collect();

        RecalcPlan { ordered, cyclic }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CellId {
        s.parse().unwrap()
    }

    fn ids(list: &[&str]) -> Vec<CellId> {
        list.iter().map(|s| id(s)).collect()
    }

    #[test]
    fn test_extract_dependencies() {
        assert_eq!(extract_dependencies("=A1+B2*A1"), ids(&["A1", "B2"]));
        assert_eq!(
            extract_dependencies("=SUM(A1:B2)+A1"),
            ids(&["A1", "B1", "A2", "B2"])
        );
        assert_eq!(extract_dependencies("=SUM(\"A1\", 1)"), Vec::new());
        assert!(extract_dependencies("A1+B1").is_empty());
        assert!(extract_dependencies("=A1+").is_empty());
    }

    #[test]
    fn test_huge_range_is_skipped() {
        assert_eq!(extract_dependencies("=SUM(A1:XFD1048576)+C3"), ids(&["C3"]));
    }

    #[test]
    fn test_large_ranges_extracted_whole() {
        let big = CellRange::new(id("A1"), id("B600000"));
        assert_eq!(extract_large_ranges("=SUM(A1:B600000)+C3"), vec![big]);
        assert_eq!(extract_large_ranges("=SUM(A1:B600000, A1:B600000)"), vec![big]);
        assert!(extract_large_ranges("=SUM(A1:B2)").is_empty());
        assert!(extract_large_ranges("A1:B600000").is_empty());
    }

    #[test]
    fn test_large_range_readers() {
        let mut graph = DependencyGraph::new();
        graph.link_formula(id("C1"), "=SUM(A1:B600000)");
        graph.link_formula(id("D1"), "=C1*2");

        assert!(graph.dependents(id("A1")).is_empty());
        assert!(graph.has_dependents(id("B599999")));
        assert!(!graph.has_dependents(id("A600001")));
        assert_eq!(graph.affected(&[id("A1")]), ids(&["A1", "C1", "D1"]));
        assert_eq!(
            graph.recalc_plan(&[id("B42")]).ordered,
            ids(&["B42", "C1", "D1"])
        );

        graph.unlink_formula(id("C1"), "=SUM(A1:B600000)");
        assert!(!graph.has_dependents(id("A1")));
        graph.unlink_formula(id("D1"), "=C1*2");
        assert!(graph.is_empty());
    }

    #[test]
    fn test_link_unlink_prunes() {
        let mut graph = DependencyGraph::new();
        graph.link(id("C1"), &ids(&["A1", "B1"]));
        graph.link(id("C1"), &ids(&["A1"]));
        assert_eq!(graph.dependents(id("A1")), &[id("C1")]);

        graph.unlink(id("C1"), &ids(&["A1", "B1"]));
        assert!(graph.is_empty());
        assert!(graph.dependents(id("A1")).is_empty());
    }

    #[test]
    fn test_dependents_keep_insertion_order() {
        let mut graph = DependencyGraph::new();
        graph.add_dependent(id("A1"), id("D1"));
        graph.add_dependent(id("A1"), id("B1"));
        graph.add_dependent(id("A1"), id("D1"));
        assert_eq!(graph.dependents(id("A1")), &ids(&["D1", "B1"])[..]);
    }

    #[test]
    fn test_from_store() {
        let mut store = CellStore::new();
        store.set_raw(id("A1"), "1");
        store.set_raw(id("B1"), "=A1*2");
        store.set_raw(id("C1"), "=B1+A1");

        let graph = DependencyGraph::from_store(&store);
        assert_eq!(graph.dependents(id("A1")), &ids(&["B1", "C1"])[..]);
        assert_eq!(graph.dependents(id("B1")), &[id("C1")]);
        assert_eq!(graph.affected(&[id("A1")]), ids(&["A1", "B1", "C1"]));
    }

    #[test]
    fn test_recalc_plan_orders_uneven_diamond() {
        // B1 = A1, C1 = B1, D1 = A1 + C1
        let mut graph = DependencyGraph::new();
        graph.link(id("B1"), &ids(&["A1"]));
        graph.link(id("C1"), &ids(&["B1"]));
        graph.link(id("D1"), &ids(&["A1", "C1"]));

        assert_eq!(graph.affected(&[id("A1")]), ids(&["A1", "B1", "D1", "C1"]));

        let plan = graph.recalc_plan(&[id("A1")]);
        assert_eq!(plan.ordered, ids(&["A1", "B1", "C1", "D1"]));
        assert!(plan.cyclic.is_empty());
    }

    #[test]
    fn test_recalc_plan_reports_cycle() {
        // B1 = A1 + C1, C1 = B1, D1 = C1
        let mut graph = DependencyGraph::new();
        graph.link(id("B1"), &ids(&["A1", "C1"]));
        graph.link(id("C1"), &ids(&["B1"]));
        graph.link(id("D1"), &ids(&["C1"]));

        let plan = graph.recalc_plan(&[id("A1")]);
        assert_eq!(plan.ordered, ids(&["A1"]));
        assert_eq!(plan.cyclic, ids(&["B1", "C1", "D1"]));
    }
}
