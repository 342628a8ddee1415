use std::collections::HashSet;

use tallysheet_core::CellId;
use tallysheet_formula::{try_evaluate, DependencyGraph, CYCLE_MARKER};

use crate::config::{CyclePolicy, RecalcOrder};
use crate::sheet::Sheet;

impl Sheet {
    /// Re-evaluate `roots` and every cell transitively reading them.
    ///
    /// Order and cycle handling follow the sheet's configuration. Under
    /// [`RecalcOrder::BreadthFirst`] each cell is evaluated once, when first
    /// dequeued, against the store as updated so far in the same pass.
    pub(crate) fn propagate(&mut self, roots: &[CellId]) {
        let (order, cyclic) = match (self.config.recalc_order, self.config.cycle_policy) {
            (RecalcOrder::BreadthFirst, CyclePolicy::Ignore) => {
                (self.graph.affected(roots), Vec::new())
            }
            (RecalcOrder::BreadthFirst, CyclePolicy::Mark) => {
                let plan = self.graph.recalc_plan(roots);
                let cyclic: HashSet<CellId> = plan.cyclic.iter().copied().collect();
                let order = self
                    .graph
                    .affected(roots)
                    .into_iter()
                    .filter(|id| !cyclic.contains(id))
                    .collect();
                (order, plan.cyclic)
            }
            (RecalcOrder::Topological, policy) => {
                let mut plan = self.graph.recalc_plan(roots);
                if policy == CyclePolicy::Ignore {
                    plan.ordered.append(&mut plan.cyclic);
                }
                (plan.ordered, plan.cyclic)
            }
        };

        tracing::debug!(
            "Recalculating from {} root(s): {} ordered, {} cyclic",
            roots.len(),
            order.len(),
            cyclic.len()
        );

        for id in order {
            self.evaluate_cell(id);
        }
        self.mark_cyclic(&cyclic);
    }

    /// Recompute one formula cell's value from the current store
    fn evaluate_cell(&mut self, id: CellId) {
        let raw = match self.store.get(id) {
            Some(cell) if cell.is_formula() => cell.raw.clone(),
            _ => return,
        };

        let value = match try_evaluate(&raw, &self.store, self.config.eval_options()) {
            Ok(value) => value,
            Err(e) => {
                tracing::trace!("Formula in {} failed: {}", id, e);
                e.marker().to_string()
            }
        };
        tracing::trace!("{} {} -> {}", id, raw, value);
        self.store.set_value(id, value);
    }

    fn mark_cyclic(&mut self, cyclic: &[CellId]) {
        let mut marked = 0;
        for id in cyclic {
            if self.store.get(*id).is_some_and(|c| c.is_formula()) {
                self.store.set_value(*id, CYCLE_MARKER);
                marked += 1;
            }
        }
        if marked > 0 {
            tracing::warn!("Marked {} cell(s) on or behind a circular reference", marked);
        }
    }

    /// Settle every formula in the sheet, precedents first
    pub fn recalculate_all(&mut self) {
        let formulas: Vec<CellId> = self
            .store
            .iter()
            .filter(|c| c.is_formula())
            .map(|c| c.id)
            .collect();
        let mut plan = self.graph.recalc_plan(&formulas);

        tracing::debug!("Recalculating all {} formula(s)", formulas.len());
        for id in &plan.ordered {
            self.evaluate_cell(*id);
        }
        match self.config.cycle_policy {
            CyclePolicy::Ignore => {
                for id in plan.cyclic.drain(..) {
                    self.evaluate_cell(id);
                }
            }
            CyclePolicy::Mark => self.mark_cyclic(&plan.cyclic),
        }
    }

    /// Rebuild the dependency graph from the formulas currently stored
    pub fn rebuild_dependency_graph(&mut self) {
        self.graph = DependencyGraph::from_store(&self.store);
    }
}
