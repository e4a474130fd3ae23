use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::model::{Cause, GroupedCatalog};

/// The set of causes chosen on one screen.
///
/// A single ordered id list is the only mutable state. The per-name boolean
/// view is derived from it on demand, so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Selected ids in toggle order, without duplicates.
    selected: Vec<u64>,
    /// name -> id for every cause the screen knows about.
    names: BTreeMap<String, u64>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a previously saved selection.
    ///
    /// Every id in `selected_ids` is kept, in input order and deduplicated,
    /// even when the catalog does not list it, so the seed reads back intact.
    #[tracing::instrument(skip_all, fields(seed = selected_ids.len(), catalog = catalog.len()))]
    pub fn initialize(selected_ids: &[u64], catalog: &GroupedCatalog) -> Self {
        let mut state = Self::new();
        for cause in catalog.causes() {
            state.names.entry(cause.name.clone()).or_insert(cause.id);
        }

        for id in selected_ids {
            if !state.selected.contains(id) {
                state.selected.push(*id);
            }
        }

        let unknown = state
            .selected
            .iter()
            .filter(|id| catalog.find_by_id(**id).is_none())
            .count();
        if unknown > 0 {
            debug!(unknown, "seeded selection references causes outside the catalog");
        }

        state
    }

    /// Flip one cause: flip its pressed flag and add or remove its id.
    pub fn toggle(&mut self, cause: &Cause) -> bool {
        self.names.entry(cause.name.clone()).or_insert(cause.id);

        let now_selected = match self.selected.iter().position(|id| *id == cause.id) {
            Some(pos) => {
                self.selected.remove(pos);
                false
            }
            None => {
                self.selected.push(cause.id);
                true
            }
        };

        trace!(id = cause.id, name = %cause.name, now_selected, "toggled cause");
        now_selected
    }

    /// Total accessor: names never seen read as unselected.
    pub fn is_pressed(&self, name: &str) -> bool {
        self.names
            .get(name)
            .is_some_and(|id| self.selected.contains(id))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.selected.contains(&id)
    }

    /// Boolean view keyed by cause name, with an entry for every known cause.
    pub fn pressed_states(&self) -> BTreeMap<String, bool> {
        self.names
            .iter()
            .map(|(name, id)| (name.clone(), self.selected.contains(id)))
            .collect()
    }

    /// Selected ids in the order they were toggled on (or seeded).
    pub fn selected_cause_ids(&self) -> &[u64] {
        &self.selected
    }

    /// Selected causes that the catalog can resolve, in selection order.
    pub fn selected_causes<'a>(&self, catalog: &'a GroupedCatalog) -> Vec<&'a Cause> {
        self.selected
            .iter()
            .filter_map(|id| catalog.find_by_id(*id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
