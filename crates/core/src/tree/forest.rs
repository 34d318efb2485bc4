#![forbid(unsafe_code)]

use super::{ReorderPlan, WidgetPosition};
use crate::ids::WidgetId;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) parent_id: Option<WidgetId>,
    pub(crate) order: Option<u32>,
}

/// Working copy of a group's rows. Mutations rewrite whole sibling groups and
/// `into_plan` diffs the result against the snapshot it started from.
pub(crate) struct Forest {
    rows: BTreeMap<WidgetId, Slot>,
    original: BTreeMap<WidgetId, Slot>,
}

impl Forest {
    pub(crate) fn new(all: &[WidgetPosition]) -> Self {
        let rows = all
            .iter()
            .map(|row| {
                (
                    row.id,
                    Slot {
                        parent_id: row.parent_id,
                        order: row.order,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        Self {
            original: rows.clone(),
            rows,
        }
    }

    pub(crate) fn contains(&self, id: WidgetId) -> bool {
        self.rows.contains_key(&id)
    }

    pub(crate) fn slot(&self, id: WidgetId) -> Option<Slot> {
        self.rows.get(&id).copied()
    }

    /// Ordered members of a sibling group, by current order then id.
    pub(crate) fn members(&self, parent_id: Option<WidgetId>) -> Vec<WidgetId> {
        let mut members = self
            .rows
            .iter()
            .filter_map(|(id, slot)| {
                let order = slot.order?;
                (slot.parent_id == parent_id).then_some((order, *id))
            })
            .collect::<Vec<_>>();
        members.sort();
        members.into_iter().map(|(_, id)| id).collect()
    }

    /// Takes an ordered widget out of its sibling group and renumbers the rest.
    pub(crate) fn detach(&mut self, id: WidgetId) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        if slot.order.is_none() {
            return;
        }
        self.rows.insert(
            id,
            Slot {
                parent_id: None,
                order: None,
            },
        );
        let remaining = self.members(slot.parent_id);
        self.assign(slot.parent_id, &remaining);
    }

    /// Splices a detached widget into a sibling group. `index` past the end appends.
    pub(crate) fn insert_at(&mut self, id: WidgetId, parent_id: Option<WidgetId>, index: usize) {
        let mut members = self.members(parent_id);
        members.retain(|member| *member != id);
        let index = index.min(members.len());
        members.insert(index, id);
        self.assign(parent_id, &members);
    }

    fn assign(&mut self, parent_id: Option<WidgetId>, members: &[WidgetId]) {
        for (index, id) in members.iter().enumerate() {
            let order = u32::try_from(index + 1).unwrap_or(u32::MAX);
            self.rows.insert(
                *id,
                Slot {
                    parent_id,
                    order: Some(order),
                },
            );
        }
    }

    /// Whether `ancestor` appears on the parent chain of `candidate`.
    /// A pre-existing cycle on that chain counts as a match.
    pub(crate) fn has_ancestor(&self, candidate: WidgetId, ancestor: WidgetId) -> bool {
        let mut seen = BTreeSet::new();
        let mut current = self.slot(candidate).and_then(|slot| slot.parent_id);
        while let Some(parent) = current {
            if parent == ancestor || !seen.insert(parent) {
                return true;
            }
            current = self.slot(parent).and_then(|slot| slot.parent_id);
        }
        false
    }

    /// Rows whose position changed, plus any listed in `always` that end up ordered.
    pub(crate) fn into_plan(self, always: &[WidgetId]) -> ReorderPlan {
        let mut plan = ReorderPlan::default();
        for (id, slot) in &self.rows {
            let before = self.original.get(id).copied();
            let changed = before != Some(*slot);
            if !changed && !always.contains(id) {
                continue;
            }
            match slot.order {
                Some(order) => plan.updates.push(WidgetPosition {
                    id: *id,
                    parent_id: slot.parent_id,
                    order: Some(order),
                }),
                None if changed => plan.cleared.push(*id),
                None => {}
            }
        }
        plan
    }
}
