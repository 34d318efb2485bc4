#![forbid(unsafe_code)]

use super::WidgetPosition;
use crate::ids::WidgetId;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DensityViolation {
    pub parent_id: Option<WidgetId>,
    pub orders: Vec<u32>,
}

impl std::fmt::Display for DensityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parent = self
            .parent_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "root".to_string());
        write!(
            f,
            "sibling group under {parent} is not numbered 1..N (orders={:?})",
            self.orders
        )
    }
}

/// Ordered rows grouped by parent, each group sorted by order then id.
pub fn sibling_groups(all: &[WidgetPosition]) -> BTreeMap<Option<WidgetId>, Vec<WidgetPosition>> {
    let mut groups: BTreeMap<Option<WidgetId>, Vec<WidgetPosition>> = BTreeMap::new();
    for row in all.iter().filter(|row| row.order.is_some()) {
        groups.entry(row.parent_id).or_default().push(*row);
    }
    for members in groups.values_mut() {
        members.sort_by_key(|row| (row.order, row.id));
    }
    groups
}

/// Checks that every sibling group is numbered exactly `1..N`.
pub fn check_density(all: &[WidgetPosition]) -> Result<(), DensityViolation> {
    for (parent_id, members) in sibling_groups(all) {
        let orders = members
            .iter()
            .filter_map(|row| row.order)
            .collect::<Vec<_>>();
        let dense = orders
            .iter()
            .enumerate()
            .all(|(index, order)| usize::try_from(*order).is_ok_and(|order| order == index + 1));
        if !dense {
            return Err(DensityViolation { parent_id, orders });
        }
    }
    Ok(())
}
