use std::collections::HashMap;

use crate::config::PROXIMITY_THRESHOLD_DEG;
use crate::types::{LatLng, Market, MarketId};

/// Partition of one filtered view into same-location groups.
///
/// Rebuilt from scratch whenever the view changes; ids from an older view are
/// simply unknown here.
#[derive(Debug, Clone, Default)]
pub struct GeoGrouping {
    groups: Vec<Vec<MarketId>>,
    /// id → index into `groups`
    membership: HashMap<MarketId, usize>,
}

impl GeoGrouping {
    /// Each unprocessed market seeds a group, which then absorbs every
    /// unprocessed market within the threshold of any member on both axes.
    /// Members keep view order. O(n²), fine for the few hundred markets of a
    /// season. Markets without coordinates stay alone.
    pub fn build(view: &[&Market]) -> Self {
        let mut groups: Vec<Vec<MarketId>> = Vec::new();
        let mut membership = HashMap::with_capacity(view.len());
        let mut grouped = vec![false; view.len()];

        for i in 0..view.len() {
            if grouped[i] {
                continue;
            }
            grouped[i] = true;
            let mut members = vec![i];
            let mut pending = vec![i];

            while let Some(k) = pending.pop() {
                let Some(at) = view[k].coords else {
                    continue;
                };
                for j in (i + 1)..view.len() {
                    if !grouped[j] && view[j].coords.is_some_and(|other| same_location(at, other)) {
                        grouped[j] = true;
                        members.push(j);
                        pending.push(j);
                    }
                }
            }

            members.sort_unstable();
            let group_idx = groups.len();
            let group: Vec<MarketId> = members.iter().map(|&m| view[m].id.clone()).collect();
            for id in &group {
                membership.insert(id.clone(), group_idx);
            }
            groups.push(group);
        }

        Self { groups, membership }
    }

    pub fn groups(&self) -> &[Vec<MarketId>] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// All ids sharing a location with `id`, `id` included.
    pub fn group_of(&self, id: &MarketId) -> Option<&[MarketId]> {
        self.membership.get(id).map(|&g| self.groups[g].as_slice())
    }

    /// Marker badge count; 0 for ids outside the view.
    pub fn group_size(&self, id: &MarketId) -> usize {
        self.group_of(id).map_or(0, <[MarketId]>::len)
    }
}

pub fn same_location(a: LatLng, b: LatLng) -> bool {
    (a.lat - b.lat).abs() < PROXIMITY_THRESHOLD_DEG && (a.lng - b.lng).abs() < PROXIMITY_THRESHOLD_DEG
}

/// Every market in the view whose trimmed, lowercased city equals the
/// target's. A target without a city only groups with itself.
pub fn city_group(view: &[&Market], target: &Market) -> Vec<MarketId> {
    let key = target.city_key();
    if key.is_empty() {
        return vec![target.id.clone()];
    }
    view.iter()
        .filter(|m| m.city_key() == key)
        .map(|m| m.id.clone())
        .collect()
}
