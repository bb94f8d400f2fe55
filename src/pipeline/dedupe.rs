use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::domain::CityRecord;
use crate::pipeline::normalize::CanonicalKey;

/// One canonical key that appeared more than once in the reference input
#[derive(Debug, Clone, Serialize)]
pub struct KeyCollision {
    pub key: CanonicalKey,
    pub entries: usize,
    /// True when the winning population was shared by several entries
    /// and input order decided the winner
    pub tie_broken: bool,
    pub chosen_geoname_id: i64,
}

/// Reference cities collapsed to one row per canonical key.
///
/// When a key occurs multiple times the entry with the highest population
/// wins; a missing population counts as zero. Ties keep the first entry in
/// input order, so rebuilding from the same input always yields the same
/// index regardless of map iteration order.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    by_key: HashMap<CanonicalKey, CityRecord>,
    collisions: Vec<KeyCollision>,
}

impl ReferenceIndex {
    pub fn build(records: &[CityRecord]) -> Self {
        let mut groups: HashMap<CanonicalKey, Vec<usize>> = HashMap::new();
        let mut key_order: Vec<CanonicalKey> = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            match groups.entry(CanonicalKey::from_name(&record.name)) {
                Entry::Occupied(mut group) => group.get_mut().push(idx),
                Entry::Vacant(slot) => {
                    key_order.push(slot.key().clone());
                    slot.insert(vec![idx]);
                }
            }
        }

        let mut by_key = HashMap::with_capacity(key_order.len());
        let mut collisions = Vec::new();

        for key in key_order {
            let indices = &groups[&key];

            // Strictly-greater comparison in input order keeps the first
            // entry on population ties
            let mut chosen = indices[0];
            let mut best = records[chosen].population.unwrap_or(0);
            for &idx in &indices[1..] {
                let population = records[idx].population.unwrap_or(0);
                if population > best {
                    chosen = idx;
                    best = population;
                }
            }

            if indices.len() > 1 {
                let tied = indices
                    .iter()
                    .filter(|&&idx| records[idx].population.unwrap_or(0) == best)
                    .count();
                debug!(
                    key = %key,
                    entries = indices.len(),
                    chosen_geoname_id = records[chosen].geoname_id,
                    "collapsed duplicate reference entries"
                );
                collisions.push(KeyCollision {
                    key: key.clone(),
                    entries: indices.len(),
                    tie_broken: tied > 1,
                    chosen_geoname_id: records[chosen].geoname_id,
                });
            }

            by_key.insert(key, records[chosen].clone());
        }

        Self { by_key, collisions }
    }

    pub fn get(&self, key: &CanonicalKey) -> Option<&CityRecord> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Duplicate-key diagnostics in first-seen key order
    pub fn collisions(&self) -> &[KeyCollision] {
        &self.collisions
    }

    pub fn into_collisions(self) -> Vec<KeyCollision> {
        self.collisions
    }
}
