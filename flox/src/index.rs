use crate::model::{Node, NodeKey};
use std::collections::HashMap;

// Lookup tables behind node deduplication. Location buckets keep keys in
// ascending (insertion) order so the first registered match wins.
//
// Ids supplied with a node take part in identity matching; ids allocated at
// registration only label the node and never match a candidate.
#[derive(Clone, Debug, Default)]
pub(crate) struct NodeIndex {
    by_id: HashMap<String, NodeKey>,
    allocated: HashMap<String, NodeKey>,
    by_loc: HashMap<(u64, u64), Vec<NodeKey>>,
}

#[inline]
fn loc_key(lat: f64, lng: f64) -> (u64, u64) {
    (lat.to_bits(), lng.to_bits())
}

fn drop_if_owned(map: &mut HashMap<String, NodeKey>, id: &str, key: NodeKey) {
    if map.get(id) == Some(&key) {
        map.remove(id);
    }
}

impl NodeIndex {
    pub fn insert(&mut self, key: NodeKey, node: &Node, allocated: bool) {
        if let Some(id) = &node.id {
            let map = if allocated { &mut self.allocated } else { &mut self.by_id };
            map.entry(id.clone()).or_insert(key);
        }
        self.insert_loc(key, node.lat, node.lng);
    }

    pub fn remove(&mut self, key: NodeKey, node: &Node) {
        if let Some(id) = &node.id {
            drop_if_owned(&mut self.by_id, id, key);
            drop_if_owned(&mut self.allocated, id, key);
        }
        self.remove_loc(key, node.lat, node.lng);
    }

    pub fn relocate(&mut self, key: NodeKey, from: (f64, f64), to: (f64, f64)) {
        self.remove_loc(key, from.0, from.1);
        self.insert_loc(key, to.0, to.1);
    }

    /// Supplied ids only; the identity-matching table.
    pub fn by_id(&self, id: &str) -> Option<NodeKey> {
        self.by_id.get(id).copied()
    }

    /// Any label, supplied first.
    pub fn by_label(&self, id: &str) -> Option<NodeKey> {
        self.by_id(id).or_else(|| self.allocated.get(id).copied())
    }

    pub fn label_taken(&self, id: &str) -> bool {
        self.by_id.contains_key(id) || self.allocated.contains_key(id)
    }

    /// Releases an allocated label so a supplied id of the same text can own it.
    pub fn take_allocated(&mut self, id: &str) -> Option<NodeKey> {
        self.allocated.remove(id)
    }

    pub fn insert_allocated(&mut self, id: String, key: NodeKey) {
        self.allocated.insert(id, key);
    }

    pub fn by_location(&self, lat: f64, lng: f64) -> Option<NodeKey> {
        self.by_loc
            .get(&loc_key(lat, lng))
            .and_then(|bucket| bucket.first().copied())
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.allocated.clear();
        self.by_loc.clear();
    }

    fn insert_loc(&mut self, key: NodeKey, lat: f64, lng: f64) {
        let bucket = self.by_loc.entry(loc_key(lat, lng)).or_default();
        if let Err(pos) = bucket.binary_search(&key) {
            bucket.insert(pos, key);
        }
    }

    fn remove_loc(&mut self, key: NodeKey, lat: f64, lng: f64) {
        let k = loc_key(lat, lng);
        if let Some(bucket) = self.by_loc.get_mut(&k) {
            bucket.retain(|b| *b != key);
            if bucket.is_empty() {
                self.by_loc.remove(&k);
            }
        }
    }
}
