pub mod error;
pub mod limits;
pub mod metrics;
pub mod model;
pub mod projection;
pub mod settings;
pub mod stats;
pub mod table;
pub mod geometry {
    pub mod color;
    pub mod tolerance;
}
mod index;
mod json;

pub use error::ModelError;
pub use metrics::{ArrowProfile, Metrics};
pub use model::{
    Color, EndpointRecord, Flow, FlowKey, FlowRecord, NewFlow, Node, NodeKey, NodeRecord, Point,
};
pub use projection::Projector;
pub use settings::Settings;
pub use table::Table;

use index::NodeIndex;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Nodes, flows and settings of one flow map.
///
/// Nodes and flows live in slot arenas addressed by [`NodeKey`] / [`FlowKey`];
/// deleted slots stay `None` so handles held elsewhere never alias. Flow
/// collection order is kept separately in `order` since it is sortable.
pub struct FlowModel {
    pub(crate) nodes: Vec<Option<Node>>, // key is index
    pub(crate) flows: Vec<Option<Flow>>, // key is index
    pub(crate) order: Vec<FlowKey>,
    pub(crate) settings: Settings,
    pub(crate) stale: bool,
    live_nodes: usize,
    next_flow_id: u32,
    index: NodeIndex,
    projector: Box<dyn Projector>,
}

impl FlowModel {
    pub fn new<P: Projector + 'static>(projector: P) -> Self {
        FlowModel {
            nodes: Vec::new(),
            flows: Vec::new(),
            order: Vec::new(),
            settings: Settings::default(),
            stale: false,
            live_nodes: 0,
            next_flow_id: 0,
            index: NodeIndex::default(),
            projector: Box::new(projector),
        }
    }

    // Settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    /// Replaces the settings wholesale. Cached aggregates are recomputed
    /// before the next metrics read.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.stale = true;
    }
    pub fn set_scale_multiplier_by_state(&mut self, fips: &str) {
        self.settings.scale_multiplier = settings::scale_for_state(fips);
    }
    pub fn aggregates_stale(&self) -> bool {
        self.stale
    }

    // Lookup
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key.index()).and_then(|n| n.as_ref())
    }
    pub fn flow(&self, key: FlowKey) -> Option<&Flow> {
        self.flows.get(key.index()).and_then(|f| f.as_ref())
    }
    pub(crate) fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key.index()).and_then(|n| n.as_mut())
    }
    pub(crate) fn flow_mut(&mut self, key: FlowKey) -> Option<&mut Flow> {
        self.flows.get_mut(key.index()).and_then(|f| f.as_mut())
    }
    /// Registered nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeKey(i as u32), n)))
    }
    /// Flows in collection order.
    pub fn flows(&self) -> impl Iterator<Item = (FlowKey, &Flow)> + '_ {
        self.order
            .iter()
            .filter_map(move |k| self.flow(*k).map(|f| (*k, f)))
    }
    pub fn flow_keys(&self) -> &[FlowKey] {
        &self.order
    }
    pub fn node_count(&self) -> usize {
        self.live_nodes
    }
    pub fn flow_count(&self) -> usize {
        self.order.len()
    }
    /// Looks up a node by its label, whether supplied or allocated.
    pub fn find_node_by_id(&self, id: &str) -> Option<NodeKey> {
        self.index.by_label(id)
    }

    /// Identity lookup: an id matching a supplied id wins, else bitwise-equal
    /// lat/lng. Ids allocated at registration never match.
    pub fn find_node(&self, candidate: &Node) -> Option<NodeKey> {
        if let Some(id) = candidate.id.as_deref() {
            if let Some(key) = self.index.by_id(id) {
                return Some(key);
            }
        }
        self.index.by_location(candidate.lat, candidate.lng)
    }

    /// Returns the canonical node for `candidate`, registering it when no
    /// existing node matches. Lookup never modifies existing nodes; a newly
    /// supplied id may only displace an allocated label of the same text.
    pub fn find_or_register_node(&mut self, mut candidate: Node) -> (bool, NodeKey) {
        if let Some(key) = self.find_node(&candidate) {
            return (true, key);
        }
        let key = NodeKey(self.nodes.len() as u32);
        let allocated = candidate.id.is_none();
        if allocated {
            candidate.id = Some(self.allocate_node_id(key));
        }
        candidate.incoming.clear();
        candidate.outgoing.clear();
        let displaced = match (&candidate.id, allocated) {
            (Some(id), false) => self.index.take_allocated(id),
            _ => None,
        };
        self.index.insert(key, &candidate, allocated);
        self.nodes.push(Some(candidate));
        self.live_nodes += 1;
        if let Some(other) = displaced {
            self.relabel(other);
        }
        self.stale = true;
        (false, key)
    }

    // Index-derived label, skipping past labels already in use.
    fn allocate_node_id(&self, key: NodeKey) -> String {
        let mut n = key.0 as u64;
        loop {
            let id = n.to_string();
            if !self.index.label_taken(&id) {
                return id;
            }
            n += 1;
        }
    }

    fn relabel(&mut self, key: NodeKey) {
        let id = self.allocate_node_id(key);
        match self.node_mut(key) {
            Some(n) => {
                debug!(node = key.0, from = ?n.id, to = %id, "relabelled node");
                n.id = Some(id.clone());
            }
            None => return,
        }
        self.index.insert_allocated(id, key);
    }

    fn ensure_projected(&self, node: &mut Node) {
        if !node.has_planar() {
            node.xy = Some(self.projector.project(node.lat, node.lng));
        }
    }

    // Nodes
    pub fn add_node(&mut self, mut node: Node) -> NodeKey {
        self.ensure_projected(&mut node);
        let (existed, key) = self.find_or_register_node(node);
        if !existed {
            debug!(node = key.0, "registered node");
        }
        key
    }
    pub fn add_nodes<I: IntoIterator<Item = Node>>(&mut self, batch: I) -> Vec<NodeKey> {
        batch.into_iter().map(|n| self.add_node(n)).collect()
    }
    /// Drops every flow and replaces the node collection with `batch`.
    pub fn init_nodes<I: IntoIterator<Item = Node>>(&mut self, batch: I) -> Vec<NodeKey> {
        self.delete_all_flows();
        let keys = self.add_nodes(batch);
        info!(nodes = self.node_count(), "initialised nodes");
        keys
    }
    /// Removes `key` and every flow starting or ending there.
    pub fn delete_node(&mut self, key: NodeKey) -> bool {
        if self.node(key).is_none() {
            return false;
        }
        let incident: Vec<FlowKey> = self
            .flows()
            .filter(|(_, f)| f.touches(key))
            .map(|(k, _)| k)
            .collect();
        for fk in &incident {
            self.unlink_flow(*fk);
        }
        let removed: HashSet<FlowKey> = incident.iter().copied().collect();
        self.order.retain(|k| !removed.contains(k));
        if let Some(node) = self.nodes.get_mut(key.index()).and_then(|slot| slot.take()) {
            self.index.remove(key, &node);
            self.live_nodes -= 1;
        }
        debug!(node = key.0, flows = incident.len(), "deleted node");
        self.recompute_aggregates();
        true
    }
    pub fn delete_node_checked(&mut self, key: NodeKey) -> Result<(), ModelError> {
        if self.delete_node(key) {
            Ok(())
        } else {
            Err(ModelError::UnknownNode(key))
        }
    }

    // Takes a flow out of its slot and out of every relation pointing at it.
    fn unlink_flow(&mut self, fk: FlowKey) {
        let flow = match self.flows.get_mut(fk.index()).and_then(|slot| slot.take()) {
            Some(f) => f,
            None => return,
        };
        if let Some(start) = self.node_mut(flow.start) {
            start.outgoing.retain(|k| *k != fk);
        }
        if let Some(end) = self.node_mut(flow.end) {
            end.incoming.retain(|k| *k != fk);
        }
        if let Some(opp) = flow.opposite.and_then(|o| self.flow_mut(o)) {
            if opp.opposite == Some(fk) {
                opp.opposite = None;
            }
        }
    }

    /// Full teardown: empties both the flow and the node collection.
    pub fn delete_all_flows(&mut self) {
        self.nodes.clear();
        self.flows.clear();
        self.order.clear();
        self.index.clear();
        self.live_nodes = 0;
        self.next_flow_id = 0;
        self.stale = true;
    }

    // Flows
    pub fn add_flow(&mut self, flow: NewFlow) -> FlowKey {
        self.insert_flow(flow)
    }
    /// Adds `batch` in order and pairs each new flow with its opposite.
    pub fn add_flows<I: IntoIterator<Item = NewFlow>>(&mut self, batch: I) -> Vec<FlowKey> {
        let mut keys = Vec::new();
        for f in batch {
            let key = self.insert_flow(f);
            self.assign_opposite_flow(key);
            keys.push(key);
        }
        info!(added = keys.len(), flows = self.flow_count(), "added flows");
        keys
    }

    fn insert_flow(&mut self, flow: NewFlow) -> FlowKey {
        let NewFlow {
            mut start,
            mut end,
            value,
            ctrl_pt,
            locked,
            a_to_b,
            b_to_a,
        } = flow;
        self.ensure_projected(&mut start);
        self.ensure_projected(&mut end);
        let (_, start) = self.find_or_register_node(start);
        let (_, end) = self.find_or_register_node(end);
        let key = FlowKey(self.flows.len() as u32);
        let id = self.next_flow_id;
        self.next_flow_id += 1;
        self.flows.push(Some(Flow {
            id,
            start,
            end,
            value,
            locked,
            selected: false,
            ctrl_pt,
            opposite: None,
            a_to_b,
            b_to_a,
        }));
        self.order.push(key);
        if let Some(n) = self.node_mut(start) {
            n.outgoing.push(key);
        }
        if let Some(n) = self.node_mut(end) {
            n.incoming.push(key);
        }
        self.stale = true;
        key
    }

    /// Pairs `key` with the first unpaired flow running the other way,
    /// scanning the end node's outgoing flows in adjacency order.
    pub fn assign_opposite_flow(&mut self, key: FlowKey) -> Option<FlowKey> {
        let (start, end) = match self.flow(key) {
            Some(f) if f.opposite.is_none() => (f.start, f.end),
            _ => return None,
        };
        let candidate = self.node(end)?.outgoing.iter().copied().find(|c| {
            *c != key
                && self
                    .flow(*c)
                    .map_or(false, |cf| cf.opposite.is_none() && cf.end == start)
        })?;
        if let Some(f) = self.flow_mut(key) {
            f.opposite = Some(candidate);
        }
        if let Some(c) = self.flow_mut(candidate) {
            c.opposite = Some(key);
        }
        Some(candidate)
    }

    // Editing
    pub fn set_node_value(&mut self, key: NodeKey, value: f64) -> bool {
        match self.node_mut(key) {
            Some(n) => {
                n.value = value;
                self.stale = true;
                true
            }
            None => false,
        }
    }
    /// Moves a node to new geographic coordinates and reprojects it.
    pub fn set_node_location(&mut self, key: NodeKey, lat: f64, lng: f64) -> bool {
        let xy = self.projector.project(lat, lng);
        let from = match self.node_mut(key) {
            Some(n) => {
                let from = (n.lat, n.lng);
                n.lat = lat;
                n.lng = lng;
                n.xy = Some(xy);
                from
            }
            None => return false,
        };
        self.index.relocate(key, from, (lat, lng));
        self.stale = true;
        true
    }
    pub fn set_flow_value(&mut self, key: FlowKey, value: f64) -> bool {
        match self.flow_mut(key) {
            Some(f) => {
                f.value = value;
                self.stale = true;
                true
            }
            None => false,
        }
    }
    /// Stores a control point computed by the layout solver.
    pub fn set_ctrl_pt(&mut self, key: FlowKey, pt: Point) -> bool {
        match self.flow_mut(key) {
            Some(f) => {
                f.ctrl_pt = Some(pt);
                true
            }
            None => false,
        }
    }
    pub fn ctrl_pt(&self, key: FlowKey) -> Option<Point> {
        let f = self.flow(key)?;
        match f.ctrl_pt {
            Some(p) => Some(p),
            None => {
                let a = self.node(f.start)?.planar();
                let b = self.node(f.end)?.planar();
                Some(a.midpoint(&b))
            }
        }
    }
    pub fn ctrl_pts(&self) -> Vec<Point> {
        self.order.iter().filter_map(|k| self.ctrl_pt(*k)).collect()
    }

    // Selection
    pub fn select_node(&mut self, key: NodeKey, selected: bool) -> bool {
        match self.node_mut(key) {
            Some(n) => {
                n.selected = selected;
                true
            }
            None => false,
        }
    }
    pub fn select_flow(&mut self, key: FlowKey, selected: bool) -> bool {
        match self.flow_mut(key) {
            Some(f) => {
                f.selected = selected;
                true
            }
            None => false,
        }
    }
    pub fn deselect_all_features(&mut self) {
        for f in self.flows.iter_mut().flatten() {
            f.selected = false;
        }
        for n in self.nodes.iter_mut().flatten() {
            n.selected = false;
        }
    }
    pub fn selected_nodes(&self) -> Vec<NodeKey> {
        self.nodes()
            .filter(|(_, n)| n.selected)
            .map(|(k, _)| k)
            .collect()
    }
    pub fn selected_flows(&self) -> Vec<FlowKey> {
        self.flows()
            .filter(|(_, f)| f.selected)
            .map(|(k, _)| k)
            .collect()
    }
    /// Nodes not sized by a companion necklace layout.
    pub fn non_external_nodes(&self) -> Vec<NodeKey> {
        self.nodes()
            .filter(|(_, n)| !n.external)
            .map(|(k, _)| k)
            .collect()
    }

    // Ordering
    /// Sorts flows by value, descending unless `ascending`.
    pub fn sort_flows(&mut self, ascending: bool) {
        let flows = &self.flows;
        let value = |k: &FlowKey| {
            flows
                .get(k.index())
                .and_then(|f| f.as_ref())
                .map_or(0.0, |f| f.value)
        };
        if ascending {
            self.order.sort_by(|a, b| value(a).total_cmp(&value(b)));
        } else {
            self.order.sort_by(|a, b| value(b).total_cmp(&value(a)));
        }
    }
    /// First `n` flows in collection order (`maxFlows` when `None` or 0).
    /// Assumes the flows were sorted.
    pub fn largest_flows(&self, n: Option<usize>) -> &[FlowKey] {
        let n = match n {
            Some(n) if n > 0 => n,
            _ => self.settings.max_flows,
        };
        let n = n.min(self.order.len());
        &self.order[..n]
    }

    // Locks
    pub fn locks(&self) -> Vec<bool> {
        self.flows().map(|(_, f)| f.locked).collect()
    }
    /// Restores per-flow locks. A length mismatch means the locks belong to
    /// a different set of flows; nothing is applied.
    pub fn apply_locks(&mut self, locks: &[bool]) -> Result<(), ModelError> {
        if locks.len() != self.order.len() {
            warn!(
                flows = self.order.len(),
                locks = locks.len(),
                "flows and locks have different lengths"
            );
            return Err(ModelError::LockCountMismatch {
                expected: self.order.len(),
                got: locks.len(),
            });
        }
        for (i, locked) in locks.iter().enumerate() {
            let key = self.order[i];
            if let Some(f) = self.flow_mut(key) {
                f.locked = *locked;
            }
        }
        Ok(())
    }

    // Aggregates
    pub fn recompute_aggregates(&mut self) {
        stats::recompute_impl(self);
    }
    pub fn refresh_flow_lengths(&mut self) -> (f64, f64) {
        stats::refresh_flow_lengths_impl(self)
    }
    pub fn baseline_length(&self, key: FlowKey) -> Option<f64> {
        self.flow(key).map(|f| stats::baseline_length_of(self, f))
    }
    pub fn above_average_flow_count(&mut self) -> usize {
        stats::above_average_impl(self)
    }
    pub fn percentage_of_total_flow_shown(&self) -> f64 {
        stats::percentage_shown_impl(self)
    }

    /// Read-only metrics view, recomputing the cached aggregates first when
    /// any mutation happened since the last recomputation.
    pub fn metrics(&mut self) -> Metrics<'_> {
        if self.stale {
            self.recompute_aggregates();
        }
        Metrics::new(self)
    }
    pub fn try_metrics(&self) -> Result<Metrics<'_>, ModelError> {
        if self.stale {
            return Err(ModelError::StaleAggregates);
        }
        Ok(Metrics::new(self))
    }

    // Tables
    pub fn node_table(&self) -> Table {
        table::node_table_impl(self)
    }
    pub fn flow_table(&self) -> Table {
        table::flow_table_impl(self)
    }

    // JSON
    pub fn to_json_value(&self) -> serde_json::Value {
        json::to_json_impl(self)
    }
    pub fn from_json_value(&mut self, v: serde_json::Value) -> bool {
        json::from_json_impl(self, v)
    }
    pub fn from_json_value_strict(&mut self, v: serde_json::Value) -> Result<(), ModelError> {
        json::from_json_impl_strict(self, v)
    }
}
