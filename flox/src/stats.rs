//! Cached aggregate statistics.
//!
//! Every metric in [`crate::metrics`] scales against these values, so they
//! are recomputed in one pass whenever membership or values change.

use crate::model::Flow;
use crate::FlowModel;
use tracing::debug;

/// Straight-line planar distance between a flow's endpoints.
pub(crate) fn baseline_length_of(m: &FlowModel, f: &Flow) -> f64 {
    match (m.node(f.start), m.node(f.end)) {
        (Some(a), Some(b)) if a.has_planar() && b.has_planar() => a.planar().distance(&b.planar()),
        _ => 0.0,
    }
}

fn length_bounds(m: &FlowModel) -> (f64, f64) {
    let mut min_len = f64::INFINITY;
    let mut max_len = 0.0_f64;
    for (_, f) in m.flows() {
        let l = baseline_length_of(m, f);
        max_len = max_len.max(l);
        min_len = min_len.min(l);
    }
    if min_len.is_infinite() {
        min_len = 0.0;
    }
    (min_len, max_len)
}

pub(crate) fn recompute_impl(m: &mut FlowModel) {
    // Flows: values and baseline lengths
    let mut flow_sum = 0.0;
    let mut flow_count = 0usize;
    let mut min_fv = 0.0;
    let mut max_fv = 0.0;
    for (_, f) in m.flows() {
        let v = f.value;
        if flow_count == 0 {
            min_fv = v;
            max_fv = v;
        } else {
            min_fv = f64::min(min_fv, v);
            max_fv = f64::max(max_fv, v);
        }
        flow_sum += v;
        flow_count += 1;
    }
    let (min_len, max_len) = length_bounds(m);

    // Nodes: unset values default to 1 as part of the scan
    let mut node_sum = 0.0;
    let mut node_count = 0usize;
    let mut min_nv = 0.0;
    let mut max_nv = 0.0;
    for n in m.nodes.iter_mut().flatten() {
        if n.value_is_unset() {
            n.value = 1.0;
        }
        let v = n.value;
        if node_count == 0 {
            min_nv = v;
            max_nv = v;
        } else {
            min_nv = f64::min(min_nv, v);
            max_nv = f64::max(max_nv, v);
        }
        node_sum += v;
        node_count += 1;
    }

    let s = &mut m.settings;
    s.min_flow_value = min_fv;
    s.max_flow_value = max_fv;
    s.mean_flow_value = if flow_count > 0 { flow_sum / flow_count as f64 } else { 0.0 };
    s.all_flows_total_value = flow_sum;
    s.min_flow_length = min_len;
    s.max_flow_length = max_len;
    s.min_node_value = min_nv;
    s.max_node_value = max_nv;
    s.mean_node_value = if node_count > 0 { node_sum / node_count as f64 } else { 0.0 };
    m.stale = false;
    debug!(
        flows = flow_count,
        nodes = node_count,
        max_flow_value = max_fv,
        max_node_value = max_nv,
        "recomputed aggregates"
    );
}

// Lengths move with reprojection (zoom) while values do not.
pub(crate) fn refresh_flow_lengths_impl(m: &mut FlowModel) -> (f64, f64) {
    let (min_len, max_len) = length_bounds(m);
    m.settings.min_flow_length = min_len;
    m.settings.max_flow_length = max_len;
    (min_len, max_len)
}

pub(crate) fn above_average_impl(m: &mut FlowModel) -> usize {
    let n = m.flow_count();
    let count = if n == 0 {
        0
    } else {
        let total: f64 = m.flows().map(|(_, f)| f.value).sum();
        let avg = total / n as f64;
        m.flows().filter(|(_, f)| f.value > avg).count()
    };
    m.settings.above_average_flow_count = Some(count);
    debug!(count, flows = n, "above average flow count");
    count
}

pub(crate) fn percentage_shown_impl(m: &FlowModel) -> f64 {
    let shown = m.largest_flows(None).len();
    let mut all_total = 0.0;
    let mut shown_total = 0.0;
    for (i, (_, f)) in m.flows().enumerate() {
        all_total += f.value;
        if i < shown {
            shown_total += f.value;
        }
    }
    if all_total == 0.0 {
        return 0.0;
    }
    shown_total / all_total * 100.0
}
