use crate::error::ModelError;
use crate::limits;
use crate::model::{EndpointRecord, FlowRecord, NewFlow, Node, NodeRecord, Point};
use crate::settings::Settings;
use crate::FlowModel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

pub fn to_json_impl(m: &FlowModel) -> Value {
    #[derive(Serialize)]
    struct Doc<'a> {
        settings: &'a Settings,
        nodes: Vec<NodeRecord>,
        flows: Vec<FlowRecord>,
    }
    let nodes: Vec<NodeRecord> = m.nodes().map(|(_, n)| NodeRecord::from(n)).collect();
    let mut flows = Vec::new();
    for (key, f) in m.flows() {
        let (a, b) = match (m.node(f.start), m.node(f.end)) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };
        flows.push(FlowRecord {
            start_pt: EndpointRecord::from(a),
            end_pt: EndpointRecord::from(b),
            c_pt: m.ctrl_pt(key),
            value: f.value,
            a_to_b: f.a_to_b,
            b_to_a: f.b_to_a,
        });
    }
    let doc = Doc {
        settings: &m.settings,
        nodes,
        flows,
    };
    // Only plain structs and finite-or-null numbers go in; this cannot fail.
    serde_json::to_value(doc).unwrap_or(Value::Null)
}

pub fn from_json_impl(m: &mut FlowModel, v: Value) -> bool {
    match from_json_impl_strict(m, v) {
        Ok(()) => true,
        Err(e) => {
            warn!(code = e.code(), error = %e, "rejected snapshot");
            false
        }
    }
}

fn check_point(what: &'static str, x: Option<f64>, y: Option<f64>) -> Result<(), ModelError> {
    for v in [x, y].into_iter().flatten() {
        if !limits::in_coord_bounds(v) {
            return Err(ModelError::invalid_coordinate(what, v));
        }
    }
    Ok(())
}

fn check_geo(lat: f64, lng: f64) -> Result<(), ModelError> {
    if !limits::in_lat_bounds(lat) {
        return Err(ModelError::invalid_coordinate("lat", lat));
    }
    if !limits::in_lng_bounds(lng) {
        return Err(ModelError::invalid_coordinate("lng", lng));
    }
    Ok(())
}

fn check_endpoint(e: &EndpointRecord) -> Result<(), ModelError> {
    check_geo(e.lat, e.lng)?;
    check_point("endpoint x/y", e.x, e.y)
}

// Strict variant: the whole document is validated before the model is touched.
pub fn from_json_impl_strict(m: &mut FlowModel, v: Value) -> Result<(), ModelError> {
    #[derive(Deserialize)]
    struct DocDe {
        #[serde(default)]
        settings: Settings,
        nodes: Vec<NodeRecord>,
        flows: Vec<FlowRecord>,
    }
    let doc: DocDe = serde_json::from_value(v)?;

    // Caps: sizes
    if doc.nodes.len() > limits::MAX_NODES {
        return Err(ModelError::LimitExceeded {
            what: "nodes",
            limit: limits::MAX_NODES,
        });
    }
    if doc.flows.len() > limits::MAX_FLOWS {
        return Err(ModelError::LimitExceeded {
            what: "flows",
            limit: limits::MAX_FLOWS,
        });
    }
    // Validate nodes
    for n in &doc.nodes {
        check_geo(n.lat, n.lng)?;
        check_point("node x/y", n.x, n.y)?;
        if let Some(v) = n.value {
            if !limits::valid_value(v) {
                return Err(ModelError::InvalidSnapshot(format!(
                    "node value {} is not finite",
                    v
                )));
            }
        }
    }
    // Validate flows
    for f in &doc.flows {
        check_endpoint(&f.start_pt)?;
        check_endpoint(&f.end_pt)?;
        if let Some(Point { x, y }) = f.c_pt {
            check_point("control point", Some(x), Some(y))?;
        }
        if !limits::valid_value(f.value) {
            return Err(ModelError::InvalidSnapshot(format!(
                "flow value {} is not finite",
                f.value
            )));
        }
    }

    let node_count = doc.nodes.len();
    let flow_count = doc.flows.len();
    m.init_nodes(doc.nodes.into_iter().map(Node::from));
    m.add_flows(doc.flows.into_iter().map(NewFlow::from));
    m.update_settings(doc.settings);
    info!(
        nodes = node_count,
        flows = flow_count,
        registered_nodes = m.node_count(),
        "loaded snapshot"
    );
    Ok(())
}
