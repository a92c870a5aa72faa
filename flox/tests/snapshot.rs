use flox::{FlowModel, NewFlow, Node, Point};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn model() -> FlowModel {
    // RUST_LOG=flox=debug shows snapshot load/reject events
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    FlowModel::new(|lat: f64, lng: f64| Point::new(lng, -lat))
}

fn sample() -> FlowModel {
    let mut m = model();
    let mut a_to_b = NewFlow::new(Node::new(40.0, -74.0), Node::new(34.0, -118.0), 12.0);
    a_to_b.a_to_b = true;
    a_to_b.ctrl_pt = Some(Point::new(-96.0, -30.0));
    let back = NewFlow::new(Node::new(34.0, -118.0), Node::new(40.0, -74.0), 5.0);
    let other = NewFlow::new(Node::new(40.0, -74.0), Node::new(41.9, -87.6), 7.5);
    m.add_flows(vec![a_to_b, back, other]);
    m.set_node_value(m.find_node_by_id("0").unwrap(), 3.0);
    m
}

#[test]
fn round_trip_preserves_nodes_and_flows() {
    let src = sample();
    let doc = src.to_json_value();

    let mut dst = model();
    assert!(dst.from_json_value(doc));
    assert_eq!(dst.node_count(), src.node_count());
    assert_eq!(dst.flow_count(), src.flow_count());

    for (_, n) in src.nodes() {
        let id = n.id.as_deref().unwrap();
        let k = dst.find_node_by_id(id).expect("node survives");
        let m = dst.node(k).unwrap();
        assert_eq!((m.lat, m.lng), (n.lat, n.lng));
        assert_eq!(m.xy, n.xy);
        assert_eq!(m.value, n.value);
    }

    let pairs: Vec<_> = src.flows().zip(dst.flows()).collect();
    for ((sk, s), (dk, d)) in pairs {
        assert_eq!(s.value, d.value);
        assert_eq!(s.a_to_b, d.a_to_b);
        assert_eq!(s.b_to_a, d.b_to_a);
        assert_eq!(src.ctrl_pt(sk), dst.ctrl_pt(dk));
        let s_start = src.node(s.start).unwrap().id.clone();
        let d_start = dst.node(d.start).unwrap().id.clone();
        assert_eq!(s_start, d_start);
    }

    // pairing is rebuilt on import
    let first = dst.flow_keys()[0];
    assert_eq!(dst.flow(first).unwrap().opposite, Some(dst.flow_keys()[1]));
}

#[test]
fn ids_are_stable_across_repeated_round_trips() {
    let src = sample();
    let once = src.to_json_value();
    let mut a = model();
    assert!(a.from_json_value(once.clone()));
    let twice = a.to_json_value();
    assert_eq!(once["nodes"], twice["nodes"]);
    assert_eq!(once["flows"], twice["flows"]);
}

#[test]
fn snapshot_uses_persisted_key_names() {
    let doc = sample().to_json_value();
    let f = &doc["flows"][0];
    assert!(f.get("startPt").is_some());
    assert!(f.get("endPt").is_some());
    assert!(f.get("cPt").is_some());
    assert_eq!(f["AtoB"], json!(true));
    assert_eq!(f["BtoA"], json!(false));
    assert!(doc["settings"].get("maxFlowWidth").is_some());
    assert!(doc["settings"].get("NODE_STROKE_WIDTH").is_some());
}

#[test]
fn extra_node_fields_are_carried_through() {
    let doc = json!({
        "nodes": [
            {"id": "nyc", "lat": 40.7, "lng": -74.0, "value": 8.0, "name": "New York", "fips": 36},
            {"id": "la", "lat": 34.0, "lng": -118.2}
        ],
        "flows": [
            {"startPt": {"lat": 40.7, "lng": -74.0, "id": "nyc"}, "endPt": {"lat": 34.0, "lng": -118.2, "id": "la"}, "value": 2.0}
        ]
    });
    let mut m = model();
    assert!(m.from_json_value(doc));
    let nyc = m.node(m.find_node_by_id("nyc").unwrap()).unwrap();
    assert_eq!(nyc.attributes.get("name"), Some(&json!("New York")));

    let out = m.to_json_value();
    let written = out["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == json!("nyc"))
        .unwrap();
    assert_eq!(written["name"], json!("New York"));
    assert_eq!(written["fips"], json!(36));
}

#[test]
fn numeric_ids_are_read_as_text() {
    let doc = json!({
        "nodes": [{"id": 7, "lat": 1.0, "lng": 2.0}],
        "flows": [
            {"startPt": {"lat": 1.0, "lng": 2.0, "id": 7}, "endPt": {"lat": 3.0, "lng": 4.0}, "value": 1.0}
        ]
    });
    let mut m = model();
    assert!(m.from_json_value(doc));
    assert!(m.find_node_by_id("7").is_some());
    assert_eq!(m.node_count(), 2);
}

#[test]
fn settings_are_replaced_wholesale() {
    let mut src = sample();
    let mut s = src.settings().clone();
    s.max_flow_width = 42.0;
    s.dataset_name = Some("migration".into());
    src.update_settings(s);
    let doc = src.to_json_value();

    let mut dst = model();
    assert!(dst.from_json_value(doc));
    assert_eq!(dst.settings().max_flow_width, 42.0);
    assert_eq!(dst.settings().dataset_name.as_deref(), Some("migration"));
    assert!(dst.aggregates_stale());
}

#[test]
fn missing_settings_fall_back_to_defaults() {
    let doc = json!({"nodes": [], "flows": []});
    let mut m = model();
    let mut s = m.settings().clone();
    s.max_flow_width = 99.0;
    m.update_settings(s);
    assert!(m.from_json_value(doc));
    assert_eq!(m.settings().max_flow_width, 30.0);
}

#[test]
fn rejected_snapshot_leaves_model_untouched() {
    let mut m = sample();
    let before = m.to_json_value();
    assert!(!m.from_json_value(json!({"nodes": "nope", "flows": []})));
    assert!(!m.from_json_value(json!({
        "nodes": [{"lat": 10.0, "lng": 10.0}],
        "flows": [{"startPt": {"lat": 0.0, "lng": 0.0}, "endPt": {"lat": 95.0, "lng": 0.0}, "value": 1.0}]
    })));
    assert_eq!(m.to_json_value(), before);
}

#[test]
fn strict_import_reports_parse_errors() {
    let mut m = model();
    let err = m.from_json_value_strict(json!({"flows": []})).unwrap_err();
    assert_eq!(err.code(), "json_parse");
}

#[test]
fn supplied_ids_do_not_collide_with_allocated_ones() {
    let doc = json!({
        "nodes": [
            {"lat": 10.0, "lng": 10.0},
            {"id": 0, "lat": 20.0, "lng": 20.0}
        ],
        "flows": [
            {"startPt": {"lat": 20.0, "lng": 20.0, "id": 0}, "endPt": {"lat": 10.0, "lng": 10.0}, "value": 4.0}
        ]
    });
    let mut m = model();
    assert!(m.from_json_value(doc));
    assert_eq!(m.node_count(), 2);
    let (_, f) = m.flows().next().unwrap();
    let start = m.node(f.start).unwrap();
    assert_eq!((start.lat, start.lng), (20.0, 20.0));
    assert_eq!(start.id.as_deref(), Some("0"));
    let end = m.node(f.end).unwrap();
    assert_eq!((end.lat, end.lng), (10.0, 10.0));

    // labels stay unique, so a second import keeps both nodes
    let mut again = model();
    assert!(again.from_json_value(m.to_json_value()));
    assert_eq!(again.node_count(), 2);
    assert_eq!(again.to_json_value()["nodes"], m.to_json_value()["nodes"]);
}
