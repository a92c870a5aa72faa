use crate::error;
use crate::interop::{arr_f32, arr_u32, arr_u8, new_obj, set_kv, to_js};
use crate::FlowModel;
use flox::{FlowKey, FlowRecord, NewFlow, Node, NodeKey, NodeRecord, Point, Settings};
use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::prelude::*;
type JsValue = wasm_bindgen::JsValue;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[derive(Serialize)]
struct FlowView {
    id: u32,
    start: u32,
    end: u32,
    value: f64,
    locked: bool,
    selected: bool,
    opposite: Option<u32>,
    #[serde(rename = "cPt")]
    c_pt: Option<Point>,
    #[serde(rename = "AtoB")]
    a_to_b: bool,
    #[serde(rename = "BtoA")]
    b_to_a: bool,
}

fn read_node(v: JsValue) -> Result<Node, serde_wasm_bindgen::Error> {
    serde_wasm_bindgen::from_value::<NodeRecord>(v).map(Node::from)
}

fn read_flow(v: JsValue) -> Result<NewFlow, serde_wasm_bindgen::Error> {
    serde_wasm_bindgen::from_value::<FlowRecord>(v).map(NewFlow::from)
}

fn keys_to_js(keys: impl Iterator<Item = u32>) -> JsValue {
    let ids: Vec<u32> = keys.collect();
    arr_u32(&ids).into()
}

#[wasm_bindgen]
impl FlowModel {
    /// `project` maps `(lat, lng)` to planar `{x, y}` or `[x, y]`.
    #[wasm_bindgen(constructor)]
    pub fn new(project: Function) -> FlowModel {
        crate::FlowModel::rs_new(project)
    }

    // Nodes
    pub fn add_node(&mut self, node: JsValue) -> Option<u32> {
        read_node(node).ok().map(|n| self.inner.add_node(n).0)
    }
    pub fn add_node_res(&mut self, node: JsValue) -> JsValue {
        match read_node(node) {
            Ok(n) => error::ok(JsValue::from_f64(self.inner.add_node(n).0 as f64)),
            Err(e) => error::bad_input("node", e),
        }
    }
    pub fn add_nodes(&mut self, nodes: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Vec<NodeRecord>>(nodes) {
            Ok(batch) => {
                let keys = self.inner.add_nodes(batch.into_iter().map(Node::from));
                keys_to_js(keys.into_iter().map(|k| k.0))
            }
            Err(_) => JsValue::NULL,
        }
    }
    pub fn init_nodes(&mut self, nodes: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Vec<NodeRecord>>(nodes) {
            Ok(batch) => error::ok(keys_to_js(
                self.inner
                    .init_nodes(batch.into_iter().map(Node::from))
                    .into_iter()
                    .map(|k| k.0),
            )),
            Err(e) => error::bad_input("nodes", e),
        }
    }
    pub fn get_node(&self, key: u32) -> JsValue {
        match self.inner.node(NodeKey(key)) {
            Some(n) => to_js(&NodeRecord::from(n)),
            None => JsValue::NULL,
        }
    }
    pub fn find_node_by_id(&self, id: &str) -> Option<u32> {
        self.inner.find_node_by_id(id).map(|k| k.0)
    }
    pub fn delete_node(&mut self, key: u32) -> bool {
        self.inner.delete_node(NodeKey(key))
    }
    pub fn delete_node_res(&mut self, key: u32) -> JsValue {
        match self.inner.delete_node_checked(NodeKey(key)) {
            Ok(()) => error::ok(JsValue::from_bool(true)),
            Err(e) => error::model(&e),
        }
    }
    pub fn node_count(&self) -> u32 {
        self.inner.node_count() as u32
    }
    pub fn set_node_value(&mut self, key: u32, value: f64) -> bool {
        self.inner.set_node_value(NodeKey(key), value)
    }
    pub fn set_node_value_res(&mut self, key: u32, value: f64) -> JsValue {
        if !value.is_finite() {
            return error::non_finite("value");
        }
        if self.inner.node(NodeKey(key)).is_none() {
            return error::invalid_id("node", key);
        }
        error::ok(JsValue::from_bool(self.inner.set_node_value(NodeKey(key), value)))
    }
    pub fn set_node_location(&mut self, key: u32, lat: f64, lng: f64) -> bool {
        self.inner.set_node_location(NodeKey(key), lat, lng)
    }
    pub fn set_node_location_res(&mut self, key: u32, lat: f64, lng: f64) -> JsValue {
        if !lat.is_finite() {
            return error::non_finite("lat");
        }
        if !lng.is_finite() {
            return error::non_finite("lng");
        }
        if self.inner.node(NodeKey(key)).is_none() {
            return error::invalid_id("node", key);
        }
        error::ok(JsValue::from_bool(self.inner.set_node_location(NodeKey(key), lat, lng)))
    }
    pub fn select_node(&mut self, key: u32, selected: bool) -> bool {
        self.inner.select_node(NodeKey(key), selected)
    }
    pub fn selected_nodes(&self) -> JsValue {
        keys_to_js(self.inner.selected_nodes().into_iter().map(|k| k.0))
    }

    // Flows
    pub fn add_flow(&mut self, flow: JsValue) -> Option<u32> {
        read_flow(flow).ok().map(|f| self.inner.add_flow(f).0)
    }
    pub fn add_flow_res(&mut self, flow: JsValue) -> JsValue {
        match read_flow(flow) {
            Ok(f) => error::ok(JsValue::from_f64(self.inner.add_flow(f).0 as f64)),
            Err(e) => error::bad_input("flow", e),
        }
    }
    pub fn add_flows(&mut self, flows: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Vec<FlowRecord>>(flows) {
            Ok(batch) => {
                let keys = self.inner.add_flows(batch.into_iter().map(NewFlow::from));
                keys_to_js(keys.into_iter().map(|k| k.0))
            }
            Err(_) => JsValue::NULL,
        }
    }
    pub fn add_flows_res(&mut self, flows: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Vec<FlowRecord>>(flows) {
            Ok(batch) => {
                let keys = self.inner.add_flows(batch.into_iter().map(NewFlow::from));
                error::ok(keys_to_js(keys.into_iter().map(|k| k.0)))
            }
            Err(e) => error::bad_input("flows", e),
        }
    }
    pub fn get_flow(&self, key: u32) -> JsValue {
        let f = match self.inner.flow(FlowKey(key)) {
            Some(f) => f,
            None => return JsValue::NULL,
        };
        to_js(&FlowView {
            id: f.id,
            start: f.start.0,
            end: f.end.0,
            value: f.value,
            locked: f.locked,
            selected: f.selected,
            opposite: f.opposite.map(|o| o.0),
            c_pt: self.inner.ctrl_pt(FlowKey(key)),
            a_to_b: f.a_to_b,
            b_to_a: f.b_to_a,
        })
    }
    pub fn flow_count(&self) -> u32 {
        self.inner.flow_count() as u32
    }
    pub fn flow_keys(&self) -> JsValue {
        keys_to_js(self.inner.flow_keys().iter().map(|k| k.0))
    }
    pub fn delete_all_flows(&mut self) {
        self.inner.delete_all_flows()
    }
    pub fn set_flow_value(&mut self, key: u32, value: f64) -> bool {
        self.inner.set_flow_value(FlowKey(key), value)
    }
    pub fn set_flow_value_res(&mut self, key: u32, value: f64) -> JsValue {
        if !value.is_finite() {
            return error::non_finite("value");
        }
        if self.inner.flow(FlowKey(key)).is_none() {
            return error::invalid_id("flow", key);
        }
        error::ok(JsValue::from_bool(self.inner.set_flow_value(FlowKey(key), value)))
    }
    pub fn set_ctrl_pt(&mut self, key: u32, x: f64, y: f64) -> bool {
        self.inner.set_ctrl_pt(FlowKey(key), Point::new(x, y))
    }
    pub fn set_ctrl_pt_res(&mut self, key: u32, x: f64, y: f64) -> JsValue {
        if !x.is_finite() {
            return error::non_finite("x");
        }
        if !y.is_finite() {
            return error::non_finite("y");
        }
        if self.inner.flow(FlowKey(key)).is_none() {
            return error::invalid_id("flow", key);
        }
        error::ok(JsValue::from_bool(self.inner.set_ctrl_pt(FlowKey(key), Point::new(x, y))))
    }
    pub fn ctrl_pts(&self) -> JsValue {
        let flat: Vec<f32> = self
            .inner
            .ctrl_pts()
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32])
            .collect();
        arr_f32(&flat).into()
    }
    pub fn select_flow(&mut self, key: u32, selected: bool) -> bool {
        self.inner.select_flow(FlowKey(key), selected)
    }
    pub fn selected_flows(&self) -> JsValue {
        keys_to_js(self.inner.selected_flows().into_iter().map(|k| k.0))
    }
    pub fn deselect_all_features(&mut self) {
        self.inner.deselect_all_features()
    }
    pub fn sort_flows(&mut self, ascending: bool) {
        self.inner.sort_flows(ascending)
    }
    pub fn largest_flows(&self, n: Option<u32>) -> JsValue {
        keys_to_js(
            self.inner
                .largest_flows(n.map(|n| n as usize))
                .iter()
                .map(|k| k.0),
        )
    }

    // Locks
    pub fn get_locks(&self) -> JsValue {
        to_js(&self.inner.locks())
    }
    pub fn apply_locks(&mut self, locks: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<Vec<bool>>(locks) {
            Ok(l) => self.inner.apply_locks(&l).is_ok(),
            Err(_) => false,
        }
    }
    pub fn apply_locks_res(&mut self, locks: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Vec<bool>>(locks) {
            Ok(l) => match self.inner.apply_locks(&l) {
                Ok(()) => error::ok(JsValue::from_bool(true)),
                Err(e) => error::model(&e),
            },
            Err(e) => error::bad_input("locks", e),
        }
    }

    // Settings + aggregates
    pub fn get_settings(&self) -> JsValue {
        to_js(self.inner.settings())
    }
    pub fn update_settings(&mut self, settings: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<Settings>(settings) {
            Ok(s) => {
                self.inner.update_settings(s);
                true
            }
            Err(_) => false,
        }
    }
    pub fn update_settings_res(&mut self, settings: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<Settings>(settings) {
            Ok(s) => {
                self.inner.update_settings(s);
                error::ok(JsValue::from_bool(true))
            }
            Err(e) => error::bad_input("settings", e),
        }
    }
    pub fn set_scale_multiplier_by_state(&mut self, fips: &str) {
        self.inner.set_scale_multiplier_by_state(fips)
    }
    pub fn recompute_aggregates(&mut self) {
        self.inner.recompute_aggregates()
    }
    pub fn above_average_flow_count(&mut self) -> u32 {
        self.inner.above_average_flow_count() as u32
    }
    pub fn percentage_of_total_flow_shown(&self) -> f64 {
        self.inner.percentage_of_total_flow_shown()
    }

    // Metrics
    pub fn node_radius(&mut self, key: u32) -> Option<f64> {
        let m = self.inner.metrics();
        m.node(NodeKey(key)).map(|n| m.node_radius(n))
    }
    pub fn start_clip_radius(&mut self, key: u32) -> Option<f64> {
        let m = self.inner.metrics();
        m.node(NodeKey(key)).map(|n| m.start_clip_radius(n))
    }
    pub fn end_clip_radius(&mut self, key: u32) -> Option<f64> {
        let m = self.inner.metrics();
        m.node(NodeKey(key)).map(|n| m.end_clip_radius(n))
    }
    pub fn flow_stroke_width(&mut self, key: u32) -> Option<f64> {
        let m = self.inner.metrics();
        m.flow(FlowKey(key)).map(|f| m.flow_stroke_width(f))
    }
    pub fn relative_flow_value(&mut self, key: u32) -> Option<f64> {
        let m = self.inner.metrics();
        m.flow(FlowKey(key)).map(|f| m.relative_flow_value(f))
    }
    pub fn flow_color(&mut self, key: u32) -> JsValue {
        let m = self.inner.metrics();
        match m.flow(FlowKey(key)) {
            Some(f) => to_js(&m.flow_color(f)),
            None => JsValue::NULL,
        }
    }
    pub fn arrow_profile(&mut self, key: u32) -> JsValue {
        let m = self.inner.metrics();
        match m.flow(FlowKey(key)).and_then(|f| m.arrow_profile(f)) {
            Some(p) => to_js(&p),
            None => JsValue::NULL,
        }
    }
    pub fn flow_point_gap(&mut self) -> f64 {
        self.inner.metrics().flow_point_gap()
    }

    // Typed arrays for the renderer
    pub fn get_node_data(&mut self) -> JsValue {
        let m = self.inner.metrics();
        let mut ids = Vec::new();
        let mut pos = Vec::new();
        let mut radii = Vec::new();
        for (k, n) in m.nodes() {
            let p = n.planar();
            ids.push(k.0);
            pos.push(p.x as f32);
            pos.push(p.y as f32);
            radii.push(m.node_radius(n) as f32);
        }
        let obj = new_obj();
        set_kv(&obj, "ids", &arr_u32(&ids).into());
        set_kv(&obj, "positions", &arr_f32(&pos).into());
        set_kv(&obj, "radii", &arr_f32(&radii).into());
        obj.into()
    }
    pub fn get_flow_data(&mut self) -> JsValue {
        let m = self.inner.metrics();
        let mut ids = Vec::new();
        let mut ep = Vec::new();
        let mut widths = Vec::new();
        let mut rgba = Vec::new();
        for (k, f) in m.flows() {
            ids.push(k.0);
            ep.push(f.start.0);
            ep.push(f.end.0);
            widths.push(m.flow_stroke_width(f) as f32);
            let c = m.flow_color(f);
            rgba.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
        let obj = new_obj();
        set_kv(&obj, "ids", &arr_u32(&ids).into());
        set_kv(&obj, "endpoints", &arr_u32(&ep).into());
        set_kv(&obj, "stroke_widths", &arr_f32(&widths).into());
        set_kv(&obj, "stroke_rgba", &arr_u8(&rgba).into());
        obj.into()
    }

    // Tables + JSON
    pub fn node_table(&self) -> JsValue {
        to_js(&self.inner.node_table())
    }
    pub fn flow_table(&self) -> JsValue {
        to_js(&self.inner.flow_table())
    }
    pub fn to_json(&self) -> JsValue {
        to_js(&self.inner.to_json_value())
    }
    pub fn from_json(&mut self, v: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<serde_json::Value>(v) {
            Ok(val) => self.inner.from_json_value(val),
            Err(_) => false,
        }
    }
    pub fn from_json_res(&mut self, v: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<serde_json::Value>(v) {
            Ok(val) => match self.inner.from_json_value_strict(val) {
                Ok(()) => error::ok(JsValue::from_bool(true)),
                Err(e) => error::model(&e),
            },
            Err(e) => error::err("json_parse", format!("{}", e), None),
        }
    }
}
