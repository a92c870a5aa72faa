use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Slot handle of a registered node. Stable until the node is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(pub u32);

/// Slot handle of a registered flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowKey(pub u32);

impl NodeKey {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FlowKey {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
    pub fn midpoint(&self, other: &Point) -> Point {
        Point {
            x: 0.5 * (self.x + other.x),
            y: 0.5 * (self.y + other.y),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A geographic point of the flow map.
///
/// `incoming` and `outgoing` are owned by the model and only change through
/// flow insertion and node deletion.
#[derive(Clone, Debug, Default)]
pub struct Node {
    pub id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub xy: Option<Point>,
    /// Zero or NaN means unset; aggregate recomputation replaces it with 1.
    pub value: f64,
    pub selected: bool,
    /// Explicit radius (`r`); overrides value-based sizing.
    pub radius: Option<f64>,
    /// Sized and positioned by a companion layout (necklace map).
    pub external: bool,
    pub stroke_width: f64,
    /// Any other fields carried by imported records.
    pub attributes: Map<String, Value>,
    pub incoming: Vec<FlowKey>,
    pub outgoing: Vec<FlowKey>,
}

impl Node {
    pub fn new(lat: f64, lng: f64) -> Self {
        Node {
            lat,
            lng,
            ..Default::default()
        }
    }
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }
    pub fn with_xy(mut self, x: f64, y: f64) -> Self {
        self.xy = Some(Point { x, y });
        self
    }

    /// Coordinate half of the identity rule: bitwise equality of lat and lng.
    pub fn same_location(&self, other: &Node) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lng.to_bits() == other.lng.to_bits()
    }

    pub fn has_planar(&self) -> bool {
        self.xy.map_or(false, |p| p.is_finite())
    }

    pub fn planar(&self) -> Point {
        self.xy.unwrap_or_default()
    }

    pub fn value_is_unset(&self) -> bool {
        self.value == 0.0 || self.value.is_nan()
    }
}

/// A directed, valued edge between two registered nodes.
#[derive(Clone, Debug)]
pub struct Flow {
    pub id: u32,
    pub start: NodeKey,
    pub end: NodeKey,
    pub value: f64,
    pub locked: bool,
    pub selected: bool,
    pub ctrl_pt: Option<Point>,
    pub opposite: Option<FlowKey>,
    pub a_to_b: bool,
    pub b_to_a: bool,
}

impl Flow {
    pub fn touches(&self, node: NodeKey) -> bool {
        self.start == node || self.end == node
    }
}

/// Insertion request for a flow; endpoints are candidates resolved against
/// the node collection.
#[derive(Clone, Debug, Default)]
pub struct NewFlow {
    pub start: Node,
    pub end: Node,
    pub value: f64,
    pub ctrl_pt: Option<Point>,
    pub locked: bool,
    pub a_to_b: bool,
    pub b_to_a: bool,
}

impl NewFlow {
    pub fn new(start: Node, end: Node, value: f64) -> Self {
        NewFlow {
            start,
            end,
            value,
            ..Default::default()
        }
    }
}

// Ids arrive as strings or numbers from CSV/JSON imports; both normalise to text.
fn de_ident<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ident {
        Int(i64),
        Float(f64),
        Text(String),
    }
    Ok(Option::<Ident>::deserialize(d)?.map(|id| match id {
        Ident::Int(n) => n.to_string(),
        Ident::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        Ident::Float(f) => f.to_string(),
        Ident::Text(s) => s,
    }))
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Serialized node: every node field except the adjacency lists.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    #[serde(
        default,
        deserialize_with = "de_ident",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, rename = "r", skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, rename = "necklaceMapNode", skip_serializing_if = "is_false")]
    pub external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl From<&Node> for NodeRecord {
    fn from(n: &Node) -> Self {
        NodeRecord {
            id: n.id.clone(),
            lat: n.lat,
            lng: n.lng,
            x: n.xy.map(|p| p.x),
            y: n.xy.map(|p| p.y),
            value: Some(n.value),
            selected: n.selected,
            radius: n.radius,
            external: n.external,
            stroke_width: if n.external { Some(n.stroke_width) } else { None },
            attributes: n.attributes.clone(),
        }
    }
}

impl From<NodeRecord> for Node {
    fn from(r: NodeRecord) -> Self {
        let xy = match (r.x, r.y) {
            (Some(x), Some(y)) => Some(Point { x, y }),
            _ => None,
        };
        Node {
            id: r.id,
            lat: r.lat,
            lng: r.lng,
            xy,
            value: r.value.unwrap_or(0.0),
            selected: r.selected,
            radius: r.radius,
            external: r.external,
            stroke_width: r.stroke_width.unwrap_or(0.0),
            attributes: r.attributes,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }
}

/// Flow endpoint as written into snapshots.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EndpointRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub lat: f64,
    pub lng: f64,
    #[serde(
        default,
        deserialize_with = "de_ident",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
}

impl From<&Node> for EndpointRecord {
    fn from(n: &Node) -> Self {
        EndpointRecord {
            x: n.xy.map(|p| p.x),
            y: n.xy.map(|p| p.y),
            lat: n.lat,
            lng: n.lng,
            id: n.id.clone(),
        }
    }
}

impl From<EndpointRecord> for Node {
    fn from(r: EndpointRecord) -> Self {
        let xy = match (r.x, r.y) {
            (Some(x), Some(y)) => Some(Point { x, y }),
            _ => None,
        };
        Node {
            id: r.id,
            lat: r.lat,
            lng: r.lng,
            xy,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowRecord {
    #[serde(rename = "startPt")]
    pub start_pt: EndpointRecord,
    #[serde(rename = "endPt")]
    pub end_pt: EndpointRecord,
    #[serde(rename = "cPt", default, skip_serializing_if = "Option::is_none")]
    pub c_pt: Option<Point>,
    pub value: f64,
    #[serde(rename = "AtoB", default)]
    pub a_to_b: bool,
    #[serde(rename = "BtoA", default)]
    pub b_to_a: bool,
}

impl From<FlowRecord> for NewFlow {
    fn from(r: FlowRecord) -> Self {
        NewFlow {
            start: r.start_pt.into(),
            end: r.end_pt.into(),
            value: r.value,
            ctrl_pt: r.c_pt,
            locked: false,
            a_to_b: r.a_to_b,
            b_to_a: r.b_to_a,
        }
    }
}
