//! Tabular views of nodes and flows for an editable-table front end.

use crate::FlowModel;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub label: &'static str,
    pub datatype: &'static str,
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_point: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thousands_separator: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub id: String,
    pub values: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    pub metadata: Vec<Column>,
    pub data: Vec<Row>,
}

fn column(name: &'static str, label: &'static str, datatype: &'static str, editable: bool) -> Column {
    let numeric = datatype == "double";
    Column {
        name,
        label,
        datatype,
        editable,
        decimal_point: numeric.then_some("."),
        thousands_separator: numeric.then_some(","),
    }
}

pub(crate) fn node_table_impl(m: &FlowModel) -> Table {
    let metadata = vec![
        column("id", "ID", "string", false),
        column("lat", "LAT", "double", true),
        column("lng", "LNG", "double", true),
        column("value", "VALUE", "double", true),
        column("action", " ", "html", false),
    ];
    let data = m
        .nodes()
        .map(|(key, n)| {
            let id = n.id.clone().unwrap_or_else(|| key.0.to_string());
            Row {
                values: json!({ "id": id, "lat": n.lat, "lng": n.lng, "value": n.value }),
                id,
            }
        })
        .collect();
    Table { metadata, data }
}

pub(crate) fn flow_table_impl(m: &FlowModel) -> Table {
    let metadata = vec![
        column("id", "ID", "string", false),
        column("start", "START", "string", false),
        column("end", "END", "string", false),
        column("value", "VALUE", "double", true),
        column("action", " ", "html", false),
    ];
    let endpoint_id = |k: crate::NodeKey| {
        m.node(k)
            .and_then(|n| n.id.clone())
            .unwrap_or_else(|| k.0.to_string())
    };
    let data = m
        .flows()
        .map(|(_, f)| {
            let id = f.id.to_string();
            Row {
                values: json!({
                    "id": id,
                    "start": endpoint_id(f.start),
                    "end": endpoint_id(f.end),
                    "value": f.value,
                }),
                id,
            }
        })
        .collect();
    Table { metadata, data }
}
