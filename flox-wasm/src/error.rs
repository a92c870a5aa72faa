//! `{ok, value}` / `{ok: false, error: {code, message, data}}` envelopes
//! returned by the `_res` entry points.

use crate::interop::{new_obj, set_kv};
use flox::ModelError;
use js_sys::Object;
use wasm_bindgen::JsValue;

fn data_obj(fields: &[(&str, JsValue)]) -> Object {
    let d = new_obj();
    for (k, v) in fields {
        set_kv(&d, k, v);
    }
    d
}

pub fn ok(value: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::TRUE);
    set_kv(&o, "value", &value);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let e = data_obj(&[
        ("code", JsValue::from_str(code)),
        ("message", JsValue::from_str(&message.into())),
    ]);
    if let Some(d) = data {
        set_kv(&e, "data", &d);
    }
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::FALSE);
    set_kv(&root, "error", &e.into());
    root.into()
}

/// Envelope for a core error; codes come from [`ModelError::code`].
pub fn model(e: &ModelError) -> JsValue {
    let data = match e {
        ModelError::LockCountMismatch { expected, got } => Some(data_obj(&[
            ("expected", JsValue::from_f64(*expected as f64)),
            ("got", JsValue::from_f64(*got as f64)),
        ])),
        ModelError::LimitExceeded { what, limit } => Some(data_obj(&[
            ("what", JsValue::from_str(what)),
            ("limit", JsValue::from_f64(*limit as f64)),
        ])),
        ModelError::InvalidCoordinate { what, value } => Some(data_obj(&[
            ("what", JsValue::from_str(what)),
            ("got", JsValue::from_f64(*value)),
        ])),
        ModelError::UnknownNode(k) => Some(data_obj(&[
            ("kind", JsValue::from_str("node")),
            ("id", JsValue::from_f64(k.0 as f64)),
        ])),
        ModelError::UnknownFlow(k) => Some(data_obj(&[
            ("kind", JsValue::from_str("flow")),
            ("id", JsValue::from_f64(k.0 as f64)),
        ])),
        _ => None,
    };
    err(e.code(), e.to_string(), data.map(Into::into))
}

pub fn non_finite(param: &str) -> JsValue {
    let d = data_obj(&[("param", JsValue::from_str(param))]);
    err("non_finite", format!("{} must be a finite number", param), Some(d.into()))
}

pub fn invalid_id(kind: &str, key: u32) -> JsValue {
    let d = data_obj(&[
        ("kind", JsValue::from_str(kind)),
        ("id", JsValue::from_f64(key as f64)),
    ]);
    err("invalid_id", format!("no {} with key {}", kind, key), Some(d.into()))
}

pub fn bad_input(what: &str, e: impl std::fmt::Display) -> JsValue {
    err("bad_input", format!("could not read {}: {}", what, e), None)
}
