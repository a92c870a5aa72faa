use flox::{Point, Projector};
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::JsValue;

/// Projects through a host JS function `(lat, lng) => {x, y}` or `[x, y]`.
pub struct JsProjector { f: Function }

impl JsProjector {
    pub fn new(f: Function) -> Self { JsProjector { f } }
}

fn num(v: &JsValue) -> f64 { v.as_f64().unwrap_or(f64::NAN) }

impl Projector for JsProjector {
    fn project(&self, lat: f64, lng: f64) -> Point {
        let out = match self.f.call2(&JsValue::NULL, &JsValue::from_f64(lat), &JsValue::from_f64(lng)) {
            Ok(v) => v,
            Err(e) => {
                web_sys::console::warn_2(&JsValue::from_str("projection failed"), &e);
                return Point::new(f64::NAN, f64::NAN);
            }
        };
        if Array::is_array(&out) {
            let a = Array::from(&out);
            return Point::new(num(&a.get(0)), num(&a.get(1)));
        }
        let x = Reflect::get(&out, &JsValue::from_str("x")).map(|v| num(&v)).unwrap_or(f64::NAN);
        let y = Reflect::get(&out, &JsValue::from_str("y")).map(|v| num(&v)).unwrap_or(f64::NAN);
        Point::new(x, y)
    }
}
