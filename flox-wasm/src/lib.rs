use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;
mod projection;

#[wasm_bindgen]
pub struct FlowModel { pub(crate) inner: flox::FlowModel }

impl FlowModel {
    pub fn rs_new(project: js_sys::Function) -> FlowModel {
        FlowModel { inner: flox::FlowModel::new(projection::JsProjector::new(project)) }
    }
    pub fn rs_inner(&self) -> &flox::FlowModel { &self.inner }
}
