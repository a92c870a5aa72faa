//! Value-to-visual-parameter mapping.
//!
//! A [`Metrics`] view can only be obtained while the cached aggregates are
//! current, and it borrows the model immutably, so no mutation can happen
//! while a layout or rendering pass reads through it.

use crate::geometry::color::blend;
use crate::geometry::tolerance::safe_div;
use crate::model::{Color, Flow, FlowKey, Node, NodeKey, Point};
use crate::settings::Settings;
use crate::FlowModel;
use serde::Serialize;
use std::f64::consts::PI;

/// Parameters handed to the arrowhead renderer for one flow.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowProfile {
    pub end_clip_radius: f64,
    pub start_clip_radius: f64,
    pub min_flow_width: f64,
    pub max_flow_value: f64,
    pub max_flow_width: f64,
    pub scale_multiplier: f64,
    pub arrow_size_ratio: f64,
    pub arrow_length_ratio: f64,
    pub arrow_length_scale_factor: f64,
    pub arrow_width_scale_factor: f64,
    pub arrow_corner_position: f64,
    pub arrow_edge_ctrl_width: f64,
    pub arrow_edge_ctrl_length: f64,
}

#[derive(Clone, Copy)]
pub struct Metrics<'a> {
    model: &'a FlowModel,
}

impl<'a> Metrics<'a> {
    pub(crate) fn new(model: &'a FlowModel) -> Self {
        Metrics { model }
    }

    pub fn settings(&self) -> &'a Settings {
        &self.model.settings
    }
    pub fn node(&self, key: NodeKey) -> Option<&'a Node> {
        self.model.node(key)
    }
    pub fn flow(&self, key: FlowKey) -> Option<&'a Flow> {
        self.model.flow(key)
    }
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &'a Node)> + 'a {
        self.model.nodes()
    }
    pub fn flows(&self) -> impl Iterator<Item = (FlowKey, &'a Flow)> + 'a {
        self.model.flows()
    }
    pub fn ctrl_pt(&self, key: FlowKey) -> Option<Point> {
        self.model.ctrl_pt(key)
    }
    pub fn baseline_length(&self, key: FlowKey) -> Option<f64> {
        self.model.baseline_length(key)
    }

    // Value of the first flow in collection order; the local-width reference.
    fn first_flow_value(&self) -> Option<f64> {
        self.model.flows().next().map(|(_, f)| f.value)
    }

    /// Maximum flow value that stroke widths are scaled against.
    pub fn effective_max_flow_value(&self) -> f64 {
        self.settings()
            .effective_max_flow_value(self.first_flow_value())
    }

    /// On-screen radius of a node glyph. Area is proportional to value, with
    /// the largest node mapped to `maxNodeRadius`.
    pub fn node_radius(&self, node: &Node) -> f64 {
        let s = self.settings();
        if node.external {
            return node.radius.unwrap_or(0.0) + node.stroke_width;
        }
        if let Some(r) = node.radius {
            return r * s.scale_multiplier;
        }
        let max_area = PI * s.max_node_radius * s.max_node_radius;
        let ratio = if s.max_node_value == 0.0 {
            // no nodes yet
            max_area
        } else {
            max_area / s.max_node_value
        };
        let area = (node.value * ratio).abs();
        (area / PI).sqrt() * s.scale_multiplier
    }

    pub fn start_clip_radius(&self, node: &Node) -> f64 {
        let s = self.settings();
        s.flow_distance_from_start_point_pixel + self.node_radius(node) + s.node_stroke_width / 2.0
    }

    pub fn end_clip_radius(&self, node: &Node) -> f64 {
        let s = self.settings();
        s.flow_distance_from_end_point_pixel + self.node_radius(node) + s.node_stroke_width / 2.0
    }

    /// Stroke width proportional to value, never thinner than `minFlowWidth`.
    pub fn flow_stroke_width(&self, flow: &Flow) -> f64 {
        let s = self.settings();
        let max_value = self.effective_max_flow_value();
        let width = safe_div(s.max_flow_width * flow.value, max_value, 0.0);
        if width < s.min_flow_width || width.is_nan() {
            return s.min_flow_width * s.scale_multiplier;
        }
        width * s.scale_multiplier
    }

    /// Position of the stroke width within the scaled width range.
    pub fn relative_flow_value(&self, flow: &Flow) -> f64 {
        let s = self.settings();
        let w = self.flow_stroke_width(flow);
        let min = s.min_flow_width * s.scale_multiplier;
        let max = s.max_flow_width * s.scale_multiplier;
        safe_div(w - min, max - min, 0.0)
    }

    pub fn flow_color(&self, flow: &Flow) -> Color {
        let s = self.settings();
        blend(s.min_flow_color, s.max_flow_color, self.relative_flow_value(flow))
    }

    fn clip_radius(&self, node: &Node, start: bool) -> f64 {
        if node.external {
            node.radius.unwrap_or(0.0) + node.stroke_width
        } else if start {
            self.start_clip_radius(node)
        } else {
            self.end_clip_radius(node)
        }
    }

    pub fn arrow_profile(&self, flow: &Flow) -> Option<ArrowProfile> {
        let s = self.settings();
        let start = self.node(flow.start)?;
        let end = self.node(flow.end)?;
        Some(ArrowProfile {
            end_clip_radius: self.clip_radius(end, false),
            start_clip_radius: self.clip_radius(start, true),
            min_flow_width: s.min_flow_width,
            max_flow_value: self.effective_max_flow_value(),
            max_flow_width: s.max_flow_width,
            scale_multiplier: s.scale_multiplier,
            arrow_size_ratio: s.arrow_size_ratio,
            arrow_length_ratio: s.arrow_length_ratio,
            arrow_length_scale_factor: s.arrow_length_scale_factor,
            arrow_width_scale_factor: s.arrow_width_scale_factor,
            arrow_corner_position: s.arrow_corner_position,
            arrow_edge_ctrl_width: s.arrow_edge_ctrl_width,
            arrow_edge_ctrl_length: s.arrow_edge_ctrl_length,
        })
    }

    pub fn arrow_profiles(&self) -> Vec<(FlowKey, ArrowProfile)> {
        self.flows()
            .filter_map(|(k, f)| self.arrow_profile(f).map(|p| (k, p)))
            .collect()
    }

    /// Spacing between sampled points along flow curves, chosen so the
    /// longest flow needs at most `maxFlowPoints + 1` samples.
    pub fn flow_point_gap(&self) -> f64 {
        let s = self.settings();
        let n = s.max_flow_points as f64 + 1.0;
        let gap = s.min_flow_length / n;
        if gap > 0.0 && s.max_flow_length / gap <= n {
            return gap;
        }
        s.max_flow_length / n
    }
}
