use crate::model::Color;
use serde::{Deserialize, Serialize};

/// Layout, appearance and cached aggregate values shared by every metric.
///
/// Keys match the persisted snapshot format. Missing keys take their
/// defaults, so partial documents load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    // Layout
    pub max_flow_points: u32,
    pub distance_weight_exponent: f64,
    pub peripheral_stiffness_factor: f64,
    pub max_flow_length_spring_constant: f64,
    pub min_flow_length_spring_constant: f64,
    pub enforce_rangebox: bool,
    pub flow_rangebox_height: f64,
    pub anti_torsion_weight: f64,
    pub angular_distribution_weight: f64,
    pub node_weight: f64,
    pub min_obstacle_dist_px: f64,
    pub move_flows_intersecting_obstacles: bool,
    pub move_flows_off_arrowheads: bool,
    pub move_flows_off_nodes: bool,
    pub multiple_iterations: bool,
    #[serde(rename = "NBR_ITERATIONS")]
    pub nbr_iterations: u32,
    pub max_flows: usize,
    pub live_drawing: bool,
    pub layout_flows: bool,

    // Appearance
    pub scale_multiplier: f64,
    pub max_flow_width: f64,
    pub min_flow_width: f64,
    pub max_node_radius: f64,
    pub is_show_locked_flows: bool,
    pub flow_distance_from_start_point_pixel: f64,
    pub flow_distance_from_end_point_pixel: f64,
    #[serde(rename = "NODE_STROKE_WIDTH")]
    pub node_stroke_width: f64,
    pub use_global_flow_width: bool,
    pub min_flow_color: Color,
    pub max_flow_color: Color,

    // Arrows
    pub arrow_size_ratio: f64,
    pub arrow_length_ratio: f64,
    pub arrow_length_scale_factor: f64,
    pub arrow_width_scale_factor: f64,
    pub arrow_edge_ctrl_length: f64,
    pub arrow_edge_ctrl_width: f64,
    pub arrow_corner_position: f64,
    pub point_arrow_towards_endpoint: bool,

    // Cached by the model, never authoritative
    pub min_flow_value: f64,
    pub max_flow_value: f64,
    pub mean_flow_value: f64,
    pub min_flow_length: f64,
    pub max_flow_length: f64,
    pub min_node_value: f64,
    pub max_node_value: f64,
    pub mean_node_value: f64,
    pub all_flows_total_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub above_average_flow_count: Option<usize>,

    // Drawing
    pub draw_flows: bool,
    pub draw_nodes: bool,
    pub draw_arrows: bool,
    pub draw_control_points: bool,
    pub draw_intermediate_flow_points: bool,
    pub draw_rangeboxes: bool,
    pub dataset_name: Option<String>,
    pub use_spiral_method: bool,
    #[serde(rename = "SPIRAL_SPACING_PX")]
    pub spiral_spacing_px: f64,
    pub use_webworkers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_flow_points: 25,
            distance_weight_exponent: 4.0,
            peripheral_stiffness_factor: 0.5,
            max_flow_length_spring_constant: 0.05,
            min_flow_length_spring_constant: 0.5,
            enforce_rangebox: true,
            flow_rangebox_height: 0.3,
            anti_torsion_weight: 0.8,
            angular_distribution_weight: 0.2,
            node_weight: 0.0,
            min_obstacle_dist_px: 2.0,
            move_flows_intersecting_obstacles: true,
            move_flows_off_arrowheads: true,
            move_flows_off_nodes: true,
            multiple_iterations: true,
            nbr_iterations: 100,
            max_flows: 50,
            live_drawing: true,
            layout_flows: true,

            scale_multiplier: 0.5,
            max_flow_width: 30.0,
            min_flow_width: 3.0,
            max_node_radius: 10.0,
            is_show_locked_flows: true,
            flow_distance_from_start_point_pixel: 5.0,
            flow_distance_from_end_point_pixel: 5.0,
            node_stroke_width: 0.5,
            use_global_flow_width: true,
            min_flow_color: Color { r: 189, g: 201, b: 225, a: 255 },
            max_flow_color: Color { r: 4, g: 90, b: 141, a: 255 },

            arrow_size_ratio: 0.3,
            arrow_length_ratio: 0.0,
            arrow_length_scale_factor: 1.8,
            arrow_width_scale_factor: 1.0,
            arrow_edge_ctrl_length: 0.5,
            arrow_edge_ctrl_width: 0.5,
            arrow_corner_position: 0.0,
            point_arrow_towards_endpoint: true,

            min_flow_value: 0.0,
            max_flow_value: 0.0,
            mean_flow_value: 0.0,
            min_flow_length: 0.0,
            max_flow_length: 0.0,
            min_node_value: 0.0,
            max_node_value: 0.0,
            mean_node_value: 0.0,
            all_flows_total_value: 0.0,
            above_average_flow_count: None,

            draw_flows: true,
            draw_nodes: false,
            draw_arrows: true,
            draw_control_points: false,
            draw_intermediate_flow_points: false,
            draw_rangeboxes: false,
            dataset_name: None,
            use_spiral_method: true,
            spiral_spacing_px: 15.0,
            use_webworkers: true,
        }
    }
}

impl Settings {
    pub fn from_json_str(s: &str) -> Result<Settings, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Effective maximum flow value for width scaling: the dataset-wide
    /// maximum in global mode, else the value of the first flow in
    /// collection order (callers sort descending first).
    pub fn effective_max_flow_value(&self, first_flow_value: Option<f64>) -> f64 {
        if self.use_global_flow_width {
            self.max_flow_value
        } else {
            first_flow_value.unwrap_or(0.0)
        }
    }
}

// Preset scale multipliers for US state datasets, keyed by FIPS code.
const STATE_SCALES: &[(&str, f64)] = &[
    ("01", 1.0),
    ("04", 1.5),
    ("06", 1.5),
    ("09", 0.5),
    ("11", 0.2),
    ("13", 0.5),
    ("17", 0.7),
    ("21", 0.5),
    ("31", 0.6),
    ("34", 0.5),
    ("36", 0.35),
    ("44", 0.25),
    ("48", 1.25),
    ("54", 1.0),
    ("55", 0.8),
    ("72", 0.3),
];

/// Scale multiplier preset for a state FIPS code; 1 for unknown states.
pub fn scale_for_state(fips: &str) -> f64 {
    STATE_SCALES
        .iter()
        .find(|(code, _)| *code == fips)
        .map(|(_, s)| *s)
        .unwrap_or(1.0)
}
