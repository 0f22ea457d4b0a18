use layers::{CardOptions, CardSize, DensityTier, PlacementParams};
use records::ColumnMapping;
use runtime::ZoomBounds;
use serde::{Deserialize, Serialize};

/// Read-only widget settings, as authored in the host's property panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    pub dim_latitude_index: usize,
    pub dim_longitude_index: usize,
    pub dim_name_index: usize,
    pub card_size: CardSize,
    pub card_scaling_factor: f64,
    pub card_density: DensityTier,
    pub card_max_visible: usize,
    pub min_zoom_scale: f64,
    pub max_zoom_scale: f64,
    pub initial_zoom: f64,
    /// Degrees per second; 0 disables auto-rotation.
    pub rotation_speed: f64,
    pub enable_pagination: bool,
    pub page_size: usize,
    pub card_show_avatar: bool,
    pub card_show_details: bool,
    pub card_show_metrics: bool,
    pub card_metric_label: String,
    pub use_custom_template: bool,
    pub remember_card_positions: bool,
    pub cards_draggable: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            dim_latitude_index: 0,
            dim_longitude_index: 1,
            dim_name_index: 2,
            card_size: CardSize::Medium,
            card_scaling_factor: 1.0,
            card_density: DensityTier::Medium,
            card_max_visible: 50,
            min_zoom_scale: 0.5,
            max_zoom_scale: 2.5,
            initial_zoom: 1.25,
            rotation_speed: 20.0,
            enable_pagination: true,
            page_size: catalog::DEFAULT_PAGE_SIZE,
            card_show_avatar: true,
            card_show_details: true,
            card_show_metrics: true,
            card_metric_label: "Value".to_string(),
            use_custom_template: false,
            remember_card_positions: true,
            cards_draggable: true,
        }
    }
}

impl WidgetConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn column_mapping(&self) -> ColumnMapping {
        ColumnMapping {
            latitude: self.dim_latitude_index,
            longitude: self.dim_longitude_index,
            name: self.dim_name_index,
        }
    }

    pub fn card_width(&self) -> f64 {
        let factor = if self.card_scaling_factor > 0.0 {
            self.card_scaling_factor
        } else {
            1.0
        };
        self.card_size.width_px() * factor
    }

    /// Visible-card ceiling after the card-size multiplier.
    pub fn max_visible(&self) -> usize {
        (self.card_max_visible as f64 * self.card_size.max_visible_multiplier()).ceil() as usize
    }

    pub fn zoom_bounds(&self) -> ZoomBounds {
        ZoomBounds {
            min: self.min_zoom_scale,
            max: self.max_zoom_scale,
            initial: self.initial_zoom,
        }
    }

    pub fn card_options(&self) -> CardOptions {
        CardOptions {
            size: self.card_size,
            show_avatar: self.card_show_avatar,
            show_details: self.card_show_details,
            show_metrics: self.card_show_metrics,
            metric_label: if self.card_metric_label.is_empty() {
                "Value".to_string()
            } else {
                self.card_metric_label.clone()
            },
        }
    }

    pub fn placement_params(&self, zoom_scale: f64) -> PlacementParams {
        PlacementParams {
            zoom_scale,
            card_width: self.card_width(),
            density: self.card_density,
            max_visible: self.max_visible(),
        }
    }

    /// Page size with the fallback for a zero setting.
    pub fn effective_page_size(&self) -> usize {
        if self.page_size == 0 {
            catalog::DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }
}
