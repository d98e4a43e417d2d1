use serde::{Deserialize, Serialize};

pub const STATE_LEVEL: f64 = 6.;
pub const DISTRICT_LEVEL: f64 = 7.;
pub const VILLAGE_LEVEL: f64 = 10.;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayerCategory {
    Base,
    #[serde(alias = "fra-related")]
    Fra,
    Satellite,
    Analysis,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Raster,
    Vector,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerVisibility {
    /// switched off by the user
    Hidden,
    /// switched on, but the zoom is outside the layer's range
    ZoomGated,
    Visible,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapLayer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub category: LayerCategory,
    pub visible: bool,
    pub opacity: u8,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
}

impl MapLayer {
    pub fn new(id: &str, name: &str, category: LayerCategory) -> Self {
        MapLayer {
            id: id.into(),
            name: name.into(),
            description: None,
            kind: LayerKind::Vector,
            category,
            visible: true,
            opacity: 100,
            color: "#3b82f6".into(),
            min_zoom: None,
            max_zoom: None,
        }
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn raster(mut self) -> Self {
        self.kind = LayerKind::Raster;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn styled(mut self, color: &str, opacity: u8) -> Self {
        self.color = color.into();
        self.opacity = opacity.min(100);
        self
    }

    pub fn zoom_range(mut self, min_zoom: Option<f64>, max_zoom: Option<f64>) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn in_zoom_range(&self, zoom: f64) -> bool {
        let above_min = self.min_zoom.map_or(true, |min| zoom >= min);
        let below_max = self.max_zoom.map_or(true, |max| zoom <= max);
        above_min && below_max
    }

    /// Below the layer's minimum zoom no data is produced at all.
    pub fn is_data_gated(&self, zoom: f64) -> bool {
        self.min_zoom.map_or(false, |min| zoom < min)
    }

    pub fn visibility(&self, zoom: f64) -> LayerVisibility {
        if !self.visible {
            LayerVisibility::Hidden
        } else if !self.in_zoom_range(zoom) {
            LayerVisibility::ZoomGated
        } else {
            LayerVisibility::Visible
        }
    }
}

/// The layer catalog of a map view.
///
/// Identity and zoom ranges are fixed once the set is built; only the
/// visibility flag and the opacity change at runtime.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LayerSet {
    layers: Vec<MapLayer>,
}

impl LayerSet {
    pub fn new(layers: Vec<MapLayer>) -> Self {
        LayerSet { layers }
    }

    pub fn get(&self, id: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapLayer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Flip the visibility flag, returning the new value.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let layer = self.layers.iter_mut().find(|layer| layer.id == id)?;
        layer.visible = !layer.visible;
        log::debug!("layer {} visible: {}", id, layer.visible);
        Some(layer.visible)
    }

    /// Set the opacity (clamped to 100), returning the stored value.
    pub fn set_opacity(&mut self, id: &str, opacity: u8) -> Option<u8> {
        let layer = self.layers.iter_mut().find(|layer| layer.id == id)?;
        layer.opacity = opacity.min(100);
        Some(layer.opacity)
    }

    pub fn by_category(&self, category: LayerCategory) -> Vec<&MapLayer> {
        self.layers
            .iter()
            .filter(|layer| layer.category == category)
            .collect()
    }

    pub fn visibility_at(&self, zoom: f64) -> Vec<(&str, LayerVisibility)> {
        self.layers
            .iter()
            .fold(Vec::with_capacity(self.layers.len()), |mut states, layer| {
                states.push((layer.id.as_str(), layer.visibility(zoom)));
                states
            })
    }

    pub fn visible_at(&self, zoom: f64) -> Vec<&MapLayer> {
        self.layers
            .iter()
            .filter(|layer| layer.visibility(zoom) == LayerVisibility::Visible)
            .collect()
    }
}

impl Default for LayerSet {
    fn default() -> Self {
        LayerSet::new(vec![
            MapLayer::new("satellite", "Satellite Imagery", LayerCategory::Satellite)
                .described("High-resolution satellite imagery from ISRO CARTOSAT")
                .raster()
                .styled("#3b82f6", 100)
                .zoom_range(Some(1.), Some(18.)),
            MapLayer::new("state_boundaries", "State Boundaries", LayerCategory::Base)
                .described("Indian state boundaries with tribal population density color coding")
                .styled("#6b7280", 75),
            MapLayer::new("forest_cover", "Forest Cover", LayerCategory::Fra)
                .described("Forest Survey of India data layer")
                .styled("#059669", 80),
            MapLayer::new("settlements", "Tribal Settlements", LayerCategory::Fra)
                .described("Identified tribal habitations and villages")
                .styled("#f59e0b", 90)
                .zoom_range(Some(VILLAGE_LEVEL), None),
            MapLayer::new("water_bodies", "Water Bodies", LayerCategory::Analysis)
                .described("Rivers, lakes, and water sources")
                .hidden()
                .styled("#06b6d4", 70)
                .zoom_range(Some(DISTRICT_LEVEL), None),
            MapLayer::new("fra_claims", "FRA Claim Boundaries", LayerCategory::Fra)
                .described("Forest rights claim boundaries and status")
                .styled("#8b5cf6", 85)
                .zoom_range(Some(VILLAGE_LEVEL), None),
            MapLayer::new("elevation", "Digital Elevation Model", LayerCategory::Base)
                .described("Terrain elevation and topographic data")
                .raster()
                .hidden()
                .styled("#84cc16", 60),
        ])
    }
}
