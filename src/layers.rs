// layers.rs

use anyhow::Result;
use geojson::{GeoJson, Value};
use plotters::prelude::RGBColor;

use crate::feeds::{self, Earthquake};
use crate::style::{self, MarkerStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseLayer {
    Topographic,
    Street,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 2] = [BaseLayer::Topographic, BaseLayer::Street];

    pub fn name(self) -> &'static str {
        match self {
            BaseLayer::Topographic => "Base Map",
            BaseLayer::Street => "Street Map",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Earthquakes,
    TectonicPlates,
}

impl Overlay {
    pub const ALL: [Overlay; 2] = [Overlay::Earthquakes, Overlay::TectonicPlates];

    pub fn name(self) -> &'static str {
        match self {
            Overlay::Earthquakes => "Earthquakes",
            Overlay::TectonicPlates => "Tectonic Plates",
        }
    }
}

/// Which base layer is shown and which overlays are switched on.
#[derive(Debug, Clone)]
pub struct LayerControl {
    pub base: BaseLayer,
    pub earthquakes_visible: bool,
    pub plates_visible: bool,
}

impl Default for LayerControl {
    fn default() -> Self {
        LayerControl {
            base: BaseLayer::Topographic,
            earthquakes_visible: false, // Overlays join the map once loaded
            plates_visible: false,
        }
    }
}

impl LayerControl {
    pub fn select_base(&mut self, base: BaseLayer) {
        self.base = base;
    }

    pub fn cycle_base(&mut self) {
        let idx = BaseLayer::ALL.iter().position(|b| *b == self.base).unwrap_or(0);
        self.base = BaseLayer::ALL[(idx + 1) % BaseLayer::ALL.len()];
    }

    pub fn is_visible(&self, overlay: Overlay) -> bool {
        match overlay {
            Overlay::Earthquakes => self.earthquakes_visible,
            Overlay::TectonicPlates => self.plates_visible,
        }
    }

    pub fn set_visible(&mut self, overlay: Overlay, visible: bool) {
        match overlay {
            Overlay::Earthquakes => self.earthquakes_visible = visible,
            Overlay::TectonicPlates => self.plates_visible = visible,
        }
    }

    /// Flips an overlay and returns its new visibility.
    pub fn toggle(&mut self, overlay: Overlay) -> bool {
        let visible = !self.is_visible(overlay);
        self.set_visible(overlay, visible);
        visible
    }
}

/// An earthquake drawn as a circle marker.
#[derive(Debug, Clone)]
pub struct QuakeMarker {
    pub quake: Earthquake,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, Default)]
pub struct EarthquakeLayer {
    pub markers: Vec<QuakeMarker>,
    pub skipped: usize, // Features without point geometry
}

impl EarthquakeLayer {
    pub fn from_geojson(geojson: GeoJson) -> Result<EarthquakeLayer> {
        let (quakes, skipped) = feeds::parse_earthquakes(geojson)?;
        let markers = quakes
            .into_iter()
            .map(|quake| {
                let style = style::style_info(&quake);
                QuakeMarker { quake, style }
            })
            .collect();
        Ok(EarthquakeLayer { markers, skipped })
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Plate boundaries as polylines of (lon, lat).
#[derive(Debug, Clone)]
pub struct PlateLayer {
    pub boundaries: Vec<Vec<(f64, f64)>>,
    pub color: RGBColor,
}

impl Default for PlateLayer {
    fn default() -> Self {
        PlateLayer {
            boundaries: Vec::new(),
            color: style::PLATE_COLOR,
        }
    }
}

impl PlateLayer {
    pub fn from_geojson(geojson: GeoJson) -> PlateLayer {
        let mut layer = PlateLayer::default();
        for feature in feeds::into_features(geojson) {
            if let Some(geometry) = feature.geometry {
                layer.add_geometry(geometry.value);
            }
        }
        layer
    }

    fn add_geometry(&mut self, value: Value) {
        let to_path = |coords: Vec<Vec<f64>>| -> Vec<(f64, f64)> {
            coords
                .into_iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1]))
                .collect()
        };
        match value {
            Value::LineString(line) => self.push(to_path(line)),
            Value::MultiLineString(lines) => {
                for line in lines {
                    self.push(to_path(line));
                }
            }
            Value::Polygon(rings) => {
                // Exterior ring only
                if let Some(exterior) = rings.into_iter().next() {
                    self.push(to_path(exterior));
                }
            }
            Value::MultiPolygon(polygons) => {
                for rings in polygons {
                    if let Some(exterior) = rings.into_iter().next() {
                        self.push(to_path(exterior));
                    }
                }
            }
            Value::GeometryCollection(geometries) => {
                for geometry in geometries {
                    self.add_geometry(geometry.value);
                }
            }
            Value::Point(_) | Value::MultiPoint(_) => {}
        }
    }

    fn push(&mut self, path: Vec<(f64, f64)>) {
        if path.len() >= 2 {
            self.boundaries.push(path);
        }
    }

    /// Consecutive point pairs of every boundary.
    pub fn segments(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.boundaries
            .iter()
            .flat_map(|path| path.windows(2).map(|w| (w[0], w[1])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::tests::SAMPLE_QUAKES;
    use crate::style::tests::hex;
    use approx::assert_relative_eq;

    const SAMPLE_PLATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "Name": "AF-AN", "PlateA": "AF", "PlateB": "AN" },
                "geometry": { "type": "LineString", "coordinates": [[-0.4, -54.8], [0.0, -54.6], [1.2, -54.2]] }
            },
            {
                "type": "Feature",
                "properties": { "Name": "split" },
                "geometry": { "type": "MultiLineString", "coordinates": [[[10.0, 1.0], [11.0, 2.0]], [[12.0, 3.0]]] }
            },
            {
                "type": "Feature",
                "properties": { "Name": "ring" },
                "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]] }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [5.0, 5.0] }
            }
        ]
    }"#;

    #[test]
    fn plate_layer_collects_lines_and_rings() {
        let layer = PlateLayer::from_geojson(SAMPLE_PLATES.parse().unwrap());
        // Single-point line from the MultiLineString is dropped
        assert_eq!(layer.boundaries.len(), 3);
        assert_eq!(layer.segments().count(), 2 + 1 + 3);
        assert_eq!(hex(layer.color), "#ffa500");
    }

    #[test]
    fn earthquake_layer_styles_each_marker() {
        let layer = EarthquakeLayer::from_geojson(SAMPLE_QUAKES.parse().unwrap()).unwrap();
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.skipped, 1);
        assert_eq!(hex(layer.markers[0].style.color), "#98ee00");
        assert_relative_eq!(layer.markers[0].style.radius, 23.0);
        // No depth, no magnitude
        assert_eq!(hex(layer.markers[1].style.color), "#000000");
        assert_relative_eq!(layer.markers[1].style.radius, 0.0);
    }

    #[test]
    fn layer_control_radio_and_checkboxes() {
        let mut control = LayerControl::default();
        assert_eq!(control.base, BaseLayer::Topographic);
        assert!(!control.is_visible(Overlay::Earthquakes));

        control.cycle_base();
        assert_eq!(control.base, BaseLayer::Street);
        control.cycle_base();
        assert_eq!(control.base, BaseLayer::Topographic);

        assert!(control.toggle(Overlay::TectonicPlates));
        assert!(control.is_visible(Overlay::TectonicPlates));
        assert!(!control.is_visible(Overlay::Earthquakes));
        assert!(!control.toggle(Overlay::TectonicPlates));
    }
}
