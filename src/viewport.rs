// viewport.rs

pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 18;

// Approximate pixel footprint of one terminal cell
pub const CELL_WIDTH_PX: f64 = 8.0;
pub const CELL_HEIGHT_PX: f64 = 16.0;

const TILE_SIZE_PX: f64 = 256.0;

/// Visible map window: a centre point and a slippy-map style zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(center_lat: f64, center_lon: f64, zoom: u8) -> Viewport {
        Viewport {
            center_lat: center_lat.clamp(-90.0, 90.0),
            center_lon: center_lon.clamp(-180.0, 180.0),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Degrees covered by one pixel at the current zoom.
    pub fn degrees_per_pixel(&self) -> f64 {
        360.0 / (TILE_SIZE_PX * f64::from(1u32 << self.zoom))
    }

    /// Converts a length in pixels into degrees.
    pub fn pixels_to_degrees(&self, pixels: f64) -> f64 {
        pixels * self.degrees_per_pixel()
    }

    /// Longitude and latitude bounds of a `width` x `height` pixel area.
    pub fn bounds_px(&self, width: f64, height: f64) -> ([f64; 2], [f64; 2]) {
        let half_lon = self.pixels_to_degrees(width) / 2.0;
        let half_lat = self.pixels_to_degrees(height) / 2.0;
        let lon = [self.center_lon - half_lon, self.center_lon + half_lon];
        let lat = [
            (self.center_lat - half_lat).max(-90.0),
            (self.center_lat + half_lat).min(90.0),
        ];
        (lon, lat)
    }

    /// Bounds of a canvas measured in terminal cells.
    pub fn bounds_cells(&self, cols: u16, rows: u16) -> ([f64; 2], [f64; 2]) {
        self.bounds_px(
            f64::from(cols) * CELL_WIDTH_PX,
            f64::from(rows) * CELL_HEIGHT_PX,
        )
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// Moves the centre by a number of terminal cells (right and up positive).
    pub fn pan_cells(&mut self, dx: i32, dy: i32) {
        let dlon = self.pixels_to_degrees(f64::from(dx) * CELL_WIDTH_PX);
        let dlat = self.pixels_to_degrees(f64::from(dy) * CELL_HEIGHT_PX);
        self.center_lon = wrap_longitude(self.center_lon + dlon);
        self.center_lat = (self.center_lat + dlat).clamp(-90.0, 90.0);
    }

    pub fn center_on(&mut self, lat: f64, lon: f64) {
        self.center_lat = lat.clamp(-90.0, 90.0);
        self.center_lon = wrap_longitude(lon);
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}
