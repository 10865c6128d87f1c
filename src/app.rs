// app.rs

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use tracing::{debug, info};

use crate::event::FeedEvent;
use crate::feeds::Popup;
use crate::layers::{BaseLayer, EarthquakeLayer, LayerControl, Overlay, PlateLayer, QuakeMarker};
use crate::viewport::Viewport;

// Cells moved per arrow key press
const PAN_STEP: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentScreen {
    Map,
    Help,
}

/// Download state of one feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedStatus {
    Loading,
    Loaded(usize), // Number of markers or boundaries
    Failed(String),
}

impl FeedStatus {
    pub fn describe(&self) -> String {
        match self {
            FeedStatus::Loading => "loading".to_string(),
            FeedStatus::Loaded(n) => format!("{} loaded", n),
            FeedStatus::Failed(_) => "failed".to_string(),
        }
    }
}

pub struct App {
    pub current_screen: CurrentScreen,
    pub should_quit: bool,

    // Map state
    pub viewport: Viewport,
    pub layers: LayerControl,
    pub earthquakes: EarthquakeLayer,
    pub plates: PlateLayer,
    pub selected_quake: Option<usize>, // Marker whose popup is open

    // Feed state
    pub quake_status: FeedStatus,
    pub plate_status: FeedStatus,
    reload_requested: bool,
    quakes_loaded_once: bool,
    plates_loaded_once: bool,

    // UI related
    pub notification: String,
    pub help_keybinds: Vec<String>,
    drag_origin: Option<(u16, u16)>,
}

impl App {
    /// Constructs a new `App` looking at `viewport`, with both feeds pending.
    pub fn new(viewport: Viewport) -> App {
        App {
            current_screen: CurrentScreen::Map,
            should_quit: false,

            viewport,
            layers: LayerControl::default(),
            earthquakes: EarthquakeLayer::default(),
            plates: PlateLayer::default(),
            selected_quake: None,

            quake_status: FeedStatus::Loading,
            plate_status: FeedStatus::Loading,
            reload_requested: false,
            quakes_loaded_once: false,
            plates_loaded_once: false,

            notification: String::from("Loading earthquake feed..."),
            help_keybinds: vec![
                "Arrow Keys: Pan the map".to_string(),
                "+/-: Zoom in/out".to_string(),
                "B: Cycle base map".to_string(),
                "E: Toggle Earthquakes layer".to_string(),
                "T: Toggle Tectonic Plates layer".to_string(),
                "N/P: Next/previous earthquake popup".to_string(),
                "Esc: Close popup".to_string(),
                "R: Reload feeds".to_string(),
                "H: Show Help screen".to_string(),
                "Q: Quit the application".to_string(),
                "Mouse wheel: Zoom, drag: Pan".to_string(),
            ],
            drag_origin: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.current_screen == CurrentScreen::Help {
            // Any of these leaves the help screen
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Enter => {
                    self.current_screen = CurrentScreen::Map
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                self.current_screen = CurrentScreen::Help
            }
            KeyCode::Left => self.viewport.pan_cells(-PAN_STEP, 0),
            KeyCode::Right => self.viewport.pan_cells(PAN_STEP, 0),
            KeyCode::Up => self.viewport.pan_cells(0, PAN_STEP / 2),
            KeyCode::Down => self.viewport.pan_cells(0, -PAN_STEP / 2),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.viewport.zoom_in();
                self.notification = format!("Zoom {}", self.viewport.zoom);
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                self.viewport.zoom_out();
                self.notification = format!("Zoom {}", self.viewport.zoom);
            }
            KeyCode::Char('b') | KeyCode::Char('B') => {
                self.layers.cycle_base();
                self.notification = format!("Base layer: {}", self.layers.base.name());
            }
            KeyCode::Char('e') | KeyCode::Char('E') => self.toggle_overlay(Overlay::Earthquakes),
            KeyCode::Char('t') | KeyCode::Char('T') => self.toggle_overlay(Overlay::TectonicPlates),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Tab => self.select_next(),
            KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::BackTab => self.select_previous(),
            KeyCode::Esc => {
                self.selected_quake = None;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_reload(),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.viewport.zoom_in(),
            MouseEventKind::ScrollDown => self.viewport.zoom_out(),
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_origin = Some((mouse.column, mouse.row));
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((col, row)) = self.drag_origin {
                    // Content follows the pointer
                    let dx = i32::from(col) - i32::from(mouse.column);
                    let dy = i32::from(mouse.row) - i32::from(row);
                    self.viewport.pan_cells(dx, dy);
                }
                self.drag_origin = Some((mouse.column, mouse.row));
            }
            MouseEventKind::Up(MouseButton::Left) => self.drag_origin = None,
            _ => {}
        }
    }

    /// Installs a finished feed download.
    pub fn apply_feed(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Earthquakes(Ok(layer)) => {
                self.quake_status = FeedStatus::Loaded(layer.len());
                self.notification = format!(
                    "{} earthquakes loaded, loading plate boundaries...",
                    layer.len()
                );
                self.earthquakes = layer;
                self.selected_quake = None;
                // Later reloads keep the user's layer choices
                if !self.quakes_loaded_once {
                    self.quakes_loaded_once = true;
                    self.layers.set_visible(Overlay::Earthquakes, true);
                    self.layers.select_base(BaseLayer::Street);
                }
            }
            FeedEvent::Earthquakes(Err(e)) => {
                self.quake_status = FeedStatus::Failed(format!("{:#}", e));
                // Plates are never requested after a failed earthquake feed,
                // so whatever was loaded before stays on the map
                self.plate_status = if self.plates_loaded_once {
                    FeedStatus::Loaded(self.plates.boundaries.len())
                } else {
                    FeedStatus::Failed("not requested".to_string())
                };
                self.notification = format!("Earthquake feed failed: {} (R to retry)", e);
            }
            FeedEvent::Plates(Ok(layer)) => {
                self.plate_status = FeedStatus::Loaded(layer.boundaries.len());
                self.notification = format!(
                    "{} earthquakes, {} plate boundaries",
                    self.earthquakes.len(),
                    layer.boundaries.len()
                );
                self.plates = layer;
                if !self.plates_loaded_once {
                    self.plates_loaded_once = true;
                    self.layers.set_visible(Overlay::TectonicPlates, true);
                }
            }
            FeedEvent::Plates(Err(e)) => {
                self.plate_status = FeedStatus::Failed(format!("{:#}", e));
                self.notification = format!("Plate feed failed: {} (R to retry)", e);
            }
        }
    }

    /// Returns true once after a reload was requested.
    pub fn take_reload_request(&mut self) -> bool {
        std::mem::take(&mut self.reload_requested)
    }

    pub fn selected_marker(&self) -> Option<&QuakeMarker> {
        self.selected_quake.and_then(|i| self.earthquakes.markers.get(i))
    }

    pub fn selected_popup(&self) -> Option<Popup> {
        if !self.layers.earthquakes_visible {
            return None;
        }
        self.selected_marker().map(|m| m.quake.popup())
    }

    fn toggle_overlay(&mut self, overlay: Overlay) {
        let visible = self.layers.toggle(overlay);
        debug!(overlay = overlay.name(), visible, "overlay toggled");
        self.notification = format!(
            "{}: {}",
            overlay.name(),
            if visible { "shown" } else { "hidden" }
        );
    }

    fn request_reload(&mut self) {
        if self.quake_status == FeedStatus::Loading || self.plate_status == FeedStatus::Loading {
            self.notification = "Feeds are still loading".to_string();
            return;
        }
        info!("reloading feeds");
        self.reload_requested = true;
        self.quake_status = FeedStatus::Loading;
        self.plate_status = FeedStatus::Loading;
        self.notification = String::from("Reloading earthquake feed...");
    }

    fn select_next(&mut self) {
        let count = self.earthquakes.len();
        if !self.can_select() {
            return;
        }
        let next = match self.selected_quake {
            Some(i) => (i + 1) % count,
            None => 0,
        };
        self.select(next);
    }

    fn select_previous(&mut self) {
        let count = self.earthquakes.len();
        if !self.can_select() {
            return;
        }
        let previous = match self.selected_quake {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        self.select(previous);
    }

    fn can_select(&mut self) -> bool {
        if !self.layers.earthquakes_visible {
            self.notification = "Earthquakes layer is hidden".to_string();
            return false;
        }
        if self.earthquakes.is_empty() {
            self.notification = "No earthquakes loaded".to_string();
            return false;
        }
        true
    }

    fn select(&mut self, index: usize) {
        self.selected_quake = Some(index);
        if let Some(marker) = self.earthquakes.markers.get(index) {
            self.viewport
                .center_on(marker.quake.latitude, marker.quake.longitude);
            self.notification = format!(
                "Earthquake {}/{}",
                index + 1,
                self.earthquakes.len()
            );
        }
    }
}
