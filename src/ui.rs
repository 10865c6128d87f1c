// ui.rs

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Wrap,
        canvas::{Canvas, Circle, Line as CanvasLine, Map, MapResolution, Points},
    },
};

use crate::app::{App, CurrentScreen, FeedStatus};
use crate::layers::{BaseLayer, Overlay};
use crate::style::{self, to_tui_color};
use crate::viewport::CELL_WIDTH_PX;

const LAYER_CONTROL_WIDTH: u16 = 36;
const LEGEND_WIDTH: u16 = 16;
const POPUP_WIDTH: u16 = 48;

enum Corner {
    TopRight,
    BottomRight,
    BottomLeft,
}

pub fn render(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Notification
            Constraint::Min(0),    // Map or help
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    let notification = Paragraph::new(app.notification.clone())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(notification, main_layout[0]);

    match app.current_screen {
        CurrentScreen::Map => render_map_screen(frame, app, main_layout[1]),
        CurrentScreen::Help => render_help_screen(frame, app, main_layout[1]),
    }

    // Render the footer, common across all screens
    render_footer(frame, app, main_layout[2]);
}

/// Outline colour, background and detail of each base layer.
fn base_style(base: BaseLayer) -> (Color, Color, MapResolution) {
    match base {
        BaseLayer::Topographic => (Color::Rgb(126, 160, 96), Color::Rgb(12, 32, 52), MapResolution::High),
        BaseLayer::Street => (Color::Rgb(200, 200, 200), Color::Rgb(24, 24, 24), MapResolution::High),
    }
}

fn render_map_screen(frame: &mut Frame, app: &App, area: Rect) {
    render_map_canvas(frame, app, area);

    // Overlays drawn inside the map border
    let inner = Block::default().borders(Borders::ALL).inner(area);
    render_layer_control(frame, app, inner);
    render_legend(frame, inner);
    render_popup(frame, app, inner);
}

fn render_map_canvas(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Earthquakes, past 7 days ")
        .title_style(Style::default().fg(Color::Cyan).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    let inner = block.inner(area);
    let (x_bounds, y_bounds) = app.viewport.bounds_cells(inner.width, inner.height);
    let (outline, background, resolution) = base_style(app.layers.base);

    let viewport = app.viewport;
    let min_marker = viewport.pixels_to_degrees(CELL_WIDTH_PX / 4.0);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .background_color(background)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: outline,
                resolution,
            });
            ctx.layer();

            if app.layers.plates_visible {
                let color = to_tui_color(app.plates.color);
                for ((x1, y1), (x2, y2)) in app.plates.segments() {
                    ctx.draw(&CanvasLine {
                        x1,
                        y1,
                        x2,
                        y2,
                        color,
                    });
                }
                ctx.layer();
            }

            if app.layers.earthquakes_visible {
                for marker in &app.earthquakes.markers {
                    let color = to_tui_color(marker.style.color);
                    let (x, y) = (marker.quake.longitude, marker.quake.latitude);
                    let radius = viewport.pixels_to_degrees(marker.style.radius);
                    if radius > min_marker {
                        ctx.draw(&Circle { x, y, radius, color });
                    } else {
                        ctx.draw(&Points {
                            coords: &[(x, y)],
                            color,
                        });
                    }
                }
                if let Some(selected) = app.selected_marker() {
                    let radius = viewport.pixels_to_degrees(selected.style.radius) + min_marker * 2.0;
                    ctx.draw(&Circle {
                        x: selected.quake.longitude,
                        y: selected.quake.latitude,
                        radius,
                        color: Color::White,
                    });
                }
            }
        });

    frame.render_widget(canvas, area);
}

/// Places a `width` x `height` box in a corner of `area`, shrunk to fit.
fn anchored(area: Rect, width: u16, height: u16, corner: Corner) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = match corner {
        Corner::TopRight | Corner::BottomRight => area.x + area.width - width,
        Corner::BottomLeft => area.x,
    };
    let y = match corner {
        Corner::TopRight => area.y,
        Corner::BottomRight | Corner::BottomLeft => area.y + area.height - height,
    };
    Rect::new(x, y, width, height)
}

fn status_style(status: &FeedStatus) -> Style {
    match status {
        FeedStatus::Loading => Style::default().fg(Color::Gray),
        FeedStatus::Loaded(_) => Style::default().fg(Color::LightGreen),
        FeedStatus::Failed(_) => Style::default().fg(Color::Red),
    }
}

// Always expanded, like a non-collapsible layers control
fn render_layer_control(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from("Base layers").bold()];
    for base in BaseLayer::ALL {
        let marker = if app.layers.base == base { "(•)" } else { "( )" };
        lines.push(Line::from(format!("{} {}", marker, base.name())));
    }
    lines.push(Line::from("Overlays").bold());
    for overlay in Overlay::ALL {
        let marker = if app.layers.is_visible(overlay) { "[x]" } else { "[ ]" };
        let status = match overlay {
            Overlay::Earthquakes => &app.quake_status,
            Overlay::TectonicPlates => &app.plate_status,
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{} {} ", marker, overlay.name())),
            Span::styled(format!("({})", status.describe()), status_style(status)),
        ]));
    }

    let rect = anchored(
        area,
        LAYER_CONTROL_WIDTH,
        lines.len() as u16 + 2,
        Corner::TopRight,
    );
    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Layers ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightYellow)),
        )
        .style(Style::default().fg(Color::White).bg(Color::Black));
    frame.render_widget(Clear, rect);
    frame.render_widget(panel, rect);
}

fn render_legend(frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = style::legend()
        .into_iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled("██", Style::default().fg(to_tui_color(entry.color))),
                Span::raw(format!(" {}", entry.label)),
            ])
        })
        .collect();

    let rect = anchored(area, LEGEND_WIDTH, lines.len() as u16 + 2, Corner::BottomRight);
    let legend = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Depth (km) ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightCyan)),
        )
        .style(Style::default().fg(Color::White).bg(Color::Black));
    frame.render_widget(Clear, rect);
    frame.render_widget(legend, rect);
}

fn render_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(popup) = app.selected_popup() else {
        return;
    };

    let mut lines = Vec::new();
    for (i, text) in popup.lines.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from("─".repeat(POPUP_WIDTH as usize - 2)).fg(Color::DarkGray));
        }
        lines.push(Line::from(text.clone()));
    }

    let rect = anchored(area, POPUP_WIDTH, lines.len() as u16 + 2, Corner::BottomLeft);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", popup.title),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightBlue)),
        )
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::White).bg(Color::Black));
    frame.render_widget(Clear, rect);
    frame.render_widget(paragraph, rect);
}

/// Renders the help screen.
fn render_help_screen(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Help Screen ")
        .title_style(Style::default().fg(Color::Yellow).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let mut help_lines: Vec<Line> = vec![Line::from("Keybinds:"), Line::from("")];
    help_lines.extend(app.help_keybinds.iter().map(|s| Line::from(format!("  {}", s))));
    help_lines.push(Line::from(""));
    help_lines.push(Line::from("Feeds:"));
    for (name, status) in [
        ("Earthquakes", &app.quake_status),
        ("Tectonic Plates", &app.plate_status),
    ] {
        let detail = match status {
            FeedStatus::Failed(reason) => format!("  {}: failed ({})", name, reason),
            other => format!("  {}: {}", name, other.describe()),
        };
        help_lines.push(Line::from(Span::styled(detail, status_style(status))));
    }
    help_lines.push(Line::from(""));
    help_lines.push(Line::from("Press Esc or H to return to the map."));

    let help_text = Paragraph::new(help_lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::LightGreen));

    frame.render_widget(help_text, area);
}

/// Renders a common footer area.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let current_screen_name = match app.current_screen {
        CurrentScreen::Map => "Map",
        CurrentScreen::Help => "Help",
    };

    let footer_text = Line::from(vec![
        Span::raw("Screen: "),
        Span::styled(
            current_screen_name,
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Base: "),
        Span::styled(
            app.layers.base.name(),
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " | Center: {:.2}, {:.2} | Zoom: {}",
            app.viewport.center_lat, app.viewport.center_lon, app.viewport.zoom
        )),
        Span::raw(" | Press "),
        Span::styled(
            "q",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
        ),
        Span::raw(" to quit "),
        Span::raw(" | Press "),
        Span::styled(
            "h",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Green),
        ),
        Span::raw(" for Help "),
    ]);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let footer = Paragraph::new(footer_text)
        .alignment(Alignment::Center)
        .block(block)
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FeedEvent;
    use crate::feeds::tests::SAMPLE_QUAKES;
    use crate::layers::{EarthquakeLayer, PlateLayer};
    use crate::viewport::Viewport;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    /// Number of cells drawn with `color` as foreground.
    fn cells_colored(app: &App, color: Color) -> usize {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .filter(|cell| cell.fg == color)
            .count()
    }

    #[test]
    fn map_screen_shows_layer_control_and_legend() {
        let mut app = App::new(Viewport::new(35.0, -117.0, 3));
        let layer = EarthquakeLayer::from_geojson(SAMPLE_QUAKES.parse().unwrap()).unwrap();
        app.apply_feed(FeedEvent::Earthquakes(Ok(layer)));

        let screen = draw(&app);
        assert!(screen.contains("Depth (km)"));
        assert!(screen.contains("90+"));
        assert!(screen.contains("(•) Street Map"));
        assert!(screen.contains("[x] Earthquakes (2 loaded)"));
        assert!(screen.contains("[ ] Tectonic Plates (loading)"));
    }

    #[test]
    fn selected_earthquake_opens_popup() {
        let mut app = App::new(Viewport::new(35.0, -117.0, 3));
        let layer = EarthquakeLayer::from_geojson(SAMPLE_QUAKES.parse().unwrap()).unwrap();
        app.apply_feed(FeedEvent::Earthquakes(Ok(layer)));
        app.handle_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE));

        let screen = draw(&app);
        assert!(screen.contains("10 km S of Somewhere"));
        assert!(screen.contains("Magnitude: 4.6"));
        assert!(screen.contains("Depth: 8.2"));
    }

    #[test]
    fn overlay_toggles_hide_canvas_shapes() {
        let mut app = App::new(Viewport::new(35.0, -117.0, 4));
        let layer = EarthquakeLayer::from_geojson(SAMPLE_QUAKES.parse().unwrap()).unwrap();
        app.apply_feed(FeedEvent::Earthquakes(Ok(layer)));
        let plates = PlateLayer {
            boundaries: vec![vec![(-125.0, 30.0), (-110.0, 40.0)]],
            ..Default::default()
        };
        app.apply_feed(FeedEvent::Plates(Ok(plates)));

        let shallow = to_tui_color(style::DEPTH_COLORS[0]);
        let orange = to_tui_color(style::PLATE_COLOR);
        let green_shown = cells_colored(&app, shallow);
        assert!(cells_colored(&app, orange) > 0);

        app.handle_key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::NONE));
        // Only the legend swatch keeps the shallow colour
        let green_hidden = cells_colored(&app, shallow);
        assert!(green_hidden < green_shown);

        app.handle_key(KeyEvent::new(KeyCode::Char('t'), KeyModifiers::NONE));
        assert_eq!(cells_colored(&app, orange), 0);

        app.handle_key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::NONE));
        assert_eq!(cells_colored(&app, shallow), green_shown);
    }

    #[test]
    fn help_screen_lists_keybinds() {
        let mut app = App::new(Viewport::new(0.0, 0.0, 1));
        app.current_screen = CurrentScreen::Help;
        let screen = draw(&app);
        assert!(screen.contains("Help Screen"));
        assert!(screen.contains("B: Cycle base map"));
    }

    #[test]
    fn anchored_boxes_stay_inside_the_area() {
        let area = Rect::new(2, 3, 10, 5);
        let rect = anchored(area, 30, 8, Corner::BottomRight);
        assert_eq!(rect, area);
        let rect = anchored(area, 4, 2, Corner::BottomLeft);
        assert_eq!(rect, Rect::new(2, 6, 4, 2));
    }
}
