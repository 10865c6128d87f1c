// export.rs

use anyhow::{Context, Result, anyhow};
use plotters::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::feeds;
use crate::layers::{EarthquakeLayer, PlateLayer, QuakeMarker};
use crate::style;
use crate::viewport::Viewport;

pub const IMAGE_SIZE: (u32, u32) = (1024, 768);

const OCEAN: RGBColor = RGBColor(173, 216, 230); // Light blue ocean background
const LEGEND_ROW_PX: i32 = 22;
const LEGEND_WIDTH_PX: i32 = 130;

fn draw_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("failed to draw map: {}", e)
}

/// Fetches both feeds and writes the composed map to `config.export`.
pub fn run(config: &Config) -> Result<()> {
    let output = config
        .export
        .as_ref()
        .ok_or_else(|| anyhow!("no export path configured"))?;

    let quakes = feeds::fetch_geojson(&config.quakes, config.timeout)
        .and_then(EarthquakeLayer::from_geojson)
        .context("failed to load earthquake feed")?;
    info!(markers = quakes.len(), skipped = quakes.skipped, "earthquakes loaded");

    let plates = match feeds::fetch_geojson(&config.plates, config.timeout) {
        Ok(geojson) => PlateLayer::from_geojson(geojson),
        Err(e) => {
            warn!("plate feed failed, exporting without plate boundaries: {:#}", e);
            PlateLayer::default()
        }
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    render_png(output, IMAGE_SIZE, &config.viewport(), &quakes, &plates)?;
    println!("Map written to {}", output.display());
    Ok(())
}

/// Markers whose centre falls inside the given bounds.
pub fn visible_markers<'a>(
    quakes: &'a EarthquakeLayer,
    lon: [f64; 2],
    lat: [f64; 2],
) -> impl Iterator<Item = &'a QuakeMarker> + 'a {
    quakes.markers.iter().filter(move |m| {
        (lon[0]..=lon[1]).contains(&m.quake.longitude) && (lat[0]..=lat[1]).contains(&m.quake.latitude)
    })
}

pub fn render_png(
    path: &Path,
    size: (u32, u32),
    viewport: &Viewport,
    quakes: &EarthquakeLayer,
    plates: &PlateLayer,
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_map(&root, size, viewport, quakes, plates)?;
    root.present().map_err(draw_err)?;
    info!(path = %path.display(), "map exported");
    Ok(())
}

/// Draws plates, markers and legend onto any plotters backend.
pub fn draw_map<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    size: (u32, u32),
    viewport: &Viewport,
    quakes: &EarthquakeLayer,
    plates: &PlateLayer,
) -> Result<()> {
    let (lon, lat) = viewport.bounds_px(f64::from(size.0), f64::from(size.1));
    root.fill(&OCEAN).map_err(draw_err)?;

    let caption = format!("Earthquakes, past 7 days ({} events)", quakes.len());
    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&caption, ("sans-serif", 28).into_font())
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(lon[0]..lon[1], lat[0]..lat[1])
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(
            plates
                .boundaries
                .iter()
                .map(|path| PathElement::new(path.clone(), plates.color.stroke_width(2))),
        )
        .map_err(draw_err)?;

    // Translucent fill with a solid outline, like a circle marker
    chart
        .draw_series(visible_markers(quakes, lon, lat).map(|m| {
            Circle::new(
                (m.quake.longitude, m.quake.latitude),
                m.style.radius.round() as i32,
                m.style.color.mix(0.2).filled(),
            )
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(visible_markers(quakes, lon, lat).map(|m| {
            Circle::new(
                (m.quake.longitude, m.quake.latitude),
                (m.style.radius.round() as i32).max(1),
                m.style.color.stroke_width(1),
            )
        }))
        .map_err(draw_err)?;

    draw_legend(root, size)
}

fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    size: (u32, u32),
) -> Result<()> {
    let entries = style::legend();
    let height = LEGEND_ROW_PX * entries.len() as i32 + 36;
    let x0 = size.0 as i32 - LEGEND_WIDTH_PX - 20;
    let y0 = size.1 as i32 - height - 50;

    root.draw(&Rectangle::new(
        [(x0, y0), (x0 + LEGEND_WIDTH_PX, y0 + height)],
        WHITE.mix(0.85).filled(),
    ))
    .map_err(draw_err)?;
    root.draw(&Text::new(
        "Depth (km)",
        (x0 + 10, y0 + 8),
        ("sans-serif", 16).into_font(),
    ))
    .map_err(draw_err)?;

    for (i, entry) in entries.iter().enumerate() {
        let y = y0 + 30 + LEGEND_ROW_PX * i as i32;
        root.draw(&Rectangle::new(
            [(x0 + 10, y), (x0 + 28, y + 16)],
            entry.color.filled(),
        ))
        .map_err(draw_err)?;
        root.draw(&Text::new(
            entry.label.as_str(),
            (x0 + 36, y + 1),
            ("sans-serif", 15).into_font(),
        ))
        .map_err(draw_err)?;
    }
    Ok(())
}
