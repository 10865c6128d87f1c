// event.rs
use std::{
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use tracing::{error, info, warn};

use crate::feeds::{self, FeedSource};
use crate::layers::{EarthquakeLayer, PlateLayer};

/// Result of one background feed download.
pub enum FeedEvent {
    Earthquakes(anyhow::Result<EarthquakeLayer>),
    Plates(anyhow::Result<PlateLayer>),
}

pub enum Event {
    Tick,
    Input(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Feed(FeedEvent),
}

pub struct EventHandler {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
    #[allow(dead_code)]
    event_thread: thread::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> EventHandler {
        let (sender, receiver) = mpsc::channel();
        let input_sender = sender.clone();
        let event_thread = thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or_else(|| Duration::from_secs(0));

                // Poll for a crossterm event.
                let polled = match event::poll(timeout) {
                    Ok(ready) => ready,
                    Err(e) => {
                        error!("unable to poll for terminal events: {}", e);
                        return;
                    }
                };
                if polled {
                    let forwarded = match event::read() {
                        Ok(CrosstermEvent::Key(e)) => Some(Event::Input(e)),
                        Ok(CrosstermEvent::Mouse(e)) => Some(Event::Mouse(e)),
                        Ok(CrosstermEvent::Resize(_, _)) => Some(Event::Resize),
                        Ok(_) => None,
                        Err(e) => {
                            error!("unable to read terminal event: {}", e);
                            return;
                        }
                    };
                    if let Some(event) = forwarded {
                        if input_sender.send(event).is_err() {
                            return; // Receiver gone, app is shutting down
                        }
                    }
                }

                // If enough time has passed, send a `Tick` event.
                if last_tick.elapsed() >= tick_rate {
                    if input_sender.send(Event::Tick).is_err() {
                        return;
                    }
                    last_tick = Instant::now();
                }
            }
        });
        EventHandler {
            sender,
            receiver,
            event_thread,
        }
    }

    /// Sender for background producers such as the feed loader.
    pub fn sender(&self) -> Sender<Event> {
        self.sender.clone()
    }

    pub fn next(&self, timeout: Duration) -> Result<Option<Event>, mpsc::RecvTimeoutError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Fetches the earthquake feed, then the plate feed, on a background thread.
/// Plates are only requested once the earthquakes arrived.
pub fn spawn_feed_loader(
    quakes: FeedSource,
    plates: FeedSource,
    timeout: Duration,
    sender: Sender<Event>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let quake_layer = feeds::fetch_geojson(&quakes, timeout)
            .and_then(EarthquakeLayer::from_geojson);
        let quakes_ok = quake_layer.is_ok();
        match &quake_layer {
            Ok(layer) => info!(markers = layer.len(), skipped = layer.skipped, "earthquakes loaded"),
            Err(e) => warn!("earthquake feed failed: {:#}", e),
        }
        if sender
            .send(Event::Feed(FeedEvent::Earthquakes(quake_layer)))
            .is_err()
            || !quakes_ok
        {
            return;
        }

        let plate_layer = feeds::fetch_geojson(&plates, timeout).map(PlateLayer::from_geojson);
        match &plate_layer {
            Ok(layer) => info!(boundaries = layer.boundaries.len(), "plate boundaries loaded"),
            Err(e) => warn!("plate feed failed: {:#}", e),
        }
        let _ = sender.send(Event::Feed(FeedEvent::Plates(plate_layer)));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::tests::SAMPLE_QUAKES;
    use std::fs;
    use std::path::PathBuf;

    fn temp_feed(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("quakemap-{}-{}.geojson", name, std::process::id()));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loader_posts_earthquakes_then_plates() {
        let quakes = temp_feed("loader-quakes", SAMPLE_QUAKES);
        let plates = temp_feed(
            "loader-plates",
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},
               "geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}]}"#,
        );
        let (sender, receiver) = mpsc::channel();
        spawn_feed_loader(
            FeedSource::File(quakes.clone()),
            FeedSource::File(plates.clone()),
            Duration::from_secs(1),
            sender,
        )
        .join()
        .unwrap();

        let events: Vec<Event> = receiver.try_iter().collect();
        fs::remove_file(quakes).unwrap();
        fs::remove_file(plates).unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::Feed(FeedEvent::Earthquakes(Ok(l))) if l.len() == 2));
        assert!(matches!(&events[1], Event::Feed(FeedEvent::Plates(Ok(l))) if l.boundaries.len() == 1));
    }

    #[test]
    fn plates_are_skipped_when_earthquakes_fail() {
        let (sender, receiver) = mpsc::channel();
        spawn_feed_loader(
            FeedSource::File(PathBuf::from("/nonexistent/quakes.geojson")),
            FeedSource::File(PathBuf::from("/nonexistent/plates.geojson")),
            Duration::from_secs(1),
            sender,
        )
        .join()
        .unwrap();

        let events: Vec<Event> = receiver.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Feed(FeedEvent::Earthquakes(Err(_)))));
    }
}
