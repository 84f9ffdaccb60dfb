//! Realtime listener for server push events.
//!
//! Consumes the server's line-delimited JSON event stream and
//! republishes every event on the in-process bus under its event
//! name. The report viewer subscribes to the `report_generated`
//! topic to learn about finished prepared-report builds.

use crate::api::ReportClient;
use crate::tui::EventBus;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// One frame of the event stream: `{"event": "...", "data": {...}}`.
#[derive(Debug, Deserialize)]
struct EventFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Parse one stream line into a (topic, payload) pair.
///
/// Blank lines and malformed frames yield `None`; a bad frame must
/// not tear the stream down.
fn parse_event_line(line: &str) -> Option<(String, Value)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<EventFrame>(line) {
        Ok(frame) => Some((frame.event, frame.data)),
        Err(e) => {
            log::debug!("Skipping malformed event frame: {}", e);
            None
        }
    }
}

async fn listen_once(client: &ReportClient, bus: &EventBus, channel: &str) -> anyhow::Result<()> {
    let url = client.events_url(channel);
    log::debug!("Connecting to event stream: {}", url);

    let mut response = client.request(&url).send().await?.error_for_status()?;
    log::info!("Connected to event stream on channel '{}'", channel);

    let mut buffer = String::new();
    while let Some(chunk) = response.chunk().await? {
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(newline) = buffer.find('\n') {
            let line: String = buffer.drain(..=newline).collect();
            if let Some((topic, data)) = parse_event_line(&line) {
                bus.publish(topic, data);
            }
        }
    }

    // Server closed the stream; the caller reconnects.
    Ok(())
}

/// Spawn the listener task. It reconnects with a fixed delay and runs
/// until the process exits.
pub fn spawn_listener(client: Arc<ReportClient>, bus: EventBus, channel: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = listen_once(&client, &bus, &channel).await {
                log::warn!("Event stream error: {:#}", e);
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_line() {
        let (topic, data) = parse_event_line(
            r#"{"event": "report_generated", "data": {"name": "PR-0001", "report_name": "Sales Summary"}}"#,
        )
        .unwrap();
        assert_eq!(topic, "report_generated");
        assert_eq!(data["name"], "PR-0001");
        assert_eq!(data["report_name"], "Sales Summary");
    }

    #[test]
    fn test_parse_event_line_without_data() {
        let (topic, data) = parse_event_line(r#"{"event": "heartbeat"}"#).unwrap();
        assert_eq!(topic, "heartbeat");
        assert!(data.is_null());
    }

    #[test]
    fn test_parse_skips_blank_and_malformed() {
        assert!(parse_event_line("").is_none());
        assert!(parse_event_line("   ").is_none());
        assert!(parse_event_line("not json").is_none());
        assert!(parse_event_line(r#"{"data": {}}"#).is_none());
    }
}
