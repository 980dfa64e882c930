//! Structured network event log.
//!
//! A trimmed-down take on Chromium's `net/log/`: events carry a type, the
//! source that emitted them and a JSON parameter blob. Sinks decide what to do
//! with them; [`TracingNetLog`] forwards to `tracing` and [`RecordingNetLog`]
//! keeps them in memory.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Event types emitted by the proxy resolution path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetLogEventType {
    /// `alert()` was called from the PAC script.
    PacJavascriptAlert,
    /// The PAC script raised an error.
    PacJavascriptError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetLogSourceType {
    #[default]
    None,
    ProxyResolution,
    UrlRequest,
}

/// Identifies the object an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct NetLogSource {
    pub kind: NetLogSourceType,
    pub id: u32,
}

impl NetLogSource {
    /// Allocates a fresh source id of the given type.
    pub fn new(kind: NetLogSourceType) -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(1);
        Self {
            kind,
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The source used for global entries.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.kind == NetLogSourceType::None
    }
}

/// A single logged event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetLogEntry {
    #[serde(rename = "type")]
    pub event_type: NetLogEventType,
    pub source: NetLogSource,
    pub params: Value,
}

/// A sink for [`NetLogEntry`] values. Implementations must be thread-safe.
pub trait NetLog: Send + Sync {
    fn add_entry(&self, entry: NetLogEntry);

    /// Adds an entry that is not tied to any particular request.
    fn add_global_entry(&self, event_type: NetLogEventType, params: Value) {
        self.add_entry(NetLogEntry {
            event_type,
            source: NetLogSource::none(),
            params,
        });
    }
}

impl<L: NetLog + ?Sized> NetLog for Arc<L> {
    fn add_entry(&self, entry: NetLogEntry) {
        (**self).add_entry(entry)
    }
}

/// A [`NetLog`] bound to one source, handed to per-request code.
///
/// The default value has no sink and drops every event.
#[derive(Clone, Default)]
pub struct NetLogWithSource {
    net_log: Option<Arc<dyn NetLog>>,
    source: NetLogSource,
}

impl NetLogWithSource {
    /// Creates a bound log with a freshly allocated source.
    pub fn make(net_log: Arc<dyn NetLog>, kind: NetLogSourceType) -> Self {
        Self {
            net_log: Some(net_log),
            source: NetLogSource::new(kind),
        }
    }

    pub fn source(&self) -> NetLogSource {
        self.source
    }

    pub fn is_capturing(&self) -> bool {
        self.net_log.is_some()
    }

    pub fn add_event(&self, event_type: NetLogEventType, params: Value) {
        if let Some(net_log) = &self.net_log {
            net_log.add_entry(NetLogEntry {
                event_type,
                source: self.source,
                params,
            });
        }
    }
}

impl fmt::Debug for NetLogWithSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetLogWithSource")
            .field("source", &self.source)
            .field("capturing", &self.net_log.is_some())
            .finish()
    }
}

/// Forwards entries to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNetLog;

impl NetLog for TracingNetLog {
    fn add_entry(&self, entry: NetLogEntry) {
        tracing::debug!(
            event = ?entry.event_type,
            source_id = entry.source.id,
            params = %entry.params,
            "netlog"
        );
    }
}

/// Keeps every entry in memory.
#[derive(Debug, Default)]
pub struct RecordingNetLog {
    entries: Mutex<Vec<NetLogEntry>>,
}

impl RecordingNetLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries, oldest first.
    pub fn entries(&self) -> Vec<NetLogEntry> {
        self.lock().clone()
    }

    pub fn entries_of_type(&self, event_type: NetLogEventType) -> Vec<NetLogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<NetLogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NetLog for RecordingNetLog {
    fn add_entry(&self, entry: NetLogEntry) {
        self.lock().push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bound_log_tags_source() {
        let log = Arc::new(RecordingNetLog::new());
        let bound = NetLogWithSource::make(log.clone(), NetLogSourceType::ProxyResolution);

        bound.add_event(NetLogEventType::PacJavascriptAlert, json!({"message": "hi"}));
        log.add_global_entry(NetLogEventType::PacJavascriptAlert, json!({"message": "hi"}));

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source, bound.source());
        assert!(!entries[0].source.is_none());
        assert!(entries[1].source.is_none());
    }

    #[test]
    fn test_default_bound_log_drops_events() {
        let bound = NetLogWithSource::default();
        assert!(!bound.is_capturing());
        bound.add_event(NetLogEventType::PacJavascriptError, json!({}));
    }

    #[test]
    fn test_source_ids_are_unique() {
        let a = NetLogSource::new(NetLogSourceType::UrlRequest);
        let b = NetLogSource::new(NetLogSourceType::UrlRequest);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_entry_serializes_event_type() {
        let entry = NetLogEntry {
            event_type: NetLogEventType::PacJavascriptError,
            source: NetLogSource::none(),
            params: json!({"line_number": 3}),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "PAC_JAVASCRIPT_ERROR");
        assert_eq!(value["params"]["line_number"], 3);
    }
}
