//! Minimal counters for the server.
//!
//! Counter/gauge/histogram types with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors to keep deterministic
//! ordering. Histogram buckets are fixed in microseconds.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str(r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }
    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge\n{} {}", name, name, self.get());
    }
}

// 100us, 500us, 1ms, 5ms, 10ms, 50ms, 100ms, 500ms, 1s
const BUCKETS_MICROS: [u64; 9] = [100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000];

#[derive(Default)]
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

impl Histogram {
    /// Observe a duration (microsecond scale, cumulative buckets).
    pub fn observe(&self, duration: Duration) {
        let micros = duration.as_micros() as u64;
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(micros, Ordering::Relaxed);
        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
            let count = self.buckets[i].load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{le=\"{}\"}} {}", name, le, count);
        }
        let count = self.count();
        let _ = writeln!(out, "{}_bucket{{le=\"+Inf\"}} {}", name, count);
        let _ = writeln!(out, "{}_sum {}", name, self.sum.load(Ordering::Relaxed));
        let _ = writeln!(out, "{}_count {}", name, count);
    }
}

#[derive(Default)]
pub struct ServerMetrics {
    pub http_requests: CounterVec,
    pub ws_sessions_active: Gauge,
    pub ws_frames_sent: CounterVec,
    pub ws_rejected: CounterVec,
    pub plugin_fetch_errors: CounterVec,
    pub plugin_fetch_duration: Histogram,
}

impl ServerMetrics {
    /// Render everything in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.http_requests.render("sysguard_http_requests_total", &mut out);
        self.ws_sessions_active.render("sysguard_ws_sessions_active", &mut out);
        self.ws_frames_sent.render("sysguard_ws_frames_sent_total", &mut out);
        self.ws_rejected.render("sysguard_ws_rejected_total", &mut out);
        self.plugin_fetch_errors.render("sysguard_plugin_fetch_errors_total", &mut out);
        self.plugin_fetch_duration.render("sysguard_plugin_fetch_duration_micros", &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_order_insensitive() {
        let c = CounterVec::default();
        c.inc(&[("route", "health"), ("status", "200")]);
        c.inc(&[("status", "200"), ("route", "health")]);
        assert_eq!(c.get(&[("route", "health"), ("status", "200")]), 2);
        assert_eq!(c.get(&[("route", "index")]), 0);
    }

    #[test]
    fn render_includes_every_family() {
        let m = ServerMetrics::default();
        m.http_requests.inc(&[("route", "health")]);
        m.ws_sessions_active.inc();
        m.plugin_fetch_duration.observe(Duration::from_micros(250));
        let out = m.render();
        assert!(out.contains("sysguard_http_requests_total{route=\"health\"} 1"));
        assert!(out.contains("sysguard_ws_sessions_active 1"));
        assert!(out.contains("sysguard_plugin_fetch_duration_micros_bucket{le=\"500\"} 1"));
        assert!(out.contains("sysguard_plugin_fetch_duration_micros_bucket{le=\"100\"} 0"));
    }
}
