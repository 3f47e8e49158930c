//! # Relay of worker messages.
//!
//! [`EventDispatcher`] is the [`MessageListener`] the service registers on the worker.
//! For every envelope, on the worker's context:
//!
//! ```text
//! on_message(msg)
//!   ├─► Bus<MessageEvent>::publish(kind, integer, object?)   (always)
//!   ├─► LogSink::append(msg.to_log_line(version))            (not for MonitorUpdate)
//!   └─► MonitorAggregator::update(sample)                    (only MonitorUpdate)
//! ```
//!
//! ## Rules
//! - Total: never fails, never panics on bad input.
//! - No reordering or batching: envelopes leave in arrival order.
//! - Monitor samples stay out of the log sink to bound log volume.

use std::sync::Arc;

use tracing::warn;

use super::log::LogSink;
use super::monitor::MonitorAggregator;
use crate::events::{Bus, Message, MessageEvent};
use crate::worker::MessageListener;

/// Forwards worker messages to the detailed stream, the log sink and the aggregator.
pub struct EventDispatcher {
    bus: Bus<MessageEvent>,
    log: Arc<dyn LogSink>,
    monitor: Arc<MonitorAggregator>,
    version: Arc<str>,
}

impl EventDispatcher {
    pub fn new(
        bus: Bus<MessageEvent>,
        log: Arc<dyn LogSink>,
        monitor: Arc<MonitorAggregator>,
        version: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            bus,
            log,
            monitor,
            version: version.into(),
        }
    }
}

impl MessageListener for EventDispatcher {
    fn on_message(&self, msg: &Message) {
        self.bus.publish(MessageEvent::from(msg));

        if !msg.is_monitor_update() {
            self.log.append(msg.log_level(), msg.to_log_line(&self.version));
            return;
        }

        if let Err(e) = self.monitor.update(msg.sample()) {
            warn!(error = %e, label = e.as_label(), "monitor sample dropped");
        }
    }

    fn name(&self) -> &'static str {
        "EventDispatcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NotificationConfig, StartClock};
    use crate::events::{MessageKind, MonitorSample};
    use crate::presentation::Presenter;
    use crate::testing::{RecordingLog, RecordingPresenter, provider};
    use tracing::Level;

    struct Fixture {
        dispatcher: EventDispatcher,
        bus: Bus<MessageEvent>,
        log: Arc<RecordingLog>,
        monitor: Arc<MonitorAggregator>,
        presenter: Arc<RecordingPresenter>,
    }

    fn fixture() -> Fixture {
        let bus = Bus::new(256);
        let log = Arc::new(RecordingLog::default());
        let presenter = Arc::new(RecordingPresenter::default());
        let p: Arc<dyn Presenter> = presenter.clone();
        let monitor = Arc::new(MonitorAggregator::new(
            Some(p),
            NotificationConfig::default().template(provider().as_ref()),
            "ic_launcher",
            Arc::new(StartClock::new()),
        ));
        let l: Arc<dyn LogSink> = log.clone();
        Fixture {
            dispatcher: EventDispatcher::new(bus.clone(), l, Arc::clone(&monitor), "engine 1.0"),
            bus,
            log,
            monitor,
            presenter,
        }
    }

    #[tokio::test]
    async fn regular_message_is_logged_and_broadcast_once() {
        let f = fixture();
        let mut rx = f.bus.subscribe();

        f.dispatcher.on_message(&Message::warn("slow peer"));

        assert_eq!(
            f.log.lines(),
            vec![(Level::WARN, "engine 1.0: slow peer".to_string())]
        );
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, MessageKind::ProcessWarn);
        assert_eq!(ev.object, Some(serde_json::Value::String("slow peer".into())));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_payload_is_still_forwarded() {
        let f = fixture();
        let mut rx = f.bus.subscribe();

        f.dispatcher.on_message(&Message::process_terminated(7));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, MessageKind::ProcessTerminated);
        assert_eq!(ev.integer, 7);
        assert_eq!(ev.object, None);
        assert_eq!(f.log.lines().len(), 1);
    }

    #[tokio::test]
    async fn monitor_updates_skip_the_log() {
        let f = fixture();
        let mut rx = f.bus.subscribe();

        for _ in 0..100 {
            f.dispatcher
                .on_message(&Message::monitor_update(MonitorSample::new(1234, 5.0, "2048")));
            let summary = f.monitor.summary().unwrap();
            assert_eq!(summary.pid, 1234);
            assert_eq!(summary.cpu_line(), "CPU: 5%");
            assert_eq!(summary.memory_bytes, 2048 * 1024);
        }

        assert!(f.log.lines().is_empty());
        let mut received = 0;
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.kind, MessageKind::MonitorUpdate);
            received += 1;
        }
        assert_eq!(received, 100);
        assert_eq!(f.presenter.renders().len(), 100);
    }

    #[tokio::test]
    async fn malformed_sample_is_broadcast_but_not_applied() {
        let f = fixture();
        let mut rx = f.bus.subscribe();

        f.dispatcher
            .on_message(&Message::monitor_update(MonitorSample::new(1, 1.0, "??")));
        f.dispatcher.on_message(&Message::info("still flowing"));

        assert_eq!(rx.recv().await.unwrap().kind, MessageKind::MonitorUpdate);
        assert_eq!(rx.recv().await.unwrap().kind, MessageKind::ProcessInfo);
        assert!(f.monitor.summary().is_none());
        assert_eq!(f.log.lines().len(), 1);
    }

    /// Sink that pulls the matching broadcast off the bus while the line is appended.
    struct BroadcastFirst {
        rx: std::sync::Mutex<tokio::sync::broadcast::Receiver<MessageEvent>>,
        seen: std::sync::Mutex<Vec<(MessageKind, String)>>,
    }

    impl LogSink for BroadcastFirst {
        fn append(&self, _level: Level, line: String) {
            let ev = self
                .rx
                .lock()
                .unwrap()
                .try_recv()
                .expect("event must be broadcast before its log line");
            self.seen.lock().unwrap().push((ev.kind, line));
        }
    }

    #[tokio::test]
    async fn broadcast_precedes_log_line() {
        let bus = Bus::new(16);
        let sink = Arc::new(BroadcastFirst {
            rx: std::sync::Mutex::new(bus.subscribe()),
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let monitor = Arc::new(MonitorAggregator::new(
            None,
            NotificationConfig::default().template(provider().as_ref()),
            "ic_launcher",
            Arc::new(StartClock::new()),
        ));
        let l: Arc<dyn LogSink> = sink.clone();
        let dispatcher = EventDispatcher::new(bus, l, monitor, "engine 1.0");

        let msgs = [
            Message::process_started(9, "engine"),
            Message::info("a"),
            Message::warn("b"),
            Message::error("c"),
            Message::monitor_failed("gone"),
            Message::process_terminated(1),
        ];
        for m in &msgs {
            dispatcher.on_message(m);
        }

        let seen = sink.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), msgs.len());
        for (m, (kind, line)) in msgs.iter().zip(&seen) {
            assert_eq!(*kind, m.kind());
            assert_eq!(*line, m.to_log_line("engine 1.0"));
        }
        assert!(sink.rx.lock().unwrap().try_recv().is_err());
    }

    #[tokio::test]
    async fn order_is_preserved() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        let msgs = [
            Message::process_started(1, "engine"),
            Message::info("a"),
            Message::monitor_update(MonitorSample::new(1, 0.0, "1")),
            Message::error("b"),
            Message::process_terminated(0),
        ];
        for m in &msgs {
            f.dispatcher.on_message(m);
        }
        for m in &msgs {
            assert_eq!(rx.recv().await.unwrap().kind, m.kind());
        }
    }
}
