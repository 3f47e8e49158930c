//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`ServiceEvent`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [message] kind=process_started integer=4242 object="aria2c --enable-rpc"
//! [message] kind=process_info integer=0 object="Download complete: /tmp/file.iso"
//! [message] kind=monitor_update integer=4242
//! [status] running=true
//! [message] kind=process_terminated integer=0
//! ```

use async_trait::async_trait;

use crate::events::ServiceEvent;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter {
    /// Print monitor samples too (off by default, they arrive every interval).
    pub verbose: bool,
}

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Renders one event; `None` when the event is filtered out.
pub(crate) fn render(e: &ServiceEvent, verbose: bool) -> Option<String> {
    match e {
        ServiceEvent::Status(s) => Some(format!("[status] running={}", s.running)),
        ServiceEvent::Message(m) if m.kind == crate::MessageKind::MonitorUpdate && !verbose => None,
        ServiceEvent::Message(m) => Some(match (&m.object, m.kind) {
            (Some(obj), crate::MessageKind::MonitorUpdate) => {
                format!("[message] kind={} integer={} sample={obj}", m.kind, m.integer)
            }
            (Some(obj), _) => format!("[message] kind={} integer={} object={obj}", m.kind, m.integer),
            (None, _) => format!("[message] kind={} integer={}", m.kind, m.integer),
        }),
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &ServiceEvent) {
        if let Some(line) = render(e, self.verbose) {
            println!("{line}");
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Message, MessageEvent, StatusEvent};

    #[test]
    fn renders_messages_and_status() {
        let started = ServiceEvent::Message(MessageEvent::from(&Message::process_started(
            7,
            "aria2c",
        )));
        assert_eq!(
            render(&started, false).unwrap(),
            "[message] kind=process_started integer=7 object=\"aria2c\""
        );
        assert_eq!(
            render(&ServiceEvent::Status(StatusEvent { running: false }), false).unwrap(),
            "[status] running=false"
        );
    }

    #[test]
    fn monitor_samples_only_when_verbose() {
        let sample = ServiceEvent::Message(MessageEvent::from(&Message::monitor_update(
            crate::MonitorSample::new(7, 1.0, "8"),
        )));
        assert!(render(&sample, false).is_none());
        assert!(render(&sample, true).unwrap().starts_with("[message] kind=monitor_update"));
    }
}
