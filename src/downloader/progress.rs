// Progress reporting across the worker/display boundary
//
// Workers push events into an unbounded channel and the display side drains
// it on its own context. A closed receiver means nobody is watching anymore;
// the download keeps running and the event is dropped.

use tokio::sync::mpsc;
use tracing::debug;

use super::models::ProgressEvent;

/// Sending half handed to providers and extractors.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressSink {
    /// Build a sink plus the receiver the display loop drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, percent: f32, status: impl Into<String>) {
        let event = ProgressEvent::new(percent, status);
        debug!(percent = event.percent, status = %event.status, "progress");
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitted_events_arrive_in_order() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.emit(0.0, "starting");
        sink.emit(100.0, "done");

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.percent, 0.0);
        assert_eq!(first.status, "starting");
        assert_eq!(second.percent, 100.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn emit_survives_a_dropped_receiver() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.emit(50.0, "nobody listening");
    }
}
