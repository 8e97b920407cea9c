//! Fan-out of engine stdout to at most one consumer.
//!
//! One reader task owns the engine's stdout for the lifetime of the
//! process. Each line gets a sequence number and goes to the current
//! [`LineSubscription`], or is logged and dropped when nobody subscribed.
//! Dropping a subscription unregisters it, so a waiter that timed out never
//! leaves the reader publishing into a channel nobody drains.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{UsiError, UsiResult};

/// Lines buffered between the reader and a slow subscriber.
const CHANNEL_CAPACITY: usize = 64;

/// One line of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLine {
    /// Arrival order, starting at 1.
    pub seq: u64,
    pub text: String,
}

struct Slot {
    id: u64,
    tx: mpsc::Sender<EngineLine>,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Option<Slot>>,
    closed: AtomicBool,
    next_id: AtomicU64,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, Option<Slot>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, id: u64) {
        let mut slot = self.slot();
        if slot.as_ref().map(|s| s.id) == Some(id) {
            *slot = None;
        }
    }
}

/// Handle to the reader task of one engine.
#[derive(Clone)]
pub struct LineRouter {
    engine: Arc<str>,
    shared: Arc<Shared>,
}

impl LineRouter {
    /// Start reading `output` in a background task.
    pub fn spawn<R>(engine: &str, output: R) -> (Self, JoinHandle<()>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let router = Self {
            engine: Arc::from(engine),
            shared: Arc::new(Shared::default()),
        };
        let task = tokio::spawn(read_lines(
            router.engine.clone(),
            router.shared.clone(),
            output,
        ));
        (router, task)
    }

    /// Register as the consumer of subsequent lines.
    ///
    /// Fails with [`UsiError::OutputBusy`] while another subscription is
    /// alive. After end of stream the returned subscription yields nothing.
    pub fn subscribe(&self) -> UsiResult<LineSubscription> {
        let mut slot = self.shared.slot();
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        if !self.shared.closed.load(Ordering::SeqCst) {
            if let Some(existing) = slot.as_ref() {
                if !existing.tx.is_closed() {
                    return Err(UsiError::OutputBusy);
                }
            }
            *slot = Some(Slot { id, tx });
        }

        debug!(engine = %self.engine, subscriber = id, "output subscriber registered");
        Ok(LineSubscription {
            id,
            rx,
            shared: self.shared.clone(),
        })
    }

    /// Whether the engine's stdout has ended.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

/// The single active consumer of engine output.
pub struct LineSubscription {
    id: u64,
    rx: mpsc::Receiver<EngineLine>,
    shared: Arc<Shared>,
}

impl LineSubscription {
    /// Next line, or `None` once the engine's stdout has ended.
    pub async fn recv(&mut self) -> Option<EngineLine> {
        self.rx.recv().await
    }
}

impl Drop for LineSubscription {
    fn drop(&mut self) {
        self.shared.release(self.id);
    }
}

fn decode(raw: &[u8]) -> String {
    let mut end = raw.len();
    while end > 0 && matches!(raw[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

async fn read_lines<R>(engine: Arc<str>, shared: Arc<Shared>, output: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(output);
    let mut buf = Vec::new();
    let mut seq = 0u64;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                debug!(engine = %engine, lines = seq, "engine output closed");
                break;
            }
            Ok(_) => {
                seq += 1;
                deliver(
                    &engine,
                    &shared,
                    EngineLine {
                        seq,
                        text: decode(&buf),
                    },
                )
                .await;
            }
            Err(e) => {
                warn!(engine = %engine, error = %e, "failed reading engine output");
                break;
            }
        }
    }

    let mut slot = shared.slot();
    shared.closed.store(true, Ordering::SeqCst);
    // Dropping the sender ends the active subscription.
    slot.take();
}

async fn deliver(engine: &str, shared: &Shared, line: EngineLine) {
    let target = shared.slot().as_ref().map(|s| (s.id, s.tx.clone()));
    let Some((id, tx)) = target else {
        debug!(engine = %engine, seq = line.seq, line = %line.text, "engine output (unclaimed)");
        return;
    };

    debug!(engine = %engine, seq = line.seq, line = %line.text, "engine output");
    if let Err(mpsc::error::SendError(line)) = tx.send(line).await {
        shared.release(id);
        debug!(engine = %engine, seq = line.seq, "subscriber went away, line dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn delivers_lines_in_order_with_sequence() {
        let (mut engine_out, reader_end) = tokio::io::duplex(256);
        let (router, _task) = LineRouter::spawn("test", reader_end);
        let mut sub = router.subscribe().unwrap();

        engine_out.write_all(b"id name Fake\r\nusiok\n").await.unwrap();

        let first = sub.recv().await.unwrap();
        assert_eq!(first.text, "id name Fake");
        let second = sub.recv().await.unwrap();
        assert_eq!(second.text, "usiok");
        assert!(second.seq > first.seq);
    }

    #[tokio::test]
    async fn second_subscriber_is_rejected_until_first_drops() {
        let (_engine_out, reader_end) = tokio::io::duplex(64);
        let (router, _task) = LineRouter::spawn("test", reader_end);

        let first = router.subscribe().unwrap();
        assert!(matches!(router.subscribe(), Err(UsiError::OutputBusy)));
        drop(first);
        assert!(router.subscribe().is_ok());
    }

    #[tokio::test]
    async fn end_of_stream_closes_subscription() {
        let (engine_out, reader_end) = tokio::io::duplex(64);
        let (router, task) = LineRouter::spawn("test", reader_end);
        let mut sub = router.subscribe().unwrap();

        drop(engine_out);
        assert_eq!(sub.recv().await, None);
        task.await.unwrap();
        assert!(router.is_closed());

        let mut late = router.subscribe().unwrap();
        assert_eq!(late.recv().await, None);
    }

    #[tokio::test]
    async fn unclaimed_lines_are_dropped_not_queued() {
        let (mut engine_out, reader_end) = tokio::io::duplex(256);
        let (router, _task) = LineRouter::spawn("test", reader_end);

        engine_out.write_all(b"info string warming up\n").await.unwrap();
        // Let the reader consume the unclaimed line.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let mut sub = router.subscribe().unwrap();
        engine_out.write_all(b"readyok\n").await.unwrap();
        assert_eq!(sub.recv().await.unwrap().text, "readyok");
    }

    #[test]
    fn decode_strips_line_endings_and_replaces_invalid_utf8() {
        assert_eq!(decode(b"usiok\r\n"), "usiok");
        assert_eq!(decode(b"id name \xff\n"), "id name \u{fffd}");
        assert_eq!(decode(b""), "");
    }
}
