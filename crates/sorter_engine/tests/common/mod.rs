#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use futures_util::stream::{self, StreamExt};
use sorter_engine::{EngineEvent, EventSink, EventTransport, LineStream, StreamError};
use tokio::sync::mpsc;
use tokio::time::Instant;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(sorter_logging::initialize_for_tests);
}

/// Forwards engine events into a tokio channel the test can await on.
pub struct TestSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl TestSink {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// What one connection attempt does.
#[derive(Debug, Clone)]
pub enum Script {
    /// Connecting fails outright.
    Refuse(StreamError),
    /// Connects, yields these payloads, then the connection drops.
    Lines(Vec<&'static str>),
    /// Connects, yields these payloads, then stays open forever.
    LinesThenHang(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRecord {
    pub job_id: String,
    pub at: Instant,
}

/// In-memory transport that plays back one [`Script`] per connect call.
/// Once the scripts run out every connection hangs.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    connects: Mutex<Vec<ConnectRecord>>,
}

impl ScriptedTransport {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            connects: Mutex::new(Vec::new()),
        })
    }

    pub fn connects(&self) -> Vec<ConnectRecord> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EventTransport for ScriptedTransport {
    async fn connect(&self, job_id: &str) -> Result<LineStream, StreamError> {
        self.connects.lock().unwrap().push(ConnectRecord {
            job_id: job_id.to_string(),
            at: Instant::now(),
        });
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Refuse(err)) => Err(err),
            Some(Script::Lines(lines)) => {
                Ok(stream::iter(lines.into_iter().map(|line| Ok(line.to_string()))).boxed())
            }
            Some(Script::LinesThenHang(lines)) => Ok(stream::iter(
                lines.into_iter().map(|line| Ok(line.to_string())),
            )
            .chain(stream::pending())
            .boxed()),
            None => Ok(stream::pending().boxed()),
        }
    }
}
