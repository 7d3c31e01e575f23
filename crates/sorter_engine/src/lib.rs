//! Sorter engine: network IO and timers for the receipt-sorting client.
//!
//! Callers drive it through an [`EngineHandle`] and hear back through an
//! [`EventSink`]. Everything async runs on a runtime owned by the engine thread.
mod artifact;
mod backoff;
mod engine;
mod error;
mod filename;
mod persist;
mod settings;
mod sink;
mod sse;
mod stream;
mod submit;
mod transport;
mod types;

pub use artifact::{ArtifactFetcher, ReqwestArtifactFetcher};
pub use backoff::ReconnectPolicy;
pub use engine::{EngineHandle, EngineServices};
pub use error::{EngineError, RetrievalError, StreamError, SubmissionError};
pub use filename::{artifact_filename, disposition_filename, sanitize_filename};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use settings::ClientSettings;
pub use sink::{ChannelEventSink, EventSink};
pub use sse::SseDecoder;
pub use stream::{StreamManager, STREAM_END_SENTINEL};
pub use submit::{JobSubmitter, ReqwestSubmitter, UPLOAD_FIELD};
pub use transport::{EventTransport, LineStream, SseTransport};
pub use types::{EngineEvent, JobId, JobTicket, SavedArtifact, StreamEvent};
