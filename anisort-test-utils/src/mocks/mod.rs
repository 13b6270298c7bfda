//! Mock implementations for testing

mod collaborators;
mod transport;

pub use collaborators::{RecordingProgress, StaticPathBuilder, StaticProber};
pub use transport::{MockTransport, SentDatagram};
