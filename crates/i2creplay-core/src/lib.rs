//! Core plumbing: sample sources, trace text encoding, trace emission and
//! the replay loop.

pub mod emitter;
pub mod encoding;
pub mod error;
pub mod replay;
pub mod sample;
pub mod serial_service;
pub mod source;

pub use emitter::{label, OutputFormat, TraceEmitter, ValueRadix};
pub use encoding::TextEncoding;
pub use error::{ReplayError, Result};
pub use replay::run;
pub use sample::{Line, Sample};
pub use serial_service::{SerialConfig, SerialEvent, SerialService};
pub use source::{LineSource, ReaderSource};
