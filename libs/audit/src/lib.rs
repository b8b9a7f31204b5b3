//! Concrete `AuditSink` implementations. The core never picks one for you —
//! a binary wires up whichever it needs (typically the file sink in
//! production, the in-memory sink in tests).

mod file_sink;
mod memory_sink;

pub use file_sink::JsonLinesAuditSink;
pub use memory_sink::InMemoryAuditSink;
