/// Decoder turning raw `key=value` lines into log entries
pub mod line_decoder;

/// Pull-based followers of the access log
pub mod log_tail;

pub use line_decoder::decode_line;
pub use log_tail::{FileTail, LineSource, MemorySource, SourcePoll};
