//! Logging abstractions injected into core components

mod memory;
mod noop;
mod traits;
mod tracing_logger;

pub use memory::MemoryLogger;
pub use noop::{noop, NoOpLogger};
pub use traits::{Logger, SharedLogger};
pub use tracing_logger::TracingLogger;
