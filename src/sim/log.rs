//! The simulator's diagnostic side channel.
//!
//! The simulator reports recoverable problems (lines that fail to parse, files that cannot be read)
//! as plain text messages through a [`Logger`].
//!
//! A `Logger` forwards each message to an optional sink callback
//! and additionally emits it as a [`tracing`] event under the `mips_stepper` target.
//! Not having a sink never changes how the simulator behaves.
//!
//! ```
//! use mips_stepper::sim::log::Logger;
//!
//! let (logger, rx) = Logger::channel();
//! logger.log(format_args!("hello {}", 1));
//! assert_eq!(rx.try_recv().unwrap(), "hello 1");
//! ```
use std::sync::Arc;

use crossbeam_channel as cbc;

type Sink = Arc<dyn Fn(&str) + Send + Sync>;

/// A cloneable handle to a log sink.
#[derive(Clone, Default)]
pub struct Logger {
    sink: Option<Sink>
}
impl Logger {
    /// Creates a logger with no sink.
    ///
    /// Messages are only emitted as `tracing` events.
    pub fn new() -> Self {
        Self { sink: None }
    }

    /// Creates a logger which forwards every message to the given callback.
    pub fn with_sink(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self { sink: Some(Arc::new(sink)) }
    }

    /// Creates a logger which forwards every message into a channel.
    ///
    /// The channel is unbounded, so logging never blocks.
    /// If the receiver is dropped, messages are silently discarded.
    pub fn channel() -> (Self, cbc::Receiver<String>) {
        let (tx, rx) = cbc::unbounded();
        let logger = Self::with_sink(move |msg| {
            let _ = tx.send(msg.to_string());
        });
        (logger, rx)
    }

    /// Checks whether this logger has a sink.
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Logs a message.
    pub fn log(&self, args: std::fmt::Arguments<'_>) {
        let msg = args.to_string();
        tracing::info!(target: "mips_stepper", "{msg}");
        if let Some(sink) = &self.sink {
            sink(&msg);
        }
    }
}
impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("sink", &self.sink.as_ref().map(|_| ".."))
            .finish()
    }
}
