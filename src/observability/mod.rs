//! Observability: structured logging and service counters

pub mod logging;
pub mod metrics;

// Re-export for convenience
pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{MetricsCollector, MetricsSnapshot};

// Span macros for structured logging
pub use logging::{expression_span, task_span};
