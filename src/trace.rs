//! Logging shims over `tracing`.
//!
//! Pipeline stages open spans and emit measurement events; runtime loops log
//! free-form messages. Without the `tracing` feature every macro expands to
//! code that only type-checks its arguments.

/// Info span around one pipeline stage; a `NoopSpan` without the feature.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Info event carrying stage counters as `key = value` fields.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

/// Free-form operational messages for the runtime loops.
///
/// These forward to `tracing::{info, warn, debug}` with the usual format
/// arguments; without the feature the arguments are only type-checked.
#[cfg(feature = "tracing")]
macro_rules! log_info {
    ($($arg:tt)+) => {
        tracing::info!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_info {
    ($($arg:tt)+) => {
        let _ = format_args!($($arg)+);
    };
}

#[cfg(feature = "tracing")]
macro_rules! log_warn {
    ($($arg:tt)+) => {
        tracing::warn!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_warn {
    ($($arg:tt)+) => {
        let _ = format_args!($($arg)+);
    };
}

#[cfg(feature = "tracing")]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        tracing::debug!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        let _ = format_args!($($arg)+);
    };
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_warn;
pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in for `tracing::Span` so `trace_span!(..).entered()` compiles
/// without the feature.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
