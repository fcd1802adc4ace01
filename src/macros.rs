//! Tracing for the tokenizer and the renderer, compiled out unless the
//! `html_trace` feature is enabled.

#[cfg(not(feature = "html_trace"))]
#[inline(always)]
pub fn nop() {}

/// Trace a renderer event. With `html_trace_bt` the caller's backtrace is
/// appended.
#[cfg(feature = "html_trace_bt")]
macro_rules! html_trace {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        ::log::trace!(concat!($fmt, " at {:?}"), $($args,)* ::backtrace::Backtrace::new())
    };
}
#[cfg(all(feature = "html_trace", not(feature = "html_trace_bt")))]
macro_rules! html_trace {
    ($($arg:tt)*) => {
        ::log::trace!($($arg)*)
    };
}
#[cfg(not(feature = "html_trace"))]
macro_rules! html_trace {
    ($($arg:tt)*) => {
        $crate::macros::nop()
    };
}

/// Trace a tokenizer event; never with a backtrace, these are frequent.
#[cfg(feature = "html_trace")]
macro_rules! html_trace_quiet {
    ($($arg:tt)*) => {
        ::log::trace!($($arg)*)
    };
}
#[cfg(not(feature = "html_trace"))]
macro_rules! html_trace_quiet {
    ($($arg:tt)*) => {
        $crate::macros::nop()
    };
}
