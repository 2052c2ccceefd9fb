//! Command handlers grouped by concern.

pub(crate) mod matrix;
pub(crate) mod watch;
