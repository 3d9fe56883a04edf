//! CLI command implementations

pub(crate) mod ask;
pub(crate) mod common;
pub(crate) mod guard;
pub(crate) mod serve;
