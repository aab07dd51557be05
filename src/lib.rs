//! Demo battle, replay stage and session commands built on the retrace
//! crates.

pub mod app;
pub mod model;

pub use retrace_core as core;
pub use retrace_data as data;
pub use retrace_io as io;
