//! Background workers that run alongside the HTTP server.

mod sweeper;

pub use sweeper::{DownloadSweeper, SweepStats};
