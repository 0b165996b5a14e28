#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

//! Binary entrypoint: loads settings, starts the session and drives it until Ctrl-C.

use ftorrent_app::{AppResult, run_app};

/// Bootstraps the client and blocks until shutdown.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
