//! Binary entry point.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    mcw::run().await
}
