//! Entry point for the `stvd` gateway binary.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> { stvd::server::run().await }
