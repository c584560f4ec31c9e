//! `skycast` command-line front end.
//!
//! Drives the weather widget core with events built from the command line
//! and prints what the widget renders.

use clap::Parser;
use skycast_core::AppError;

mod cli;
mod terminal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skycast_core::init()?;

    let cmd = cli::Cli::parse();
    match cmd.run().await {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast::<AppError>() {
            Ok(app) => {
                tracing::debug!("{}", app);
                anyhow::bail!("{}", app.user_message())
            }
            Err(other) => Err(other),
        },
    }
}
