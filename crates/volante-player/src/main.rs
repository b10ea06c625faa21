//! Volante player - opens the engine window and runs the main loop.

mod config;

use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use volante_engine::logging::{init_logging, LoggingConfig};
use volante_engine::{Engine, HeadlessPlatform, Platform, WinitPlatform};

use config::{Cli, PlayerConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(match cli.log.as_deref() {
        Some(filter) => LoggingConfig::with_filter(filter),
        None => LoggingConfig::default(),
    });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = PlayerConfig::from_cli(cli)?;
    log::debug!("startup config: {config:?}");

    let platform: Rc<dyn Platform> = if config.headless {
        Rc::new(HeadlessPlatform::new())
    } else {
        Rc::new(WinitPlatform::new()?)
    };

    let mut engine = Engine::new(platform)?;
    engine.initialize(&config.engine)?;

    match config.frames {
        Some(limit) => {
            let ran = engine.run_frames(limit)?;
            log::info!("ran {ran} of at most {limit} frames");
        }
        None => engine.run()?,
    }

    engine.shutdown();
    Ok(())
}
