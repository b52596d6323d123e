mod config;
mod sink;

use anyhow::{Context, Result};
use config::{parse_args, Command, Config, USAGE};
use henon_core::compute::{compute, Output};
use henon_core::hamiltonian::EnergyStats;
use log::{error, info};
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            print!("{USAGE}");
            return Ok(());
        }
        Command::Run(config) => config,
    };

    let settings = config.settings();
    info!(
        "Running mode {:?} with h = {}, t = [{}, {}], H0 = {}.",
        config.mode, settings.h, settings.t0, settings.t_end, settings.energy
    );

    let started = Instant::now();
    let output = compute(&settings, config.mode).context("Computation failed")?;
    info!("Computation finished in {:.3?}.", started.elapsed());

    summarize(&output);
    persist(&config, &output)
}

fn summarize(output: &Output) {
    if let Some(table) = &output.hamiltonians {
        for series in table.columns() {
            if let Some(EnergyStats {
                initial,
                max_deviation,
                max_drift,
                drift_rate,
                ..
            }) = series.stats()
            {
                info!(
                    "{}: H0 = {initial:.10}, max deviation {max_deviation:.3e}, max drift {max_drift:.3e}, drift rate {drift_rate:.3e} per sample.",
                    series.method()
                );
            }
        }
    }
    if let Some(sections) = &output.sections {
        for section in sections {
            info!("{}: {} Poincaré points.", section.method(), section.len());
        }
    }
}

fn persist(config: &Config, output: &Output) -> Result<()> {
    if config.no_output {
        info!("Output disabled; nothing written.");
        return Ok(());
    }
    sink::write_output(output, &config.output_dir)?;
    Ok(())
}
