use std::process::ExitCode;

use anyhow::Context;
use strata_engine::device::GpuInit;
use strata_engine::logging::{init_logging, LoggingConfig};
use strata_engine::render::{RenderError, RendererConfig};
use strata_engine::scene::Scene;
use strata_engine::window::{Runtime, RuntimeConfig};

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_device_unavailable(&err) => {
            eprintln!();
            eprintln!("  !! Unable to initialize a rendering device.");
            eprintln!("  !! Your GPU or driver may not be supported.");
            eprintln!();
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let scene = Scene::reference().context("failed to build the reference scene")?;
    log::info!("reference scene: {} shapes", scene.len());

    Runtime::run(
        RuntimeConfig {
            title: "strata: painter's algorithm".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        RendererConfig::default(),
        scene,
    )
}

fn is_device_unavailable(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<RenderError>(),
        Some(RenderError::DeviceUnavailable)
    )
}
