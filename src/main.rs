use std::process::ExitCode;

use assign_core::{bind, Arguments};
use assignflow_rust::config::CONFIG;
use assignflow_rust::errors::AppError;
use assignflow_rust::replicates::{run_replicates, sites_table};
use assignflow_rust::declare_assignment;
use log::{error, info};

/// Demo: asignación factorial en dos pasos. `Z1` se bloquea por sitio y
/// `Z2` por el valor realizado de `Z1`.
fn run() -> Result<(), AppError> {
    let cfg = &*CONFIG;
    info!("configuración: {:?}", cfg);

    let args = Arguments::new().label("factorial")
                               .arg("assignment_variable", "[Z1, Z2]")
                               .arg("blocks", "site")
                               .arg_for("Z2", "blocks", "Z1")
                               .arg("prob", "0.5");
    let declaration = declare_assignment(args)?;
    println!("declaración: {}", serde_json::to_string_pretty(&declaration.describe()).unwrap_or_default());

    let step = bind(declaration)?;
    let data = sites_table(cfg.rows)?;
    let summary = run_replicates(&step, &data, cfg.replicates, cfg.seed)?;
    println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
