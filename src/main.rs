use mechasynth::audio::{AudioBackend, CpalBackend};
use mechasynth::runtime::{ParamId, ParameterStore, RuntimeStatus};
use mechasynth::synth::EngineKind;
use std::error::Error;
use std::io::BufRead;
use std::sync::Arc;

fn print_parameters(params: &ParameterStore) {
    for id in ParamId::ALL {
        let info = id.info();
        println!(
            "{:<28} {:>9.3}   [{} .. {}]  {}",
            info.id,
            params.get(id),
            info.min,
            info.max,
            info.name
        );
    }
}

fn print_status(status: &RuntimeStatus) {
    println!("callback load: {:.1}%", status.callback_load() * 100.0);
    for kind in EngineKind::ALL {
        println!(
            "{:<10} load {:.2}%  memory {} bytes",
            kind.name(),
            status.engine_load(kind) * 100.0,
            status.engine_memory(kind)
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let params = Arc::new(ParameterStore::new());
    let status = Arc::new(RuntimeStatus::new());

    let mut audio_backend = CpalBackend::new(params.clone(), status.clone());
    audio_backend.start()?;

    println!("enter `<parameter> <value>`, `params`, `status` or `quit`");
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (None, _) => continue,
            (Some("quit" | "exit"), _) => break,
            (Some("params"), None) => print_parameters(&params),
            (Some("status"), None) => print_status(&status),
            (Some(name), Some(value)) => match params.set_by_name(name, value) {
                Ok(id) => log::info!(target: "runtime", "{} = {}", id.info().id, params.get(id)),
                Err(err) => log::warn!(target: "runtime", "{}", err),
            },
            (Some(other), None) => log::warn!(target: "runtime", "missing value for '{}'", other),
        }
    }

    audio_backend.stop()?;
    Ok(())
}
