use anyhow::{bail, Context, Result};
use peakview::{
    about,
    catalog::{DatasetCatalog, GeneReferenceTable},
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    controller::Controller,
    page::Page,
    session::{Event, Outcome, Session},
    templates::HtmlTemplates,
    transport::{HttpTransport, ReplayTransport, Transport},
    DATASETS, GENE_REFERENCES,
};
use serde::Serialize;
use std::{env, fs, path::Path, time::Duration};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct SessionSummary {
    calls: usize,
    outcomes: Vec<String>,
    page: Page,
}

#[derive(Default)]
struct GlobalArgs {
    config: Option<String>,
    server: Option<String>,
    replay: Option<String>,
    datasets: Option<String>,
    genes: Option<String>,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  peakview_cli --version\n  \
  peakview_cli [OPTIONS] datasets\n  \
  peakview_cli [OPTIONS] session '<events-json>'\n  \
  peakview_cli [OPTIONS] render-svg '<events-json>' OUTPUT_DIR\n\n  \
  Options:\n    \
  --config PATH     settings file (default {DEFAULT_CONFIG_PATH})\n    \
  --server URL      data server, overrides the configured one\n    \
  --replay PATH     answer remote calls from a replay script instead\n    \
  --datasets PATH   dataset catalog JSON\n    \
  --genes PATH      gene-reference JSON\n\n  \
  Tip: pass @file.json instead of inline JSON"
    );
}

fn init_tracing() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_json_arg(value: &str) -> Result<String> {
    if let Some(path) = value.strip_prefix('@') {
        fs::read_to_string(path).with_context(|| format!("Could not read JSON file '{path}'"))
    } else {
        Ok(value.to_string())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text =
        serde_json::to_string_pretty(value).context("Could not serialize JSON output")?;
    println!("{text}");
    Ok(())
}

/// Splits leading `--flag VALUE` pairs off `args`; returns the index of the
/// command.
fn parse_global_args(args: &[String]) -> Result<(GlobalArgs, usize)> {
    let mut globals = GlobalArgs::default();
    let mut idx = 1;
    while idx < args.len() && args[idx].starts_with("--") {
        let Some(value) = args.get(idx + 1).cloned() else {
            bail!("Missing value for {}", args[idx]);
        };
        match args[idx].as_str() {
            "--config" => globals.config = Some(value),
            "--server" => globals.server = Some(value),
            "--replay" => globals.replay = Some(value),
            "--datasets" => globals.datasets = Some(value),
            "--genes" => globals.genes = Some(value),
            other => bail!("Unknown option {other}"),
        }
        idx += 2;
    }
    if globals.server.is_some() && globals.replay.is_some() {
        bail!("--server and --replay are mutually exclusive");
    }
    Ok((globals, idx))
}

fn build_controller(globals: &GlobalArgs) -> Result<Controller> {
    let mut config = match &globals.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::load_or_default(DEFAULT_CONFIG_PATH)?,
    };
    if let Some(server) = &globals.server {
        config.server_url = server.clone();
    }
    let catalog = match &globals.datasets {
        Some(path) => DatasetCatalog::from_json_file(path)?,
        None => DATASETS.clone(),
    };
    let genes = match &globals.genes {
        Some(path) => GeneReferenceTable::from_json_file(path)?,
        None => GENE_REFERENCES.clone(),
    };
    Ok(Controller::new(config, catalog, genes)?)
}

fn play<C: Transport>(
    controller: Controller,
    transport: C,
    events: Vec<Event>,
) -> Result<(Session<C, HtmlTemplates>, Vec<Outcome>)> {
    let mut session = Session::new(controller, transport);
    let outcomes = session.run(events)?;
    Ok((session, outcomes))
}

fn run_events<F, R>(globals: &GlobalArgs, events_arg: &str, finish: F) -> Result<R>
where
    F: FnOnce(&Controller, usize, &[Outcome]) -> Result<R>,
{
    let events: Vec<Event> = serde_json::from_str(&load_json_arg(events_arg)?)
        .context("Could not parse event list")?;
    let controller = build_controller(globals)?;
    match &globals.replay {
        Some(path) => {
            let transport = ReplayTransport::from_json_file(path)?;
            let (session, outcomes) = play(controller, transport, events)?;
            finish(session.controller(), session.calls(), &outcomes)
        }
        None => {
            let config = controller.config();
            let transport = HttpTransport::new(
                &config.server_url,
                Duration::from_secs(config.request_timeout_secs),
            )?;
            let (session, outcomes) = play(controller, transport, events)?;
            finish(session.controller(), session.calls(), &outcomes)
        }
    }
}

fn write_charts(dir: &Path, prefix: &str, named: Vec<(&str, &String)>) -> Result<usize> {
    for (dataset, svg) in &named {
        let path = dir.join(format!("{prefix}_{dataset}.svg"));
        fs::write(&path, svg.as_bytes())
            .with_context(|| format!("Could not write '{}'", path.display()))?;
    }
    Ok(named.len())
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        bail!("Missing command");
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let (globals, cmd_idx) = parse_global_args(&args)?;
    let Some(command) = args.get(cmd_idx) else {
        usage();
        bail!("Missing command");
    };

    match command.as_str() {
        "datasets" => {
            let controller = build_controller(&globals)?;
            print_json(&controller.catalog().iter().collect::<Vec<_>>())
        }
        "session" => {
            let Some(events) = args.get(cmd_idx + 1) else {
                usage();
                bail!("Missing events for session");
            };
            let summary = run_events(&globals, events, |controller, calls, outcomes| {
                Ok(SessionSummary {
                    calls,
                    outcomes: outcomes.iter().map(|o| format!("{o:?}")).collect(),
                    page: controller.page().clone(),
                })
            })?;
            print_json(&summary)
        }
        "render-svg" => {
            let (Some(events), Some(dir)) = (args.get(cmd_idx + 1), args.get(cmd_idx + 2)) else {
                usage();
                bail!("render-svg needs events and an output directory");
            };
            let dir = Path::new(dir);
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create '{}'", dir.display()))?;
            let written = run_events(&globals, events, |controller, _, _| {
                let Some(view) = controller.plot_view() else {
                    bail!("The events did not produce a plot");
                };
                let peaks = view
                    .scene
                    .peak_charts
                    .iter()
                    .map(|c| c.dataset.as_str())
                    .zip(view.peak_svgs.iter())
                    .collect();
                let tracks = view
                    .scene
                    .track_charts
                    .iter()
                    .map(|c| c.dataset.as_str())
                    .zip(view.track_svgs.iter())
                    .collect();
                Ok(write_charts(dir, "peak", peaks)? + write_charts(dir, "track", tracks)?)
            })?;
            println!("Wrote {written} charts to '{}'", dir.display());
            Ok(())
        }
        other => {
            usage();
            bail!("Unknown command '{other}'")
        }
    }
}
