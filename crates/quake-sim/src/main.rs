use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args as ClapArgs, Parser, Subcommand};
use quake_core::filter::CatalogFilter;
use quake_core::time::{epoch_ms_to_utc_string, parse_utc_to_epoch_ms, utc_now_epoch_ms};
use quake_eval::export::{write_results_csv, write_results_json};
use quake_eval::{
    AccumulatorRegistry, BValueTest, ConditionalRatePlot, CumulativeEventPlot, EvaluationResult,
    EvaluationRun, LikelihoodSpatialTest, MagnitudeHistogram, MagnitudeTest, NumberTest, Progress,
    RunMetadata, SpatialLikelihoodPlot, StreamOutcome,
};
use quake_ingest::{
    load_observed_catalog, load_stochastic_event_sets, synthesize_observed, write_ensemble,
    CatalogSetFormat, ObservedQuery, SynthesisSpec,
};
use quake_report::ReportBuilder;

use config::{load_config, EvalConfig};

mod config;

#[derive(Parser, Debug)]
#[command(name = "quake-sim", about = "Catalog forecast evaluation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a simulated catalog ensemble against the observed record.
    Evaluate(EvaluateArgs),
    /// Generate a synthetic ensemble plus observed catalog for dry runs.
    Synth(SynthArgs),
}

#[derive(ClapArgs, Debug)]
struct EvaluateArgs {
    /// YAML configuration describing the evaluation run.
    #[arg(long)]
    config: PathBuf,
    /// Output directory for figures, results, and the report.
    #[arg(long)]
    out: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct SynthArgs {
    /// Output directory for the generated files.
    #[arg(long)]
    out: PathBuf,
    /// Master seed for the ensemble.
    #[arg(long, default_value_t = 0x5E15_011C)]
    seed: u64,
    /// Number of simulated catalogs.
    #[arg(long, default_value_t = 100)]
    catalogs: usize,
    /// Mean event count per catalog.
    #[arg(long, default_value_t = 40.0)]
    mean_events: f64,
    /// Stream format to write (json-lines or binary).
    #[arg(long, default_value = "binary")]
    format: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Evaluate(args) => run_evaluate(args),
        Command::Synth(args) => run_synth(args),
    }
}

/// Prints streaming progress the way long ensemble runs expect: periodic
/// per-catalog ticks, a stream summary, and one line per finalized test.
struct PrintProgress {
    requested: usize,
    interval: usize,
}

impl Progress for PrintProgress {
    fn on_catalog(&mut self, consumed: usize, _event_count: usize) {
        if self.interval > 0 && consumed % self.interval == 0 {
            eprintln!("  processed {consumed}/{} catalogs", self.requested);
        }
    }

    fn on_stream_complete(&mut self, outcome: &StreamOutcome) {
        println!(
            "Processed {} catalogs in {:.2} seconds",
            outcome.consumed, outcome.elapsed_secs
        );
    }

    fn on_finalized(&mut self, name: &str) {
        println!("Finalizing calculations for {name} and plotting");
    }
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), Box<dyn Error>> {
    let total_start = Instant::now();
    let config = load_config(&args.config)?;

    let origin_epoch_ms = parse_utc_to_epoch_ms(&config.mainshock.origin_time)?;
    let end_epoch_ms = match &config.end_time {
        Some(text) => parse_utc_to_epoch_ms(text)?,
        None => utc_now_epoch_ms(),
    };
    let metadata = RunMetadata::new(origin_epoch_ms, end_epoch_ms, config.n_cat);
    let region = config.region.build(&config.mainshock);

    println!("Loading observed catalog.");
    let query = ObservedQuery {
        start_epoch_ms: origin_epoch_ms,
        end_epoch_ms,
        bounds: config.region.bounds,
        min_magnitude: config.min_magnitude,
    };
    let observed = load_observed_catalog(&config.observed.path, &query)?.filter_spatial(&region);
    println!(
        "Observed catalog: {} events at or above Mw {:.2}",
        observed.event_count(),
        config.min_magnitude
    );

    let registry = build_registry(&config, &region, &metadata)?;
    let mut run = EvaluationRun::new(
        registry,
        CatalogFilter::new(end_epoch_ms, region),
        metadata,
    )?;

    let format = CatalogSetFormat::parse(&config.catalogs.format)?;
    let stream =
        load_stochastic_event_sets(&config.catalogs.path, format, &config.forecast_name)?;
    let mut progress = PrintProgress {
        requested: config.n_cat,
        interval: 100,
    };
    let outcome = run.stream(stream, &mut progress)?;
    if outcome.exhausted {
        eprintln!(
            "warning: ensemble exhausted after {} of {} requested catalogs; \
             statistics use the partial ensemble",
            outcome.consumed, outcome.requested
        );
    }

    let mut output = run.finalize(&observed, &mut progress)?;
    let figure_dir = args.out.join("figures");
    run.render_artifacts(&mut output, &figure_dir, false)?;

    write_results_json(&args.out.join("results.json"), &output)?;
    write_results_csv(&args.out.join("results.csv"), &output.results)?;

    let report_path = build_report(&config, &output, outcome.consumed, &args.out)?;
    println!("Report written to {}", report_path.display());

    let total = total_start.elapsed().as_secs_f64();
    let per_catalog = if outcome.consumed > 0 {
        total / outcome.consumed as f64
    } else {
        0.0
    };
    println!(
        "Completed all processing in {total:.2} seconds ({per_catalog:.4} seconds per catalog)"
    );
    Ok(())
}

/// Default suite order; also the report order.
const DEFAULT_SUITE: [&str; 8] = [
    "n-test", "m-test", "l-test", "cum-plot", "mag-hist", "crd-plot", "bv-test", "like-plot",
];

fn build_registry(
    config: &EvalConfig,
    region: &quake_core::region::GriddedRegion,
    metadata: &RunMetadata,
) -> Result<AccumulatorRegistry, Box<dyn Error>> {
    let enabled: Vec<&str> = if config.tests.is_empty() {
        DEFAULT_SUITE.to_vec()
    } else {
        config.tests.iter().map(String::as_str).collect()
    };
    let has = |name: &str| enabled.iter().any(|&entry| entry == name);

    let mut registry = AccumulatorRegistry::new();
    for &name in &enabled {
        match name {
            "n-test" => registry.register(name, Box::new(NumberTest::new()))?,
            "m-test" => {
                registry.register(name, Box::new(MagnitudeTest::new(config.min_magnitude)))?
            }
            "l-test" => {
                registry.register(name, Box::new(LikelihoodSpatialTest::new(region.clone())))?
            }
            "cum-plot" => registry.register(
                name,
                Box::new(CumulativeEventPlot::new(
                    metadata.origin_epoch_ms,
                    metadata.end_epoch_ms,
                )),
            )?,
            // the shared products accumulate themselves only when their
            // source test is not part of the suite
            "mag-hist" => registry.register(
                name,
                Box::new(MagnitudeHistogram::new(
                    !has("m-test"),
                    config.min_magnitude,
                )),
            )?,
            "crd-plot" => registry.register(
                name,
                Box::new(ConditionalRatePlot::new(!has("l-test"), region.clone())),
            )?,
            "bv-test" => {
                registry.register(name, Box::new(BValueTest::new(config.min_magnitude)))?
            }
            "like-plot" => registry.register(
                name,
                Box::new(SpatialLikelihoodPlot::new(!has("l-test"), region.clone())),
            )?,
            other => {
                return Err(format!("unknown test name in configuration: {other}").into());
            }
        }
    }
    if has("m-test") && has("mag-hist") {
        registry.link_shared("m-test", "mag-hist");
    }
    if has("l-test") && has("crd-plot") {
        registry.link_shared("l-test", "crd-plot");
    }
    if has("l-test") && has("like-plot") {
        registry.link_shared("l-test", "like-plot");
    }
    Ok(registry)
}

fn build_report(
    config: &EvalConfig,
    output: &quake_eval::EvaluationOutput,
    consumed: usize,
    out_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let mut report = ReportBuilder::new(&config.simulation_name);
    report.add_introduction(vec![
        ("simulation_name", config.simulation_name.clone()),
        (
            "origin_time",
            epoch_ms_to_utc_string(output.metadata.origin_epoch_ms),
        ),
        (
            "evaluation_time",
            epoch_ms_to_utc_string(output.metadata.end_epoch_ms),
        ),
        (
            "catalog_source",
            config.observed.path.display().to_string(),
        ),
        ("forecast_name", config.forecast_name.clone()),
        ("num_simulations", consumed.to_string()),
    ]);

    report.add_sub_heading("Visual Overview of Forecast", 1, "");
    add_figures(&mut report, output, "cum-plot", None, "Cumulative Event Counts", out_dir);
    add_figures(&mut report, output, "mag-hist", None, "Magnitude Histogram", out_dir);
    add_figures(
        &mut report,
        output,
        "crd-plot",
        None,
        "Conditional Rate Density with Observations",
        out_dir,
    );
    add_figures(
        &mut report,
        output,
        "like-plot",
        None,
        "Normalized Likelihood Per Event",
        out_dir,
    );

    report.add_sub_heading("Consistency Tests", 1, "");
    add_figures(&mut report, output, "n-test", None, "Number Test", out_dir);
    add_figures(&mut report, output, "m-test", None, "Magnitude Test", out_dir);
    add_figures(&mut report, output, "l-test", Some("s_test"), "Spatial Test", out_dir);
    add_figures(&mut report, output, "l-test", Some("l_test"), "Likelihood Test", out_dir);

    report.add_sub_heading("One-point Statistics", 1, "");
    add_figures(&mut report, output, "bv-test", None, "B-Value Test", out_dir);

    Ok(report.finalize(out_dir)?)
}

/// Adds one test's rendered artifacts to the report, optionally selecting a
/// single figure stem, with paths relative to the report directory.
fn add_figures(
    report: &mut ReportBuilder,
    output: &quake_eval::EvaluationOutput,
    test: &str,
    stem: Option<&str>,
    title: &str,
    out_dir: &Path,
) {
    let Some(result) = output.results.get(test) else {
        return;
    };
    let paths = relative_artifacts(result, stem, out_dir);
    if !paths.is_empty() {
        report.add_result_figure(title, 2, paths);
    }
}

fn relative_artifacts(
    result: &EvaluationResult,
    stem: Option<&str>,
    out_dir: &Path,
) -> Vec<PathBuf> {
    result
        .artifacts
        .iter()
        .filter(|path| match stem {
            Some(stem) => path
                .file_stem()
                .and_then(|value| value.to_str())
                .is_some_and(|value| value == stem),
            None => true,
        })
        .map(|path| {
            path.strip_prefix(out_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone())
        })
        .collect()
}

fn run_synth(args: SynthArgs) -> Result<(), Box<dyn Error>> {
    let format = CatalogSetFormat::parse(&args.format)?;
    let spec = SynthesisSpec {
        seed: args.seed,
        n_catalogs: args.catalogs,
        mean_events: args.mean_events,
        ..SynthesisSpec::default()
    };

    let extension = match format {
        CatalogSetFormat::JsonLines => "jsonl",
        CatalogSetFormat::Binary => "bin",
    };
    let catalogs_path = args.out.join(format!("catalogs.{extension}"));
    let written = write_ensemble(&catalogs_path, format, &spec)?;
    println!(
        "Wrote {written} synthetic catalogs to {}",
        catalogs_path.display()
    );

    let observed = synthesize_observed(&spec);
    let observed_path = args.out.join("observed.json");
    std::fs::write(
        &observed_path,
        serde_json::to_string_pretty(observed.events())?,
    )?;
    println!(
        "Wrote observed catalog ({} events) to {}",
        observed.event_count(),
        observed_path.display()
    );

    let config = EvalConfig {
        simulation_name: "Synthetic aftershock sequence".to_string(),
        forecast_name: "synthetic-etas".to_string(),
        n_cat: spec.n_catalogs,
        min_magnitude: spec.min_magnitude,
        mainshock: config::MainshockSpec {
            longitude: spec.center_longitude,
            latitude: spec.center_latitude,
            magnitude: 7.1,
            origin_time: epoch_ms_to_utc_string(spec.start_epoch_ms),
        },
        region: config::RegionSpec::default(),
        catalogs: config::CatalogSourceSpec {
            path: catalogs_path,
            format: args.format,
        },
        observed: config::ObservedSourceSpec {
            path: observed_path,
        },
        end_time: Some(epoch_ms_to_utc_string(spec.end_epoch_ms)),
        tests: Vec::new(),
    };
    let config_path = args.out.join("evaluation.yaml");
    std::fs::write(&config_path, serde_yaml::to_string(&config)?)?;
    println!("Wrote evaluation config to {}", config_path.display());
    Ok(())
}
