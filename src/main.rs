//! METAL: consensus annotation of indel breakpoint calls.
//!
//! Usage: metal <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process;

use metal_indels::commands::{CorrelateCommand, FinalizeCommand};
use metal_indels::config::{CallerSet, CallerSpec, CorrelateConfig, DEFAULT_DISTANCE};
use metal_indels::genome::ChromOrder;
use metal_indels::streaming::CalledWriter;
use metal_indels::{CallerId, MetalError, TsvSource};

/// Name of the intermediate, per-pass output inside the output directory.
const UNSORTED_OUTPUT: &str = "metal.unsorted.tsv";
/// Name of the final output inside the output directory.
const SORTED_OUTPUT: &str = "metal.tsv";

#[derive(Parser)]
#[command(name = "metal")]
#[command(version)]
#[command(about = "METAL: consensus annotation of indel breakpoint calls across variant callers", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate breakpoint calls across callers and write the consensus table
    Correlate {
        /// Scotch breakpoints TSV
        #[arg(short = 's', long = "scotch")]
        scotch: Option<PathBuf>,

        /// DeepVariant breakpoints TSV
        #[arg(short = 'd', long = "deepvariant")]
        deepvariant: Option<PathBuf>,

        /// GATK HaplotypeCaller breakpoints TSV
        #[arg(short = 'g', long = "gatkhc")]
        gatkhc: Option<PathBuf>,

        /// VarScan breakpoints TSV
        #[arg(short = 'v', long = "varscan")]
        varscan: Option<PathBuf>,

        /// Pindel-L breakpoints TSV
        #[arg(short = 'p', long = "pindell")]
        pindell: Option<PathBuf>,

        /// Additional caller as NAME=PATH (repeatable)
        #[arg(long = "caller", value_parser = parse_caller_arg)]
        callers: Vec<(String, PathBuf)>,

        /// Callers that may not corroborate each other's insertions
        #[arg(
            long,
            value_delimiter = ',',
            default_values_t = [String::from("Scotch"), String::from("Pindel-L")]
        )]
        low_specificity: Vec<String>,

        /// Output directory (must exist)
        #[arg(short = 'o', long)]
        output_dir: PathBuf,

        /// Calls correlate when positions differ by less than this
        #[arg(short = 'D', long, default_value_t = DEFAULT_DISTANCE)]
        distance: u64,

        /// Genome/fai file giving chromosome order (default: 1-22, X, Y)
        #[arg(long)]
        genome: Option<PathBuf>,

        /// Fail on unsorted input instead of correlating it silently
        #[arg(long)]
        validate: bool,

        /// Order the final table by chromosome, then position
        #[arg(long)]
        by_chrom: bool,

        /// Overwrite existing output files
        #[arg(long)]
        force: bool,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Collapse duplicate sites in an unsorted table and order it by position
    Finalize {
        /// Unsorted correlation table
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Order by chromosome, then position
        #[arg(long)]
        by_chrom: bool,

        /// Genome/fai file giving chromosome order (with --by-chrom)
        #[arg(long)]
        genome: Option<PathBuf>,

        /// Print statistics to stderr
        #[arg(long)]
        stats: bool,
    },
}

fn parse_caller_arg(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{}'", s)),
    }
}

fn setup_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Warn,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Correlate {
            scotch,
            deepvariant,
            gatkhc,
            varscan,
            pindell,
            callers,
            low_specificity,
            output_dir,
            distance,
            genome,
            validate,
            by_chrom,
            force,
            stats,
        } => {
            let mut inputs: Vec<(String, PathBuf)> = [
                ("Scotch", scotch),
                ("DeepVariant", deepvariant),
                ("GATK-HC", gatkhc),
                ("VarScan", varscan),
                ("Pindel-L", pindell),
            ]
            .into_iter()
            .filter_map(|(name, path)| path.map(|p| (name.to_string(), p)))
            .collect();
            inputs.extend(callers);

            run_correlate(
                inputs,
                low_specificity,
                output_dir,
                distance,
                genome,
                validate,
                by_chrom,
                force,
                stats,
            )
        }

        Commands::Finalize {
            input,
            output,
            by_chrom,
            genome,
            stats,
        } => run_finalize(input, output, by_chrom, genome, stats),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_chrom_order(genome: Option<&Path>) -> Result<ChromOrder, MetalError> {
    match genome {
        Some(path) => ChromOrder::from_file(path).map_err(|e| {
            MetalError::InvalidFormat(format!("Failed to load genome file: {}", e))
        }),
        None => Ok(ChromOrder::human()),
    }
}

/// Refuse to clobber an existing output unless asked to.
fn check_writable(path: &Path, force: bool) -> Result<(), MetalError> {
    if path.exists() && !force {
        return Err(MetalError::Config(format!(
            "{} already exists: delete or move it, or pass --force",
            path.display()
        )));
    }
    Ok(())
}

fn run_correlate(
    inputs: Vec<(String, PathBuf)>,
    low_specificity: Vec<String>,
    output_dir: PathBuf,
    distance: u64,
    genome: Option<PathBuf>,
    validate: bool,
    by_chrom: bool,
    force: bool,
    stats: bool,
) -> Result<(), MetalError> {
    if inputs.is_empty() {
        return Err(MetalError::Config(
            "no breakpoint files given: use --scotch, --deepvariant, --gatkhc, \
             --varscan, --pindell or --caller NAME=PATH"
                .to_string(),
        ));
    }
    if inputs.len() == 1 {
        log::warn!("only one caller given, no call can be corroborated");
    }
    if !output_dir.is_dir() {
        return Err(MetalError::Config(format!(
            "output directory {} must be a directory that exists",
            output_dir.display()
        )));
    }

    let unsorted_path = output_dir.join(UNSORTED_OUTPUT);
    let sorted_path = output_dir.join(SORTED_OUTPUT);
    check_writable(&unsorted_path, force)?;
    check_writable(&sorted_path, force)?;

    let chrom_order = load_chrom_order(genome.as_deref())?;

    for name in &low_specificity {
        if !inputs.iter().any(|(n, _)| n == name) {
            log::debug!("low-specificity caller {} has no input file", name);
        }
    }
    let callers = CallerSet::new(
        inputs
            .iter()
            .map(|(name, _)| {
                let spec = CallerSpec::new(name.clone());
                if low_specificity.contains(name) {
                    spec.low_specificity()
                } else {
                    spec
                }
            })
            .collect(),
    );
    let config = CorrelateConfig::new()
        .with_distance(distance)
        .with_callers(callers)
        .with_chrom_order(chrom_order.clone());
    config.validate()?;

    // Open every source up front so a missing file fails before any pass runs
    let mut sources = Vec::with_capacity(inputs.len());
    for (idx, (name, path)) in inputs.iter().enumerate() {
        let source = TsvSource::from_path(path, CallerId(idx))?;
        let source = if validate {
            source.with_validation(chrom_order.clone())
        } else {
            source
        };
        log::debug!("{}: {}", name, path.display());
        sources.push(source);
    }

    let file = File::create(&unsorted_path).map_err(|e| MetalError::io(e, &unsorted_path))?;
    let mut writer = CalledWriter::new(file);
    let correlate_stats = CorrelateCommand::new()
        .with_config(config)
        .run(&mut sources, &mut writer)?;
    writer.flush()?;
    drop(writer);

    let finalize_stats = FinalizeCommand::new()
        .with_by_chrom(by_chrom)
        .with_chrom_order(chrom_order)
        .run(&unsorted_path, &sorted_path)?;

    if stats {
        eprintln!("Correlate stats: {}", correlate_stats);
        for pass in &correlate_stats.per_pass {
            eprintln!(
                "  {}: read {}, emitted {}, correlations {}",
                pass.indel_type, pass.calls_read, pass.records_emitted, pass.correlations
            );
        }
        eprintln!("Finalize stats: {}", finalize_stats);
    }
    log::info!("Wrote {}", sorted_path.display());

    Ok(())
}

fn run_finalize(
    input: PathBuf,
    output: Option<PathBuf>,
    by_chrom: bool,
    genome: Option<PathBuf>,
    stats: bool,
) -> Result<(), MetalError> {
    let cmd = FinalizeCommand::new()
        .with_by_chrom(by_chrom)
        .with_chrom_order(load_chrom_order(genome.as_deref())?);

    let result = match output {
        Some(path) => cmd.run(&input, &path)?,
        None => {
            let file = File::open(&input).map_err(|e| MetalError::io(e, &input))?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            cmd.run_reader(BufReader::new(file), &mut handle)?
        }
    };

    if stats {
        eprintln!("Finalize stats: {}", result);
    }

    Ok(())
}
