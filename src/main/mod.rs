use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use varsets::{
    commands::{
        varsets_collapse, varsets_compare, varsets_diff, varsets_filter, varsets_intersect,
        varsets_merge, varsets_overlap,
    },
    filters::read_filters,
    prelude::*,
    Position,
};

const INFO: &str = "\
varsets: matching, clustering and set operations on variant calls
usage: varsets [--help] <subcommand>

Subcommands:

  diff:       remove calls matching any call in one or more query files.
  intersect:  keep calls found across (enough of) the input files.
  merge:      merge the input files into one call per cluster.
  collapse:   deduplicate matching calls within one file.
  compare:    split two files into shared and file-specific calls.
  overlap:    keep calls whose breakpoints fall within BED ranges.
  filter:     keep calls passing attribute filters.

";

#[derive(Parser)]
#[clap(name = "varsets")]
#[clap(about = INFO)]
struct Cli {
    /// increase logging verbosity (-d for debug, -dd for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Matching and worker options shared by every subcommand. Flags override
/// values from `--config`.
#[derive(Args, Clone, Debug, Default)]
struct RunArgs {
    /// a JSON configuration file of matching options
    #[arg(long)]
    config: Option<PathBuf>,

    /// maximum distance in basepairs between matching breakpoints
    #[arg(long)]
    max_neighbor_distance: Option<i64>,

    /// require both breakpoints to be within the distance (true/false)
    #[arg(long)]
    match_all_breakpoints: Option<bool>,

    /// require variant types to agree (true/false)
    #[arg(long)]
    match_variant_types: Option<bool>,

    /// require both breakpoints for interchromosomal breakend calls (true/false)
    #[arg(long)]
    match_both_positions: Option<bool>,

    /// minimum size ratio between matching insertions
    #[arg(long)]
    min_ins_size_overlap: Option<f64>,

    /// minimum size ratio between matching deletions
    #[arg(long)]
    min_del_size_overlap: Option<f64>,

    /// SNVs and MNVs only match at identical positions
    #[arg(long)]
    exact_small_variant_positions: Option<bool>,

    /// number of worker threads
    #[arg(short = 't', long)]
    threads: Option<usize>,
}

impl RunArgs {
    fn run_config(&self, min_collections: Option<usize>) -> Result<RunConfig, VarsetsError> {
        let base = match &self.config {
            Some(path) => RunConfigFile::from_path(path)?,
            None => RunConfigFile::default(),
        };
        let overrides = RunConfigFile {
            max_neighbor_distance: self.max_neighbor_distance,
            match_all_breakpoints: self.match_all_breakpoints,
            match_variant_types: self.match_variant_types,
            match_both_positions: self.match_both_positions,
            min_ins_size_overlap: self.min_ins_size_overlap,
            min_del_size_overlap: self.min_del_size_overlap,
            exact_small_variant_positions: self.exact_small_variant_positions,
            num_threads: self.threads,
            num_processes: None,
            min_collections,
        };
        base.merge(overrides).into_run_config()
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Requirement {
    First,
    Either,
    Both,
}

impl From<Requirement> for BreakpointRequirement {
    fn from(value: Requirement) -> Self {
        match value {
            Requirement::First => BreakpointRequirement::First,
            Requirement::Either => BreakpointRequirement::Either,
            Requirement::Both => BreakpointRequirement::Both,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    Diff {
        /// the TSV file of calls to filter
        #[arg(required = true)]
        target: PathBuf,

        /// one or more TSV files of calls to subtract
        #[arg(required = true, num_args = 1..)]
        queries: Vec<PathBuf>,

        #[command(flatten)]
        run: RunArgs,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Intersect {
        /// two or more TSV files of calls
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// minimum number of input files a cluster must span (default: all)
        #[arg(long)]
        min_collections: Option<usize>,

        /// output every member call rather than one merged call per cluster
        #[arg(long)]
        members: bool,

        #[command(flatten)]
        run: RunArgs,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Merge {
        /// one or more TSV files of calls
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        run: RunArgs,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Collapse {
        /// a TSV file of calls
        #[arg(required = true)]
        input: PathBuf,

        #[command(flatten)]
        run: RunArgs,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Compare {
        /// the first TSV file of calls
        #[arg(required = true)]
        first: PathBuf,

        /// the second TSV file of calls
        #[arg(required = true)]
        second: PathBuf,

        #[command(flatten)]
        run: RunArgs,

        /// the directory for shared.tsv and the two *_only.tsv files
        #[arg(long, required = true)]
        output_dir: PathBuf,
    },
    Overlap {
        /// a TSV file of calls
        #[arg(required = true)]
        input: PathBuf,

        /// a BED file of target ranges
        #[arg(long, required = true)]
        bedfile: PathBuf,

        /// number of basepairs to widen each range by on both sides
        #[arg(long, default_value_t = 0)]
        padding: Position,

        /// which breakpoints must fall within a range
        #[arg(long, value_enum, default_value_t = Requirement::First)]
        require: Requirement,

        /// keep calls that do not overlap any range
        #[arg(long)]
        invert: bool,

        #[command(flatten)]
        run: RunArgs,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// an optional file for the calls that were not kept
        #[arg(long)]
        rejected: Option<PathBuf>,
    },
    Filter {
        /// a TSV file of calls
        #[arg(required = true)]
        input: PathBuf,

        /// a filter such as 'quality_score>=20' (may be repeated)
        #[arg(short = 'f', long = "where")]
        conditions: Vec<String>,

        /// a JSON file with a list of filters
        #[arg(long)]
        filters: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// an optional file for the calls that were not kept
        #[arg(long)]
        rejected: Option<PathBuf>,
    },
}

fn init_logging(debug: u8) {
    let level = match debug {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run() -> Result<(), VarsetsError> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let result = match &cli.command {
        Some(Commands::Diff {
            target,
            queries,
            run,
            output,
        }) => varsets_diff(target, queries, run.run_config(None)?, output.as_ref()),
        Some(Commands::Intersect {
            inputs,
            min_collections,
            members,
            run,
            output,
        }) => varsets_intersect(
            inputs,
            run.run_config(*min_collections)?,
            *members,
            output.as_ref(),
        ),
        Some(Commands::Merge {
            inputs,
            run,
            output,
        }) => varsets_merge(inputs, run.run_config(None)?, output.as_ref()),
        Some(Commands::Collapse { input, run, output }) => {
            varsets_collapse(input, run.run_config(None)?, output.as_ref())
        }
        Some(Commands::Compare {
            first,
            second,
            run,
            output_dir,
        }) => varsets_compare(first, second, run.run_config(None)?, output_dir),
        Some(Commands::Overlap {
            input,
            bedfile,
            padding,
            require,
            invert,
            run,
            output,
            rejected,
        }) => {
            let options = OverlapOptions {
                padding: *padding,
                requirement: (*require).into(),
                invert: *invert,
            };
            varsets_overlap(
                input,
                bedfile,
                options,
                run.run_config(None)?,
                output.as_ref(),
                rejected.as_ref(),
            )
        }
        Some(Commands::Filter {
            input,
            conditions,
            filters,
            run,
            output,
            rejected,
        }) => {
            let mut all_filters = match filters {
                Some(path) => read_filters(path)?,
                None => Vec::new(),
            };
            for condition in conditions {
                all_filters.push(condition.parse::<VariantFilter>()?);
            }
            varsets_filter(
                input,
                &all_filters,
                run.run_config(None)?,
                output.as_ref(),
                rejected.as_ref(),
            )
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    };
    let output = result?;
    output.report().log();
    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
