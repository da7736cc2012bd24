use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use ss_structure::BpSeq;
use ss_structure::Ct;
use ss_structure::DotBracket;
use ss_structure::MaxNestedFinder;
use ss_structure::PseudoknotFinder;
use ss_structure::RenderOptions;
use ss_structure::SymbolSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Bpseq,
    Ct,
    Dbn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Bpseq,
    Ct,
    Dbn,
    Pseudoknots,
}

/// Convert secondary structures between BPSEQ, CT and dot-bracket.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Input file (stdin if omitted).
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "bpseq")]
    from: InputFormat,

    #[arg(long, value_enum, default_value = "dbn")]
    to: OutputFormat,

    /// Write entry comments to BPSEQ and CT output.
    #[arg(long)]
    comments: bool,

    /// Maximum number of alternative pseudoknot sets.
    #[arg(long, default_value_t = 16)]
    max_solutions: usize,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Serialize)]
struct PseudoknotReport {
    sequence: String,
    alternatives: Vec<Vec<(usize, usize)>>,
}

fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let data = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let finder = MaxNestedFinder::new(cli.max_solutions);
    let bpseq = match cli.from {
        InputFormat::Bpseq => BpSeq::try_from(data.as_str())?,
        InputFormat::Ct => BpSeq::from(&Ct::try_from(data.as_str())?),
        InputFormat::Dbn => DotBracket::try_from(data.as_str())?.to_bpseq()?,
    };
    log::info!("Read {} residues with {} base pairs.", bpseq.len(), bpseq.paired_count());

    let options = RenderOptions { comments: cli.comments };
    let output = match cli.to {
        OutputFormat::Bpseq => bpseq.to_text(&options),
        OutputFormat::Ct => match cli.from {
            // keep strand layout and numbering of the input
            InputFormat::Ct => Ct::try_from(data.as_str())?.to_text(&options),
            InputFormat::Dbn => DotBracket::try_from(data.as_str())?.to_ct()?.to_text(&options),
            InputFormat::Bpseq => Ct::from_bpseq(&bpseq)?.to_text(&options),
        },
        OutputFormat::Dbn => format!("{}\n", DotBracket::from_bpseq_with(&bpseq, &finder)?),
        OutputFormat::Pseudoknots => {
            let report = PseudoknotReport {
                sequence: bpseq.sequence(),
                alternatives: finder.find_pseudoknots(&bpseq).iter().map(BpSeq::pairs).collect(),
            };
            format!("{}\n", serde_json::to_string_pretty(&report)?)
        }
    };
    Ok(output)
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
