use std::{
    fs::{read, File},
    io::{self, Write},
    path::PathBuf,
    process::exit,
};

use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};
use retpredict::{
    export::{self, DEFAULT_LABEL},
    input::{self, DEFAULT_COLUMN},
    table::FeatureTable,
    Error, Model, ModelArtifact,
};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The number of threads to use. Defaults to the number of logical CPUs as
    /// detected by rayon.
    #[arg(short, long, default_value_t = 0, global = true)]
    threads: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict bioactivity for a batch of SMILES with a trained model.
    Predict {
        /// The JSON model file to load.
        #[arg(short, long)]
        model: PathBuf,

        #[command(flatten)]
        source: Source,
    },

    /// Write the full descriptor table for a batch of SMILES.
    Describe {
        #[command(flatten)]
        source: Source,
    },
}

#[derive(Args)]
struct Source {
    /// Comma-separated SMILES. Takes precedence over `--input`.
    #[arg(short, long)]
    smiles: Option<String>,

    /// A CSV or TXT file with a header line and a column of SMILES.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// The column of `--input` holding the SMILES.
    #[arg(short, long, default_value = DEFAULT_COLUMN)]
    column: String,

    /// Where to write the resulting CSV. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Source {
    fn collect(&self) -> Result<Vec<String>, Error> {
        let upload = self.input.as_ref().map(read).transpose()?;
        input::collect(self.smiles.as_deref(), upload.as_deref(), &self.column)
    }

    fn writer(&self) -> Result<Box<dyn Write>, Error> {
        Ok(match &self.output {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(io::stdout().lock()),
        })
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Predict { model, source } => {
            let model = ModelArtifact::load(model)?;
            let smiles = source.collect()?;
            let batch = retpredict::predict(&model, &smiles)?;
            if !batch.skipped.is_empty() {
                warn!("skipped {} of {} SMILES", batch.skipped.len(), smiles.len());
            }
            export::write_predictions(
                source.writer()?,
                &source.column,
                model.target().unwrap_or(DEFAULT_LABEL),
                &batch.predictions,
            )?;
            info!("wrote {} predictions", batch.predictions.len());
        }
        Command::Describe { source } => {
            let smiles = source.collect()?;
            let (table, skipped) = FeatureTable::build(&smiles)?;
            if table.is_empty() {
                return Err(Error::NoValidMolecules);
            }
            if !skipped.is_empty() {
                warn!("skipped {} of {} SMILES", skipped.len(), smiles.len());
            }
            export::write_descriptors(source.writer()?, &source.column, &table)?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
    {
        error!("failed to initialize thread pool: {e}");
        exit(1);
    }

    if let Err(e) = run(cli) {
        error!("{e}");
        exit(1);
    }
}
