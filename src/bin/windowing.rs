/// windowing: cut cached records into fixed-shape samples and write each
/// collated batch to `<output>/batch_NNNN.safetensors`.
///
/// Output keys per batch:
///   record_id     [B]             i64
///   signal        [B, T, C]       f32
///   mask          [B, T, C]       f32
///   spectrogram   [B, G, F, W]    f32  only with a spectrogram config
///   label         [B, 6]          f32  only for labelled records
///   weight        [B, 1]          f32
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use eegwin::{
    io::{load_label_rows, load_records, write_batch},
    DatasetConfig, MetadataIndex, ParallelLoader, SampleDataset,
};

#[derive(Parser, Debug)]
#[command(name = "windowing", about = "EEG windowing and sample assembly")]
struct Args {
    /// Record file (signal/<id>, mask/<id>, spectrogram/<id>).
    #[arg(long)]
    records: PathBuf,

    /// JSON array of label rows.  Without it every signal record is used
    /// unlabelled.
    #[arg(long)]
    labels: Option<PathBuf>,

    /// JSON dataset config; absent fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory.
    #[arg(long)]
    output: PathBuf,

    /// Overrides the config seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Logical worker count (fixes the per-worker seeds).
    #[arg(long, default_value_t = 4)]
    workers: usize,

    #[arg(long, default_value_t = 32)]
    batch_size: usize,
}

fn main() -> Result<()> {
    {
        use tracing_subscriber::prelude::*;

        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            DatasetConfig::from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => DatasetConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }

    let records = load_records(&args.records)?;
    let index = match &args.labels {
        Some(path) => MetadataIndex::build(load_label_rows(path)?, cfg.weight_reduction),
        None => MetadataIndex::unlabelled(records.signal_ids()),
    };

    let ds = SampleDataset::new(cfg, Arc::new(records), Arc::new(index))?;
    let batches = ParallelLoader::new(args.workers).batches(&ds, args.batch_size)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for (i, batch) in batches.iter().enumerate() {
        let path = args.output.join(format!("batch_{i:04}.safetensors"));
        write_batch(batch, &path)?;
    }
    tracing::info!(
        items = ds.len(),
        batches = batches.len(),
        output = %args.output.display(),
        "done"
    );

    Ok(())
}
