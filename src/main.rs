use std::{path::PathBuf, time::Instant};

use clap::{ArgAction, Parser};
use linecut::{DatasetLayout, LineCutterBuilder};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Cuts per-line images and line-instance masks out of scanned page images,
/// driven by word-level polygon annotations.
#[derive(Parser, Debug)]
#[command(name = "linecut")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset roots searched in order for markup and page images
    #[arg(long = "database-path", required = true, num_args = 1..)]
    database_paths: Vec<PathBuf>,

    /// Data-split listing naming the pages to process
    #[arg(long = "data-splits")]
    data_splits: PathBuf,

    /// Directory receiving masks, line images and the manifest
    #[arg(short = 'o', long = "out-dir")]
    out_dir: PathBuf,

    /// White padding added around each page before cropping
    #[arg(long, default_value = "400")]
    padding: u32,

    /// Only process pages whose writing condition equals this tag
    #[arg(long = "writing-condition")]
    writing_condition: Option<String>,

    /// Mirror extracted line images horizontally
    #[arg(long, action = ArgAction::SetTrue)]
    flip: bool,

    /// Skip writing per-zone line images
    #[arg(long = "no-lines", action = ArgAction::SetTrue)]
    no_lines: bool,

    /// Skip writing page masks and the manifest
    #[arg(long = "no-masks", action = ArgAction::SetTrue)]
    no_masks: bool,

    /// Worker threads (0 = one per core)
    #[arg(long, default_value = "0")]
    threads: usize,

    /// Markup subdirectory within each dataset root
    #[arg(long = "markup-dir", default_value = "madcat")]
    markup_dir: String,

    /// Markup file extension
    #[arg(long = "markup-ext", default_value = ".madcat.xml")]
    markup_ext: String,

    /// Image subdirectory within each dataset root
    #[arg(long = "image-dir", default_value = "images")]
    image_dir: String,

    /// Page image extension
    #[arg(long = "image-ext", default_value = ".tif")]
    image_ext: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let layout = DatasetLayout {
        markup_dir: args.markup_dir,
        markup_ext: args.markup_ext,
        image_dir: args.image_dir,
        image_ext: args.image_ext,
        ..DatasetLayout::default()
    };
    let mut builder = LineCutterBuilder::new()
        .dataset_roots(args.database_paths)
        .with_layout(layout)
        .padding(args.padding)
        .flip_lines(args.flip)
        .write_lines(!args.no_lines)
        .write_masks(!args.no_masks)
        .threads(args.threads);
    if let Some(tag) = args.writing_condition {
        builder = builder.accept_condition(tag);
    }
    let cutter = builder.build();

    let start = Instant::now();
    match cutter.process_dataset(&args.data_splits, &args.out_dir) {
        Ok(summary) => {
            log::debug!("{:?}", start.elapsed());
            println!(
                "Processed {} pages ({} skipped), wrote {} line images.",
                summary.pages_processed, summary.pages_skipped, summary.lines_written
            );
        }
        Err(e) => {
            eprintln!("linecut: {e}");
            std::process::exit(1);
        }
    }
}
