use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::markup;
use crate::result::{BatchSummary, PageSummary};
use crate::LineCutter;

#[instrument(skip(cutter), level = "debug")]
pub(crate) fn run(cutter: &LineCutter, split_file: &Path, out_dir: &Path) -> Result<BatchSummary> {
    let entries = parse_data_splits(split_file)?;
    log::info!(
        "Processing {} pages listed in {}",
        entries.len(),
        split_file.display()
    );

    fs::create_dir_all(out_dir)?;
    if cutter.write_lines() {
        fs::create_dir_all(out_dir.join("lines"))?;
    }

    // Writing-condition tables load once per root and are shared read-only
    // across workers.
    let conditions: Vec<Option<HashMap<String, String>>> = cutter
        .roots()
        .iter()
        .map(|root| {
            let path = root.join(&cutter.layout().conditions_file);
            if !path.is_file() {
                log::debug!("No writing-condition table at {}", path.display());
                return None;
            }
            match markup::parse_writing_conditions(&path) {
                Ok(table) => Some(table),
                Err(err) => {
                    log::warn!(
                        "Unreadable writing-condition table {}: {err}",
                        path.display()
                    );
                    None
                }
            }
        })
        .collect();

    let pool = ThreadPoolBuilder::new()
        .num_threads(cutter.threads())
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;

    let mut results: Vec<(usize, Option<PageSummary>)> = pool.install(|| {
        entries
            .par_iter()
            .enumerate()
            .map(|(index, base_name)| {
                let page = match process_page(cutter, &conditions, base_name, out_dir) {
                    Ok(page) => page,
                    Err(err) => {
                        log::warn!("Skipping page {base_name}: {err}");
                        None
                    }
                };
                (index, page)
            })
            .collect()
    });
    results.sort_by_key(|(index, _)| *index);

    let manifest_path = cutter
        .write_masks()
        .then(|| out_dir.join("images.txt"));
    let mut manifest = match &manifest_path {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };

    let mut summary = BatchSummary {
        pages_processed: 0,
        pages_skipped: 0,
        lines_written: 0,
        zones_skipped: 0,
        manifest_path,
    };
    for (_, page) in results {
        match page {
            Some(page) => {
                if let (Some(manifest), Some(mask_path)) = (manifest.as_mut(), &page.mask_path) {
                    writeln!(manifest, "{}", mask_path.display())?;
                }
                summary.pages_processed += 1;
                summary.lines_written += page.lines_written;
                summary.zones_skipped += page.zones_skipped;
            }
            None => summary.pages_skipped += 1,
        }
    }
    if let Some(manifest) = manifest.as_mut() {
        manifest.flush()?;
    }

    if summary.pages_processed == 0 {
        return Err(Error::NoPagesProcessed);
    }
    log::info!(
        "Processed {} pages, skipped {}, wrote {} line images",
        summary.pages_processed,
        summary.pages_skipped,
        summary.lines_written
    );
    Ok(summary)
}

#[instrument(skip(cutter, conditions), level = "debug")]
fn process_page(
    cutter: &LineCutter,
    conditions: &[Option<HashMap<String, String>>],
    base_name: &str,
    out_dir: &Path,
) -> Result<Option<PageSummary>> {
    let Some(location) = markup::resolve_page(cutter.roots(), cutter.layout(), base_name) else {
        log::debug!("Page {base_name} not present under any dataset root");
        return Ok(None);
    };
    let table = conditions[location.root_index].as_ref();
    if !markup::check_writing_condition(table, base_name, cutter.accept_condition()) {
        log::debug!("Page {base_name} rejected by writing condition");
        return Ok(None);
    }

    let zones = markup::parse_page_markup(&location.markup_path)?;
    let page = image::open(&location.image_path)?.to_luma8();

    let mut summary = PageSummary {
        base_name: base_name.to_string(),
        mask_path: None,
        lines_written: 0,
        zones_skipped: 0,
    };
    let mut line_skips = 0;
    let mut mask_skips = 0;

    if cutter.write_lines() {
        let extracted = cutter.extract_lines(&page, &zones);
        line_skips = extracted.skipped.len();
        for line in &extracted.lines {
            let path = out_dir
                .join("lines")
                .join(format!("{base_name}_{:0>4}.png", line.zone_id));
            if cutter.flip_lines() {
                image::imageops::flip_horizontal(&line.image).save(&path)?;
            } else {
                line.image.save(&path)?;
            }
            summary.lines_written += 1;
        }
    }

    if cutter.write_masks() {
        let mask = cutter.compose_mask(page.width(), page.height(), &zones);
        mask_skips = mask.skipped.len();
        let path = out_dir.join(format!("{base_name}.png"));
        mask.image.save(&path)?;
        summary.mask_path = Some(path);
    }

    // The same zones fail geometry in both passes.
    summary.zones_skipped = line_skips.max(mask_skips);
    log::info!(
        "Processed page {base_name}: {} line images, {} zones skipped",
        summary.lines_written,
        summary.zones_skipped
    );
    Ok(Some(summary))
}

pub(crate) fn parse_data_splits(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    let mut entries: Vec<String> = Vec::new();
    for line in text.lines() {
        let Some(base_name) = base_name_of(line) else {
            continue;
        };
        if entries.last().map(String::as_str) != Some(base_name.as_str()) {
            entries.push(base_name);
        }
    }
    Ok(entries)
}

// First whitespace-separated token with both extension segments stripped,
// e.g. "PAGE_001.madcat.xml s1" names page "PAGE_001".
fn base_name_of(entry: &str) -> Option<String> {
    let token = entry.split_whitespace().next()?;
    Some(strip_extension(strip_extension(token)).to_string())
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) if index > 0 => &name[..index],
        _ => name,
    }
}
