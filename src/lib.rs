use std::path::{Path, PathBuf};

mod batch;
mod error;
mod extract;
pub mod geometry;
mod markup;
mod mask;
mod result;
pub mod rotate;
mod util;

use image::GrayImage;
use tracing::instrument;

pub use error::{Error, Result};
pub use geometry::{minimum_bounding_box, BoundingBox, Point};
pub use markup::{
    check_writing_condition, parse_page_markup, parse_writing_conditions, resolve_page,
    DatasetLayout, PageLocation, Word, Zone,
};
pub use result::*;
pub use rotate::{get_smaller_angle, horizontal_angle, rotate_points};

pub struct LineCutterBuilder {
    options: ExtractOptions,
    layout: DatasetLayout,
    roots: Vec<PathBuf>,
    accept_condition: Option<String>,
    threads: usize,
    write_lines: bool,
    write_masks: bool,
}

impl LineCutterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn dataset_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.roots.push(path.into());
        self
    }

    pub fn dataset_roots(
        mut self,
        paths: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        self.roots.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn padding(mut self, padding: u32) -> Self {
        self.options.padding = padding;
        self
    }

    pub fn flip_lines(mut self, flip: bool) -> Self {
        self.options.flip_lines = flip;
        self
    }

    pub fn accept_condition(mut self, tag: impl Into<String>) -> Self {
        self.accept_condition = Some(tag.into());
        self
    }

    pub fn with_layout(mut self, layout: DatasetLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn write_lines(mut self, write: bool) -> Self {
        self.write_lines = write;
        self
    }

    pub fn write_masks(mut self, write: bool) -> Self {
        self.write_masks = write;
        self
    }

    #[instrument(skip(self))]
    pub fn build(self) -> LineCutter {
        LineCutter {
            options: self.options,
            layout: self.layout,
            roots: self.roots,
            accept_condition: self.accept_condition,
            threads: self.threads,
            write_lines: self.write_lines,
            write_masks: self.write_masks,
        }
    }
}

impl Default for LineCutterBuilder {
    fn default() -> Self {
        Self {
            options: ExtractOptions::default(),
            layout: DatasetLayout::default(),
            roots: Vec::new(),
            accept_condition: None,
            threads: 0,
            write_lines: true,
            write_masks: true,
        }
    }
}

pub struct LineCutter {
    options: ExtractOptions,
    layout: DatasetLayout,
    roots: Vec<PathBuf>,
    accept_condition: Option<String>,
    threads: usize,
    write_lines: bool,
    write_masks: bool,
}

impl LineCutter {
    #[instrument(skip(self, page, zones))]
    pub fn extract_lines(&self, page: &GrayImage, zones: &[Zone]) -> ExtractedLines {
        let lines = extract::extract_lines(page, zones, self.options.padding);
        #[cfg(feature = "debug")]
        for line in &lines.lines {
            std::fs::create_dir_all("part_images").unwrap();
            line.image
                .save(format!("part_images/{}.png", line.zone_id))
                .unwrap();
        }
        lines
    }

    #[instrument(skip(self, zones))]
    pub fn compose_mask(&self, width: u32, height: u32, zones: &[Zone]) -> PageMask {
        mask::compose_mask(width, height, zones, self.options.padding)
    }

    #[instrument(skip(self))]
    pub fn process_dataset(&self, split_file: &Path, out_dir: &Path) -> Result<BatchSummary> {
        batch::run(self, split_file, out_dir)
    }

    pub(crate) fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub(crate) fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub(crate) fn accept_condition(&self) -> Option<&str> {
        self.accept_condition.as_deref()
    }

    pub(crate) fn threads(&self) -> usize {
        self.threads
    }

    pub(crate) fn write_lines(&self) -> bool {
        self.write_lines
    }

    pub(crate) fn write_masks(&self) -> bool {
        self.write_masks
    }

    pub(crate) fn flip_lines(&self) -> bool {
        self.options.flip_lines
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub padding: u32,
    pub flip_lines: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            padding: 400,
            flip_lines: false,
        }
    }
}
