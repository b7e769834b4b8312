use std::path::PathBuf;

use image::{GrayImage, ImageBuffer, Luma};

pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

#[derive(Debug, Clone)]
pub struct LineImage {
    pub zone_id: String,
    pub image: GrayImage,
}

#[derive(Debug, Clone)]
pub struct ExtractedLines {
    pub lines: Vec<LineImage>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PageMask {
    pub image: Gray16Image,
    pub zones_drawn: usize,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PageSummary {
    pub base_name: String,
    pub mask_path: Option<PathBuf>,
    pub lines_written: usize,
    pub zones_skipped: usize,
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub pages_processed: usize,
    pub pages_skipped: usize,
    pub lines_written: usize,
    pub zones_skipped: usize,
    pub manifest_path: Option<PathBuf>,
}
