use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::error::{Error, Result};
use crate::geometry::Point;

#[derive(Debug, Clone)]
pub struct Word {
    pub points: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct Zone {
    pub id: String,
    pub words: Vec<Word>,
}

impl Zone {
    /// Every word corner point of the zone, flattened in document order.
    pub fn all_points(&self) -> Vec<Point> {
        self.words
            .iter()
            .flat_map(|word| word.points.iter().copied())
            .collect()
    }
}

/// Where a dataset root keeps its markup and page images. The defaults match
/// the MADCAT layout.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    pub markup_dir: String,
    pub markup_ext: String,
    pub image_dir: String,
    pub image_ext: String,
    pub conditions_file: String,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        DatasetLayout {
            markup_dir: "madcat".into(),
            markup_ext: ".madcat.xml".into(),
            image_dir: "images".into(),
            image_ext: ".tif".into(),
            conditions_file: "writing_conditions.tab".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageLocation {
    pub markup_path: PathBuf,
    pub image_path: PathBuf,
    pub root_index: usize,
}

#[instrument(level = "debug")]
pub fn parse_page_markup(path: &Path) -> Result<Vec<Zone>> {
    let text = fs::read_to_string(path).map_err(|e| Error::MissingAnnotation {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_markup(&text).map_err(|reason| Error::MissingAnnotation {
        path: path.to_path_buf(),
        reason,
    })
}

pub(crate) fn parse_markup(text: &str) -> std::result::Result<Vec<Zone>, String> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)
        .map_err(|e| format!("XML parse error: {e}"))?;

    let mut zones = Vec::new();
    for zone_node in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "zone")
    {
        let Some(id) = zone_node.attribute("id") else {
            log::warn!("Skipping zone without id attribute");
            continue;
        };
        let mut words = Vec::new();
        for word_node in zone_node
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "token-image")
        {
            let points: Vec<Point> = word_node
                .descendants()
                .filter(|n| n.is_element() && n.tag_name().name() == "point")
                .filter_map(|n| {
                    let x = n.attribute("x")?.parse::<f64>().ok()?;
                    let y = n.attribute("y")?.parse::<f64>().ok()?;
                    Some((x, y))
                })
                .collect();
            words.push(Word { points });
        }
        zones.push(Zone {
            id: id.to_string(),
            words,
        });
    }
    Ok(zones)
}

/// First root whose markup subdirectory contains the page wins.
pub fn resolve_page(
    roots: &[PathBuf],
    layout: &DatasetLayout,
    base_name: &str,
) -> Option<PageLocation> {
    for (root_index, root) in roots.iter().enumerate() {
        let markup_path = root
            .join(&layout.markup_dir)
            .join(format!("{base_name}{}", layout.markup_ext));
        if markup_path.is_file() {
            let image_path = root
                .join(&layout.image_dir)
                .join(format!("{base_name}{}", layout.image_ext));
            return Some(PageLocation {
                markup_path,
                image_path,
                root_index,
            });
        }
    }
    None
}

/// Tab-separated table, page base name in column 0, condition tag in column 3.
pub fn parse_writing_conditions(path: &Path) -> Result<HashMap<String, String>> {
    let text = fs::read_to_string(path)?;
    let mut conditions = HashMap::new();
    for line in text.lines() {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 4 {
            log::debug!("Ignoring malformed writing-condition line: {line:?}");
            continue;
        }
        conditions.insert(columns[0].to_string(), columns[3].to_string());
    }
    Ok(conditions)
}

pub fn check_writing_condition(
    conditions: Option<&HashMap<String, String>>,
    base_name: &str,
    accept: Option<&str>,
) -> bool {
    let Some(accept) = accept else { return true };
    let Some(conditions) = conditions else {
        return true;
    };
    match conditions.get(base_name) {
        Some(tag) => tag == accept,
        None => {
            log::debug!("No writing condition recorded for {base_name}, rejecting");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE madcat SYSTEM "madcat.dtd">
<madcat>
  <writing>
    <zone id="z1">
      <token-image id="t1">
        <point x="10" y="20"/>
        <point x="40" y="20"/>
        <point x="40" y="30"/>
        <point x="10" y="30"/>
      </token-image>
      <token-image id="t2">
        <point x="45" y="21"/>
        <point x="70" y="21"/>
        <point x="70" y="31"/>
        <point x="45" y="31"/>
      </token-image>
    </zone>
    <zone id="z2">
      <token-image id="t3">
        <point x="12" y="50"/>
        <point x="52" y="50"/>
        <point x="52" y="61"/>
      </token-image>
    </zone>
  </writing>
</madcat>
"#;

    #[test]
    fn parses_zones_words_and_points() {
        let zones = parse_markup(SAMPLE).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].id, "z1");
        assert_eq!(zones[0].words.len(), 2);
        assert_eq!(zones[0].all_points().len(), 8);
        assert_eq!(zones[0].words[0].points[1], (40.0, 20.0));
        assert_eq!(zones[1].all_points(), vec![(12.0, 50.0), (52.0, 50.0), (52.0, 61.0)]);
    }

    #[test]
    fn zone_without_id_is_skipped() {
        let text = r#"<doc><zone><token-image><point x="1" y="2"/></token-image></zone></doc>"#;
        assert!(parse_markup(text).unwrap().is_empty());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_markup("<madcat><zone id=").is_err());
    }

    #[test]
    fn missing_file_reports_missing_annotation() {
        let err = parse_page_markup(Path::new("/nonexistent/p.madcat.xml")).unwrap_err();
        assert!(matches!(err, Error::MissingAnnotation { .. }));
    }

    #[test]
    fn resolver_prefers_earlier_roots() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::default();
        for root in [first.path(), second.path()] {
            fs::create_dir_all(root.join("madcat")).unwrap();
        }
        fs::write(second.path().join("madcat/page_01.madcat.xml"), SAMPLE).unwrap();

        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let location = resolve_page(&roots, &layout, "page_01").unwrap();
        assert_eq!(location.root_index, 1);
        assert_eq!(
            location.image_path,
            second.path().join("images/page_01.tif")
        );

        fs::write(first.path().join("madcat/page_01.madcat.xml"), SAMPLE).unwrap();
        let location = resolve_page(&roots, &layout, "page_01").unwrap();
        assert_eq!(location.root_index, 0);

        assert!(resolve_page(&roots, &layout, "page_02").is_none());
    }

    #[test]
    fn writing_condition_filtering() {
        let mut table = HashMap::new();
        table.insert("page_01".to_string(), "IUC".to_string());
        table.insert("page_02".to_string(), "CLE".to_string());

        assert!(check_writing_condition(Some(&table), "page_01", None));
        assert!(check_writing_condition(None, "page_01", Some("IUC")));
        assert!(check_writing_condition(Some(&table), "page_01", Some("IUC")));
        assert!(!check_writing_condition(Some(&table), "page_02", Some("IUC")));
        assert!(!check_writing_condition(Some(&table), "page_99", Some("IUC")));
    }

    #[test]
    fn writing_condition_table_parses_and_skips_short_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("writing_conditions.tab");
        fs::write(
            &path,
            "page_01\tscribe_7\tfast\tIUC\npage_02\tscribe_2\tslow\tCLE\nbroken line\n",
        )
        .unwrap();

        let table = parse_writing_conditions(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["page_01"], "IUC");
        assert_eq!(table["page_02"], "CLE");
    }
}
