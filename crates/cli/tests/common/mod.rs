//! Fixture workspace shared by the CLI test suites.
//!
//! Lays out, in a temp dir:
//!
//! ```text
//! countries.json       Testland (forest 100 km², land 200 km²), Secondia
//! maps/TST.png         10x10, left half land (#d3d3d3): 50 land pixels
//! maps/SEC.png
//! deforest.toml        file storage, static measurement, dir publisher
//! ```

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

pub const LAND: Rgba<u8> = Rgba([0xd3, 0xd3, 0xd3, 255]);
const SEA: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// A fixture whose static source reports `area_km2` per period.
    pub fn new(area_km2: f64) -> Self {
        Self::with_publisher(area_km2, "dir")
    }

    pub fn with_publisher(area_km2: f64, publisher_kind: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();

        fs::write(
            root.join("countries.json"),
            r#"[
                {"code": "TST", "name": "Testland", "area": 100, "land_area": 200},
                {"code": "SEC", "name": "Secondia", "area": 50, "land_area": 100}
            ]"#,
        )
        .expect("write countries");

        fs::create_dir_all(root.join("maps")).expect("maps dir");
        let map = RgbaImage::from_fn(10, 10, |x, _| if x < 5 { LAND } else { SEA });
        for code in ["TST", "SEC"] {
            map.save(root.join("maps").join(format!("{}.png", code)))
                .expect("write map");
        }

        let config = format!(
            r#"
log_level = "warn"

[routine]
request_delay_ms = 0

[storage]
kind = "file"
dir = "{root}/data"

[countries]
list = "{root}/countries.json"

[maps]
template = "{root}/maps/{{code}}.png"

[measurement]
kind = "static"
static_area_km2 = {area_km2:?}

[publisher]
kind = "{publisher_kind}"
dir = "{root}/published"
"#,
            root = root.display(),
        );
        fs::write(root.join("deforest.toml"), config).expect("write config");

        Fixture { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("deforest.toml")
    }

    /// Lines of `data/<name>`, or none when the file does not exist.
    pub fn store_lines(&self, name: &str) -> Vec<serde_json::Value> {
        match fs::read_to_string(self.root().join("data").join(name)) {
            Ok(content) => content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| serde_json::from_str(l).expect("valid JSON line"))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// File names in `published/`, sorted.
    pub fn published(&self) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(self.root().join("published")) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}
