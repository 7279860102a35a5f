//! Prepares an OSRM routing dataset for the container-backed tests.
//!
//! Downloads a Geofabrik extract once, then runs the OSRM toolchain in
//! docker (extract, partition, customize) so `osrm-routed --algorithm mld`
//! can serve it. Every step is skipped when its output already exists.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Southern Brazil extract; covers every fixture city.
pub const BRAZIL_SUL: &str = "south-america/brazil/sul";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset I/O: {0}")]
    Io(#[from] io::Error),
    #[error("dataset download: {0}")]
    Http(#[from] reqwest::Error),
    #[error("osrm tool failed: {0}")]
    Docker(String),
}

/// A prepared region on disk.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Mounted as `/data` in the OSRM container.
    pub dir: PathBuf,
    /// File name of the `.osrm` base inside `dir`.
    pub osrm_file: String,
}

impl Dataset {
    /// Ensures `region` (a Geofabrik path) is downloaded and preprocessed under `root`.
    pub fn prepare(region: &str, root: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let name = region.rsplit('/').next().unwrap_or("region").to_string();
        let root = root.as_ref();
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        let dir = root.join(&name);
        fs::create_dir_all(&dir)?;

        let pbf_file = format!("{}-latest.osm.pbf", name);
        let pbf_path = dir.join(&pbf_file);
        if !pbf_path.exists() {
            let url = format!("https://download.geofabrik.de/{}-latest.osm.pbf", region);
            download(&url, &pbf_path)?;
        }

        let osrm_file = format!("{}-latest.osrm", name);
        let osrm_path = dir.join(&osrm_file);
        if !osrm_path.exists() {
            osrm_tool(&dir, &["osrm-extract", "-p", "/opt/car.lua", &format!("/data/{}", pbf_file)])?;
        }
        if !partitioned(&osrm_path) {
            osrm_tool(&dir, &["osrm-partition", &format!("/data/{}", osrm_file)])?;
            osrm_tool(&dir, &["osrm-customize", &format!("/data/{}", osrm_file)])?;
        }

        Ok(Self { dir, osrm_file })
    }

    /// Seconds since the epoch of the last preprocessing run, for container naming.
    pub fn stamp(&self) -> u64 {
        fs::metadata(self.dir.join(format!("{}.partition", self.osrm_file)))
            .ok()
            .and_then(|meta| meta.modified().ok())
            .and_then(|time| time.duration_since(std::time::SystemTime::UNIX_EPOCH).ok())
            .map(|duration| duration.as_secs())
            .unwrap_or(0)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), DatasetError> {
    let response = reqwest::blocking::Client::builder()
        .timeout(None)
        .build()?
        .get(url)
        .send()?
        .error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    writer.write_all(&response.bytes()?)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}

fn partitioned(osrm_path: &Path) -> bool {
    ["partition", "mldgr", "cells"]
        .iter()
        .all(|ext| osrm_path.with_extension(format!("osrm.{}", ext)).exists())
}

fn osrm_tool(dir: &Path, args: &[&str]) -> Result<(), DatasetError> {
    let status = Command::new("docker")
        .args(["run", "--rm", "-t", "-v"])
        .arg(format!("{}:/data", dir.display()))
        .arg("osrm/osrm-backend")
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(DatasetError::Docker(format!("{} exited with {}", args[0], status)))
    }
}
