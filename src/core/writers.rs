//! Writers for movement tables and the point and line layers.
//!
//! All outputs are CSV:
//! - interval/total movement tables, one row per [`MovementRecord`]
//! - a point layer with every observation
//! - a line layer with one time-ordered `LINESTRING Z` per point id

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use super::observation::{MovementRecord, Observation, ObservationGroup};
use crate::config::OutputConfig;
use crate::processors::metrics::{planar_distance, round_to};

/// Column headers of the movement tables.
pub const CHANGE_HEADERS: [&str; 14] = [
    "index", "from_time", "from_id", "x1", "y1", "z1", "to_time", "to_id", "x2", "y2", "z2",
    "distance", "delta_z", "azimuth",
];

/// Decimal places kept for line lengths.
const LENGTH_DECIMALS: u32 = 2;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to flush data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// Output exists and overwriting is disabled.
    #[error("output file '{0}' already exists and overwrite is disabled")]
    AlreadyExists(String),
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Every file produced for one input survey file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub interval: PathBuf,
    pub total: PathBuf,
    pub points: PathBuf,
    pub lines: PathBuf,
    pub plot: PathBuf,
}

impl OutputPaths {
    /// Derive output paths from the input file stem.
    ///
    /// Files land next to the input unless `output_dir` is given.
    pub fn for_input(input: &Path, output_dir: Option<&Path>, config: &OutputConfig) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "survey".to_string());
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        let join = |suffix: &str| dir.join(format!("{}{}", stem, suffix));

        Self {
            interval: join(&config.interval_suffix),
            total: join(&config.total_suffix),
            points: join(&config.points_suffix),
            lines: join(&config.lines_suffix),
            plot: join(&config.plot_suffix),
        }
    }

    fn all(&self) -> [&Path; 5] {
        [
            &self.interval,
            &self.total,
            &self.points,
            &self.lines,
            &self.plot,
        ]
    }

    /// Fail if any output already exists and `overwrite` is off.
    pub fn ensure_writable(&self, overwrite: bool) -> Result<()> {
        if overwrite {
            return Ok(());
        }
        match self.all().into_iter().find(|p| p.exists()) {
            Some(existing) => Err(WriteError::AlreadyExists(existing.display().to_string())),
            None => Ok(()),
        }
    }
}

/// Creates parent directories for a file path if they don't exist.
pub(crate) fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Opens a CSV writer on a fresh file, creating parent directories.
fn create_csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    ensure_parent_dirs(path)?;
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(csv::Writer::from_writer(BufWriter::new(file)))
}

fn write_row<I, T>(writer: &mut csv::Writer<BufWriter<File>>, path_str: &str, row: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer.write_record(row).map_err(|e| WriteError::CsvError {
        path: path_str.to_string(),
        source: e,
    })
}

fn finish(mut writer: csv::Writer<BufWriter<File>>, path_str: String) -> Result<()> {
    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })
}

/// Write a movement table (interval or total changes) to CSV.
///
/// Columns follow [`CHANGE_HEADERS`]. `index` is the 0-based row number in
/// the sorted table, not the order in which the records were generated.
///
/// # Errors
///
/// Returns an error if the file or its parent directories cannot be created
/// or written.
pub fn write_changes_csv(path: &Path, records: &[MovementRecord]) -> Result<()> {
    let mut writer = create_csv_writer(path)?;
    let path_str = path.display().to_string();

    write_row(&mut writer, &path_str, CHANGE_HEADERS)?;

    for (index, r) in records.iter().enumerate() {
        write_row(
            &mut writer,
            &path_str,
            [
                index.to_string(),
                r.from_time.to_string(),
                r.from_id.to_string(),
                r.x1.to_string(),
                r.y1.to_string(),
                r.z1.to_string(),
                r.to_time.to_string(),
                r.to_id.to_string(),
                r.x2.to_string(),
                r.y2.to_string(),
                r.z2.to_string(),
                r.distance.to_string(),
                r.delta_z.to_string(),
                r.azimuth.to_string(),
            ],
        )?;
    }

    debug!("Wrote {} movement rows to {}", records.len(), path_str);
    finish(writer, path_str)
}

/// Write every observation as a point layer with `x, y, z, time, id` columns,
/// in the order given.
pub fn write_points_csv(path: &Path, observations: &[Observation]) -> Result<()> {
    let mut writer = create_csv_writer(path)?;
    let path_str = path.display().to_string();

    write_row(&mut writer, &path_str, ["x", "y", "z", "time", "id"])?;

    for obs in observations {
        write_row(
            &mut writer,
            &path_str,
            [
                obs.x.to_string(),
                obs.y.to_string(),
                obs.z.to_string(),
                obs.time.to_string(),
                obs.id.to_string(),
            ],
        )?;
    }

    finish(writer, path_str)
}

/// Planar length of a polyline through `coords`.
pub fn polyline_length(coords: &[[f64; 3]]) -> f64 {
    coords
        .windows(2)
        .map(|w| planar_distance(w[0][0], w[0][1], w[1][0], w[1][1]))
        .sum()
}

/// Well-known-text `LINESTRING Z` through `coords`.
///
/// A single vertex is repeated so the geometry stays a valid line.
pub fn linestring_wkt(coords: &[[f64; 3]]) -> String {
    let mut vertices: Vec<String> = coords
        .iter()
        .map(|[x, y, z]| format!("{} {} {}", x, y, z))
        .collect();
    if vertices.len() == 1 {
        vertices.push(vertices[0].clone());
    }
    format!("LINESTRING Z ({})", vertices.join(", "))
}

/// Write one movement line per point id.
///
/// Columns: `point_id, id_field_type, vertex_count, length, wkt`. Vertices
/// follow survey order; `length` is the planar length to two decimals.
pub fn write_lines_csv(path: &Path, groups: &[ObservationGroup]) -> Result<()> {
    let mut writer = create_csv_writer(path)?;
    let path_str = path.display().to_string();

    write_row(
        &mut writer,
        &path_str,
        ["point_id", "id_field_type", "vertex_count", "length", "wkt"],
    )?;

    for group in groups {
        let coords = group.coordinates();
        let length = round_to(polyline_length(&coords), LENGTH_DECIMALS);
        write_row(
            &mut writer,
            &path_str,
            [
                group.id().to_string(),
                group.id().kind().as_str().to_string(),
                coords.len().to_string(),
                length.to_string(),
                linestring_wkt(&coords),
            ],
        )?;
    }

    finish(writer, path_str)
}
