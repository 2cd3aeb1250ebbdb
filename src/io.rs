use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{FrateError, FrateResult};
use crate::group::{GroupSink, TrialSeries};
use crate::spike_set::SpikeEvent;

pub const MAX_RATE_FILE_NAME: &str = "max.out";

fn io_error(path: &Path, e: std::io::Error) -> FrateError {
    FrateError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Reads `<time> <neuron index>` records, one per line. Blank lines are skipped and columns
/// after the second are ignored. A line that is not valid UTF-8 is a malformed record.
pub fn parse_events<R: BufRead>(trial_id: &str, reader: R) -> FrateResult<Vec<SpikeEvent>> {
    let mut events = Vec::new();

    for (line_idx, line) in reader.split(b'\n').enumerate() {
        let line_no = line_idx + 1;
        let line = line.map_err(|e| FrateError::Io {
            path: trial_id.to_string(),
            message: e.to_string(),
        })?;

        let line = String::from_utf8(line).map_err(|e| FrateError::NumericParse {
            trial_id: trial_id.to_string(),
            line: line_no,
            content: String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let event = parse_event(&line, line_no).ok_or_else(|| FrateError::NumericParse {
            trial_id: trial_id.to_string(),
            line: line_no,
            content: line.trim_end_matches('\r').to_string(),
        })?;

        events.push(event);
    }

    Ok(events)
}

fn parse_event(line: &str, line_no: usize) -> Option<SpikeEvent> {
    let mut fields = line.split_whitespace();
    let time: f64 = fields.next()?.parse().ok()?;
    let nid = parse_neuron_index(fields.next()?)?;

    Some(SpikeEvent::at_line(time, nid, line_no))
}

// indices may be written as floats, e.g. "12.0"
fn parse_neuron_index(field: &str) -> Option<usize> {
    if let Ok(nid) = field.parse::<usize>() {
        return Some(nid);
    }

    let nid: f64 = field.parse().ok()?;

    if nid.is_finite() && nid >= 0.0 && nid.fract() == 0.0 && nid <= usize::MAX as f64 {
        Some(nid as usize)
    } else {
        None
    }
}

/// Reads the events of `<data_dir>/<trial_id>`.
pub fn read_trial_events(data_dir: &Path, trial_id: &str) -> FrateResult<Vec<SpikeEvent>> {
    let path = data_dir.join(trial_id);
    let file = File::open(&path).map_err(|e| io_error(&path, e))?;
    let events = parse_events(trial_id, BufReader::new(file))?;

    log::info!("read {} events from {}", events.len(), path.display());

    Ok(events)
}

/// Where trial files are read from: a directory, or a `.zip` archive holding one entry per
/// trial.
pub enum TrialSource {
    Directory(PathBuf),
    Archive {
        path: PathBuf,
        archive: ZipArchive<File>,
    },
}

impl TrialSource {
    pub fn open(path: &Path) -> FrateResult<Self> {
        if path.is_dir() {
            return Ok(TrialSource::Directory(path.to_path_buf()));
        }

        let is_zip = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("zip"));

        if !is_zip {
            return Err(FrateError::configuration(format!(
                "{} is neither a directory nor a .zip archive",
                path.display()
            )));
        }

        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let archive = ZipArchive::new(file).map_err(|e| zip_error(path, e))?;

        log::info!("opened {} with {} entries", path.display(), archive.len());

        Ok(TrialSource::Archive {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Names of the trial files available in this source, sorted.
    pub fn trial_ids(&self) -> FrateResult<Vec<String>> {
        let mut trial_ids: Vec<String> = match self {
            TrialSource::Directory(dir) => fs::read_dir(dir)
                .map_err(|e| io_error(dir, e))?
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect(),
            TrialSource::Archive { archive, .. } => archive
                .file_names()
                .filter(|name| !name.ends_with('/'))
                .map(str::to_string)
                .collect(),
        };

        trial_ids.sort();
        Ok(trial_ids)
    }

    pub fn read_trial_events(&mut self, trial_id: &str) -> FrateResult<Vec<SpikeEvent>> {
        match self {
            TrialSource::Directory(dir) => read_trial_events(dir, trial_id),
            TrialSource::Archive { path, archive } => {
                let entry_path = path.join(trial_id);
                let entry = archive
                    .by_name(trial_id)
                    .map_err(|e| zip_error(&entry_path, e))?;
                let events = parse_events(trial_id, BufReader::new(entry))?;

                log::info!("read {} events from {}", events.len(), entry_path.display());

                Ok(events)
            }
        }
    }
}

fn zip_error(path: &Path, e: ZipError) -> FrateError {
    FrateError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Writes every (group, trial) series to `<dir>/<group>.frate.<trial>` and the group maxima
/// to `<dir>/max.out`.
pub struct TextOutput {
    dir: PathBuf,
    max_rate_writer: BufWriter<File>,
}

impl TextOutput {
    pub fn create(dir: &Path) -> FrateResult<Self> {
        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

        let max_rate_path = dir.join(MAX_RATE_FILE_NAME);
        let max_rate_file = File::create(&max_rate_path).map_err(|e| io_error(&max_rate_path, e))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            max_rate_writer: BufWriter::new(max_rate_file),
        })
    }

    pub fn series_path(&self, group_name: &str, trial_id: &str) -> PathBuf {
        self.dir.join(format!("{}.frate.{}", group_name, trial_id))
    }
}

impl GroupSink for TextOutput {
    fn write_series(&mut self, group_name: &str, series: &TrialSeries<'_>) -> FrateResult<()> {
        let path = self.series_path(group_name, series.trial_id);
        log::info!("writing {}", path.display());

        let file = File::create(&path).map_err(|e| io_error(&path, e))?;
        let mut writer = BufWriter::new(file);

        for row in series.rows() {
            write!(writer, "{}", row.time).map_err(|e| io_error(&path, e))?;

            for rate in &row.rates {
                write!(writer, " {}", rate).map_err(|e| io_error(&path, e))?;
            }

            writeln!(writer).map_err(|e| io_error(&path, e))?;
        }

        writer.flush().map_err(|e| io_error(&path, e))
    }

    fn write_max_rate(&mut self, group_name: &str, max_rate: f64) -> FrateResult<()> {
        let path = self.dir.join(MAX_RATE_FILE_NAME);

        writeln!(self.max_rate_writer, "{} {}", group_name, max_rate)
            .and_then(|_| self.max_rate_writer.flush())
            .map_err(|e| io_error(&path, e))
    }
}
