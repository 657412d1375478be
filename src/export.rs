//! WAVE export and display formatting

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::audio::{encode, SampleBuffer};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `Story_<YYYY-MM-DD>.wav`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("Story_{}.wav", date.format("%Y-%m-%d"))
}

/// Export file name stamped with today's UTC date
pub fn default_file_name() -> String {
    export_file_name(Utc::now().date_naive())
}

/// Encode `track` and write it to `path`; returns the number of bytes written
pub fn export_wav(track: &SampleBuffer, path: impl AsRef<Path>) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let bytes = encode(track);

    fs::write(path, &bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!(
        "Exported {:.2}s to {} ({} bytes)",
        track.duration_secs(),
        path.display(),
        bytes.len()
    );
    Ok(bytes.len())
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "Story_2024-03-07.wav");
        assert!(default_file_name().starts_with("Story_"));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(9.99), "0:09");
        assert_eq!(format_time(65.2), "1:05");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_export_four_second_track() {
        let dir = tempfile::tempdir().unwrap();
        let track = SampleBuffer::new(vec![0.25; 96_000], 24_000);
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

        let path = dir.path().join(export_file_name(date));
        assert_eq!(export_wav(&track, &path).unwrap(), 192_044);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 192_044);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 192_008);
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 192_000);

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), 96_000);
        let first: i16 = reader.samples::<i16>().next().unwrap().unwrap();
        assert_eq!(first, 8192);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let track = SampleBuffer::new(vec![0.0; 10], 24_000);
        let err = export_wav(&track, dir.path().join("nope").join("x.wav")).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
