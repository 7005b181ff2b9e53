//! CSV rendering of the three result streams

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::OutputFiles;
use crate::error::{SimError, SimResult};
use crate::simulation::{EarthSample, SampleSink, SunSample};
use crate::time::format_utcg;
use crate::visibility::AccessWindow;

pub const SUN_HEADER: &str = r#""Time (UTCG)","Azimuth (deg)","Elevation (deg)","Subsolar (deg)""#;
pub const EARTH_HEADER: &str = r#""Time (UTCG)","Azimuth (deg)","Elevation (deg)""#;
pub const ACCESS_HEADER: &str = r#""Access","Start Time (UTCG)","Stop Time (UTCG)","Duration (sec)""#;

pub fn sun_row(sample: &SunSample) -> String {
    format!(
        "{},{:07.3},{:07.3},{:07.3}",
        format_utcg(&sample.epoch),
        sample.azimuth,
        sample.elevation,
        sample.subsolar
    )
}

pub fn earth_row(sample: &EarthSample) -> String {
    format!(
        "{},{:07.3},{:07.3}",
        format_utcg(&sample.epoch),
        sample.azimuth,
        sample.elevation
    )
}

pub fn access_row(window: &AccessWindow) -> String {
    format!(
        "{},{},{},{:07.3}",
        window.sequence,
        format_utcg(&window.start),
        format_utcg(&window.stop),
        window.duration()
    )
}

/// Writes each stream to its own CSV destination
pub struct CsvSink<W: Write> {
    sun: W,
    earth: W,
    access: W,
}

impl CsvSink<BufWriter<File>> {
    /// Create the result directory and the three files, headers included
    pub fn create(files: &OutputFiles) -> SimResult<Self> {
        std::fs::create_dir_all(&files.directory)
            .map_err(|e| SimError::sink(files.directory.display().to_string(), e))?;

        let sink = Self::new(
            open(&files.sun_angles_path())?,
            open(&files.earth_angles_path())?,
            open(&files.access_times_path())?,
        )?;
        log::info!("Writing results to {:?}", files.directory);
        Ok(sink)
    }
}

fn open(path: &Path) -> SimResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| SimError::sink(path.display().to_string(), e))
}

impl<W: Write> CsvSink<W> {
    /// Wrap three writers and emit the headers
    pub fn new(mut sun: W, mut earth: W, mut access: W) -> SimResult<Self> {
        writeln!(sun, "{}", SUN_HEADER).map_err(|e| SimError::sink("sun angles", e))?;
        writeln!(earth, "{}", EARTH_HEADER).map_err(|e| SimError::sink("earth angles", e))?;
        writeln!(access, "{}", ACCESS_HEADER).map_err(|e| SimError::sink("access times", e))?;
        Ok(Self { sun, earth, access })
    }

    pub fn flush(&mut self) -> SimResult<()> {
        self.sun.flush().map_err(|e| SimError::sink("sun angles", e))?;
        self.earth.flush().map_err(|e| SimError::sink("earth angles", e))?;
        self.access.flush().map_err(|e| SimError::sink("access times", e))?;
        Ok(())
    }

    /// Flush and hand back the writers
    pub fn into_inner(mut self) -> SimResult<(W, W, W)> {
        self.flush()?;
        Ok((self.sun, self.earth, self.access))
    }
}

impl<W: Write> SampleSink for CsvSink<W> {
    fn sun_sample(&mut self, sample: &SunSample) -> SimResult<()> {
        writeln!(self.sun, "{}", sun_row(sample)).map_err(|e| SimError::sink("sun angles", e))
    }

    fn earth_sample(&mut self, sample: &EarthSample) -> SimResult<()> {
        writeln!(self.earth, "{}", earth_row(sample)).map_err(|e| SimError::sink("earth angles", e))
    }

    fn access_window(&mut self, window: &AccessWindow) -> SimResult<()> {
        writeln!(self.access, "{}", access_row(window)).map_err(|e| SimError::sink("access times", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{epoch_from_calendar, shifted, TimeScale};
    use satkit::Instant;

    fn t0() -> Instant {
        epoch_from_calendar(2020, 1, 1, 0, 0, 0.0, TimeScale::Utc).unwrap()
    }

    #[test]
    fn test_row_formats() {
        let sun = SunSample {
            epoch: t0(),
            azimuth: 5.0,
            elevation: -12.3456,
            subsolar: 123.4564,
        };
        assert_eq!(sun_row(&sun), "1 Jan 2020 00:00:00.000,005.000,-12.346,123.456");

        let earth = EarthSample {
            epoch: shifted(&t0(), 61.5),
            azimuth: 0.0,
            elevation: 90.0,
        };
        assert_eq!(earth_row(&earth), "1 Jan 2020 00:01:01.500,000.000,090.000");

        let window = AccessWindow {
            sequence: 3,
            start: shifted(&t0(), 3600.0),
            stop: shifted(&t0(), 3600.0 + 512.25),
        };
        assert_eq!(
            access_row(&window),
            "3,1 Jan 2020 01:00:00.000,1 Jan 2020 01:08:32.250,512.250"
        );
    }

    #[test]
    fn test_writes_headers_and_rows() {
        let mut sink = CsvSink::new(Vec::new(), Vec::new(), Vec::new()).unwrap();
        sink.sun_sample(&SunSample {
            epoch: t0(),
            azimuth: 10.0,
            elevation: 20.0,
            subsolar: 30.0,
        })
        .unwrap();
        let (sun, earth, access) = sink.into_inner().unwrap();

        let sun = String::from_utf8(sun).unwrap();
        let lines: Vec<&str> = sun.lines().collect();
        assert_eq!(lines, vec![SUN_HEADER, "1 Jan 2020 00:00:00.000,010.000,020.000,030.000"]);
        assert_eq!(String::from_utf8(earth).unwrap().trim_end(), EARTH_HEADER);
        assert_eq!(String::from_utf8(access).unwrap().trim_end(), ACCESS_HEADER);
    }

    #[test]
    fn test_create_files_in_results_directory() {
        let dir = tempfile::tempdir().unwrap();
        let files = OutputFiles {
            directory: dir.path().join("results"),
            sun_angles: "sun.csv".to_string(),
            earth_angles: "earth.csv".to_string(),
            access_times: "access.csv".to_string(),
        };

        let mut sink = CsvSink::create(&files).unwrap();
        sink.access_window(&AccessWindow {
            sequence: 1,
            start: t0(),
            stop: shifted(&t0(), 60.0),
        })
        .unwrap();
        sink.flush().unwrap();

        let access = std::fs::read_to_string(files.access_times_path()).unwrap();
        assert_eq!(
            access.lines().collect::<Vec<_>>(),
            vec![ACCESS_HEADER, "1,1 Jan 2020 00:00:00.000,1 Jan 2020 00:01:00.000,060.000"]
        );
        assert!(files.sun_angles_path().exists());
    }
}
