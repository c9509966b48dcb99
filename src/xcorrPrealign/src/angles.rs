
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::tilt_series::TiltSeries;


/// A `.rawtlt` file: one tilt angle (degrees) per line, in acquisition order.
#[derive(Debug, Clone, PartialEq)]
pub struct TiltAngleFile {
	pub angles: Vec<f64>
}

impl TiltAngleFile {

	pub fn from_tilt_series(ts: &TiltSeries) -> Self {
		Self {
			angles: ts.images.iter()
				.map(|ti| ti.tilt_angle)
				.collect()
		}
	}

	pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {

		let path = path.as_ref();
		let file = File::create(path)
			.context(format!("Failed to open angle file for writing: {}", path.to_string_lossy()))?;
		let mut writer = BufWriter::new(file);

		for angle in &self.angles {
			writeln!(writer, "{}", angle)
				.context(format!("Failed to write angle file: {}", path.to_string_lossy()))?;
		}

		writer.flush()
			.context(format!("Failed to flush angle file: {}", path.to_string_lossy()))?;

		Ok(())
	}

	pub fn read(path: impl AsRef<Path>) -> Result<Self> {

		let path = path.as_ref();
		let text = fs::read_to_string(path)
			.context(format!("Failed to read angle file: {}", path.to_string_lossy()))?;

		let angles = text.lines()
			.enumerate()
			.filter(|(_, line)| !line.trim().is_empty())
			.map(|(i, line)| {
				line.trim()
					.parse::<f64>()
					.context(format!("Angle file {} line {} is not a number: {}", path.to_string_lossy(), i, line))
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(Self {
			angles
		})
	}
}


#[cfg(test)]
mod test {

	use galvanic_assert::{assert_that, matchers::*};

	use super::*;


	#[test]
	fn write_read() {
		let dir = assert_fs::TempDir::new()
			.expect("Failed to make temp folder");
		let path = dir.path().join("ts.rawtlt");

		let angles = vec![-60.0, -57.125, 0.0, 1.0049, 3.5];
		TiltAngleFile { angles: angles.clone() }
			.write(&path)
			.expect("Failed to write");

		// no rounding
		let text = fs::read_to_string(&path)
			.expect("Failed to read");
		assert_that!(&text.as_str(), eq("-60\n-57.125\n0\n1.0049\n3.5\n"));

		let read = TiltAngleFile::read(&path)
			.expect("Failed to read");
		assert_that!(&read.angles, eq(angles));
	}

	#[test]
	fn read_garbage() {
		let dir = assert_fs::TempDir::new()
			.expect("Failed to make temp folder");
		let path = dir.path().join("ts.rawtlt");
		fs::write(&path, "1.0\nnope\n")
			.expect("Failed to write");
		assert_that!(&TiltAngleFile::read(&path).is_err(), eq(true));
	}
}
