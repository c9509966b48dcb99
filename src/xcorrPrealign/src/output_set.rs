
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::tilt_series::{SetOfTiltSeries, TiltSeries};


#[derive(Debug, PartialEq, thiserror::Error)]
pub enum OutputSetError {

	#[error("Output set {0} is closed, can't append tilt-series {1}")]
	Closed(String, String),

	#[error("Output set {0} already has tilt-series {1}")]
	Duplicate(String, String),

	#[error("Output set {0} is still open")]
	Open(String)
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetState {
	Open,
	Closed
}


/// Accumulates the tilt-series produced by one protocol run.
/// Appends are only accepted while open, writes only once closed.
#[derive(Debug)]
pub struct OutputSet {
	name: String,
	set: SetOfTiltSeries,
	state: SetState
}

impl OutputSet {

	/// starts an empty set carrying the set-level info of `source`
	pub fn open(name: impl Into<String>, source: &SetOfTiltSeries) -> Self {
		let name = name.into();
		debug!("Opened output set {}", name);
		Self {
			name,
			set: SetOfTiltSeries {
				sampling_rate: source.sampling_rate,
				dim: source.dim,
				series: Vec::new()
			},
			state: SetState::Open
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn state(&self) -> SetState {
		self.state
	}

	pub fn len(&self) -> usize {
		self.set.len()
	}

	pub fn is_empty(&self) -> bool {
		self.set.is_empty()
	}

	pub fn set_sampling_rate(&mut self, sampling_rate: f64) {
		self.set.sampling_rate = sampling_rate;
	}

	pub fn append(&mut self, ts: TiltSeries) -> Result<(),OutputSetError> {

		if self.state == SetState::Closed {
			return Err(OutputSetError::Closed(self.name.clone(), ts.ts_id));
		}
		if self.set.series.iter().any(|other| other.ts_id == ts.ts_id) {
			return Err(OutputSetError::Duplicate(self.name.clone(), ts.ts_id));
		}

		debug!("{}: appended {} with {} images", self.name, ts.ts_id, ts.len());
		self.set.series.push(ts);

		Ok(())
	}

	/// Closing twice is harmless.
	pub fn close(&mut self) -> &SetOfTiltSeries {
		if self.state == SetState::Open {
			info!("{}: closed with {} tilt-series", self.name, self.set.len());
			self.state = SetState::Closed;
		}
		&self.set
	}

	pub fn get(&self) -> Result<&SetOfTiltSeries,OutputSetError> {
		match self.state {
			SetState::Closed => Ok(&self.set),
			SetState::Open => Err(OutputSetError::Open(self.name.clone()))
		}
	}

	pub fn write(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
		let path = path.as_ref();
		self.get()?
			.write(path)
			.context(format!("Failed to write output set {}", self.name))?;
		info!("Wrote {} to {}", self.name, path.to_string_lossy());
		Ok(())
	}
}


#[cfg(test)]
mod test {

	use galvanic_assert::{assert_that, matchers::*};

	use crate::tilt_series::test::sample_series;
	use super::*;


	fn source() -> SetOfTiltSeries {
		SetOfTiltSeries {
			sampling_rate: 1.5,
			dim: Some((256, 256, 2)),
			series: vec![sample_series("ts_1", "ts_1.st", &[-1.0, 1.0])]
		}
	}


	#[test]
	fn lifecycle() {
		let mut out = OutputSet::open("aligned", &source());
		assert_that!(&out.state(), eq(SetState::Open));
		assert_that!(&out.is_empty(), eq(true));

		out.append(sample_series("ts_1", "ts_1.st", &[-1.0, 1.0]))
			.expect("Failed to append");
		assert_that!(&out.get().is_err(), eq(true));

		let set = out.close();
		assert_that!(&set.len(), eq(1));
		assert_that!(&set.sampling_rate, eq(1.5));
		assert_that!(&out.state(), eq(SetState::Closed));

		let err = out.append(sample_series("ts_2", "ts_2.st", &[0.0]))
			.expect_err("closed set should refuse appends");
		assert_that!(&err, eq(OutputSetError::Closed("aligned".to_string(), "ts_2".to_string())));
		assert_that!(&out.len(), eq(1));
	}

	#[test]
	fn duplicate() {
		let mut out = OutputSet::open("aligned", &source());
		out.append(sample_series("ts_1", "ts_1.st", &[0.0]))
			.expect("Failed to append");
		let err = out.append(sample_series("ts_1", "ts_1.st", &[0.0]))
			.expect_err("duplicate should fail");
		assert_that!(&matches!(err, OutputSetError::Duplicate(..)), eq(true));
	}

	#[test]
	fn write_needs_close() {
		let dir = assert_fs::TempDir::new()
			.expect("Failed to make temp folder");
		let path = dir.path().join("out.json");
		let mut out = OutputSet::open("aligned", &source());
		assert_that!(&out.write(&path).is_err(), eq(true));
		out.close();
		out.write(&path)
			.expect("Failed to write");
		let set = SetOfTiltSeries::read(&path)
			.expect("Failed to read");
		assert_that!(&set.is_empty(), eq(true));
	}
}
