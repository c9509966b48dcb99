
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::matrix::AffineTransform;


/// where an image lives: 1-based index into a stack file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLocation {
	pub index: usize,
	pub path: PathBuf
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiltImage {
	pub obj_id: u32,
	pub tilt_angle: f64,
	pub location: ImageLocation,
	pub sampling_rate: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub transform: Option<AffineTransform>
}

impl TiltImage {

	/// copies everything but the location and transform
	pub fn copy_info(&self, location: ImageLocation) -> Self {
		Self {
			obj_id: self.obj_id,
			tilt_angle: self.tilt_angle,
			location,
			sampling_rate: self.sampling_rate,
			transform: None
		}
	}
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiltSeries {
	pub ts_id: String,
	pub sampling_rate: f64,
	/// (x, y, number of images)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dim: Option<(u32, u32, u32)>,
	pub images: Vec<TiltImage>
}

impl TiltSeries {

	/// an empty series with the same id and info
	pub fn copy_info(&self) -> Self {
		Self {
			ts_id: self.ts_id.clone(),
			sampling_rate: self.sampling_rate,
			dim: self.dim,
			images: Vec::new()
		}
	}

	pub fn len(&self) -> usize {
		self.images.len()
	}

	pub fn is_empty(&self) -> bool {
		self.images.is_empty()
	}

	/// the stack file shared by the images, if they're all in one
	pub fn stack_path(&self) -> Result<&Path> {
		let first = self.images.first()
			.context(format!("Tilt-series {} has no images", self.ts_id))?;
		let path = first.location.path.as_path();
		if let Some(other) = self.images.iter().find(|ti| ti.location.path != path) {
			anyhow::bail!("Tilt-series {} spans several stacks: {} and {}",
				self.ts_id, path.to_string_lossy(), other.location.path.to_string_lossy());
		}
		Ok(path)
	}
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOfTiltSeries {
	pub sampling_rate: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dim: Option<(u32, u32, u32)>,
	pub series: Vec<TiltSeries>
}

impl SetOfTiltSeries {

	pub fn read(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let json = fs::read_to_string(path)
			.context(format!("Failed to read tilt-series set: {}", path.to_string_lossy()))?;
		serde_json::from_str(&json)
			.context(format!("Failed to parse tilt-series set: {}", path.to_string_lossy()))
	}

	pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let json = serde_json::to_string_pretty(self)
			.context("Failed to serialize tilt-series set")?;
		fs::write(path, json)
			.context(format!("Failed to write tilt-series set: {}", path.to_string_lossy()))
	}

	pub fn len(&self) -> usize {
		self.series.len()
	}

	pub fn is_empty(&self) -> bool {
		self.series.is_empty()
	}
}
