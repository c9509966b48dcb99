
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::transforms::XfError;


/// A homogeneous 2D affine transform, row-major.
/// The bottom row is always [0, 0, 1]: there is no projective component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 3]; 3]", into = "[[f64; 3]; 3]")]
pub struct AffineTransform {
	rows: [[f64; 3]; 3]
}

impl AffineTransform {

	pub const BOTTOM_ROW: [f64; 3] = [0.0, 0.0, 1.0];

	pub fn identity() -> Self {
		Self::from_parts([[1.0, 0.0], [0.0, 1.0]], [0.0, 0.0])
	}

	/// builds the transform from its 2x2 linear part and its translation
	pub fn from_parts(linear: [[f64; 2]; 2], translation: [f64; 2]) -> Self {
		Self {
			rows: [
				[linear[0][0], linear[0][1], translation[0]],
				[linear[1][0], linear[1][1], translation[1]],
				Self::BOTTOM_ROW
			]
		}
	}

	pub fn rows(&self) -> &[[f64; 3]; 3] {
		&self.rows
	}

	pub fn linear(&self) -> [[f64; 2]; 2] {
		[
			[self.rows[0][0], self.rows[0][1]],
			[self.rows[1][0], self.rows[1][1]]
		]
	}

	pub fn translation(&self) -> [f64; 2] {
		[self.rows[0][2], self.rows[1][2]]
	}

	/// maps the point (x, y)
	pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
		let r = &self.rows;
		(
			r[0][0]*x + r[0][1]*y + r[0][2],
			r[1][0]*x + r[1][1]*y + r[1][2]
		)
	}
}

impl Index<(usize, usize)> for AffineTransform {

	type Output = f64;

	fn index(&self, (row, col): (usize, usize)) -> &f64 {
		&self.rows[row][col]
	}
}

impl From<[[f64; 3]; 3]> for AffineTransform {

	// whatever the bottom row said, it's affine now
	fn from(rows: [[f64; 3]; 3]) -> Self {
		Self::from_parts(
			[[rows[0][0], rows[0][1]], [rows[1][0], rows[1][1]]],
			[rows[0][2], rows[1][2]]
		)
	}
}

impl From<AffineTransform> for [[f64; 3]; 3] {
	fn from(xf: AffineTransform) -> Self {
		xf.rows
	}
}

impl fmt::Display for AffineTransform {

	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, row) in self.rows.iter().enumerate() {
			if i > 0 {
				writeln!(f)?;
			}
			write!(f, "[{:>12.6} {:>12.6} {:>12.6} ]", row[0], row[1], row[2])?;
		}
		Ok(())
	}
}


/// One transform per tilt image, in acquisition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformStack {
	transforms: Vec<AffineTransform>
}

impl TransformStack {

	pub fn new(transforms: Vec<AffineTransform>) -> Self {
		Self {
			transforms
		}
	}

	pub fn len(&self) -> usize {
		self.transforms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transforms.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&AffineTransform> {
		self.transforms.get(index)
	}

	pub fn iter(&self) -> std::slice::Iter<'_, AffineTransform> {
		self.transforms.iter()
	}

	/// The terminator-line rule of the transform file shifts everything by one
	/// if TomoJ ever changes its footer, so callers compare against the tilt count.
	pub fn check_tilt_count(&self, expected: usize) -> Result<(), XfError> {
		if self.len() != expected {
			return Err(XfError::TiltCount {
				expected,
				found: self.len()
			});
		}
		Ok(())
	}
}

impl IntoIterator for TransformStack {

	type Item = AffineTransform;
	type IntoIter = std::vec::IntoIter<AffineTransform>;

	fn into_iter(self) -> Self::IntoIter {
		self.transforms.into_iter()
	}
}

impl<'a> IntoIterator for &'a TransformStack {

	type Item = &'a AffineTransform;
	type IntoIter = std::slice::Iter<'a, AffineTransform>;

	fn into_iter(self) -> Self::IntoIter {
		self.transforms.iter()
	}
}
