
// TomoJ transformation-matrix files
//
// one line per tilt image, whitespace-separated:
//   [tilt angle] [tilt axis] [0,0] [1,0] [0,1] [1,1] [0,2] [1,2]
// followed by one trailing line that is not a data row.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::matrix::{AffineTransform, TransformStack};


pub const NUM_FIELDS: usize = 8;


#[derive(Debug, thiserror::Error)]
pub enum XfError {

	#[error("Failed to read transform file: {}", .path.to_string_lossy())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error
	},

	#[error("Malformed transform record at line {line}: expected at least 8 fields, found {fields}")]
	Malformed {
		line: usize,
		fields: usize
	},

	#[error("Transform record at line {line}, field {field} is not a number: {value}")]
	Number {
		line: usize,
		field: usize,
		value: String
	},

	#[error("Transform stack has {found} matrices, but the tilt-series has {expected} images")]
	TiltCount {
		expected: usize,
		found: usize
	}
}


/// reads a TomoJ transform file, one matrix per data line
pub fn parse_transforms(path: impl AsRef<Path>) -> Result<TransformStack,XfError> {

	let path = path.as_ref();
	let text = fs::read_to_string(path)
		.map_err(|source| XfError::Io {
			path: path.to_path_buf(),
			source
		})?;

	let stack = parse_transforms_str(&text)?;
	debug!("Read {} transforms from {}", stack.len(), path.to_string_lossy());

	Ok(stack)
}


/// Line indices in errors are 0-based, matching the tilt image index.
pub fn parse_transforms_str(text: &str) -> Result<TransformStack,XfError> {

	let lines = text.lines()
		.collect::<Vec<_>>();

	// the last line is TomoJ's footer, never a data row
	let num_records = lines.len().saturating_sub(1);

	let transforms = lines[..num_records].iter()
		.enumerate()
		.map(|(i, line)| parse_record(i, line))
		.collect::<Result<Vec<_>,_>>()?;

	Ok(TransformStack::new(transforms))
}


fn parse_record(line_i: usize, line: &str) -> Result<AffineTransform,XfError> {

	let fields = line.split_whitespace()
		.collect::<Vec<_>>();
	if fields.len() < NUM_FIELDS {
		return Err(XfError::Malformed {
			line: line_i,
			fields: fields.len()
		});
	}

	let value = |field: usize| -> Result<f64,XfError> {
		fields[field].parse::<f64>()
			.map_err(|_| XfError::Number {
				line: line_i,
				field,
				value: fields[field].to_string()
			})
	};

	// fields 0 and 1 are the tilt angle and axis, we don't need them
	// the linear part is stored column-major
	Ok(AffineTransform::from_parts(
		[
			[value(2)?, value(4)?],
			[value(3)?, value(5)?]
		],
		[value(6)?, value(7)?]
	))
}


/// writes the stack in IMOD's .xf layout: `a11 a12 a21 a22 dx dy`, one row per tilt image
pub fn write_imod_xf(stack: &TransformStack, path: impl AsRef<Path>) -> anyhow::Result<()> {

	use anyhow::Context;

	let path = path.as_ref();
	let file = File::create(path)
		.context(format!("Failed to open file for writing: {}", path.to_string_lossy()))?;
	let mut writer = BufWriter::new(file);

	for xf in stack {
		let [[a11, a12], [a21, a22]] = xf.linear();
		let [dx, dy] = xf.translation();
		writeln!(writer, "{:12.7}{:12.7}{:12.7}{:12.7}{:12.3}{:12.3}", a11, a12, a21, a22, dx, dy)
			.context(format!("Failed to write to: {}", path.to_string_lossy()))?;
	}

	writer.flush()
		.context(format!("Failed to flush: {}", path.to_string_lossy()))?;

	Ok(())
}
