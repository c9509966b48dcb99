
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use toml::{Table, Value};

use crate::options::XcorrParams;


/// Config is the contents of the protocol's TOML file
pub struct Config {
	pub tomoj: ConfigTomoJ,
	pub xcorr: XcorrParams
}

#[derive(Debug, Default)]
pub struct ConfigTomoJ {
	pub home: Option<PathBuf>,
	pub version: Option<String>,
	pub java: Option<PathBuf>
}

impl Config {

	pub fn read(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let toml = fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file at: {}", path.to_string_lossy()))?;
		Self::parse(&toml)
			.with_context(|| format!("Failed to parse config file at: {}", path.to_string_lossy()))
	}

	pub fn parse(toml: &str) -> Result<Self> {

		let toml = toml.parse::<Table>()
			.context("Invalid TOML")?;

		// the [tomoj] section is optional, $TOMOJ_HOME can stand in for it
		let tomoj = match toml.get("tomoj") {
			None => ConfigTomoJ::default(),
			Some(value) => {
				let section = Section::new("tomoj", value)?;
				ConfigTomoJ {
					home: section.str("home")?.map(PathBuf::from),
					version: section.str("version")?.map(String::from),
					java: section.str("java")?.map(PathBuf::from)
				}
			}
		};

		let section = Section::new("xcorr", toml.get("xcorr")
			.context("Missing [xcorr] section from config file")?)?;
		let defaults = XcorrParams::default();
		let xcorr = XcorrParams {
			downsampling: section.u32("downsampling")?.unwrap_or(defaults.downsampling),
			variance_filter: section.i32("variancefilter")?.unwrap_or(defaults.variance_filter),
			multiscale: section.u32("multiscale")?.unwrap_or(defaults.multiscale),
			integer_translation: section.bool("integerTranslation")?.unwrap_or(false),
			cumulative_reference: section.bool("cumulativereference")?.unwrap_or(false),
			loop_refine: section.bool("loop")?.unwrap_or(false),
			roi: section.bool("roi")?.unwrap_or(false),
			roi_width: section.u32("rwidth")?,
			roi_height: section.u32("rheight")?,
			bandpass: section.bool("bandpass")?.unwrap_or(false),
			bandpass_min: section.f64("bandpassmin")?,
			bandpass_max: section.f64("bandpassmax")?,
			bandpass_decrease: section.i32("bandpassdecrease")?,
			expand: section.bool("expand")?.unwrap_or(false),
			expand_angle: section.f64("expandimage")?,
			compute_alignment: section.bool("computeAlignment")?.unwrap_or(false),
			binning: section.u32("binning")?.unwrap_or(defaults.binning)
		};

		Ok(Config {
			tomoj,
			xcorr
		})
	}
}


struct Section<'t> {
	name: &'static str,
	table: &'t Table
}

impl<'t> Section<'t> {

	fn new(name: &'static str, value: &'t Value) -> Result<Self> {
		let table = value.as_table()
			.context(format!("{} key is not a table", name))?;
		Ok(Self {
			name,
			table
		})
	}

	fn get<T>(&self, key: &str, kind: &str, f: impl FnOnce(&'t Value) -> Option<T>) -> Result<Option<T>> {
		match self.table.get(key) {
			None => Ok(None),
			Some(value) => f(value)
				.map(Some)
				.context(format!("{}.{} was not {}: {}", self.name, key, kind, value))
		}
	}

	fn str(&self, key: &str) -> Result<Option<&'t str>> {
		self.get(key, "a string", Value::as_str)
	}

	fn bool(&self, key: &str) -> Result<Option<bool>> {
		self.get(key, "a boolean", Value::as_bool)
	}

	fn i64(&self, key: &str) -> Result<Option<i64>> {
		self.get(key, "an integer", Value::as_integer)
	}

	fn i32(&self, key: &str) -> Result<Option<i32>> {
		self.i64(key)?
			.map(|i| {
				i32::try_from(i)
					.context(format!("{}.{} is out of range: {}", self.name, key, i))
			})
			.transpose()
	}

	fn u32(&self, key: &str) -> Result<Option<u32>> {
		let Some(i) = self.i64(key)?
			else { return Ok(None); };
		if i < 0 {
			bail!("{}.{} must not be negative: {}", self.name, key, i);
		}
		u32::try_from(i)
			.map(Some)
			.context(format!("{}.{} is out of range: {}", self.name, key, i))
	}

	/// integers are fine wherever a float is
	fn f64(&self, key: &str) -> Result<Option<f64>> {
		self.get(key, "a number", |value| {
			value.as_float()
				.or_else(|| value.as_integer().map(|i| i as f64))
		})
	}
}
