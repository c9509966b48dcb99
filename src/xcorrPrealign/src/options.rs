
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {

	#[error("{gate} is enabled, but {option} is not set")]
	Missing {
		gate: &'static str,
		option: &'static str
	},

	#[error("{option} must be {bound}, but was {value}")]
	OutOfRange {
		option: &'static str,
		bound: &'static str,
		value: String
	},

	#[error("bandpassmin ({min}) must not exceed bandpassmax ({max})")]
	BandpassOrder {
		min: f64,
		max: f64
	}
}


/// The xcorr form exactly as the operator filled it in.
/// Sub-options of a disabled gate are ignored, whatever their value.
#[derive(Debug, Clone, PartialEq)]
pub struct XcorrParams {
	pub downsampling: u32,
	pub variance_filter: i32,
	pub multiscale: u32,
	pub integer_translation: bool,
	pub cumulative_reference: bool,
	pub loop_refine: bool,
	pub roi: bool,
	pub roi_width: Option<u32>,
	pub roi_height: Option<u32>,
	pub bandpass: bool,
	pub bandpass_min: Option<f64>,
	pub bandpass_max: Option<f64>,
	pub bandpass_decrease: Option<i32>,
	pub expand: bool,
	pub expand_angle: Option<f64>,
	pub compute_alignment: bool,
	pub binning: u32
}

impl Default for XcorrParams {
	fn default() -> Self {
		Self {
			downsampling: 1,
			variance_filter: 0,
			multiscale: 1,
			integer_translation: false,
			cumulative_reference: false,
			loop_refine: false,
			roi: false,
			roi_width: None,
			roi_height: None,
			bandpass: false,
			bandpass_min: None,
			bandpass_max: None,
			bandpass_decrease: None,
			expand: false,
			expand_angle: None,
			compute_alignment: false,
			binning: 1
		}
	}
}

impl XcorrParams {

	/// Every cross-option constraint lives here.
	pub fn validate(&self) -> Result<XcorrOptions,ConfigError> {

		at_least_one("downsampling", self.downsampling)?;
		at_least_one("multiscale", self.multiscale)?;
		at_least_one("binning", self.binning)?;
		if self.variance_filter < 0 {
			return Err(ConfigError::OutOfRange {
				option: "variancefilter",
				bound: "at least 0",
				value: self.variance_filter.to_string()
			});
		}

		let roi = if self.roi {
			let width = required("roi", "rwidth", self.roi_width)?;
			let height = required("roi", "rheight", self.roi_height)?;
			at_least_one("rwidth", width)?;
			at_least_one("rheight", height)?;
			Some(Roi {
				width,
				height
			})
		} else {
			None
		};

		let bandpass = if self.bandpass {
			let min = required("bandpass", "bandpassmin", self.bandpass_min)?;
			let max = required("bandpass", "bandpassmax", self.bandpass_max)?;
			let decrease = required("bandpass", "bandpassdecrease", self.bandpass_decrease)?;
			if min > max {
				return Err(ConfigError::BandpassOrder {
					min,
					max
				});
			}
			Some(Bandpass {
				min,
				max,
				decrease
			})
		} else {
			None
		};

		let expand = if self.expand {
			Some(required("expand", "expandimage", self.expand_angle)?)
		} else {
			None
		};

		Ok(XcorrOptions {
			downsampling: self.downsampling,
			variance_filter: self.variance_filter as u32,
			multiscale: self.multiscale,
			integer_translation: self.integer_translation,
			cumulative_reference: self.cumulative_reference,
			loop_refine: self.loop_refine,
			roi,
			bandpass,
			expand,
			compute_alignment: self.compute_alignment,
			binning: self.binning
		})
	}
}


fn required<T>(gate: &'static str, option: &'static str, value: Option<T>) -> Result<T,ConfigError> {
	value.ok_or(ConfigError::Missing {
		gate,
		option
	})
}


fn at_least_one(option: &'static str, value: u32) -> Result<(),ConfigError> {
	if value < 1 {
		return Err(ConfigError::OutOfRange {
			option,
			bound: "at least 1",
			value: value.to_string()
		});
	}
	Ok(())
}


/// Options that passed validation: a gated group is either fully present or absent.
#[derive(Debug, Clone, PartialEq)]
pub struct XcorrOptions {
	pub downsampling: u32,
	pub variance_filter: u32,
	pub multiscale: u32,
	pub integer_translation: bool,
	pub cumulative_reference: bool,
	pub loop_refine: bool,
	pub roi: Option<Roi>,
	pub bandpass: Option<Bandpass>,
	/// tilt-axis angle in degrees for stretch correction
	pub expand: Option<f64>,
	pub compute_alignment: bool,
	pub binning: u32
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
	pub width: u32,
	pub height: u32
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bandpass {
	pub min: f64,
	pub max: f64,
	pub decrease: i32
}
