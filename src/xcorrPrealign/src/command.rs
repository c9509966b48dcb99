
use std::fmt;
use std::path::Path;

use crate::options::XcorrOptions;


/// Arguments for one TomoJ cross-correlation run.
/// TomoJ reads the input stack from the final position, so it always goes last.
#[derive(Debug, Clone, PartialEq)]
pub struct XcorrCommand {
	args: Vec<String>
}

impl XcorrCommand {

	pub fn build(options: &XcorrOptions, angle_file: impl AsRef<Path>, input: impl AsRef<Path>) -> Self {

		let mut args = Vec::<String>::new();
		let mut push = |tokens: &[&dyn ToString]| {
			args.extend(tokens.iter().map(|t| t.to_string()));
		};

		push(&[&"-loadangles", &angle_file.as_ref().to_string_lossy()]);

		push(&[&"-xcorr"]);
		push(&[&"-downsampling", &options.downsampling]);
		push(&[&"-variancefilter", &options.variance_filter]);
		push(&[&"-multiscale", &options.multiscale]);

		if options.integer_translation {
			push(&[&"-integertranslation"]);
		}
		if options.cumulative_reference {
			push(&[&"-cumulativereference"]);
		}
		if options.loop_refine {
			push(&[&"-loop"]);
		}
		if let Some(roi) = &options.roi {
			push(&[&"-roi", &roi.width, &roi.height]);
		}
		if let Some(bandpass) = &options.bandpass {
			push(&[&"-bandpass", &bandpass.min, &bandpass.max, &bandpass.decrease]);
		}
		if let Some(angle) = &options.expand {
			push(&[&"-expand", angle]);
		}
		if options.compute_alignment {
			push(&[&"-computealignment"]);
		}

		push(&[&input.as_ref().to_string_lossy()]);

		Self {
			args
		}
	}

	pub fn args(&self) -> &[String] {
		&self.args
	}
}

impl fmt::Display for XcorrCommand {

	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.args.join(" "))
	}
}


#[cfg(test)]
mod test {

	use galvanic_assert::{assert_that, matchers::*};

	use crate::options::XcorrParams;
	use super::*;


	fn build(params: XcorrParams) -> XcorrCommand {
		let options = params.validate()
			.expect("Failed to validate");
		XcorrCommand::build(&options, "tmp/ts_1.rawtlt", "tmp/ts_1.st")
	}


	#[test]
	fn minimal() {
		let cmd = build(XcorrParams {
			downsampling: 2,
			..XcorrParams::default()
		});
		let cmd_str = cmd.to_string();
		assert_that!(&cmd_str.as_str(), eq(
			"-loadangles tmp/ts_1.rawtlt -xcorr -downsampling 2 -variancefilter 0 -multiscale 1 tmp/ts_1.st"
		));
	}

	#[test]
	fn everything() {
		let cmd = build(XcorrParams {
			downsampling: 4,
			variance_filter: 2,
			multiscale: 3,
			integer_translation: true,
			cumulative_reference: true,
			loop_refine: true,
			roi: true,
			roi_width: Some(1024),
			roi_height: Some(768),
			bandpass: true,
			bandpass_min: Some(0.05),
			bandpass_max: Some(0.25),
			bandpass_decrease: Some(8),
			expand: true,
			expand_angle: Some(-84.5),
			compute_alignment: true,
			binning: 1
		});
		let cmd_str = cmd.to_string();
		assert_that!(&cmd_str.as_str(), eq(concat!(
			"-loadangles tmp/ts_1.rawtlt ",
			"-xcorr -downsampling 4 -variancefilter 2 -multiscale 3 ",
			"-integertranslation -cumulativereference -loop ",
			"-roi 1024 768 -bandpass 0.05 0.25 8 -expand -84.5 ",
			"-computealignment ",
			"tmp/ts_1.st"
		)));
	}

	#[test]
	fn bandpass_off() {
		let cmd = build(XcorrParams {
			bandpass: false,
			bandpass_min: Some(0.123),
			bandpass_max: Some(0.456),
			bandpass_decrease: Some(7),
			..XcorrParams::default()
		});
		let line = cmd.to_string();
		assert_that!(&line.contains("-bandpass"), eq(false));
		assert_that!(&line.contains("0.123"), eq(false));
		assert_that!(&line.contains("0.456"), eq(false));
	}

	#[test]
	fn input_last() {
		let variants = [
			XcorrParams::default(),
			XcorrParams { loop_refine: true, ..XcorrParams::default() },
			XcorrParams { expand: true, expand_angle: Some(3.0), ..XcorrParams::default() },
			XcorrParams { compute_alignment: true, ..XcorrParams::default() }
		];
		for params in variants {
			let cmd = build(params);
			assert_that!(&cmd.args().last().map(String::as_str), eq(Some("tmp/ts_1.st")));
			assert_that!(&cmd.args().first().map(String::as_str), eq(Some("-loadangles")));
		}
	}
}
