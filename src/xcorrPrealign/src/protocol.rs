
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::angles::TiltAngleFile;
use crate::command::XcorrCommand;
use crate::options::{XcorrOptions, XcorrParams};
use crate::output_set::OutputSet;
use crate::tilt_series::{ImageLocation, SetOfTiltSeries, TiltSeries};
use crate::tomoj::{absolute, TomoJ, XcorrOutputs};
use crate::transforms;


pub const ALIGNED_SET: &str = "outputSetOfTiltSeries";
pub const INTERPOLATED_SET: &str = "outputInterpolatedSetOfTiltSeries";


/// Tilt-series cross-correlation prealignment, run through TomoJ.
pub struct XcorrPrealignment {
	options: XcorrOptions,
	tomoj: TomoJ,
	work_dir: PathBuf
}


/// the staged copies TomoJ reads from, in the tilt-series' tmp folder
#[derive(Debug, Clone, PartialEq)]
pub struct StagedInput {
	pub stack: PathBuf,
	pub angles: PathBuf
}


pub struct Outputs {
	pub aligned: OutputSet,
	pub interpolated: Option<OutputSet>
}


impl XcorrPrealignment {

	/// Bad option combinations fail here, before anything touches the disk.
	/// A relative `work_dir` is resolved against the current folder.
	pub fn new(params: &XcorrParams, tomoj: TomoJ, work_dir: impl AsRef<Path>) -> Result<Self> {
		let options = params.validate()
			.context("Invalid xcorr options")?;
		Ok(Self {
			options,
			tomoj,
			work_dir: absolute(work_dir)?
		})
	}

	pub fn work_dir(&self) -> &Path {
		&self.work_dir
	}

	pub fn options(&self) -> &XcorrOptions {
		&self.options
	}

	pub fn tmp_dir(&self, ts_id: &str) -> PathBuf {
		self.work_dir.join("tmp").join(ts_id)
	}

	pub fn extra_dir(&self, ts_id: &str) -> PathBuf {
		self.work_dir.join("extra").join(ts_id)
	}

	pub fn transforms_path(&self, ts_id: &str) -> PathBuf {
		self.extra_dir(ts_id).join(format!("{}.xcorr.txt", ts_id))
	}

	pub fn interpolated_path(&self, ts_id: &str) -> PathBuf {
		self.extra_dir(ts_id).join(format!("{}_preali.mrc", ts_id))
	}

	pub fn open_outputs(&self, input: &SetOfTiltSeries) -> Outputs {
		let interpolated = if self.options.compute_alignment {
			let mut set = OutputSet::open(INTERPOLATED_SET, input);
			if self.options.binning > 1 {
				set.set_sampling_rate(input.sampling_rate*self.options.binning as f64);
			}
			Some(set)
		} else {
			None
		};
		Outputs {
			aligned: OutputSet::open(ALIGNED_SET, input),
			interpolated
		}
	}

	/// Processes every tilt-series in order, then closes and writes the output sets.
	/// The first failing tilt-series aborts the run.
	#[tracing::instrument(skip_all, level = 5, name = "XcorrPrealignment")]
	pub fn run(&self, input: &SetOfTiltSeries) -> Result<Outputs> {

		info!("Prealigning {} tilt-series", input.len());
		let mut outputs = self.open_outputs(input);

		for ts in &input.series {
			self.process(ts, &mut outputs)
				.context(format!("Failed to prealign tilt-series {}", ts.ts_id))?;
		}

		outputs.aligned.close();
		outputs.aligned.write(self.work_dir.join(format!("{}.json", ALIGNED_SET)))?;
		if let Some(interpolated) = &mut outputs.interpolated {
			interpolated.close();
			interpolated.write(self.work_dir.join(format!("{}.json", INTERPOLATED_SET)))?;
		}

		for line in summary(input, &outputs) {
			info!("{}", line);
		}

		Ok(outputs)
	}

	#[tracing::instrument(skip_all, level = 5, name = "TiltSeries", fields(ts_id = %ts.ts_id))]
	pub fn process(&self, ts: &TiltSeries, outputs: &mut Outputs) -> Result<()> {
		let staged = self.convert_input_step(ts)?;
		self.compute_xcorr_step(ts, &staged, &mut outputs.aligned)?;
		if let Some(interpolated) = &mut outputs.interpolated {
			self.compute_interpolated_stack_step(ts, &staged, interpolated)?;
		}
		Ok(())
	}

	/// stages the stack and writes the angle file into the tmp folder
	pub fn convert_input_step(&self, ts: &TiltSeries) -> Result<StagedInput> {

		let tmp_dir = self.tmp_dir(&ts.ts_id);
		let extra_dir = self.extra_dir(&ts.ts_id);
		for dir in [&tmp_dir, &extra_dir] {
			fs::create_dir_all(dir)
				.context(format!("Failed to create folder: {}", dir.to_string_lossy()))?;
		}

		if ts.images.iter().any(|ti| ti.transform.is_some()) {
			warn!("{} already has transforms, TomoJ will align the raw stack", ts.ts_id);
		}

		let source = ts.stack_path()?;
		let stack = tmp_dir.join(format!("{}.st", ts.ts_id));
		fs::copy(source, &stack)
			.context(format!("Failed to stage stack {} to {}", source.to_string_lossy(), stack.to_string_lossy()))?;

		let angles = tmp_dir.join(format!("{}.rawtlt", ts.ts_id));
		TiltAngleFile::from_tilt_series(ts)
			.write(&angles)?;

		Ok(StagedInput {
			stack,
			angles
		})
	}

	/// runs TomoJ and attaches the resulting transforms to a copy of the tilt-series
	pub fn compute_xcorr_step(&self, ts: &TiltSeries, staged: &StagedInput, aligned: &mut OutputSet) -> Result<()> {

		let xcorr = XcorrCommand::build(&self.options, &staged.angles, &staged.stack);
		self.tomoj.run(&xcorr, self.tmp_dir(&ts.ts_id))?;

		let produced = XcorrOutputs::for_input(&staged.stack);
		let transforms_path = self.transforms_path(&ts.ts_id);
		move_file(&produced.transforms, &transforms_path)?;

		let stack = transforms::parse_transforms(&transforms_path)?;
		stack.check_tilt_count(ts.len())
			.context(format!("TomoJ output does not match tilt-series {}", ts.ts_id))?;

		transforms::write_imod_xf(&stack, self.extra_dir(&ts.ts_id).join(format!("{}.xf", ts.ts_id)))?;

		let mut new_ts = ts.copy_info();
		for (ti, xf) in ts.images.iter().zip(stack) {
			let mut new_ti = ti.copy_info(ti.location.clone());
			new_ti.transform = Some(xf);
			new_ts.images.push(new_ti);
		}
		aligned.append(new_ts)?;

		Ok(())
	}

	/// collects the aligned stack TomoJ wrote with -computealignment
	pub fn compute_interpolated_stack_step(&self, ts: &TiltSeries, staged: &StagedInput, interpolated: &mut OutputSet) -> Result<()> {

		let produced = XcorrOutputs::for_input(&staged.stack);
		let path = self.interpolated_path(&ts.ts_id);
		move_file(&produced.aligned, &path)?;

		let binning = self.options.binning;
		let mut new_ts = ts.copy_info();
		for (i, ti) in ts.images.iter().enumerate() {
			let mut new_ti = ti.copy_info(ImageLocation {
				index: i + 1,
				path: path.clone()
			});
			if binning > 1 {
				new_ti.sampling_rate *= binning as f64;
			}
			new_ts.images.push(new_ti);
		}
		if binning > 1 {
			new_ts.sampling_rate *= binning as f64;
		}
		interpolated.append(new_ts)?;

		Ok(())
	}
}


fn move_file(from: &Path, to: &Path) -> Result<()> {
	fs::rename(from, to)
		.context(format!("Failed to move {} to {}", from.to_string_lossy(), to.to_string_lossy()))
}


pub fn summary(input: &SetOfTiltSeries, outputs: &Outputs) -> Vec<String> {
	let mut lines = vec![
		format!("Input Tilt-Series: {}.", input.len()),
		format!("Transformation matrices calculated: {}.", outputs.aligned.len())
	];
	if let Some(interpolated) = &outputs.interpolated {
		lines.push(format!("Interpolated Tilt-Series: {}.", interpolated.len()));
	}
	lines
}


/// works to cite in the methods report
pub const REFERENCES: [&str; 2] = [
	"Messaoudi C, Boudier T, Sorzano COS, Marco S. TomoJ: tomography software for three-dimensional reconstruction in transmission electron microscopy. BMC Bioinformatics 8, 288 (2007). doi:10.1186/1471-2105-8-288",
	"Sorzano COS, Messaoudi C, Eibauer M, Bilbao-Castro JR, Hegerl R, Nickell S, Marco S, Carazo JM. Marker-free image registration of electron tomography tilt-series. BMC Bioinformatics 10, 124 (2009). doi:10.1186/1471-2105-10-124"
];


pub fn methods(outputs: &Outputs) -> Vec<String> {
	let mut lines = vec![
		format!("The transformation matrix has been calculated for {} Tilt-series using the TomoJ cross-correlation procedure [Messaoudi2007, Sorzano2009].", outputs.aligned.len())
	];
	if let Some(interpolated) = &outputs.interpolated {
		lines.push(format!("Also, interpolation has been completed for {} Tilt-series.", interpolated.len()));
	}
	lines.push("References:".to_string());
	for reference in REFERENCES {
		lines.push(format!("\t{}", reference));
	}
	lines
}
