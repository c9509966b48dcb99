
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_fs::TempDir;
use indoc::formatdoc;

use xcorr_prealign::tilt_series::{ImageLocation, SetOfTiltSeries, TiltImage, TiltSeries};
use xcorr_prealign::tomoj::TomoJ;


/// how the fake TomoJ behaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeTomoJ {
	/// one transform per angle, plus the footer line
	Good,
	/// one transform too many
	ExtraRecord,
	/// exits with code 3 and writes nothing
	Crash
}


/// A temp folder holding raw stacks, an input set, and a fake `java` that plays TomoJ.
pub struct Workspace {
	dir: TempDir
}

impl Workspace {

	pub fn new() -> Workspace {
		Self {
			dir: TempDir::new()
				.expect("Failed to make temp folder")
		}
	}

	pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
		self.dir.path().join(path.as_ref())
	}

	pub fn work_dir(&self) -> PathBuf {
		self.path("work")
	}

	pub fn tomoj_home(&self) -> PathBuf {
		self.path("tomoj")
	}

	/// the fake java records its args in `<tmp>/args.txt`
	pub fn fake_java(&self, behavior: FakeTomoJ) -> PathBuf {

		let body = match behavior {
			FakeTomoJ::Good => "records $n",
			FakeTomoJ::ExtraRecord => "records $((n + 1))",
			FakeTomoJ::Crash => "exit 3"
		};

		let script = formatdoc! { r#"
			#!/bin/sh
			for last; do :; done
			dir=$(dirname "$last")
			stem=$(basename "$last" .st)
			all=" $* "
			echo "$@" > "$dir/args.txt"
			n=$(grep -c . "$dir/$stem.rawtlt")
			records() {{
				i=0
				while [ $i -lt $1 ]; do
					echo "0.0 0.0 1.0 0.0 0.0 1.0 $i -$i"
					i=$((i + 1))
				done > "$dir/${{stem}}_xcorr_transforms.txt"
				echo "end" >> "$dir/${{stem}}_xcorr_transforms.txt"
				case "$all" in
					*" -computealignment "*) echo "aligned" > "$dir/${{stem}}_xcorr_aligned.mrc" ;;
				esac
			}}
			{body}
		"# };

		let path = self.path("java");
		fs::write(&path, script)
			.expect("Failed to write fake java");
		fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
			.expect("Failed to make fake java executable");
		path
	}

	pub fn tomoj(&self, behavior: FakeTomoJ) -> TomoJ {
		TomoJ::locate(Some(self.tomoj_home()), None, Some(self.fake_java(behavior)))
			.expect("Failed to locate TomoJ")
	}

	/// writes a raw stack per tilt-series and returns a set referencing them
	pub fn input_set(&self, ts_ids: &[&str], angles: &[f64]) -> SetOfTiltSeries {
		let series = ts_ids.iter()
			.map(|ts_id| {
				let stack = self.path(format!("{}.mrc", ts_id));
				fs::write(&stack, b"not really an mrc")
					.expect("Failed to write stack");
				TiltSeries {
					ts_id: ts_id.to_string(),
					sampling_rate: 2.0,
					dim: Some((64, 64, angles.len() as u32)),
					images: angles.iter()
						.enumerate()
						.map(|(i, angle)| TiltImage {
							obj_id: i as u32 + 1,
							tilt_angle: *angle,
							location: ImageLocation {
								index: i + 1,
								path: stack.clone()
							},
							sampling_rate: 2.0,
							transform: None
						})
						.collect()
				}
			})
			.collect();
		SetOfTiltSeries {
			sampling_rate: 2.0,
			dim: Some((64, 64, angles.len() as u32)),
			series
		}
	}

	pub fn write(&self, path: impl AsRef<Path>, txt: impl AsRef<str>) -> PathBuf {
		let path = self.path(path);
		fs::write(&path, txt.as_ref())
			.expect(&format!("Failed to write file: {}", path.to_string_lossy()));
		path
	}

	pub fn read(&self, path: impl AsRef<Path>) -> String {
		let path = path.as_ref();
		fs::read_to_string(path)
			.expect(&format!("Failed to read file: {}", path.to_string_lossy()))
	}
}
