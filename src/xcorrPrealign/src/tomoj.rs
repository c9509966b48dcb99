
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::command::XcorrCommand;


pub const HOME_VAR: &str = "TOMOJ_HOME";
pub const DEFAULT_VERSION: &str = "2.7";
pub const MAIN_CLASS: &str = "fr.curie.tomoj.TomoJ";

/// TomoJ reads these if present, and they point at some other install
const CLEARED_VARS: [&str; 2] = ["TOMOJ_DIR", "TOMOJ_PATH"];


/// An installed copy of the TomoJ applications jar, plus the java to run it with.
#[derive(Debug, Clone, PartialEq)]
pub struct TomoJ {
	pub home: PathBuf,
	pub version: String,
	pub java: PathBuf
}

impl TomoJ {

	/// `home` falls back to $TOMOJ_HOME
	pub fn locate(home: Option<PathBuf>, version: Option<String>, java: Option<PathBuf>) -> Result<Self> {

		let home = match home {
			Some(home) => home,
			None => env::var_os(HOME_VAR)
				.map(PathBuf::from)
				.context(format!("No TomoJ home configured, and {} is not set", HOME_VAR))?
		};

		// TomoJ runs in the tilt-series' tmp folder
		let java = match java {
			// a bare name is looked up in $PATH
			Some(java) if java.components().count() > 1 => absolute(java)?,
			Some(java) => java,
			None => PathBuf::from("java")
		};

		Ok(Self {
			home: absolute(home)?,
			version: version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
			java
		})
	}

	pub fn jar_path(&self) -> PathBuf {
		self.home.join(format!("TomoJ_Applications-{}-jar-with-dependencies.jar", self.version))
	}

	fn command(&self, xcorr: &XcorrCommand, cwd: &Path) -> Command {
		let mut cmd = Command::new(&self.java);
		cmd.current_dir(cwd)
			.arg("-cp")
			.arg(self.jar_path())
			.arg(MAIN_CLASS)
			.args(xcorr.args());
		for var in CLEARED_VARS {
			cmd.env_remove(var);
		}
		cmd
	}

	/// Runs TomoJ to completion. There's no timeout: a hung TomoJ hangs the run.
	#[tracing::instrument(skip_all, level = 5, name = "TomoJ")]
	pub fn run(&self, xcorr: &XcorrCommand, cwd: impl AsRef<Path>) -> Result<()> {

		let cwd = cwd.as_ref();
		info!("Running TomoJ:\n\tin: {}\n\t{} -cp {} {} {}",
			cwd.to_string_lossy(), self.java.to_string_lossy(), self.jar_path().to_string_lossy(), MAIN_CLASS, xcorr);

		let exit = self.command(xcorr, cwd)
			.status()
			.context(format!("Failed to launch TomoJ with: {}", self.java.to_string_lossy()))?;

		if exit.success() {
			debug!("TomoJ finished");
			Ok(())
		} else if let Some(code) = exit.code() {
			bail!("TomoJ exited with code: {}", code);
		} else {
			bail!("TomoJ was killed");
		}
	}
}


/// resolves a relative path against the current folder
pub fn absolute(path: impl AsRef<Path>) -> Result<PathBuf> {
	let path = path.as_ref();
	if path.is_absolute() {
		return Ok(path.to_path_buf());
	}
	let cwd = env::current_dir()
		.context("Failed to get the current folder")?;
	Ok(cwd.join(path))
}


/// The files TomoJ leaves next to its input stack.
#[derive(Debug, Clone, PartialEq)]
pub struct XcorrOutputs {
	pub transforms: PathBuf,
	pub aligned: PathBuf
}

impl XcorrOutputs {

	pub fn for_input(input: impl AsRef<Path>) -> Self {
		let input = input.as_ref();
		let dir = input.parent()
			.unwrap_or(Path::new(""));
		let stem = input.file_stem()
			.map(|s| s.to_string_lossy().to_string())
			.unwrap_or_default();
		Self {
			transforms: dir.join(format!("{}_xcorr_transforms.txt", stem)),
			aligned: dir.join(format!("{}_xcorr_aligned.mrc", stem))
		}
	}
}
