
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use gumdrop::Options;
use tracing::info;

use xcorr_prealign::command::XcorrCommand;
use xcorr_prealign::config::Config;
use xcorr_prealign::logging::{self, ResultExt};
use xcorr_prealign::protocol::{self, XcorrPrealignment};
use xcorr_prealign::tilt_series::SetOfTiltSeries;
use xcorr_prealign::tomoj::TomoJ;
use xcorr_prealign::transforms;


#[derive(Options)]
struct Args {

	#[options(help_flag)]
	help: bool,

	/// settings for log output
	#[options(default = "xcorr_prealign=info")]
	log: String,

	#[options(command)]
	cmd: Option<Command>
}

#[derive(Options)]
enum Command {

	/// Prealign every tilt-series in a set with TomoJ
	Run(ArgsRun),

	/// Print the TomoJ arguments for one stack, without running anything
	Cmdline(ArgsCmdline),

	/// Parse a TomoJ transformation-matrix file
	Parse(ArgsParse)
}


#[derive(Options)]
struct ArgsRun {

	#[options(help_flag)]
	help: bool,

	/// protocol config file (TOML)
	#[options(required)]
	config: PathBuf,

	/// input set of tilt-series (JSON)
	#[options(required)]
	input: PathBuf,

	/// folder for intermediate and output files
	#[options(required)]
	work: PathBuf
}


#[derive(Options)]
struct ArgsCmdline {

	#[options(help_flag)]
	help: bool,

	/// protocol config file (TOML)
	#[options(required)]
	config: PathBuf,

	/// tilt angle file
	#[options(required)]
	angles: PathBuf,

	/// input stack
	#[options(free, required)]
	input: PathBuf
}


#[derive(Options)]
struct ArgsParse {

	#[options(help_flag)]
	help: bool,

	/// fail unless the file holds exactly this many transforms
	tilts: Option<usize>,

	/// also write the transforms as an IMOD .xf file
	xf: Option<PathBuf>,

	/// TomoJ transform file
	#[options(free, required)]
	file: PathBuf
}


fn main() -> ExitCode {

	// parse arguments
	let args = Args::parse_args_default_or_exit();

	// init logging
	let Ok(_) = logging::init(&args.log)
		.log_err()
		else { return ExitCode::FAILURE; };

	let Ok(_) = run(args)
		.log_err()
		else { return ExitCode::FAILURE; };

	ExitCode::SUCCESS
}


#[tracing::instrument(skip_all, level = 5, name = "XcorrPrealign")]
fn run(args: Args) -> Result<()> {
	match args.cmd {
		Some(Command::Run(run_args)) => run_protocol(run_args),
		Some(Command::Cmdline(cmdline_args)) => cmdline(cmdline_args),
		Some(Command::Parse(parse_args)) => parse(parse_args),
		None => bail!("No command, try one of:\n{}", Args::command_list().unwrap_or_default())
	}
}


fn run_protocol(args: ArgsRun) -> Result<()> {

	let config = Config::read(&args.config)?;
	let tomoj = TomoJ::locate(config.tomoj.home, config.tomoj.version, config.tomoj.java)?;
	let protocol = XcorrPrealignment::new(&config.xcorr, tomoj, &args.work)?;

	let input = SetOfTiltSeries::read(&args.input)?;
	let outputs = protocol.run(&input)?;

	for line in protocol::summary(&input, &outputs).into_iter().chain(protocol::methods(&outputs)) {
		println!("{}", line);
	}

	Ok(())
}


fn cmdline(args: ArgsCmdline) -> Result<()> {

	let config = Config::read(&args.config)?;
	let options = config.xcorr.validate()
		.context("Invalid xcorr options")?;

	println!("{}", XcorrCommand::build(&options, &args.angles, &args.input));

	Ok(())
}


fn parse(args: ArgsParse) -> Result<()> {

	let stack = transforms::parse_transforms(&args.file)?;
	info!("Parsed {} transforms", stack.len());
	if let Some(tilts) = args.tilts {
		stack.check_tilt_count(tilts)?;
	}

	for (i, xf) in stack.iter().enumerate() {
		println!("tilt {}:\n{}", i, xf);
	}

	if let Some(path) = &args.xf {
		transforms::write_imod_xf(&stack, path)?;
		info!("Wrote {}", path.to_string_lossy());
	}

	Ok(())
}
