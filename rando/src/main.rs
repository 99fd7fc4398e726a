use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use log::LevelFilter;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "zora", about = "Post-processing randomizer for Zelda 1 ROM images.")]
struct Opt {
    /// Seed value to use when generating the randomized ROM.
    #[structopt(long)]
    seed: u64,

    /// Flagstring describing the enabled randomizer options.
    #[structopt(long)]
    flagstring: String,

    /// Path to the base ROM (.nes) file to randomize.
    #[structopt(long, parse(from_os_str))]
    input_file: PathBuf,

    /// Directory where the randomized ROM will be written.
    #[structopt(long, parse(from_os_str), default_value = "outputs")]
    output_dir: PathBuf,

    /// Optional filename or path for the randomized ROM.  If relative, it is
    /// placed inside the output directory.
    #[structopt(long)]
    output_file: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    #[structopt(long, default_value = "warn")]
    loglevel: String,
}

fn main() {
    let opt = Opt::from_args();

    let level = LevelFilter::from_str(&opt.loglevel).unwrap_or(LevelFilter::Warn);
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match rando::run_randomizer(
        opt.seed,
        &opt.flagstring,
        &opt.input_file,
        &opt.output_dir,
        opt.output_file.as_deref(),
    ) {
        Ok(output_path) => {
            println!("Randomized ROM written to {}", output_path.display());
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}
