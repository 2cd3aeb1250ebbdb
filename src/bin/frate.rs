use std::env;
use std::path::PathBuf;
use std::process;

use frate::{io::TrialSource, pipeline, settings};
use simple_error::{try_with, SimpleError, SimpleResult};

const USAGE: &str = "Usage: frate <data> <settings-file> [output-dir]
       frate --list <data>

  data           directory or .zip archive holding one event file per trial
  settings-file  .yaml/.yml run parameters, or the command format
                 (fileload, endtime, timebin, samplingrate, numberofneurons,
                 numberofthreads, output)
  output-dir     where <group>.frate.<trial> and max.out are written (default: output)
  --list         print the trial files available in <data>";

enum Command {
    List {
        data: PathBuf,
    },
    Run {
        data: PathBuf,
        settings_path: PathBuf,
        out_dir: PathBuf,
    },
}

fn parse_args() -> SimpleResult<Command> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        println!("{}", USAGE);
        process::exit(0);
    }

    match &args[..] {
        [flag, data] if flag == "--list" || flag == "-l" => Ok(Command::List { data: data.into() }),
        [data, settings_path] => Ok(Command::Run {
            data: data.into(),
            settings_path: settings_path.into(),
            out_dir: "output".into(),
        }),
        [data, settings_path, out_dir] => Ok(Command::Run {
            data: data.into(),
            settings_path: settings_path.into(),
            out_dir: out_dir.into(),
        }),
        _ => Err(SimpleError::new(USAGE)),
    }
}

fn list(data: PathBuf) -> SimpleResult<()> {
    let trial_source = try_with!(TrialSource::open(&data), "cannot open {}", data.display());
    let trial_ids = try_with!(trial_source.trial_ids(), "cannot list {}", data.display());

    for trial_id in trial_ids {
        println!("{}", trial_id);
    }

    Ok(())
}

fn run(data: PathBuf, settings_path: PathBuf, out_dir: PathBuf) -> SimpleResult<()> {
    let run_params = try_with!(
        settings::load_run_params(&settings_path),
        "cannot use settings file {}",
        settings_path.display()
    );

    let summary = try_with!(pipeline::run(&run_params, &data, &out_dir), "run aborted");

    log::info!(
        "done: {} of {} trials processed, {} of {} groups written to {}",
        summary.num_trials,
        run_params.trials.len(),
        summary.group_outcomes.len() - summary.num_failed_groups(),
        summary.group_outcomes.len(),
        out_dir.display()
    );

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = parse_args().and_then(|command| match command {
        Command::List { data } => list(data),
        Command::Run {
            data,
            settings_path,
            out_dir,
        } => run(data, settings_path, out_dir),
    });

    if let Err(e) = result {
        log::error!("{}", e);
        process::exit(1);
    }
}
