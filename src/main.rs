use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use josefine_reader::config::ReaderConfig;
use josefine_reader::format::{MessageFormatter, OutputFormat};
use josefine_reader::prompt::{AlwaysContinue, ConsolePrompt};
use josefine_reader::reader::ReadOutcome;

const RC_OK: u8 = 0;
const RC_ERROR: u8 = 1;
const RC_NOTOPIC: u8 = 2;
const RC_NOSEGMENTS: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "josefine-reader", version, about = "Read the messages of a topic.")]
struct Args {
    /// Topic to read.
    topic: String,
    /// Location of the config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Location of the database holding topic metadata and segments.
    #[arg(long, value_name = "PATH")]
    data_directory: Option<PathBuf>,
    /// First sequence id to read. Messages every subscriber consumed are skipped regardless.
    #[arg(long, default_value_t = 1)]
    start: u64,
    /// Maximum number of messages read at once.
    #[arg(long)]
    batch_size: Option<u64>,
    /// Read the whole topic without asking to continue after every batch.
    #[arg(long)]
    no_interactive: bool,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match ReaderConfig::config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ERROR: could not load configuration: {:#}", err);
            return ExitCode::from(RC_ERROR);
        }
    };
    if let Some(data_directory) = args.data_directory {
        config.data_directory = data_directory;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if args.no_interactive {
        config.interactive = false;
    }
    if let Err(err) = config.validate() {
        eprintln!("ERROR: invalid configuration: {:#}", err);
        return ExitCode::from(RC_ERROR);
    }

    let _guard = match josefine_reader::logger::init(&config.log) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("ERROR: could not initialize logging: {:#}", err);
            return ExitCode::from(RC_ERROR);
        }
    };

    let mut sink = MessageFormatter::new(io::stdout().lock(), config.format);
    let res = if config.interactive {
        josefine_reader::read_topic(&config, &args.topic, args.start, &mut sink, &mut ConsolePrompt::stdio())
    } else {
        josefine_reader::read_topic(&config, &args.topic, args.start, &mut sink, &mut AlwaysContinue)
    };

    let code = match res {
        Ok(ReadOutcome::Completed { summary, .. }) | Ok(ReadOutcome::StoppedByOperator { summary, .. }) => {
            tracing::info!(?summary, "done");
            RC_OK
        }
        Ok(ReadOutcome::NoTopic) => {
            eprintln!("No topic {} found.", args.topic);
            RC_NOTOPIC
        }
        Ok(ReadOutcome::NoSegments) => {
            eprintln!("No message is published to topic {}", args.topic);
            RC_NOSEGMENTS
        }
        Err(err) => {
            tracing::error!(%err, "read failed");
            eprintln!("ERROR: read messages of topic {} failed: {}", args.topic, err);
            RC_ERROR
        }
    };
    ExitCode::from(code)
}
