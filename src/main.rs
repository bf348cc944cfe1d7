use anyhow::{Context, Result};
use argh::FromArgs;
use osh::input::{BufferedSource, EditorSource, LineSource};
use osh::{Interpreter, ProcessLauncher, Settings, ShellError};
use std::io::{self, IsTerminal};
use std::process::ExitCode;

#[derive(FromArgs)]
/// A minimal interactive shell: runs one program per line, `cmd &` in the background,
/// `!!` to repeat the last command, `exit` to quit.
struct Args {
    #[argh(option, default = "osh::settings::DEFAULT_PROMPT.to_string()")]
    /// prompt printed before each command.
    prompt: String,

    #[argh(option, default = "osh::settings::DEFAULT_MAX_LINE")]
    /// size of the line buffer in bytes, terminator included.
    max_line: usize,

    #[argh(switch)]
    /// never collect background processes; they stay zombies after they finish.
    no_reap: bool,

    #[argh(switch, short = 'v')]
    /// log every dispatch step to stderr.
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_module("osh", log::LevelFilter::Trace);
    }
    builder.init();
}

fn line_source(settings: &Settings) -> Result<Box<dyn LineSource>> {
    let capacity = settings.line_capacity();
    if io::stdin().is_terminal() {
        let editor = EditorSource::new(capacity).context("failed to set up line editor")?;
        Ok(Box::new(editor))
    } else {
        Ok(Box::new(BufferedSource::new(io::stdin().lock(), capacity)))
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let settings = Settings {
        prompt: args.prompt,
        max_line: args.max_line,
        reap_background: !args.no_reap,
    };
    settings.validate()?;
    log::debug!("starting with {:?}", settings);

    let mut source = line_source(&settings)?;
    let mut shell = Interpreter::new(settings, Box::new(ProcessLauncher));
    match shell.repl(source.as_mut(), &mut io::stdout(), &mut io::stderr()) {
        Ok(code) => Ok(ExitCode::from(code as u8)),
        Err(e @ ShellError::Create(_)) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("shell loop stopped"),
    }
}

fn main() -> Result<ExitCode> {
    let args: Args = argh::from_env();
    init_logging(args.verbose);
    run(args)
}
