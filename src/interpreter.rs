use crate::builtin::try_builtin;
use crate::command::{ExitCode, Launcher};
use crate::error::{ShellError, SpawnError};
use crate::external::ProcessLauncher;
use crate::history::History;
use crate::input::{BoundedLine, LineSource};
use crate::job::{BackgroundJobs, Mode, detach_marker};
use crate::lexer::split_into_tokens;
use crate::settings::Settings;
use std::fmt;
use std::io::Write;

/// Notice printed when `!!` is entered before any command.
pub const NO_HISTORY_NOTICE: &str = "No commands in history";

/// What the loop does after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Show the prompt again.
    Continue,
    /// Leave the loop with the given status.
    Exit(ExitCode),
}

/// Stages a line passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    HistoryCheck,
    Tokenize,
    BgCheck,
    BuiltinCheck,
    Spawn,
    Wait,
    Terminated,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "READ",
            Stage::HistoryCheck => "HISTORY_CHECK",
            Stage::Tokenize => "TOKENIZE",
            Stage::BgCheck => "BG_CHECK",
            Stage::BuiltinCheck => "BUILTIN_CHECK",
            Stage::Spawn => "SPAWN",
            Stage::Wait => "WAIT",
            Stage::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage) {
    log::trace!("-> {}", stage);
}

/// The read/dispatch loop and the state it carries between lines.
///
/// State is the single-slot [`History`] and, when reaping is enabled, the set of
/// background children still running. Programs are started through a [`Launcher`].
///
/// Example
/// ```no_run
/// use osh::Interpreter;
/// use osh::input::BufferedSource;
///
/// let mut sh = Interpreter::default();
/// let mut source = BufferedSource::new(&b"echo hello\nexit\n"[..], 79);
/// let code = sh
///     .repl(&mut source, &mut std::io::stdout(), &mut std::io::stderr())
///     .unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    settings: Settings,
    history: History,
    background: BackgroundJobs,
    launcher: Box<dyn Launcher>,
}

impl Interpreter {
    /// Create an interpreter that starts programs through `launcher`.
    pub fn new(settings: Settings, launcher: Box<dyn Launcher>) -> Self {
        Self {
            settings,
            history: History::new(),
            background: BackgroundJobs::new(),
            launcher,
        }
    }

    /// The single-slot history as it stands after the last line.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Background children started with reaping enabled that have not finished yet.
    pub fn background_jobs(&self) -> usize {
        self.background.len()
    }

    /// Prompt, read and dispatch until `exit` or end of input.
    ///
    /// Returns the status the shell should exit with. Process-creation failure is
    /// returned as [`ShellError::Create`].
    pub fn repl(
        &mut self,
        source: &mut dyn LineSource,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        loop {
            if self.settings.reap_background && !self.background.is_empty() {
                let reaped = self.background.reap();
                if reaped > 0 {
                    log::debug!("reaped {} background process(es)", reaped);
                }
            }

            enter(Stage::Read);
            let line = match source
                .read_line(&self.settings.prompt, out)
                .map_err(ShellError::Input)?
            {
                Some(line) => line,
                None => {
                    log::debug!("end of input");
                    return Ok(0);
                }
            };

            if let Flow::Exit(code) = self.eval_line(&line, out, err)? {
                return Ok(code);
            }
        }
    }

    /// Run one raw line through every stage after `READ`.
    pub fn eval_line(
        &mut self,
        line: &BoundedLine,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Flow, ShellError> {
        enter(Stage::HistoryCheck);
        let line = if History::is_recall(line) {
            match self.history.recall() {
                Some(previous) => {
                    writeln!(out, "{}", previous).map_err(ShellError::Output)?;
                    previous.clone()
                }
                None => {
                    writeln!(out, "{}", NO_HISTORY_NOTICE).map_err(ShellError::Output)?;
                    return Ok(Flow::Continue);
                }
            }
        } else {
            self.history.record(line);
            line.clone()
        };

        enter(Stage::Tokenize);
        let mut argv = split_into_tokens(line.as_bytes());

        enter(Stage::BgCheck);
        let mode = detach_marker(&mut argv);
        if argv.is_empty() {
            log::debug!("empty command");
            return Ok(Flow::Continue);
        }

        enter(Stage::BuiltinCheck);
        if let Some(flow) = try_builtin(&argv) {
            enter(Stage::Terminated);
            return Ok(flow);
        }

        enter(Stage::Spawn);
        let mut job = match self.launcher.launch(&argv.to_os_strs()) {
            Ok(job) => job,
            Err(e @ SpawnError::Load(_)) => {
                writeln!(err, "{}", e).map_err(ShellError::Output)?;
                return Ok(Flow::Continue);
            }
            Err(SpawnError::Create(e)) => return Err(ShellError::Create(e)),
        };
        log::debug!("started `{}` as process {}", line, job.id());

        match mode {
            Mode::Foreground => {
                enter(Stage::Wait);
                match job.wait() {
                    Ok(code) => log::debug!("process {} exited with {}", job.id(), code),
                    Err(e) => log::warn!("failed to wait for process {}: {}", job.id(), e),
                }
            }
            Mode::Background if self.settings.reap_background => self.background.push(job),
            // Never collected: the child stays a zombie after it exits.
            Mode::Background => log::debug!("process {} left to run unobserved", job.id()),
        }
        Ok(Flow::Continue)
    }
}

impl Default for Interpreter {
    /// Default settings with programs launched as real child processes.
    fn default() -> Self {
        Self::new(Settings::default(), Box::new(ProcessLauncher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Job;
    use crate::input::{BufferedSource, EditorSource, LineEditor};
    use rustyline::error::ReadlineError;
    use std::cell::RefCell;
    use std::ffi::OsStr;
    use std::io;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Launch {
        argv: Vec<String>,
        waited: bool,
    }

    type Log = Rc<RefCell<Vec<Launch>>>;

    /// Records every launch instead of creating processes.
    ///
    /// `doesnotexist123` fails to load and `resource-hog` fails to be created.
    struct RecordingLauncher {
        log: Log,
    }

    struct RecordedJob {
        log: Log,
        index: usize,
    }

    impl Job for RecordedJob {
        fn id(&self) -> u32 {
            1000 + self.index as u32
        }

        fn wait(&mut self) -> io::Result<ExitCode> {
            self.log.borrow_mut()[self.index].waited = true;
            Ok(0)
        }

        fn try_wait(&mut self) -> io::Result<Option<ExitCode>> {
            Ok(None)
        }
    }

    impl Launcher for RecordingLauncher {
        fn launch(&mut self, argv: &[&OsStr]) -> Result<Box<dyn Job>, SpawnError> {
            let argv: Vec<String> = argv
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            match argv[0].as_str() {
                "doesnotexist123" => {
                    return Err(SpawnError::Load(io::Error::from(io::ErrorKind::NotFound)));
                }
                "resource-hog" => {
                    return Err(SpawnError::Create(io::Error::from(
                        io::ErrorKind::WouldBlock,
                    )));
                }
                _ => {}
            }
            let mut log = self.log.borrow_mut();
            log.push(Launch {
                argv,
                waited: false,
            });
            Ok(Box::new(RecordedJob {
                log: self.log.clone(),
                index: log.len() - 1,
            }))
        }
    }

    fn recording_shell(settings: Settings) -> (Interpreter, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let launcher = RecordingLauncher { log: log.clone() };
        (Interpreter::new(settings, Box::new(launcher)), log)
    }

    struct Session {
        code: Result<ExitCode, ShellError>,
        out: String,
        err: String,
        launches: Vec<Launch>,
    }

    fn run_session(input: &str) -> Session {
        let (mut sh, log) = recording_shell(Settings::default());
        let mut source = BufferedSource::new(input.as_bytes(), 79);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = sh.repl(&mut source, &mut out, &mut err);
        let launches = log.borrow().clone();
        Session {
            code,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
            launches,
        }
    }

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_foreground_command_is_waited_for() {
        let s = run_session("ls -la\nexit\n");
        assert_eq!(s.code.unwrap(), 0);
        assert_eq!(
            s.launches,
            vec![Launch {
                argv: argv(&["ls", "-la"]),
                waited: true
            }]
        );
        assert_eq!(s.out, "osh> osh> ");
    }

    #[test]
    fn test_background_marker_is_stripped_and_not_waited() {
        let s = run_session("sleep 10 &\nexit\n");
        assert_eq!(
            s.launches,
            vec![Launch {
                argv: argv(&["sleep", "10"]),
                waited: false
            }]
        );
    }

    #[test]
    fn test_recall_replays_previous_command() {
        let s = run_session("echo x\n!!\nexit\n");
        let argvs: Vec<_> = s.launches.iter().map(|l| l.argv.clone()).collect();
        assert_eq!(argvs, vec![argv(&["echo", "x"]), argv(&["echo", "x"])]);
        assert!(s.out.contains("osh> echo x\nosh> "));
    }

    #[test]
    fn test_recall_with_empty_history_runs_nothing() {
        let s = run_session("!!\nexit\n");
        assert!(s.launches.is_empty());
        assert_eq!(s.out, "osh> No commands in history\nosh> ");
        assert_eq!(s.code.unwrap(), 0);
    }

    #[test]
    fn test_history_holds_only_the_last_command() {
        let s = run_session("echo x\necho y\n!!\n!!\nexit\n");
        let argvs: Vec<_> = s.launches.iter().map(|l| l.argv.clone()).collect();
        assert_eq!(
            argvs,
            vec![
                argv(&["echo", "x"]),
                argv(&["echo", "y"]),
                argv(&["echo", "y"]),
                argv(&["echo", "y"]),
            ]
        );
    }

    #[test]
    fn test_recalled_background_command_stays_in_background() {
        let s = run_session("sleep 1 &\n!!\nexit\n");
        assert_eq!(s.launches.len(), 2);
        assert!(s.launches.iter().all(|l| !l.waited));
        assert!(s.launches.iter().all(|l| l.argv == argv(&["sleep", "1"])));
    }

    #[test]
    fn test_recall_leaves_history_slot_unchanged() {
        let (mut sh, _log) = recording_shell(Settings::default());
        let mut out = Vec::new();
        let mut err = Vec::new();
        for line in ["echo x\n", "!!\n", "!!\n"] {
            sh.eval_line(&BoundedLine::from(line), &mut out, &mut err)
                .unwrap();
        }
        assert_eq!(sh.history().recall(), Some(&BoundedLine::from("echo x\n")));
    }

    struct InterruptingEditor {
        replies: Vec<rustyline::Result<String>>,
    }

    impl LineEditor for InterruptingEditor {
        fn readline(&mut self, _prompt: &str) -> rustyline::Result<String> {
            if self.replies.is_empty() {
                Err(ReadlineError::Eof)
            } else {
                self.replies.remove(0)
            }
        }
    }

    #[test]
    fn test_interrupted_line_does_not_replace_history() {
        let (mut sh, log) = recording_shell(Settings::default());
        let editor = InterruptingEditor {
            replies: vec![
                Ok("echo x".to_string()),
                Err(ReadlineError::Interrupted),
                Ok("!!".to_string()),
            ],
        };
        let mut source = EditorSource::with_editor(editor, 79);
        let mut out = Vec::new();
        let code = sh.repl(&mut source, &mut out, &mut Vec::<u8>::new());

        assert_eq!(code.unwrap(), 0);
        let argvs: Vec<_> = log.borrow().iter().map(|l| l.argv.clone()).collect();
        assert_eq!(argvs, vec![argv(&["echo", "x"]), argv(&["echo", "x"])]);
        assert_eq!(String::from_utf8(out).unwrap(), "echo x\n");
        assert_eq!(sh.history().recall(), Some(&BoundedLine::from("echo x\n")));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let s = run_session("   \n\n&\nexit\n");
        assert!(s.launches.is_empty());
        assert_eq!(s.code.unwrap(), 0);
        assert_eq!(s.err, "");
    }

    #[test]
    fn test_exit_stops_reading() {
        let s = run_session("echo a\nexit\necho b\n");
        assert_eq!(s.code.unwrap(), 0);
        assert_eq!(s.launches.len(), 1);
    }

    #[test]
    fn test_exit_with_empty_history() {
        let s = run_session("exit\n");
        assert_eq!(s.code.unwrap(), 0);
        assert!(s.launches.is_empty());
    }

    #[test]
    fn test_end_of_input_exits_cleanly() {
        let s = run_session("echo a\n");
        assert_eq!(s.code.unwrap(), 0);
        assert_eq!(s.launches.len(), 1);
    }

    #[test]
    fn test_load_failure_keeps_shell_running() {
        let s = run_session("doesnotexist123\necho after\nexit\n");
        assert!(s.err.starts_with("exec failed: "));
        assert_eq!(s.launches.len(), 1);
        assert_eq!(s.launches[0].argv, argv(&["echo", "after"]));
    }

    #[test]
    fn test_creation_failure_is_fatal() {
        let s = run_session("resource-hog\necho never\n");
        assert!(matches!(s.code, Err(ShellError::Create(_))));
        assert!(s.launches.is_empty());
    }

    #[test]
    fn test_background_children_are_tracked_when_reaping() {
        let (mut sh, _log) = recording_shell(Settings::default());
        let mut out = Vec::new();
        let mut err = Vec::new();
        let flow = sh
            .eval_line(&BoundedLine::from("sleep 5 &\n"), &mut out, &mut err)
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(sh.background_jobs(), 1);
    }

    #[test]
    fn test_background_children_are_forgotten_without_reaping() {
        let settings = Settings {
            reap_background: false,
            ..Settings::default()
        };
        let (mut sh, log) = recording_shell(settings);
        let mut out = Vec::new();
        let mut err = Vec::new();
        sh.eval_line(&BoundedLine::from("sleep 5 &\n"), &mut out, &mut err)
            .unwrap();
        assert_eq!(sh.background_jobs(), 0);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_custom_prompt_is_used() {
        let settings = Settings {
            prompt: "$ ".to_string(),
            ..Settings::default()
        };
        let (mut sh, _log) = recording_shell(settings);
        let mut source = BufferedSource::new(&b"exit\n"[..], 79);
        let mut out = Vec::new();
        sh.repl(&mut source, &mut out, &mut Vec::<u8>::new()).unwrap();
        assert_eq!(out, b"$ ");
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::time::{Duration, Instant};

        fn eval(sh: &mut Interpreter, line: &str) -> (Flow, String) {
            let mut out = Vec::new();
            let mut err = Vec::new();
            let flow = sh
                .eval_line(&BoundedLine::from(line), &mut out, &mut err)
                .unwrap();
            (flow, String::from_utf8(err).unwrap())
        }

        #[test]
        fn test_foreground_blocks_until_child_exits() {
            let mut sh = Interpreter::default();
            let start = Instant::now();
            eval(&mut sh, "sleep 0.3\n");
            assert!(start.elapsed() >= Duration::from_millis(250));
        }

        #[test]
        fn test_background_returns_before_child_exits() {
            let mut sh = Interpreter::default();
            let start = Instant::now();
            let (flow, _) = eval(&mut sh, "sleep 3 &\n");
            assert_eq!(flow, Flow::Continue);
            assert!(start.elapsed() < Duration::from_secs(2));
            assert_eq!(sh.background_jobs(), 1);
        }

        #[test]
        fn test_unknown_program_reports_and_continues() {
            let mut sh = Interpreter::default();
            let (flow, err) = eval(&mut sh, "doesnotexist123\n");
            assert_eq!(flow, Flow::Continue);
            assert!(err.starts_with("exec failed: "), "got {:?}", err);
        }
    }
}
