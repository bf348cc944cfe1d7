//! A small interactive shell that runs one external program per input line.
//!
//! Every iteration of the loop goes through the same stages: read a bounded line,
//! substitute the `!!` recall token from a single-slot history, split the line into an
//! argument vector, strip a trailing `&` background marker, and finally either handle the
//! `exit` built-in or launch the program as a child process, waiting for it unless it
//! was sent to the background.
//!
//! The main entry point is [`Interpreter`]. Line acquisition is abstracted behind
//! [`input::LineSource`] and process creation behind [`command::Launcher`], so every stage
//! can be driven without a terminal or real child processes.

mod builtin;
pub mod command;
pub mod error;
mod external;
pub mod history;
pub mod input;
mod interpreter;
pub mod job;
pub mod lexer;
pub mod settings;

pub use error::{ShellError, SpawnError};
pub use external::ProcessLauncher;
pub use interpreter::{Flow, Interpreter, Stage};
pub use settings::Settings;
