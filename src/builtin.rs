use crate::interpreter::Flow;
use crate::lexer::ArgVector;

/// Commands handled inside the shell process instead of being launched.
pub(crate) trait BuiltinCommand: Sized {
    /// Name matched against token 0.
    fn name() -> &'static [u8];

    /// Build the command from the tokens that follow its name.
    fn from_args(args: &[&[u8]]) -> Self;

    /// What the loop should do next.
    fn execute(self) -> Flow;
}

/// Leave the shell with status 0. Any arguments are ignored.
pub(crate) struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static [u8] {
        b"exit"
    }

    fn from_args(_args: &[&[u8]]) -> Self {
        Exit
    }

    fn execute(self) -> Flow {
        Flow::Exit(0)
    }
}

fn try_run<T: BuiltinCommand>(argv: &ArgVector<'_>) -> Option<Flow> {
    match argv.tokens().split_first() {
        Some((name, args)) if *name == T::name() => Some(T::from_args(args).execute()),
        _ => None,
    }
}

/// Run `argv` as a built-in if its program name is one. `exit` is the only one.
pub(crate) fn try_builtin(argv: &ArgVector<'_>) -> Option<Flow> {
    try_run::<Exit>(argv)
}
