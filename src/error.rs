use std::fmt::Display;

/// Boxed error used at the seams with option engines and command actions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Emitted when text is not a valid encoding of a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value {text:?}: {reason}")]
pub struct ConversionError {
    pub text: String,
    pub kind: &'static str,
    pub reason: String,
}

impl ConversionError {
    pub fn new(text: &str, kind: &'static str, reason: impl Display) -> Self {
        ConversionError {
            text: text.to_string(),
            kind,
            reason: reason.to_string(),
        }
    }
}

/// A variant of this enum is returned when the command line doesn't match the declared arguments
/// and commands
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot set value for argument {name}: {source}")]
    Conversion {
        name: String,
        source: ConversionError,
    },
    #[error("missing value for argument {0}")]
    MissingArgument(String),
    #[error("unused arguments: {0}")]
    UnusedArguments(String),
    #[error("argument name {0} is invalid")]
    UnknownArgument(String),
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    #[error("missing command")]
    MissingSubcommand,
    #[error("help requested")]
    Help,
    #[error("{0}")]
    Options(#[source] BoxError),
    #[error("arguments have already been parsed")]
    AlreadyParsed,
    #[error("{0}")]
    Action(#[source] BoxError),
}

/// Errors reported by an [`OptionEngine`](crate::OptionEngine) while stripping options
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `-h` or `-help` was given and no option by that name exists
    #[error("help requested")]
    Help,
    #[error("{0}")]
    Invalid(#[source] BoxError),
}

/// A command tree that cannot be dispatched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("command '{0}' has neither an action nor subcommands")]
    Empty(String),
    #[error("command '{0}' has both an action and subcommands")]
    Ambiguous(String),
    #[error("command '{0}' defines subcommand '{1}' more than once")]
    DuplicateCommand(String, String),
}
