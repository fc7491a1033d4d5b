use crate::error::{EngineError, Error};
use crate::value::{unquote_usage, ArgValue};
use std::io::{self, Write};

/// What to do when parsing fails
///
/// An [`ArgList`](crate::ArgList) reads this from its option engine, so the engine and the
/// positional arguments layered on top of it fail the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorHandling {
    /// Return the error to the caller
    #[default]
    ReturnError,
    /// Print the error and exit with status 2 (status 0 when help was requested)
    ExitOnError,
    /// Panic with the error message
    PanicOnError,
}

impl ErrorHandling {
    /// Applies this policy to `err`, returning it only under [`ErrorHandling::ReturnError`].
    ///
    /// Before exiting, the error message is written to `output`.
    pub fn handle(self, err: Error, output: &mut dyn Write) -> Error {
        match self {
            ErrorHandling::ReturnError => err,
            ErrorHandling::ExitOnError => {
                if matches!(err, Error::Help) {
                    std::process::exit(0);
                }
                // Nothing is left to report a write failure to
                let _ = write_exit_message(&err, output);
                std::process::exit(2);
            }
            ErrorHandling::PanicOnError => panic!("{err}"),
        }
    }
}

fn write_exit_message(err: &Error, output: &mut dyn Write) -> io::Result<()> {
    writeln!(output, "{err}")?;
    output.flush()
}

/// A registered option, as seen by [`OptionEngine::visit_all`]
#[derive(Debug, Clone, Copy)]
pub struct OptionInfo<'a> {
    pub name: &'a str,
    pub usage: &'a str,
    pub default: &'a str,
    pub value: &'a dyn ArgValue,
}

/// The parser for named options (`-name value`) that positional arguments are layered on
pub trait OptionEngine {
    /// Consumes the leading options in `tokens`, returning the tokens that follow them
    fn parse(&mut self, tokens: &[String]) -> Result<Vec<String>, EngineError>;

    /// Number of registered options
    fn num_options(&self) -> usize;

    /// Calls `f` for every registered option
    fn visit_all(&self, f: &mut dyn FnMut(&OptionInfo<'_>));

    /// Program name shown in usage text
    fn name(&self) -> &str;

    /// Sink for usage text
    fn output(&mut self) -> &mut dyn Write;

    fn error_handling(&self) -> ErrorHandling;

    fn parsed(&self) -> bool;

    /// Writes one entry per registered option to [`output`](OptionEngine::output)
    fn print_defaults(&mut self) -> io::Result<()> {
        let mut text = String::new();
        self.visit_all(&mut |option| text.push_str(&format_option(option)));
        self.output().write_all(text.as_bytes())
    }
}

fn format_option(option: &OptionInfo<'_>) -> String {
    let (hint, usage) = unquote_usage(option.usage, option.value);

    let mut line = format!("  -{}", option.name);
    if !hint.is_empty() {
        line.push(' ');
        line.push_str(&hint);
    }
    // Single letter options without a placeholder fit on one line
    if line.len() <= 4 {
        line.push('\t');
    } else {
        line.push_str("\n    \t");
    }
    line.push_str(&usage.replace('\n', "\n    \t"));

    if !is_zero_value(option) {
        if option.value.type_hint() == "string" {
            line.push_str(&format!(" (default {:?})", option.default));
        } else {
            line.push_str(&format!(" (default {})", option.default));
        }
    }
    line.push('\n');
    line
}

fn is_zero_value(option: &OptionInfo<'_>) -> bool {
    matches!(option.default, "" | "0" | "false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{BoolValue, IntValue, StringValue};

    #[test]
    fn option_lines() {
        let value = BoolValue(false);
        let verbose = OptionInfo {
            name: "v",
            usage: "be loud",
            default: "false",
            value: &value,
        };
        assert_eq!(format_option(&verbose), "  -v\tbe loud\n");

        let value = IntValue(8080);
        let port = OptionInfo {
            name: "port",
            usage: "`number` to listen on",
            default: "8080",
            value: &value,
        };
        assert_eq!(
            format_option(&port),
            "  -port number\n    \tnumber to listen on (default 8080)\n"
        );

        let value = StringValue("info".into());
        let level = OptionInfo {
            name: "level",
            usage: "log level",
            default: "info",
            value: &value,
        };
        assert_eq!(
            format_option(&level),
            "  -level string\n    \tlog level (default \"info\")\n"
        );
    }

    #[test]
    fn return_error_hands_back_the_error() {
        let mut output = vec![];
        let err = ErrorHandling::ReturnError.handle(Error::MissingSubcommand, &mut output);
        assert!(matches!(err, Error::MissingSubcommand));
        assert!(output.is_empty());
    }

    #[test]
    #[should_panic(expected = "missing value for argument src")]
    fn panic_on_error_panics() {
        ErrorHandling::PanicOnError.handle(Error::MissingArgument("src".into()), &mut io::sink());
    }

    #[test]
    fn exit_message_goes_to_the_output() {
        let mut output = vec![];
        write_exit_message(&Error::UnusedArguments("b c".into()), &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "unused arguments: b c\n");
    }
}
