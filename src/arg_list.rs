use crate::engine::OptionEngine;
use crate::error::{EngineError, Error};
use crate::flags::FlagSet;
use crate::value::{
    downcast, unquote_usage, ArgHandle, ArgValue, FloatValue, IntValue, StringValue,
};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use tracing::{debug, warn};

/// Renders usage text in place of [`ArgList::write_usage`]'s default layout
pub type UsageFn = Box<dyn Fn(&mut dyn Write) -> io::Result<()>>;

/// A positional argument and its current value
#[derive(Debug)]
pub struct Arg {
    name: String,
    usage: String,
    default_text: String,
    value: Box<dyn ArgValue>,
}

impl Arg {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// The value's text form at registration time
    pub fn default_text(&self) -> &str {
        &self.default_text
    }

    pub fn value(&self) -> &dyn ArgValue {
        self.value.as_ref()
    }

    /// Returns the native value if it has type `T`
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.value.get().downcast_ref()
    }
}

/// Positional arguments, consumed in registration order after an [`OptionEngine`] has stripped
/// the options in front of them
///
/// ```text
/// cp -v src dst
///    ^^ ^^^^^^^
///  option  arguments
/// ```
pub struct ArgList<E = FlagSet> {
    flags: E,
    usage: Option<UsageFn>,
    program: Option<String>,
    args: Vec<Arg>,
    index: HashMap<String, usize>,
    parsed: bool,
}

impl<E: OptionEngine> ArgList<E> {
    pub fn new(flags: E) -> Self {
        ArgList {
            flags,
            usage: None,
            program: None,
            args: vec![],
            index: HashMap::new(),
            parsed: false,
        }
    }

    /// The option engine that runs before positional arguments are consumed
    pub fn flags(&self) -> &E {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut E {
        &mut self.flags
    }

    /// Replaces the default usage text
    pub fn set_usage(&mut self, usage: impl Fn(&mut dyn Write) -> io::Result<()> + 'static) {
        self.usage = Some(Box::new(usage));
    }

    /// Shows `name` in the usage line instead of the engine's name
    pub fn set_program_name(&mut self, name: &str) {
        self.program = Some(name.to_string());
    }

    /// Name shown in the usage line
    pub fn program_name(&self) -> &str {
        self.program.as_deref().unwrap_or_else(|| self.flags.name())
    }

    /// Registers a positional argument.
    ///
    /// # Panics
    ///
    /// If an argument with the same name was already registered
    pub fn var(&mut self, value: Box<dyn ArgValue>, name: &str, usage: &str) -> usize {
        if self.index.contains_key(name) {
            panic!("duplicate argument name {name}");
        }

        let idx = self.args.len();
        self.args.push(Arg {
            name: name.to_string(),
            usage: usage.to_string(),
            default_text: value.to_string(),
            value,
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn float(&mut self, name: &str, default: f64, usage: &str) -> ArgHandle<f64> {
        ArgHandle::new(self.var(Box::new(FloatValue(default)), name, usage))
    }

    pub fn int(&mut self, name: &str, default: i64, usage: &str) -> ArgHandle<i64> {
        ArgHandle::new(self.var(Box::new(IntValue(default)), name, usage))
    }

    pub fn string(&mut self, name: &str, default: &str, usage: &str) -> ArgHandle<String> {
        ArgHandle::new(self.var(Box::new(StringValue(default.to_string())), name, usage))
    }

    pub fn value<T: 'static>(&self, handle: &ArgHandle<T>) -> &T {
        downcast(self.args[handle.index()].value.as_ref())
    }

    pub fn lookup(&self, name: &str) -> Option<&Arg> {
        self.index.get(name).map(|&idx| &self.args[idx])
    }

    /// Arguments in registration order
    pub fn args(&self) -> impl Iterator<Item = &Arg> {
        self.args.iter()
    }

    pub fn n_args(&self) -> usize {
        self.args.len()
    }

    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// Sets an argument by name without parsing a command line
    pub fn set(&mut self, name: &str, text: &str) -> Result<(), Error> {
        let Some(&idx) = self.index.get(name) else {
            return Err(self.handle_error(Error::UnknownArgument(name.to_string())));
        };

        if let Err(source) = self.args[idx].value.set(text) {
            let err = Error::Conversion {
                name: name.to_string(),
                source,
            };
            return Err(self.handle_error(err));
        }
        Ok(())
    }

    /// Parses `tokens`: options first, then exactly one token per registered argument.
    ///
    /// Usage text is written to the engine's output before any parse failure is reported. An
    /// argument list can only be parsed once.
    pub fn parse<I, T>(&mut self, tokens: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if self.parsed {
            return Err(self.handle_error(Error::AlreadyParsed));
        }

        let tokens = tokens.into_iter().map(Into::into).collect::<Vec<String>>();
        let remaining = match self.flags.parse(&tokens) {
            Ok(remaining) => remaining,
            Err(EngineError::Help) => return Err(self.fail(Error::Help)),
            Err(EngineError::Invalid(source)) => return Err(self.fail(Error::Options(source))),
        };

        let mut remaining = remaining.into_iter();
        for idx in 0..self.args.len() {
            let Some(token) = remaining.next() else {
                let name = self.args[idx].name.clone();
                return Err(self.fail(Error::MissingArgument(name)));
            };

            let arg = &mut self.args[idx];
            if let Err(source) = arg.value.set(&token) {
                let name = arg.name.clone();
                return Err(self.fail(Error::Conversion { name, source }));
            }
            debug!(argument = %self.args[idx].name, "argument set");
        }

        let unused = remaining.collect::<Vec<_>>();
        if !unused.is_empty() {
            return Err(self.fail(Error::UnusedArguments(unused.iter().join(" "))));
        }

        self.parsed = true;
        Ok(())
    }

    /// Writes one entry per argument: `  <name> <placeholder>\t<usage>`
    pub fn print_defaults(&self, w: &mut dyn Write) -> io::Result<()> {
        for arg in &self.args {
            let (hint, usage) = unquote_usage(&arg.usage, arg.value.as_ref());

            let mut line = format!("  {}", arg.name);
            if !hint.is_empty() {
                line.push(' ');
                line.push_str(&hint);
            }
            line.push('\t');
            line.push_str(&usage.replace('\n', "\n    \t"));
            writeln!(w, "{line}")?;
        }
        Ok(())
    }

    /// Writes usage text to the engine's output
    pub fn write_usage(&mut self) -> io::Result<()> {
        match &self.usage {
            Some(usage) => usage(self.flags.output()),
            None => self.write_default_usage(),
        }
    }

    fn write_default_usage(&mut self) -> io::Result<()> {
        let has_options = self.flags.num_options() > 0;

        let mut synopsis = String::from("Usage:");
        let name = self.program_name();
        if !name.is_empty() {
            synopsis.push(' ');
            synopsis.push_str(name);
        }
        if has_options {
            synopsis.push_str(" [<options>]");
        }
        for arg in &self.args {
            synopsis.push(' ');
            synopsis.push_str(&arg.name);
        }

        let mut arguments = vec![];
        self.print_defaults(&mut arguments)?;

        writeln!(self.flags.output(), "{synopsis}")?;
        if has_options {
            write!(self.flags.output(), "\nOptions:\n")?;
            self.flags.print_defaults()?;
        }
        if !self.args.is_empty() {
            let output = self.flags.output();
            write!(output, "\nArguments:\n")?;
            output.write_all(&arguments)?;
        }
        self.flags.output().flush()
    }

    fn fail(&mut self, err: Error) -> Error {
        if let Err(io_err) = self.write_usage() {
            warn!(error = %io_err, "could not write usage text");
        }
        self.handle_error(err)
    }

    /// Applies the engine's error handling to `err`
    pub(crate) fn handle_error(&mut self, err: Error) -> Error {
        let mode = self.flags.error_handling();
        mode.handle(err, self.flags.output())
    }
}

impl<E: fmt::Debug> fmt::Debug for ArgList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgList")
            .field("flags", &self.flags)
            .field("args", &self.args)
            .field("parsed", &self.parsed)
            .finish_non_exhaustive()
    }
}
