use crate::engine::{ErrorHandling, OptionEngine, OptionInfo};
use crate::error::{ConversionError, EngineError};
use crate::value::{
    downcast, ArgValue, BoolValue, FlagHandle, FloatValue, IntValue, StringValue,
};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use tracing::debug;

const HELP_NAMES: [&str; 2] = ["h", "help"];

/// A failure to parse options
#[derive(Debug, thiserror::Error)]
pub enum FlagError {
    #[error("flag provided but not defined: -{0}")]
    Undefined(String),
    #[error("bad flag syntax: {0}")]
    BadSyntax(String),
    #[error("flag needs an argument: -{0}")]
    MissingValue(String),
    #[error("invalid value for flag -{name}: {source}")]
    InvalidValue {
        name: String,
        source: ConversionError,
    },
}

impl From<FlagError> for EngineError {
    fn from(err: FlagError) -> Self {
        EngineError::Invalid(Box::new(err))
    }
}

/// A named option and its current value
#[derive(Debug)]
pub struct Flag {
    name: String,
    usage: String,
    default_text: String,
    value: Box<dyn ArgValue>,
}

impl Flag {
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

    fn info(&self) -> OptionInfo<'_> {
        OptionInfo {
            name: &self.name,
            usage: &self.usage,
            default: &self.default_text,
            value: self.value.as_ref(),
        }
    }
}

enum Step<'t> {
    Next(&'t [String]),
    Done(&'t [String]),
}

/// A small option engine for `-name value` style options
///
/// - `-name` and `--name` are equivalent
/// - `-name=value` and `-name value` set an option; bool options take no separate value
/// - parsing stops at the first token that is not an option, at a lone `-`, or right after `--`
pub struct FlagSet {
    name: String,
    error_handling: ErrorHandling,
    output: Box<dyn Write>,
    flags: Vec<Flag>,
    index: HashMap<String, usize>,
    actual: Vec<usize>,
    parsed: bool,
}

impl FlagSet {
    pub fn new(name: &str, error_handling: ErrorHandling) -> Self {
        FlagSet {
            name: name.to_string(),
            error_handling,
            output: Box::new(io::stderr()),
            flags: vec![],
            index: HashMap::new(),
            actual: vec![],
            parsed: false,
        }
    }

    /// Redirects usage text, which goes to stderr by default
    pub fn set_output(&mut self, output: Box<dyn Write>) {
        self.output = output;
    }

    /// Registers an option.
    ///
    /// # Panics
    ///
    /// If an option with the same name was already registered
    pub fn var(&mut self, value: Box<dyn ArgValue>, name: &str, usage: &str) -> usize {
        if self.index.contains_key(name) {
            panic!("duplicate flag name {name}");
        }

        let idx = self.flags.len();
        self.flags.push(Flag {
            name: name.to_string(),
            usage: usage.to_string(),
            default_text: value.to_string(),
            value,
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn bool(&mut self, name: &str, default: bool, usage: &str) -> FlagHandle<bool> {
        FlagHandle::new(self.var(Box::new(BoolValue(default)), name, usage))
    }

    pub fn int(&mut self, name: &str, default: i64, usage: &str) -> FlagHandle<i64> {
        FlagHandle::new(self.var(Box::new(IntValue(default)), name, usage))
    }

    pub fn float(&mut self, name: &str, default: f64, usage: &str) -> FlagHandle<f64> {
        FlagHandle::new(self.var(Box::new(FloatValue(default)), name, usage))
    }

    pub fn string(&mut self, name: &str, default: &str, usage: &str) -> FlagHandle<String> {
        FlagHandle::new(self.var(Box::new(StringValue(default.to_string())), name, usage))
    }

    pub fn value<T: 'static>(&self, handle: &FlagHandle<T>) -> &T {
        downcast(self.flags[handle.index()].value.as_ref())
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.index.get(name).map(|&idx| &self.flags[idx])
    }

    /// Sets an option by name, as if it had been given on the command line
    pub fn set(&mut self, name: &str, text: &str) -> Result<(), FlagError> {
        let Some(&idx) = self.index.get(name) else {
            return Err(FlagError::Undefined(name.to_string()));
        };
        self.flags[idx]
            .value
            .set(text)
            .map_err(|source| FlagError::InvalidValue {
                name: name.to_string(),
                source,
            })?;
        if !self.actual.contains(&idx) {
            self.actual.push(idx);
        }
        Ok(())
    }

    /// Number of options that have been set
    pub fn n_flag(&self) -> usize {
        self.actual.len()
    }

    /// Calls `f` for every option that has been set, in lexical order
    pub fn visit(&self, mut f: impl FnMut(&Flag)) {
        self.actual
            .iter()
            .map(|&idx| &self.flags[idx])
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .for_each(|flag| f(flag));
    }

    fn parse_one<'t>(&mut self, tokens: &'t [String]) -> Result<Step<'t>, FlagError> {
        let Some((arg, rest)) = tokens.split_first() else {
            return Ok(Step::Done(tokens));
        };

        let Some(mut name) = arg.strip_prefix('-') else {
            return Ok(Step::Done(tokens));
        };

        // A lone `-` is a positional argument (usually stdin)
        if name.is_empty() {
            return Ok(Step::Done(tokens));
        }

        if let Some(long) = name.strip_prefix('-') {
            // `--` terminates the options and is consumed
            if long.is_empty() {
                return Ok(Step::Done(rest));
            }
            name = long;
        }

        if name.starts_with('-') || name.starts_with('=') {
            return Err(FlagError::BadSyntax(arg.clone()));
        }

        // The value of the option is in the same argument.
        // e.g. -level=debug
        let (name, inline) = match name.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (name, None),
        };

        let Some(&idx) = self.index.get(name) else {
            return Err(FlagError::Undefined(name.to_string()));
        };

        let (text, rest) = match inline {
            Some(value) => (value, rest),
            None if self.flags[idx].value.is_bool_flag() => ("true", rest),
            // The value of the option was given as a separate argument.
            // e.g. -level debug
            None => {
                let (value, rest) = rest
                    .split_first()
                    .ok_or_else(|| FlagError::MissingValue(name.to_string()))?;
                (value.as_str(), rest)
            }
        };

        self.set(name, text)?;
        Ok(Step::Next(rest))
    }

    fn is_help(&self, err: &FlagError) -> bool {
        matches!(err, FlagError::Undefined(name) if HELP_NAMES.contains(&name.as_str()))
    }
}

impl OptionEngine for FlagSet {
    fn parse(&mut self, tokens: &[String]) -> Result<Vec<String>, EngineError> {
        self.parsed = true;

        let mut rest = tokens;
        loop {
            match self.parse_one(rest) {
                Ok(Step::Next(next)) => rest = next,
                Ok(Step::Done(remaining)) => {
                    debug!(
                        flags = %self.name,
                        consumed = tokens.len() - remaining.len(),
                        "options parsed"
                    );
                    return Ok(remaining.to_vec());
                }
                Err(err) if self.is_help(&err) => return Err(EngineError::Help),
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn num_options(&self) -> usize {
        self.flags.len()
    }

    fn visit_all(&self, f: &mut dyn FnMut(&OptionInfo<'_>)) {
        self.flags
            .iter()
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .for_each(|flag| f(&flag.info()));
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    fn error_handling(&self) -> ErrorHandling {
        self.error_handling
    }

    fn parsed(&self) -> bool {
        self.parsed
    }
}

impl fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSet")
            .field("name", &self.name)
            .field("error_handling", &self.error_handling)
            .field("flags", &self.flags)
            .field("parsed", &self.parsed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tokens, SharedBuf};

    fn flag_set() -> (FlagSet, FlagHandle<bool>, FlagHandle<String>, FlagHandle<i64>) {
        let mut fs = FlagSet::new("tool", ErrorHandling::ReturnError);
        let verbose = fs.bool("v", false, "be loud");
        let level = fs.string("level", "info", "log level");
        let jobs = fs.int("jobs", 1, "`n` parallel jobs");
        (fs, verbose, level, jobs)
    }

    #[test]
    fn stops_at_first_positional() {
        let (mut fs, verbose, level, jobs) = flag_set();
        let rest = fs
            .parse(&tokens(["-v", "--level", "debug", "-jobs=4", "pkg", "-x"]))
            .unwrap();

        assert_eq!(rest, ["pkg", "-x"]);
        assert!(*fs.value(&verbose));
        assert_eq!(fs.value(&level), "debug");
        assert_eq!(*fs.value(&jobs), 4);
        assert_eq!(fs.n_flag(), 3);
        assert!(fs.parsed());
    }

    #[test]
    fn double_dash_is_consumed() {
        let (mut fs, verbose, ..) = flag_set();
        let rest = fs.parse(&tokens(["--", "-v"])).unwrap();
        assert_eq!(rest, ["-v"]);
        assert!(!*fs.value(&verbose));
    }

    #[test]
    fn lone_dash_is_positional() {
        let (mut fs, ..) = flag_set();
        let rest = fs.parse(&tokens(["-", "a"])).unwrap();
        assert_eq!(rest, ["-", "a"]);
    }

    #[test]
    fn bool_with_inline_value() {
        let (mut fs, verbose, ..) = flag_set();
        fs.parse(&tokens(["-v=true", "-v=false"])).unwrap();
        assert!(!*fs.value(&verbose));
        assert_eq!(fs.n_flag(), 1);
    }

    #[test]
    fn failures() {
        let (mut fs, ..) = flag_set();
        let err = fs.parse(&tokens(["-nope"])).unwrap_err();
        assert_eq!(err.to_string(), "flag provided but not defined: -nope");

        let err = fs.parse(&tokens(["-level"])).unwrap_err();
        assert_eq!(err.to_string(), "flag needs an argument: -level");

        let err = fs.parse(&tokens(["---v"])).unwrap_err();
        assert_eq!(err.to_string(), "bad flag syntax: ---v");

        let err = fs.parse(&tokens(["-jobs", "many"])).unwrap_err();
        assert!(err.to_string().starts_with("invalid value for flag -jobs"));

        assert!(matches!(
            fs.parse(&tokens(["--help"])),
            Err(EngineError::Help)
        ));
        assert!(matches!(fs.parse(&tokens(["-h"])), Err(EngineError::Help)));
    }

    #[test]
    fn defined_help_flag_is_not_intercepted() {
        let mut fs = FlagSet::new("tool", ErrorHandling::ReturnError);
        let help = fs.bool("help", false, "show help");
        fs.parse(&tokens(["-help"])).unwrap();
        assert!(*fs.value(&help));
    }

    #[test]
    #[should_panic(expected = "duplicate flag name v")]
    fn duplicate_flag_panics() {
        let (mut fs, ..) = flag_set();
        fs.bool("v", true, "again");
    }

    #[test]
    fn visiting() {
        let (mut fs, ..) = flag_set();
        fs.parse(&tokens(["-level", "warn", "-v"])).unwrap();

        let mut set = vec![];
        fs.visit(|f| set.push(f.name().to_string()));
        assert_eq!(set, ["level", "v"]);

        let mut all = vec![];
        fs.visit_all(&mut |o| all.push(o.name.to_string()));
        assert_eq!(all, ["jobs", "level", "v"]);

        let level = fs.lookup("level").unwrap();
        assert_eq!(level.default_text(), "info");
        assert_eq!(level.get::<String>().unwrap(), "warn");
    }

    #[test]
    fn option_defaults_text() {
        let (mut fs, ..) = flag_set();
        let buf = SharedBuf::default();
        fs.set_output(Box::new(buf.clone()));
        fs.print_defaults().unwrap();

        assert_eq!(
            buf.contents(),
            concat!(
                "  -jobs n\n    \tn parallel jobs (default 1)\n",
                "  -level string\n    \tlog level (default \"info\")\n",
                "  -v\tbe loud\n",
            )
        );
    }
}
