use crate::arg_list::ArgList;
use crate::engine::{ErrorHandling, OptionEngine};
use crate::error::{BoxError, ConfigError, Error};
use crate::flags::FlagSet;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

pub mod help;

const HELP_TOKENS: [&str; 3] = ["-h", "-help", "--help"];

/// Called with a leaf command's parsed arguments and the tokens the leaf received
pub type Action<E> = Box<dyn FnMut(&ArgList<E>, &[String]) -> Result<(), BoxError>>;

/// A blueprint for a command: either a leaf that runs an action, or a branch that selects one of
/// its subcommands by name
pub struct Cmd<E = FlagSet> {
    name: String,
    description: String,
    help: String,
    action: Option<Action<E>>,
    commands: Vec<Cmd<E>>,
    args: ArgList<E>,
}

impl Cmd<FlagSet> {
    /// Creates a new command whose options are parsed by a [`FlagSet`] named after it.
    ///
    /// This structure can be used to represent both root and sub-commands.
    pub fn new(name: &str, description: &str) -> Self {
        let flags = FlagSet::new(name, ErrorHandling::ReturnError);
        Self::with_args(name, description, ArgList::new(flags))
    }
}

impl<E: OptionEngine> Cmd<E> {
    /// Creates a new command around an existing argument list
    pub fn with_args(name: &str, description: &str, args: ArgList<E>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            help: String::new(),
            action: None,
            commands: vec![],
            args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Attaches longer help text, shown in the command's usage
    pub fn help(mut self, text: &str) -> Self {
        self.help = text.to_string();
        self
    }

    /// Defines a subcommand
    pub fn add_command(mut self, subcommand: Cmd<E>) -> Self {
        self.commands.push(subcommand);
        self
    }

    /// Makes this command a leaf that runs `action` once its arguments parse
    pub fn run(
        mut self,
        action: impl FnMut(&ArgList<E>, &[String]) -> Result<(), BoxError> + 'static,
    ) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    pub fn args(&self) -> &ArgList<E> {
        &self.args
    }

    /// Arguments and options are declared through this
    pub fn args_mut(&mut self) -> &mut ArgList<E> {
        &mut self.args
    }

    /// Returns a reference to a subcommand with the given name
    pub fn get_subcommand(&self, name: &str) -> Option<&Cmd<E>> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Checks that every command in the tree is either a leaf or a branch
    pub fn build(self) -> Result<CommandTree<E>, ConfigError> {
        Self::_validate(&self, &self.name)?;
        Ok(CommandTree { root: self })
    }

    fn _validate(cmd: &Cmd<E>, path: &str) -> Result<(), ConfigError> {
        match (cmd.action.is_some(), cmd.commands.is_empty()) {
            (true, false) => return Err(ConfigError::Ambiguous(path.to_string())),
            (false, true) => return Err(ConfigError::Empty(path.to_string())),
            _ => {}
        }

        let mut seen = HashSet::new();
        for sub in &cmd.commands {
            if !seen.insert(sub.name.as_str()) {
                return Err(ConfigError::DuplicateCommand(
                    path.to_string(),
                    sub.name.clone(),
                ));
            }
            Self::_validate(sub, &format!("{path} {}", sub.name))?;
        }
        Ok(())
    }

    fn dispatch(&mut self, path: &str, tokens: &[String]) -> Result<(), Error> {
        if self.commands.is_empty() {
            debug!(command = path, "running command");
            self.args.set_program_name(path);
            self.args.parse(tokens.iter().cloned())?;

            // A validated leaf always has an action
            let Some(action) = self.action.as_mut() else {
                return Ok(());
            };
            return action(&self.args, tokens).map_err(Error::Action);
        }

        let Some((first, rest)) = tokens.split_first() else {
            return Err(self.fail(path, Error::MissingSubcommand));
        };

        if HELP_TOKENS.contains(&first.as_str()) {
            return Err(self.fail(path, Error::Help));
        }

        let found = self.commands.iter().position(|c| c.name == *first);
        let Some(idx) = found else {
            return Err(self.fail(path, Error::InvalidCommand(first.clone())));
        };

        let sub = &mut self.commands[idx];
        let sub_path = format!("{path} {}", sub.name);
        debug!(command = %sub_path, "selected subcommand");
        sub.dispatch(&sub_path, rest)
    }

    /// Writes the command list of a branch to its engine's output
    pub fn write_usage(&mut self, path: &str) -> std::io::Result<()> {
        help::write_commands(self.args.flags_mut().output(), path, &self.help, &self.commands)
    }

    fn fail(&mut self, path: &str, err: Error) -> Error {
        if let Err(io_err) = self.write_usage(path) {
            warn!(error = %io_err, "could not write usage text");
        }
        self.args.handle_error(err)
    }
}

impl<E: fmt::Debug> fmt::Debug for Cmd<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cmd")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("commands", &self.commands)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// A validated command tree, ready to dispatch a command line
pub struct CommandTree<E = FlagSet> {
    root: Cmd<E>,
}

impl<E: OptionEngine> CommandTree<E> {
    /// Dispatches `tokens` (without the program name) to the matching leaf command
    pub fn dispatch<I, T>(&mut self, tokens: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tokens = tokens.into_iter().map(Into::into).collect::<Vec<String>>();
        let path = self.root.name.clone();
        self.root.dispatch(&path, &tokens)
    }

    /// Dispatches the process's command line
    pub fn dispatch_env(&mut self) -> Result<(), Error> {
        self.dispatch(std::env::args().skip(1))
    }

    pub fn root(&self) -> &Cmd<E> {
        &self.root
    }

    /// Returns the command reached by following `path` from the root
    pub fn find(&self, path: &[&str]) -> Option<&Cmd<E>> {
        path.iter()
            .try_fold(&self.root, |cmd, name| cmd.get_subcommand(name))
    }
}

impl<E: fmt::Debug> fmt::Debug for CommandTree<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTree")
            .field("root", &self.root)
            .finish()
    }
}
