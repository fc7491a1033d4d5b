//! Typed positional arguments and subcommand trees, layered on a named-option parser
//!
//! This crate parses command lines of the form:
//! ```text
//! tool remote add -fetch origin https://example.com
//!      ^^^^^^^^^^ ^^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^
//!       commands  option     positional arguments
//! ```
//!
//! Piece | Role
//! -|-
//! [`OptionEngine`] | Strips leading options (`-name value`). [`FlagSet`] is the bundled one
//! [`ArgList`] | Consumes the remaining tokens, one per registered argument, in order
//! [`Cmd`] / [`CommandTree`] | Selects a leaf command by name and runs its action
//!
//! # Example
//!
//! ```
//! use arg_tree::Cmd;
//!
//! let mut add = Cmd::new("add", "Adds a remote");
//! let fetch = add.args_mut().flags_mut().bool("fetch", false, "fetch after adding");
//! let name = add.args_mut().string("name", "", "`name` of the remote");
//! let url = add.args_mut().string("url", "", "`url` to fetch from");
//! let add = add.run(move |args, _| {
//!     assert!(*args.flags().value(&fetch));
//!     assert_eq!(args.value(&name), "origin");
//!     assert_eq!(args.value(&url), "https://example.com");
//!     Ok(())
//! });
//!
//! let mut tree = Cmd::new("tool", "A tool")
//!     .add_command(Cmd::new("remote", "Manages remotes").add_command(add))
//!     .build()
//!     .unwrap();
//!
//! tree.dispatch(["remote", "add", "-fetch", "origin", "https://example.com"])
//!     .unwrap();
//! ```
//!
//! # Failures
//!
//! Parse failures print usage text to the option engine's output and are then handled according
//! to the engine's [`ErrorHandling`]: returned, turned into an exit, or turned into a panic.
//! Registering the same argument or option name twice always panics.

mod arg_list;
mod command;
mod engine;
mod error;
mod flags;
#[cfg(test)]
mod testing;
mod value;

pub use arg_list::{Arg, ArgList, UsageFn};
pub use command::{help, Action, Cmd, CommandTree};
pub use engine::{ErrorHandling, OptionEngine, OptionInfo};
pub use error::{BoxError, ConfigError, ConversionError, EngineError, Error};
pub use flags::{Flag, FlagError, FlagSet};
pub use value::{
    ArgHandle, ArgValue, BoolValue, FlagHandle, FloatValue, Handle, IntValue, Named, Positional,
    StringValue,
};
