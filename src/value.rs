use crate::error::ConversionError;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// A typed value that can be set from command line text
///
/// Positional arguments and options both store their values behind this trait, so new kinds of
/// values only need an implementation of it to be registered.
pub trait ArgValue: fmt::Display + fmt::Debug {
    /// Replaces the current value with the one encoded by `text`
    fn set(&mut self, text: &str) -> Result<(), ConversionError>;

    /// Returns the native value, for introspection
    fn get(&self) -> &dyn Any;

    /// Placeholder shown in usage text when the usage string does not name one
    fn type_hint(&self) -> &'static str {
        "value"
    }

    /// Options backed by this value may be given without a following value (e.g. `-verbose`)
    fn is_bool_flag(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatValue(pub f64);

impl ArgValue for FloatValue {
    fn set(&mut self, text: &str) -> Result<(), ConversionError> {
        self.0 = text
            .parse()
            .map_err(|e| ConversionError::new(text, "float", e))?;
        Ok(())
    }

    fn get(&self) -> &dyn Any {
        &self.0
    }

    fn type_hint(&self) -> &'static str {
        "float"
    }
}

impl fmt::Display for FloatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntValue(pub i64);

impl ArgValue for IntValue {
    fn set(&mut self, text: &str) -> Result<(), ConversionError> {
        self.0 = text
            .parse()
            .map_err(|e| ConversionError::new(text, "int", e))?;
        Ok(())
    }

    fn get(&self) -> &dyn Any {
        &self.0
    }

    fn type_hint(&self) -> &'static str {
        "int"
    }
}

impl fmt::Display for IntValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringValue(pub String);

impl ArgValue for StringValue {
    fn set(&mut self, text: &str) -> Result<(), ConversionError> {
        self.0 = text.to_string();
        Ok(())
    }

    fn get(&self) -> &dyn Any {
        &self.0
    }

    fn type_hint(&self) -> &'static str {
        "string"
    }
}

impl fmt::Display for StringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoolValue(pub bool);

impl ArgValue for BoolValue {
    fn set(&mut self, text: &str) -> Result<(), ConversionError> {
        self.0 = match text {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => true,
            "0" | "f" | "F" | "false" | "FALSE" | "False" => false,
            _ => return Err(ConversionError::new(text, "bool", "not a boolean")),
        };
        Ok(())
    }

    fn get(&self) -> &dyn Any {
        &self.0
    }

    fn type_hint(&self) -> &'static str {
        "bool"
    }

    fn is_bool_flag(&self) -> bool {
        true
    }
}

impl fmt::Display for BoolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marks handles returned by an [`ArgList`](crate::ArgList)
#[derive(Debug)]
pub enum Positional {}

/// Marks handles returned by a [`FlagSet`](crate::FlagSet)
#[derive(Debug)]
pub enum Named {}

/// A typed reference to a value registered in an [`ArgList`](crate::ArgList) (`K` is
/// [`Positional`]) or a [`FlagSet`](crate::FlagSet) (`K` is [`Named`])
///
/// An option's handle cannot be read from an argument list, or the other way round:
///
/// ```compile_fail
/// use arg_tree::{ArgList, ErrorHandling, FlagSet};
///
/// let mut list = ArgList::new(FlagSet::new("cp", ErrorHandling::ReturnError));
/// let level = list.flags_mut().string("level", "info", "");
/// list.string("src", "", "");
/// let _ = list.value(&level);
/// ```
pub struct Handle<T, K> {
    index: usize,
    _marker: PhantomData<fn() -> (T, K)>,
}

pub type ArgHandle<T> = Handle<T, Positional>;

pub type FlagHandle<T> = Handle<T, Named>;

impl<T, K> Handle<T, K> {
    pub(crate) fn new(index: usize) -> Self {
        Handle {
            index,
            _marker: PhantomData,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

impl<T, K> Clone for Handle<T, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, K> Copy for Handle<T, K> {}

impl<T, K> fmt::Debug for Handle<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.index).finish()
    }
}

pub(crate) fn downcast<T: 'static>(value: &dyn ArgValue) -> &T {
    value
        .get()
        .downcast_ref()
        .expect("handle used with a collection it does not belong to")
}

/// Splits a usage string into the placeholder to display and the usage text to render.
///
/// The placeholder is the first back-quoted word in `usage` (the quotes are removed from the
/// rendered text). Without one, the value's type hint is used; bool flags get no placeholder.
pub(crate) fn unquote_usage(usage: &str, value: &dyn ArgValue) -> (String, String) {
    if let Some((before, after)) = usage.split_once('`') {
        if let Some((name, tail)) = after.split_once('`') {
            return (name.to_string(), format!("{before}{name}{tail}"));
        }
    }

    let hint = if value.is_bool_flag() {
        ""
    } else {
        value.type_hint()
    };
    (hint.to_string(), usage.to_string())
}
