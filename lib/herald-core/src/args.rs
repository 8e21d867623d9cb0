//! Action invocation arguments.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Positional and keyword arguments of an action invocation.
///
/// Arguments are kept as JSON values so an invocation can be persisted across the
/// queue boundary and replayed verbatim by a submission job.
///
/// ```
/// use herald_core::Args;
///
/// let args = Args::new().arg(42).option("draft", true);
/// assert_eq!(args.get::<u32>(0).unwrap(), 42);
/// assert_eq!(args.option_as::<bool>("draft").unwrap(), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Args {
    #[serde(default)]
    positional: Vec<Value>,
    #[serde(default)]
    options: Map<String, Value>,
}

impl Args {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument.
    #[must_use]
    pub fn option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Positional arguments.
    #[must_use]
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword arguments.
    #[must_use]
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Raw positional argument.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Deserialize a positional argument.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the argument is missing or has the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let value = self
            .value(index)
            .ok_or_else(|| Error::invalid_argument(format!("missing argument #{index}")))?;
        T::deserialize(value)
            .map_err(|err| Error::invalid_argument(format!("argument #{index}: {err}")))
    }

    /// Deserialize a keyword argument, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the option has the wrong shape.
    pub fn option_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.options
            .get(name)
            .map(|value| {
                T::deserialize(value)
                    .map_err(|err| Error::invalid_argument(format!("option {name}: {err}")))
            })
            .transpose()
    }

    /// Positional and keyword arguments exposed as template locals.
    #[must_use]
    pub fn to_locals(&self) -> Map<String, Value> {
        let mut locals = Map::new();
        locals.insert("arguments".to_string(), Value::Array(self.positional.clone()));
        locals.insert("options".to_string(), Value::Object(self.options.clone()));
        locals
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn typed_access() {
        let args = Args::new().arg("hello").arg(3).option("tag", "news");

        assert_eq!(args.get::<String>(0).expect("string"), "hello");
        assert_eq!(args.get::<i64>(1).expect("int"), 3);
        assert_eq!(
            args.option_as::<String>("tag").expect("tag"),
            Some("news".to_string())
        );
        assert_eq!(args.option_as::<String>("missing").expect("absent"), None);
    }

    #[test]
    fn missing_or_mistyped_argument() {
        let args = Args::new().arg("not a number");

        assert!(matches!(args.get::<u32>(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(args.get::<u32>(5), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn locals_expose_arguments_and_options() {
        let args = Args::new().arg(1).option("draft", false);
        let locals = Value::Object(args.to_locals());

        assert_eq!(locals, json!({"arguments": [1], "options": {"draft": false}}));
    }

    #[test]
    fn survives_serialization() {
        let args = Args::new().arg(json!({"id": 7})).option("page", 2);
        let encoded = serde_json::to_vec(&args).expect("serialize");
        let decoded: Args = serde_json::from_slice(&encoded).expect("deserialize");

        assert_eq!(decoded, args);
    }
}
