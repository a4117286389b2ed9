//! Typed option bag for git invocations.
//!
//! Flags are held in insertion order and rendered by a pure function:
//! one-character names become short flags (`-f`), longer names long flags
//! (`--depth`). A value renders as its own argv entry after the flag; a
//! sequence repeats the flag once per value.

/// The shape of a single flag.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FlagValue {
    /// Present/absent flag with no value (`--force`).
    Switch,
    /// Flag followed by one value (`--depth 1`).
    Value(String),
    /// Flag repeated once per value (`--config a --config b`).
    Values(Vec<String>),
}

/// An ordered set of git flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOptions {
    flags: Vec<(String, FlagValue)>,
}

impl GitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value-less flag.
    pub fn switch(mut self, name: &str) -> Self {
        self.flags.push((name.to_string(), FlagValue::Switch));
        self
    }

    /// Add a flag with a single value.
    pub fn value(mut self, name: &str, value: &str) -> Self {
        self.flags
            .push((name.to_string(), FlagValue::Value(value.to_string())));
        self
    }

    /// Add a flag repeated once per value.
    pub fn values<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags.push((
            name.to_string(),
            FlagValue::Values(values.into_iter().map(Into::into).collect()),
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Render to argv entries, in insertion order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (name, value) in &self.flags {
            match value {
                FlagValue::Switch => args.push(render_flag(name)),
                FlagValue::Value(v) => {
                    args.push(render_flag(name));
                    args.push(v.clone());
                }
                FlagValue::Values(vs) => {
                    for v in vs {
                        args.push(render_flag(name));
                        args.push(v.clone());
                    }
                }
            }
        }
        args
    }
}

fn render_flag(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}
