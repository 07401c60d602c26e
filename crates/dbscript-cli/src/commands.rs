use std::str::FromStr;

/// Backslash commands available at the prompt
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    ListTables,
    DescribeTable(String),
    RunFile(String),
}

impl Command {
    /// `(usage, description)` of every command, for `\?`.
    pub fn all() -> &'static [(&'static str, &'static str)] {
        &[
            ("\\q", "quit"),
            ("\\?", "show this help"),
            ("\\d", "list tables"),
            ("\\d NAME", "describe a table"),
            ("\\run FILE", "run a script file"),
        ]
    }
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (c, arg) = match s.trim().split_once(' ') {
            Some((a, b)) => (a, Some(b.trim())),
            None => (s.trim(), None),
        };
        Ok(match (c, arg) {
            ("q", None) | ("quit", None) => Self::Quit,
            ("?", None) => Self::Help,
            ("d", None) => Self::ListTables,
            ("d", Some(name)) => Self::DescribeTable(name.into()),
            ("run", Some(path)) => Self::RunFile(path.into()),
            _ => return Err(()),
        })
    }
}
