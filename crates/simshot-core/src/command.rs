//! Structured shell command lines.
//!
//! A [`ShellCommand`] is a list of [`Fragment`]s, each tagged with the
//! [`Stage`] of the pipeline that contributed it. Fragments are kept sorted
//! by stage, so the serialized command always reads prefix, tool, options,
//! destination, build settings, actions, suffix, pipe, no matter in which
//! order they were added. Quoting happens only in [`Token::render`].

use serde::Serialize;

/// A single word of a shell command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Token {
    /// A literal argument, shell-escaped when rendered.
    Arg(String),
    /// Emitted verbatim: shell operators and user supplied argument strings.
    Raw(String),
}

impl Token {
    pub fn arg(s: impl Into<String>) -> Self {
        Token::Arg(s.into())
    }

    pub fn raw(s: impl Into<String>) -> Self {
        Token::Raw(s.into())
    }

    pub fn render(&self) -> String {
        match self {
            Token::Arg(s) => shell_escape(s),
            Token::Raw(s) => s.clone(),
        }
    }
}

/// Pipeline stages, in command-line order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Prefix,
    Tool,
    Options,
    Destination,
    BuildSettings,
    Actions,
    Suffix,
    Pipe,
}

/// Tokens contributed by one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub stage: Stage,
    pub tokens: Vec<Token>,
}

impl Fragment {
    pub fn new(stage: Stage, tokens: Vec<Token>) -> Self {
        Self { stage, tokens }
    }

    pub fn render(&self) -> String {
        self.tokens
            .iter()
            .map(Token::render)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An ordered, not yet serialized, shell command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShellCommand {
    fragments: Vec<Fragment>,
}

impl ShellCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tokens` for `stage`, after everything already added for the
    /// same or an earlier stage. Empty token lists are dropped.
    pub fn push(&mut self, stage: Stage, tokens: Vec<Token>) {
        if tokens.is_empty() {
            return;
        }
        let at = self
            .fragments
            .iter()
            .position(|f| f.stage > stage)
            .unwrap_or(self.fragments.len());
        self.fragments.insert(at, Fragment::new(stage, tokens));
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// All tokens of `stage`, in insertion order.
    pub fn stage_tokens(&self, stage: Stage) -> Vec<&Token> {
        self.fragments
            .iter()
            .filter(|f| f.stage == stage)
            .flat_map(|f| f.tokens.iter())
            .collect()
    }

    /// One rendered string per fragment.
    pub fn parts(&self) -> Vec<String> {
        self.fragments.iter().map(Fragment::render).collect()
    }

    /// The full command line, ready to hand to `sh -c`.
    pub fn to_shell_string(&self) -> String {
        self.parts().join(" ")
    }
}

/// Shell-escape a string using single quotes. Internal single quotes become `'\''`.
pub fn shell_escape(s: &str) -> String {
    if !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '/' || c == '='
        })
    {
        // Safe to use unquoted
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', "'\\''"))
}
