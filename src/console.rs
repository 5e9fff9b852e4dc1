//! Line input for the debugger: a prompt, a bounded history and verb completion.
use super::*;
use crate::commands::{self, Completion};
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::{DefaultHistory, History, SearchDirection};
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};

/// Where the console loop gets its lines from.
pub trait LineSource {
    /// The next line without its terminator, or None at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, Error>;
    /// The most recently recorded history entry.
    fn last_entry(&self) -> Option<String>;
    fn add_entry(&mut self, line: &str);
}

/// Completes command verbs on <tab>.
pub struct CommandHelper;

impl Completer for CommandHelper {
    type Candidate = String;
    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<String>)> {
        match commands::complete(&line[..pos]) {
            Completion::Complete(rest) => Ok((pos, vec![rest])),
            Completion::NoMatch => Ok((pos, Vec::new())),
        }
    }
}
impl Hinter for CommandHelper {
    type Hint = String;
}
impl Highlighter for CommandHelper {}
impl Validator for CommandHelper {}
impl Helper for CommandHelper {}

/// Interactive terminal input backed by rustyline.
pub struct Console {
    editor: Editor<CommandHelper, DefaultHistory>,
}
impl Console {
    pub fn new(history_size: usize) -> Result<Console, Error> {
        let config = Config::builder()
            .max_history_size(history_size)?
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(CommandHelper));
        verbose_println!("console ready, history holds {} commands", history_size);
        Ok(Console { editor })
    }
}
impl LineSource for Console {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, Error> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => return Ok(Some(line)),
                // <ctrl-c> at the prompt just asks again
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }
    fn last_entry(&self) -> Option<String> {
        let history = self.editor.history();
        let last = history.len().checked_sub(1)?;
        match history.get(last, SearchDirection::Forward) {
            Ok(found) => found.map(|r| r.entry.into_owned()),
            Err(_) => None,
        }
    }
    fn add_entry(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            warn!("failed to record history: {}", e);
        }
    }
}

/// Plays back a fixed list of lines; used to drive the console loop in tests.
#[cfg(test)]
pub struct ScriptedSource {
    lines: std::collections::VecDeque<String>,
    pub history: Vec<String>,
}
#[cfg(test)]
impl ScriptedSource {
    pub fn new(lines: &[&str]) -> Self {
        ScriptedSource {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            history: Vec::new(),
        }
    }
}
#[cfg(test)]
impl LineSource for ScriptedSource {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>, Error> { Ok(self.lines.pop_front()) }
    fn last_entry(&self) -> Option<String> { self.history.last().cloned() }
    fn add_entry(&mut self, line: &str) { self.history.push(line.to_string()) }
}
