use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Stylize;
use crossterm::terminal;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::task;

use super::UiError;

/// How screens talk to the user.
///
/// Reading returns `None` when the user cancels, e.g. with Ctrl+C or Ctrl+D.
pub trait Prompt {
    fn line(&mut self, label: &str) -> Result<Option<String>, UiError>;

    /// Like [`Self::line`], but without echoing what is typed.
    fn secret(&mut self, label: &str) -> Result<Option<String>, UiError>;

    fn heading(&mut self, title: &str);

    fn show(&mut self, text: &str);

    fn alert(&mut self, title: &str, message: &str);
}

pub struct Terminal {
    editor: DefaultEditor,
}

impl Terminal {
    pub fn new() -> Result<Self, UiError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

fn read_secret() -> Result<Option<String>, UiError> {
    let mut secret = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Enter => return Ok(Some(secret)),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c' | 'd') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None)
            }
            KeyCode::Char(c) => secret.push(c),
            KeyCode::Backspace => {
                secret.pop();
            }
            _ => {}
        }
    }
}

impl Prompt for Terminal {
    fn line(&mut self, label: &str) -> Result<Option<String>, UiError> {
        let prompt = format!("{label}: ");
        // Reading blocks, so get out of the runtime's way.
        match task::block_in_place(|| self.editor.readline(&prompt)) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn secret(&mut self, label: &str) -> Result<Option<String>, UiError> {
        print!("{label}: ");
        io::stdout().flush()?;

        terminal::enable_raw_mode()?;
        let secret = task::block_in_place(read_secret);
        terminal::disable_raw_mode()?;
        println!();

        secret
    }

    fn heading(&mut self, title: &str) {
        println!();
        println!("{}", title.bold().underlined());
    }

    fn show(&mut self, text: &str) {
        println!("{text}");
    }

    fn alert(&mut self, title: &str, message: &str) {
        println!("{} {message}", format!("{title}:").bold().red());
    }
}

/// Plays back prepared answers and records everything shown.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Script {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
    pub shown: Vec<String>,
    pub alerts: Vec<String>,
}

#[cfg(test)]
impl Script {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.shown.iter().any(|text| text.contains(needle))
    }
}

#[cfg(test)]
impl Prompt for Script {
    fn line(&mut self, label: &str) -> Result<Option<String>, UiError> {
        self.asked.push(label.to_string());
        Ok(self.answers.pop_front())
    }

    fn secret(&mut self, label: &str) -> Result<Option<String>, UiError> {
        self.line(label)
    }

    fn heading(&mut self, title: &str) {
        self.shown.push(title.to_string());
    }

    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }

    fn alert(&mut self, title: &str, message: &str) {
        self.alerts.push(format!("{title}: {message}"));
    }
}
