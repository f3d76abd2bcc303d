//! Interactive terminal prompts used by the setup wizard and destructive
//! commands.

use anyhow::Result;
use rustyline::DefaultEditor;

pub struct Prompter {
    editor: DefaultEditor,
}

impl Prompter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }

    /// Ask for a line of input. An empty answer falls back to the default
    /// when one is given.
    pub fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        let display = match default {
            Some(default) if !default.is_empty() => format!("{prompt} [{default}]: "),
            _ => format!("{prompt}: "),
        };
        let answer = self.editor.readline(&display)?;
        let answer = answer.trim();
        if answer.is_empty() {
            if let Some(default) = default {
                return Ok(default.to_string());
            }
        }
        Ok(answer.to_string())
    }

    /// Yes/no question.
    pub fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = self.editor.readline(&format!("{prompt} [{hint}]: "))?;
            match answer.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("Please answer 'y' or 'n'."),
            }
        }
    }

    /// Ask for an index into a list of `len` options.
    pub fn choose_index(&mut self, prompt: &str, len: usize) -> Result<usize> {
        loop {
            let answer = self.editor.readline(&format!("{prompt}: "))?;
            match answer.trim().parse::<usize>() {
                Ok(index) if index < len => return Ok(index),
                _ => println!("Please enter a number between 0 and {}.", len - 1),
            }
        }
    }
}
