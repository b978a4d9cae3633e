//! # Operator Interaction / 操作员交互
//!
//! Every question the batch asks goes through [`Operator`], so the runner can be
//! driven from a terminal, from piped input, from a script in tests, or not at
//! all.
//!
//! 批量运行提出的每个问题都经过 [`Operator`]，因此运行器可以由终端、管道输入、
//! 测试中的脚本驱动，或者完全无人值守。

use dialoguer::{theme::ColorfulTheme, Input};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::infra::fs::is_directory;

/// Something that can answer the runner's questions.
/// 能够回答运行器问题的对象。
pub trait Operator {
    /// Shows `prompt` and returns the answer, without the line terminator.
    fn ask(&mut self, prompt: &str) -> io::Result<String>;

    /// Shows `prompt` and waits until the operator is done.
    fn pause(&mut self, prompt: &str) -> io::Result<()> {
        self.ask(prompt).map(|_| ())
    }
}

/// Interactive terminal prompts.
pub struct ConsoleOperator {
    theme: ColorfulTheme,
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Operator for ConsoleOperator {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(io::Error::other)
    }
}

/// Line-oriented prompts over any reader and writer, for piped stdin.
///
/// End of input is an `UnexpectedEof` error, never an empty answer, so a closed
/// pipe cannot turn into an endless retry loop.
///
/// 基于任意读写器的按行提示，用于管道输入的 stdin。
/// 输入结束会返回 `UnexpectedEof` 错误，而不是空回答，因此关闭的管道不会变成无限重试循环。
pub struct LineOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Operator for LineOperator<R, W> {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            ));
        }
        let answer = line.trim_end_matches(['\r', '\n']).to_string();
        writeln!(self.output)?;
        Ok(answer)
    }
}

/// Answers every question with the same text and never pauses.
/// Used for unattended runs: failures are recorded with `grade`.
///
/// 对每个问题都用同一文本回答，从不暂停。用于无人值守运行：失败以 `grade` 记录。
pub struct Unattended {
    grade: String,
}

impl Unattended {
    pub fn new(grade: impl Into<String>) -> Self {
        Self {
            grade: grade.into(),
        }
    }
}

impl Operator for Unattended {
    fn ask(&mut self, _prompt: &str) -> io::Result<String> {
        Ok(self.grade.clone())
    }

    fn pause(&mut self, _prompt: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Pre-recorded answers, consumed in order. Records every prompt it saw.
/// 预先录制的回答，按顺序消费。记录它看到的每一个提示。
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub pauses: Vec<String>,
}

impl ScriptedOperator {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            pauses: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Operator for ScriptedOperator {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left")
        })
    }

    fn pause(&mut self, prompt: &str) -> io::Result<()> {
        self.pauses.push(prompt.to_string());
        Ok(())
    }
}

/// Asks until the answer names an existing directory.
/// `on_invalid` is shown after every rejected answer.
///
/// 反复询问，直到回答为一个已存在的目录。每次回答被拒绝后显示 `on_invalid`。
pub fn ask_directory<O: Operator + ?Sized>(
    operator: &mut O,
    prompt: &str,
    on_invalid: &str,
) -> io::Result<PathBuf> {
    loop {
        let answer = operator.ask(prompt)?;
        let expanded = shellexpand::tilde(answer.trim()).to_string();
        let path = PathBuf::from(expanded);
        if !answer.trim().is_empty() && is_directory(&path) {
            return Ok(path);
        }
        println!("{on_invalid}");
    }
}

/// Asks until the trimmed answer is not empty.
pub fn ask_non_empty<O: Operator + ?Sized>(
    operator: &mut O,
    prompt: &str,
    on_empty: &str,
) -> io::Result<String> {
    loop {
        let answer = operator.ask(prompt)?;
        let answer = answer.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
        println!("{on_empty}");
    }
}
