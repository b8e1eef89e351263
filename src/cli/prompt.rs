//! Interactive questions on stdin

use crate::{ParleyError, Result};
use std::io::{BufRead, Write};

pub fn validate_topic(input: &str) -> std::result::Result<String, &'static str> {
    let topic = input.trim();
    if topic.is_empty() {
        return Err("Please enter a topic");
    }
    Ok(topic.to_string())
}

/// Parse a turn count; an empty answer takes `default`
pub fn parse_turns(input: &str, default: usize) -> std::result::Result<usize, &'static str> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(default);
    }
    match input.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err("Please enter a positive number"),
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "◆  {}\n│  ", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(ParleyError::Cancelled);
    }
    Ok(line)
}

/// Ask until a non-empty topic is given; EOF cancels
pub fn prompt_topic<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    loop {
        let answer = ask(input, output, "Enter a topic for the agents to discuss:")?;
        match validate_topic(&answer) {
            Ok(topic) => return Ok(topic),
            Err(msg) => writeln!(output, "▲  {}", msg)?,
        }
    }
}

/// Ask until a positive turn count is given; EOF cancels
pub fn prompt_turns<R: BufRead, W: Write>(input: &mut R, output: &mut W, default: usize) -> Result<usize> {
    let question = format!("How many turns should each agent have? ({})", default);
    loop {
        let answer = ask(input, output, &question)?;
        match parse_turns(&answer, default) {
            Ok(turns) => return Ok(turns),
            Err(msg) => writeln!(output, "▲  {}", msg)?,
        }
    }
}
