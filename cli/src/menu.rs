//! Numbered menu and line prompts

use std::io::{self, BufRead, Write};
use vidgraph::VidgraphError;

/// One menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Load,
    TextSearch,
    DurationFilter,
    UsersWithPosts,
    VideoPosters,
    VideosSorted,
    VideoCount,
    VideoPages,
    DeleteComments,
    DropAll,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 11] = [
        MenuChoice::Load,
        MenuChoice::TextSearch,
        MenuChoice::DurationFilter,
        MenuChoice::UsersWithPosts,
        MenuChoice::VideoPosters,
        MenuChoice::VideosSorted,
        MenuChoice::VideoCount,
        MenuChoice::VideoPages,
        MenuChoice::DeleteComments,
        MenuChoice::DropAll,
        MenuChoice::Exit,
    ];

    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).map(|i| i + 1).unwrap_or(0)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::Load => "Create/Load Data (from CSV files)",
            MenuChoice::TextSearch => "Query 1: Text search",
            MenuChoice::DurationFilter => "Query 2: Numeric duration",
            MenuChoice::UsersWithPosts => "Query 3: Users with posts",
            MenuChoice::VideoPosters => "Query 4: Video posters reverse",
            MenuChoice::VideosSorted => "Query 5: Videos sorted",
            MenuChoice::VideoCount => "Query 6: Video count",
            MenuChoice::VideoPages => "Query 7: Video pages",
            MenuChoice::DeleteComments => "Delete comments by term",
            MenuChoice::DropAll => "Drop all",
            MenuChoice::Exit => "Exit",
        }
    }
}

/// Why a menu line was not a choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    NotANumber,
    OutOfRange(i64),
}

pub fn parse_choice(line: &str) -> Result<MenuChoice, ChoiceError> {
    let n: i64 = line.trim().parse().map_err(|_| ChoiceError::NotANumber)?;
    usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| MenuChoice::ALL.get(i).copied())
        .ok_or(ChoiceError::OutOfRange(n))
}

pub fn print_menu() {
    println!("\n{}", "=".repeat(60));
    for choice in MenuChoice::ALL {
        println!("  {} -- {}", choice.number(), choice.label());
    }
    println!("{}", "=".repeat(60));
}

/// Line-oriented prompts over any buffered reader
pub struct Prompter<R> {
    input: R,
}

impl<R: BufRead> Prompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Print `message` and read one line; `None` at end of input
    pub fn ask(&mut self, message: &str) -> io::Result<Option<String>> {
        print!("{}", message);
        io::stdout().flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask until the answer is an integer
    pub fn ask_integer(&mut self, message: &str) -> io::Result<Option<i64>> {
        loop {
            let Some(line) = self.ask(message)? else {
                return Ok(None);
            };
            match line.trim().parse() {
                Ok(n) => return Ok(Some(n)),
                Err(_) => println!(
                    "{}",
                    VidgraphError::MalformedInput(format!("'{}' is not a whole number", line.trim()))
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1"), Ok(MenuChoice::Load));
        assert_eq!(parse_choice(" 11 \n"), Ok(MenuChoice::Exit));
        assert_eq!(parse_choice("8"), Ok(MenuChoice::VideoPages));
        assert_eq!(parse_choice("0"), Err(ChoiceError::OutOfRange(0)));
        assert_eq!(parse_choice("12"), Err(ChoiceError::OutOfRange(12)));
        assert_eq!(parse_choice("-3"), Err(ChoiceError::OutOfRange(-3)));
        assert_eq!(parse_choice("two"), Err(ChoiceError::NotANumber));
    }

    #[test]
    fn test_numbers_follow_menu_order() {
        assert_eq!(MenuChoice::Load.number(), 1);
        assert_eq!(MenuChoice::DeleteComments.number(), 9);
        assert_eq!(MenuChoice::Exit.number(), 11);
    }

    #[test]
    fn test_ask_integer_reprompts() {
        let mut prompter = Prompter::new(Cursor::new("ten\n\n10\n"));
        assert_eq!(prompter.ask_integer("min: ").unwrap(), Some(10));
        assert_eq!(prompter.ask_integer("min: ").unwrap(), None);
    }
}
