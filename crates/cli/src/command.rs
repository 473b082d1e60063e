//! Shell command parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Free text; goes through the search debouncer.
    Search(String),
    Clear,
    Page(u32),
    Next,
    Prev,
    Retry,
    Back,
    Forward,
    Detail { id: u64, full: bool },
    List,
    Url,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} (type `help` for commands)")]
pub struct ParseError(String);

pub const HELP: &str = "\
commands:
  search <text>      filter the list (empty text clears)
  clear              drop the search and go to page 1
  page <n>           jump to page n
  next | prev        move one page
  retry              refetch after an error
  detail <id> [full] open one anime, optionally with the full synopsis
  back | forward     walk the history
  list               redraw the current screen
  url                print the current location
  quit";

impl Command {
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "search" | "s" => Command::Search(rest.to_string()),
            "clear" => Command::Clear,
            "page" | "p" => Command::Page(parse_number(name, rest)?),
            "next" | "n" => Command::Next,
            "prev" => Command::Prev,
            "retry" | "r" => Command::Retry,
            "back" | "b" => Command::Back,
            "forward" | "f" => Command::Forward,
            "detail" | "d" => {
                let (id, flag) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let full = match flag.trim() {
                    "" => false,
                    "full" => true,
                    other => return Err(ParseError(format!("unknown detail option {other:?}"))),
                };
                Command::Detail { id: parse_number(name, id)?, full }
            }
            "list" | "l" => Command::List,
            "url" => Command::Url,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(ParseError(format!("unknown command {other:?}"))),
        };
        Ok(Some(command))
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ParseError> {
    raw.parse().map_err(|_| ParseError(format!("`{name}` expects a number, got {raw:?}")))
}
