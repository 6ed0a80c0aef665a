//! Console input classification

/// Marker that turns an input line into a prompt command
pub const COMMAND_MARKER: char = '/';

/// One line of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    /// `exit`, any casing, with nothing around it
    Exit,
    /// Blank line
    Empty,
    /// `/<name> [remainder]` with the marker in the first column; `name` is
    /// empty for a bare marker
    Command { name: &'a str, remainder: String },
    /// Literal user message, unmodified
    Message(&'a str),
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        if line.trim().is_empty() {
            return Input::Empty;
        }
        if line.eq_ignore_ascii_case("exit") {
            return Input::Exit;
        }
        if let Some(rest) = line.strip_prefix(COMMAND_MARKER) {
            let mut tokens = rest.split_whitespace();
            let name = tokens.next().unwrap_or("");
            let remainder = tokens.collect::<Vec<_>>().join(" ");
            return Input::Command { name, remainder };
        }
        Input::Message(line)
    }
}

/// Template text followed by the user's free text, trimmed
pub fn merge_template(template: &str, remainder: &str) -> String {
    format!("{template}\n\n{remainder}").trim().to_string()
}
