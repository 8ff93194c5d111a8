/// How a recognized command is turned into a runtime call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Statement position; executed for effect: `run([...])`.
    Run,
    /// Expression position or pipe source; output kept: `grab([...])`.
    Grab,
    /// Last stage of a top-level pipeline: `Pipe([...])`.
    Pipe,
    /// Any other pipeline stage: `GrabPipe([...])`.
    GrabPipe,
    /// In-process runtime builtin: `builtin.NAME(...)`.
    Builtin,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Run => "run",
            Mode::Grab => "grab",
            Mode::Pipe => "Pipe",
            Mode::GrabPipe => "GrabPipe",
            Mode::Builtin => "builtin",
        }
    }

    /// Opening of the generated call, up to the first argument.
    pub fn opening(self, command: &str) -> String {
        match self {
            Mode::Builtin => format!("builtin.{command}("),
            other => format!("{}([", other.as_str()),
        }
    }

    /// Text that ends the argument list; `keyword` when a `, key=value`
    /// continuation follows.
    pub fn list_close(self, keyword: bool) -> &'static str {
        match (self, keyword) {
            (Mode::Builtin, false) => ")",
            (Mode::Builtin, true) => "",
            (_, false) => "])",
            (_, true) => "]",
        }
    }

    /// Whether the command word itself is the first list element.
    pub fn includes_command(self) -> bool {
        self != Mode::Builtin
    }
}

/// Direct execution or capture for a command at the start of a line.
///
/// Scans the raw line text for a `|` not closed off by an unmatched `)`.
/// The scan is textual: a `|` inside a quoted string or a trailing comment
/// also selects capture.
pub fn statement_mode(rest_of_line: &str) -> Mode {
    let mut parens = 0i32;
    for c in rest_of_line.chars() {
        match c {
            '(' => parens += 1,
            ')' => parens -= 1,
            '|' if parens >= 0 => return Mode::Grab,
            _ => {}
        }
    }
    Mode::Run
}

/// Mode for a command right after `|`. `top_level` is false inside
/// parentheses, where every stage is an expression.
pub fn pipe_mode(rest_of_line: &str, top_level: bool) -> Mode {
    if top_level && statement_mode(rest_of_line) == Mode::Run {
        Mode::Pipe
    } else {
        Mode::GrabPipe
    }
}
