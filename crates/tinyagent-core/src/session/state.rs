//! Session states and input directives

use serde::Serialize;

/// Where the session loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingUserInput,
    AwaitingModelResponse,
    DispatchingTools,
    /// Absorbing: nothing leaves this state
    Terminated,
}

impl SessionState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionState::Terminated)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::AwaitingUserInput => write!(f, "awaiting user input"),
            SessionState::AwaitingModelResponse => write!(f, "awaiting model response"),
            SessionState::DispatchingTools => write!(f, "dispatching tools"),
            SessionState::Terminated => write!(f, "terminated"),
        }
    }
}

/// What one line of user input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `exit`, `quit`, `/exit`, `/quit`
    Exit,
    /// `reset`, `/reset`
    Reset,
    /// `history`, `/history`
    History,
    /// `usage`, `/usage`
    Usage,
    /// `/attach <path>`
    Attach(String),
    /// Blank line
    Empty,
    /// Anything else: a new user turn
    Message(String),
}

impl Directive {
    /// Classify a line; keywords are case-insensitive and ignore surrounding whitespace
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Directive::Empty;
        }

        match trimmed.to_lowercase().as_str() {
            "exit" | "quit" | "/exit" | "/quit" => return Directive::Exit,
            "reset" | "/reset" => return Directive::Reset,
            "history" | "/history" => return Directive::History,
            "usage" | "/usage" => return Directive::Usage,
            _ => {}
        }

        if let Some(rest) = trimmed.strip_prefix("/attach") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Directive::Attach(rest.trim().to_string());
            }
        }

        Directive::Message(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directives() {
        assert_eq!(Directive::parse("exit"), Directive::Exit);
        assert_eq!(Directive::parse("  QUIT "), Directive::Exit);
        assert_eq!(Directive::parse("/exit"), Directive::Exit);
        assert_eq!(Directive::parse("reset"), Directive::Reset);
        assert_eq!(Directive::parse("/reset"), Directive::Reset);
        assert_eq!(Directive::parse("History"), Directive::History);
        assert_eq!(Directive::parse("/usage"), Directive::Usage);
        assert_eq!(Directive::parse("   "), Directive::Empty);
        assert_eq!(
            Directive::parse("/attach notes/todo.md"),
            Directive::Attach("notes/todo.md".to_string())
        );
        assert_eq!(Directive::parse("/attach"), Directive::Attach(String::new()));
    }

    #[test]
    fn test_everything_else_is_a_message() {
        assert_eq!(
            Directive::parse("exit the vim editor please"),
            Directive::Message("exit the vim editor please".to_string())
        );
        assert_eq!(
            Directive::parse("/attachments are great"),
            Directive::Message("/attachments are great".to_string())
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::DispatchingTools.to_string(), "dispatching tools");
        assert!(SessionState::Terminated.is_terminated());
        assert!(!SessionState::AwaitingUserInput.is_terminated());
    }
}
