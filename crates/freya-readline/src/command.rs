//! REPL meta commands.
//!
//! Lines starting with `:` control the session and the account; anything else is
//! chat input handed to the plugin pipeline.

/// Meta commands offered for completion.
pub const META_COMMANDS: &[&str] = &[
    ":help", ":login", ":signup", ":logout", ":new", ":sessions", ":switch", ":whoami",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Help,
    Login { email: String, password: String },
    SignUp { email: String, password: String },
    Logout,
    NewChat,
    Sessions,
    /// 1-based position in the session list.
    Switch(usize),
    WhoAmI,
    Chat(String),
    Usage(&'static str),
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line == "quit" || line == "exit" {
            return Self::Quit;
        }
        let Some(meta) = line.strip_prefix(':') else {
            return Self::Chat(line.to_string());
        };

        let mut parts = meta.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();
        match (name, rest.as_slice()) {
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            ("login", [email, password]) => Self::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("login", _) => Self::Usage(":login <email> <password>"),
            ("signup", [email, password]) => Self::SignUp {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("signup", _) => Self::Usage(":signup <email> <password>"),
            ("logout", []) => Self::Logout,
            ("new", []) => Self::NewChat,
            ("sessions", []) => Self::Sessions,
            ("switch", [position]) => match position.parse::<usize>() {
                Ok(position) if position > 0 => Self::Switch(position),
                _ => Self::Usage(":switch <number from :sessions>"),
            },
            ("switch", _) => Self::Usage(":switch <number from :sessions>"),
            ("whoami", []) => Self::WhoAmI,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            ReplCommand::parse("  /weather London "),
            ReplCommand::Chat("/weather London".to_string())
        );
        assert_eq!(ReplCommand::parse("hello"), ReplCommand::Chat("hello".to_string()));
    }

    #[test]
    fn test_quit_aliases() {
        assert_eq!(ReplCommand::parse("quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("exit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse(":quit"), ReplCommand::Quit);
    }

    #[test]
    fn test_account_commands() {
        assert_eq!(
            ReplCommand::parse(":login ada@example.com secret1"),
            ReplCommand::Login {
                email: "ada@example.com".to_string(),
                password: "secret1".to_string(),
            }
        );
        assert!(matches!(ReplCommand::parse(":login ada@example.com"), ReplCommand::Usage(_)));
        assert!(matches!(ReplCommand::parse(":signup a b"), ReplCommand::SignUp { .. }));
        assert_eq!(ReplCommand::parse(":logout"), ReplCommand::Logout);
    }

    #[test]
    fn test_switch_position() {
        assert_eq!(ReplCommand::parse(":switch 2"), ReplCommand::Switch(2));
        assert!(matches!(ReplCommand::parse(":switch 0"), ReplCommand::Usage(_)));
        assert!(matches!(ReplCommand::parse(":switch two"), ReplCommand::Usage(_)));
    }

    #[test]
    fn test_unknown_meta_command() {
        assert_eq!(
            ReplCommand::parse(":frobnicate"),
            ReplCommand::Unknown(":frobnicate".to_string())
        );
        assert_eq!(ReplCommand::parse(":new extra"), ReplCommand::Unknown(":new extra".to_string()));
    }
}
