use crate::launch::terminal::TerminalSpec;
use std::fmt;
use std::path::Path;

/// How a batch of profiles should be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    Direct,
    /// Wrapped in the first available terminal emulator.
    Console,
    /// Direct launch with a game page link, turned into a deep link before spawning.
    GameLink(String),
    /// Direct launch with a raw trailing argument (a shortcut parameter).
    RawArgument(String),
}

/// A complete `sh -c` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand(String);

impl ShellCommand {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wraps `value` in double quotes, escaping the characters the shell would
/// still interpret inside them.
pub fn double_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Composes `[terminal prefix] [env HOME="<home>"] <client command> ["<argument>"]`.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    client_command: String,
    terminal: Option<TerminalSpec>,
    argument: Option<String>,
}

impl CommandBuilder {
    pub fn new(client_command: impl Into<String>) -> Self {
        Self {
            client_command: client_command.into(),
            terminal: None,
            argument: None,
        }
    }

    pub fn in_terminal(mut self, terminal: TerminalSpec) -> Self {
        self.terminal = Some(terminal);
        self
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    /// `home` is the profile directory, or `None` to inherit the caller's environment.
    pub fn build(&self, home: Option<&Path>) -> ShellCommand {
        let mut line = String::new();
        if let Some(terminal) = &self.terminal {
            line.push_str(&terminal.prefix());
        }
        if let Some(home) = home {
            line.push_str("env HOME=");
            line.push_str(&double_quote(&home.to_string_lossy()));
            line.push(' ');
        }
        line.push_str(&self.client_command);
        if let Some(argument) = &self.argument {
            line.push(' ');
            line.push_str(&double_quote(argument));
        }
        ShellCommand(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const CLIENT: &str = "flatpak run org.vinegarhq.Sober";

    #[test]
    fn test_main_profile_direct() {
        assert_eq!(
            CommandBuilder::new(CLIENT).build(None).as_str(),
            "flatpak run org.vinegarhq.Sober"
        );
    }

    #[test]
    fn test_isolated_profile_direct() {
        let home = PathBuf::from("/games/alts/P1");
        assert_eq!(
            CommandBuilder::new(CLIENT).build(Some(&home)).as_str(),
            r#"env HOME="/games/alts/P1" flatpak run org.vinegarhq.Sober"#
        );
    }

    #[test]
    fn test_console_wraps_everything() {
        let home = PathBuf::from("/games/alts/P1");
        let builder = CommandBuilder::new(CLIENT).in_terminal(TerminalSpec::new("konsole"));
        assert_eq!(
            builder.build(Some(&home)).as_str(),
            r#"konsole -e env HOME="/games/alts/P1" flatpak run org.vinegarhq.Sober"#
        );
        assert_eq!(builder.build(None).as_str(), "konsole -e flatpak run org.vinegarhq.Sober");
    }

    #[test]
    fn test_trailing_argument_is_quoted() {
        let builder = CommandBuilder::new(CLIENT).with_argument("roblox://experience?placeId=42");
        assert_eq!(
            builder.build(None).as_str(),
            r#"flatpak run org.vinegarhq.Sober "roblox://experience?placeId=42""#
        );
    }

    #[test]
    fn test_shell_metacharacters_are_escaped() {
        assert_eq!(double_quote(r#"a"b$c`d\e"#), r#""a\"b\$c\`d\\e""#);
        assert_eq!(double_quote("it's fine"), r#""it's fine""#);
    }
}
