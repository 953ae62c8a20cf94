use crate::error::AppError;
use crate::launch::ProgramLocator;

/// A terminal emulator and the flag that makes it run a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSpec {
    pub program: String,
    pub exec_flag: String,
}

fn default_exec_flag(program: &str) -> &'static str {
    match program {
        "gnome-terminal" | "kgx" => "--",
        "xfce4-terminal" => "-x",
        _ => "-e",
    }
}

impl TerminalSpec {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            exec_flag: default_exec_flag(program).to_string(),
        }
    }

    /// Parses `konsole,xterm,foot:-e` style lists; an entry may override its flag after `:`.
    pub fn parse_list(raw: &str) -> Vec<TerminalSpec> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((program, flag)) => TerminalSpec {
                    program: program.trim().to_string(),
                    exec_flag: flag.trim().to_string(),
                },
                None => TerminalSpec::new(entry),
            })
            .collect()
    }

    /// `<program> <flag> ` prefix placed in front of the client command.
    pub fn prefix(&self) -> String {
        if self.exec_flag.is_empty() {
            format!("{} ", self.program)
        } else {
            format!("{} {} ", self.program, self.exec_flag)
        }
    }
}

/// First available terminal in preference order.
pub fn locate_terminal(
    preferences: &[TerminalSpec],
    locator: &dyn ProgramLocator,
) -> Result<TerminalSpec, AppError> {
    preferences
        .iter()
        .find(|t| locator.locate(&t.program).is_some())
        .cloned()
        .ok_or_else(|| {
            let tried: Vec<&str> = preferences.iter().map(|t| t.program.as_str()).collect();
            AppError::NoTerminalAvailable(tried.join(", "))
        })
}
