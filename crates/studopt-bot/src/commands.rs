//! Command table and prefix matching.

/// All commands the bot understands, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Menu,
    Info,
    Class,
    Today,
    Register,
    Unregister,
    Assignments,
    AddAssignmentClass,
    RemoveAssignment,
    StatusAssignment,
    Notify,
    Docs,
}

/// Ordered prefix table; the first matching prefix wins.
const COMMANDS: &[(Command, &str)] = &[
    (Command::Help, "/help"),
    (Command::Menu, "/menu"),
    (Command::Info, "/info"),
    (Command::Class, "/class"),
    (Command::Today, "/today"),
    (Command::Register, "/register"),
    (Command::Unregister, "/unregister"),
    (Command::Assignments, "/assignments"),
    (Command::AddAssignmentClass, "/add_assignment_class"),
    (Command::RemoveAssignment, "/remove_assignment"),
    (Command::StatusAssignment, "/status_assignment"),
    (Command::Notify, "/notify"),
    (Command::Docs, "/docs"),
];

/// Match a text turn against the command table. Returns the command and the
/// trimmed remainder after the prefix, or `None` for free-form text.
pub fn parse(text: &str) -> Option<(Command, &str)> {
    let text = text.trim();
    for (cmd, prefix) in COMMANDS {
        if text.starts_with(prefix) {
            return Some((*cmd, text[prefix.len()..].trim()));
        }
    }
    None
}
