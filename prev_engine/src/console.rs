//! Console command registry
//!
//! Commands arrive as text lines from an external console. A line is split on
//! whitespace and the handler of its first token receives every token,
//! command name included. Handlers validate their own argument count and
//! silently ignore malformed input.

use rustc_hash::FxHashMap;

use crate::{engine_debug, engine_warn};

const SOURCE: &str = "prev::Console";

/// Command handler; `args[0]` is the command name
pub type CommandHandler = Box<dyn FnMut(&[&str])>;

struct Command {
    description: String,
    handler: CommandHandler,
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: FxHashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, replacing any previous command with that name
    pub fn register<F>(&mut self, name: &str, description: &str, handler: F)
    where
        F: FnMut(&[&str]) + 'static,
    {
        let previous = self.commands.insert(
            name.to_string(),
            Command {
                description: description.to_string(),
                handler: Box::new(handler),
            },
        );
        if previous.is_some() {
            engine_warn!(SOURCE, "Command '{}' replaced", name);
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    /// Run one command line
    ///
    /// # Returns
    ///
    /// True if the first token named a registered command.
    pub fn execute(&mut self, line: &str) -> bool {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(name) = tokens.first() else {
            return false;
        };
        match self.commands.get_mut(*name) {
            Some(command) => {
                engine_debug!(SOURCE, "> {}", line.trim());
                (command.handler)(&tokens);
                true
            }
            None => {
                engine_warn!(SOURCE, "Unknown command '{}'", name);
                false
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// (name, description) pairs sorted by name
    pub fn commands(&self) -> Vec<(&str, &str)> {
        let mut list: Vec<(&str, &str)> = self
            .commands
            .iter()
            .map(|(name, command)| (name.as_str(), command.description.as_str()))
            .collect();
        list.sort_unstable();
        list
    }
}

/// Parse `window_size <w> <h>` tokens
///
/// Returns `None` unless there are exactly three tokens and both sizes are
/// positive integers.
pub fn parse_window_size(args: &[&str]) -> Option<(u32, u32)> {
    if args.len() != 3 {
        return None;
    }
    let width: u32 = args[1].parse().ok()?;
    let height: u32 = args[2].parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

/// Install the `window_size <w> <h>` and `exit` commands
pub fn register_window_commands<R, E>(registry: &mut CommandRegistry, mut on_resize: R, mut on_exit: E)
where
    R: FnMut(u32, u32) + 'static,
    E: FnMut() + 'static,
{
    registry.register(
        "window_size",
        "window_size <width> <height> - resize the window client area",
        move |args| {
            if let Some((width, height)) = parse_window_size(args) {
                on_resize(width, height);
            }
        },
    );
    registry.register("exit", "exit - quit the application", move |_| on_exit());
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
