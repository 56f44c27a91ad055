use crate::actuation::Actuator;
use crate::direction::Direction;
use crate::error::{CtrlBotError, Result};
use crate::platform::{Button, Trigger};
use crate::vxbox::Dpad;

/// Chat commands. Arguments are kept as typed so lenient parsing
/// (durations, counts) happens at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Aim { direction: String },
    Fire { sides: String, duration: Option<String> },
    Button { buttons: String, duration: Option<String> },
    Dpad { direction: String, count: Option<String> },
    Help { topic: Option<String> },
}

pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    min_args: usize,
    max_args: usize,
}

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "aim",
        description: "Set aiming direction in clock (1-12) or compass (N, E, S, W, NE, SE, SW, NW).",
        usage: "aim <dir>",
        min_args: 1,
        max_args: 1,
    },
    CommandInfo {
        name: "button",
        description: "Trigger button A, B, X, Y or combinations.",
        usage: "button <buttons> [<duration>]",
        min_args: 1,
        max_args: 2,
    },
    CommandInfo {
        name: "dpad",
        description: "Trigger DPAD up, down, left, right.",
        usage: "dpad <dir> [<count>]",
        min_args: 1,
        max_args: 2,
    },
    CommandInfo {
        name: "fire",
        description: "Fire guns, L for left, R for right, LR for left and right.",
        usage: "fire (L|R|LR) [<duration>]",
        min_args: 1,
        max_args: 2,
    },
    CommandInfo {
        name: "help",
        description: "Show available commands, or help for one command.",
        usage: "help [<command>]",
        min_args: 0,
        max_args: 1,
    },
];

pub fn command_info(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS.iter().find(|c| c.name == name)
}

impl Command {
    /// Parse a chat line.
    ///
    /// `None` when the line is not addressed to the bot (no prefix, or an
    /// unknown command name). Malformed arguments yield a `Usage` error.
    pub fn parse(line: &str, prefix: &str) -> Option<Result<Self>> {
        let body = line.trim().strip_prefix(prefix)?;
        let mut words = body.split_whitespace();
        let name = words.next()?.to_ascii_lowercase();
        let info = command_info(&name)?;
        let args: Vec<String> = words.map(str::to_string).collect();

        if args.len() < info.min_args || args.len() > info.max_args {
            return Some(Err(CtrlBotError::Usage(format!("{}{}", prefix, info.usage))));
        }

        let mut args = args.into_iter();
        let command = match info.name {
            "aim" => Command::Aim {
                direction: args.next()?,
            },
            "fire" => {
                let sides = args.next()?.to_ascii_uppercase();
                if !matches!(sides.as_str(), "L" | "R" | "LR") {
                    return Some(Err(CtrlBotError::Usage(format!(
                        "{}{}",
                        prefix, info.usage
                    ))));
                }
                Command::Fire {
                    sides,
                    duration: args.next(),
                }
            }
            "button" => Command::Button {
                buttons: args.next()?,
                duration: args.next(),
            },
            "dpad" => Command::Dpad {
                direction: args.next()?,
                count: args.next(),
            },
            _ => Command::Help { topic: args.next() },
        };
        Some(Ok(command))
    }
}

/// Lines answering `!help [<command>]`.
pub fn help(topic: Option<&str>, prefix: &str) -> Vec<String> {
    match topic {
        None => {
            let names: Vec<String> = COMMANDS
                .iter()
                .map(|c| format!("{}{}", prefix, c.name))
                .collect();
            vec![format!("Available commands: {}", names.join(", "))]
        }
        Some(topic) => {
            let name = topic.trim_start_matches(prefix).to_ascii_lowercase();
            match command_info(&name) {
                Some(info) => vec![
                    info.description.to_string(),
                    format!("usage: {}{}", prefix, info.usage),
                ],
                None => vec![format!("No such command: {}", topic)],
            }
        }
    }
}

/// Carry out `command`, returning any lines to send back to the channel.
///
/// Pulses are started and left running; D-pad taps are awaited.
pub async fn execute(
    command: &Command,
    actuator: Option<&Actuator>,
    prefix: &str,
) -> Result<Vec<String>> {
    let actuator = match (command, actuator) {
        (Command::Help { topic }, _) => return Ok(help(topic.as_deref(), prefix)),
        (_, Some(actuator)) => actuator,
        (_, None) => {
            return Err(CtrlBotError::VirtualBus(
                "controller is not initialized".into(),
            ))
        }
    };
    let settings = actuator.settings().clone();

    match command {
        Command::Aim { direction } => {
            let direction: Direction = direction.parse()?;
            actuator.aim(direction)?;
        }
        Command::Fire { sides, duration } => {
            let hold = settings.pulse_duration(duration.as_deref());
            if sides.contains('L') {
                actuator.pulse_trigger(Trigger::Left, hold)?;
            }
            if sides.contains('R') {
                actuator.pulse_trigger(Trigger::Right, hold)?;
            }
        }
        Command::Button { buttons, duration } => {
            let hold = settings.pulse_duration(duration.as_deref());
            let buttons = buttons.to_ascii_lowercase();
            for (letter, button) in [
                ('a', Button::A),
                ('b', Button::B),
                ('x', Button::X),
                ('y', Button::Y),
            ] {
                if buttons.contains(letter) {
                    actuator.pulse_button(button, hold)?;
                }
            }
        }
        Command::Dpad { direction, count } => {
            let direction = direction.to_ascii_lowercase();
            let dpad = [
                ("up", Dpad::UP),
                ("down", Dpad::DOWN),
                ("left", Dpad::LEFT),
                ("right", Dpad::RIGHT),
            ]
            .into_iter()
            .find(|(name, _)| direction.contains(name))
            .map(|(_, dpad)| dpad);
            if let Some(dpad) = dpad {
                actuator
                    .tap_dpad(dpad, settings.tap_count(count.as_deref()))
                    .await?;
            }
        }
        Command::Help { .. } => {}
    }
    Ok(vec![])
}
