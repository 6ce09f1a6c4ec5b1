//! Line commands read from stdin and forwarded to the session handle.

use std::io::BufRead;
use std::path::PathBuf;
use std::thread;

use mq_utils::{MannequinHandle, SessionClosed};
use thiserror::Error;
use tracing::{info, warn};

pub const HELP: &str = "commands: wear <category> <url> | remove [category] | reset | \
color <hex> | resize <w> <h> | shot [path] | blob | angle <radians> | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Wear { category: String, url: String },
    Remove(Option<String>),
    Reset,
    Color(String),
    Resize { width: f32, height: f32 },
    Shot(Option<PathBuf>),
    Blob,
    Angle(f32),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ShellError {
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("{0:?} is not a number")]
    NotANumber(String),
}

fn number(raw: &str) -> Result<f32, ShellError> {
    raw.parse()
        .map_err(|_| ShellError::NotANumber(raw.to_string()))
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_command_line(line: &str) -> Result<Option<ShellCommand>, ShellError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let missing = |command, argument| ShellError::MissingArgument { command, argument };

    let command = match verb.to_lowercase().as_str() {
        "wear" => {
            let category = words.next().ok_or(missing("wear", "a category"))?;
            // URLs and paths may contain spaces; keep the rest of the line.
            let url = words.collect::<Vec<_>>().join(" ");
            if url.is_empty() {
                return Err(missing("wear", "an image url"));
            }
            ShellCommand::Wear {
                category: category.to_string(),
                url,
            }
        }
        "remove" => ShellCommand::Remove(words.next().map(str::to_string)),
        "reset" => ShellCommand::Reset,
        "color" => {
            let hex = words.next().ok_or(missing("color", "a hex color"))?;
            ShellCommand::Color(hex.to_string())
        }
        "resize" => {
            let width = number(words.next().ok_or(missing("resize", "a width"))?)?;
            let height = number(words.next().ok_or(missing("resize", "a height"))?)?;
            ShellCommand::Resize { width, height }
        }
        "shot" => ShellCommand::Shot(words.next().map(PathBuf::from)),
        "blob" => ShellCommand::Blob,
        "angle" => {
            let radians = words.next().ok_or(missing("angle", "radians"))?;
            ShellCommand::Angle(number(radians)?)
        }
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        _ => return Err(ShellError::Unknown(verb.to_string())),
    };
    Ok(Some(command))
}

/// Forward `command` to the session. Returns `false` once the shell should
/// stop reading.
pub fn dispatch(handle: &MannequinHandle, command: ShellCommand) -> Result<bool, SessionClosed> {
    match command {
        ShellCommand::Wear { category, url } => handle.wear_image(&category, &url)?,
        ShellCommand::Remove(category) => handle.remove_clothing(category.as_deref())?,
        ShellCommand::Reset => handle.reset_view()?,
        ShellCommand::Color(hex) => handle.set_mannequin_color(&hex)?,
        ShellCommand::Resize { width, height } => handle.resize(width, height)?,
        ShellCommand::Shot(path) => handle.take_screenshot(path)?,
        ShellCommand::Blob => {
            let reply = handle.take_screenshot_blob()?;
            thread::spawn(move || match reply.recv() {
                Ok(bytes) => info!("screenshot blob: {} PNG bytes", bytes.len()),
                Err(_) => warn!("screenshot blob was not produced"),
            });
        }
        ShellCommand::Angle(angle) => handle.set_rotation_angle(angle)?,
        ShellCommand::Help => info!("{HELP}"),
        ShellCommand::Quit => {
            handle.quit()?;
            return Ok(false);
        }
    }
    Ok(true)
}

/// Read commands from stdin on a background thread until `quit`, end of
/// input or the session closing.
pub fn spawn_stdin_shell(handle: MannequinHandle) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let command = match parse_command_line(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    warn!("{err}; {HELP}");
                    continue;
                }
            };
            match dispatch(&handle, command) {
                Ok(true) => {}
                Ok(false) => return,
                Err(err) => {
                    warn!("{err}");
                    return;
                }
            }
        }
        info!("stdin closed; close the window to end the session");
    });
}
