//! Line-oriented input scripts
//!
//! Used by the CLI for replay files and interactive stdin. One command per
//! line, `#` starts a comment:
//!
//! ```text
//! at 0
//! touchstart 200 700
//! wait 30
//! touchmove 200 400
//! touchend
//! key Escape
//! zonekey 0 Enter
//! set swipeCount=5 decoyType=notes
//! status
//! ```

use crate::controller::PanicController;
use crate::gesture::{InputEvent, Key, Point};
use crate::scheduler::Millis;
use crate::session::{LockView, PanicSession};
use crate::settings::SettingsPatch;
use anyhow::{anyhow, bail, Context, Result};
use log::info;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Input(InputEvent),
    Trigger,
    Reset,
    SecretExit,
    CancelDelayed,
    Unlock,
    Tap,
    Digit,
    DeleteDigit,
    DismissAlert,
    Update(SettingsPatch),
    Status,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Advance the clock by this much
    Wait(Millis),
    /// Jump the clock to this absolute time
    At(Millis),
    Run(Command),
}

/// Map a typed key name to the DOM-style name the recognizer uses
pub fn key_from_name(name: &str) -> Key {
    match name.to_ascii_lowercase().as_str() {
        "esc" | "escape" => Key::escape(),
        "enter" | "return" => Key::enter(),
        "space" | "spacebar" => Key::space(),
        _ => Key::new(name),
    }
}

/// Parse one line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Step>> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let step = match verb.to_ascii_lowercase().as_str() {
        "wait" => Step::Wait(number(&args, 0)?),
        "at" => Step::At(number(&args, 0)?),
        "touchstart" => input(InputEvent::TouchStart(point(&args)?)),
        "touchmove" => input(InputEvent::TouchMove(point(&args)?)),
        "touchend" => input(InputEvent::TouchEnd(if args.is_empty() {
            None
        } else {
            Some(point(&args)?)
        })),
        "key" => input(InputEvent::KeyDown(key_arg(&args, 0)?)),
        "keyup" => input(InputEvent::KeyUp(key_arg(&args, 0)?)),
        "zonekey" => input(InputEvent::ZoneKeyDown {
            zone: number(&args, 0)?,
            key: key_arg(&args, 1)?,
        }),
        "zonekeyup" => input(InputEvent::ZoneKeyUp {
            zone: number(&args, 0)?,
            key: key_arg(&args, 1)?,
        }),
        "trigger" => Step::Run(Command::Trigger),
        "reset" => Step::Run(Command::Reset),
        "exit" => Step::Run(Command::SecretExit),
        "cancel" => Step::Run(Command::CancelDelayed),
        "unlock" => Step::Run(Command::Unlock),
        "tap" => Step::Run(Command::Tap),
        "digit" => Step::Run(Command::Digit),
        "delete" => Step::Run(Command::DeleteDigit),
        "dismiss" => Step::Run(Command::DismissAlert),
        "status" => Step::Run(Command::Status),
        "set" => Step::Run(Command::Update(patch(&args)?)),
        other => bail!("Unknown command '{}'", other),
    };
    Ok(Some(step))
}

/// Parse a whole script, reporting the line number of the first bad line
pub fn parse_script(text: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(step) =
            parse_line(line).with_context(|| format!("Invalid script line {}", index + 1))?
        {
            steps.push(step);
        }
    }
    Ok(steps)
}

/// Apply one command at `now`
pub fn apply(ctl: &mut PanicController, command: Command, now: Millis) -> Result<()> {
    match command {
        Command::Input(event) => ctl.handle_input(event, now),
        Command::Trigger => ctl.trigger(now),
        Command::Reset => ctl.reset(now),
        Command::SecretExit => ctl.secret_exit(now),
        Command::CancelDelayed => ctl.cancel_delayed_panic(now),
        Command::Unlock => {
            ctl.unlock_lock_screen(now);
        }
        Command::Tap => {
            ctl.lock_screen_tap(now);
        }
        Command::Digit => {
            ctl.press_lock_digit(now);
        }
        Command::DeleteDigit => {
            ctl.delete_lock_digit(now);
        }
        Command::DismissAlert => {
            ctl.dismiss_system_alert(now);
        }
        Command::Update(patch) => {
            ctl.update_settings(&patch, now)?;
        }
        Command::Status => {
            ctl.advance_to(now);
            info!("{}", describe(ctl.session()));
        }
    }
    Ok(())
}

/// Run `steps` in logical time starting at `start`. Returns the final time.
pub fn replay(ctl: &mut PanicController, steps: Vec<Step>, start: Millis) -> Result<Millis> {
    let mut now = start;
    for step in steps {
        match step {
            Step::Wait(ms) => {
                now += ms;
                ctl.advance_to(now);
            }
            Step::At(at) => {
                now = now.max(at);
                ctl.advance_to(now);
            }
            Step::Run(command) => apply(ctl, command, now)?,
        }
    }
    Ok(now)
}

/// One-line summary of the session
pub fn describe(session: &PanicSession) -> String {
    let mut out = if session.is_triggered {
        let decoy = session
            .active_decoy
            .as_ref()
            .map_or("unknown", |d| d.kind.name());
        format!("TRIGGERED (decoy: {})", decoy)
    } else {
        "idle".to_string()
    };

    if let Some(lock) = &session.lock_screen {
        match lock.view {
            LockView::Locked => out.push_str(&format!(", lock screen pin {}/4", lock.pin_length)),
            LockView::DecoyShown(kind) => {
                out.push_str(&format!(", unlocked to {}", kind.name()))
            }
        }
    }
    if let Some(at) = session.last_triggered_at {
        out.push_str(&format!(", last triggered at {} ms", at));
    }
    if let Some(remaining) = session.delayed_panic.remaining_seconds {
        out.push_str(&format!(
            ", delayed panic in {}:{:02}",
            remaining / 60,
            remaining % 60
        ));
    }
    if let Some(notice) = session.notices.back() {
        out.push_str(&format!(", notice: {}", notice.message));
    }
    out
}

fn input(event: InputEvent) -> Step {
    Step::Run(Command::Input(event))
}

fn number<T: std::str::FromStr>(args: &[&str], index: usize) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = args
        .get(index)
        .ok_or_else(|| anyhow!("Missing numeric argument {}", index + 1))?;
    raw.parse::<T>()
        .map_err(|e| anyhow!("Invalid number '{}': {}", raw, e))
}

fn point(args: &[&str]) -> Result<Point> {
    Ok(Point::new(number(args, 0)?, number(args, 1)?))
}

fn key_arg(args: &[&str], index: usize) -> Result<Key> {
    args.get(index)
        .map(|name| key_from_name(name))
        .ok_or_else(|| anyhow!("Missing key name"))
}

/// `field=value` pairs become a TOML document; bare words are quoted
fn patch(args: &[&str]) -> Result<SettingsPatch> {
    if args.is_empty() {
        bail!("'set' needs at least one field=value pair");
    }
    let mut doc = String::new();
    for pair in args {
        let (field, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected field=value, got '{}'", pair))?;
        let is_literal = value == "true"
            || value == "false"
            || value.parse::<i64>().is_ok()
            || value.starts_with('"');
        if is_literal {
            doc.push_str(&format!("{} = {}\n", field, value));
        } else {
            doc.push_str(&format!("{} = \"{}\"\n", field, value));
        }
    }
    let patch: SettingsPatch = toml::from_str(&doc).context("Invalid settings in 'set'")?;
    if patch.is_empty() {
        bail!("'set' did not name any known setting");
    }
    Ok(patch)
}
