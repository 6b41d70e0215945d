//! tactile-automation - command-line driver
//!
//! Runs one mouse or window operation against the live desktop and prints
//! the outcome as JSON on stdout. Logs go to stderr.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};

use tactile_automation::domain::{ModifierSet, MouseButton, ScrollDirection, WindowHandle};
use tactile_automation::{PlatformResult, logging};

/// Command-line arguments for tactile-automation
#[derive(Parser, Debug)]
#[command(name = "tactile-automation")]
#[command(version, about = "Safety-gated mouse input and window activation", long_about = None)]
struct Args {
    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Optional target; a missing axis is taken from the cursor
#[derive(clap::Args, Debug, Clone, Copy)]
#[cfg_attr(not(windows), allow(dead_code))]
struct PointArgs {
    #[arg(long, allow_negative_numbers = true)]
    x: Option<i32>,
    #[arg(long, allow_negative_numbers = true)]
    y: Option<i32>,
}

#[derive(clap::Args, Debug, Clone, Copy)]
#[cfg_attr(not(windows), allow(dead_code))]
struct ClickArgs {
    #[command(flatten)]
    at: PointArgs,

    /// Modifiers to hold, e.g. `ctrl+shift`
    #[arg(long)]
    modifiers: Option<ModifierSet>,
}

impl ClickArgs {
    #[cfg_attr(not(windows), allow(dead_code))]
    fn modifiers(&self) -> ModifierSet {
        self.modifiers.unwrap_or(ModifierSet::NONE)
    }
}

#[derive(Subcommand, Debug)]
#[cfg_attr(not(windows), allow(dead_code))]
enum Command {
    /// Move the cursor
    Move {
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
    },
    /// Left click
    Click(ClickArgs),
    /// Left double click
    DoubleClick(ClickArgs),
    /// Right click
    RightClick(ClickArgs),
    /// Middle click
    MiddleClick(PointArgs),
    /// Press at the start point, move, release at the end point
    Drag {
        #[arg(allow_negative_numbers = true)]
        start_x: i32,
        #[arg(allow_negative_numbers = true)]
        start_y: i32,
        #[arg(allow_negative_numbers = true)]
        end_x: i32,
        #[arg(allow_negative_numbers = true)]
        end_y: i32,
        #[arg(long, value_enum, default_value_t = MouseButton::Left)]
        button: MouseButton,
    },
    /// Scroll the wheel by notches
    Scroll {
        #[arg(value_enum)]
        direction: ScrollDirection,
        #[arg(default_value_t = 1)]
        amount: u32,
        #[command(flatten)]
        at: PointArgs,
    },
    /// Bring a window to the foreground
    Activate {
        /// Window handle, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_window_handle)]
        window: WindowHandle,
        /// Only try the direct request, no workarounds
        #[arg(long)]
        no_fallback: bool,
    },
    /// Print the virtual desktop and monitor layout
    Screen,
}

fn parse_window_handle(raw: &str) -> Result<WindowHandle, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => isize::from_str_radix(hex, 16),
        None => raw.parse::<isize>(),
    };
    parsed
        .map(WindowHandle)
        .map_err(|e| format!("invalid window handle {raw:?}: {e}"))
}

/// Serializes an outcome, falling back to a system error record
fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        json!({
            "success": false,
            "error_code": "system_error",
            "error": format!("Failed to serialize result: {e}"),
        })
    })
}

fn succeeded(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool).unwrap_or(false)
}

fn emit(value: &Value) -> ExitCode {
    println!("{value:#}");
    if succeeded(value) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // CRITICAL: DPI awareness before any other Win32 call
    let dpi = enable_dpi_awareness();

    logging::init(args.verbose);

    if let Err(e) = dpi {
        tracing::warn!(error = %e, "per-monitor DPI awareness not enabled, coordinates may be scaled");
    }

    emit(&run(args.command).await)
}

#[cfg(windows)]
fn enable_dpi_awareness() -> PlatformResult<()> {
    tactile_automation::platform::windows::enable_per_monitor_dpi_awareness()
}

#[cfg(not(windows))]
fn enable_dpi_awareness() -> PlatformResult<()> {
    Ok(())
}

#[cfg(not(windows))]
async fn run(_command: Command) -> Value {
    use tactile_automation::{MouseControlResult, MouseErrorCode, PlatformError};

    tracing::error!("this tool drives the Windows desktop and cannot run on this platform");
    to_json(&MouseControlResult::failed(
        MouseErrorCode::SystemError,
        PlatformError::Unsupported.to_string(),
    ))
}

#[cfg(windows)]
async fn run(command: Command) -> Value {
    use std::sync::Arc;

    use tactile_automation::domain::ScreenPoint;
    use tactile_automation::platform::monitors::{
        VirtualScreenInfo, enumerate_monitors, primary_monitor, union_bounds,
    };
    use tactile_automation::platform::{ScreenQuery, Win32Platform};
    use tactile_automation::safety::{InputDesktopDetector, TokenElevationDetector};
    use tactile_automation::{
        ForegroundActivator, MouseConfiguration, MouseInputService, SafetyGate, WindowActivator,
        WindowConfiguration,
    };
    use tokio_util::sync::CancellationToken;
    use tracing::{debug, info};

    let platform = Arc::new(Win32Platform::new());

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, cancelling");
            on_ctrl_c.cancel();
        }
    });

    let mouse_config = MouseConfiguration::from_env();
    let window_config = WindowConfiguration::from_env();
    debug!(?mouse_config, ?window_config, "configuration loaded");

    let gate = SafetyGate::new(
        Arc::new(InputDesktopDetector::new(platform.clone())),
        Arc::new(TokenElevationDetector::new(platform.clone())),
    );
    let mouse = MouseInputService::new(
        platform.clone(),
        platform.clone(),
        platform.clone(),
        gate,
        mouse_config,
    );

    match command {
        Command::Move { x, y } => to_json(&mouse.move_to(x, y, &cancel).await),
        Command::Click(args) => to_json(
            &mouse
                .click(args.at.x, args.at.y, args.modifiers(), &cancel)
                .await,
        ),
        Command::DoubleClick(args) => to_json(
            &mouse
                .double_click(args.at.x, args.at.y, args.modifiers(), &cancel)
                .await,
        ),
        Command::RightClick(args) => to_json(
            &mouse
                .right_click(args.at.x, args.at.y, args.modifiers(), &cancel)
                .await,
        ),
        Command::MiddleClick(at) => to_json(&mouse.middle_click(at.x, at.y, &cancel).await),
        Command::Drag {
            start_x,
            start_y,
            end_x,
            end_y,
            button,
        } => to_json(
            &mouse
                .drag(
                    ScreenPoint::new(start_x, start_y),
                    ScreenPoint::new(end_x, end_y),
                    button,
                    &cancel,
                )
                .await,
        ),
        Command::Scroll {
            direction,
            amount,
            at,
        } => to_json(&mouse.scroll(direction, amount, at.x, at.y, &cancel).await),
        Command::Activate {
            window,
            no_fallback,
        } => {
            let activator = ForegroundActivator::new(platform.clone(), window_config);
            let outcome = activator
                .activate_window(window, !no_fallback, &cancel)
                .await;
            json!({
                "success": outcome.is_success(),
                "error_code": outcome.error_code(),
                "window": window,
                "activation": to_json(&outcome),
            })
        }
        Command::Screen => match (platform.virtual_screen_bounds(), enumerate_monitors()) {
            (Ok(bounds), Ok(monitors)) => {
                if union_bounds(&monitors) != Some(bounds) {
                    debug!(%bounds, "monitor union differs from reported virtual screen");
                }
                json!({
                    "success": true,
                    "error_code": "success",
                    "virtual_screen": VirtualScreenInfo::from(bounds),
                    "primary_monitor": primary_monitor(&monitors).map(|m| m.index),
                    "monitors": to_json(&monitors),
                })
            }
            (Err(e), _) => json!({
                "success": false,
                "error_code": "system_error",
                "error": e.to_string(),
            }),
            (_, Err(e)) => json!({
                "success": false,
                "error_code": "system_error",
                "error": e.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_with_modifiers_and_negative_x() {
        let args = Args::try_parse_from([
            "tactile-automation",
            "click",
            "--x",
            "-1500",
            "--y",
            "20",
            "--modifiers",
            "ctrl+alt",
        ])
        .unwrap();

        match args.command {
            Command::Click(click) => {
                assert_eq!(click.at.x, Some(-1500));
                assert_eq!(click.at.y, Some(20));
                assert_eq!(click.modifiers(), ModifierSet::CTRL | ModifierSet::ALT);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn drag_defaults_to_left_button() {
        let args =
            Args::try_parse_from(["tactile-automation", "drag", "-100", "0", "300", "400"]).unwrap();
        match args.command {
            Command::Drag {
                start_x, button, ..
            } => {
                assert_eq!(start_x, -100);
                assert_eq!(button, MouseButton::Left);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn scroll_amount_defaults_to_one_notch() {
        let args = Args::try_parse_from(["tactile-automation", "scroll", "down"]).unwrap();
        match args.command {
            Command::Scroll {
                direction, amount, ..
            } => {
                assert_eq!(direction, ScrollDirection::Down);
                assert_eq!(amount, 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn window_handles_parse_hex_and_decimal() {
        assert_eq!(parse_window_handle("0x1A2B"), Ok(WindowHandle(0x1A2B)));
        assert_eq!(parse_window_handle("4660"), Ok(WindowHandle(4660)));
        assert!(parse_window_handle("window").is_err());
    }

    #[test]
    fn unknown_modifier_is_rejected() {
        assert!(
            Args::try_parse_from(["tactile-automation", "click", "--modifiers", "hyper"]).is_err()
        );
    }

    #[test]
    fn success_flag_drives_exit_status() {
        assert!(succeeded(&json!({ "success": true, "error_code": "success" })));
        assert!(!succeeded(&json!({ "success": false, "error_code": "timeout" })));
        assert!(!succeeded(&json!({ "error_code": "system_error" })));
    }
}
