// # Input Module
//
// Synthetic pointer input for driving the friends list.
//
// | Platform | Tool | Scroll |
// |----------|------|--------|
// | Linux X11 | `xdotool` | wheel buttons 4/5, one click per unit |
// | macOS | `cliclick` | unsupported |
//
// Each action is one short-lived subprocess run on the blocking pool.

use std::process::{Command, Stdio};

use async_trait::async_trait;
use tokio::task::spawn_blocking;
use tracing::trace;

use crate::core::InputDriver;
use crate::error::{ScanError, ScanResult};

/// X11 wheel button for scrolling up.
const WHEEL_UP: &str = "4";
/// X11 wheel button for scrolling down.
const WHEEL_DOWN: &str = "5";

/// `xdotool` arguments moving the pointer to `(x, y)`.
pub fn xdotool_move_args(x: i32, y: i32) -> Vec<String> {
    vec!["mousemove".to_string(), x.to_string(), y.to_string()]
}

/// `xdotool` arguments for a left click at `(x, y)`.
pub fn xdotool_click_args(x: i32, y: i32) -> Vec<String> {
    let mut args = xdotool_move_args(x, y);
    args.extend(["click".to_string(), "1".to_string()]);
    args
}

/// `xdotool` arguments for a scroll of `amount` units; positive is up.
///
/// Returns `None` for a zero amount.
pub fn xdotool_scroll_args(amount: i32) -> Option<Vec<String>> {
    if amount == 0 {
        return None;
    }
    let button = if amount > 0 { WHEEL_UP } else { WHEEL_DOWN };
    Some(vec![
        "click".to_string(),
        "--repeat".to_string(),
        amount.unsigned_abs().to_string(),
        "--delay".to_string(),
        "1".to_string(),
        button.to_string(),
    ])
}

/// Which external tool delivers input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTool {
    Xdotool,
    Cliclick,
    Unsupported,
}

impl InputTool {
    pub fn for_current_platform() -> Self {
        if cfg!(target_os = "linux") {
            InputTool::Xdotool
        } else if cfg!(target_os = "macos") {
            InputTool::Cliclick
        } else {
            InputTool::Unsupported
        }
    }

    fn program(&self) -> &'static str {
        match self {
            InputTool::Xdotool => "xdotool",
            InputTool::Cliclick => "cliclick",
            InputTool::Unsupported => "",
        }
    }
}

/// Input through the platform's command-line pointer tool.
#[derive(Debug, Clone, Copy)]
pub struct SystemInput {
    tool: InputTool,
}

impl Default for SystemInput {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemInput {
    pub fn new() -> Self {
        Self {
            tool: InputTool::for_current_platform(),
        }
    }

    async fn run(&self, action: &'static str, args: Vec<String>) -> ScanResult<()> {
        if self.tool == InputTool::Unsupported {
            return Err(ScanError::input(action, "no input backend for this platform"));
        }
        let program = self.tool.program();
        trace!(program, ?args, "input");
        spawn_blocking(move || run_tool(program, action, &args))
            .await
            .map_err(|e| ScanError::input(action, format!("input task failed: {}", e)))?
    }
}

fn run_tool(program: &str, action: &str, args: &[String]) -> ScanResult<()> {
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            ScanError::input(action, format!("failed to start {}: {}", program, e))
                .with_recovery_suggestion(format!("Install {} and make sure it is on PATH", program))
        })?;
    if !output.status.success() {
        return Err(ScanError::input(
            action,
            format!(
                "{} exited with status {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }
    Ok(())
}

#[async_trait]
impl InputDriver for SystemInput {
    async fn move_pointer(&mut self, x: i32, y: i32) -> ScanResult<()> {
        let args = match self.tool {
            InputTool::Cliclick => vec![format!("m:{},{}", x, y)],
            _ => xdotool_move_args(x, y),
        };
        self.run("move", args).await
    }

    async fn click(&mut self, x: i32, y: i32) -> ScanResult<()> {
        let args = match self.tool {
            InputTool::Cliclick => vec![format!("c:{},{}", x, y)],
            _ => xdotool_click_args(x, y),
        };
        self.run("click", args).await
    }

    async fn scroll(&mut self, amount: i32) -> ScanResult<()> {
        match self.tool {
            InputTool::Cliclick => Err(ScanError::input(
                "scroll",
                "cliclick cannot synthesize scroll wheel events",
            )),
            _ => match xdotool_scroll_args(amount) {
                Some(args) => self.run("scroll", args).await,
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_moves_first() {
        assert_eq!(
            xdotool_click_args(170, 245),
            vec!["mousemove", "170", "245", "click", "1"]
        );
    }

    #[test]
    fn test_scroll_direction_and_count() {
        assert_eq!(
            xdotool_scroll_args(-30).unwrap(),
            vec!["click", "--repeat", "30", "--delay", "1", "5"]
        );
        assert_eq!(xdotool_scroll_args(600).unwrap()[2], "600");
        assert_eq!(xdotool_scroll_args(600).unwrap()[5], "4");
        assert!(xdotool_scroll_args(0).is_none());
    }
}
