//! Turning decoded broadcast frames into terminal lines.

use chanrelay_protocol::Decoded;
use serde::{Deserialize, Serialize};

const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// How the client prints received messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStyle {
    /// `[CHANNEL] username: content`, no escape codes.
    #[default]
    Plain,
    /// Same layout with a colored tag and a bold username.
    Ansi,
}

/// Renders one decoded frame as a single line, without a trailing newline.
///
/// Frames that did not parse are shown as their trimmed text.
pub fn render(decoded: &Decoded, style: RenderStyle) -> String {
    match (decoded, style) {
        (Decoded::Parsed(msg), RenderStyle::Plain) => {
            format!("[{}] {}: {}", msg.channel, msg.username, msg.content)
        }
        (Decoded::Parsed(msg), RenderStyle::Ansi) => format!(
            "{CYAN}[{}]{RESET} {BOLD}{}{RESET}: {}",
            msg.channel, msg.username, msg.content
        ),
        (Decoded::Raw(raw), _) => raw.clone(),
    }
}
