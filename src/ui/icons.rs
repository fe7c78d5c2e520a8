//! Shared UI icons.
//!
//! Each icon falls back to a short ASCII tag on terminals without emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Session indicators
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "[>]");
pub static SCROLL: Emoji<'_, '_> = Emoji("📜 ", "");
pub static ARROW: Emoji<'_, '_> = Emoji("➡️  ", "->");
pub static STOP: Emoji<'_, '_> = Emoji("🛑 ", "[STOP]");
