use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(json: bool) {
    JSON_MODE.store(json, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

/// Print a result value on stdout. Keys and signatures are expected to be
/// strings already; solana types serialize as byte arrays.
pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = if is_json() {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{s}");
    Ok(())
}

/// A colored one-line note on stderr; silent in JSON mode.
pub fn note(label: &str, msg: &str) {
    if is_json() {
        return;
    }
    let mut err = StandardStream::stderr(ColorChoice::Auto);
    let color = match label {
        "ok" => Color::Green,
        "skip" | "warn" => Color::Yellow,
        _ => Color::Cyan,
    };
    let _ = err.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write!(err, "{label:>6}");
    let _ = err.reset();
    let _ = writeln!(err, " {msg}");
}

/// A spinner on stderr, hidden in JSON mode.
pub fn spinner(msg: &str) -> ProgressBar {
    if is_json() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(msg.to_string());
    pb
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}
