//! Startup banner: "FLOW-PIECES" in the standard FIGlet font with a vertical gradient.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Kommo blue (#2f6fed).
const TOP: (u8, u8, u8) = (0x2f, 0x6f, 0xed);
/// Zagomail orange (#ff7a1a).
const BOTTOM: (u8, u8, u8) = (0xff, 0x7a, 0x1a);

/// `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let mix = |x: u8, y: u8| (f64::from(x) * (1.0 - t) + f64::from(y) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn banner_art() -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("FLOW-PIECES").map(|f| f.to_string()))
        .unwrap_or_else(|| "FLOW-PIECES\n".to_string())
}

pub fn print_welcome() {
    let mut out = stdout();
    let art = banner_art();
    let lines: Vec<&str> = art.lines().collect();
    let last = lines.len().saturating_sub(1).max(1);

    for (i, line) in lines.iter().enumerate() {
        let (r, g, b) = lerp_rgb(TOP, BOTTOM, i as f64 / last as f64);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let _ = out.execute(Print(format!(
        "v{} · Kommo + Zagomail connectors\r\n",
        env!("CARGO_PKG_VERSION")
    )));
    let _ = out.flush();
}
