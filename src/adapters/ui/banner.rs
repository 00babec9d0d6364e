//! ASCII banner with a blue-to-aqua gradient (DROPSYNC).
//! Uses figlet's built-in standard font.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Dropbox Blue (#0061fe).
const DROPBOX_BLUE: (u8, u8, u8) = (0x00, 0x61, 0xfe);
/// Aqua (#0ff0fc).
const AQUA: (u8, u8, u8) = (0x0f, 0xf0, 0xfc);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Prints the welcome banner: "DROPSYNC" in figlet ASCII with a gradient from
/// Dropbox Blue to Aqua, then the version line.
pub fn print_welcome() {
    let Ok(font) = FIGfont::standard() else {
        println!("DROPSYNC v{}", env!("CARGO_PKG_VERSION"));
        return;
    };
    let Some(figure) = font.convert("DROPSYNC") else {
        println!("DROPSYNC v{}", env!("CARGO_PKG_VERSION"));
        return;
    };

    let mut out = stdout();
    let art = figure.to_string();
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(DROPBOX_BLUE, AQUA, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: AQUA.0,
        g: AQUA.1,
        b: AQUA.2,
    }));
    let _ = out.execute(Print(format!("v{}\r\n", env!("CARGO_PKG_VERSION"))));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}
