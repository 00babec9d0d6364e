//! Spinner shown while a backend call or a callback wait is outstanding.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(message.into());
    pb
}
