use std::io::stdout;

use chrono::Local;
use crossterm::{ExecutableCommand, style::{Color, ResetColor, SetForegroundColor}};

pub fn form_logs(message: &str, info_message: &str, color: Color) {
    let time_stamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let _ = stdout().execute(SetForegroundColor(color));
    println!("[{}][{}] {}", time_stamp, info_message, message);
    let _ = stdout().execute(ResetColor);
}

pub fn form_message(message: &str, color: Color) {
    let _ = stdout().execute(SetForegroundColor(color));
    println!("{}", message);
    let _ = stdout().execute(ResetColor);
}

pub fn info(message: &str) {
    form_logs(message, "INFO", Color::Cyan);
}

pub fn warn(message: &str) {
    form_logs(message, "WARN", Color::Yellow);
}

pub fn error(message: &str) {
    form_logs(message, "ERROR", Color::Red);
}
