use crate::output::is_quiet;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

/// Banner line; suppressed in quiet mode
pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::BOOK, text.style(theme().header.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().dim.clone()), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    if is_quiet() {
        return;
    }
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

pub fn record(text: &str) -> String {
    text.style(theme().record.clone()).to_string()
}

pub fn record_created(kind: &str, id: i64, label: &str) {
    println!(
        "{} {} #{} {}",
        Icons::NEW.style(theme().success.clone()),
        kind,
        id,
        record(label)
    );
}

pub fn record_changed(kind: &str, id: i64, label: &str) {
    println!("{} {} #{} {}", Icons::MOD.style(theme().warn.clone()), kind, id, record(label));
}

pub fn record_deleted(kind: &str, id: i64) {
    println!("{} {} #{}", Icons::DEL.style(theme().error.clone()), kind, id);
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}
