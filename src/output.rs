//! User-facing console output for the `dual_tier` binary.
//! Colors are enabled only when the stream is a TTY.

use owo_colors::OwoColorize;

fn stdout_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_info(msg: &str) {
    if stdout_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if stdout_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// One `label: value` row of a status report; labels are padded to line up.
pub fn print_field(label: &str, value: &str) {
    if stdout_tty() {
        println!("{} {}", format!("{:>18}", format!("{label}:")).dimmed(), value);
    } else {
        println!("{:>18} {}", format!("{label}:"), value);
    }
}

/// Plain line with no prefix, for output users may script against.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}
