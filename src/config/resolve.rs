//! Each setting resolves from a CLI flag, then an environment variable, then a
//! default. Values that fail to parse fall through to the next source.

use std::str::FromStr;

pub fn resolve<T: FromStr>(flag: Option<&str>, env: &str, default: T) -> T {
    resolve_opt(flag, env).unwrap_or(default)
}

pub fn resolve_opt<T: FromStr>(flag: Option<&str>, env: &str) -> Option<T> {
    if let Some(v) = flag.and_then(cli_arg).and_then(|raw| raw.trim().parse().ok()) {
        return Some(v);
    }
    std::env::var(env).ok().and_then(|raw| raw.trim().parse().ok())
}

pub fn resolve_bool(flag: Option<&str>, env: &str, default: bool) -> bool {
    let from_flag = flag.and_then(cli_arg).and_then(|raw| parse_bool(&raw));
    from_flag
        .or_else(|| std::env::var(env).ok().and_then(|raw| parse_bool(&raw)))
        .unwrap_or(default)
}

pub fn cli_arg(flag: &str) -> Option<String> {
    find_arg(std::env::args().skip(1), flag)
}

fn find_arg<I: Iterator<Item = String>>(mut args: I, flag: &str) -> Option<String> {
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
        if let Some(value) = arg.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
            return Some(value.to_string());
        }
    }
    None
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
