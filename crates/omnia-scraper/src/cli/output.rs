//! Terminal output mode, set once by `main` from the global flags.

pub const ENV_JSON: &str = "OMNIA_JSON";
pub const ENV_QUIET: &str = "OMNIA_QUIET";

/// `--json`: machine-readable status output.
pub fn is_json() -> bool {
    std::env::var(ENV_JSON).is_ok_and(|v| v == "1")
}

/// `--quiet`: no progress lines or summaries.
pub fn is_quiet() -> bool {
    std::env::var(ENV_QUIET).is_ok_and(|v| v == "1")
}

/// Print a JSON value on one line to stderr, keeping stdout for items.
pub fn print_json(value: &serde_json::Value) {
    eprintln!("{value}");
}
