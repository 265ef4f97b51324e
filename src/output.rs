use serde::Serialize;
use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `LEARNING_RECORDS_QUIET=1` suppresses banners and decorative lines
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("LEARNING_RECORDS_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    pub fn is_json(self) -> bool {
        self == OutputMode::Json
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    command: &'a str,
    data: &'a T,
}

/// `{"ok":true,"command":..,"data":..}` as one line
pub fn success_json<T: Serialize>(command: &str, data: &T) -> serde_json::Result<String> {
    serde_json::to_string(&Envelope { ok: true, command, data })
}

pub fn emit_success<T: Serialize>(command: &str, data: &T) -> anyhow::Result<()> {
    println!("{}", success_json(command, data)?);
    Ok(())
}

/// Error envelope printed instead of the human message in JSON mode
pub fn error_json(command: &str, message: &str) -> String {
    serde_json::json!({ "ok": false, "command": command, "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let line = success_json("stats", &serde_json::json!({ "tasks": 3 })).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["command"], "stats");
        assert_eq!(value["data"]["tasks"], 3);
    }

    #[test]
    fn test_error_envelope() {
        let value: serde_json::Value = serde_json::from_str(&error_json("delete", "nope")).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "nope");
    }

    #[test]
    fn test_mode_from_flag() {
        assert!(OutputMode::from_flag(true).is_json());
        assert!(!OutputMode::from_flag(false).is_json());
    }
}
