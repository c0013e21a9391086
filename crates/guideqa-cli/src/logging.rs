//! Stderr logging for the CLI.
//!
//! `-v`/`-q` set one level for every `guideqa::*` target. `--log` entries
//! adjust single targets on top of that. A set `RUST_LOG` replaces both.

use tracing_subscriber::EnvFilter;

/// Levels from quietest to loudest. Index 1 is the default.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Crates whose targets are taken as written instead of under `guideqa::`.
const FOREIGN_TARGETS: [&str; 3] = ["reqwest", "hyper", "rusqlite"];

#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    /// Number of `-v` flags, or -1 for `--quiet`.
    pub verbosity: i8,
    /// Raw `--log` values: `target=level`, comma separated.
    pub targets: Vec<String>,
    pub json: bool,
}

impl LogSettings {
    fn level_index(&self) -> usize {
        (i16::from(self.verbosity) + 1).clamp(0, LEVELS.len() as i16 - 1) as usize
    }

    /// Filter directives, plus any `--log` entries that could not be used.
    pub fn directives(&self) -> (Vec<String>, Vec<String>) {
        let index = self.level_index();
        // HTTP internals stay at warn until full tracing is asked for.
        let http = if index == LEVELS.len() - 1 {
            LEVELS[index]
        } else {
            LEVELS[index.min(1)]
        };

        let mut directives = vec![
            format!("guideqa={}", LEVELS[index]),
            format!("reqwest={}", http),
        ];
        if index == 1 {
            // Eval progress is the only output of a long run.
            directives.push("guideqa::eval=info".to_string());
        }

        let mut rejected = Vec::new();
        for part in self.targets.iter().flat_map(|raw| raw.split(',')) {
            match target_directive(part) {
                Some(directive) => directives.push(directive),
                None if part.trim().is_empty() => {}
                None => rejected.push(part.trim().to_string()),
            }
        }
        (directives, rejected)
    }
}

/// `history=debug` becomes `guideqa::history=debug`.
fn target_directive(part: &str) -> Option<String> {
    let (target, level) = part.split_once('=')?;
    let target = target.trim();
    let level = match level.trim().to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        other if other == "off" || LEVELS.contains(&other) => other.to_string(),
        _ => return None,
    };
    if target.is_empty() {
        return None;
    }

    let target = if target == "guideqa"
        || target.starts_with("guideqa::")
        || FOREIGN_TARGETS.contains(&target)
    {
        target.to_string()
    } else {
        format!("guideqa::{}", target)
    };
    Some(format!("{}={}", target, level))
}

pub fn init(settings: &LogSettings) {
    let (directives, rejected) = settings.directives();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives.join(",")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if settings.json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }

    for entry in rejected {
        tracing::warn!(target: "guideqa::startup", "Ignoring --log entry '{}'", entry);
    }
}
