use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

/// Session log location under `home`.
pub fn log_path(home: &Path) -> PathBuf {
    home.join(".local/share/tsh/tsh.log")
}

/// Parse a level name (`off`, `error` ... `trace`), case-insensitively.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(level.trim()).ok()
}

/// Start appending log records to ~/.local/share/tsh/tsh.log.
/// Best-effort: if HOME is unset or the file cannot be opened, logging stays
/// off and the shell runs anyway.
pub fn init(level: &str) {
    let Some(filter) = parse_level(level) else {
        eprintln!("tsh: unknown log level {level:?}, logging disabled");
        return;
    };
    if filter == LevelFilter::Off {
        return;
    }
    let Some(home) = std::env::var_os("HOME") else {
        return;
    };
    let path = log_path(Path::new(&home));
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .build();
    // A logger may already be installed (tests, embedding); keep it.
    let _ = WriteLogger::init(filter, config, file);
}
