//! tsh: a small interactive shell.
//!
//! Usage: `tsh [-c LINE] [--dump-config] [--log-level LEVEL]`
//!
//! Without `-c`, reads lines from stdin and shows a prompt when stdin is a
//! terminal. Exits with the status of the last line or the `exit` code.

use std::io::{self, IsTerminal};

use tsh::Shell;
use tsh::config::Config;
use tsh::state::ShellState;

const USAGE: &str = "usage: tsh [-c LINE] [--dump-config] [--log-level LEVEL]";

#[derive(Debug, Default)]
struct Args {
    command: Option<String>,
    dump_config: bool,
    log_level: Option<String>,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "-c" => {
                args.command = Some(argv.next().ok_or("-c requires an argument")?);
            }
            "--dump-config" => args.dump_config = true,
            "--log-level" => {
                args.log_level = Some(argv.next().ok_or("--log-level requires an argument")?);
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other => return Err(format!("unknown argument: {other}\n{USAGE}")),
        }
    }
    Ok(args)
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let config = Config::load();

    if args.dump_config {
        match config.to_toml() {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("tsh: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.settings.log_level);
    tsh::logging::init(level);

    let mut state = match ShellState::from_process() {
        Ok(state) => state,
        Err(e) => {
            eprintln!("tsh: cannot determine working directory: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = tsh::signals::install() {
        log::warn!("job control signals unavailable: {e}");
    }
    state.set_terminal(tsh::signals::Terminal::from_stdin());
    log::info!("session start in {}", state.cwd().display());
    let mut shell = Shell::new(state, config);

    let status = match args.command {
        Some(line) => {
            let mut out = io::stdout();
            let mut err = io::stderr();
            shell.run_line(&line, &mut out, &mut err).status()
        }
        None => {
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            shell.run(stdin.lock(), interactive)
        }
    };
    std::process::exit(status);
}
