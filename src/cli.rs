use crate::{Error, Result};

const LOG_LEVELS: [&str; 6] = ["error", "warn", "warning", "info", "debug", "trace"];

/// Options for the `run` command; values are `None` when not provided on CLI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub config_path: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub syslog: bool,
    pub once: bool,
    pub print_config: bool,
}

/// Parsed command-line intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunOptions),
    ShowHelp,
    ShowVersion,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut iter = args.iter();
        match iter.next().map(|s| s.as_str()) {
            None => Ok(Command::Run(RunOptions::default())),
            Some("run") => Ok(Command::Run(parse_run_options(&mut iter)?)),
            Some("--help") | Some("-h") => Ok(Command::ShowHelp),
            Some("--version") | Some("-V") => Ok(Command::ShowVersion),
            Some(flag) if flag.starts_with('-') => {
                // `run` is implied when the first argument is already a flag.
                Ok(Command::Run(parse_run_options(&mut args.iter())?))
            }
            Some(cmd) => Err(Error::InvalidArgs(format!(
                "unknown command '{cmd}', try --help"
            ))),
        }
    }

    pub fn help() -> &'static str {
        concat!(
            "oled-stats - system stats on an SSD1306 OLED\n",
            "\n",
            "USAGE:\n",
            "  oled-stats [run] [--config <path>] [--log-level <level>] [--log-file <path>] [--syslog] [--once]\n",
            "  oled-stats --print-config [--config <path>]\n",
            "  oled-stats --help\n",
            "  oled-stats --version\n",
            "\n",
            "OPTIONS:\n",
            "  --config <path>      JSON config (default: $OLED_STATS_CONFIG, then ~/.config/oled-stats/config.json)\n",
            "  --log-level <level>  error, warn, info, debug or trace (default: info)\n",
            "  --log-file <path>    Also append log lines to this file\n",
            "  --syslog             Also forward log lines to syslog (daemon facility)\n",
            "  --once               Render a single frame and exit\n",
            "  --print-config       Print the effective config as JSON and exit\n",
            "  -h, --help           Show this help\n",
            "  -V, --version        Show version\n",
        )
    }

    pub fn print_help() {
        println!("{}", Self::help());
    }
}

fn parse_run_options(iter: &mut std::slice::Iter<String>) -> Result<RunOptions> {
    let mut opts = RunOptions::default();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--config" => {
                opts.config_path = Some(take_value(flag, iter)?);
            }
            "--log-level" => {
                let raw = take_value(flag, iter)?;
                if !LOG_LEVELS.contains(&raw.to_ascii_lowercase().as_str()) {
                    return Err(Error::InvalidArgs(format!(
                        "log level must be one of error, warn, info, debug, trace (got '{raw}')"
                    )));
                }
                opts.log_level = Some(raw);
            }
            "--log-file" => {
                opts.log_file = Some(take_value(flag, iter)?);
            }
            "--syslog" => opts.syslog = true,
            "--once" => opts.once = true,
            "--print-config" => opts.print_config = true,
            other => {
                return Err(Error::InvalidArgs(format!(
                    "unknown flag '{other}', try --help"
                )));
            }
        }
    }

    Ok(opts)
}

fn take_value(flag: &str, iter: &mut std::slice::Iter<String>) -> Result<String> {
    iter.next()
        .filter(|value| !value.starts_with("--"))
        .cloned()
        .ok_or_else(|| Error::InvalidArgs(format!("expected a value after {flag}")))
}
