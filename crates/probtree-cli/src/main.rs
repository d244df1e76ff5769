#![forbid(unsafe_code)]

use probtree_core::{LayoutKind, Settings};
use probtree_layout::LayoutSession;
use probtree_layout::viewport::{DrawCommand, RecordingCanvas, RenderStats, ScrollRect, Transform};
use serde::Serialize;
use std::io::Read;
use std::str::FromStr;
use tracing_subscriber::prelude::*;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Core(probtree_core::Error),
    Layout(probtree_layout::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Layout(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<probtree_core::Error> for CliError {
    fn from(value: probtree_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<probtree_layout::Error> for CliError {
    fn from(value: probtree_layout::Error) -> Self {
        Self::Layout(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Layout,
    Search,
    Visible,
}

#[derive(Debug, Clone, Copy)]
struct LayoutArg(LayoutKind);

impl FromStr for LayoutArg {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "branched" => Ok(Self(LayoutKind::Branched)),
            "linear" => Ok(Self(LayoutKind::Linear)),
            "ranked" | "dagre" => Ok(Self(LayoutKind::Ranked)),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    settings: Option<String>,
    layout: Option<LayoutKind>,
    no_ghosts: bool,
    pretty: bool,
    verbose: bool,
    query: Option<String>,
    transform: Transform,
    scroll: ScrollRect,
}

fn usage() -> &'static str {
    "probtree-cli\n\
\n\
USAGE:\n\
  probtree-cli [layout] [OPTIONS] [<path>|-]\n\
  probtree-cli search --query <text> [OPTIONS] [<path>|-]\n\
  probtree-cli visible [--scale <k>] [--pan-x <x>] [--pan-y <y>] [--viewport-width <w>] [--viewport-height <h>] [--scroll-left <l>] [--scroll-top <t>] [OPTIONS] [<path>|-]\n\
\n\
OPTIONS:\n\
  --layout branched|linear|ranked   override the LAYOUT setting\n\
  --settings <json-file>            partial settings object merged over the defaults\n\
  --no-ghosts                       do not synthesize predicted continuations\n\
  --pretty                          pretty-print JSON output\n\
  --verbose                         log at debug level (RUST_LOG overrides)\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - layout prints {placedNodes, placedLinks, boundingBox}.\n\
  - search prints {count, indices, keys}.\n\
  - visible prints the draw commands of one frame.\n\
"
}

fn parse_num(value: Option<&String>) -> Result<f64, CliError> {
    let value = value.ok_or(CliError::Usage(usage()))?;
    let n = value
        .parse::<f64>()
        .map_err(|_| CliError::Usage(usage()))?;
    if !n.is_finite() {
        return Err(CliError::Usage(usage()));
    }
    Ok(n)
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        scroll: ScrollRect {
            left: 0.0,
            top: 0.0,
            width: 1200.0,
            height: 800.0,
        },
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "search" => args.command = Command::Search,
            "visible" => args.command = Command::Visible,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--no-ghosts" => args.no_ghosts = true,
            "--layout" => {
                let Some(kind) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let LayoutArg(kind) = kind.parse().map_err(|_| CliError::Usage(usage()))?;
                args.layout = Some(kind);
            }
            "--settings" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.settings = Some(path.clone());
            }
            "--query" => {
                let Some(q) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.query = Some(q.clone());
            }
            "--scale" => {
                args.transform.k = parse_num(it.next())?;
                if args.transform.k <= 0.0 {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--pan-x" => args.transform.x = parse_num(it.next())?,
            "--pan-y" => args.transform.y = parse_num(it.next())?,
            "--viewport-width" => args.scroll.width = parse_num(it.next())?,
            "--viewport-height" => args.scroll.height = parse_num(it.next())?,
            "--scroll-left" => args.scroll.left = parse_num(it.next())?,
            "--scroll-top" => args.scroll.top = parse_num(it.next())?,
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if args.command == Command::Search && args.query.is_none() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());
    // A second init (tests running in-process) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn load_settings(args: &Args) -> Result<Settings, CliError> {
    let mut settings = match args.settings.as_deref() {
        Some(path) => Settings::from_json_str(&std::fs::read_to_string(path)?)?,
        None => Settings::default(),
    };
    if let Some(kind) = args.layout {
        settings.layout = kind;
    }
    if args.no_ghosts {
        settings.show_predicted_paths = false;
    }
    settings.validate()?;
    Ok(settings)
}

#[derive(Serialize)]
struct SearchOut<'a> {
    query: &'a str,
    count: usize,
    indices: &'a [usize],
    keys: Vec<&'a str>,
}

#[derive(Serialize)]
struct VisibleOut<'a> {
    stats: RenderStats,
    commands: &'a [DrawCommand],
}

fn run(args: Args) -> Result<(), CliError> {
    let settings = load_settings(&args)?;
    let text = read_input(args.input.as_deref())?;

    let mut session = LayoutSession::new(settings);
    session.load_str(&text)?;
    session.layout()?;

    match args.command {
        Command::Layout => write_json(session.current_layout(), args.pretty),
        Command::Search => {
            let query = args.query.as_deref().unwrap_or_default();
            let count = session.search(query);
            let indices = session.search_matches();
            let keys = indices
                .iter()
                .filter_map(|&i| session.placed_node(i))
                .map(|n| n.key.as_str())
                .collect();
            let out = SearchOut {
                query,
                count,
                indices,
                keys,
            };
            write_json(&out, args.pretty)
        }
        Command::Visible => {
            session.set_scroll(args.scroll);
            session.set_transform(args.transform);
            let mut canvas = RecordingCanvas::default();
            let stats = session.render_now(&mut canvas);
            let out = VisibleOut {
                stats,
                commands: &canvas.commands,
            };
            write_json(&out, args.pretty)
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_logging(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
