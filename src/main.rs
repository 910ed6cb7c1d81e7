//! Purpose: `lighthouse` CLI for inspecting where a lighthouse module was loaded from.
//! Role: Binary crate root; parses args, runs one command, emits JSON on stdout.
//! Invariants: Reports go to stdout as one JSON object per run.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `to_exit_code`.
use std::io::{self, IsTerminal};
use std::os::raw::c_int;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use libloading::{Library, Symbol};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use lighthouse::core::error::{Error, ErrorKind, kind_for_status, to_exit_code};
use lighthouse::module_path_cache;
use lighthouse::platform::{MAX_PATH_UNITS, PathChar, PathUnit, units_to_path};
use lighthouse::report::{ModuleReport, report_json};

type QueryFn = unsafe extern "C" fn(*mut PathChar, c_int) -> u32;

#[derive(Parser)]
#[command(
    name = "lighthouse",
    version,
    about = "Report the on-disk path a lighthouse module captured when it was loaded",
    long_about = None,
    after_help = r#"EXAMPLES
  $ lighthouse self
  $ lighthouse probe ./target/release/liblighthouse.so
  $ lighthouse probe plugin.dll --capacity 5"#
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Report the module path cached by this executable's own copy of the library")]
    #[command(name = "self")]
    SelfModule,
    #[command(
        about = "Load a lighthouse library and query its exported module path",
        after_help = r#"NOTES
  - Loading runs the library's load hook, which captures its path.
  - Exit status is 0 when the query returns 0; otherwise it reflects the status kind."#
    )]
    Probe {
        #[arg(help = "Path to the library to load", value_hint = ValueHint::FilePath)]
        library: PathBuf,
        #[arg(long, help = "Destination capacity in path units, terminator included")]
        capacity: Option<usize>,
        #[arg(
            long,
            default_value = "get_module_file_name",
            help = "Exported query symbol to call"
        )]
        symbol: String,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let color_mode = cli.color;
    let exit_code = match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run(command: Command) -> Result<i32, Error> {
    let report = match command {
        Command::SelfModule => self_report(),
        Command::Probe {
            library,
            capacity,
            symbol,
        } => probe(&library, &symbol, capacity.unwrap_or(MAX_PATH_UNITS))?,
    };
    emit_report(&report)?;
    Ok(if report.status == 0 {
        0
    } else {
        to_exit_code(kind_for_status(report.status))
    })
}

fn self_report() -> ModuleReport {
    let cache = module_path_cache();
    let path = cache.path().ok();
    ModuleReport {
        library: None,
        status: cache.status(),
        path: path.map(|path| path.to_path_buf().to_string_lossy().into_owned()),
        length: cache.reported_len(),
    }
}

fn probe(library: &Path, symbol: &str, capacity: usize) -> Result<ModuleReport, Error> {
    let capacity_arg = c_int::try_from(capacity).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("capacity {capacity} does not fit a C int"))
            .with_source(err)
    })?;

    // SAFETY: loading runs the library's initializers; the caller chose this library.
    let lib = unsafe { Library::new(library) }.map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to load library")
            .with_path(library)
            .with_source(err)
    })?;
    // SAFETY: lighthouse exports its query with exactly the `QueryFn` signature.
    let query: Symbol<QueryFn> = unsafe { lib.get(symbol.as_bytes()) }.map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("library does not export `{symbol}`"))
            .with_path(library)
            .with_source(err)
    })?;

    let mut buf: Vec<PathChar> = vec![0; capacity.max(1)];
    // SAFETY: `buf` holds at least `capacity` units.
    let status = unsafe { query(buf.as_mut_ptr(), capacity_arg) };
    tracing::debug!(library = %library.display(), status, "probed module path");

    let (path, length) = if status == 0 {
        let units: Vec<PathUnit> = buf.iter().map(|unit| *unit as PathUnit).collect();
        let end = units.iter().position(|unit| *unit == 0).ok_or_else(|| {
            Error::new(ErrorKind::Internal)
                .with_message("query reported success without a terminator")
                .with_path(library)
        })?;
        let path = units_to_path(&units[..end]);
        (Some(path.to_string_lossy().into_owned()), Some(end))
    } else {
        (None, None)
    };

    Ok(ModuleReport {
        library: Some(library.to_string_lossy().into_owned()),
        status,
        path,
        length,
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn emit_report(report: &ModuleReport) -> Result<(), Error> {
    let json = serde_json::to_string(&report_json(report)).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode report")
            .with_source(err)
    })?;
    println!("{json}");
    Ok(())
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(code) = err.os_code() {
        inner.insert("os_code".to_string(), json!(code));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        colorize_label("error:", use_color),
        error_message(err)
    )];
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color),
            path.display()
        ));
    }
    let cause_label = colorize_label("caused by:", use_color);
    for cause in error_causes(err) {
        lines.push(format!("{cause_label} {cause}"));
    }
    lines.join("\n")
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

fn colorize_label(label: &str, enabled: bool) -> String {
    if !enabled {
        return label.to_string();
    }
    format!("\u{1b}[31m{label}\u{1b}[0m")
}
