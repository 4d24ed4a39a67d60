use crate::config::{LoggingConfig, Section};
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Keeps the non-blocking console worker alive for the whole process.
static CONSOLE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

const DEFAULT_MAX_SIZE_MB: u64 = 100;

/// `None` means the sink is switched off for that section.
fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        "off" | "none" => None,
        _ => Some(LevelFilter::INFO),
    }
}

/// True if `target` is `prefix` itself or lives under `prefix::`.
fn target_matches(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// ================= rotating file sinks =================

type Rotating = Arc<Mutex<FileRotate<AppendTimestamp>>>;

/// Write handle to an optional rotating file; writes are dropped when absent.
struct FileHandle(Option<Rotating>);

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(file) => file.lock().write(buf),
            None => Ok(buf.len()),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(file) => file.lock().flush(),
            None => Ok(()),
        }
    }
}

/// Routes each record to the file of the longest matching target prefix,
/// falling back to the "default" section's file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<Rotating>,
    by_prefix: Vec<(String, Rotating)>,
}

impl FileRouter {
    fn route(&self, target: &str) -> Option<Rotating> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| target_matches(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, file)| file.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = FileHandle;

    fn make_writer(&'a self) -> Self::Writer {
        FileHandle(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        FileHandle(self.route(meta.target()))
    }
}

fn open_rotating(section: &Section, base_dir: &Path) -> std::io::Result<Option<Rotating>> {
    if section.file.trim().is_empty() {
        return Ok(None);
    }

    let path = resolve_log_path(&section.file, base_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Keep at most `max_backups` files when given, otherwise prune by age.
    let limit = match section.max_backups {
        Some(n) => FileLimit::MaxFiles(n),
        None => FileLimit::Age(chrono::Duration::days(
            i64::from(section.max_age_days.unwrap_or(1)),
        )),
    };
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) as usize * 1024 * 1024;

    let rot = FileRotate::new(
        &path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        None,
    );
    Ok(Some(Arc::new(Mutex::new(rot))))
}

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn build_router(cfg: &LoggingConfig, base_dir: &Path) -> FileRouter {
    let mut router = FileRouter::default();
    for (name, section) in cfg {
        match open_rotating(section, base_dir) {
            Ok(Some(file)) if name == "default" => router.default = Some(file),
            Ok(Some(file)) => router.by_prefix.push((name.clone(), file)),
            Ok(None) => {}
            Err(e) => eprintln!(
                "Failed to open log file '{}' for '{}': {}",
                section.file, name, e
            ),
        }
    }
    router
}

// ================= level filters =================

#[derive(Clone, Copy)]
enum Sink {
    Console,
    File,
}

/// Per-target level filter for one sink, from the "default" section plus one
/// rule per named section.
fn build_targets(cfg: &LoggingConfig, sink: Sink) -> Targets {
    let level_of = |section: &Section| match sink {
        Sink::Console => parse_level(&section.console_level),
        // A section without a file does not write to the file sink.
        Sink::File if section.file.trim().is_empty() => None,
        Sink::File if section.file_level.trim().is_empty() => Some(LevelFilter::INFO),
        Sink::File => parse_level(&section.file_level),
    };

    let default_level = match (cfg.get("default"), sink) {
        (Some(section), _) => level_of(section).unwrap_or(LevelFilter::OFF),
        (None, Sink::Console) => LevelFilter::INFO,
        (None, Sink::File) => LevelFilter::OFF,
    };

    cfg.iter()
        .filter(|(name, _)| name.as_str() != "default")
        .fold(Targets::new().with_default(default_level), |targets, (name, section)| {
            let level = level_of(section).unwrap_or(LevelFilter::OFF);
            targets.with_target(name.clone(), level)
        })
}

// ================= public init =================

/// Install the global subscriber described by `cfg`.
///
/// Console output goes to stderr (non-blocking, human-readable); file output is
/// JSON, routed per target prefix to size-rotated files under `base_dir`.
/// `RUST_LOG`, when set, caps both sinks. Calling this twice is harmless.
pub fn init_logging(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` before installing the subscriber
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("LogTracer init skipped: {e}");
    }

    let env: Option<EnvFilter> = EnvFilter::try_from_default_env().ok();

    if cfg.is_empty() {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339());
        let _ = tracing_subscriber::registry()
            .with(env)
            .with(fmt_layer)
            .try_init();
        return;
    }

    let (nb_stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
    let _ = CONSOLE_GUARD.set(guard);

    let console_layer = fmt::layer()
        .with_writer(nb_stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(build_targets(cfg, Sink::Console));

    let router = build_router(cfg, base_dir);
    let file_layer = (!router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router)
            .with_filter(build_targets(cfg, Sink::File))
    });

    let _ = tracing_subscriber::registry()
        .with(env)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
