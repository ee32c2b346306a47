use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

use crate::core::config::AppConfig;

/// Copies every formatted log line to stdout and to an append-only log file.
#[derive(Clone)]
pub(crate) struct TeeMakeWriter {
    pub file: Option<Arc<Mutex<File>>>,
    pub suppress_stdout: bool,
}

impl TeeMakeWriter {
    pub fn open(log_path: &Path, suppress_stdout: bool) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(log_path)?;
        Ok(Self {
            file: Some(Arc::new(Mutex::new(file))),
            suppress_stdout,
        })
    }
}

impl<'a> MakeWriter<'a> for TeeMakeWriter {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter {
            file: self.file.clone(),
            suppress_stdout: self.suppress_stdout,
        }
    }
}

pub(crate) struct TeeWriter {
    file: Option<Arc<Mutex<File>>>,
    suppress_stdout: bool,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = f.write_all(buf); // best effort
        }
        if !self.suppress_stdout {
            std::io::stdout().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = &self.file
            && let Ok(mut f) = file.lock()
        {
            let _ = f.flush();
        }
        if !self.suppress_stdout {
            std::io::stdout().flush()?;
        }
        Ok(())
    }
}

/// Install the global subscriber. Falls back to stdout only when the log file
/// cannot be opened.
pub(crate) fn init_logging(config: &AppConfig, suppress_stdout: bool) {
    let make_writer = match TeeMakeWriter::open(&config.log_path(), suppress_stdout) {
        Ok(w) => w,
        Err(e) => {
            eprintln!(
                "Could not open log file {}: {}",
                config.log_path().display(),
                e
            );
            TeeMakeWriter {
                file: None,
                suppress_stdout,
            }
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.max_level())
        .with_ansi(false)
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok(); // Already set in tests
}
