//! Advisory lock so only one process writes a given SQLite file. A second
//! process fails fast with a clear message instead of contending on the WAL.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;

use sqlx::sqlite::SqliteConnectOptions;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Another instance of orgspace is already using this database. Stop it first or use a different DATABASE_URL.")]
    AlreadyLocked,
    #[error("DATABASE_URL: {0}")]
    Url(#[from] sqlx::Error),
    #[error("Lock file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Lock thread exited without reporting")]
    ThreadGone,
}

/// Lock file next to the database file, or None for in-memory databases.
fn lock_path(url: &str) -> Result<Option<PathBuf>, LockError> {
    if url.contains(":memory:") {
        return Ok(None);
    }
    let db_file = SqliteConnectOptions::from_str(url)?.get_filename().to_path_buf();
    let display = db_file.to_string_lossy();
    if display.is_empty() || display.contains(":memory:") {
        return Ok(None);
    }

    let name = db_file
        .file_name()
        .map(|n| format!("{}.lock", n.to_string_lossy()))
        .unwrap_or_else(|| "db.lock".to_string());
    Ok(Some(match db_file.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }))
}

/// Take the lock for `url`. The returned guard holds it until dropped.
///
/// `fd_lock` guards borrow the lock, so the lock lives on a parked thread that
/// releases it when the guard signals exit.
pub fn acquire(url: &str) -> Result<Option<SingleWriterGuard>, LockError> {
    let Some(path) = lock_path(url)? else {
        return Ok(None);
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|source| LockError::Io { path: path.clone(), source })?;

    let (result_tx, result_rx) = mpsc::channel::<Result<(), LockError>>();
    let (exit_tx, exit_rx) = mpsc::channel::<()>();

    let join = thread::spawn(move || {
        let mut lock = fd_lock::RwLock::new(file);
        match lock.try_write() {
            Ok(_held) => {
                let _ = result_tx.send(Ok(()));
                let _ = exit_rx.recv();
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                let _ = result_tx.send(Err(LockError::AlreadyLocked));
            }
            Err(source) => {
                let _ = result_tx.send(Err(LockError::Io { path, source }));
            }
        };
    });

    result_rx.recv().map_err(|_| LockError::ThreadGone)??;
    Ok(Some(SingleWriterGuard {
        exit_tx,
        join: Some(join),
    }))
}

pub struct SingleWriterGuard {
    exit_tx: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl Drop for SingleWriterGuard {
    fn drop(&mut self) {
        let _ = self.exit_tx.send(());
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}
