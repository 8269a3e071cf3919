//! Helpers shared by the unit tests of several modules.

use crate::env::Environment;
use crate::external::{ExitOutcome, Launcher, SpawnError};
use std::cell::RefCell;
use std::io::{Result as IoResult, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Serialises tests that read or change the process working directory.
pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Memory-backed writer whose bytes stay readable after it is handed away.
#[derive(Clone, Default)]
pub(crate) struct SharedWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl SharedWriter {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.buf.borrow().clone()).expect("utf8 output")
    }
}

impl Write for SharedWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

/// One recorded call to [`Launcher::spawn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Launch {
    pub argv: Vec<String>,
    pub current_dir: PathBuf,
}

/// Fake launcher: records what would have run and reports success.
///
/// Names listed in `missing` fail to spawn with [`SpawnError::NotFound`].
#[derive(Clone, Default)]
pub(crate) struct RecordingLauncher {
    pub launches: Rc<RefCell<Vec<Launch>>>,
    pub missing: Vec<String>,
}

impl RecordingLauncher {
    pub(crate) fn argvs(&self) -> Vec<Vec<String>> {
        self.launches.borrow().iter().map(|l| l.argv.clone()).collect()
    }
}

impl Launcher for RecordingLauncher {
    type Child = ();

    fn spawn(&mut self, argv: &[String], env: &Environment) -> Result<(), SpawnError> {
        if self.missing.contains(&argv[0]) {
            return Err(SpawnError::NotFound(argv[0].clone()));
        }
        self.launches.borrow_mut().push(Launch {
            argv: argv.to_vec(),
            current_dir: env.current_dir.clone(),
        });
        Ok(())
    }

    fn wait(&mut self, _child: ()) -> Result<ExitOutcome, SpawnError> {
        Ok(ExitOutcome::Exited(0))
    }
}
