use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait TerminalOps: Send + Sync + 'static {
    fn setup(&self) -> io::Result<()>;
    fn restore(&self) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct CrosstermTerminalOps;

impl TerminalOps for CrosstermTerminalOps {
    fn setup(&self) -> io::Result<()> {
        use crossterm::{
            cursor, execute,
            terminal::{enable_raw_mode, EnterAlternateScreen},
        };

        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(())
    }

    fn restore(&self) -> io::Result<()> {
        use crossterm::{
            cursor, execute,
            terminal::{disable_raw_mode, LeaveAlternateScreen},
        };

        let mut first_err: Option<io::Error> = None;

        if let Err(err) = disable_raw_mode() {
            first_err.get_or_insert(err);
        }
        if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show) {
            first_err.get_or_insert(err);
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
pub struct TerminalRestorer {
    restored: Arc<AtomicBool>,
    ops: Arc<dyn TerminalOps>,
}

impl TerminalRestorer {
    pub fn restore(&self) -> io::Result<()> {
        if self.restored.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.ops.restore()
    }

    /// Re-enters the TUI after a restore.
    fn setup(&self) -> io::Result<()> {
        if !self.restored.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.ops.setup()
    }
}

/// Raw mode plus alternate screen for as long as the guard lives.
pub struct TerminalGuard {
    restorer: TerminalRestorer,
}

impl TerminalGuard {
    pub fn new() -> io::Result<Self> {
        Self::with_ops(Arc::new(CrosstermTerminalOps))
    }

    pub fn with_ops(ops: Arc<dyn TerminalOps>) -> io::Result<Self> {
        ops.setup()?;
        Ok(Self {
            restorer: TerminalRestorer {
                restored: Arc::new(AtomicBool::new(false)),
                ops,
            },
        })
    }

    pub fn restorer(&self) -> TerminalRestorer {
        self.restorer.clone()
    }

    /// Hands the terminal to a child program (pager, editor) for the duration of `run`.
    pub fn suspend<T>(&self, run: impl FnOnce() -> T) -> io::Result<T> {
        self.restorer.restore()?;
        let result = run();
        self.restorer.setup()?;
        Ok(result)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.restorer.restore();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    SigInt,
    SigTerm,
}

impl TerminationSignal {
    pub fn exit_code(self) -> i32 {
        match self {
            TerminationSignal::SigInt => 130,
            TerminationSignal::SigTerm => 143,
        }
    }
}

/// Restores the terminal and exits when the process is told to stop.
#[cfg(unix)]
pub fn install_termination_signals(
    restorer: TerminalRestorer,
) -> io::Result<std::thread::JoinHandle<()>> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    Ok(std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            let signal = if sig == SIGINT {
                TerminationSignal::SigInt
            } else {
                TerminationSignal::SigTerm
            };
            let _ = restorer.restore();
            std::process::exit(signal.exit_code());
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{TerminalGuard, TerminalOps};

    #[derive(Default)]
    struct MockOps {
        calls: Mutex<Vec<&'static str>>,
    }

    impl TerminalOps for MockOps {
        fn setup(&self) -> std::io::Result<()> {
            self.calls.lock().unwrap().push("setup");
            Ok(())
        }

        fn restore(&self) -> std::io::Result<()> {
            self.calls.lock().unwrap().push("restore");
            Ok(())
        }
    }

    #[test]
    fn terminal_guard_restores_on_drop() {
        let ops = Arc::new(MockOps::default());
        {
            let _guard = TerminalGuard::with_ops(ops.clone()).unwrap();
        }

        assert_eq!(&*ops.calls.lock().unwrap(), &["setup", "restore"]);
    }

    #[test]
    fn terminal_restorer_is_idempotent() {
        let ops = Arc::new(MockOps::default());
        let guard = TerminalGuard::with_ops(ops.clone()).unwrap();
        let restorer = guard.restorer();

        restorer.restore().unwrap();
        restorer.restore().unwrap();
        drop(guard);

        assert_eq!(&*ops.calls.lock().unwrap(), &["setup", "restore"]);
    }

    #[test]
    fn suspend_hands_over_and_takes_back_the_terminal() {
        let ops = Arc::new(MockOps::default());
        let guard = TerminalGuard::with_ops(ops.clone()).unwrap();

        let value = guard
            .suspend(|| {
                ops.calls.lock().unwrap().push("child");
                7
            })
            .unwrap();
        drop(guard);

        assert_eq!(value, 7);
        assert_eq!(
            &*ops.calls.lock().unwrap(),
            &["setup", "restore", "child", "setup", "restore"]
        );
    }
}
