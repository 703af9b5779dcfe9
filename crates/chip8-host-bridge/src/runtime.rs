//! Guest module runtime seam.
//!
//! The bridge never sees the interpreter itself. It asks a [`GuestRuntime`] to instantiate the
//! module with an [`ExitHook`] wired in, starts it, and then waits for the hook to fire.

use std::cell::Cell;
use std::rc::Rc;

use chip8_host_protocol::{ExitSignal, GuestArgs};
use futures_channel::oneshot;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuestError {
    #[error("failed to fetch guest module {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to instantiate guest module: {0}")]
    Instantiate(String),
    #[error("guest entry point failed to start: {0}")]
    Start(String),
}

/// Everything a runtime needs to bring up one guest run.
#[derive(Debug)]
pub struct GuestLaunch {
    pub module_url: String,
    pub args: GuestArgs,
    /// Must be wired as the guest's exit import before the entry point runs.
    pub exit: ExitHook,
}

/// Instantiate-and-run primitives of the module runtime.
///
/// `run` only kicks the entry point off; completion is reported exclusively through the
/// [`ExitHook`] handed over in [`GuestLaunch`].
#[allow(async_fn_in_trait)]
pub trait GuestRuntime {
    type Instance;

    async fn instantiate(&mut self, launch: GuestLaunch) -> Result<Self::Instance, GuestError>;

    fn run(&mut self, instance: Self::Instance) -> Result<(), GuestError>;
}

/// Typed exit callback for one guest run.
///
/// Cloneable so it can be captured by a JS closure; only the first [`ExitHook::signal`] across
/// all clones is delivered.
#[derive(Clone)]
pub struct ExitHook {
    tx: Rc<Cell<Option<oneshot::Sender<ExitSignal>>>>,
}

/// Receiving half of an [`ExitHook`].
#[derive(Debug)]
pub struct ExitWait {
    rx: oneshot::Receiver<ExitSignal>,
}

impl ExitHook {
    pub fn channel() -> (ExitHook, ExitWait) {
        let (tx, rx) = oneshot::channel();
        (
            ExitHook {
                tx: Rc::new(Cell::new(Some(tx))),
            },
            ExitWait { rx },
        )
    }

    /// Delivers `signal`. Returns false if a signal was already delivered or nobody is waiting.
    pub fn signal(&self, signal: ExitSignal) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(signal).is_ok(),
            None => false,
        }
    }

    /// Whether the hook can still deliver a signal.
    pub fn is_armed(&self) -> bool {
        let tx = self.tx.take();
        let armed = tx.as_ref().is_some_and(|tx| !tx.is_canceled());
        self.tx.set(tx);
        armed
    }
}

impl std::fmt::Debug for ExitHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitHook")
            .field("armed", &self.is_armed())
            .finish()
    }
}

impl ExitWait {
    /// Resolves with the guest's exit signal, or `None` if every hook clone was dropped first.
    pub async fn wait(self) -> Option<ExitSignal> {
        self.rx.await.ok()
    }
}

/// Latch for the hosting context's uncaught-error channel.
///
/// Errors are only recorded while a run is in progress, and only the first one per run sets the
/// flag. Nothing is rendered for them.
#[derive(Debug, Clone, Default)]
pub struct ErrorLatch {
    armed: Rc<Cell<bool>>,
    errored: Rc<Cell<bool>>,
}

impl ErrorLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an uncaught error. Returns true for the first error of the current run.
    pub fn record(&self, message: &str) -> bool {
        if !self.armed.get() || self.errored.get() {
            return false;
        }
        tracing::debug!(%message, "uncaught error in hosting context");
        self.errored.set(true);
        true
    }

    pub fn errored(&self) -> bool {
        self.errored.get()
    }

    pub(crate) fn arm(&self) {
        self.errored.set(false);
        self.armed.set(true);
    }

    pub(crate) fn disarm(&self) {
        self.armed.set(false);
    }
}
