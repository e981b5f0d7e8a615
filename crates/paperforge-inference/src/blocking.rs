//! Synchronous generation wrapper with an independent deadline.
//!
//! Some call sites (CLI tools, worker shims) are not async. This runs a
//! generation call on a dedicated thread with its own single-threaded
//! runtime and enforces the deadline on the calling side, so a backend
//! that ignores its configured timeout still cannot hang the caller.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use tracing::warn;

use paperforge_core::{Error, GenerationBackend, GenerationOptions, Result};

/// Run `generate` to completion on a dedicated thread, waiting at most
/// `opts.timeout` for the result.
pub fn generate_blocking(
    backend: Arc<dyn GenerationBackend>,
    prompt: String,
    opts: GenerationOptions,
) -> Result<String> {
    let (tx, rx) = mpsc::channel();
    let deadline = opts.timeout;

    thread::spawn(move || {
        let result = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(backend.generate(&prompt, &opts)),
            Err(e) => Err(Error::Config(format!("runtime: {}", e))),
        };
        // Receiver may have timed out and gone; nothing to do then.
        let _ = tx.send(result);
    });

    match rx.recv_timeout(deadline) {
        Ok(result) => result,
        Err(_) => {
            warn!(
                subsystem = "inference",
                component = "blocking",
                timeout_secs = deadline.as_secs(),
                "Generation thread exceeded deadline"
            );
            Err(Error::Timeout(deadline))
        }
    }
}
