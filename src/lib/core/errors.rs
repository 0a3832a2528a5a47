use crate::core::error::LoomError;
use anyhow::Error;
use std::io;

/// Returns `true` if any error in the chain originated from a broken pipe.
#[inline]
pub fn is_broken_pipe(err: &Error) -> bool {
    err.chain().any(|cause| {
        let io_err = match cause.downcast_ref::<LoomError>() {
            Some(LoomError::Io(io_err)) => Some(io_err),
            _ => cause.downcast_ref::<io::Error>(),
        };
        io_err
            .map(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
            .unwrap_or(false)
    })
}
