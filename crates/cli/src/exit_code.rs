//! Exit code definitions for the skycp CLI
//!
//! Scripts rely on these values; treat changes as breaking.

use skycp_core::Error;

/// Exit codes for the skycp CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// General/unspecified error
    GeneralError = 1,

    /// User input error: missing arguments, malformed address, bad parameter
    UsageError = 2,

    /// Blob store put/get failed
    TransferError = 3,

    /// A local file could not be opened or created
    FileAccessError = 4,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::TransferError),
            4 => Some(Self::FileAccessError),
            _ => None,
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        Self::from_i32(err.exit_code()).unwrap_or(Self::GeneralError)
    }
}
