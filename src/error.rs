use std::error::Error;
use std::fmt;

/// Failure to set up a heap's backing region. Fatal for that heap: a heap
/// whose `init` failed holds no region and will never satisfy an allocation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InitError {
    AlreadyInitialized,
    InvalidSize,
    RegionUnavailable,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::AlreadyInitialized => {
                write!(f, "heap already holds a region from a previous init")
            }
            InitError::InvalidSize => write!(f, "requested region size is not positive"),
            InitError::RegionUnavailable => {
                write!(f, "the environment could not supply the region")
            }
        }
    }
}

impl Error for InitError {}

/// A rejected `free`. One variant on purpose: the original contract folds
/// null, misaligned, out-of-region, and already-free pointers into a single
/// outcome, and no mutation happens on any of those paths.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FreeError {
    InvalidFree,
}

impl fmt::Display for FreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreeError::InvalidFree => write!(f, "pointer does not name an allocated block"),
        }
    }
}

impl Error for FreeError {}
