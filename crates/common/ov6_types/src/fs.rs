use core::fmt;

use dataview::Pod;

/// Per-process open file descriptor index.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawFd(i32);

unsafe impl Pod for RawFd {}

impl RawFd {
    #[must_use]
    pub const fn new(fd: i32) -> Self {
        Self(fd)
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for RawFd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<RawFd> for i32 {
    fn from(fd: RawFd) -> Self {
        fd.0
    }
}

impl From<i32> for RawFd {
    fn from(fd: i32) -> Self {
        Self(fd)
    }
}

impl TryFrom<usize> for RawFd {
    type Error = core::num::TryFromIntError;

    fn try_from(fd: usize) -> Result<Self, Self::Error> {
        Ok(Self(i32::try_from(fd)?))
    }
}

impl TryFrom<RawFd> for usize {
    type Error = core::num::TryFromIntError;

    fn try_from(fd: RawFd) -> Result<Self, Self::Error> {
        Self::try_from(fd.0)
    }
}
