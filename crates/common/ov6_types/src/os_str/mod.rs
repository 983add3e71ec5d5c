use core::{fmt, mem, str};

#[cfg(feature = "alloc")]
mod os_string;

#[cfg(feature = "alloc")]
pub use self::os_string::OsString;

/// Borrowed, possibly non-UTF-8, byte-string slice.
///
/// Mirrors `std::ffi::OsStr`'s role but is backed directly by raw path bytes,
/// since this kernel has no notion of a platform encoding beyond "bytes with
/// no embedded NUL".
#[repr(transparent)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OsStr {
    inner: [u8],
}

impl OsStr {
    #[must_use]
    pub fn new<S: AsRef<OsStr> + ?Sized>(s: &S) -> &Self {
        s.as_ref()
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> &Self {
        Self::from_inner(bytes)
    }

    pub(crate) fn from_inner(inner: &[u8]) -> &Self {
        // SAFETY: OsStr is repr(transparent) over [u8].
        unsafe { mem::transmute::<&[u8], &Self>(inner) }
    }

    pub(crate) fn from_inner_mut(inner: &mut [u8]) -> &mut Self {
        // SAFETY: OsStr is repr(transparent) over [u8].
        unsafe { mem::transmute::<&mut [u8], &mut Self>(inner) }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn to_str(&self) -> Option<&str> {
        str::from_utf8(&self.inner).ok()
    }

    #[must_use]
    pub fn display(&self) -> Display<'_> {
        Display { os_str: self }
    }
}

impl AsRef<OsStr> for OsStr {
    fn as_ref(&self) -> &OsStr {
        self
    }
}

impl AsRef<OsStr> for str {
    fn as_ref(&self) -> &OsStr {
        OsStr::from_bytes(self.as_bytes())
    }
}

impl AsRef<OsStr> for [u8] {
    fn as_ref(&self) -> &OsStr {
        OsStr::from_bytes(self)
    }
}

impl fmt::Debug for OsStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.display(), f)
    }
}

/// Lossy display adapter, replacing non-UTF-8 byte runs with `\xNN` escapes.
pub struct Display<'a> {
    os_str: &'a OsStr,
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.os_str.to_str() {
            Some(s) => fmt::Display::fmt(s, f),
            None => {
                for &b in self.os_str.as_bytes() {
                    if b.is_ascii_graphic() || b == b' ' {
                        write!(f, "{}", b as char)?;
                    } else {
                        write!(f, "\\x{b:02x}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
