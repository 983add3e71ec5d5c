use core::{fmt, mem};

use crate::os_str::OsStr;

const SEP: u8 = b'/';

/// Borrowed filesystem path, backed by raw bytes with `/` as the only
/// separator understood.
#[repr(transparent)]
#[derive(PartialEq, Eq, Hash)]
pub struct Path {
    inner: OsStr,
}

impl Path {
    #[must_use]
    pub fn new<S: AsRef<OsStr> + ?Sized>(s: &S) -> &Self {
        Self::from_inner(s.as_ref())
    }

    fn from_inner(s: &OsStr) -> &Self {
        // SAFETY: Path is repr(transparent) over OsStr.
        unsafe { mem::transmute::<&OsStr, &Self>(s) }
    }

    #[must_use]
    pub fn as_os_str(&self) -> &OsStr {
        &self.inner
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.inner.as_bytes().first() == Some(&SEP)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn components(&self) -> Components<'_> {
        Components {
            bytes: self.inner.as_bytes(),
            front_done: false,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&OsStr> {
        self.components().filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        }).last()
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        let bytes = self.inner.as_bytes();
        let end = bytes.iter().rposition(|&b| b != SEP)?;
        let trimmed = &bytes[..=end];
        let cut = trimmed.iter().rposition(|&b| b == SEP)?;
        if cut == 0 {
            Some(Self::from_inner(OsStr::from_bytes(&bytes[..1])))
        } else {
            Some(Self::from_inner(OsStr::from_bytes(&bytes[..cut])))
        }
    }

    #[must_use]
    pub fn display(&self) -> crate::os_str::Display<'_> {
        self.inner.display()
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl AsRef<Path> for str {
    fn as_ref(&self) -> &Path {
        Path::new(self)
    }
}

impl AsRef<Path> for OsStr {
    fn as_ref(&self) -> &Path {
        Path::new(self)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

/// One element of a parsed path, as produced by [`Path::components`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component<'a> {
    RootDir,
    CurDir,
    ParentDir,
    Normal(&'a OsStr),
}

impl<'a> Component<'a> {
    #[must_use]
    pub fn as_os_str(self) -> &'a OsStr {
        match self {
            Self::RootDir => OsStr::from_bytes(&[SEP]),
            Self::CurDir => OsStr::from_bytes(b"."),
            Self::ParentDir => OsStr::from_bytes(b".."),
            Self::Normal(s) => s,
        }
    }
}

/// Iterator over the [`Component`]s of a [`Path`], yielded front-to-back.
#[derive(Debug, Clone)]
pub struct Components<'a> {
    bytes: &'a [u8],
    front_done: bool,
}

impl<'a> Iterator for Components<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.front_done && self.bytes.first() == Some(&SEP) {
            self.front_done = true;
            self.bytes = &self.bytes[1..];
            return Some(Component::RootDir);
        }
        self.front_done = true;

        while self.bytes.first() == Some(&SEP) {
            self.bytes = &self.bytes[1..];
        }
        if self.bytes.is_empty() {
            return None;
        }

        let end = self
            .bytes
            .iter()
            .position(|&b| b == SEP)
            .unwrap_or(self.bytes.len());
        let (comp, rest) = self.bytes.split_at(end);
        self.bytes = rest;

        Some(match comp {
            b"." => Component::CurDir,
            b".." => Component::ParentDir,
            name => Component::Normal(OsStr::from_bytes(name)),
        })
    }
}
