use core::{convert::Infallible, net::SocketAddrV4, num::NonZero, time::Duration};

use ov6_types::{fs::RawFd, process::ProcId};

use crate::{
    OpenFlags, Register, RegisterDecodeError, RegisterValue, SocketAddrV4Pod, Stat,
    UserMutRef, UserMutSlice, UserRef, UserSlice, WaitTarget, error::SyscallError,
};

impl<T, const N: usize> Register<T, N> {
    #[must_use]
    pub const fn new(a: [usize; N]) -> Self {
        Self {
            a,
            _phantom: core::marker::PhantomData,
        }
    }

    pub fn try_decode(self) -> Result<T, T::DecodeError>
    where
        T: RegisterValue<Repr = Self>,
    {
        T::try_decode(self)
    }
}

impl RegisterValue for () {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 0>;

    fn encode(self) -> Self::Repr {
        Register::new([])
    }

    fn try_decode(_repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        Ok(())
    }
}

impl RegisterValue for Infallible {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 0>;

    fn encode(self) -> Self::Repr {
        match self {}
    }

    fn try_decode(_repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        Err(RegisterDecodeError::UnexpectedZero)
    }
}

impl RegisterValue for usize {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        Register::new([self])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0] = repr.a;
        Ok(a0)
    }
}

impl RegisterValue for isize {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        #[allow(clippy::cast_sign_loss)]
        Register::new([self as usize])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0] = repr.a;
        #[allow(clippy::cast_possible_wrap)]
        Ok(a0 as Self)
    }
}

impl RegisterValue for bool {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        Register::new([usize::from(self)])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0] = repr.a;
        Ok(a0 != 0)
    }
}

impl RegisterValue for u16 {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        Register::new([usize::from(self)])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0] = repr.a;
        Ok(Self::try_from(a0)?)
    }
}

impl RegisterValue for u32 {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        Register::new([usize::try_from(self).unwrap()])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0] = repr.a;
        Ok(Self::try_from(a0)?)
    }
}

impl RegisterValue for u64 {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        Register::new([usize::try_from(self).unwrap_or(usize::MAX)])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0] = repr.a;
        Ok(a0 as Self)
    }
}

impl RegisterValue for i32 {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        #[allow(clippy::cast_sign_loss)]
        Register::new([self as usize])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0] = repr.a;
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        Ok(a0 as Self)
    }
}

impl RegisterValue for ProcId {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        Register::new([u32::from(self) as usize])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0] = repr.a;
        let n = u32::try_from(a0)?;
        let n = NonZero::new(n).ok_or(RegisterDecodeError::UnexpectedZero)?;
        Ok(Self::new(n))
    }
}

impl RegisterValue for RawFd {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        #[allow(clippy::cast_sign_loss)]
        Register::new([i32::from(self) as usize])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0] = repr.a;
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        Ok(Self::new(a0 as i32))
    }
}

impl RegisterValue for Duration {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 2>;

    fn encode(self) -> Self::Repr {
        let secs = usize::try_from(self.as_secs()).unwrap_or(usize::MAX);
        let nanos = self.subsec_nanos() as usize;
        Register::new([secs, nanos])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [secs, nanos] = repr.a;
        let nanos = u32::try_from(nanos)?;
        Ok(Self::new(secs as u64, nanos))
    }
}

impl RegisterValue for OpenFlags {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        Register::new([self.bits()])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [bits] = repr.a;
        Self::from_bits(bits).ok_or(RegisterDecodeError::InvalidOpenFlags(bits))
    }
}

impl RegisterValue for WaitTarget {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 2>;

    fn encode(self) -> Self::Repr {
        match self {
            Self::AnyProcess => Register::new([0, 0]),
            Self::Process(pid) => Register::new([1, u32::from(pid) as usize]),
        }
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [tag, pid] = repr.a;
        match tag {
            0 => Ok(Self::AnyProcess),
            1 => {
                let pid = NonZero::new(u32::try_from(pid)?)
                    .ok_or(RegisterDecodeError::UnexpectedZero)?;
                Ok(Self::Process(ProcId::new(pid)))
            }
            _ => Err(RegisterDecodeError::InvalidDesignator(tag)),
        }
    }
}

impl RegisterValue for SocketAddrV4 {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        let packed = (self.ip().to_bits() as usize) | ((self.port() as usize) << 32);
        Register::new([packed])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [packed] = repr.a;
        let addr = u32::try_from(packed & 0xffff_ffff)?;
        let port = u16::try_from((packed >> 32) & 0xffff)?;
        Ok(Self::new(core::net::Ipv4Addr::from_bits(addr), port))
    }
}

impl<T> RegisterValue for UserRef<T>
where
    T: ?Sized + 'static,
{
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        Register::new([self.addr()])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [addr] = repr.a;
        Ok(Self {
            addr,
            _phantom: core::marker::PhantomData,
        })
    }
}

impl<T> RegisterValue for UserMutRef<T>
where
    T: ?Sized + 'static,
{
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 1>;

    fn encode(self) -> Self::Repr {
        Register::new([self.addr()])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [addr] = repr.a;
        Ok(Self {
            addr,
            _phantom: core::marker::PhantomData,
        })
    }
}

impl<T> RegisterValue for UserSlice<T> {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 2>;

    fn encode(self) -> Self::Repr {
        Register::new([self.addr(), self.len()])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [addr, len] = repr.a;
        // SAFETY: the slice is only ever dereferenced after `validate`.
        Ok(unsafe { Self::from_raw_parts(addr, len) })
    }
}

impl<T> RegisterValue for UserMutSlice<T> {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 2>;

    fn encode(self) -> Self::Repr {
        Register::new([self.addr(), self.len()])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [addr, len] = repr.a;
        // SAFETY: the slice is only ever dereferenced after `validate`.
        Ok(unsafe { Self::from_raw_parts(addr, len) })
    }
}

impl<A, const N: usize> RegisterValue for (A,)
where
    A: RegisterValue<Repr = Register<A, N>, DecodeError = RegisterDecodeError>,
{
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, N>;

    fn encode(self) -> Self::Repr {
        Register::new(self.0.encode().a)
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let a = A::try_decode(Register::new(repr.a))?;
        Ok((a,))
    }
}

/// Marker for values that can live in the single payload word of a 2-register
/// `Result<T, SyscallError>` return.
pub(crate) trait ResultPayload: Sized {
    fn to_word(self) -> usize;
    fn from_word(word: usize) -> Result<Self, RegisterDecodeError>;
}

impl ResultPayload for () {
    fn to_word(self) -> usize {
        0
    }

    fn from_word(_word: usize) -> Result<Self, RegisterDecodeError> {
        Ok(())
    }
}

impl ResultPayload for Infallible {
    fn to_word(self) -> usize {
        match self {}
    }

    fn from_word(_word: usize) -> Result<Self, RegisterDecodeError> {
        Err(RegisterDecodeError::UnexpectedZero)
    }
}

impl ResultPayload for usize {
    fn to_word(self) -> usize {
        self
    }

    fn from_word(word: usize) -> Result<Self, RegisterDecodeError> {
        Ok(word)
    }
}

impl ResultPayload for RawFd {
    fn to_word(self) -> usize {
        #[allow(clippy::cast_sign_loss)]
        {
            i32::from(self) as usize
        }
    }

    fn from_word(word: usize) -> Result<Self, RegisterDecodeError> {
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        Ok(Self::new(word as i32))
    }
}

impl ResultPayload for ProcId {
    fn to_word(self) -> usize {
        u32::from(self) as usize
    }

    fn from_word(word: usize) -> Result<Self, RegisterDecodeError> {
        let n = u32::try_from(word)?;
        let n = NonZero::new(n).ok_or(RegisterDecodeError::UnexpectedZero)?;
        Ok(Self::new(n))
    }
}

impl ResultPayload for Option<ProcId> {
    fn to_word(self) -> usize {
        self.map_or(0, |pid| u32::from(pid) as usize)
    }

    fn from_word(word: usize) -> Result<Self, RegisterDecodeError> {
        if word == 0 {
            return Ok(None);
        }
        Ok(Some(ProcId::from_word(word)?))
    }
}

impl<T> RegisterValue for Result<T, SyscallError>
where
    T: ResultPayload,
{
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 2>;

    fn encode(self) -> Self::Repr {
        match self {
            Ok(v) => Register::new([0, v.to_word()]),
            #[allow(clippy::cast_sign_loss)]
            Err(e) => Register::new([1, (e as isize) as usize]),
        }
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [tag, payload] = repr.a;
        match tag {
            0 => Ok(Ok(T::from_word(payload)?)),
            1 => {
                #[allow(clippy::cast_possible_wrap)]
                let errno = payload as isize;
                let err =
                    SyscallError::from_repr(errno).ok_or(RegisterDecodeError::InvalidSyscallErrorNo(errno))?;
                Ok(Err(err))
            }
            _ => Err(RegisterDecodeError::InvalidDesignator(tag)),
        }
    }
}

impl RegisterValue for (WaitTarget, UserMutRef<i32>) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 3>;

    fn encode(self) -> Self::Repr {
        let (target, status) = self;
        let [t0, t1] = target.encode().a;
        let [s0] = status.encode().a;
        Register::new([t0, t1, s0])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [t0, t1, s0] = repr.a;
        let target = WaitTarget::try_decode(Register::new([t0, t1]))?;
        let status = UserMutRef::try_decode(Register::new([s0]))?;
        Ok((target, status))
    }
}

impl RegisterValue for (RawFd, UserMutSlice<u8>) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 3>;

    fn encode(self) -> Self::Repr {
        let (fd, buf) = self;
        let [a0] = fd.encode().a;
        let [a1, a2] = buf.encode().a;
        Register::new([a0, a1, a2])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1, a2] = repr.a;
        let fd = RawFd::try_decode(Register::new([a0]))?;
        let buf = UserMutSlice::try_decode(Register::new([a1, a2]))?;
        Ok((fd, buf))
    }
}

impl RegisterValue for (RawFd, UserSlice<u8>) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 3>;

    fn encode(self) -> Self::Repr {
        let (fd, buf) = self;
        let [a0] = fd.encode().a;
        let [a1, a2] = buf.encode().a;
        Register::new([a0, a1, a2])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1, a2] = repr.a;
        let fd = RawFd::try_decode(Register::new([a0]))?;
        let buf = UserSlice::try_decode(Register::new([a1, a2]))?;
        Ok((fd, buf))
    }
}

impl RegisterValue for (RawFd, UserMutRef<Stat>) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 2>;

    fn encode(self) -> Self::Repr {
        let (fd, stat) = self;
        let [a0] = fd.encode().a;
        let [a1] = stat.encode().a;
        Register::new([a0, a1])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1] = repr.a;
        let fd = RawFd::try_decode(Register::new([a0]))?;
        let stat = UserMutRef::try_decode(Register::new([a1]))?;
        Ok((fd, stat))
    }
}

impl RegisterValue for (UserSlice<u8>, OpenFlags) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 3>;

    fn encode(self) -> Self::Repr {
        let (path, flags) = self;
        let [a0, a1] = path.encode().a;
        let [a2] = flags.encode().a;
        Register::new([a0, a1, a2])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1, a2] = repr.a;
        let path = UserSlice::try_decode(Register::new([a0, a1]))?;
        let flags = OpenFlags::try_decode(Register::new([a2]))?;
        Ok((path, flags))
    }
}

impl RegisterValue for (UserSlice<u8>, u32, u16) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 4>;

    fn encode(self) -> Self::Repr {
        let (path, major, minor) = self;
        let [a0, a1] = path.encode().a;
        let [a2] = major.encode().a;
        let [a3] = minor.encode().a;
        Register::new([a0, a1, a2, a3])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1, a2, a3] = repr.a;
        let path = UserSlice::try_decode(Register::new([a0, a1]))?;
        let major = u32::try_decode(Register::new([a2]))?;
        let minor = u16::try_decode(Register::new([a3]))?;
        Ok((path, major, minor))
    }
}

impl RegisterValue for (UserSlice<u8>, UserSlice<u8>) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 4>;

    fn encode(self) -> Self::Repr {
        let (old, new) = self;
        let [a0, a1] = old.encode().a;
        let [a2, a3] = new.encode().a;
        Register::new([a0, a1, a2, a3])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1, a2, a3] = repr.a;
        let old = UserSlice::try_decode(Register::new([a0, a1]))?;
        let new = UserSlice::try_decode(Register::new([a2, a3]))?;
        Ok((old, new))
    }
}

impl RegisterValue for (UserSlice<u8>, UserSlice<UserSlice<u8>>) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 4>;

    fn encode(self) -> Self::Repr {
        let (path, argv) = self;
        let [a0, a1] = path.encode().a;
        let [a2, a3] = argv.encode().a;
        Register::new([a0, a1, a2, a3])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1, a2, a3] = repr.a;
        let path = UserSlice::try_decode(Register::new([a0, a1]))?;
        let argv = UserSlice::try_decode(Register::new([a2, a3]))?;
        Ok((path, argv))
    }
}

impl RegisterValue for (Duration, UserRef<extern "C" fn() -> ()>) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 3>;

    fn encode(self) -> Self::Repr {
        let (dur, handler) = self;
        let [a0, a1] = dur.encode().a;
        let [a2] = handler.encode().a;
        Register::new([a0, a1, a2])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1, a2] = repr.a;
        let dur = Duration::try_decode(Register::new([a0, a1]))?;
        let handler = UserRef::try_decode(Register::new([a2]))?;
        Ok((dur, handler))
    }
}

impl RegisterValue for (u16, UserMutRef<SocketAddrV4Pod>, UserMutSlice<u8>) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 4>;

    fn encode(self) -> Self::Repr {
        let (port, src, buf) = self;
        let [a0] = port.encode().a;
        let [a1] = src.encode().a;
        let [a2, a3] = buf.encode().a;
        Register::new([a0, a1, a2, a3])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1, a2, a3] = repr.a;
        let port = u16::try_decode(Register::new([a0]))?;
        let src = UserMutRef::try_decode(Register::new([a1]))?;
        let buf = UserMutSlice::try_decode(Register::new([a2, a3]))?;
        Ok((port, src, buf))
    }
}

impl RegisterValue for (u16, SocketAddrV4, UserSlice<u8>) {
    type DecodeError = RegisterDecodeError;
    type Repr = Register<Self, 4>;

    fn encode(self) -> Self::Repr {
        let (port, dst, buf) = self;
        let [a0] = port.encode().a;
        let [a1] = dst.encode().a;
        let [a2, a3] = buf.encode().a;
        Register::new([a0, a1, a2, a3])
    }

    fn try_decode(repr: Self::Repr) -> Result<Self, Self::DecodeError> {
        let [a0, a1, a2, a3] = repr.a;
        let port = u16::try_decode(Register::new([a0]))?;
        let dst = SocketAddrV4::try_decode(Register::new([a1]))?;
        let buf = UserSlice::try_decode(Register::new([a2, a3]))?;
        Ok((port, dst, buf))
    }
}
