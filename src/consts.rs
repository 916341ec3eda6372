//! Injected platform constants.
//!
//! Numeric file-mode and open-flag values are platform-dependent (and, on
//! some platforms, differ between libc implementations). The core treats
//! them as an injected table rather than hard-coding them, mirroring how the
//! teacher crate treats block and inode layout as data (a [`SuperBlock`],
//! in the teacher's terms) rather than constants baked into the code.
//!
//! [`SuperBlock`]: https://docs.rs/bincode

/// A platform's file-mode and open-flag constants.
///
/// Two POSIX-family variants are provided ([`Constants::LINUX`] and
/// [`Constants::BSD`], which on most flag bits agree); callers pick the one
/// that matches the host the bridge is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constants {
    /// Directory type bit, as stored in `st_mode`.
    pub s_ifdir: u32,
    /// Regular file type bit, as stored in `st_mode`.
    pub s_ifreg: u32,
    /// Read-only access mode.
    pub o_rdonly: i32,
    /// Write-only access mode.
    pub o_wronly: i32,
    /// Read-write access mode.
    pub o_rdwr: i32,
    /// Mask isolating the access mode out of a flag word.
    pub o_accmode: i32,
    /// Append-on-every-write flag.
    pub o_append: i32,
    /// Create-if-missing flag.
    pub o_creat: i32,
    /// Fail-if-exists flag, only meaningful together with `o_creat`.
    pub o_excl: i32,
}

impl Constants {
    /// Flag/mode constants matching glibc on Linux.
    pub const LINUX: Constants = Constants {
        s_ifdir: 0o040000,
        s_ifreg: 0o100000,
        o_rdonly: 0o0,
        o_wronly: 0o1,
        o_rdwr: 0o2,
        o_accmode: 0o3,
        o_append: 0o2000,
        o_creat: 0o100,
        o_excl: 0o200,
    };

    /// Flag/mode constants matching the BSD/Darwin family.
    pub const BSD: Constants = Constants {
        s_ifdir: 0o040000,
        s_ifreg: 0o100000,
        o_rdonly: 0x0000,
        o_wronly: 0x0001,
        o_rdwr: 0x0002,
        o_accmode: 0x0003,
        o_append: 0x0008,
        o_creat: 0x0200,
        o_excl: 0x0800,
    };

    /// Extract the access-mode bits (`flag & O_ACCMODE`) from a raw flag word.
    pub fn access_mode(&self, flag: i32) -> i32 {
        flag & self.o_accmode
    }

    /// True if `flag` carries the given single-bit option (`O_APPEND`, `O_CREAT`, `O_EXCL`, ...).
    pub fn has_flag(&self, flag: i32, option: i32) -> bool {
        flag & option == option
    }

    /// Parse a textual `fopen`-style mode string (`"r"`, `"r+"`, `"w"`, `"w+"`,
    /// `"a"`, `"a+"`) into the equivalent numeric flag word. Returns `None` for
    /// an unrecognized string, matching the decoding table in the open-flag
    /// specification this crate implements.
    pub fn parse(&self, flag: &str) -> Option<i32> {
        let bits = match flag {
            "r" => self.o_rdonly,
            "r+" => self.o_rdwr,
            "w" => self.o_wronly | self.o_creat,
            "w+" => self.o_rdwr | self.o_creat,
            "a" => self.o_wronly | self.o_creat | self.o_append,
            "a+" => self.o_rdwr | self.o_creat | self.o_append,
            "wx" => self.o_wronly | self.o_creat | self.o_excl,
            "wx+" => self.o_rdwr | self.o_creat | self.o_excl,
            _ => return None,
        };
        Some(bits)
    }
}

impl Default for Constants {
    fn default() -> Constants {
        Constants::LINUX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_mode_extraction() {
        let c = Constants::LINUX;
        assert_eq!(c.access_mode(c.o_rdonly), c.o_rdonly);
        assert_eq!(c.access_mode(c.o_wronly | c.o_creat), c.o_wronly);
        assert_eq!(c.access_mode(c.o_rdwr | c.o_append), c.o_rdwr);
    }

    #[test]
    fn parse_textual_modes() {
        let c = Constants::LINUX;
        assert_eq!(c.parse("r"), Some(c.o_rdonly));
        assert_eq!(c.parse("w").map(|f| c.access_mode(f)), Some(c.o_wronly));
        assert!(c.has_flag(c.parse("w").unwrap(), c.o_creat));
        assert!(c.has_flag(c.parse("a").unwrap(), c.o_append));
        assert_eq!(c.parse("bogus"), None);
    }

    #[test]
    fn bsd_and_linux_agree_on_type_bits() {
        assert_eq!(Constants::LINUX.s_ifdir, Constants::BSD.s_ifdir);
        assert_eq!(Constants::LINUX.s_ifreg, Constants::BSD.s_ifreg);
    }
}
