//! I/O priority hint.
//!
//! An `IoPriority` is attached to every dual-location handle and forwarded
//! unchanged to each filesystem primitive in `fs_ops`. Entity code never looks
//! at the value; only `scoped()` does.
//!
//! On Linux the hint maps onto `ioprio_set(IOPRIO_WHO_PROCESS, 0, ..)` for the
//! calling thread, and the previous priority is restored when the guard drops.
//! Other platforms accept the hint and do nothing with it.

use std::fmt;
use std::str::FromStr;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IoPriority {
    /// Leave the thread's current I/O priority alone.
    #[default]
    Inherit,
    /// Only get disk time when nobody else wants it.
    Idle,
    /// Best-effort class, lowest level.
    Low,
    /// Best-effort class, middle level.
    Normal,
    /// Best-effort class, highest level.
    High,
}

impl IoPriority {
    /// Parse common names (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inherit" | "default" | "" => Some(IoPriority::Inherit),
            "idle" => Some(IoPriority::Idle),
            "low" | "background" => Some(IoPriority::Low),
            "normal" => Some(IoPriority::Normal),
            "high" => Some(IoPriority::High),
            _ => None,
        }
    }
}

impl fmt::Display for IoPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IoPriority::Inherit => "inherit",
            IoPriority::Idle => "idle",
            IoPriority::Low => "low",
            IoPriority::Normal => "normal",
            IoPriority::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for IoPriority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid io priority: '{s}'"))
    }
}

/// RAII guard returned by `scoped`; restores the previous thread priority on drop.
pub struct PriorityGuard {
    #[cfg(target_os = "linux")]
    previous: Option<i32>,
}

impl Drop for PriorityGuard {
    fn drop(&mut self) {
        #[cfg(target_os = "linux")]
        if let Some(prev) = self.previous.take() {
            let _ = linux::set(prev);
        }
    }
}

/// Apply `hint` to the calling thread for the lifetime of the returned guard.
/// Failures to apply are logged at trace level and otherwise ignored.
pub fn scoped(hint: IoPriority) -> PriorityGuard {
    #[cfg(target_os = "linux")]
    {
        let Some(value) = linux::encode(hint) else {
            return PriorityGuard { previous: None };
        };
        let previous = match linux::get() {
            Ok(prev) if prev == value => None,
            Ok(prev) => match linux::set(value) {
                Ok(()) => {
                    trace!(%hint, "applied io priority");
                    Some(prev)
                }
                Err(e) => {
                    trace!(%hint, error = %e, "ioprio_set failed; continuing without hint");
                    None
                }
            },
            Err(e) => {
                trace!(%hint, error = %e, "ioprio_get failed; continuing without hint");
                None
            }
        };
        PriorityGuard { previous }
    }
    #[cfg(not(target_os = "linux"))]
    {
        trace!(%hint, "io priority hints are not supported on this platform");
        PriorityGuard {}
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use super::IoPriority;
    use std::io;

    const IOPRIO_WHO_PROCESS: libc::c_int = 1;
    const IOPRIO_CLASS_SHIFT: i32 = 13;
    const IOPRIO_CLASS_BE: i32 = 2;
    const IOPRIO_CLASS_IDLE: i32 = 3;

    pub(super) fn encode(hint: IoPriority) -> Option<i32> {
        let (class, level) = match hint {
            IoPriority::Inherit => return None,
            IoPriority::Idle => (IOPRIO_CLASS_IDLE, 0),
            IoPriority::Low => (IOPRIO_CLASS_BE, 7),
            IoPriority::Normal => (IOPRIO_CLASS_BE, 4),
            IoPriority::High => (IOPRIO_CLASS_BE, 0),
        };
        Some((class << IOPRIO_CLASS_SHIFT) | level)
    }

    pub(super) fn get() -> io::Result<i32> {
        let rc = unsafe { libc::syscall(libc::SYS_ioprio_get, IOPRIO_WHO_PROCESS, 0 as libc::c_int) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(rc as i32)
    }

    pub(super) fn set(value: i32) -> io::Result<()> {
        let rc = unsafe {
            libc::syscall(
                libc::SYS_ioprio_set,
                IOPRIO_WHO_PROCESS,
                0 as libc::c_int,
                value as libc::c_int,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_names() {
        assert_eq!(IoPriority::parse("IDLE"), Some(IoPriority::Idle));
        assert_eq!(IoPriority::parse(" high "), Some(IoPriority::High));
        assert_eq!(IoPriority::parse("background"), Some(IoPriority::Low));
        assert_eq!(IoPriority::parse("default"), Some(IoPriority::Inherit));
        assert!(IoPriority::parse("urgent").is_none());
        assert!("nope".parse::<IoPriority>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for p in [
            IoPriority::Inherit,
            IoPriority::Idle,
            IoPriority::Low,
            IoPriority::Normal,
            IoPriority::High,
        ] {
            assert_eq!(p.to_string().parse::<IoPriority>().unwrap(), p);
        }
    }

    #[test]
    fn scoped_guard_is_harmless() {
        // Low priority never needs privileges; the guard must not panic either way.
        let _g = scoped(IoPriority::Low);
        let _h = scoped(IoPriority::Inherit);
    }
}
