//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 互斥锁错误代码
//!
//! 取值和 include/uapi/asm-generic/errno.h 一致，C 接口直接返回负数

use core::fmt;

/// 互斥锁操作的错误代码
///
/// 使用方法：
/// ```rust
/// use lwmutex::errno::Errno;
///
/// fn give() -> Result<(), Errno> {
///     Err(Errno::OperationNotPermitted)
/// }
///
/// assert_eq!(give().unwrap_err().as_neg_i32(), -1);
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// Operation not permitted (EPERM, 1)
    ///
    /// 释放不属于自己的互斥锁
    OperationNotPermitted = 1,

    /// Try again (EAGAIN, 11)
    ///
    /// 调度器已挂起，无法阻塞
    TryAgain = 11,

    /// Invalid argument (EINVAL, 22)
    ///
    /// 空句柄，或者释放未加锁的互斥锁
    InvalidArgument = 22,

    /// Value too large (EOVERFLOW, 75)
    ///
    /// 递归加锁超过 MAX_LOCK_COUNT
    ValueOverflow = 75,

    /// Connection timed out (ETIMEDOUT, 110)
    ///
    /// 等待超时，不属于误用
    TimedOut = 110,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值（用于 C 接口返回）
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }

    /// 是否为调用者误用（超时除外）
    pub const fn is_misuse(self) -> bool {
        !matches!(self, Errno::TimedOut)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Errno::OperationNotPermitted => "mutex is owned by another task",
            Errno::TryAgain => "scheduler is suspended",
            Errno::InvalidArgument => "mutex is not locked",
            Errno::ValueOverflow => "recursive lock depth exceeded",
            Errno::TimedOut => "timed out waiting for mutex",
        };
        f.write_str(msg)
    }
}

/// 常用的错误代码常量
pub mod constants {
    pub const EPERM: i32 = 1;
    pub const EAGAIN: i32 = 11;
    pub const EINVAL: i32 = 22;
    pub const EOVERFLOW: i32 = 75;
    pub const ETIMEDOUT: i32 = 110;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_values() {
        assert_eq!(Errno::OperationNotPermitted.as_i32(), constants::EPERM);
        assert_eq!(Errno::TryAgain.as_i32(), constants::EAGAIN);
        assert_eq!(Errno::InvalidArgument.as_i32(), constants::EINVAL);
        assert_eq!(Errno::ValueOverflow.as_i32(), constants::EOVERFLOW);
        assert_eq!(Errno::TimedOut.as_i32(), constants::ETIMEDOUT);
    }

    #[test]
    fn test_errno_negative() {
        assert_eq!(Errno::OperationNotPermitted.as_neg_i32(), -1);
        assert_eq!(Errno::TimedOut.as_neg_i32(), -110);
    }

    #[test]
    fn test_timeout_is_not_misuse() {
        assert!(!Errno::TimedOut.is_misuse());
        assert!(Errno::InvalidArgument.is_misuse());
        assert!(Errno::OperationNotPermitted.is_misuse());
    }
}
