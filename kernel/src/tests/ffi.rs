//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

// 测试：C 接口
//
// 调度器只能注册一次，所以全部检查放在一个测试里。

use core::ffi::c_void;
use core::mem::{align_of, size_of};
use core::ptr;

use super::mock::MockScheduler;
use crate::ffi::*;
use crate::sched::MAX_DELAY;
use crate::sync::LwMutex;

#[test]
fn test_ffi_roundtrip() {
    let sched = MockScheduler::new(&[1]);
    sched.run_as(1);
    assert!(register_scheduler(sched));
    assert!(!register_scheduler(sched));

    assert_eq!(size_of::<LightWeightMutex_t>(), LW_MUTEX_SIZE);
    assert_eq!(align_of::<LightWeightMutex_t>(), LW_MUTEX_ALIGN);
    assert!(size_of::<LwMutex>() <= LW_MUTEX_SIZE);

    let handle: *mut LightWeightMutex_t = Box::leak(Box::new(LightWeightMutex_t::zeroed()));
    let mutex = handle.cast::<LwMutex>();

    unsafe {
        assert_eq!(lightMutexGive(ptr::null_mut()), PD_FALSE);

        lightMutexInit(handle);
        assert_eq!((*mutex).ceiling(), None);
        assert!(!(*mutex).is_locked());

        assert_eq!(lightMutexInitCeiling(handle, 99), PD_FALSE);
        assert_eq!((*mutex).ceiling(), None);

        assert_eq!(lightMutexInitCeiling(handle, 4), PD_TRUE);
        assert_eq!(lightMutexTake(handle, MAX_DELAY), PD_TRUE);
        assert_eq!(lightMutexTake(handle, 0), PD_TRUE);
        assert_eq!(sched.priority_of(1), 4);
        assert_eq!((*mutex).lock_count(), 2);

        assert_eq!(lightMutexGive(handle), PD_TRUE);
        assert_eq!(lightMutexGive(handle), PD_TRUE);
        assert_eq!(sched.priority_of(1), 1);
        assert_eq!(lightMutexGive(handle), PD_FALSE);

        vRemoveMutexItemFromList(ptr::null_mut());

        assert_eq!(lightMutexTake(handle, 0), PD_TRUE);
        assert_eq!(sched.holders_of(1).len(), 1);
        vRemoveMutexItemFromList(handle as *mut c_void);
        assert!(sched.holders_of(1).is_empty());
        assert_eq!(lightMutexGive(handle), PD_TRUE);

        lightMutexInit(handle);
        assert_eq!((*mutex).ceiling(), None);
        assert!(!(*mutex).is_locked());
    }
}
