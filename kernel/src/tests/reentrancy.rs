//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

// 测试：快速路径与递归加锁
//
// 测试内容：
// 1. 无竞争加锁设置 owner / lock_count
// 2. 递归加锁每次计数加一，释放每次减一
// 3. 计数归零前其他任务无法获取
// 4. 递归深度上限
// 5. RAII 守护与运行时初始化

use super::mock::{leak, MockScheduler};
use crate::config::MAX_LOCK_COUNT;
use crate::errno::Errno;
use crate::sched::MAX_DELAY;
use crate::sync::LwMutex;

#[test]
fn test_fast_path_sets_owner() {
    let sched = MockScheduler::new(&[1]);
    sched.run_as(1);
    let mutex = leak(LwMutex::new());

    assert!(!mutex.is_locked());
    assert_eq!(mutex.take(sched, MAX_DELAY), Ok(()));
    assert_eq!(mutex.owner(), Some(sched.task(1)));
    assert_eq!(mutex.lock_count(), 1);

    assert_eq!(mutex.give(sched), Ok(()));
    assert_eq!(mutex.owner(), None);
    assert_eq!(mutex.lock_count(), 0);
}

#[test]
fn test_recursive_take_counts() {
    let sched = MockScheduler::new(&[1, 1]);
    sched.run_as(1);
    let mutex = leak(LwMutex::new());

    for depth in 1..=3 {
        assert_eq!(mutex.take(sched, MAX_DELAY), Ok(()));
        assert_eq!(mutex.lock_count(), depth);
    }

    // 嵌套持有期间其他任务拿不到
    let other = sched.spawn(2, move |sched| mutex.try_take(sched));
    assert_eq!(other.join().unwrap(), Err(Errno::TimedOut));
    assert_eq!(mutex.lock_count(), 3);

    assert_eq!(mutex.give(sched), Ok(()));
    assert_eq!(mutex.give(sched), Ok(()));
    assert_eq!(mutex.lock_count(), 1);
    assert_eq!(mutex.owner(), Some(sched.task(1)));

    assert_eq!(mutex.give(sched), Ok(()));
    assert!(!mutex.is_locked());

    let other = sched.spawn(2, move |sched| {
        let result = mutex.try_take(sched);
        let _ = mutex.give(sched);
        result
    });
    assert_eq!(other.join().unwrap(), Ok(()));
}

#[test]
fn test_recursive_depth_limit() {
    let sched = MockScheduler::new(&[1]);
    sched.run_as(1);
    let mutex = leak(LwMutex::new());

    for _ in 0..MAX_LOCK_COUNT {
        assert_eq!(mutex.try_take(sched), Ok(()));
    }
    assert_eq!(mutex.try_take(sched), Err(Errno::ValueOverflow));
    assert_eq!(mutex.lock_count(), MAX_LOCK_COUNT);

    for _ in 0..MAX_LOCK_COUNT {
        assert_eq!(mutex.give(sched), Ok(()));
    }
    assert!(!mutex.is_locked());
}

#[test]
fn test_guard_releases_on_drop() {
    let sched = MockScheduler::new(&[1]);
    sched.run_as(1);
    let mutex = leak(LwMutex::new());

    {
        let guard = mutex.lock(sched).unwrap();
        assert!(core::ptr::eq(guard.mutex(), mutex));
        assert_eq!(mutex.lock_count(), 1);

        let _nested = mutex.lock(sched).unwrap();
        assert_eq!(mutex.lock_count(), 2);
    }

    assert!(!mutex.is_locked());
    assert_eq!(mutex.lock_count(), 0);
}

#[test]
fn test_init_resets_idle_mutex() {
    let sched = MockScheduler::new(&[1]);
    sched.run_as(1);
    let mutex = leak(LwMutex::with_ceiling(4));

    mutex.take(sched, MAX_DELAY).unwrap();
    mutex.give(sched).unwrap();
    mutex.init();

    assert!(!mutex.is_locked());
    assert_eq!(mutex.ceiling(), Some(4));
    assert_eq!(mutex.waiter_count(sched), 0);
}
