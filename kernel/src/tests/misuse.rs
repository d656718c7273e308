//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

// 测试：误用
//
// 误用返回错误，且 owner / lock_count 保持不变

use super::mock::{leak, MockScheduler};
use crate::errno::Errno;
use crate::sched::MAX_DELAY;
use crate::sync::LwMutex;

#[test]
fn test_give_unlocked() {
    let sched = MockScheduler::new(&[1]);
    sched.run_as(1);
    let mutex = leak(LwMutex::new());

    assert_eq!(mutex.give(sched), Err(Errno::InvalidArgument));
    assert_eq!(mutex.owner(), None);
    assert_eq!(mutex.lock_count(), 0);
}

#[test]
fn test_give_by_non_owner() {
    let sched = MockScheduler::new(&[1, 1]);
    sched.run_as(1);
    let mutex = leak(LwMutex::new());

    mutex.take(sched, MAX_DELAY).unwrap();
    mutex.take(sched, MAX_DELAY).unwrap();

    let other = sched.spawn(2, move |sched| mutex.give(sched));
    assert_eq!(other.join().unwrap(), Err(Errno::OperationNotPermitted));
    assert_eq!(mutex.owner(), Some(sched.task(1)));
    assert_eq!(mutex.lock_count(), 2);

    mutex.give(sched).unwrap();
    mutex.give(sched).unwrap();
    assert!(!mutex.is_locked());
}

#[test]
fn test_take_while_suspended() {
    let sched = MockScheduler::new(&[1]);
    sched.run_as(1);
    let mutex = leak(LwMutex::new());

    sched.set_suspended(true);
    assert_eq!(mutex.take(sched, 10), Err(Errno::TryAgain));
    assert_eq!(mutex.take(sched, MAX_DELAY), Err(Errno::TryAgain));
    assert!(!mutex.is_locked());

    // 不等待的请求不受影响
    assert_eq!(mutex.try_take(sched), Ok(()));

    // 挂起期间不能释放
    assert_eq!(mutex.give(sched), Err(Errno::TryAgain));
    assert_eq!(mutex.lock_count(), 1);

    sched.set_suspended(false);
    assert_eq!(mutex.give(sched), Ok(()));
}

#[test]
fn test_zero_wait_on_held_mutex() {
    let sched = MockScheduler::new(&[1, 3]);
    sched.run_as(1);
    let mutex = leak(LwMutex::new());
    mutex.take(sched, MAX_DELAY).unwrap();

    let other = sched.spawn(2, move |sched| mutex.take(sched, 0));
    assert_eq!(other.join().unwrap(), Err(Errno::TimedOut));
    assert_eq!(mutex.waiter_count(sched), 0);
    assert_eq!(mutex.owner(), Some(sched.task(1)));
    assert_eq!(mutex.lock_count(), 1);
}
