//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 优先级天花板 (Immediate Priority Ceiling Protocol)
//!
//! 任务获取天花板互斥锁时，如果基础优先级低于天花板，立即提升到天花板；
//! 释放时恢复到仍持有的最高天花板，或者基础优先级。
//!
//! 每个任务的 TCB 中有一个 [`HolderList`]，记录它当前持有的、天花板高于
//! 其基础优先级的互斥锁。链表节点嵌入在互斥锁中，按天花板降序排列，
//! 因此"下一个最高天花板"就是链表头。
//!
//! 例：基础优先级 1，依次获取天花板 5、9、3 的锁
//! ```text
//! take(5)  holders: [5]        priority 5
//! take(9)  holders: [9, 5]     priority 9
//! take(3)  holders: [9, 5, 3]  priority 9
//! give(9)  holders: [5, 3]     priority 5
//! give(3)  holders: [5]        priority 5
//! give(5)  holders: []         priority 1
//! ```
//!
//! 所有函数都必须在临界区内调用。

use core::cell::Cell;
use core::ptr;

use super::lw_mutex::LwMutex;
use crate::list::{ListItem, SortedList};
use crate::sched::{Priority, Scheduler, TaskHandle};

/// 持有链表节点的反向引用
///
/// 节点属于互斥锁，挂在持有者的链表上期间记录两端的关系。
pub struct HolderLink {
    mutex: Cell<*const LwMutex>,
    task: Cell<Option<TaskHandle>>,
}

impl HolderLink {
    pub(crate) const fn new() -> Self {
        Self {
            mutex: Cell::new(ptr::null()),
            task: Cell::new(None),
        }
    }

    /// 持有者，节点未挂入时为 None
    pub fn task(&self) -> Option<TaskHandle> {
        self.task.get()
    }
}

pub(crate) type HolderItem = ListItem<HolderLink>;

/// 任务持有的天花板互斥锁链表
///
/// 由调度器嵌入到 TCB 中，通过 [`Scheduler::holder_list`] 提供给互斥锁。
pub struct HolderList {
    list: SortedList<HolderLink>,
}

// SAFETY: 链表只在临界区内修改
unsafe impl Sync for HolderList {}
unsafe impl Send for HolderList {}

impl HolderList {
    pub const fn new() -> Self {
        Self {
            list: SortedList::new(),
        }
    }

    /// 持有的天花板互斥锁数量
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// 持有的最高天花板
    pub fn highest_ceiling(&self) -> Option<Priority> {
        self.list.head_value()
    }

    /// 按天花板降序遍历持有的互斥锁
    ///
    /// # Safety
    /// 调用者处于临界区内，`f` 不能获取或释放互斥锁
    pub unsafe fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&LwMutex),
    {
        self.list.for_each(|item| {
            if let Some(mutex) = item.owner().mutex.get().as_ref() {
                f(mutex);
            }
        });
    }
}

impl Default for HolderList {
    fn default() -> Self {
        Self::new()
    }
}

/// 任务成为持有者（lock_count 0 -> 1）后调用
///
/// # Safety
/// 调用者处于临界区内，`task` 是 `mutex` 的新持有者
pub(crate) unsafe fn inherit<S: Scheduler + ?Sized>(
    sched: &S,
    mutex: &'static LwMutex,
    task: TaskHandle,
) {
    let Some(ceiling) = mutex.ceiling() else {
        return;
    };

    // 天花板不高于基础优先级时不需要记录
    if sched.base_priority(task) >= ceiling {
        return;
    }

    let item = mutex.holder_item();
    debug_assert!(!item.is_linked(), "ceiling: holder item already linked");

    let link = item.owner();
    link.mutex.set(mutex);
    link.task.set(Some(task));
    item.set_value(ceiling);
    sched.holder_list(task).list.insert(item);

    let current = sched.priority(task);
    if current < ceiling {
        sched.set_priority(task, ceiling);
        log::debug!("ceiling: {:?} raised {} -> {}", task, current, ceiling);
    }
}

/// 持有者释放（lock_count 1 -> 0）前调用
///
/// # Safety
/// 调用者处于临界区内，`task` 是 `mutex` 的持有者
pub(crate) unsafe fn disinherit<S: Scheduler + ?Sized>(
    sched: &S,
    mutex: &LwMutex,
    task: TaskHandle,
) {
    let Some(ceiling) = mutex.ceiling() else {
        return;
    };

    let item = mutex.holder_item();
    if !item.is_linked() {
        return;
    }

    let holders = sched.holder_list(task);
    debug_assert!(item.is_linked_to(&holders.list), "ceiling: holder item on foreign list");
    holders.list.remove(item);
    item.owner().task.set(None);

    // 只有这把锁决定了当前优先级时才需要恢复；更高的天花板仍然生效时不变
    let current = sched.priority(task);
    if current != ceiling {
        return;
    }

    let restore = holders
        .highest_ceiling()
        .unwrap_or_else(|| sched.base_priority(task));
    if restore != current {
        sched.set_priority(task, restore);
        log::debug!("ceiling: {:?} restored {} -> {}", task, current, restore);
    }
}

/// 把互斥锁的节点从所在的持有链表中摘除，不调整优先级
///
/// # Safety
/// 调用者处于临界区内
pub(crate) unsafe fn unlink(mutex: &LwMutex) {
    let item = mutex.holder_item();
    if let Some(list) = item.container().as_ref() {
        list.remove(item);
        item.owner().task.set(None);
    }
}
