//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 按优先级排序的侵入式双向链表
//!
//! 参考 Linux: include/linux/list.h，以及 plist (include/linux/plist.h)
//!
//! 用途：
//! - 互斥锁等待队列: 节点位于等待任务的栈上
//! - 任务持有链表: 节点嵌入在互斥锁中，挂到持有者的 TCB 上
//!
//! 设计特点：
//! - 侵入式链表：节点直接嵌入数据结构中，不需要分配内存
//! - 按 `value` 降序排列，值相同的按插入顺序 (FIFO)
//! - 头部始终是最大值，O(1) 取得
//! - 链表头可以用 `const fn` 构造，适合放在 static 中
//!
//! 所有修改操作都是 `unsafe` 的：调用者必须处于临界区内，并保证节点在
//! 挂在链表上期间不会移动或销毁。

use core::cell::Cell;
use core::ptr;

use crate::sched::Priority;

/// 链表节点
///
/// `owner` 是节点所属对象的信息（关系，不是所有权）。
pub struct ListItem<T> {
    /// 下一个节点
    next: Cell<*const ListItem<T>>,
    /// 前一个节点
    prev: Cell<*const ListItem<T>>,
    /// 排序键
    value: Cell<Priority>,
    /// 当前所在的链表，未挂入时为空
    container: Cell<*const SortedList<T>>,
    owner: T,
}

impl<T> ListItem<T> {
    /// 创建一个未挂入任何链表的节点
    pub const fn new(owner: T) -> Self {
        Self {
            next: Cell::new(ptr::null()),
            prev: Cell::new(ptr::null()),
            value: Cell::new(0),
            container: Cell::new(ptr::null()),
            owner,
        }
    }

    pub fn owner(&self) -> &T {
        &self.owner
    }

    pub fn value(&self) -> Priority {
        self.value.get()
    }

    /// 设置排序键
    ///
    /// 只能在节点未挂入链表时调用，否则会破坏排序。
    pub fn set_value(&self, value: Priority) {
        debug_assert!(!self.is_linked(), "ListItem::set_value on linked item");
        self.value.set(value);
    }

    /// 检查节点是否在某个链表中
    pub fn is_linked(&self) -> bool {
        !self.container.get().is_null()
    }

    /// 检查节点是否在指定链表中
    pub fn is_linked_to(&self, list: &SortedList<T>) -> bool {
        ptr::eq(self.container.get(), list)
    }

    /// 当前所在的链表
    pub fn container(&self) -> *const SortedList<T> {
        self.container.get()
    }
}

/// 链表头
pub struct SortedList<T> {
    head: Cell<*const ListItem<T>>,
    tail: Cell<*const ListItem<T>>,
    len: Cell<usize>,
}

impl<T> SortedList<T> {
    /// 创建一个空链表
    pub const fn new() -> Self {
        Self {
            head: Cell::new(ptr::null()),
            tail: Cell::new(ptr::null()),
            len: Cell::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.len.get()
    }

    pub fn is_empty(&self) -> bool {
        self.head.get().is_null()
    }

    /// 头部节点的排序键（最大值）
    pub fn head_value(&self) -> Option<Priority> {
        // SAFETY: 挂在链表上的节点在摘除之前都有效
        unsafe { self.head.get().as_ref().map(|item| item.value()) }
    }

    /// 获取第一个节点
    ///
    /// # Safety
    /// 返回的引用只在节点仍挂在链表上期间有效
    pub unsafe fn first<'a>(&self) -> Option<&'a ListItem<T>> {
        self.head.get().as_ref()
    }

    /// 按 `value` 降序插入节点，相同值插在已有节点之后
    ///
    /// # Safety
    /// - 调用者处于临界区内
    /// - `item` 未挂入任何链表，并且在摘除前不会移动或销毁
    pub unsafe fn insert(&self, item: &ListItem<T>) {
        debug_assert!(!item.is_linked(), "SortedList::insert on linked item");

        let value = item.value();

        // 找到第一个比 item 小的节点，插在它前面
        let mut pos = self.head.get();
        while let Some(cur) = pos.as_ref() {
            if cur.value() < value {
                break;
            }
            pos = cur.next.get();
        }

        let item_ptr: *const ListItem<T> = item;
        let prev = match pos.as_ref() {
            Some(next) => next.prev.get(),
            None => self.tail.get(),
        };

        item.next.set(pos);
        item.prev.set(prev);

        match prev.as_ref() {
            Some(prev) => prev.next.set(item_ptr),
            None => self.head.set(item_ptr),
        }
        match pos.as_ref() {
            Some(next) => next.prev.set(item_ptr),
            None => self.tail.set(item_ptr),
        }

        item.container.set(self);
        self.len.set(self.len.get() + 1);
    }

    /// 从链表中删除节点
    ///
    /// # Safety
    /// - 调用者处于临界区内
    /// - `item` 挂在本链表上
    pub unsafe fn remove(&self, item: &ListItem<T>) {
        debug_assert!(item.is_linked_to(self), "SortedList::remove on foreign item");

        let next = item.next.get();
        let prev = item.prev.get();

        match prev.as_ref() {
            Some(prev) => prev.next.set(next),
            None => self.head.set(next),
        }
        match next.as_ref() {
            Some(next) => next.prev.set(prev),
            None => self.tail.set(prev),
        }

        item.next.set(ptr::null());
        item.prev.set(ptr::null());
        item.container.set(ptr::null());
        self.len.set(self.len.get() - 1);
    }

    /// 摘下头部节点
    ///
    /// # Safety
    /// 同 [`SortedList::remove`]
    pub unsafe fn pop_front<'a>(&self) -> Option<&'a ListItem<T>> {
        let item = self.first()?;
        self.remove(item);
        Some(item)
    }

    /// 按顺序遍历链表
    ///
    /// # Safety
    /// 调用者处于临界区内，并且 `f` 不修改链表
    pub unsafe fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&ListItem<T>),
    {
        let mut pos = self.head.get();
        while let Some(item) = pos.as_ref() {
            let next = item.next.get();
            f(item);
            pos = next;
        }
    }
}

impl<T> Default for SortedList<T> {
    fn default() -> Self {
        Self::new()
    }
}
