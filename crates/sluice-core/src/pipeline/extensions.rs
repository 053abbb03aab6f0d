use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// 上下文附带的类型安全属性表。
///
/// # 设计背景（Why）
/// - Handler 之间经常需要共享少量连接级状态（协商结果、统计钩子），
///   以 `TypeId` 为键可避免字符串键的拼写漂移与类型混淆。
///
/// # 契约说明（What）
/// - 值以 `Arc` 存取：读取返回共享句柄而非借用，调用方可跨回调
///   保留；
/// - 同一类型只保留一个值，`insert` 返回被替换的旧值。
pub struct Attributes {
    map: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Attributes {
    pub(crate) fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// 存入属性，返回同类型的旧值。
    pub fn insert<T: Any + Send + Sync>(&self, value: T) -> Option<Arc<T>> {
        self.map
            .write()
            .insert(TypeId::of::<T>(), Arc::new(value))
            .and_then(|old| old.downcast::<T>().ok())
    }

    /// 读取属性的共享句柄。
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.map
            .read()
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// 移除属性并返回其句柄。
    pub fn remove<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.map
            .write()
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// 是否存在该类型的属性。
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.map.read().contains_key(&TypeId::of::<T>())
    }

    /// 清空属性表。
    pub fn clear(&self) {
        self.map.write().clear();
    }
}
