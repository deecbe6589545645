// ==========================================
// 学籍管理系统 - 引用解析器
// ==========================================
// 阶段 3: 专业代码 → DepartmentRef
// 缓存: 仅缓存命中结果（读多写少，RwLock）；未命中不缓存，新增专业即时可见
// 约束: 锁不跨越 .await
// ==========================================

use crate::domain::student::DepartmentRef;
use crate::domain::types::ReferenceKind;
use crate::repository::department_repo::DepartmentLookup;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(DepartmentRef),
    Unresolved,
}

pub struct ReferenceResolver {
    lookup: Arc<dyn DepartmentLookup>,
    cache: RwLock<HashMap<String, DepartmentRef>>,
}

impl ReferenceResolver {
    pub fn new(lookup: Arc<dyn DepartmentLookup>) -> Self {
        Self {
            lookup,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn cache_key(text: &str) -> String {
        text.trim().to_uppercase()
    }

    fn cached(&self, key: &str) -> Option<DepartmentRef> {
        match self.cache.read() {
            Ok(cache) => cache.get(key).cloned(),
            Err(_) => None,
        }
    }

    fn remember(&self, key: String, value: DepartmentRef) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, value);
        }
    }

    /// 解析引用文本
    ///
    /// # 返回
    /// - None: 引用文本为空白（不查找，不产生警告）
    /// - Some(Resolved): 找到
    /// - Some(Unresolved): 未找到或查找失败
    pub async fn resolve(&self, reference_text: &str, kind: ReferenceKind) -> Option<Resolution> {
        let key = Self::cache_key(reference_text);
        if key.is_empty() {
            return None;
        }

        if let Some(hit) = self.cached(&key) {
            return Some(Resolution::Resolved(hit));
        }

        let looked_up = match kind {
            ReferenceKind::Department => self.lookup.lookup_department(reference_text.trim()).await,
        };

        let resolution = match looked_up {
            Ok(Some(found)) => {
                self.remember(key, found.clone());
                Resolution::Resolved(found)
            }
            Ok(None) => Resolution::Unresolved,
            Err(e) => {
                warn!(kind = %kind, code = %reference_text, error = %e, "引用查找失败，按未解析处理");
                Resolution::Unresolved
            }
        };

        Some(resolution)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}
