//! 触发器评估
//!
//! 纯函数：根据触发类型读取计数器并与阈值做 `>=` 比较。
//! 目录数据异常（未知类型、非正阈值）时一律判定为不满足并记录告警，不抛出错误。

use tracing::warn;

use crate::models::{TriggerKind, UserCounters};

/// 触发器评估器
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerEvaluator;

impl TriggerEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// 判断计数器是否满足徽章的触发条件
    pub fn qualifies(
        &self,
        kind: &TriggerKind,
        threshold: Option<i32>,
        counters: &UserCounters,
    ) -> bool {
        if kind.is_manual() {
            return false;
        }

        let Some(threshold) = threshold else {
            return false;
        };

        if threshold <= 0 {
            warn!(trigger_kind = %kind, threshold, "徽章阈值非正，按不满足处理");
            return false;
        }

        match counters.get(kind) {
            Some(value) => value >= i64::from(threshold),
            None => {
                if let TriggerKind::Unknown(raw) = kind {
                    warn!(trigger_kind = %raw, "未知的触发类型，按不满足处理");
                }
                false
            }
        }
    }
}
