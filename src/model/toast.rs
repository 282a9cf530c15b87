//! 通知通道（toast）：仅用于告知用户，不属于数据契约

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
            ToastKind::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// 待显示的通知队列，UI每次处理完用户操作后取走
#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: VecDeque<Toast>,
}

impl ToastQueue {
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) {
        let toast = Toast { kind, message: message.into() };
        match kind {
            ToastKind::Error => tracing::error!("通知: {}", toast.message),
            ToastKind::Warning => tracing::warn!("通知: {}", toast.message),
            _ => tracing::info!("通知: {}", toast.message),
        }
        self.pending.push_back(toast);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Warning, message);
    }

    /// 取出全部待显示通知
    pub fn drain(&mut self) -> Vec<Toast> {
        self.pending.drain(..).collect()
    }

    /// 取出全部通知并合并为一条，供单行通知栏显示
    ///
    /// 消息按入队顺序以“；”连接；类型取最严重的一条（错误优先于警告），
    /// 都不是时取最后一条的类型。
    pub fn drain_merged(&mut self) -> Option<Toast> {
        let toasts = self.drain();
        let last_kind = toasts.last()?.kind;
        let kind = [ToastKind::Error, ToastKind::Warning]
            .into_iter()
            .find(|k| toasts.iter().any(|t| t.kind == *k))
            .unwrap_or(last_kind);
        let message = toasts
            .into_iter()
            .map(|t| t.message)
            .collect::<Vec<_>>()
            .join("；");
        Some(Toast { kind, message })
    }

    pub fn last(&self) -> Option<&Toast> {
        self.pending.back()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_keeps_order_and_empties() {
        let mut queue = ToastQueue::default();
        queue.success("一");
        queue.error("二");

        assert_eq!(queue.last().map(|t| t.kind), Some(ToastKind::Error));
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "一");
        assert_eq!(drained[1].kind, ToastKind::Error);
        assert!(queue.is_empty(), "取出后队列应为空");
    }

    #[test]
    fn test_drain_merged_keeps_every_message() {
        let mut queue = ToastQueue::default();
        assert!(queue.drain_merged().is_none(), "空队列不应产生通知");

        queue.error("图片载入失败");
        queue.success("图片已载入");
        let merged = queue.drain_merged().expect("应该合并出一条通知");
        assert_eq!(merged.kind, ToastKind::Error, "错误通知不应被后续成功通知覆盖");
        assert_eq!(merged.message, "图片载入失败；图片已载入");
        assert!(queue.is_empty());

        queue.info("提示");
        queue.success("完成");
        let merged = queue.drain_merged().unwrap();
        assert_eq!(merged.kind, ToastKind::Success, "无错误或警告时取最后一条的类型");

        queue.success("完成");
        queue.warning("翻译进行中");
        assert_eq!(queue.drain_merged().map(|t| t.kind), Some(ToastKind::Warning));
    }
}
