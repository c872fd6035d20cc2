use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Danger,
}

impl ToastKind {
    pub fn css(self) -> &'static str {
        match self {
            ToastKind::Info => "info",
            ToastKind::Success => "success",
            ToastKind::Warning => "warning",
            ToastKind::Danger => "danger",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ToastKind::Success => "bi-check-circle",
            ToastKind::Danger => "bi-exclamation-octagon",
            _ => "bi-info-circle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

/// Self-expiring notifications. Ids only exist so the stack can drop the right one.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastQueue {
    next_id: u64,
    lifetime: Duration,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new(lifetime: Duration) -> Self {
        Self { next_id: 0, lifetime, toasts: Vec::new() }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn set_lifetime(&mut self, lifetime: Duration) {
        self.lifetime = lifetime;
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.toasts.push(Toast { id: self.next_id, kind, message: message.into() });
        self.next_id
    }

    pub fn expire(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(Duration::from_millis(3200))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_expire() {
        let mut queue = ToastQueue::default();
        let first = queue.push(ToastKind::Success, "ok");
        let second = queue.push(ToastKind::Danger, "falhou");
        assert_eq!(queue.len(), 2);

        queue.expire(first);
        let remaining: Vec<_> = queue.iter().map(|t| t.id).collect();
        assert_eq!(remaining, vec![second]);
        assert_eq!(queue.lifetime(), Duration::from_millis(3200));
    }

    #[test]
    fn test_icons_follow_kind() {
        assert_eq!(ToastKind::Success.icon(), "bi-check-circle");
        assert_eq!(ToastKind::Danger.icon(), "bi-exclamation-octagon");
        assert_eq!(ToastKind::Warning.icon(), "bi-info-circle");
    }
}
