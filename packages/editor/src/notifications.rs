/// Fire-and-forget user notifications (toasts in a UI host)
pub trait Notifier {
    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

/// Routes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notification = "success", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(notification = "error", "{}", message);
    }
}
