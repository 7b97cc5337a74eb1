//! # Checkout Notification Seam
//!
//! The mail sender is an external collaborator: checkout hands it a
//! (subject, body, recipient) triple after the transaction commits and
//! moves on. A notification failure is logged and swallowed; it must
//! never block or fail an order that is already committed.

use tracing::warn;

/// Where checkout notifications go.
pub const ORDERS_INBOX: &str = "orders@arenda.example";

/// A checkout notification.
#[derive(Debug, Clone)]
pub struct CheckoutNotice {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}

/// Notification sink invoked post-commit at checkout.
///
/// Implementations may enqueue, send inline, or drop the notice; they
/// must not assume the caller handles their errors beyond logging.
pub trait CheckoutNotifier: Send + Sync {
    fn notify(&self, notice: &CheckoutNotice) -> Result<(), String>;
}

/// Default notifier: writes the notice to the log.
///
/// Stands in for a real mail sender in development and tests.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl CheckoutNotifier for LogNotifier {
    fn notify(&self, notice: &CheckoutNotice) -> Result<(), String> {
        tracing::info!(
            recipient = %notice.recipient,
            subject = %notice.subject,
            "Checkout notification:\n{}",
            notice.body
        );
        Ok(())
    }
}

/// Notifier that drops everything (tests that don't care).
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl CheckoutNotifier for NoopNotifier {
    fn notify(&self, _notice: &CheckoutNotice) -> Result<(), String> {
        Ok(())
    }
}

/// Delivers a notice, logging and swallowing any failure.
pub fn send_best_effort(notifier: &dyn CheckoutNotifier, notice: &CheckoutNotice) {
    if let Err(err) = notifier.notify(notice) {
        warn!(
            recipient = %notice.recipient,
            error = %err,
            "Checkout notification failed (order already committed)"
        );
    }
}
