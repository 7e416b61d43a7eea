//! Delivery backends, one module per provider.
//!
//! Every backend implements [`crate::core::Backend`]: it formats a lifecycle
//! message for its provider and sends it. Timing, master-process gating and
//! error handling live in [`crate::notifier`], not here.
pub mod chime;
pub mod cliq;
pub mod desktop;
pub mod dingtalk;
pub mod discord;
pub mod email;
pub mod feishu;
pub mod line;
pub mod matrix;
pub mod rocketchat;
pub mod slack;
pub mod sms;
pub mod teams;
pub mod telegram;
pub mod wechat;

mod http;

#[cfg(test)]
pub(crate) mod test_support;
