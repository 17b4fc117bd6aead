//! Message trait for event types.

/// A marker trait for inbound events routed to plugins.
///
/// Events are shared by reference with every plugin during a dispatch pass,
/// so they must be `Send + Sync + 'static`.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Clone)]
/// struct JoinEvent { group_id: i64 }
///
/// impl Message for JoinEvent {}
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Send + Sync + 'static`",
    note = "Events routed to plugins must be thread-safe and static."
)]
pub trait Message: Send + Sync + 'static {}

impl Message for () {}
impl Message for String {}
impl Message for &'static str {}
impl<T: Message> Message for Box<T> {}
impl<T: Message> Message for std::sync::Arc<T> {}
