//! `neurocore-events` — pub/sub bus and the dashboard channel messages.

pub mod bus;
pub mod channel;
pub mod in_memory_bus;
pub mod tenant;

pub use bus::{EventBus, Subscription};
pub use channel::{ChangeKind, ChannelMessage, ServiceCode};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use tenant::TenantScoped;
