//! `shopfront-events`: domain events and the pub/sub mechanics used to fan
//! them out to in-process subscribers (the notification worker).

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
