// Messaging - Scheduler events delivered to consumers that poll

pub mod channels;
pub mod event;

pub use channels::{ChannelListener, EventConsumer, EventProducer, create_event_channel};
pub use event::SchedulerEvent;
