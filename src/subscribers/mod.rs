//! # Observability subscribers.
//!
//! The runtime publishes [`RuntimeEvent`](crate::events::RuntimeEvent)s on a
//! broadcast bus; this module fans them out to pluggable handlers, one
//! bounded delivery lane per subscriber.
//!
//! Subscriber faults feed back into the same bus: an overflowing lane
//! publishes `SubscriberOverflow`, a panicking handler publishes
//! `SubscriberPanicked`, and the remaining subscribers observe both.
//!
//! ```text
//! Registry / Multiplexer / Streams / Actors
//!        │ publish(RuntimeEvent)
//!        ▼
//!       Bus ──► SubscriberSet listener ──► lane per subscriber ──► on_event()
//!        ▲                                        │
//!        └── SubscriberOverflow / Panicked ◄──────┘
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
