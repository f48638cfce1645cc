//! Accepting connections and handing them to connection tasks.

pub mod listener;
