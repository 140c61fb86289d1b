//! Price-ordered ladders and order books
//!
//! A [`Ladder`] holds one side of the book as price levels kept best-first,
//! each level queuing its orders in time priority. An [`OrderBook`] pairs a
//! bid and an ask ladder for one instrument, applies feed deltas and
//! snapshots, and watches sequence numbers so a gap never goes unnoticed.
//!
//! Ladders track L1 (top of book), L2 (aggregated by price) or L3 (every
//! order) data, chosen through [`OrderBookConfig`].

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod book;
pub mod config;
pub mod delta;
pub mod error;
pub mod ladder;
pub mod level;
pub mod order;

pub use book::{BookStatus, OrderBook};
pub use config::OrderBookConfig;
pub use delta::{BookAction, BookDelta, BookRecord, BookSnapshot};
pub use error::{BookError, BookResult};
pub use ladder::{Depth, Ladder};
pub use level::Level;
pub use order::{BookOrder, BookPrice, OrderId};
