//! Push-update feeds.
//!
//! A producer (often on another thread) sends [`RowBatch`]es down a
//! channel; the owner of the grid drains them with [`Grid::pump_feeds`]
//! from its own loop. Batches are applied one at a time, in arrival order.

use std::sync::mpsc::{Receiver, TryRecvError};

use log::debug;
use serde::{Deserialize, Serialize};

use super::Grid;
use crate::render::Presenter;
use crate::types::Row;

/// One update from a feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowBatch {
    pub rows: Vec<Row>,
    /// Append to the current data instead of replacing it
    pub append: bool,
}

impl RowBatch {
    pub fn replace(rows: Vec<Row>) -> Self {
        Self {
            rows,
            append: false,
        }
    }

    pub fn append(rows: Vec<Row>) -> Self {
        Self { rows, append: true }
    }
}

/// Handle returned by [`Grid::attach_feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedId(u64);

#[derive(Debug)]
pub(super) struct Feed {
    id: FeedId,
    receiver: Receiver<RowBatch>,
    resort: bool,
}

impl<P: Presenter> Grid<P> {
    /// Subscribe to a feed. With `resort` every batch re-applies the
    /// current sort.
    pub fn attach_feed(&mut self, receiver: Receiver<RowBatch>, resort: bool) -> FeedId {
        let id = FeedId(self.next_feed_id);
        self.next_feed_id += 1;
        self.feeds.push(Feed {
            id,
            receiver,
            resort,
        });
        debug!("feed {} attached", id.0);
        id
    }

    /// Returns `true` when the feed was attached.
    pub fn detach_feed(&mut self, id: FeedId) -> bool {
        let before = self.feeds.len();
        self.feeds.retain(|f| f.id != id);
        self.feeds.len() != before
    }

    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }

    /// Drain every attached feed without blocking and apply what arrived.
    /// Feeds whose sender hung up are dropped once drained.
    ///
    /// Returns the number of batches applied.
    pub fn pump_feeds(&mut self) -> usize {
        if self.detached {
            return 0;
        }

        let mut pending = Vec::new();
        let mut closed = Vec::new();
        for feed in &self.feeds {
            loop {
                match feed.receiver.try_recv() {
                    Ok(batch) => pending.push((batch, feed.resort)),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed.push(feed.id);
                        break;
                    }
                }
            }
        }
        if !closed.is_empty() {
            debug!("{} feed(s) disconnected", closed.len());
            self.feeds.retain(|f| !closed.contains(&f.id));
        }

        let applied = pending.len();
        for (batch, resort) in pending {
            if batch.append {
                self.add_rows(batch.rows, None, resort);
            } else {
                self.set_rows(batch.rows, resort);
            }
        }
        applied
    }
}
