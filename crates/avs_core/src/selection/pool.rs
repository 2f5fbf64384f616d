//! Cursor over a clip pool with reshuffling and repeat avoidance.

use rand::seq::SliceRandom;
use rand::Rng;

use super::history::RecentHistory;
use super::SelectionError;
use crate::models::Clip;

/// Order in which a pool is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOrder {
    /// Shuffled up front and again after every full pass.
    Shuffled,
    /// Kept in the given (name) order, wrapping around.
    Sequential,
}

/// A non-empty pool of clips walked by a cursor.
#[derive(Debug, Clone)]
pub struct ShufflePool {
    clips: Vec<Clip>,
    cursor: usize,
    order: DrawOrder,
}

impl ShufflePool {
    /// Build a pool, shuffling it once if the order is [`DrawOrder::Shuffled`].
    pub fn new<R: Rng + ?Sized>(
        name: &'static str,
        mut clips: Vec<Clip>,
        order: DrawOrder,
        rng: &mut R,
    ) -> Result<Self, SelectionError> {
        if clips.is_empty() {
            return Err(SelectionError::EmptyPool { pool: name });
        }
        if order == DrawOrder::Shuffled {
            clips.shuffle(rng);
        }
        Ok(Self {
            clips,
            cursor: 0,
            order,
        })
    }

    fn wrap_if_exhausted<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.cursor >= self.clips.len() {
            self.cursor = 0;
            if self.order == DrawOrder::Shuffled {
                self.clips.shuffle(rng);
            }
        }
    }

    /// Next clip in order, with no repeat avoidance.
    pub fn next_clip<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Clip {
        self.wrap_if_exhausted(rng);
        let clip = self.clips[self.cursor].clone();
        self.cursor += 1;
        clip
    }

    /// Next clip not in `history`; the pick is recorded in `history`.
    ///
    /// If skipping recent clips runs off the end of the pool, the cursor
    /// restarts at the front and the history is cleared, allowing a repeat.
    /// The latest pick stays remembered when the pool has another clip, so
    /// a clip never plays twice in a row.
    pub fn next_avoiding<R: Rng + ?Sized>(
        &mut self,
        history: &mut RecentHistory,
        rng: &mut R,
    ) -> Clip {
        loop {
            self.wrap_if_exhausted(rng);

            if history.contains(&self.clips[self.cursor].path) {
                self.cursor += 1;
                if self.cursor >= self.clips.len() {
                    self.cursor = 0;
                    if self.clips.len() > 1 {
                        history.keep_latest();
                    } else {
                        history.clear();
                    }
                }
                continue;
            }

            let clip = self.clips[self.cursor].clone();
            self.cursor += 1;
            history.push(clip.path.clone());
            return clip;
        }
    }
}
