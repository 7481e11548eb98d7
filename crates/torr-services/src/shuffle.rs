//! Per-chunk peer ordering.
//!
//! Replication asks peers for each chunk in a fresh random order so that
//! load spreads across the subnet. The source is seedable so tests can pin
//! the order.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use torr_core::NodeId;

#[derive(Clone)]
pub struct PeerShuffler {
    rng: Arc<Mutex<StdRng>>,
}

impl PeerShuffler {
    /// `Some(seed)` gives a reproducible sequence of orders.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// A shuffled copy of `nodes`.
    pub fn shuffled(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        let mut order = nodes.to_vec();
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        order.shuffle(&mut *rng);
        order
    }
}

impl Default for PeerShuffler {
    fn default() -> Self {
        Self::new(None)
    }
}
