//! Round-robin color assignment for LOCATION and DEPARTMENT nodes
//!
//! The pool is an explicit instance shared through an `Arc`, so each
//! `NodeService` (and each test) owns its own cursor. Exhausting the palette
//! wraps around and reuses colors.

use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// A named palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolColor {
    pub name: &'static str,
    pub hex: &'static str,
}

/// Default palette, in assignment order
pub const DEFAULT_PALETTE: [PoolColor; 11] = [
    PoolColor { name: "Salmon", hex: "#F6AF8E" },
    PoolColor { name: "Lavender", hex: "#C3A5FF" },
    PoolColor { name: "Sage", hex: "#B1D0A5" },
    PoolColor { name: "Canary", hex: "#F6ED8E" },
    PoolColor { name: "Aqua", hex: "#8EF4F6" },
    PoolColor { name: "Mint", hex: "#C0F68E" },
    PoolColor { name: "Rose", hex: "#F68ECB" },
    PoolColor { name: "Periwinkle", hex: "#8E97F6" },
    PoolColor { name: "Blush", hex: "#F68EAB" },
    PoolColor { name: "Amber", hex: "#F6CE8E" },
    PoolColor { name: "Lime", hex: "#DFF68E" },
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("color pool needs at least one color")]
pub struct EmptyPalette;

/// Thread-safe round-robin color source
#[derive(Debug)]
pub struct ColorPool {
    colors: Vec<PoolColor>,
    cursor: AtomicUsize,
}

impl ColorPool {
    pub fn new(colors: Vec<PoolColor>) -> Result<Self, EmptyPalette> {
        if colors.is_empty() {
            return Err(EmptyPalette);
        }
        Ok(Self {
            colors,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Default palette with the cursor at `index` (taken modulo the palette size)
    pub fn with_start(index: usize) -> Self {
        let pool = Self::default();
        pool.cursor.store(index % pool.len(), Ordering::SeqCst);
        pool
    }

    /// Hand out the color under the cursor and advance it
    pub fn next(&self) -> &'static str {
        let len = self.colors.len();
        let index = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
            .unwrap_or_else(|current| current);
        self.colors[index].hex
    }

    /// The color the next call to [`ColorPool::next`] will return
    pub fn peek(&self) -> &'static str {
        self.colors[self.cursor.load(Ordering::SeqCst)].hex
    }

    pub fn reset(&self) {
        self.cursor.store(0, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[PoolColor] {
        &self.colors
    }
}

impl Default for ColorPool {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.to_vec(),
            cursor: AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_round_robin_wraps() {
        let pool = ColorPool::default();
        let first_cycle: Vec<_> = (0..pool.len()).map(|_| pool.next()).collect();
        assert_eq!(first_cycle[0], "#F6AF8E");
        assert_eq!(first_cycle[1], "#C3A5FF");
        assert_eq!(first_cycle[10], "#DFF68E");

        // Exhaustion reuses colors from the start
        assert_eq!(pool.next(), "#F6AF8E");
    }

    #[test]
    fn test_peek_reset_and_seed() {
        let pool = ColorPool::with_start(2);
        assert_eq!(pool.peek(), "#B1D0A5");
        assert_eq!(pool.next(), "#B1D0A5");
        assert_eq!(pool.peek(), "#F6ED8E");

        pool.reset();
        assert_eq!(pool.next(), "#F6AF8E");

        assert_eq!(ColorPool::with_start(11).peek(), "#F6AF8E");
    }

    #[test]
    fn test_custom_palette() {
        assert_eq!(ColorPool::new(Vec::new()).unwrap_err(), EmptyPalette);

        let pool = ColorPool::new(vec![PoolColor { name: "Ink", hex: "#000000" }]).unwrap();
        assert_eq!(pool.next(), "#000000");
        assert_eq!(pool.next(), "#000000");
    }

    #[test]
    fn test_concurrent_draws_cover_the_palette() {
        let pool = Arc::new(ColorPool::default());
        let handles: Vec<_> = (0..pool.len())
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || pool.next())
            })
            .collect();

        let drawn: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(drawn.len(), pool.len());
        assert_eq!(pool.peek(), "#F6AF8E");
    }
}
