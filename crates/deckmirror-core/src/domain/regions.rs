//! Screen region mapping domain entity.
//!
//! The host screen is overlaid with a fixed logical grid of 5 columns ×
//! 3 rows, anchored at (0, 0) and stretched to the full screen extent
//! (no letterboxing).  Key index `k` maps to grid cell
//! `(k mod 5, k div 5)` — row-major, left-to-right, top-to-bottom —
//! which matches the physical key layout of a 15-key deck.
//!
//! Decks with more than 15 keys still get an entry for every key: keys
//! beyond the grid resolve to a small fallback rectangle near the screen
//! origin rather than leaving a hole in the table.  Every key index must
//! resolve to *some* rectangle, because both the refresh loop and the
//! click dispatcher index the table by raw key number.

/// Number of grid columns the screen is divided into.
pub const GRID_COLS: u32 = 5;

/// Number of grid rows the screen is divided into.
pub const GRID_ROWS: u32 = 3;

/// Total logical grid cells (`GRID_COLS * GRID_ROWS`).
pub const GRID_CELLS: usize = (GRID_COLS * GRID_ROWS) as usize;

/// Rectangle assigned to keys with no grid cell (index ≥ [`GRID_CELLS`]).
///
/// Deliberately *not* clamped to the actual screen size: a key beyond
/// the grid always mirrors (and clicks) the fixed 100×100 patch at the
/// screen origin, even on screens smaller than that.
pub const FALLBACK_RECT: ScreenRect = ScreenRect {
    x1: 0,
    y1: 0,
    x2: 100,
    y2: 100,
};

// ── ScreenRect ────────────────────────────────────────────────────────────────

/// A rectangular screen area in pixel coordinates.
///
/// `(x1, y1)` is the top-left corner, `(x2, y2)` the bottom-right
/// (exclusive).  Corners produced by [`RegionTable::build`] are clamped
/// into the screen bounds, so a cell at the screen edge may be
/// degenerate (zero width or height) on very small screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl ScreenRect {
    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Centre point, using integer floor division.
    ///
    /// This is the coordinate the click dispatcher targets.
    pub fn center(&self) -> (i32, i32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// Returns `true` if clamping collapsed the rectangle to zero area.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

// ── RegionTable ───────────────────────────────────────────────────────────────

/// Ordered key-index → screen-rectangle table.
///
/// Built once per screen/deck combination and immutable afterwards; a
/// resolution change requires an explicit rebuild by the caller.  Both
/// concurrent contexts (refresh loop and key dispatcher) read it
/// without synchronisation.
#[derive(Debug, Clone)]
pub struct RegionTable {
    regions: Vec<ScreenRect>,
}

impl RegionTable {
    /// Builds the table for the given screen size and deck key count.
    ///
    /// Region size is computed with real-valued division
    /// (`screen / grid`), truncated to integers only when producing
    /// rectangle corners, so cells tile the screen without cumulative
    /// rounding drift.  Infallible: the result always contains exactly
    /// `key_count` entries.
    pub fn build(screen_width: u32, screen_height: u32, key_count: usize) -> Self {
        let region_width = screen_width as f64 / GRID_COLS as f64;
        let region_height = screen_height as f64 / GRID_ROWS as f64;

        let clamp_x = |v: f64| (v as i32).clamp(0, screen_width as i32);
        let clamp_y = |v: f64| (v as i32).clamp(0, screen_height as i32);

        let mut regions = Vec::with_capacity(key_count);
        for key in 0..key_count {
            if key < GRID_CELLS {
                let col = (key as u32 % GRID_COLS) as f64;
                let row = (key as u32 / GRID_COLS) as f64;
                regions.push(ScreenRect {
                    x1: clamp_x(col * region_width),
                    y1: clamp_y(row * region_height),
                    x2: clamp_x((col + 1.0) * region_width),
                    y2: clamp_y((row + 1.0) * region_height),
                });
            } else {
                regions.push(FALLBACK_RECT);
            }
        }

        Self { regions }
    }

    /// The rectangle for `key`, or `None` if the index is out of range.
    pub fn get(&self, key: usize) -> Option<&ScreenRect> {
        self.regions.get(key)
    }

    /// Number of entries (always equal to the key count it was built for).
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the table was built for zero keys.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterates over `(key_index, rect)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ScreenRect)> {
        self.regions.iter().enumerate()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
