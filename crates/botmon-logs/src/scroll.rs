/// Default distance from the bottom, in presenter units, that still counts as pinned
pub const DEFAULT_PIN_THRESHOLD: usize = 100;

/// How close to the bottom the viewport must be to stay pinned
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PinThreshold {
    /// Fixed distance in presenter units (pixels, rows)
    Units(usize),
    /// Fraction of the viewport height
    ViewportFraction(f32),
}

impl Default for PinThreshold {
    fn default() -> Self {
        Self::Units(DEFAULT_PIN_THRESHOLD)
    }
}

/// What the presenter should do with its viewport after content changed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirective {
    /// Scroll to the newest record
    FollowLatest,
    /// Leave the viewport where the user put it
    Hold,
}

/// Tracks whether the observer follows the newest record.
///
/// Positions are measured in the presenter's units: `offset` is the top of the
/// viewport, `content_len` the total scrollable height.
#[derive(Clone, Debug)]
pub struct ScrollController {
    pinned: bool,
    offset: usize,
    content_len: usize,
    viewport: usize,
    threshold: PinThreshold,
}

impl ScrollController {
    pub fn new(threshold: PinThreshold) -> Self {
        Self {
            pinned: true,
            offset: 0,
            content_len: 0,
            viewport: 0,
            threshold,
        }
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    /// Top of the viewport
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn max_offset(&self) -> usize {
        self.content_len.saturating_sub(self.viewport)
    }

    pub fn distance_from_bottom(&self) -> usize {
        self.max_offset().saturating_sub(self.offset)
    }

    fn threshold_units(&self) -> usize {
        match self.threshold {
            PinThreshold::Units(units) => units,
            PinThreshold::ViewportFraction(fraction) => {
                ((self.viewport as f32 * fraction).ceil() as usize).max(1)
            }
        }
    }

    /// The viewport was resized
    pub fn set_viewport(&mut self, height: usize) {
        self.viewport = height;
        self.settle();
    }

    /// A user-initiated scroll moved the viewport to `offset`
    pub fn on_user_scroll(&mut self, offset: usize) {
        self.offset = offset.min(self.max_offset());
        self.pinned = self.distance_from_bottom() < self.threshold_units();
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.on_user_scroll(self.offset.saturating_sub(n));
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.on_user_scroll(self.offset.saturating_add(n));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport.max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.on_user_scroll(0);
    }

    /// Explicit "jump to latest": pins unconditionally
    pub fn jump_to_latest(&mut self) {
        self.pinned = true;
        self.offset = self.max_offset();
    }

    /// Content length changed; follow the bottom if pinned
    pub fn on_content_changed(&mut self, content_len: usize) -> ScrollDirective {
        self.content_len = content_len;
        self.settle()
    }

    /// Move the viewport without treating it as a user scroll (re-anchoring)
    pub fn anchor_at(&mut self, offset: usize) {
        self.offset = offset.min(self.max_offset());
    }

    fn settle(&mut self) -> ScrollDirective {
        if self.pinned {
            self.offset = self.max_offset();
            ScrollDirective::FollowLatest
        } else {
            self.offset = self.offset.min(self.max_offset());
            ScrollDirective::Hold
        }
    }
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::new(PinThreshold::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(threshold: usize, viewport: usize, content: usize) -> ScrollController {
        let mut scroll = ScrollController::new(PinThreshold::Units(threshold));
        scroll.set_viewport(viewport);
        scroll.on_content_changed(content);
        scroll
    }

    #[test]
    fn test_pinned_viewport_follows_new_content() {
        let mut scroll = rows(1, 10, 50);
        assert!(scroll.pinned());
        assert_eq!(scroll.offset(), 40);

        assert_eq!(scroll.on_content_changed(55), ScrollDirective::FollowLatest);
        assert_eq!(scroll.offset(), 45);
    }

    #[test]
    fn test_scrolling_away_unpins_and_holds() {
        let mut scroll = rows(1, 10, 50);
        scroll.scroll_up(5);
        assert!(!scroll.pinned());
        assert_eq!(scroll.offset(), 35);

        assert_eq!(scroll.on_content_changed(60), ScrollDirective::Hold);
        assert_eq!(scroll.offset(), 35);
        assert!(!scroll.pinned());
    }

    #[test]
    fn test_returning_to_bottom_repins() {
        let mut scroll = rows(1, 10, 50);
        scroll.scroll_to_top();
        assert!(!scroll.pinned());

        scroll.scroll_down(usize::MAX);
        assert!(scroll.pinned());
        assert_eq!(scroll.offset(), 40);
    }

    #[test]
    fn test_threshold_tolerates_small_distance() {
        let mut scroll = rows(100, 300, 1000);
        scroll.on_user_scroll(650);
        assert!(scroll.pinned());

        scroll.on_user_scroll(600);
        assert!(!scroll.pinned());
    }

    #[test]
    fn test_viewport_fraction_threshold() {
        let mut scroll = ScrollController::new(PinThreshold::ViewportFraction(0.25));
        scroll.set_viewport(20);
        scroll.on_content_changed(100);

        scroll.on_user_scroll(76);
        assert!(scroll.pinned());
        scroll.on_user_scroll(75);
        assert!(!scroll.pinned());
    }

    #[test]
    fn test_jump_to_latest_pins_unconditionally() {
        let mut scroll = rows(1, 10, 50);
        scroll.scroll_to_top();
        scroll.jump_to_latest();
        assert!(scroll.pinned());
        assert_eq!(scroll.offset(), 40);
    }

    #[test]
    fn test_shrinking_content_clamps_offset() {
        let mut scroll = rows(1, 10, 50);
        scroll.scroll_up(20);
        scroll.on_content_changed(15);
        assert_eq!(scroll.offset(), 5);
    }

    #[test]
    fn test_short_content_stays_pinned() {
        let mut scroll = rows(1, 10, 3);
        scroll.scroll_up(2);
        assert!(scroll.pinned());
        assert_eq!(scroll.offset(), 0);
    }
}
