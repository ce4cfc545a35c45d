//! Presenter-facing surface combining a session, a filter and a scroll policy.

use std::sync::Arc;

use botmon_client::LogSource;
use botmon_types::{LogLevel, SyncError};

use crate::engine::SyncPhase;
use crate::filter::FilterView;
use crate::scroll::{PinThreshold, ScrollController, ScrollDirective};
use crate::session::{LogSession, SessionConfig, SessionError, SessionSnapshot};
use crate::store::{LevelCounts, StoredRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
struct CacheKey {
    generation: u64,
    level: Option<LogLevel>,
    text: String,
}

/// Everything a presenter needs to render and drive one log tail.
///
/// Content is measured in records: one record is one scroll unit.
pub struct LogView {
    session: LogSession,
    snapshot: SessionSnapshot,
    level_filter: Option<LogLevel>,
    filter: FilterView,
    scroll: ScrollController,

    /// Filtered sequence for `cache_key`
    visible: Arc<[StoredRecord]>,
    cache_key: Option<CacheKey>,
}

impl LogView {
    /// Open a session against `source` and wrap it
    pub fn open(
        source: Arc<dyn LogSource>,
        config: SessionConfig,
        level_filter: Option<LogLevel>,
    ) -> Self {
        Self::from_session(LogSession::open(source, config, level_filter))
    }

    pub fn from_session(session: LogSession) -> Self {
        let snapshot = session.snapshot();
        let mut view = Self {
            level_filter: snapshot.level_filter,
            session,
            snapshot,
            filter: FilterView::default(),
            scroll: ScrollController::default(),
            visible: Arc::from(Vec::new()),
            cache_key: None,
        };
        view.recompute();
        view
    }

    /// Replace the pin threshold (builder style)
    pub fn with_threshold(mut self, threshold: PinThreshold) -> Self {
        let viewport = self.scroll.viewport();
        self.scroll = ScrollController::new(threshold);
        self.scroll.set_viewport(viewport);
        self.scroll.on_content_changed(self.visible.len());
        self
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Change the server-side level filter. Records of other levels disappear
    /// immediately; the reload replaces the buffer when it completes.
    pub fn set_level_filter(&mut self, level_filter: Option<LogLevel>) {
        if self.level_filter == level_filter {
            return;
        }
        self.level_filter = level_filter;
        self.session.set_level_filter(level_filter);
        self.recompute();
    }

    /// Change the client-side text filter. Never touches the network.
    pub fn set_text_filter(&mut self, text: &str) {
        if self.filter.set_text(text) {
            self.recompute();
        }
    }

    pub fn reload(&self) {
        self.session.reload();
    }

    /// Delete all records on the service
    pub async fn clear_all(&mut self) -> Result<(), SessionError> {
        self.session.clear_all().await?;
        self.refresh();
        Ok(())
    }

    /// Start a clear without holding the view; call [`LogView::refresh`]
    /// once the returned future resolves.
    pub fn begin_clear(&self) -> impl Future<Output = Result<(), SessionError>> + Send + 'static {
        self.session.begin_clear()
    }

    pub fn close(&self) {
        self.session.close();
    }

    /// Pull the latest snapshot and re-derive the visible sequence.
    ///
    /// Returns whether anything a presenter renders changed.
    pub fn refresh(&mut self) -> bool {
        let next = self.session.snapshot();
        let status_changed = !self.snapshot.same_as(&next);
        self.snapshot = next;
        let content_changed = self.recompute();
        status_changed || content_changed
    }

    /// Wait for the session to publish. Returns false once it ended.
    pub async fn changed(&mut self) -> bool {
        self.session.changed().await
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    pub fn set_viewport_height(&mut self, height: usize) {
        self.scroll.set_viewport(height);
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll.scroll_up(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll.scroll_down(n);
    }

    pub fn page_up(&mut self) {
        self.scroll.page_up();
    }

    pub fn page_down(&mut self) {
        self.scroll.page_down();
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll.scroll_to_top();
    }

    pub fn jump_to_latest(&mut self) {
        self.scroll.jump_to_latest();
    }

    // ------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------

    /// Filtered records, oldest first
    pub fn visible_records(&self) -> &[StoredRecord] {
        &self.visible
    }

    /// Records inside the viewport
    pub fn visible_window(&self) -> &[StoredRecord] {
        let start = self.scroll.offset().min(self.visible.len());
        let end = start
            .saturating_add(self.scroll.viewport())
            .min(self.visible.len());
        &self.visible[start..end]
    }

    /// Top of the viewport, in records
    pub fn scroll_offset(&self) -> usize {
        self.scroll.offset()
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot.is_loading
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.snapshot.last_error.as_ref()
    }

    pub fn pinned(&self) -> bool {
        self.scroll.pinned()
    }

    pub fn total_buffered(&self) -> usize {
        self.snapshot.records.len()
    }

    pub fn total_visible(&self) -> usize {
        self.visible.len()
    }

    pub fn level_counts(&self) -> LevelCounts {
        self.snapshot.level_counts
    }

    pub fn phase(&self) -> SyncPhase {
        self.snapshot.phase
    }

    pub fn level_filter(&self) -> Option<LogLevel> {
        self.level_filter
    }

    pub fn text_filter(&self) -> &str {
        self.filter.text()
    }

    pub fn filter(&self) -> &FilterView {
        &self.filter
    }

    /// Recompute the visible sequence if its inputs changed.
    /// Returns whether it was recomputed.
    fn recompute(&mut self) -> bool {
        let key = CacheKey {
            generation: self.snapshot.generation,
            level: self.level_filter,
            text: self.filter.text().to_string(),
        };
        if self.cache_key.as_ref() == Some(&key) {
            return false;
        }

        // First record in view, to keep it in place when not following
        let anchor = if self.scroll.pinned() {
            None
        } else {
            self.visible.get(self.scroll.offset()).map(|r| r.seq)
        };

        self.visible = self
            .filter
            .apply(&self.snapshot.records, self.level_filter)
            .into();
        self.cache_key = Some(key);

        if self.scroll.on_content_changed(self.visible.len()) == ScrollDirective::Hold {
            if let Some(seq) = anchor {
                // Sequence numbers ascend, so the first survivor at or after the
                // anchor is where the reader was
                let position = self.visible.partition_point(|r| r.seq < seq);
                self.scroll.anchor_at(position);
            }
        }
        true
    }
}
