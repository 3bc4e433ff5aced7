//! Marketplace catalog: browse, filter, paginate
//!
//! The browse view pages through `listings_with_author_info` with a fixed
//! page size; "load more" appends, a changed filter replaces. Rapid filter
//! edits are coalesced by a quiet-period debouncer, and only one fetch may
//! be in flight at a time: a request arriving while one is outstanding is
//! dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::Error;
use crate::models::{Comment, Listing, NewComment};
use crate::rest::SelectBuilder;
use crate::Backend;

/// Listings fetched per page
pub const PAGE_SIZE: u64 = 12;

/// Quiet period before coalesced filter edits fire a fetch
pub const DEBOUNCE_QUIET: Duration = Duration::from_millis(400);

const LISTINGS_VIEW: &str = "listings_with_author_info";
const COMMENTS_VIEW: &str = "comments_with_commenter_info";

/// Sort keys offered by the browse view, a fixed set of column+direction
/// pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    NewestFirst,
    OldestFirst,
    PriceLowToHigh,
    PriceHighToLow,
    NameAToZ,
    NameZToA,
}

impl SortKey {
    fn column(self) -> &'static str {
        match self {
            SortKey::NewestFirst | SortKey::OldestFirst => "created_at",
            SortKey::PriceLowToHigh | SortKey::PriceHighToLow => "price",
            SortKey::NameAToZ | SortKey::NameZToA => "name",
        }
    }

    fn ascending(self) -> bool {
        matches!(
            self,
            SortKey::OldestFirst | SortKey::PriceLowToHigh | SortKey::NameAToZ
        )
    }
}

/// A preset price-range button, e.g. "under $25"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePreset {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Active filter state for the browse view.
///
/// The "free only" shortcut and the preset price ranges are mutually
/// exclusive with each other and with manual bounds: enabling free-only pins
/// both bounds to zero and clears any preset, a preset clears free-only, and
/// editing a bound by hand clears the preset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingFilter {
    search: String,
    min_price: Option<f64>,
    max_price: Option<f64>,
    free_only: bool,
    preset: Option<PricePreset>,
    pub sort: SortKey,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text search over name and description, case-insensitive
    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_string();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Set the minimum price bound; manual edits clear any active preset
    pub fn set_min_price(&mut self, value: Option<f64>) {
        self.min_price = value;
        self.preset = None;
    }

    /// Set the maximum price bound; manual edits clear any active preset
    pub fn set_max_price(&mut self, value: Option<f64>) {
        self.max_price = value;
        self.preset = None;
    }

    pub fn min_price(&self) -> Option<f64> {
        self.min_price
    }

    pub fn max_price(&self) -> Option<f64> {
        self.max_price
    }

    /// Toggle the "free only" shortcut. Enabling it pins both bounds to
    /// zero and clears any active preset selection.
    pub fn set_free_only(&mut self, value: bool) {
        self.free_only = value;
        if value {
            self.min_price = Some(0.0);
            self.max_price = Some(0.0);
            self.preset = None;
        }
    }

    pub fn free_only(&self) -> bool {
        self.free_only
    }

    /// Select a preset price range, clearing free-only and manual bounds
    pub fn apply_preset(&mut self, preset: PricePreset) {
        self.free_only = false;
        self.min_price = preset.min;
        self.max_price = preset.max;
        self.preset = Some(preset);
    }

    pub fn preset(&self) -> Option<PricePreset> {
        self.preset
    }

    /// Reset every filter to its default
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Apply this filter to a select query
    fn apply(&self, mut query: SelectBuilder) -> SelectBuilder {
        if !self.search.is_empty() {
            query = query.or(&format!(
                "name.ilike.%{term}%,description.ilike.%{term}%",
                term = self.search
            ));
        }

        if self.free_only {
            // Price is stored as text upstream; both spellings mean free.
            query = query.or("price.eq.0,price.ilike.free");
        } else {
            if let Some(min) = self.min_price.filter(|m| *m >= 0.0) {
                query = query.gte("price", min);
            }
            if let Some(max) = self.max_price.filter(|m| *m > 0.0) {
                query = query.lte("price", max);
            }
        }

        query.order(self.sort.column(), self.sort.ascending())
    }
}

/// Coalesces rapid filter edits into one fetch after a quiet period.
///
/// Deterministic: the caller supplies the clock, notes every edit
/// with [`note_change`](Self::note_change), and polls [`take_ready`]
/// (Self::take_ready) from its event loop. N edits inside the quiet window
/// yield exactly one ready filter, carrying the last edit's parameters.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<ListingFilter>,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            deadline: None,
        }
    }

    /// Record a filter edit, restarting the quiet period
    pub fn note_change(&mut self, filter: ListingFilter, now: Instant) {
        self.pending = Some(filter);
        self.deadline = Some(now + self.quiet);
    }

    /// Take the coalesced filter once the quiet period has elapsed
    pub fn take_ready(&mut self, now: Instant) -> Option<ListingFilter> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_QUIET)
    }
}

/// Result of asking the browser to fetch
#[derive(Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The fetch ran; this many listings were appended (or now replace the
    /// previous set)
    Fetched { appended: usize },
    /// Another fetch was already in flight; this one was dropped
    Dropped,
}

#[derive(Default)]
struct BrowserState {
    listings: Vec<Listing>,
    total: Option<u64>,
}

/// Incremental pager over the filtered, sorted listing set
pub struct CatalogBrowser<'a> {
    backend: &'a Backend,
    state: Mutex<BrowserState>,
    in_flight: AtomicBool,
}

// Resets the in-flight flag when a fetch finishes, including on error paths.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<'a> CatalogBrowser<'a> {
    pub fn new(backend: &'a Backend) -> Self {
        Self {
            backend,
            state: Mutex::new(BrowserState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Fetch the first page for a new filter/search/sort, replacing all
    /// accumulated results
    pub async fn refresh(&self, filter: &ListingFilter) -> Result<FetchOutcome, Error> {
        self.fetch(filter, true).await
    }

    /// Fetch the next page and append it
    pub async fn load_more(&self, filter: &ListingFilter) -> Result<FetchOutcome, Error> {
        self.fetch(filter, false).await
    }

    async fn fetch(&self, filter: &ListingFilter, replace: bool) -> Result<FetchOutcome, Error> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            log::debug!("listing fetch dropped; one already in flight");
            return Ok(FetchOutcome::Dropped);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let offset = if replace {
            0
        } else {
            self.state.lock().unwrap().listings.len() as u64
        };

        let query = self
            .backend
            .from(LISTINGS_VIEW)
            .select("*")
            .count_exact()
            .range(offset, offset + PAGE_SIZE - 1);
        let query = filter.apply(query);

        let (page, total) = query.execute_with_total::<Listing>().await?;

        let mut state = self.state.lock().unwrap();
        if replace {
            state.listings.clear();
        }
        let appended = page.len();
        state.listings.extend(page);
        if total.is_some() {
            state.total = total;
        }

        Ok(FetchOutcome::Fetched { appended })
    }

    /// The accumulated listings in render order
    pub fn listings(&self) -> Vec<Listing> {
        self.state.lock().unwrap().listings.clone()
    }

    /// How many listings have been loaded so far
    pub fn loaded_count(&self) -> usize {
        self.state.lock().unwrap().listings.len()
    }

    /// The server-reported total matching the current filter, if known
    pub fn total_count(&self) -> Option<u64> {
        self.state.lock().unwrap().total
    }

    /// Whether a "load more" control should be shown: true exactly while
    /// loaded < total
    pub fn can_load_more(&self) -> bool {
        let state = self.state.lock().unwrap();
        match state.total {
            Some(total) => (state.listings.len() as u64) < total,
            None => false,
        }
    }
}

/// Fetch one listing by id for the `/listing/{id}` detail route.
///
/// A vanished listing is `Ok(None)`, not an error; the caller renders its
/// own "removed" message.
pub async fn fetch_listing(backend: &Backend, id: Uuid) -> Result<Option<Listing>, Error> {
    backend
        .from(LISTINGS_VIEW)
        .select("*")
        .eq("id", id)
        .execute_one::<Listing>()
        .await
}

/// Fetch a listing's comments, oldest first
pub async fn fetch_comments(backend: &Backend, listing_id: Uuid) -> Result<Vec<Comment>, Error> {
    backend
        .from(COMMENTS_VIEW)
        .select("*")
        .eq("listing_id", listing_id)
        .order("created_at", true)
        .execute::<Comment>()
        .await
}

/// Post a comment on a listing
pub async fn post_comment(
    backend: &Backend,
    listing_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<(), Error> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::validation("Comment cannot be empty"));
    }

    backend
        .from("comments")
        .insert(NewComment {
            listing_id,
            user_id,
            content: content.to_string(),
        })
        .execute_no_return()
        .await
}

/// Delete a comment (own comment, or any as admin; the server decides)
pub async fn delete_comment(backend: &Backend, comment_id: Uuid) -> Result<(), Error> {
    backend
        .from("comments")
        .delete()
        .eq("id", comment_id)
        .execute_no_return()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_only_zeroes_bounds_and_clears_preset() {
        let mut filter = ListingFilter::new();
        filter.apply_preset(PricePreset {
            min: Some(10.0),
            max: Some(50.0),
        });
        assert!(filter.preset().is_some());

        filter.set_free_only(true);
        assert_eq!(filter.min_price(), Some(0.0));
        assert_eq!(filter.max_price(), Some(0.0));
        assert!(filter.preset().is_none());
    }

    #[test]
    fn preset_clears_free_only() {
        let mut filter = ListingFilter::new();
        filter.set_free_only(true);

        filter.apply_preset(PricePreset {
            min: None,
            max: Some(25.0),
        });
        assert!(!filter.free_only());
        assert_eq!(filter.min_price(), None);
        assert_eq!(filter.max_price(), Some(25.0));
    }

    #[test]
    fn manual_bound_edit_clears_preset() {
        let mut filter = ListingFilter::new();
        filter.apply_preset(PricePreset {
            min: Some(25.0),
            max: Some(100.0),
        });

        filter.set_min_price(Some(30.0));
        assert!(filter.preset().is_none());
        assert_eq!(filter.min_price(), Some(30.0));
        assert_eq!(filter.max_price(), Some(100.0));
    }

    #[test]
    fn debouncer_coalesces_rapid_edits_into_last_params() {
        let quiet = Duration::from_millis(400);
        let mut debouncer = Debouncer::new(quiet);
        let start = Instant::now();

        let mut first = ListingFilter::new();
        first.set_search("chair");
        let mut second = ListingFilter::new();
        second.set_search("chairs");
        let mut third = ListingFilter::new();
        third.set_search("chairs free");

        debouncer.note_change(first, start);
        debouncer.note_change(second, start + Duration::from_millis(100));
        debouncer.note_change(third.clone(), start + Duration::from_millis(200));

        // Still inside the quiet window of the last edit.
        assert_eq!(
            debouncer.take_ready(start + Duration::from_millis(599)),
            None
        );

        // One fetch, with the parameters of the last change.
        let ready = debouncer.take_ready(start + Duration::from_millis(600));
        assert_eq!(ready, Some(third));

        // Nothing left afterwards.
        assert_eq!(debouncer.take_ready(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn sort_keys_map_to_fixed_column_direction_pairs() {
        assert_eq!(SortKey::NewestFirst.column(), "created_at");
        assert!(!SortKey::NewestFirst.ascending());
        assert_eq!(SortKey::PriceLowToHigh.column(), "price");
        assert!(SortKey::PriceLowToHigh.ascending());
        assert_eq!(SortKey::NameZToA.column(), "name");
        assert!(!SortKey::NameZToA.ascending());
    }
}
