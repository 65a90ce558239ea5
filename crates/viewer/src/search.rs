//! Place search state: debounced input, one live lookup at a time, and the
//! result list with its keyboard handling.
//!
//! The panel never performs I/O. [`SearchPanel::poll`] hands out a
//! [`LookupTicket`] when a query is due; the caller runs the lookup and
//! reports back through [`SearchPanel::complete`]. Issuing a newer ticket
//! cancels the older one, and completions for cancelled tickets are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use foundation::time::Time;
use runtime::Debouncer;
use tracing::debug;

use crate::geocode::GeocodeError;
use crate::state::GeocodingResult;

pub const DEBOUNCE_S: f64 = 0.4;
pub const MAX_RESULTS: usize = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Other,
}

#[derive(Debug, Clone)]
pub struct LookupTicket {
    id: u64,
    query: String,
    cancelled: Arc<AtomicBool>,
}

impl LookupTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct SearchPanel {
    query: String,
    results: Vec<GeocodingResult>,
    open: bool,
    debouncer: Debouncer<String>,
    in_flight: Option<LookupTicket>,
    next_id: u64,
}

impl Default for SearchPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchPanel {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            open: false,
            debouncer: Debouncer::new(DEBOUNCE_S),
            in_flight: None,
            next_id: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[GeocodingResult] {
        &self.results
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The list is shown only when open and non-empty.
    pub fn visible_results(&self) -> &[GeocodingResult] {
        if self.open {
            &self.results
        } else {
            &[]
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// When the pending query becomes due, if any.
    pub fn deadline(&self) -> Option<Time> {
        self.debouncer.deadline()
    }

    pub fn input(&mut self, text: &str, now: Time) {
        self.query = text.to_string();
        self.open = true;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.debouncer.cancel();
            self.cancel_in_flight();
            self.results.clear();
            return;
        }
        self.debouncer.push(trimmed.to_string(), now);
    }

    /// Issue a lookup once the input has been quiet long enough.
    pub fn poll(&mut self, now: Time) -> Option<LookupTicket> {
        let query = self.debouncer.poll(now)?;
        self.cancel_in_flight();
        self.next_id += 1;
        let ticket = LookupTicket {
            id: self.next_id,
            query,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        debug!(id = ticket.id, query = %ticket.query, "lookup issued");
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    /// Apply a finished lookup. Returns `false` when the ticket was
    /// superseded and the outcome was ignored.
    pub fn complete(
        &mut self,
        ticket: &LookupTicket,
        outcome: Result<Vec<GeocodingResult>, GeocodeError>,
    ) -> bool {
        let current = self.in_flight.as_ref().map(LookupTicket::id);
        if ticket.is_cancelled() || current != Some(ticket.id) {
            debug!(id = ticket.id, "stale lookup dropped");
            return false;
        }
        self.in_flight = None;
        match outcome {
            Ok(mut results) => {
                results.retain(GeocodingResult::has_valid_coordinates);
                results.truncate(MAX_RESULTS);
                self.open = !results.is_empty();
                self.results = results;
            }
            Err(err) => {
                debug!(id = ticket.id, error = %err, "lookup failed");
                self.results.clear();
            }
        }
        true
    }

    /// Enter picks the top result; Escape closes the list.
    pub fn key(&mut self, key: Key) -> Option<GeocodingResult> {
        match key {
            Key::Enter => {
                let top = self.results.first().cloned()?;
                Some(self.select(&top))
            }
            Key::Escape => {
                self.open = false;
                None
            }
            Key::Other => None,
        }
    }

    pub fn select(&mut self, result: &GeocodingResult) -> GeocodingResult {
        self.query = result.label.clone();
        self.open = false;
        result.clone()
    }

    pub fn focus(&mut self) {
        if !self.results.is_empty() {
            self.open = true;
        }
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.open = false;
        self.debouncer.cancel();
        self.cancel_in_flight();
    }

    fn cancel_in_flight(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            ticket.cancel();
        }
    }
}
