//! In-memory state for the inventory view: the car list, the "older than five
//! years" list, the loading flag, error slots, and the form drafts.
//!
//! # Design
//! Operations are split in two, like the client they wrap. `begin_*` returns a
//! `PendingRequest` (the request plus a `Ticket`); `complete` takes the ticket
//! back together with the outcome of the round-trip. Nothing here blocks, so a
//! host may keep any number of requests in flight and settle them in any
//! order.
//!
//! Every ticket carries a `RequestToken`. The car list and the found list each
//! remember the token of their most recent fetch, and a fetch response is only
//! applied while its token is still the latest one. Mutations are patched by
//! id and compose last-write-wins. Once `detach` is called no completion
//! touches state again.
//!
//! Errors are kept per operation. Starting an operation clears its previous
//! error; `error_message` reports the most recent one still standing.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, info, warn};

use crate::client::InventoryClient;
use crate::config::InventoryConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{BulkOwnerUpdate, Car, CarDraft, CarField, UpdateDraft};

/// Message shown when a bulk owner update matched no cars.
pub const NO_CARS_FOUND: &str = "No cars found for update";

/// The six inventory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Add,
    FindOlderThan,
    UpdateOne,
    UpdateMany,
    Remove,
}

impl Operation {
    /// Leading text of the error message recorded when this operation fails.
    pub fn summary(self) -> &'static str {
        match self {
            Operation::List => "Failed to fetch data",
            Operation::Add => "Error adding car",
            Operation::FindOlderThan => "Error finding cars older than 5 years",
            Operation::UpdateOne => "Error updating car details",
            Operation::UpdateMany => "Error updating cars",
            Operation::Remove => "Error removing car",
        }
    }

    pub fn failure_message(self, err: &ApiError) -> String {
        match (self, err) {
            (Operation::UpdateMany, ApiError::NotFound) => NO_CARS_FOUND.to_string(),
            _ => format!("{}: {err}", self.summary()),
        }
    }
}

/// Monotonically increasing id handed out with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receipt for an issued request. Hand it back to `InventoryStore::complete`.
#[derive(Debug, Clone)]
pub struct Ticket {
    token: RequestToken,
    kind: TicketKind,
}

#[derive(Debug, Clone)]
enum TicketKind {
    List,
    /// `from_form` is set for requests built from the store's own form state.
    Add { from_form: bool },
    FindOlderThan,
    UpdateOne {
        id: String,
        overrides: UpdateDraft,
        from_form: bool,
    },
    UpdateMany { input: BulkOwnerUpdate },
    Remove { id: String },
}

impl Ticket {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn operation(&self) -> Operation {
        match self.kind {
            TicketKind::List => Operation::List,
            TicketKind::Add { .. } => Operation::Add,
            TicketKind::FindOlderThan => Operation::FindOlderThan,
            TicketKind::UpdateOne { .. } => Operation::UpdateOne,
            TicketKind::UpdateMany { .. } => Operation::UpdateMany,
            TicketKind::Remove { .. } => Operation::Remove,
        }
    }
}

/// A request ready to be executed, paired with its ticket.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub request: HttpRequest,
    pub ticket: Ticket,
}

/// What `complete` did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// State was updated from a successful response.
    Applied,
    /// The operation failed and its error slot was written.
    Failed,
    /// A newer fetch of the same list superseded this response.
    Stale,
    /// The store was detached; nothing changed.
    Detached,
}

#[derive(Debug, Clone)]
struct ErrorEntry {
    seq: u64,
    message: String,
}

#[derive(Debug)]
pub struct InventoryStore {
    client: InventoryClient,
    bulk_update: bool,

    cars: Vec<Car>,
    found_cars: Vec<Car>,
    loaded: bool,
    needs_refresh: bool,
    /// Token of the newest mutation that raised `needs_refresh`. Only a list
    /// issued after it can clear the flag.
    refresh_after: Option<RequestToken>,
    bulk_toggle: bool,

    errors: HashMap<Operation, ErrorEntry>,
    error_seq: u64,

    draft: CarDraft,
    overrides: UpdateDraft,
    update_target: Option<String>,
    new_owner: String,

    next_token: u64,
    latest_list: Option<RequestToken>,
    latest_find: Option<RequestToken>,
    revision: u64,
    detached: bool,
}

impl InventoryStore {
    pub fn new(config: &InventoryConfig) -> Self {
        Self {
            client: InventoryClient::new(&config.base_url),
            bulk_update: config.bulk_update,
            cars: Vec::new(),
            found_cars: Vec::new(),
            loaded: false,
            needs_refresh: false,
            refresh_after: None,
            bulk_toggle: false,
            errors: HashMap::new(),
            error_seq: 0,
            draft: CarDraft::empty(config.bulk_update),
            overrides: UpdateDraft::default(),
            update_target: None,
            new_owner: String::new(),
            next_token: 0,
            latest_list: None,
            latest_find: None,
            revision: 0,
            detached: false,
        }
    }

    // ---------------------------------------------------------------------
    // Read access
    // ---------------------------------------------------------------------

    pub fn client(&self) -> &InventoryClient {
        &self.client
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn car(&self, id: &str) -> Option<&Car> {
        self.cars.iter().find(|car| car.id == id)
    }

    pub fn found_cars(&self) -> &[Car] {
        &self.found_cars
    }

    /// `true` once the latest list request settled, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Set when a mutation succeeded but its effect could not be patched in
    /// locally. Cleared by a successful list issued after that mutation.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Flips on every successful bulk update.
    pub fn bulk_update_toggle(&self) -> bool {
        self.bulk_toggle
    }

    pub fn bulk_update_enabled(&self) -> bool {
        self.bulk_update
    }

    /// The most recently recorded error that has not been cleared.
    pub fn error_message(&self) -> Option<&str> {
        self.errors
            .values()
            .max_by_key(|entry| entry.seq)
            .map(|entry| entry.message.as_str())
    }

    pub fn error_for(&self, operation: Operation) -> Option<&str> {
        self.errors.get(&operation).map(|entry| entry.message.as_str())
    }

    /// Bumped on every state change a view might render.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn draft(&self) -> &CarDraft {
        &self.draft
    }

    pub fn overrides(&self) -> &UpdateDraft {
        &self.overrides
    }

    pub fn update_target(&self) -> Option<&str> {
        self.update_target.as_deref()
    }

    pub fn new_owner(&self) -> &str {
        &self.new_owner
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    // ---------------------------------------------------------------------
    // Form state
    // ---------------------------------------------------------------------

    pub fn set_draft_field(&mut self, field: CarField, value: impl Into<String>) {
        self.draft.set(field, value);
        self.touch();
    }

    /// Owner name matched by the bulk update. Ignored when bulk updates are off.
    pub fn set_old_owner(&mut self, value: impl Into<String>) {
        if let Some(old_owner) = self.draft.old_owner.as_mut() {
            *old_owner = value.into();
            self.touch();
        }
    }

    pub fn set_new_owner(&mut self, value: impl Into<String>) {
        self.new_owner = value.into();
        self.touch();
    }

    pub fn set_override(&mut self, field: CarField, value: impl Into<String>) {
        self.overrides.set(field, value);
        self.touch();
    }

    /// Enter update mode for `id`, or leave it when `id` is already the target.
    pub fn toggle_update(&mut self, id: &str) {
        if self.update_target.as_deref() == Some(id) {
            self.update_target = None;
        } else {
            self.update_target = Some(id.to_string());
        }
        self.touch();
    }

    // ---------------------------------------------------------------------
    // Issuing requests
    // ---------------------------------------------------------------------

    pub fn begin_list(&mut self) -> PendingRequest {
        self.clear_error(Operation::List);
        let request = self.client.build_list_cars();
        let pending = self.pending(request, TicketKind::List);
        self.latest_list = Some(pending.ticket.token);
        pending
    }

    /// Add `draft`. The form draft is left alone; see `submit_add`.
    pub fn begin_add(&mut self, draft: &CarDraft) -> Option<PendingRequest> {
        self.issue_add(draft, false)
    }

    fn issue_add(&mut self, draft: &CarDraft, from_form: bool) -> Option<PendingRequest> {
        self.clear_error(Operation::Add);
        let draft = self.shape_draft(draft);
        let built = self.client.build_add_car(&draft);
        self.prepare(Operation::Add, built, TicketKind::Add { from_form })
    }

    pub fn begin_find_older_than(&mut self, draft: &CarDraft) -> Option<PendingRequest> {
        self.clear_error(Operation::FindOlderThan);
        let draft = self.shape_draft(draft);
        let built = self.client.build_find_older_than(&draft);
        let pending = self.prepare(Operation::FindOlderThan, built, TicketKind::FindOlderThan)?;
        self.latest_find = Some(pending.ticket.token);
        Some(pending)
    }

    /// Update car `id` with `overrides`. Update mode and the staged
    /// overrides are left alone; see `submit_update`.
    pub fn begin_update_one(&mut self, id: &str, overrides: &UpdateDraft) -> Option<PendingRequest> {
        self.issue_update_one(id, overrides, false)
    }

    fn issue_update_one(&mut self, id: &str, overrides: &UpdateDraft, from_form: bool) -> Option<PendingRequest> {
        self.clear_error(Operation::UpdateOne);
        let built = self.client.build_update_by_id(id, overrides);
        let kind = TicketKind::UpdateOne {
            id: id.to_string(),
            overrides: overrides.clone(),
            from_form,
        };
        self.prepare(Operation::UpdateOne, built, kind)
    }

    pub fn begin_update_many(&mut self, owner: &str, new_owner: &str) -> Option<PendingRequest> {
        self.clear_error(Operation::UpdateMany);
        if !self.bulk_update {
            self.record_error(Operation::UpdateMany, &ApiError::Disabled("bulk owner update"));
            return None;
        }
        let input = BulkOwnerUpdate {
            owner: owner.to_string(),
            new_owner: new_owner.to_string(),
        };
        let built = self.client.build_update_many(&input);
        self.prepare(Operation::UpdateMany, built, TicketKind::UpdateMany { input })
    }

    pub fn begin_remove(&mut self, id: &str) -> PendingRequest {
        self.clear_error(Operation::Remove);
        let request = self.client.build_remove_by_id(id);
        self.pending(request, TicketKind::Remove { id: id.to_string() })
    }

    /// Add the car staged in the form draft. The draft is reset once the
    /// add succeeds.
    pub fn submit_add(&mut self) -> Option<PendingRequest> {
        let draft = self.draft.clone();
        self.issue_add(&draft, true)
    }

    /// Query older cars with the form draft.
    pub fn submit_find(&mut self) -> Option<PendingRequest> {
        let draft = self.draft.clone();
        self.begin_find_older_than(&draft)
    }

    /// Update the car currently in update mode with the staged overrides.
    /// Returns `None` when no car is selected. On success the overrides are
    /// cleared and update mode ends, unless another car was selected since.
    pub fn submit_update(&mut self) -> Option<PendingRequest> {
        let id = self.update_target.clone()?;
        let overrides = self.overrides.clone();
        self.issue_update_one(&id, &overrides, true)
    }

    /// Move every car owned by the draft's old owner to the staged new owner.
    pub fn submit_update_many(&mut self) -> Option<PendingRequest> {
        let owner = self.draft.old_owner.clone().unwrap_or_default();
        let new_owner = self.new_owner.clone();
        self.begin_update_many(&owner, &new_owner)
    }

    // ---------------------------------------------------------------------
    // Settling requests
    // ---------------------------------------------------------------------

    /// Apply the outcome of a request issued by one of the `begin_*` methods.
    pub fn complete(&mut self, ticket: Ticket, outcome: Result<HttpResponse, ApiError>) -> Completion {
        let operation = ticket.operation();
        let token = ticket.token;

        if self.detached {
            debug!(%token, ?operation, "store detached, dropping response");
            return Completion::Detached;
        }
        if !self.is_current(&ticket) {
            warn!(%token, ?operation, "superseded response dropped");
            return Completion::Stale;
        }

        let result = outcome.and_then(|response| self.apply(token, ticket.kind, response));
        if operation == Operation::List {
            self.loaded = true;
        }
        self.touch();

        match result {
            Ok(()) => {
                debug!(%token, ?operation, "response applied");
                Completion::Applied
            }
            Err(err) => {
                self.record_error(operation, &err);
                Completion::Failed
            }
        }
    }

    /// Mark the observer as gone. Later completions are ignored.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    fn apply(&mut self, token: RequestToken, kind: TicketKind, response: HttpResponse) -> Result<(), ApiError> {
        match kind {
            TicketKind::List => {
                let cars = self.client.parse_list_cars(response)?;
                self.cars = dedupe(cars);
                if self.refresh_after.map_or(true, |after| token > after) {
                    self.needs_refresh = false;
                    self.refresh_after = None;
                } else if self.needs_refresh {
                    debug!(%token, "list predates the pending mutation, refresh still needed");
                }
                debug!(count = self.cars.len(), "car list replaced");
            }
            TicketKind::Add { from_form } => {
                let created = self.client.parse_add_car(response)?;
                if from_form {
                    self.draft = CarDraft::empty(self.bulk_update);
                }
                match created {
                    Some(car) if self.car(&car.id).is_none() => {
                        info!(id = %car.id, "car added");
                        self.cars.push(car);
                    }
                    Some(car) => debug!(id = %car.id, "added car already listed"),
                    None => {
                        info!("car added, list needs refresh");
                        self.needs_refresh = true;
                        self.refresh_after = self.refresh_after.max(Some(token));
                    }
                }
            }
            TicketKind::FindOlderThan => {
                self.found_cars = dedupe(self.client.parse_find_older_than(response)?);
                debug!(count = self.found_cars.len(), "found list replaced");
            }
            TicketKind::UpdateOne { id, overrides, from_form } => {
                self.client.parse_update_by_id(response)?;
                for list in [&mut self.cars, &mut self.found_cars] {
                    if let Some(car) = list.iter_mut().find(|car| car.id == id) {
                        overrides.apply_to(car);
                    }
                }
                if from_form && self.update_target.as_deref() == Some(id.as_str()) {
                    self.overrides.clear();
                    self.update_target = None;
                }
                info!(%id, "car updated");
            }
            TicketKind::UpdateMany { input } => {
                let updated = self.client.parse_update_many(response)?;
                info!(
                    owner = %input.owner,
                    new_owner = %input.new_owner,
                    count = updated.len(),
                    "cars updated"
                );
                for car in updated {
                    for list in [&mut self.cars, &mut self.found_cars] {
                        if let Some(existing) = list.iter_mut().find(|c| c.id == car.id) {
                            *existing = car.clone();
                        }
                    }
                }
                self.bulk_toggle = !self.bulk_toggle;
            }
            TicketKind::Remove { id } => {
                self.client.parse_remove_by_id(response)?;
                self.cars.retain(|car| car.id != id);
                self.found_cars.retain(|car| car.id != id);
                info!(%id, "car removed");
            }
        }
        Ok(())
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        match ticket.kind {
            TicketKind::List => self.latest_list == Some(ticket.token),
            TicketKind::FindOlderThan => self.latest_find == Some(ticket.token),
            _ => true,
        }
    }

    fn prepare(
        &mut self,
        operation: Operation,
        built: Result<HttpRequest, ApiError>,
        kind: TicketKind,
    ) -> Option<PendingRequest> {
        match built {
            Ok(request) => Some(self.pending(request, kind)),
            Err(err) => {
                self.record_error(operation, &err);
                None
            }
        }
    }

    fn pending(&mut self, request: HttpRequest, kind: TicketKind) -> PendingRequest {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        debug!(%token, method = %request.method, path = %request.path, "issuing request");
        PendingRequest {
            request,
            ticket: Ticket { token, kind },
        }
    }

    /// Drafts never carry `oldOwner` when bulk updates are off.
    fn shape_draft(&self, draft: &CarDraft) -> CarDraft {
        let mut draft = draft.clone();
        if !self.bulk_update {
            draft.old_owner = None;
        }
        draft
    }

    fn record_error(&mut self, operation: Operation, err: &ApiError) {
        let message = operation.failure_message(err);
        warn!(?operation, error = %err, "{message}");
        self.error_seq += 1;
        self.errors.insert(
            operation,
            ErrorEntry {
                seq: self.error_seq,
                message,
            },
        );
        self.touch();
    }

    fn clear_error(&mut self, operation: Operation) {
        if self.errors.remove(&operation).is_some() {
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

/// Keep the first record for every id.
fn dedupe(cars: Vec<Car>) -> Vec<Car> {
    let mut seen = HashSet::new();
    cars.into_iter()
        .filter(|car| {
            let fresh = seen.insert(car.id.clone());
            if !fresh {
                warn!(id = %car.id, "duplicate car id in response, keeping first");
            }
            fresh
        })
        .collect()
}
