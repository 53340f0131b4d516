//! Blocking driver that runs every store operation through a `Transport`
//! straight away.
//!
//! A session is the simplest host: begin, execute, complete. Failures never
//! leave the session; they end up in the store's error slots and the returned
//! `Completion` says what happened. After a mutation that the store could not
//! patch in locally the session relists.

use tracing::debug;

use crate::config::InventoryConfig;
use crate::store::{Completion, InventoryStore, PendingRequest};
use crate::transport::Transport;
use crate::types::{CarDraft, UpdateDraft};

pub struct InventorySession<T> {
    store: InventoryStore,
    transport: T,
}

#[cfg(feature = "blocking")]
impl InventorySession<crate::transport::UreqTransport> {
    /// Session over a ureq agent configured from `config`.
    pub fn connect(config: &InventoryConfig) -> Self {
        Self::new(config, crate::transport::UreqTransport::new(config.timeout))
    }
}

impl<T: Transport> InventorySession<T> {
    pub fn new(config: &InventoryConfig, transport: T) -> Self {
        Self {
            store: InventoryStore::new(config),
            transport,
        }
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    /// Form edits go through here.
    pub fn store_mut(&mut self) -> &mut InventoryStore {
        &mut self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn list(&mut self) -> Completion {
        let pending = self.store.begin_list();
        self.run(pending)
    }

    pub fn add(&mut self, draft: &CarDraft) -> Completion {
        let pending = self.store.begin_add(draft);
        self.run_mutation(pending)
    }

    pub fn find_older_than(&mut self, draft: &CarDraft) -> Completion {
        match self.store.begin_find_older_than(draft) {
            Some(pending) => self.run(pending),
            None => Completion::Failed,
        }
    }

    pub fn update_one(&mut self, id: &str, overrides: &UpdateDraft) -> Completion {
        let pending = self.store.begin_update_one(id, overrides);
        self.run_mutation(pending)
    }

    pub fn update_many(&mut self, owner: &str, new_owner: &str) -> Completion {
        let pending = self.store.begin_update_many(owner, new_owner);
        self.run_mutation(pending)
    }

    pub fn remove(&mut self, id: &str) -> Completion {
        let pending = self.store.begin_remove(id);
        self.run_mutation(Some(pending))
    }

    pub fn submit_add(&mut self) -> Completion {
        let pending = self.store.submit_add();
        self.run_mutation(pending)
    }

    pub fn submit_find(&mut self) -> Completion {
        match self.store.submit_find() {
            Some(pending) => self.run(pending),
            None => Completion::Failed,
        }
    }

    /// `None` when no car is in update mode.
    pub fn submit_update(&mut self) -> Option<Completion> {
        let pending = self.store.submit_update()?;
        Some(self.run_mutation(Some(pending)))
    }

    pub fn submit_update_many(&mut self) -> Completion {
        let pending = self.store.submit_update_many();
        self.run_mutation(pending)
    }

    /// Tear down: responses still arriving are ignored and nothing more is
    /// sent.
    pub fn detach(&mut self) {
        self.store.detach();
    }

    fn run(&mut self, pending: PendingRequest) -> Completion {
        if self.store.is_detached() {
            debug!(token = %pending.ticket.token(), "session detached, request not sent");
            return Completion::Detached;
        }
        let outcome = self.transport.execute(&pending.request);
        self.store.complete(pending.ticket, outcome)
    }

    fn run_mutation(&mut self, pending: Option<PendingRequest>) -> Completion {
        let Some(pending) = pending else {
            return Completion::Failed;
        };
        let completion = self.run(pending);
        if completion == Completion::Applied && self.store.needs_refresh() {
            debug!("mutation not reflected locally, relisting");
            self.list();
        }
        completion
    }
}
