//! In-memory ticket store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::category::{Category, CategoryRegistry};
use crate::error::{DeskError, Result};
use crate::filter::TicketFilter;
use crate::sla::SlaPolicySet;
use crate::ticket::{Comment, FieldChange, NewTicket, Priority, Ticket, TicketId, TicketStatus};

/// Ticket intake and storage.
///
/// Holds every ticket, the category registry used for intake defaults and
/// the SLA targets used to stamp due dates.
#[derive(Debug)]
pub struct TicketStore {
    /// All tickets by ID.
    tickets: RwLock<BTreeMap<TicketId, Ticket>>,
    /// Next ticket number to hand out.
    next_id: RwLock<u64>,
    /// Intake defaults per category.
    categories: RwLock<CategoryRegistry>,
    /// SLA targets.
    sla: SlaPolicySet,
}

impl Default for TicketStore {
    fn default() -> Self {
        Self::new(SlaPolicySet::default())
    }
}

impl TicketStore {
    /// Create an empty store with the given SLA targets.
    #[must_use]
    pub fn new(sla: SlaPolicySet) -> Self {
        Self {
            tickets: RwLock::new(BTreeMap::new()),
            next_id: RwLock::new(1),
            categories: RwLock::new(CategoryRegistry::new()),
            sla,
        }
    }

    /// Returns the SLA targets.
    #[must_use]
    pub const fn sla(&self) -> &SlaPolicySet {
        &self.sla
    }

    // ==================== Categories ====================

    /// Register or replace a category.
    pub fn register_category(&self, category: Category) {
        debug!(category = %category.name, "registered category");
        self.categories.write().insert(category);
    }

    /// Replace the whole category registry.
    pub fn set_categories(&self, registry: CategoryRegistry) {
        *self.categories.write() = registry;
    }

    /// Snapshot of the category registry.
    #[must_use]
    pub fn categories(&self) -> CategoryRegistry {
        self.categories.read().clone()
    }

    // ==================== Intake ====================

    /// Create a ticket from an intake form.
    ///
    /// Category defaults fill in the priority (when the form has none) and the
    /// assignee; SLA due dates are stamped from the resulting priority.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::InvalidTicket` if the form fails validation.
    pub fn create(&self, form: NewTicket, now: DateTime<Utc>) -> Result<Ticket> {
        form.validate()?;

        let (default_priority, default_assignee) = {
            let categories = self.categories.read();
            form.category
                .as_deref()
                .and_then(|name| categories.get(name))
                .map_or((None, None), |c| {
                    (c.default_priority, c.default_assignee.clone())
                })
        };

        let id = {
            let mut next = self.next_id.write();
            let id = TicketId::new(*next);
            *next += 1;
            id
        };

        let mut ticket = Ticket {
            id,
            subject: form.subject.trim().to_string(),
            description: form.description,
            requester: form.requester.trim().to_string(),
            department: form.department,
            category: form.category,
            priority: form.priority.or(default_priority).unwrap_or_default(),
            status: TicketStatus::Open,
            assignee: default_assignee,
            tags: form.tags,
            custom_fields: BTreeMap::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            first_response_at: None,
            resolved_at: None,
            response_due_at: None,
            resolution_due_at: None,
            escalation_level: 0,
            applied_escalations: Vec::new(),
        };
        self.sla.apply(&mut ticket);

        self.tickets.write().insert(id, ticket.clone());

        info!(
            ticket = %id,
            requester = %ticket.requester,
            priority = %ticket.priority,
            "created ticket"
        );
        Ok(ticket)
    }

    /// Insert a ticket as-is (used when restoring a snapshot).
    ///
    /// Keeps the id counter ahead of every inserted id.
    pub fn insert(&self, ticket: Ticket) {
        {
            let mut next = self.next_id.write();
            if ticket.id.get() >= *next {
                *next = ticket.id.get() + 1;
            }
        }
        self.tickets.write().insert(ticket.id, ticket);
    }

    // ==================== Queries ====================

    /// Get a ticket by ID.
    #[must_use]
    pub fn get(&self, id: TicketId) -> Option<Ticket> {
        self.tickets.read().get(&id).cloned()
    }

    /// Get a ticket by ID, failing when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::TicketNotFound` if there is no such ticket.
    pub fn require(&self, id: TicketId) -> Result<Ticket> {
        self.get(id).ok_or(DeskError::TicketNotFound(id))
    }

    /// Tickets matching the filter, ordered by id.
    #[must_use]
    pub fn list(&self, filter: &TicketFilter, now: DateTime<Utc>) -> Vec<Ticket> {
        self.tickets
            .read()
            .values()
            .filter(|t| filter.matches(t, now))
            .cloned()
            .collect()
    }

    /// All tickets ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<Ticket> {
        self.tickets.read().values().cloned().collect()
    }

    /// Ids of tickets that still need work.
    #[must_use]
    pub fn active_ids(&self) -> Vec<TicketId> {
        self.tickets
            .read()
            .values()
            .filter(|t| t.status.is_active())
            .map(|t| t.id)
            .collect()
    }

    /// Number of tickets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.read().len()
    }

    /// Returns true if the store holds no tickets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.read().is_empty()
    }

    // ==================== Mutation ====================

    /// Run `f` against a ticket under the write lock.
    ///
    /// `updated_at` is left to the closure.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::TicketNotFound` if there is no such ticket.
    pub fn update<R>(&self, id: TicketId, f: impl FnOnce(&mut Ticket) -> R) -> Result<R> {
        let mut tickets = self.tickets.write();
        let ticket = tickets.get_mut(&id).ok_or(DeskError::TicketNotFound(id))?;
        Ok(f(ticket))
    }

    /// Assign a ticket to an agent.
    ///
    /// Returns the change, or `None` when the agent already had the ticket.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::TicketNotFound` if there is no such ticket, or
    /// `DeskError::InvalidTicket` if the agent name is blank.
    pub fn assign(
        &self,
        id: TicketId,
        agent: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<FieldChange>> {
        let agent = agent.into().trim().to_string();
        if agent.is_empty() {
            return Err(DeskError::InvalidTicket("assignee cannot be empty".to_string()));
        }

        let change = self.update(id, |t| set_assignee(t, Some(agent.clone()), now))?;
        if change.is_some() {
            info!(ticket = %id, agent = %agent, "assigned ticket");
        }
        Ok(change)
    }

    /// Clear the assignee of a ticket.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::TicketNotFound` if there is no such ticket.
    pub fn unassign(&self, id: TicketId, now: DateTime<Utc>) -> Result<Option<FieldChange>> {
        let change = self.update(id, |t| set_assignee(t, None, now))?;
        if change.is_some() {
            info!(ticket = %id, "unassigned ticket");
        }
        Ok(change)
    }

    /// Change the priority and re-stamp SLA due dates from `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::TicketNotFound` if there is no such ticket.
    pub fn set_priority(
        &self,
        id: TicketId,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Option<FieldChange>> {
        let change = self.update(id, |t| {
            if t.priority == priority {
                return None;
            }
            let change = FieldChange::new("priority", Some(t.priority.as_str()), Some(priority.as_str()));
            t.priority = priority;
            self.sla.apply(t);
            t.updated_at = now;
            Some(change)
        })?;
        if change.is_some() {
            info!(ticket = %id, priority = %priority, "changed priority");
        }
        Ok(change)
    }

    /// Move a ticket to another status.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::TicketNotFound` if there is no such ticket, or
    /// `DeskError::InvalidTransition` if the lifecycle forbids the move.
    pub fn transition(
        &self,
        id: TicketId,
        status: TicketStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<FieldChange>> {
        let change = self.update(id, |t| {
            let old = t.status;
            let moved = t.transition(status, now)?;
            Ok::<_, DeskError>(
                moved.then(|| FieldChange::new("status", Some(old.as_str()), Some(status.as_str()))),
            )
        })??;
        if change.is_some() {
            info!(ticket = %id, status = %status, "changed status");
        }
        Ok(change)
    }

    /// Add a comment to a ticket.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::TicketNotFound` if there is no such ticket, or
    /// `DeskError::InvalidTicket` if the comment body is empty.
    pub fn add_comment(&self, id: TicketId, comment: Comment) -> Result<Ticket> {
        if comment.body.trim().is_empty() {
            return Err(DeskError::InvalidTicket(
                "comment cannot be empty".to_string(),
            ));
        }

        let author = comment.author.clone();
        let ticket = self.update(id, |t| {
            t.add_comment(comment);
            t.clone()
        })?;
        debug!(ticket = %id, author = %author, "added comment");
        Ok(ticket)
    }
}

fn set_assignee(ticket: &mut Ticket, agent: Option<String>, now: DateTime<Utc>) -> Option<FieldChange> {
    if ticket.assignee == agent {
        return None;
    }
    let change = FieldChange::new("assignee", ticket.assignee.clone(), agent.clone());
    ticket.assignee = agent;
    ticket.updated_at = now;
    Some(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 16, 10, 0, 0).unwrap()
    }

    fn form() -> NewTicket {
        NewTicket::new("VPN keeps dropping", "Every ten minutes", "alice")
    }

    mod intake_tests {
        use super::*;

        #[test]
        fn create_assigns_sequential_ids() {
            let store = TicketStore::default();
            let a = store.create(form(), now()).unwrap();
            let b = store.create(form(), now()).unwrap();

            assert_eq!(a.id, TicketId::new(1));
            assert_eq!(b.id, TicketId::new(2));
            assert_eq!(store.len(), 2);
        }

        #[test]
        fn create_stamps_sla_and_defaults() {
            let store = TicketStore::default();
            let ticket = store.create(form(), now()).unwrap();

            assert_eq!(ticket.priority, Priority::Medium);
            assert_eq!(ticket.status, TicketStatus::Open);
            assert_eq!(ticket.response_due_at, Some(now() + Duration::minutes(480)));
            assert!(ticket.assignee.is_none());
        }

        #[test]
        fn create_applies_category_defaults() {
            let store = TicketStore::default();
            store.register_category(
                Category::new("Network")
                    .unwrap()
                    .with_default_priority(Priority::High)
                    .with_default_assignee("netops"),
            );

            let ticket = store
                .create(form().with_category("network"), now())
                .unwrap();
            assert_eq!(ticket.priority, Priority::High);
            assert_eq!(ticket.assignee.as_deref(), Some("netops"));

            // An explicit priority wins over the category default.
            let ticket = store
                .create(
                    form().with_category("Network").with_priority(Priority::Low),
                    now(),
                )
                .unwrap();
            assert_eq!(ticket.priority, Priority::Low);
        }

        #[test]
        fn create_rejects_invalid_form() {
            let store = TicketStore::default();
            let result = store.create(NewTicket::new("", "", "alice"), now());
            assert!(matches!(result, Err(DeskError::InvalidTicket(_))));
            assert!(store.is_empty());
        }

        #[test]
        fn insert_keeps_counter_ahead() {
            let store = TicketStore::default();
            let mut restored = store.create(form(), now()).unwrap();
            restored.id = TicketId::new(40);
            store.insert(restored);

            let next = store.create(form(), now()).unwrap();
            assert_eq!(next.id, TicketId::new(41));
        }
    }

    mod mutation_tests {
        use super::*;

        #[test]
        fn assign_and_unassign() {
            let store = TicketStore::default();
            let id = store.create(form(), now()).unwrap().id;

            let later = now() + Duration::minutes(5);
            let change = store.assign(id, " dave ", later).unwrap().unwrap();
            assert_eq!(change.new.as_deref(), Some("dave"));
            assert!(change.old.is_none());
            let ticket = store.require(id).unwrap();
            assert_eq!(ticket.assignee.as_deref(), Some("dave"));
            assert_eq!(ticket.updated_at, later);

            let change = store.unassign(id, later).unwrap().unwrap();
            assert_eq!(change.old.as_deref(), Some("dave"));
            assert!(store.require(id).unwrap().assignee.is_none());
        }

        #[test]
        fn unchanged_fields_are_not_stamped() {
            let store = TicketStore::default();
            let id = store.create(form(), now()).unwrap().id;
            store.assign(id, "dave", now()).unwrap();

            let later = now() + Duration::hours(1);
            assert!(store.assign(id, "dave", later).unwrap().is_none());
            assert!(store.set_priority(id, Priority::Medium, later).unwrap().is_none());
            assert!(store.transition(id, TicketStatus::Open, later).unwrap().is_none());
            assert_eq!(store.require(id).unwrap().updated_at, now());
        }

        #[test]
        fn blank_agent_rejected() {
            let store = TicketStore::default();
            let id = store.create(form(), now()).unwrap().id;
            let result = store.assign(id, "   ", now());
            assert!(matches!(result, Err(DeskError::InvalidTicket(_))));
            assert!(store.require(id).unwrap().assignee.is_none());
        }

        #[test]
        fn set_priority_restamps_due_dates() {
            let store = TicketStore::default();
            let id = store.create(form(), now()).unwrap().id;

            let change = store
                .set_priority(id, Priority::Urgent, now() + Duration::minutes(30))
                .unwrap()
                .unwrap();
            assert_eq!(change.to_string(), "priority: medium -> urgent");
            let ticket = store.require(id).unwrap();
            assert_eq!(ticket.resolution_due_at, Some(now() + Duration::minutes(240)));
        }

        #[test]
        fn transition_validates_lifecycle() {
            let store = TicketStore::default();
            let id = store.create(form(), now()).unwrap().id;

            let change = store.transition(id, TicketStatus::Resolved, now()).unwrap();
            assert_eq!(change.unwrap().new.as_deref(), Some("resolved"));
            let result = store.transition(id, TicketStatus::Rejected, now());
            assert!(matches!(result, Err(DeskError::InvalidTransition { .. })));
        }

        #[test]
        fn comment_records_first_response() {
            let store = TicketStore::default();
            let id = store.create(form(), now()).unwrap().id;
            let at = now() + Duration::minutes(12);

            let ticket = store
                .add_comment(id, Comment::public("dave", "Looking into it", at))
                .unwrap();
            assert_eq!(ticket.first_response_at, Some(at));
        }

        #[test]
        fn empty_comment_rejected() {
            let store = TicketStore::default();
            let id = store.create(form(), now()).unwrap().id;
            assert!(store
                .add_comment(id, Comment::public("dave", "  ", now()))
                .is_err());
        }

        #[test]
        fn missing_ticket() {
            let store = TicketStore::default();
            let result = store.assign(TicketId::new(99), "dave", now());
            assert!(matches!(result, Err(DeskError::TicketNotFound(_))));
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn list_filters_and_orders() {
            let store = TicketStore::default();
            let a = store.create(form(), now()).unwrap().id;
            let b = store
                .create(form().with_priority(Priority::Urgent), now())
                .unwrap()
                .id;
            store.transition(a, TicketStatus::Closed, now()).unwrap();

            let active = store.list(&TicketFilter::new().active(), now());
            assert_eq!(active.len(), 1);
            assert_eq!(active[0].id, b);

            let all = store.list(&TicketFilter::new(), now());
            assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a, b]);
            assert_eq!(store.active_ids(), vec![b]);
        }
    }
}
