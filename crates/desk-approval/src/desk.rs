//! Approval routing.
//!
//! [`ApprovalDesk`] keeps approval requests and moves them, and their
//! tickets, through the line manager and head of department steps.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use desk_audit::{AuditEvent, AuditLogger, NoopAuditLogger};
use desk_core::{Ticket, TicketId, TicketStatus, TicketStore};
use desk_notify::{Dispatcher, Notification, NotificationKind};
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::directory::OrgDirectory;
use crate::error::{ApprovalError, Result};
use crate::request::{ApprovalRequest, ApprovalStage, ApprovalStatus, StepState};

/// Notification source for approval messages.
pub const APPROVAL_SOURCE: &str = "approvals";

/// Stores approval requests and routes decisions.
pub struct ApprovalDesk {
    requests: Arc<RwLock<BTreeMap<Uuid, ApprovalRequest>>>,
    dispatcher: Arc<Dispatcher>,
    audit: Arc<dyn AuditLogger>,
}

impl fmt::Debug for ApprovalDesk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApprovalDesk")
            .field("requests", &self.requests.read().len())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Default for ApprovalDesk {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalDesk {
    /// Creates an empty desk with no channels and no audit trail.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(BTreeMap::new())),
            dispatcher: Arc::new(Dispatcher::new()),
            audit: Arc::new(NoopAuditLogger::new()),
        }
    }

    /// Sets the notification dispatcher.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Sets the audit logger.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    // ============ Workflow ============

    /// Sends a ticket for approval.
    ///
    /// The line manager comes from the requester's directory entry; the head
    /// from the requester's department, or the ticket's department when the
    /// directory has none. The ticket moves to `pending_approval` and the line
    /// manager is notified.
    ///
    /// # Errors
    ///
    /// - `TicketNotActive` if the ticket is resolved, closed or rejected
    /// - `AlreadyPending` if the ticket has an open request
    /// - `MissingApprover` if either approver cannot be found
    /// - `Ticket` if the ticket cannot enter `pending_approval`
    pub fn request(
        &self,
        ticket: &mut Ticket,
        directory: &OrgDirectory,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest> {
        if !ticket.status.is_active() {
            return Err(ApprovalError::TicketNotActive {
                ticket: ticket.id,
                status: ticket.status,
            });
        }

        if let Some(open) = self.open_for_ticket(ticket.id) {
            return Err(ApprovalError::AlreadyPending {
                ticket: ticket.id,
                request: open.id,
            });
        }

        let requester = ticket.requester.clone();
        let line_manager = directory.line_manager_of(&requester).ok_or_else(|| {
            ApprovalError::MissingApprover {
                stage: ApprovalStage::LineManager,
                user: requester.clone(),
            }
        })?;
        let head = directory
            .department_of(&requester)
            .or(ticket.department.as_deref())
            .and_then(|department| directory.head_of(department))
            .ok_or_else(|| ApprovalError::MissingApprover {
                stage: ApprovalStage::HeadOfDepartment,
                user: requester.clone(),
            })?;

        ticket.transition(TicketStatus::PendingApproval, now)?;

        let request = ApprovalRequest::new(ticket.id, &requester, reason, line_manager, head, now);
        self.requests.write().insert(request.id, request.clone());

        info!(
            ticket = %ticket.id,
            request = %request.id,
            line_manager = %line_manager,
            head = %head,
            "requested approval"
        );
        self.audit.log(&AuditEvent::approval_requested(
            ticket.id,
            &requester,
            request.id,
            line_manager,
            head,
            now,
        ));

        let message = format!(
            "{requester} needs your approval as line manager: {}",
            request.reason
        );
        self.notify(
            ticket,
            NotificationKind::ApprovalRequired,
            directory.contact(line_manager),
            message,
            now,
        );

        Ok(request)
    }

    /// Approves the current step.
    ///
    /// Approving the line manager step hands the request to the head of
    /// department, unless that step was skipped. Approving the last step
    /// returns the ticket to `open`.
    ///
    /// # Errors
    ///
    /// - `RequestNotFound`, `TicketMismatch` for a wrong request or ticket
    /// - `AlreadyDecided` once the request is closed
    /// - `NotPendingApproval` if the ticket no longer waits for a decision
    /// - `NotAnApprover` if `actor` does not own the current step
    pub fn approve(
        &self,
        request_id: Uuid,
        ticket: &mut Ticket,
        directory: &OrgDirectory,
        actor: &str,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest> {
        self.decide(request_id, ticket, directory, actor, comment, StepState::Approved, now)
    }

    /// Rejects the current step, closing the request and rejecting the
    /// ticket.
    ///
    /// # Errors
    ///
    /// Same as [`ApprovalDesk::approve`].
    pub fn reject(
        &self,
        request_id: Uuid,
        ticket: &mut Ticket,
        directory: &OrgDirectory,
        actor: &str,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest> {
        self.decide(request_id, ticket, directory, actor, comment, StepState::Rejected, now)
    }

    /// Withdraws an open request.
    ///
    /// Only the requester or the current approver may cancel. A ticket still
    /// pending approval goes back to `open`.
    ///
    /// # Errors
    ///
    /// - `RequestNotFound`, `TicketMismatch` for a wrong request or ticket
    /// - `AlreadyDecided` once the request is closed
    /// - `NotAnApprover` if `actor` is neither requester nor current approver
    pub fn cancel(
        &self,
        request_id: Uuid,
        ticket: &mut Ticket,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest> {
        let mut requests = self.requests.write();
        let request = open_request(&mut requests, request_id, ticket.id)?;
        let stage = request
            .status
            .stage()
            .unwrap_or(ApprovalStage::LineManager);

        if actor != request.requested_by && request.current_approver() != Some(actor) {
            return Err(ApprovalError::NotAnApprover {
                actor: actor.to_string(),
                stage,
            });
        }

        if ticket.status == TicketStatus::PendingApproval {
            ticket.transition(TicketStatus::Open, now)?;
        }

        request.status = ApprovalStatus::Cancelled;
        request.decided_at = Some(now);
        let request = request.clone();
        drop(requests);

        info!(ticket = %ticket.id, request = %request.id, actor = %actor, "cancelled approval");
        self.audit.log(&AuditEvent::approval_decided(
            ticket.id,
            actor,
            request.id,
            stage.as_str(),
            "cancelled",
            now,
        ));

        Ok(request)
    }

    // ============ Queries ============

    /// Gets a request by ID.
    #[must_use]
    pub fn get(&self, request_id: Uuid) -> Option<ApprovalRequest> {
        self.requests.read().get(&request_id).cloned()
    }

    /// Every request for a ticket, oldest first.
    #[must_use]
    pub fn for_ticket(&self, ticket_id: TicketId) -> Vec<ApprovalRequest> {
        let mut found: Vec<ApprovalRequest> = self
            .requests
            .read()
            .values()
            .filter(|r| r.ticket_id == ticket_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at);
        found
    }

    /// The ticket's open request, if any.
    #[must_use]
    pub fn open_for_ticket(&self, ticket_id: TicketId) -> Option<ApprovalRequest> {
        self.requests
            .read()
            .values()
            .find(|r| r.ticket_id == ticket_id && r.is_open())
            .cloned()
    }

    /// Open requests waiting for `approver`, oldest first.
    #[must_use]
    pub fn pending_for(&self, approver: &str) -> Vec<ApprovalRequest> {
        let mut found: Vec<ApprovalRequest> = self
            .requests
            .read()
            .values()
            .filter(|r| r.current_approver() == Some(approver))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at);
        found
    }

    /// Open requests whose current step has waited at least `after`.
    #[must_use]
    pub fn overdue(&self, now: DateTime<Utc>, after: Duration) -> Vec<ApprovalRequest> {
        let mut found: Vec<ApprovalRequest> = self
            .requests
            .read()
            .values()
            .filter(|r| r.waiting_since().is_some_and(|since| now - since >= after))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at);
        found
    }

    /// Reminds approvers of overdue requests.
    ///
    /// A request is reminded at most once per `after` period. Returns the
    /// number of reminders sent.
    pub fn send_reminders(
        &self,
        tickets: &TicketStore,
        directory: &OrgDirectory,
        now: DateTime<Utc>,
        after: Duration,
    ) -> usize {
        let mut sent = 0;

        for request in self.overdue(now, after) {
            if request.reminded_at.is_some_and(|at| now - at < after) {
                continue;
            }
            let Some(approver) = request.current_approver() else {
                continue;
            };
            let Some(ticket) = tickets.get(request.ticket_id) else {
                warn!(ticket = %request.ticket_id, request = %request.id, "approval for unknown ticket");
                continue;
            };

            let message = format!(
                "Reminder: {} is still waiting for your approval: {}",
                request.requested_by, request.reason
            );
            self.notify(
                &ticket,
                NotificationKind::ApprovalRequired,
                directory.contact(approver),
                message,
                now,
            );

            if let Some(stored) = self.requests.write().get_mut(&request.id) {
                stored.reminded_at = Some(now);
            }
            sent += 1;
        }

        if sent > 0 {
            info!(reminders = sent, "sent approval reminders");
        }
        sent
    }

    /// Number of requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.read().len()
    }

    /// Returns true if there are no requests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.read().is_empty()
    }

    /// Every request, ordered by ID.
    #[must_use]
    pub fn all(&self) -> Vec<ApprovalRequest> {
        self.requests.read().values().cloned().collect()
    }

    /// Restores a request, e.g. from a snapshot.
    pub fn insert(&self, request: ApprovalRequest) {
        self.requests.write().insert(request.id, request);
    }

    // ============ Internals ============

    #[allow(clippy::too_many_arguments)]
    fn decide(
        &self,
        request_id: Uuid,
        ticket: &mut Ticket,
        directory: &OrgDirectory,
        actor: &str,
        comment: Option<String>,
        decision: StepState,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest> {
        let mut requests = self.requests.write();
        let request = open_request(&mut requests, request_id, ticket.id)?;
        if ticket.status != TicketStatus::PendingApproval {
            return Err(ApprovalError::NotPendingApproval {
                ticket: ticket.id,
                status: ticket.status,
            });
        }
        let Some(stage) = request.status.stage() else {
            return Err(ApprovalError::AlreadyDecided {
                id: request.id,
                status: request.status,
            });
        };

        if request.step(stage).approver != actor {
            return Err(ApprovalError::NotAnApprover {
                actor: actor.to_string(),
                stage,
            });
        }

        let head_pending = request.step(ApprovalStage::HeadOfDepartment).state == StepState::Pending;
        let next = match decision {
            StepState::Approved if stage == ApprovalStage::LineManager && head_pending => {
                ApprovalStatus::AwaitingHead
            }
            StepState::Approved => ApprovalStatus::Approved,
            _ => ApprovalStatus::Rejected,
        };

        match next {
            ApprovalStatus::Approved => {
                ticket.transition(TicketStatus::Open, now)?;
            }
            ApprovalStatus::Rejected => {
                ticket.transition(TicketStatus::Rejected, now)?;
            }
            _ => {}
        }

        let step = request.step_mut(stage);
        step.state = decision;
        step.decided_at = Some(now);
        step.comment = comment.filter(|c| !c.trim().is_empty());
        request.status = next;
        if !next.is_open() {
            request.decided_at = Some(now);
        }
        let request = request.clone();
        drop(requests);

        info!(
            ticket = %ticket.id,
            request = %request.id,
            stage = %stage,
            decision = %decision,
            actor = %actor,
            "approval decided"
        );
        self.audit.log(&AuditEvent::approval_decided(
            ticket.id,
            actor,
            request.id,
            stage.as_str(),
            decision.as_str(),
            now,
        ));

        if next == ApprovalStatus::AwaitingHead {
            let head = &request.step(ApprovalStage::HeadOfDepartment).approver;
            let message = format!(
                "{} needs your approval as head of department: {}",
                request.requested_by, request.reason
            );
            self.notify(
                ticket,
                NotificationKind::ApprovalRequired,
                directory.contact(head),
                message,
                now,
            );
        } else {
            let message = format!("Your approval request was {next} by {actor}");
            self.notify(
                ticket,
                NotificationKind::ApprovalDecided,
                directory.contact(&request.requested_by),
                message,
                now,
            );
        }

        Ok(request)
    }

    fn notify(
        &self,
        ticket: &Ticket,
        kind: NotificationKind,
        recipient: String,
        message: String,
        now: DateTime<Utc>,
    ) {
        let notification = Notification::for_ticket(ticket, kind, message)
            .with_recipient(recipient)
            .with_source(APPROVAL_SOURCE);
        let summary = self.dispatcher.dispatch(&notification);
        debug!(ticket = %ticket.id, sent = summary.sent, failed = summary.failed, "approval notification");

        for result in &summary.results {
            let event = if result.success {
                AuditEvent::notification_sent(
                    ticket.id,
                    &result.channel,
                    result.delivered_to.clone(),
                    now,
                )
            } else {
                AuditEvent::notification_failed(
                    ticket.id,
                    &result.channel,
                    result.message.clone().unwrap_or_default(),
                    now,
                )
            };
            self.audit.log(&event);
        }
    }
}

fn open_request(
    requests: &mut BTreeMap<Uuid, ApprovalRequest>,
    request_id: Uuid,
    ticket_id: TicketId,
) -> Result<&mut ApprovalRequest> {
    let request = requests
        .get_mut(&request_id)
        .ok_or(ApprovalError::RequestNotFound(request_id))?;

    if request.ticket_id != ticket_id {
        return Err(ApprovalError::TicketMismatch {
            request: request_id,
            expected: request.ticket_id,
            actual: ticket_id,
        });
    }

    if !request.is_open() {
        return Err(ApprovalError::AlreadyDecided {
            id: request.id,
            status: request.status,
        });
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use desk_audit::{AuditKind, MemoryAuditLogger};
    use desk_core::NewTicket;
    use desk_notify::{EmailChannel, Outbox};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
    }

    fn directory() -> OrgDirectory {
        OrgDirectory::new()
            .with_user("alice", "Finance", "bob")
            .with_user("frank", "IT", "erin")
            .with_head("Finance", "carol")
            .with_head("IT", "erin")
            .with_email("alice", "alice@example.com")
            .with_email("bob", "bob@example.com")
            .with_email("carol", "carol@example.com")
    }

    struct Fixture {
        desk: ApprovalDesk,
        audit: Arc<MemoryAuditLogger>,
        outbox: Outbox,
        store: TicketStore,
        dir: OrgDirectory,
    }

    fn fixture() -> Fixture {
        let audit = Arc::new(MemoryAuditLogger::new());
        let outbox = Outbox::new();
        let dispatcher = Dispatcher::new().with_channel(EmailChannel::new(
            "email",
            "helpdesk@example.com",
            outbox.clone(),
        ));
        Fixture {
            desk: ApprovalDesk::new()
                .with_dispatcher(Arc::new(dispatcher))
                .with_audit(audit.clone()),
            audit,
            outbox,
            store: TicketStore::default(),
            dir: directory(),
        }
    }

    fn ticket(store: &TicketStore, requester: &str) -> Ticket {
        store
            .create(NewTicket::new("New laptop", "Mine is broken", requester), t0())
            .unwrap()
    }

    mod request_tests {
        use super::*;

        #[test]
        fn routes_to_line_manager() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");

            let req = f.desk.request(&mut t, &f.dir, "hardware purchase", t0()).unwrap();

            assert_eq!(t.status, TicketStatus::PendingApproval);
            assert_eq!(req.status, ApprovalStatus::AwaitingLineManager);
            assert_eq!(req.current_approver(), Some("bob"));
            assert_eq!(req.step(ApprovalStage::HeadOfDepartment).approver, "carol");

            let mail = f.outbox.drain();
            assert_eq!(mail.len(), 1);
            assert_eq!(mail[0].to, vec!["bob@example.com"]);
            assert!(mail[0].body.contains("hardware purchase"));

            assert!(f.audit.history(t.id).iter().any(|e| matches!(
                &e.kind,
                AuditKind::ApprovalRequested { line_manager, .. } if line_manager == "bob"
            )));
        }

        #[test]
        fn head_falls_back_to_ticket_department() {
            let f = fixture();
            let dir = OrgDirectory::new()
                .with_head("Finance", "carol")
                .with_user("gina", "", "bob");
            let mut t = f
                .store
                .create(NewTicket::new("Access", "", "gina").with_department("finance"), t0())
                .unwrap();

            let req = f.desk.request(&mut t, &dir, "access", t0()).unwrap();
            assert_eq!(req.step(ApprovalStage::HeadOfDepartment).approver, "carol");
        }

        #[test]
        fn missing_line_manager() {
            let f = fixture();
            let mut t = ticket(&f.store, "zed");
            let err = f.desk.request(&mut t, &f.dir, "x", t0()).unwrap_err();
            assert!(matches!(
                err,
                ApprovalError::MissingApprover { stage: ApprovalStage::LineManager, .. }
            ));
            assert_eq!(t.status, TicketStatus::Open);
            assert!(f.desk.is_empty());
        }

        #[test]
        fn missing_head() {
            let f = fixture();
            let dir = OrgDirectory::new().with_user("alice", "Legal", "bob");
            let mut t = ticket(&f.store, "alice");
            let err = f.desk.request(&mut t, &dir, "x", t0()).unwrap_err();
            assert!(matches!(
                err,
                ApprovalError::MissingApprover { stage: ApprovalStage::HeadOfDepartment, .. }
            ));
        }

        #[test]
        fn one_open_request_per_ticket() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            f.desk.request(&mut t, &f.dir, "x", t0()).unwrap();
            let err = f.desk.request(&mut t, &f.dir, "again", t0()).unwrap_err();
            assert!(matches!(err, ApprovalError::AlreadyPending { .. }));
        }

        #[test]
        fn inactive_ticket_rejected() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            t.transition(TicketStatus::Closed, t0()).unwrap();
            let err = f.desk.request(&mut t, &f.dir, "x", t0()).unwrap_err();
            assert!(matches!(err, ApprovalError::TicketNotActive { .. }));
        }

        #[test]
        fn on_hold_ticket_cannot_enter_approval() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            t.transition(TicketStatus::OnHold, t0()).unwrap();
            let err = f.desk.request(&mut t, &f.dir, "x", t0()).unwrap_err();
            assert!(matches!(err, ApprovalError::Ticket(_)));
            assert!(f.desk.is_empty());
        }
    }

    mod decision_tests {
        use super::*;

        #[test]
        fn two_stage_approval() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();
            f.outbox.drain();

            let later = t0() + Duration::hours(1);
            let req = f
                .desk
                .approve(req.id, &mut t, &f.dir, "bob", Some("fine".into()), later)
                .unwrap();
            assert_eq!(req.status, ApprovalStatus::AwaitingHead);
            assert_eq!(t.status, TicketStatus::PendingApproval);
            assert_eq!(req.step(ApprovalStage::LineManager).comment.as_deref(), Some("fine"));
            assert_eq!(f.outbox.drain()[0].to, vec!["carol@example.com"]);
            assert_eq!(f.desk.pending_for("carol").len(), 1);
            assert!(f.desk.pending_for("bob").is_empty());

            let req = f.desk.approve(req.id, &mut t, &f.dir, "carol", None, later).unwrap();
            assert_eq!(req.status, ApprovalStatus::Approved);
            assert_eq!(req.decided_at, Some(later));
            assert_eq!(t.status, TicketStatus::Open);

            let mail = f.outbox.drain();
            assert_eq!(mail[0].to, vec!["alice@example.com"]);
            assert!(mail[0].body.contains("approved by carol"));
        }

        #[test]
        fn same_approver_finishes_in_one_step() {
            let f = fixture();
            let mut t = ticket(&f.store, "frank");
            let req = f.desk.request(&mut t, &f.dir, "vpn", t0()).unwrap();
            assert_eq!(req.step(ApprovalStage::HeadOfDepartment).state, StepState::Skipped);

            let req = f.desk.approve(req.id, &mut t, &f.dir, "erin", None, t0()).unwrap();
            assert_eq!(req.status, ApprovalStatus::Approved);
            assert_eq!(t.status, TicketStatus::Open);
        }

        #[test]
        fn reject_at_head_stage() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();
            f.desk.approve(req.id, &mut t, &f.dir, "bob", None, t0()).unwrap();

            let req = f
                .desk
                .reject(req.id, &mut t, &f.dir, "carol", Some("no budget".into()), t0())
                .unwrap();
            assert_eq!(req.status, ApprovalStatus::Rejected);
            assert_eq!(req.step(ApprovalStage::HeadOfDepartment).state, StepState::Rejected);
            assert_eq!(t.status, TicketStatus::Rejected);

            let decided: Vec<String> = f
                .audit
                .history(t.id)
                .into_iter()
                .filter_map(|e| match e.kind {
                    AuditKind::ApprovalDecided { stage, decision, .. } => Some(format!("{stage}:{decision}")),
                    _ => None,
                })
                .collect();
            assert_eq!(decided, vec!["line_manager:approved", "head_of_department:rejected"]);
        }

        #[test]
        fn only_current_approver_decides() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();

            let err = f.desk.approve(req.id, &mut t, &f.dir, "carol", None, t0()).unwrap_err();
            assert!(matches!(
                err,
                ApprovalError::NotAnApprover { stage: ApprovalStage::LineManager, .. }
            ));
            assert_eq!(f.desk.get(req.id).unwrap().status, ApprovalStatus::AwaitingLineManager);
        }

        #[test]
        fn decided_requests_are_final() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();
            f.desk.reject(req.id, &mut t, &f.dir, "bob", None, t0()).unwrap();

            let err = f.desk.approve(req.id, &mut t, &f.dir, "bob", None, t0()).unwrap_err();
            assert!(matches!(
                err,
                ApprovalError::AlreadyDecided { status: ApprovalStatus::Rejected, .. }
            ));
        }

        #[test]
        fn unknown_request_and_wrong_ticket() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let mut other = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();

            assert!(matches!(
                f.desk.approve(Uuid::new_v4(), &mut t, &f.dir, "bob", None, t0()),
                Err(ApprovalError::RequestNotFound(_))
            ));
            assert!(matches!(
                f.desk.approve(req.id, &mut other, &f.dir, "bob", None, t0()),
                Err(ApprovalError::TicketMismatch { .. })
            ));
        }
    }

    mod stale_request_tests {
        use super::*;

        #[test]
        fn closed_ticket_cannot_be_decided() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();
            t.transition(TicketStatus::Closed, t0()).unwrap();

            assert!(matches!(
                f.desk.reject(req.id, &mut t, &f.dir, "bob", None, t0()),
                Err(ApprovalError::NotPendingApproval { status: TicketStatus::Closed, .. })
            ));
            assert!(matches!(
                f.desk.approve(req.id, &mut t, &f.dir, "bob", None, t0()),
                Err(ApprovalError::NotPendingApproval { .. })
            ));
            assert_eq!(t.status, TicketStatus::Closed);
            assert_eq!(f.desk.get(req.id).unwrap().status, ApprovalStatus::AwaitingLineManager);
        }

        #[test]
        fn stale_request_can_still_be_cancelled() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();
            t.transition(TicketStatus::Closed, t0()).unwrap();

            let req = f.desk.cancel(req.id, &mut t, "alice", t0()).unwrap();
            assert_eq!(req.status, ApprovalStatus::Cancelled);
            assert_eq!(t.status, TicketStatus::Closed);
            assert!(f.desk.pending_for("bob").is_empty());
        }
    }

    mod cancel_tests {
        use super::*;

        #[test]
        fn requester_cancels() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();

            let req = f.desk.cancel(req.id, &mut t, "alice", t0()).unwrap();
            assert_eq!(req.status, ApprovalStatus::Cancelled);
            assert_eq!(t.status, TicketStatus::Open);
            assert!(f.desk.open_for_ticket(t.id).is_none());

            // a fresh request is allowed afterwards
            f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();
            assert_eq!(f.desk.for_ticket(t.id).len(), 2);
        }

        #[test]
        fn current_approver_cancels() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();
            assert!(f.desk.cancel(req.id, &mut t, "bob", t0()).is_ok());
        }

        #[test]
        fn strangers_cannot_cancel() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();
            assert!(matches!(
                f.desk.cancel(req.id, &mut t, "carol", t0()),
                Err(ApprovalError::NotAnApprover { .. })
            ));
        }
    }

    mod overdue_tests {
        use super::*;

        #[test]
        fn overdue_uses_current_step_clock() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            let req = f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();

            assert!(f.desk.overdue(t0() + Duration::hours(23), Duration::hours(24)).is_empty());
            assert_eq!(f.desk.overdue(t0() + Duration::hours(24), Duration::hours(24)).len(), 1);

            f.desk
                .approve(req.id, &mut t, &f.dir, "bob", None, t0() + Duration::hours(20))
                .unwrap();
            assert!(f.desk.overdue(t0() + Duration::hours(30), Duration::hours(24)).is_empty());
        }

        #[test]
        fn reminders_once_per_period() {
            let f = fixture();
            let mut t = ticket(&f.store, "alice");
            f.desk.request(&mut t, &f.dir, "laptop", t0()).unwrap();
            f.store.update(t.id, |stored| *stored = t.clone()).unwrap();
            f.outbox.drain();

            let day = Duration::hours(24);
            assert_eq!(f.desk.send_reminders(&f.store, &f.dir, t0() + day, day), 1);
            assert_eq!(f.outbox.drain()[0].to, vec!["bob@example.com"]);

            assert_eq!(
                f.desk.send_reminders(&f.store, &f.dir, t0() + day + Duration::hours(1), day),
                0
            );
            assert_eq!(f.desk.send_reminders(&f.store, &f.dir, t0() + day * 2, day), 1);
        }
    }
}
