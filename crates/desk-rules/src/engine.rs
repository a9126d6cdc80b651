//! Rule engine for automation and escalation.
//!
//! This module provides the [`RuleEngine`] which is the main entry point of
//! the crate. It scans rules in order, applies the actions of matching rules,
//! dispatches the notifications they raise and records everything in the
//! audit trail.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use desk_audit::{AuditEvent, AuditLogger, FieldChange, NoopAuditLogger};
use desk_core::{SlaPolicySet, Ticket, TicketId, TicketStore};
use desk_notify::{Dispatcher, Notification, NotificationKind};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::actions::ActionContext;
use crate::condition::ConditionResult;
use crate::error::{Result, RuleError};
use crate::rule::{Rule, Trigger};

/// The result of running rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    /// Number of tickets looked at.
    pub tickets_scanned: usize,
    /// Number of rules evaluated.
    pub rules_evaluated: usize,
    /// Number of rules whose conditions matched.
    pub rules_matched: usize,
    /// Number of matching rules with at least one failed action.
    pub rules_errored: usize,
    /// IDs of the rules that matched, in scan order.
    pub matched_rules: Vec<String>,
    /// Every change made.
    pub changes: Vec<FieldChange>,
    /// Notifications delivered (per channel).
    pub notifications_sent: usize,
    /// Notification failures (per channel).
    pub notification_failures: usize,
}

impl EvaluationResult {
    /// Adds another result to this one.
    pub fn merge(&mut self, other: Self) {
        self.tickets_scanned += other.tickets_scanned;
        self.rules_evaluated += other.rules_evaluated;
        self.rules_matched += other.rules_matched;
        self.rules_errored += other.rules_errored;
        self.matched_rules.extend(other.matched_rules);
        self.changes.extend(other.changes);
        self.notifications_sent += other.notifications_sent;
        self.notification_failures += other.notification_failures;
    }

    /// Returns true if any rule changed a ticket.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// What a rule would do to a ticket, without doing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRun {
    /// Rule identifier.
    pub rule_id: String,
    /// Rule name.
    pub rule_name: String,
    /// Conditions hold and, for escalation rules, the threshold is reached.
    pub matched: bool,
    /// Escalation threshold state (`None` for automation rules).
    pub threshold_reached: Option<bool>,
    /// The escalation rule already fired for this ticket.
    pub already_applied: bool,
    /// Per-condition outcome.
    pub conditions: Vec<ConditionResult>,
    /// Changes the actions would make.
    pub changes: Vec<FieldChange>,
    /// Notifications the actions would raise.
    pub notifications: usize,
    /// Actions that would fail.
    pub errors: Vec<String>,
}

/// Runs automation and escalation rules against tickets.
///
/// Action failures are logged and audited; they never abort the scan.
pub struct RuleEngine {
    /// Registered rules in scan order.
    rules: Arc<RwLock<Vec<Rule>>>,
    /// Notification fan-out.
    dispatcher: Arc<Dispatcher>,
    /// Audit trail.
    audit: Arc<dyn AuditLogger>,
    /// SLA targets used when a rule changes the priority.
    sla: SlaPolicySet,
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rules.read().len())
            .field("dispatcher", &self.dispatcher)
            .field("sla", &self.sla)
            .finish_non_exhaustive()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    /// Creates an engine with no rules, no channels and no audit trail.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
            dispatcher: Arc::new(Dispatcher::new()),
            audit: Arc::new(NoopAuditLogger::new()),
            sla: SlaPolicySet::default(),
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

    /// Sets the SLA targets.
    #[must_use]
    pub fn with_sla(mut self, sla: SlaPolicySet) -> Self {
        self.sla = sla;
        self
    }

    // ============ Rule Management ============

    /// Adds a new rule.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::DuplicateRule` if a rule with the same ID already
    /// exists, or the validation error of an invalid rule.
    pub fn add_rule(&self, rule: Rule) -> Result<()> {
        rule.validate()?;
        let mut rules = self.rules.write();

        if rules.iter().any(|r| r.id == rule.id) {
            return Err(RuleError::DuplicateRule { id: rule.id });
        }

        info!(rule_id = %rule.id, rule_name = %rule.name, kind = rule.kind.as_str(), "added rule");
        rules.push(rule);
        rules.sort_by(Rule::scan_order);

        Ok(())
    }

    /// Adds several rules, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the error of the first rule that cannot be added.
    pub fn load_rules(&self, rules: impl IntoIterator<Item = Rule>) -> Result<()> {
        rules.into_iter().try_for_each(|rule| self.add_rule(rule))
    }

    /// Replaces an existing rule.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::RuleNotFound` if the rule doesn't exist, or the
    /// validation error of an invalid rule.
    pub fn update_rule(&self, rule: Rule) -> Result<()> {
        rule.validate()?;
        let mut rules = self.rules.write();

        let Some(slot) = rules.iter_mut().find(|r| r.id == rule.id) else {
            return Err(RuleError::RuleNotFound { id: rule.id });
        };

        info!(rule_id = %rule.id, rule_name = %rule.name, "updated rule");
        *slot = rule;
        rules.sort_by(Rule::scan_order);

        Ok(())
    }

    /// Removes a rule by ID.
    ///
    /// Returns `true` if the rule was removed.
    pub fn remove_rule(&self, rule_id: &str) -> bool {
        let mut rules = self.rules.write();
        let before = rules.len();
        rules.retain(|r| r.id != rule_id);
        let removed = rules.len() < before;

        if removed {
            info!(rule_id = %rule_id, "removed rule");
        }

        removed
    }

    /// Gets a rule by ID.
    #[must_use]
    pub fn get_rule(&self, rule_id: &str) -> Option<Rule> {
        self.rules.read().iter().find(|r| r.id == rule_id).cloned()
    }

    /// Returns all rules in scan order.
    #[must_use]
    pub fn list_rules(&self) -> Vec<Rule> {
        self.rules.read().clone()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    // ============ Automation ============

    /// Runs the automation rules listening to `trigger` against a ticket.
    ///
    /// Rules are scanned in order; the scan stops after a matching rule with
    /// `stop_processing`. Changes made here do not start another scan.
    pub fn run_automation(
        &self,
        ticket: &mut Ticket,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> EvaluationResult {
        let mut result = EvaluationResult {
            tickets_scanned: 1,
            ..EvaluationResult::default()
        };
        let rules = self.rules.read().clone();

        for rule in rules
            .iter()
            .filter(|r| r.enabled && r.kind.listens_to(trigger))
        {
            result.rules_evaluated += 1;

            if !rule.conditions.matches(ticket, now) {
                continue;
            }

            result.rules_matched += 1;
            result.matched_rules.push(rule.id.clone());
            self.apply_rule(rule, ticket, now, &mut result);

            if rule.stop_processing {
                debug!(ticket = %ticket.id, rule_id = %rule.id, "stop processing");
                break;
            }
        }

        debug!(
            ticket = %ticket.id,
            %trigger,
            rules_evaluated = result.rules_evaluated,
            rules_matched = result.rules_matched,
            "automation complete"
        );

        result
    }

    /// Runs automation against a ticket held in a store.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::Ticket` if the ticket does not exist.
    pub fn automate(
        &self,
        store: &TicketStore,
        id: TicketId,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<EvaluationResult> {
        store
            .update(id, |ticket| self.run_automation(ticket, trigger, now))
            .map_err(RuleError::from)
    }

    // ============ Escalation ============

    /// Runs the escalation rules against one ticket.
    ///
    /// Only active tickets are considered. Each escalation rule fires at most
    /// once per ticket; the rule ID is recorded on the ticket when it does.
    pub fn run_escalation(&self, ticket: &mut Ticket, now: DateTime<Utc>) -> EvaluationResult {
        let mut result = EvaluationResult::default();
        if !ticket.status.is_active() {
            return result;
        }
        result.tickets_scanned = 1;

        let rules = self.rules.read().clone();
        for rule in rules.iter().filter(|r| r.enabled && r.kind.is_escalation()) {
            if ticket.escalation_applied(&rule.id) {
                continue;
            }

            result.rules_evaluated += 1;

            if rule.kind.threshold_reached(ticket, now) != Some(true)
                || !rule.conditions.matches(ticket, now)
            {
                continue;
            }

            result.rules_matched += 1;
            result.matched_rules.push(rule.id.clone());
            self.apply_rule(rule, ticket, now, &mut result);
            ticket.record_escalation(rule.id.clone());

            if rule.stop_processing {
                debug!(ticket = %ticket.id, rule_id = %rule.id, "stop processing");
                break;
            }
        }

        result
    }

    /// Runs escalation over every active ticket in the store.
    pub fn sweep(&self, store: &TicketStore, now: DateTime<Utc>) -> EvaluationResult {
        let mut total = EvaluationResult::default();

        for id in store.active_ids() {
            match store.update(id, |ticket| self.run_escalation(ticket, now)) {
                Ok(result) => total.merge(result),
                Err(e) => warn!(ticket = %id, error = %e, "skipped ticket during sweep"),
            }
        }

        info!(
            tickets = total.tickets_scanned,
            rules_matched = total.rules_matched,
            changes = total.changes.len(),
            notifications_sent = total.notifications_sent,
            "escalation sweep complete"
        );

        total
    }

    // ============ Dry Run ============

    /// Reports what a rule would do to a ticket without changing it or
    /// sending anything.
    #[must_use]
    pub fn dry_run(&self, rule: &Rule, ticket: &Ticket, now: DateTime<Utc>) -> DryRun {
        let conditions = rule.conditions.explain(ticket, now);
        let threshold_reached = rule.kind.threshold_reached(ticket, now);
        let matched = rule.conditions.matches(ticket, now) && threshold_reached != Some(false);

        let mut report = DryRun {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            matched,
            threshold_reached,
            already_applied: rule.kind.is_escalation() && ticket.escalation_applied(&rule.id),
            conditions,
            changes: Vec::new(),
            notifications: 0,
            errors: Vec::new(),
        };

        if matched {
            let mut preview = ticket.clone();
            let ctx = self.context(rule, now);
            for action in &rule.actions {
                match action.apply(&mut preview, &ctx) {
                    Ok(outcome) => {
                        report.changes.extend(outcome.changes);
                        report.notifications += outcome.notifications.len();
                    }
                    Err(e) => report.errors.push(e.to_string()),
                }
            }
        }

        report
    }

    // ============ Internals ============

    fn context<'a>(&'a self, rule: &'a Rule, now: DateTime<Utc>) -> ActionContext<'a> {
        ActionContext {
            now,
            sla: &self.sla,
            source: &rule.name,
            kind: if rule.kind.is_escalation() {
                NotificationKind::Escalation
            } else {
                NotificationKind::RuleAction
            },
        }
    }

    fn apply_rule(
        &self,
        rule: &Rule,
        ticket: &mut Ticket,
        now: DateTime<Utc>,
        result: &mut EvaluationResult,
    ) {
        let ctx = self.context(rule, now);
        let mut changes = Vec::new();
        let mut notifications = Vec::new();
        let mut errored = false;

        for action in &rule.actions {
            match action.apply(ticket, &ctx) {
                Ok(outcome) => {
                    changes.extend(outcome.changes);
                    notifications.extend(outcome.notifications);
                }
                Err(e) => {
                    errored = true;
                    warn!(
                        ticket = %ticket.id,
                        rule_id = %rule.id,
                        rule_name = %rule.name,
                        action = action.kind(),
                        error = %e,
                        "failed to apply rule action"
                    );
                    self.audit.log(&AuditEvent::rule_failed(
                        ticket.id,
                        &rule.id,
                        &rule.name,
                        action.kind(),
                        e.to_string(),
                        now,
                    ));
                }
            }
        }

        if errored {
            result.rules_errored += 1;
        }

        if !changes.is_empty() {
            if now > ticket.updated_at {
                ticket.updated_at = now;
            }
            info!(
                ticket = %ticket.id,
                rule_id = %rule.id,
                rule_name = %rule.name,
                changes = changes.len(),
                "applied rule"
            );
            self.audit.log(&AuditEvent::rule_applied(
                ticket.id,
                &rule.id,
                &rule.name,
                rule.kind.as_str(),
                changes.clone(),
                now,
            ));

            if changes.iter().any(|c| c.field == "escalation_level") {
                self.audit.log(&AuditEvent::escalated(
                    ticket.id,
                    &rule.id,
                    &rule.name,
                    ticket.escalation_level,
                    now,
                ));
            }
        }

        for notification in &notifications {
            self.dispatch(notification, now, result);
        }
        result.changes.extend(changes);
    }

    fn dispatch(&self, notification: &Notification, now: DateTime<Utc>, result: &mut EvaluationResult) {
        let summary = self.dispatcher.dispatch(notification);
        result.notifications_sent += summary.sent;
        result.notification_failures += summary.failed;

        for channel in &summary.results {
            let event = if channel.success {
                AuditEvent::notification_sent(
                    notification.ticket_id,
                    &channel.channel,
                    channel.delivered_to.clone(),
                    now,
                )
            } else {
                AuditEvent::notification_failed(
                    notification.ticket_id,
                    &channel.channel,
                    channel.message.clone().unwrap_or_default(),
                    now,
                )
            };
            self.audit.log(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, Recipient};
    use crate::condition::{Condition, ConditionSet, Field, Operator};
    use crate::rule::{EscalationBasis, RuleKind};
    use chrono::{Duration, TimeZone};
    use desk_audit::{AuditKind, MemoryAuditLogger};
    use desk_core::{NewTicket, Priority, TicketStatus};
    use desk_notify::{EmailChannel, LogChannel, Outbox};
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 6, 12, 0, 0).unwrap()
    }

    fn created() -> DateTime<Utc> {
        now() - Duration::hours(3)
    }

    fn outage_ticket(store: &TicketStore) -> TicketId {
        store
            .create(
                NewTicket::new("Email outage", "Nobody can send mail", "alice")
                    .with_department("Finance"),
                created(),
            )
            .unwrap()
            .id
    }

    fn cond(field: Field, op: Operator, value: impl Into<serde_json::Value>) -> Condition {
        Condition::new(field, op, value).unwrap()
    }

    fn automation(name: &str, order: i32) -> crate::rule::RuleBuilder {
        Rule::builder(name, RuleKind::automation([Trigger::TicketCreated])).order(order)
    }

    struct Fixture {
        engine: RuleEngine,
        audit: Arc<MemoryAuditLogger>,
        outbox: Outbox,
        store: TicketStore,
    }

    fn fixture() -> Fixture {
        let audit = Arc::new(MemoryAuditLogger::new());
        let outbox = Outbox::new();
        let dispatcher = Dispatcher::new()
            .with_channel(LogChannel::default())
            .with_channel(
                EmailChannel::new("email", "helpdesk@example.com", outbox.clone())
                    .with_address_book(BTreeMap::from([(
                        "dave".to_string(),
                        "dave@example.com".to_string(),
                    )])),
            );
        let engine = RuleEngine::new()
            .with_dispatcher(Arc::new(dispatcher))
            .with_audit(audit.clone());
        Fixture {
            engine,
            audit,
            outbox,
            store: TicketStore::default(),
        }
    }

    mod management_tests {
        use super::*;

        #[test]
        fn add_rejects_duplicates_and_sorts() {
            let engine = RuleEngine::new();
            let b = automation("b", 2).id("b").action(Action::Unassign).build().unwrap();
            let a = automation("a", 1).id("a").action(Action::Unassign).build().unwrap();

            engine.add_rule(b.clone()).unwrap();
            engine.add_rule(a).unwrap();
            assert!(matches!(engine.add_rule(b), Err(RuleError::DuplicateRule { .. })));

            let ids: Vec<String> = engine.list_rules().into_iter().map(|r| r.id).collect();
            assert_eq!(ids, vec!["a", "b"]);
            assert_eq!(engine.rule_count(), 2);
        }

        #[test]
        fn update_and_remove() {
            let engine = RuleEngine::new();
            let mut rule = automation("Route", 0).id("route").action(Action::Unassign).build().unwrap();
            engine.add_rule(rule.clone()).unwrap();

            rule.enabled = false;
            engine.update_rule(rule.clone()).unwrap();
            assert!(!engine.get_rule("route").unwrap().enabled);

            assert!(engine.remove_rule("route"));
            assert!(!engine.remove_rule("route"));
            assert!(matches!(engine.update_rule(rule), Err(RuleError::RuleNotFound { .. })));
        }

        #[test]
        fn add_validates() {
            let engine = RuleEngine::new();
            let mut rule = automation("Route", 0).action(Action::Unassign).build().unwrap();
            rule.actions.clear();
            assert!(matches!(engine.add_rule(rule), Err(RuleError::InvalidRule { .. })));
        }
    }

    mod automation_tests {
        use super::*;

        #[test]
        fn matching_rule_applies_actions_and_audits() {
            let f = fixture();
            f.engine
                .add_rule(
                    automation("Outages are urgent", 0)
                        .conditions(ConditionSet::all().with(cond(Field::Subject, Operator::Contains, "outage")))
                        .action(Action::SetPriority { priority: Priority::Urgent })
                        .action(Action::Assign { agent: "dave".into() })
                        .build()
                        .unwrap(),
                )
                .unwrap();

            let id = outage_ticket(&f.store);
            let result = f.engine.automate(&f.store, id, Trigger::TicketCreated, now()).unwrap();

            assert_eq!(result.rules_evaluated, 1);
            assert_eq!(result.rules_matched, 1);
            assert_eq!(result.changes.len(), 2);

            let ticket = f.store.get(id).unwrap();
            assert_eq!(ticket.priority, Priority::Urgent);
            assert_eq!(ticket.assignee.as_deref(), Some("dave"));
            assert_eq!(ticket.updated_at, now());
            assert_eq!(ticket.resolution_due_at, Some(created() + Duration::minutes(240)));

            let history = f.audit.history(id);
            assert_eq!(history.len(), 1);
            assert!(matches!(&history[0].kind, AuditKind::RuleApplied { rule_kind, .. } if rule_kind == "automation"));
        }

        #[test]
        fn other_triggers_and_disabled_rules_are_skipped() {
            let f = fixture();
            f.engine
                .add_rule(
                    Rule::builder("On comment", RuleKind::automation([Trigger::CommentAdded]))
                        .action(Action::AddTag { tag: "commented".into() })
                        .build()
                        .unwrap(),
                )
                .unwrap();
            f.engine
                .add_rule(automation("Disabled", 0).enabled(false).action(Action::Unassign).build().unwrap())
                .unwrap();

            let id = outage_ticket(&f.store);
            let result = f.engine.automate(&f.store, id, Trigger::TicketCreated, now()).unwrap();
            assert_eq!(result.rules_evaluated, 0);
            assert!(!result.changed());
        }

        #[test]
        fn stop_processing_ends_scan() {
            let f = fixture();
            f.engine
                .add_rule(automation("First", 1).stop_processing(true).action(Action::AddTag { tag: "first".into() }).build().unwrap())
                .unwrap();
            f.engine
                .add_rule(automation("Second", 2).action(Action::AddTag { tag: "second".into() }).build().unwrap())
                .unwrap();

            let id = outage_ticket(&f.store);
            let result = f.engine.automate(&f.store, id, Trigger::TicketCreated, now()).unwrap();
            assert_eq!(result.rules_matched, 1);

            let ticket = f.store.get(id).unwrap();
            assert!(ticket.has_tag("first"));
            assert!(!ticket.has_tag("second"));
        }

        #[test]
        fn later_rules_see_earlier_changes() {
            let f = fixture();
            f.engine
                .add_rule(automation("Tag finance", 1).action(Action::AddTag { tag: "finance".into() }).build().unwrap())
                .unwrap();
            f.engine
                .add_rule(
                    automation("Finance to dave", 2)
                        .conditions(ConditionSet::all().with(cond(Field::Tags, Operator::Equals, "finance")))
                        .action(Action::Assign { agent: "dave".into() })
                        .build()
                        .unwrap(),
                )
                .unwrap();

            let id = outage_ticket(&f.store);
            f.engine.automate(&f.store, id, Trigger::TicketCreated, now()).unwrap();
            assert_eq!(f.store.get(id).unwrap().assignee.as_deref(), Some("dave"));
        }

        #[test]
        fn failing_action_does_not_abort() {
            let f = fixture();
            f.engine
                .add_rule(
                    automation("Broken then fine", 0)
                        .action(Action::SetStatus { status: TicketStatus::Rejected })
                        .action(Action::AddTag { tag: "seen".into() })
                        .build()
                        .unwrap(),
                )
                .unwrap();
            f.engine
                .add_rule(automation("Next", 1).action(Action::AddTag { tag: "next".into() }).build().unwrap())
                .unwrap();

            let id = outage_ticket(&f.store);
            let result = f.engine.automate(&f.store, id, Trigger::TicketCreated, now()).unwrap();

            assert_eq!(result.rules_matched, 2);
            assert_eq!(result.rules_errored, 1);
            let ticket = f.store.get(id).unwrap();
            assert_eq!(ticket.status, TicketStatus::Open);
            assert!(ticket.has_tag("seen"));
            assert!(ticket.has_tag("next"));

            let failed = f
                .audit
                .events()
                .into_iter()
                .filter(|e| e.event_type() == "rule_failed")
                .count();
            assert_eq!(failed, 1);
        }

        #[test]
        fn notify_dispatches_through_channels() {
            let f = fixture();
            f.engine
                .add_rule(
                    automation("Tell dave", 0)
                        .action(Action::Notify {
                            recipients: vec![Recipient::User("dave".into()), Recipient::Requester],
                            message: "New ticket".into(),
                        })
                        .build()
                        .unwrap(),
                )
                .unwrap();

            let id = outage_ticket(&f.store);
            let result = f.engine.automate(&f.store, id, Trigger::TicketCreated, now()).unwrap();

            // log delivers; email reaches dave (alice has no address)
            assert_eq!(result.notifications_sent, 2);
            assert_eq!(result.notification_failures, 0);
            let mail = f.outbox.drain();
            assert_eq!(mail[0].to, vec!["dave@example.com"]);
            assert!(mail[0].body.contains("Sent by Tell dave"));
        }

        #[test]
        fn missing_ticket() {
            let f = fixture();
            let result = f.engine.automate(&f.store, TicketId::new(9), Trigger::TicketCreated, now());
            assert!(matches!(result, Err(RuleError::Ticket(_))));
        }
    }

    mod escalation_tests {
        use super::*;

        fn stale_rule(after_minutes: u32) -> Rule {
            Rule::builder("Stale tickets", RuleKind::escalation(after_minutes, EscalationBasis::SinceCreated))
                .id("stale")
                .action(Action::Escalate { assign_to: Some("lead".into()), raise_priority: true })
                .action(Action::Notify { recipients: vec![Recipient::Assignee], message: "Escalated".into() })
                .build()
                .unwrap()
        }

        #[test]
        fn fires_once_per_ticket() {
            let f = fixture();
            f.engine.add_rule(stale_rule(120)).unwrap();
            let id = outage_ticket(&f.store);

            let first = f.engine.sweep(&f.store, now());
            assert_eq!(first.tickets_scanned, 1);
            assert_eq!(first.rules_matched, 1);

            let ticket = f.store.get(id).unwrap();
            assert_eq!(ticket.escalation_level, 1);
            assert_eq!(ticket.assignee.as_deref(), Some("lead"));
            assert_eq!(ticket.priority, Priority::High);
            assert_eq!(ticket.applied_escalations, vec!["stale"]);

            let second = f.engine.sweep(&f.store, now() + Duration::hours(1));
            assert_eq!(second.rules_evaluated, 0);
            assert_eq!(f.store.get(id).unwrap().escalation_level, 1);

            let escalated = f
                .audit
                .history(id)
                .into_iter()
                .filter(|e| matches!(e.kind, AuditKind::Escalated { level: 1, .. }))
                .count();
            assert_eq!(escalated, 1);
        }

        #[test]
        fn threshold_not_reached() {
            let f = fixture();
            f.engine.add_rule(stale_rule(240)).unwrap();
            outage_ticket(&f.store);

            let result = f.engine.sweep(&f.store, now());
            assert_eq!(result.rules_evaluated, 1);
            assert_eq!(result.rules_matched, 0);
        }

        #[test]
        fn inactive_tickets_are_skipped() {
            let f = fixture();
            f.engine.add_rule(stale_rule(0)).unwrap();
            let id = outage_ticket(&f.store);
            f.store.transition(id, TicketStatus::Resolved, created()).unwrap();

            let result = f.engine.sweep(&f.store, now());
            assert_eq!(result.tickets_scanned, 0);

            let mut ticket = f.store.get(id).unwrap();
            assert_eq!(f.engine.run_escalation(&mut ticket, now()), EvaluationResult::default());
        }

        #[test]
        fn escalation_rules_ignore_automation_triggers() {
            let f = fixture();
            f.engine.add_rule(stale_rule(0)).unwrap();
            let id = outage_ticket(&f.store);

            let result = f.engine.automate(&f.store, id, Trigger::TicketCreated, now()).unwrap();
            assert_eq!(result.rules_evaluated, 0);
        }

        #[test]
        fn conditions_still_apply() {
            let f = fixture();
            let mut rule = stale_rule(0);
            rule.conditions = ConditionSet::all().with(cond(Field::Priority, Operator::Equals, "urgent"));
            f.engine.add_rule(rule).unwrap();
            outage_ticket(&f.store);

            assert_eq!(f.engine.sweep(&f.store, now()).rules_matched, 0);
        }
    }

    mod dry_run_tests {
        use super::*;

        #[test]
        fn reports_conditions_and_preview_without_mutating() {
            let f = fixture();
            let rule = automation("Finance urgent", 0)
                .conditions(
                    ConditionSet::all()
                        .with(cond(Field::Department, Operator::Equals, "finance"))
                        .with(cond(Field::Assignee, Operator::IsEmpty, serde_json::Value::Null)),
                )
                .action(Action::SetPriority { priority: Priority::Urgent })
                .action(Action::Notify { recipients: vec![Recipient::Requester], message: "hi".into() })
                .build()
                .unwrap();
            let id = outage_ticket(&f.store);
            let ticket = f.store.get(id).unwrap();

            let report = f.engine.dry_run(&rule, &ticket, now());
            assert!(report.matched);
            assert_eq!(report.threshold_reached, None);
            assert!(report.conditions.iter().all(|c| c.matched));
            assert_eq!(report.changes.len(), 1);
            assert_eq!(report.notifications, 1);

            assert_eq!(f.store.get(id).unwrap(), ticket);
            assert!(f.outbox.is_empty());
            assert!(f.audit.is_empty());
        }

        #[test]
        fn escalation_threshold_reported() {
            let f = fixture();
            let rule = Rule::builder("Old", RuleKind::escalation(600, EscalationBasis::SinceCreated))
                .action(Action::Escalate { assign_to: None, raise_priority: false })
                .build()
                .unwrap();
            let id = outage_ticket(&f.store);

            let report = f.engine.dry_run(&rule, &f.store.get(id).unwrap(), now());
            assert_eq!(report.threshold_reached, Some(false));
            assert!(!report.matched);
            assert!(report.changes.is_empty());
        }

        #[test]
        fn failing_actions_listed() {
            let f = fixture();
            let rule = automation("Notify assignee", 0)
                .action(Action::Notify { recipients: vec![Recipient::Assignee], message: "hi".into() })
                .build()
                .unwrap();
            let id = outage_ticket(&f.store);

            let report = f.engine.dry_run(&rule, &f.store.get(id).unwrap(), now());
            assert_eq!(report.errors, vec!["notify failed: no resolvable recipient"]);
        }
    }

    #[test]
    fn merge_adds_counts() {
        let mut a = EvaluationResult {
            tickets_scanned: 1,
            rules_matched: 1,
            matched_rules: vec!["x".into()],
            ..EvaluationResult::default()
        };
        a.merge(EvaluationResult {
            tickets_scanned: 2,
            notifications_sent: 3,
            matched_rules: vec!["y".into()],
            ..EvaluationResult::default()
        });
        assert_eq!(a.tickets_scanned, 3);
        assert_eq!(a.notifications_sent, 3);
        assert_eq!(a.matched_rules, vec!["x", "y"]);
    }
}
