//! Automation and escalation rules for helpdesk tickets.
//!
//! `desk-rules` evaluates ordered rules against tickets. Automation rules run
//! when something happens to a ticket; escalation rules run from a periodic
//! sweep once a ticket has waited long enough.
//!
//! # Features
//!
//! - **Conditions**: field/operator/value tests combined with all/any
//! - **Actions**: priority, status, assignment, tags, custom fields, comments,
//!   notifications and escalation
//! - **Escalation**: time thresholds on creation, last update or resolution due,
//!   firing at most once per ticket and rule
//! - **Dry run**: explains a rule against a ticket without touching it
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use desk_core::{NewTicket, Priority, TicketStore};
//! use desk_rules::{Action, Condition, ConditionSet, Field, Operator, Rule, RuleEngine, RuleKind, Trigger};
//!
//! let engine = RuleEngine::new();
//! engine.add_rule(
//!     Rule::builder("Outages are urgent", RuleKind::automation([Trigger::TicketCreated]))
//!         .conditions(ConditionSet::all().with(Condition::new(Field::Subject, Operator::Contains, "outage")?))
//!         .action(Action::SetPriority { priority: Priority::Urgent })
//!         .build()?,
//! )?;
//!
//! let store = TicketStore::default();
//! let ticket = store.create(NewTicket::new("Mail outage", "", "alice"), Utc::now())?;
//! let result = engine.automate(&store, ticket.id, Trigger::TicketCreated, Utc::now())?;
//!
//! assert_eq!(result.rules_matched, 1);
//! assert_eq!(store.require(ticket.id)?.priority, Priority::Urgent);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actions;
pub mod condition;
pub mod engine;
pub mod error;
pub mod rule;

pub use actions::{AUTOMATION_AUTHOR, Action, ActionContext, ActionOutcome, Recipient};
pub use condition::{Condition, ConditionResult, ConditionSet, Field, MatchMode, Operator};
pub use engine::{DryRun, EvaluationResult, RuleEngine};
pub use error::{Result, RuleError};
pub use rule::{EscalationBasis, Rule, RuleBuilder, RuleKind, Trigger, parse_rules};
