//! Moderation
//!
//! This example demonstrates dynamically resolved targets and access
//! requirements.
//!
//! Key concepts:
//! - ReturnValue targets: the business method decides the landing state
//! - Computed targets: a resolver maps invocation arguments to a state
//! - Allow-lists constraining dynamic targets
//! - Named permissions checked against an actor
//! - Enumerating the transitions available to an actor
//!
//! Run with: cargo run --example moderation

use stateflow::builder::{FsmBuilder, TransitionBuilder};
use stateflow::engine::StateField;
use stateflow::events::CallArgs;
use stateflow::state_enum;
use stateflow::{Actor, Permission};

state_enum! {
    pub enum TicketState {
        Submitted,
        Approved,
        Rejected,
        Escalated,
    }
}

struct Ticket {
    reporter: String,
    spam_score: f32,
    state: TicketState,
}

struct Moderator {
    grants: Vec<&'static str>,
}

impl Actor<Ticket> for Moderator {
    fn has_perm(&self, permission: &str, _ticket: Option<&Ticket>) -> bool {
        self.grants.contains(&permission)
    }
}

fn ticket_state() -> StateField<Ticket, TicketState> {
    StateField::new(
        "state",
        |ticket: &Ticket| ticket.state.clone(),
        |ticket: &mut Ticket, state| ticket.state = state,
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let fsm = FsmBuilder::new(ticket_state())
        // the business method returns the landing state
        .transition(
            TransitionBuilder::new("triage")
                .source(TicketState::Submitted)
                .target_returned_in([TicketState::Approved, TicketState::Rejected])
                .permission(Permission::named("tickets.triage")),
        )?
        // a resolver inspects the invocation arguments
        .transition(
            TransitionBuilder::new("close")
                .sources([TicketState::Approved, TicketState::Rejected])
                .target_computed_in(
                    |_ticket: &Ticket, args: &CallArgs| {
                        match args.kwargs.get("disputed").and_then(|v| v.as_bool()) {
                            Some(true) => TicketState::Escalated,
                            _ => TicketState::Rejected,
                        }
                    },
                    [TicketState::Escalated, TicketState::Rejected],
                )
                .permission(Permission::named("tickets.close")),
        )?
        .build()?;

    let mut ticket = Ticket {
        reporter: "ada".to_string(),
        spam_score: 0.93,
        state: TicketState::Submitted,
    };

    let triager = Moderator {
        grants: vec!["tickets.triage"],
    };
    let closer = Moderator {
        grants: vec!["tickets.close"],
    };

    println!("Transitions available to each actor from Submitted:");
    for (label, actor) in [("triager", &triager), ("closer", &closer)] {
        let names: Vec<&str> = fsm
            .available_actor_transitions(&ticket, actor)
            .iter()
            .map(|t| t.name())
            .collect();
        println!("  {label}: {names:?}");
    }

    if !fsm.has_transition_perm(&ticket, "triage", &closer) {
        println!("\nThe closer may not triage {}'s ticket", ticket.reporter);
    }

    println!("\nTriaging (the method picks the state):");
    let landed = fsm.change_state(&mut ticket, "triage", &CallArgs::none(), |ticket| {
        if ticket.spam_score > 0.8 {
            Ok(TicketState::Rejected)
        } else {
            Ok(TicketState::Approved)
        }
    })?;
    println!("  landed in {landed:?}");

    println!("\nClosing with a dispute (the resolver reads the arguments):");
    let args = CallArgs::none().kwarg("disputed", true);
    fsm.change_state(&mut ticket, "close", &args, |_| Ok(()))?;
    println!("  final state: {:?}", ticket.state);

    Ok(())
}
