//! The fixed command table served by `/api/rest`.

use crate::config::PolymorphicSchema;
use crate::error::ConfigError;
use crate::routing::{arguments, payload_only, scoped, Arguments, RoutingTable, Verb};
use crate::service::{OperationPatch, PotentialLinksQuery, RestService, TaskRequest};
use std::sync::Arc;

impl Arguments for PotentialLinksQuery {
    const REQUIRED: &'static [&'static str] = &["op_id"];
}

impl Arguments for OperationPatch {
    const REQUIRED: &'static [&'static str] = &["op_id"];
}

impl Arguments for TaskRequest {
    const REQUIRED: &'static [&'static str] = &["paw", "ability_id"];
}

/// Registers a `RestService` method under one route. `$adapter` picks how the payload reaches it.
macro_rules! route {
    ($builder:expr, $verb:expr, $index:expr, payload_only($required:expr), $rest:ident . $method:ident) => {{
        let svc = Arc::clone(&$rest);
        $builder.register(
            $verb,
            $index,
            payload_only($required, move |p| {
                let svc = Arc::clone(&svc);
                async move { svc.$method(p).await }
            }),
        )?
    }};
    ($builder:expr, $verb:expr, $index:expr, scoped($required:expr), $rest:ident . $method:ident) => {{
        let svc = Arc::clone(&$rest);
        $builder.register(
            $verb,
            $index,
            scoped($required, move |p, scope| {
                let svc = Arc::clone(&svc);
                async move { svc.$method(p, scope).await }
            }),
        )?
    }};
    ($builder:expr, $verb:expr, $index:expr, arguments::<$args:ty>, $rest:ident . $method:ident) => {{
        let svc = Arc::clone(&$rest);
        $builder.register(
            $verb,
            $index,
            arguments(move |args: $args, scope| {
                let svc = Arc::clone(&svc);
                async move { svc.$method(args, scope).await }
            }),
        )?
    }};
}

/// Build the routing table for every (verb, discriminator) pair the endpoint serves explicitly.
/// Pairs not listed here fall through to the scoped listing path. Every command that touches
/// stored entities receives the caller's scope.
pub fn command_table(rest: Arc<RestService>, schema: &PolymorphicSchema) -> Result<RoutingTable, ConfigError> {
    let b = RoutingTable::builder();

    let b = route!(b, Verb::Delete, "agents", scoped(&["paw"]), rest.delete_agent);
    let b = route!(b, Verb::Delete, "operations", scoped(&["id"]), rest.delete_operation);
    let b = route!(b, Verb::Delete, "abilities", scoped(&["ability_id"]), rest.delete_ability);
    let b = route!(b, Verb::Delete, "adversaries", scoped(&["adversary_id"]), rest.delete_adversary);

    let b = route!(b, Verb::Put, "adversaries", scoped(&[]), rest.persist_adversary);
    let b = route!(b, Verb::Put, "abilities", scoped(&[]), rest.persist_ability);
    let b = route!(b, Verb::Put, "sources", scoped(&[]), rest.persist_source);
    let b = route!(b, Verb::Put, "planners", scoped(&["id"]), rest.update_planner);
    let b = route!(b, Verb::Put, "agents", scoped(&["paw"]), rest.update_agent_data);
    let b = route!(b, Verb::Put, "chain", scoped(&["link_id"]), rest.update_chain_data);
    let b = route!(b, Verb::Put, "operations", scoped(&["name"]), rest.create_operation);
    let b = route!(b, Verb::Put, "schedule", scoped(&["cron"]), rest.create_schedule);
    let b = route!(b, Verb::Put, "link", scoped(&["op_id", "paw", "ability_id"]), rest.apply_potential_link);

    let b = route!(b, Verb::Post, "operation_report", scoped(&["op_id"]), rest.display_operation_report);
    let b = route!(b, Verb::Post, "result", scoped(&["link_id"]), rest.display_result);
    let b = route!(b, Verb::Post, "contact", scoped(&["contact"]), rest.download_contact_report);
    let b = route!(b, Verb::Post, "configuration", payload_only(&["prop"]), rest.update_config);
    let b = route!(b, Verb::Post, "link", arguments::<PotentialLinksQuery>, rest.get_potential_links);
    let b = route!(b, Verb::Post, "operation", arguments::<OperationPatch>, rest.update_operation);
    let b = route!(b, Verb::Post, "task", arguments::<TaskRequest>, rest.task_agent_with_ability);

    b.build(schema)
}
