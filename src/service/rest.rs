//! Domain operations behind the command table.
//! Every operation works against the in-memory `ObjectStore`; nothing here schedules or executes anything.
//! An entity outside the caller's scope is treated as absent by every operation.

use crate::access::{Access, AccessScope};
use crate::error::ServiceError;
use crate::model::{
    decode_payload, kinds, new_id, Ability, Adversary, Agent, Fact, Link, LinkStatus, Operation, OperationState, Payload,
    Resource,
};
use crate::service::{ConfigStore, ObjectStore};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const DELETE_COMPLETED: &str = "Delete action completed";

const MISSING: &str = "Missing data for required field.";
const PLAIN_TEXT: &str = "plain-text";

/// Keyword arguments of `get_potential_links`.
#[derive(Clone, Debug, Deserialize)]
pub struct PotentialLinksQuery {
    pub op_id: String,
    #[serde(default)]
    pub paw: Option<String>,
}

/// Keyword arguments of `update_operation`.
#[derive(Clone, Debug, Deserialize)]
pub struct OperationPatch {
    pub op_id: String,
    #[serde(default)]
    pub state: Option<OperationState>,
    #[serde(default)]
    pub autonomous: Option<bool>,
    #[serde(default)]
    pub obfuscator: Option<String>,
}

/// Keyword arguments of `task_agent_with_ability`.
#[derive(Clone, Debug, Deserialize)]
pub struct TaskRequest {
    pub paw: String,
    pub ability_id: String,
    #[serde(default)]
    pub obfuscator: Option<String>,
    #[serde(default)]
    pub facts: Vec<Fact>,
}

#[derive(Deserialize)]
struct ChainUpdate {
    link_id: String,
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    command: Option<String>,
}

pub struct RestService {
    store: Arc<ObjectStore>,
    config: ConfigStore,
}

impl RestService {
    pub fn new(store: Arc<ObjectStore>, config: ConfigStore) -> Self {
        RestService { store, config }
    }

    // Deletes: idempotent, always the same confirmation, even when the entity is out of scope.

    pub async fn delete_agent(&self, payload: Payload, scope: AccessScope) -> Result<Value, ServiceError> {
        self.delete(kinds::AGENTS, "paw", &payload, &scope)
    }

    pub async fn delete_operation(&self, payload: Payload, scope: AccessScope) -> Result<Value, ServiceError> {
        self.delete(kinds::OPERATIONS, "id", &payload, &scope)
    }

    pub async fn delete_ability(&self, payload: Payload, scope: AccessScope) -> Result<Value, ServiceError> {
        self.delete(kinds::ABILITIES, "ability_id", &payload, &scope)
    }

    pub async fn delete_adversary(&self, payload: Payload, scope: AccessScope) -> Result<Value, ServiceError> {
        self.delete(kinds::ADVERSARIES, "adversary_id", &payload, &scope)
    }

    fn delete(&self, kind: &str, id_field: &str, payload: &Payload, scope: &AccessScope) -> Result<Value, ServiceError> {
        let id = required_str(payload, id_field)?;
        if self.store.remove_if(kind, &id, |r| scope.allows(r.access()))?.is_some() {
            tracing::info!(kind, id = %id, "deleted");
        }
        Ok(Value::String(DELETE_COMPLETED.into()))
    }

    // Persists: upsert by id, stamped with the caller's access.

    pub async fn persist_adversary(&self, payload: Payload, scope: AccessScope) -> Result<Resource, ServiceError> {
        self.persist(kinds::ADVERSARIES, "adversary_id", payload, &scope)
    }

    pub async fn persist_ability(&self, payload: Payload, scope: AccessScope) -> Result<Resource, ServiceError> {
        self.persist(kinds::ABILITIES, "ability_id", payload, &scope)
    }

    pub async fn persist_source(&self, payload: Payload, scope: AccessScope) -> Result<Resource, ServiceError> {
        self.persist(kinds::SOURCES, "id", payload, &scope)
    }

    fn persist(
        &self,
        kind: &str,
        id_field: &str,
        mut payload: Payload,
        scope: &AccessScope,
    ) -> Result<Resource, ServiceError> {
        stamp_access(&mut payload, scope)?;
        let id = ensure_id(&mut payload, id_field);
        self.check_owner(kind, &id, scope)?;
        let resource = Resource::from_payload(kind, payload)?;
        let stored = self.store.upsert(resource)?;
        tracing::info!(kind, id = %id, access = %stored.access(), "persisted");
        Ok(stored)
    }

    /// An existing entity may only be replaced by a caller that can see it.
    fn check_owner(&self, kind: &str, id: &str, scope: &AccessScope) -> Result<(), ServiceError> {
        match self.store.get(kind, id)? {
            Some(existing) if !scope.allows(existing.access()) => {
                Err(ServiceError::Conflict(format!("{} '{}' already exists", kind, id)))
            }
            _ => Ok(()),
        }
    }

    // Patches of existing entities. The stored access tag is never changed by a patch.

    pub async fn update_planner(&self, payload: Payload, scope: AccessScope) -> Result<Resource, ServiceError> {
        let id = required_str(&payload, "id")?;
        self.patch(kinds::PLANNERS, &id, payload, &scope)
    }

    pub async fn update_agent_data(&self, payload: Payload, scope: AccessScope) -> Result<Resource, ServiceError> {
        let paw = required_str(&payload, "paw")?;
        let mut changes = payload;
        changes.insert("last_seen".into(), json!(Utc::now()));
        self.patch(kinds::AGENTS, &paw, changes, &scope)
    }

    fn patch(&self, kind: &str, id: &str, mut changes: Payload, scope: &AccessScope) -> Result<Resource, ServiceError> {
        let requested = match changes.remove("access") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_access(value)?),
        };
        let updated = self.store.update(kind, id, |resource| {
            ensure_visible(resource, scope)?;
            if requested.is_some_and(|access| access != resource.access()) {
                return Err(ServiceError::invalid("access", "Access cannot be changed by an update."));
            }
            let mut fields = resource.to_fields()?;
            fields.extend(changes);
            *resource = Resource::from_payload(kind, fields)?;
            Ok(())
        })?;
        tracing::info!(kind, id, "updated");
        Ok(updated)
    }

    pub async fn update_chain_data(&self, payload: Payload, scope: AccessScope) -> Result<Resource, ServiceError> {
        let update: ChainUpdate = decode_payload(payload)?;
        let updated = self.store.update(kinds::LINKS, &update.link_id, |resource| {
            ensure_visible(resource, &scope)?;
            let Resource::Link(link) = resource else {
                return Err(ServiceError::Internal("links store holds a non-link".into()));
            };
            if let Some(status) = update.status {
                link.status = status;
                if status != LinkStatus::EXECUTE {
                    link.finish = Some(Utc::now());
                }
            }
            if let Some(command) = update.command {
                link.command = command;
            }
            Ok(())
        })?;
        if let Resource::Link(link) = &updated {
            self.sync_chain(link)?;
        }
        Ok(updated)
    }

    /// Mirror a stored link into its operation's chain.
    fn sync_chain(&self, link: &Link) -> Result<(), ServiceError> {
        let Some(op_id) = &link.operation else {
            return Ok(());
        };
        let result = self.store.update(kinds::OPERATIONS, op_id, |resource| {
            if let Resource::Operation(op) = resource {
                if let Some(slot) = op.chain.iter_mut().find(|l| l.id == link.id) {
                    *slot = link.clone();
                }
            }
            Ok(())
        });
        match result {
            Ok(_) | Err(ServiceError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    // Creation of operations and schedules.

    pub async fn create_operation(&self, mut payload: Payload, scope: AccessScope) -> Result<Resource, ServiceError> {
        stamp_access(&mut payload, &scope)?;
        let id = ensure_id(&mut payload, "id");
        self.check_owner(kinds::OPERATIONS, &id, &scope)?;
        let mut operation: Operation = decode_payload(payload)?;
        if operation.name.trim().is_empty() {
            return Err(ServiceError::invalid("name", MISSING));
        }
        if !operation.adversary_id.is_empty() {
            self.adversary(&operation.adversary_id, &scope)
                .map_err(|_| ServiceError::invalid("adversary_id", format!("Unknown adversary: {}.", operation.adversary_id)))?;
        }
        operation.state = OperationState::Running;
        operation.start = Some(Utc::now());
        operation.finish = None;
        operation.chain.clear();
        let stored = self.store.upsert(Resource::Operation(operation))?;
        tracing::info!(id = %id, "operation created");
        Ok(stored)
    }

    pub async fn create_schedule(&self, mut payload: Payload, scope: AccessScope) -> Result<Resource, ServiceError> {
        let cron = required_str(&payload, "cron")?;
        if cron.split_whitespace().count() != 5 {
            return Err(ServiceError::invalid("cron", "Cron expression must have five fields."));
        }
        stamp_access(&mut payload, &scope)?;
        let id = ensure_id(&mut payload, "id");
        self.check_owner(kinds::SCHEDULE, &id, &scope)?;
        payload.insert("created".into(), json!(Utc::now()));
        let stored = self.store.upsert(Resource::from_payload(kinds::SCHEDULE, payload)?)?;
        tracing::info!(id = %id, cron = %cron, "schedule stored");
        Ok(stored)
    }

    // Links.

    pub async fn apply_potential_link(&self, mut payload: Payload, scope: AccessScope) -> Result<Resource, ServiceError> {
        let op_id = required_str(&payload, "op_id")?;
        payload.remove("op_id");
        let operation = self.operation(&op_id, &scope)?;
        payload.insert("operation".into(), json!(operation.id));
        ensure_id(&mut payload, "id");
        if payload.get("access").map_or(true, Value::is_null) {
            payload.insert("access".into(), json!(operation.access));
        } else {
            stamp_access(&mut payload, &scope)?;
        }
        let mut link: Link = decode_payload(payload)?;
        if link.paw.is_empty() {
            return Err(ServiceError::invalid("paw", MISSING));
        }
        if link.ability_id.is_empty() {
            return Err(ServiceError::invalid("ability_id", MISSING));
        }
        if link.command.is_empty() {
            let agent = self.agent(&link.paw, &scope)?;
            link.command = self.command_for(&agent, &link.ability_id, &[], &scope)?;
        }
        link.decide = Some(Utc::now());
        // The chain is extended first so a vanished operation leaves no stored link behind.
        self.store.update(kinds::OPERATIONS, &op_id, |resource| {
            if let Resource::Operation(op) = resource {
                op.chain.push(link.clone());
            }
            Ok(())
        })?;
        let stored = self.store.upsert(Resource::Link(link))?;
        tracing::info!(op_id = %op_id, link = %stored.id(), "link applied");
        Ok(stored)
    }

    /// One unqueued link per ability in the adversary's ordering, per agent in the operation's group.
    pub async fn get_potential_links(&self, query: PotentialLinksQuery, scope: AccessScope) -> Result<Vec<Resource>, ServiceError> {
        let operation = self.operation(&query.op_id, &scope)?;
        let Ok(adversary) = self.adversary(&operation.adversary_id, &scope) else {
            return Ok(Vec::new());
        };
        let mut proposals = Vec::new();
        for resource in self.visible_all(kinds::AGENTS, &scope)? {
            let Resource::Agent(agent) = resource else { continue };
            if agent.group != operation.group {
                continue;
            }
            if query.paw.as_deref().is_some_and(|paw| paw != agent.paw) {
                continue;
            }
            for ability_id in &adversary.atomic_ordering {
                if operation.has_link(&agent.paw, ability_id) {
                    continue;
                }
                let Ok(command) = self.command_for(&agent, ability_id, &[], &scope) else {
                    continue;
                };
                let mut link = Link::new(&agent.paw, ability_id, command, operation.access);
                link.operation = Some(operation.id.clone());
                proposals.push(Resource::Link(link));
            }
        }
        Ok(proposals)
    }

    pub async fn update_operation(&self, patch: OperationPatch, scope: AccessScope) -> Result<Resource, ServiceError> {
        if let Some(obfuscator) = &patch.obfuscator {
            check_obfuscator(obfuscator)?;
        }
        let updated = self.store.update(kinds::OPERATIONS, &patch.op_id, |resource| {
            ensure_visible(resource, &scope)?;
            let Resource::Operation(op) = resource else {
                return Err(ServiceError::Internal("operations store holds a non-operation".into()));
            };
            if let Some(state) = patch.state {
                op.state = state;
                if state == OperationState::Finished {
                    op.finish = Some(Utc::now());
                }
            }
            if let Some(autonomous) = patch.autonomous {
                op.autonomous = autonomous;
            }
            if let Some(obfuscator) = patch.obfuscator {
                op.obfuscator = obfuscator;
            }
            Ok(())
        })?;
        tracing::info!(op_id = %patch.op_id, "operation updated");
        Ok(updated)
    }

    pub async fn task_agent_with_ability(&self, task: TaskRequest, scope: AccessScope) -> Result<Resource, ServiceError> {
        check_obfuscator(task.obfuscator.as_deref().unwrap_or(PLAIN_TEXT))?;
        let agent = self.agent(&task.paw, &scope)?;
        let command = self.command_for(&agent, &task.ability_id, &task.facts, &scope)?;
        let link = Link::new(&agent.paw, &task.ability_id, command, agent.access);
        let stored = self.store.upsert(Resource::Link(link.clone()))?;
        self.store.update(kinds::AGENTS, &agent.paw, |resource| {
            if let Resource::Agent(a) = resource {
                a.pending_links.push(link.id);
            }
            Ok(())
        })?;
        tracing::info!(paw = %task.paw, ability_id = %task.ability_id, "agent tasked");
        Ok(stored)
    }

    // Reads.

    pub async fn display_operation_report(&self, payload: Payload, scope: AccessScope) -> Result<Value, ServiceError> {
        let op_id = required_str(&payload, "op_id")?;
        let agent_output = payload.get("agent_output").and_then(Value::as_bool).unwrap_or(false);
        let operation = self.operation(&op_id, &scope)?;
        let adversary = self.adversary(&operation.adversary_id, &scope).ok();
        let host_group: Vec<Value> = self
            .visible_all(kinds::AGENTS, &scope)?
            .into_iter()
            .filter_map(|r| match r {
                Resource::Agent(a) if a.group == operation.group => Some(json!({"paw": a.paw, "host": a.host, "platform": a.platform})),
                _ => None,
            })
            .collect();
        let mut steps: Map<String, Value> = Map::new();
        for link in &operation.chain {
            let mut step = json!({
                "link_id": link.id,
                "ability_id": link.ability_id,
                "command": link.command,
                "status": link.status,
                "decide": link.decide,
                "finish": link.finish,
            });
            if agent_output {
                step["output"] = json!(link.output.clone().unwrap_or_default());
            }
            let entry = steps.entry(link.paw.clone()).or_insert_with(|| json!({"steps": []}));
            if let Some(list) = entry["steps"].as_array_mut() {
                list.push(step);
            }
        }
        Ok(json!({
            "id": operation.id,
            "name": operation.name,
            "state": operation.state,
            "start": operation.start,
            "finish": operation.finish,
            "planner": operation.planner,
            "jitter": operation.jitter,
            "adversary": adversary.map(|a| json!({"adversary_id": a.adversary_id, "name": a.name})),
            "host_group": host_group,
            "steps": steps,
        }))
    }

    pub async fn display_result(&self, payload: Payload, scope: AccessScope) -> Result<Value, ServiceError> {
        let link_id = required_str(&payload, "link_id")?;
        let link = match self.visible(kinds::LINKS, &link_id, &scope)? {
            Some(Resource::Link(link)) => link,
            _ => return Err(ServiceError::NotFound(format!("link '{}'", link_id))),
        };
        let output = link.output.clone().unwrap_or_default();
        Ok(json!({ "link": Resource::Link(link).to_fields()?, "output": output }))
    }

    pub async fn download_contact_report(&self, payload: Payload, scope: AccessScope) -> Result<Value, ServiceError> {
        let contact = required_str(&payload, "contact")?;
        let agents: Vec<Value> = self
            .visible_all(kinds::AGENTS, &scope)?
            .into_iter()
            .filter_map(|r| match r {
                Resource::Agent(a) if a.contact.eq_ignore_ascii_case(&contact) => {
                    Some(json!({"paw": a.paw, "last_seen": a.last_seen, "created": a.created}))
                }
                _ => None,
            })
            .collect();
        Ok(json!({ "contact": contact, "count": agents.len(), "agents": agents }))
    }

    pub async fn update_config(&self, payload: Payload) -> Result<Value, ServiceError> {
        let prop = required_str(&payload, "prop")?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);
        let config = self.config.set(&prop, value)?;
        tracing::info!(prop = %prop, "configuration updated");
        Ok(config)
    }

    // Scoped lookups.

    fn visible(&self, kind: &str, id: &str, scope: &AccessScope) -> Result<Option<Resource>, ServiceError> {
        Ok(self.store.get(kind, id)?.filter(|r| scope.allows(r.access())))
    }

    fn visible_all(&self, kind: &str, scope: &AccessScope) -> Result<Vec<Resource>, ServiceError> {
        let mut items = self.store.all(kind)?;
        items.retain(|r| scope.allows(r.access()));
        Ok(items)
    }

    fn operation(&self, id: &str, scope: &AccessScope) -> Result<Operation, ServiceError> {
        match self.visible(kinds::OPERATIONS, id, scope)? {
            Some(Resource::Operation(op)) => Ok(op),
            _ => Err(ServiceError::NotFound(format!("operation '{}'", id))),
        }
    }

    fn adversary(&self, id: &str, scope: &AccessScope) -> Result<Adversary, ServiceError> {
        match self.visible(kinds::ADVERSARIES, id, scope)? {
            Some(Resource::Adversary(a)) => Ok(a),
            _ => Err(ServiceError::NotFound(format!("adversary '{}'", id))),
        }
    }

    fn agent(&self, paw: &str, scope: &AccessScope) -> Result<Agent, ServiceError> {
        match self.visible(kinds::AGENTS, paw, scope)? {
            Some(Resource::Agent(a)) => Ok(a),
            _ => Err(ServiceError::NotFound(format!("agent '{}'", paw))),
        }
    }

    fn ability(&self, id: &str, scope: &AccessScope) -> Result<Ability, ServiceError> {
        match self.visible(kinds::ABILITIES, id, scope)? {
            Some(Resource::Ability(a)) => Ok(a),
            _ => Err(ServiceError::NotFound(format!("ability '{}'", id))),
        }
    }

    /// The agent-specific command for an ability, with `#{trait}` placeholders filled from `facts`.
    fn command_for(
        &self,
        agent: &Agent,
        ability_id: &str,
        facts: &[Fact],
        scope: &AccessScope,
    ) -> Result<String, ServiceError> {
        let ability = self.ability(ability_id, scope)?;
        let executor = ability.command_for(&agent.platform, &agent.executors).ok_or_else(|| {
            ServiceError::invalid(
                "ability_id",
                format!("Ability {} has no executor for platform {}.", ability_id, agent.platform),
            )
        })?;
        let mut command = executor.command.clone();
        for fact in facts {
            command = command.replace(&format!("#{{{}}}", fact.trait_), &fact.value);
        }
        Ok(command)
    }
}

fn required_str(payload: &Payload, field: &str) -> Result<String, ServiceError> {
    match payload.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ServiceError::invalid(field, MISSING)),
    }
}

fn ensure_id(payload: &mut Payload, field: &str) -> String {
    match payload.get(field).and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = new_id();
            payload.insert(field.to_string(), json!(id));
            id
        }
    }
}

fn parse_access(value: Value) -> Result<Access, ServiceError> {
    serde_json::from_value(value).map_err(|_| ServiceError::invalid("access", "Must be one of: app, red, blue, hidden."))
}

/// Out-of-scope entities answer exactly like missing ones.
fn ensure_visible(resource: &Resource, scope: &AccessScope) -> Result<(), ServiceError> {
    if scope.allows(resource.access()) {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("{} '{}'", resource.index(), resource.id())))
    }
}

/// Default to the caller's primary access; refuse tags outside the caller's scope.
fn stamp_access(payload: &mut Payload, scope: &AccessScope) -> Result<Access, ServiceError> {
    let access = match payload.get("access") {
        None | Some(Value::Null) => scope.primary().unwrap_or_default(),
        Some(value) => parse_access(value.clone())?,
    };
    if !scope.allows(access) {
        return Err(ServiceError::invalid("access", format!("Access {} is outside the caller's scope.", access)));
    }
    payload.insert("access".into(), json!(access));
    Ok(access)
}

fn check_obfuscator(name: &str) -> Result<(), ServiceError> {
    if name == PLAIN_TEXT {
        Ok(())
    } else {
        Err(ServiceError::invalid("obfuscator", format!("Unknown obfuscator: {}.", name)))
    }
}
