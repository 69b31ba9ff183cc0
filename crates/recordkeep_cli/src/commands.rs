//! Subcommand dispatch and the JSON output envelope.

use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};
use recordkeep_core::{
    parse_record_id, seed_music, seed_real_estate, Album, Artist, AssociationSet, Category,
    ClientRequest, Country, Entity, EntityKind, EntityStore, Playlist, PlaylistRepository,
    Property, PropertyRepository, RecordId, Repository, SeedOutcome, StoreError, StoreResult,
    Track,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{Command, SeedTarget};

/// Binds `$ty` to the record type of `$kind` and evaluates `$body`.
macro_rules! with_entity {
    ($kind:expr, $ty:ident => $body:expr) => {
        match $kind {
            EntityKind::Property => {
                type $ty = Property;
                $body
            }
            EntityKind::ClientRequest => {
                type $ty = ClientRequest;
                $body
            }
            EntityKind::Country => {
                type $ty = Country;
                $body
            }
            EntityKind::Artist => {
                type $ty = Artist;
                $body
            }
            EntityKind::Album => {
                type $ty = Album;
                $body
            }
            EntityKind::Track => {
                type $ty = Track;
                $body
            }
            EntityKind::Playlist => {
                type $ty = Playlist;
                $body
            }
            EntityKind::Category => {
                type $ty = Category;
                $body
            }
        }
    };
}

/// Runs one command and prints its envelope.
pub(crate) fn execute(store: &EntityStore<'_>, command: Command) -> ExitCode {
    let (envelope, status) = respond(store, command);
    print_envelope(&envelope);
    ExitCode::from(status)
}

/// Envelope and exit status for one command.
fn respond(store: &EntityStore<'_>, command: Command) -> (Value, u8) {
    match dispatch(store, command) {
        Ok(data) => (json!({ "ok": true, "data": data }), 0),
        Err(err) => {
            warn!(
                "event=cli_command module=cli status=error code={} fatal={}",
                err.code(),
                err.is_fatal()
            );
            let envelope = json!({
                "ok": false,
                "error": { "code": err.code(), "message": err.to_string() },
            });
            (envelope, if err.is_fatal() { 1 } else { 2 })
        }
    }
}

pub(crate) fn print_startup_failure(err: &anyhow::Error) {
    print_envelope(&json!({
        "ok": false,
        "error": { "code": "startup_failed", "message": format!("{err:#}") },
    }));
}

fn print_envelope(envelope: &Value) {
    println!("{envelope}");
}

fn dispatch(store: &EntityStore<'_>, command: Command) -> StoreResult<Value> {
    match command {
        Command::List { kind } => {
            with_entity!(parse_kind(&kind)?, T => to_data(&store.list_all::<T>().collect::<StoreResult<Vec<T>>>()?))
        }
        Command::Get { kind, id } => {
            let id = parse_record_id(&id)?;
            with_entity!(parse_kind(&kind)?, T => to_data(&store.get::<T>(id)?))
        }
        Command::FindByField { kind, field, value } => {
            with_entity!(parse_kind(&kind)?, T => to_data(&Repository::<T>::new(*store).find_by_field_text(&field, &value)?))
        }
        Command::FindContains { kind, field, text } => {
            with_entity!(parse_kind(&kind)?, T => to_data(&Repository::<T>::new(*store).find_by_text_contains(&field, &text)?))
        }
        Command::Add { kind, json } => {
            with_entity!(parse_kind(&kind)?, T => added(store.add(&parse_body::<T>(&json)?)?))
        }
        Command::AddRequest { text } => {
            let request = ClientRequest::from_free_text(&text, now_millis())?;
            added(store.add(&request)?)
        }
        Command::Update { kind, id, json } => {
            let id = parse_record_id(&id)?;
            let updated = with_entity!(parse_kind(&kind)?, T => store.update(id, &parse_body::<T>(&json)?)?);
            Ok(json!({ "updated": updated }))
        }
        Command::Remove { kind, id } => {
            let removed = store.remove(parse_kind(&kind)?, parse_record_id(&id)?)?;
            Ok(json!({ "removed": removed }))
        }
        Command::Link {
            set,
            left_id,
            right_id,
        } => {
            let created = store.relationships().link(
                parse_set(&set)?,
                parse_record_id(&left_id)?,
                parse_record_id(&right_id)?,
            )?;
            Ok(json!({ "created": created }))
        }
        Command::Unlink {
            set,
            left_id,
            right_id,
        } => {
            let removed = store.relationships().unlink(
                parse_set(&set)?,
                parse_record_id(&left_id)?,
                parse_record_id(&right_id)?,
            )?;
            Ok(json!({ "removed": removed }))
        }
        Command::Associations { set, kind, id } => {
            let set = parse_set(&set)?;
            let kind = parse_kind(&kind)?;
            let id = parse_record_id(&id)?;
            let paired = set.paired_kind(kind).ok_or_else(|| {
                StoreError::malformed(format!(
                    "{kind} does not take part in association `{}`",
                    set.name
                ))
            })?;
            with_entity!(paired, T => to_data(&store.relationships().associations_for::<T>(set, kind, id)?))
        }
        Command::Describe { id } => {
            to_data(&PropertyRepository::new(*store).describe(parse_record_id(&id)?)?)
        }
        Command::Playlist { id } => {
            to_data(&PlaylistRepository::new(*store).render(parse_record_id(&id)?)?)
        }
        Command::Seed { target } => seed(store, target),
    }
}

fn seed(store: &EntityStore<'_>, target: SeedTarget) -> StoreResult<Value> {
    let mut results = Vec::new();
    if matches!(target, SeedTarget::RealEstate | SeedTarget::All) {
        let outcome = seed_real_estate(store, now_millis())?;
        results.push(seed_summary("real_estate", outcome));
    }
    if matches!(target, SeedTarget::Music | SeedTarget::All) {
        let outcome = seed_music(store)?;
        results.push(seed_summary("music", outcome));
    }
    info!("event=cli_seed module=cli status=ok target={target:?}");
    Ok(Value::Array(results))
}

fn seed_summary(domain: &str, outcome: SeedOutcome) -> Value {
    match outcome {
        SeedOutcome::Loaded { records } => {
            json!({ "domain": domain, "status": "loaded", "records": records })
        }
        SeedOutcome::Skipped => json!({ "domain": domain, "status": "skipped" }),
    }
}

fn parse_kind(raw: &str) -> StoreResult<EntityKind> {
    Ok(raw.parse::<EntityKind>()?)
}

fn parse_set(raw: &str) -> StoreResult<AssociationSet> {
    AssociationSet::by_name(raw)
        .ok_or_else(|| StoreError::malformed(format!("unknown association set `{raw}`")))
}

fn parse_body<T: Entity>(json: &str) -> StoreResult<T> {
    serde_json::from_str(json)
        .map_err(|err| StoreError::malformed(format!("invalid {} body: {err}", T::KIND)))
}

fn added(id: RecordId) -> StoreResult<Value> {
    Ok(json!({ "id": id }))
}

fn to_data<S: Serialize + ?Sized>(value: &S) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|err| StoreError::InvalidData(err.to_string()))
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
