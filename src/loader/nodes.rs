//! Node loader: one mutation, one transaction per entity type

use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info};
use vidgraph_sdk::{GraphClient, Mutation};

use super::report::NodeLoadReport;
use crate::config::RetryPolicy;
use crate::error::{VidgraphError, VidgraphResult};
use crate::model::EntityKind;
use crate::retry::with_retry;
use crate::source::{read_table, Row, Table};
use crate::txn;

fn parse_number<T: std::str::FromStr>(table: &Table, row: &Row, column: &str) -> VidgraphResult<T> {
    let raw = table.field(row, column)?;
    raw.trim().parse().map_err(|_| {
        VidgraphError::source_error(
            &table.path,
            format!("row {}: '{}' is not a valid {} value", row.number, raw, column),
        )
    })
}

/// Build the set object for one row
fn node_object(entity: EntityKind, blank: &str, table: &Table, row: &Row) -> VidgraphResult<Value> {
    let uid = format!("_:{}", blank);
    let ty = entity.type_name();
    let object = match entity {
        EntityKind::Comment => json!({
            "uid": uid,
            "dgraph.type": ty,
            "text": table.field(row, "text")?,
        }),
        EntityKind::Playlist => json!({
            "uid": uid,
            "dgraph.type": ty,
            "title": table.field(row, "title")?,
            "visibility": table.field(row, "visibility")?,
        }),
        EntityKind::User => {
            let lat: f64 = parse_number(table, row, "location.lat")?;
            let long: f64 = parse_number(table, row, "location.long")?;
            json!({
                "uid": uid,
                "dgraph.type": ty,
                "username": table.field(row, "username")?,
                "email": table.field(row, "email")?,
                "location": { "type": "Point", "coordinates": [long, lat] },
            })
        }
        EntityKind::Video => {
            let duration: i64 = parse_number(table, row, "duration")?;
            json!({
                "uid": uid,
                "dgraph.type": ty,
                "title": table.field(row, "title")?,
                "description": table.field(row, "description")?,
                "duration": duration,
                "date_uploaded": table.field(row, "date_uploaded")?.trim(),
            })
        }
    };
    Ok(object)
}

/// Insert every row of `table` as a node of `entity`.
///
/// All rows go out as a single mutation in a single transaction, so
/// either every node of the type is created or none is. Malformed rows
/// fail the batch before anything is sent.
pub async fn load_nodes<C>(
    client: &C,
    entity: EntityKind,
    table: &Table,
    retry: &RetryPolicy,
) -> VidgraphResult<NodeLoadReport>
where
    C: GraphClient + ?Sized,
{
    let mut report = NodeLoadReport::new(entity);
    if table.rows.is_empty() {
        info!("No {} rows in {}", entity, table.path.display());
        return Ok(report);
    }

    let mut objects = Vec::with_capacity(table.rows.len());
    let mut blanks = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let blank = format!("{}{}", entity.blank_prefix(), row.number);
        objects.push(node_object(entity, &blank, table, row)?);
        let key = table.field(row, entity.key_predicate())?.to_string();
        blanks.push((blank, key));
    }

    debug!("Submitting {} {} nodes", objects.len(), entity);
    let mutation = Mutation::set(objects);
    let response = with_retry(retry, &format!("{} batch", entity), || {
        txn::write(client, &mutation)
    })
    .await
    .map_err(VidgraphError::from_mutation)?;

    for (blank, key) in blanks {
        let uid = *response.uids.get(&blank).ok_or_else(|| {
            VidgraphError::Response(format!("no uid assigned to {} node {}", entity, blank))
        })?;
        report.keys.push((key, uid));
        report.uids.insert(blank, uid);
    }

    info!("Loaded {} {} nodes", report.len(), entity);
    Ok(report)
}

/// Read `path` and load its rows as `entity` nodes
pub async fn load_nodes_from_file<C>(
    client: &C,
    entity: EntityKind,
    path: &Path,
    retry: &RetryPolicy,
) -> VidgraphResult<NodeLoadReport>
where
    C: GraphClient + ?Sized,
{
    let table = read_table(path, entity.required_columns())?;
    load_nodes(client, entity, &table, retry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn table(headers: &[&str], rows: Vec<Row>) -> Table {
        Table {
            path: PathBuf::from("videos.csv"),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_user_location_becomes_geo_point() {
        let t = table(
            &["username", "email", "location.lat", "location.long"],
            vec![Row::from_pairs(
                1,
                &[("username", "ana"), ("email", "a@x.io"), ("location.lat", "40.5"), ("location.long", "-3.25")],
            )],
        );
        let obj = node_object(EntityKind::User, "u1", &t, &t.rows[0]).unwrap();
        assert_eq!(obj["uid"], "_:u1");
        assert_eq!(obj["dgraph.type"], "User");
        assert_eq!(obj["location"]["coordinates"], json!([-3.25, 40.5]));
    }

    #[test]
    fn test_video_duration_must_be_integer() {
        let t = table(
            &["title", "description", "duration", "date_uploaded"],
            vec![Row::from_pairs(
                3,
                &[("title", "A"), ("description", "d"), ("duration", "long"), ("date_uploaded", "2024-01-01T10:00:00Z")],
            )],
        );
        let err = node_object(EntityKind::Video, "v3", &t, &t.rows[0]).unwrap_err();
        assert!(err.to_string().contains("row 3: 'long' is not a valid duration value"));
    }
}
