use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{
    AuditLog, Invitation, Kpi, ObjectiveDependency, ObjectiveTemplate, OperationalKeyResult,
    Organization, StrategicObjective, Team, User,
};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "external_id": 1 }),
            index_unique(bson::doc! { "email": 1 }),
            index(bson::doc! { "organization_id": 1, "role": 1 }),
        ],
    )
    .await?;

    // Organizations
    create_indexes(
        db,
        Organization::COLLECTION,
        vec![index(bson::doc! { "name": 1 })],
    )
    .await?;

    // Teams
    create_indexes(
        db,
        Team::COLLECTION,
        vec![
            index(bson::doc! { "organization_id": 1, "name": 1 }),
            index(bson::doc! { "members.user_id": 1 }),
        ],
    )
    .await?;

    // Invitations
    create_indexes(
        db,
        Invitation::COLLECTION,
        vec![
            index_unique(bson::doc! { "token": 1 }),
            index(bson::doc! { "team_id": 1, "status": 1 }),
            index(bson::doc! { "email": 1, "status": 1 }),
            index(bson::doc! { "status": 1, "expires_at": 1 }),
        ],
    )
    .await?;

    // Objectives
    create_indexes(
        db,
        StrategicObjective::COLLECTION,
        vec![
            index(bson::doc! { "team_id": 1, "start_date": 1 }),
            index(bson::doc! { "organization_id": 1 }),
        ],
    )
    .await?;

    // Key results
    create_indexes(
        db,
        OperationalKeyResult::COLLECTION,
        vec![
            index(bson::doc! { "objective_id": 1 }),
            index(bson::doc! { "team_id": 1 }),
        ],
    )
    .await?;

    // KPIs
    create_indexes(
        db,
        Kpi::COLLECTION,
        vec![
            index(bson::doc! { "key_result_id": 1 }),
            index(bson::doc! { "team_id": 1 }),
        ],
    )
    .await?;

    // Dependencies
    create_indexes(
        db,
        ObjectiveDependency::COLLECTION,
        vec![
            index_unique(bson::doc! { "source": 1, "target": 1, "dependency_type": 1 }),
            index(bson::doc! { "organization_id": 1 }),
        ],
    )
    .await?;

    // Audit logs
    create_indexes(
        db,
        AuditLog::COLLECTION,
        vec![index(bson::doc! { "organization_id": 1, "created_at": -1 })],
    )
    .await?;

    // Templates
    create_indexes(
        db,
        ObjectiveTemplate::COLLECTION,
        vec![index(bson::doc! { "organization_id": 1, "category": 1 })],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
