mod common;

use std::time::Duration;

use cafe_pos_api::{
    domain::status::{Role, TableStatus},
    dto::tables::SetTableStatusRequest,
    services::table_service,
};

use common::{create_table, create_user, database_url, setup_state};

// Tables left `completed` by a restart are freed on startup. The sweep touches
// every completed table, so it lives in its own test binary.
#[tokio::test]
async fn stale_completed_tables_are_released() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url, Duration::from_secs(10)).await?;
    let staff = create_user(&state, Role::Staff).await?;
    let table_id = create_table(&state).await?;

    table_service::set_table_status(
        &state,
        &staff,
        table_id,
        SetTableStatusRequest {
            status: TableStatus::Completed,
        },
    )
    .await?;

    let released = table_service::release_stale_tables(&state).await?;
    assert!(released >= 1);

    let detail = table_service::get_table(&state, &staff, table_id).await?.data.unwrap();
    assert_eq!(detail.table.status, TableStatus::Available);
    assert_eq!(detail.table.current_order_id, None);
    Ok(())
}
