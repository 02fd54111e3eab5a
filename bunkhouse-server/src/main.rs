use std::{env, sync::Arc};

use bunkhouse_core::{Bunkhouse, PgDatabase};
use bunkhouse_server::{logging, run_server, ServerContext};

#[tokio::main]
async fn main() {
    logging::init_logger();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let database = PgDatabase::new(&database_url)
        .await
        .expect("database connects");
    database.migrate().await.expect("migrations apply");

    let bunkhouse = Bunkhouse::new(database);

    run_server(ServerContext {
        bunkhouse: Arc::new(bunkhouse),
    })
    .await
}
