// course-portal/crates/course-portal/src/main.rs

use course_portal::{run_server, Config};
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = Config::from_env()?;
    run_server(cfg).await
}
