mod cucumber;
mod support;

use ::cucumber::{codegen::LocalBoxFuture, event::ScenarioFinished, gherkin, writer, World};
use futures_util::FutureExt;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use storefront_engine::StorefrontDatabase;
use tokio::runtime::Runtime;

use crate::cucumber::{Storefront, StorefrontWorld};

fn main() {
    let sys = Runtime::new().expect("Could not start the tokio runtime");
    sys.block_on(
        StorefrontWorld::cucumber()
            .with_writer(writer::Libtest::or_basic())
            .after(|_f, _r, scenario, ev, w| post_test_hook(scenario, ev, w))
            .run("tests/features"),
    );
    info!("🚀️ Tests complete");
}

fn post_test_hook<'a>(
    scenario: &'a gherkin::Scenario,
    ev: &'a ScenarioFinished,
    world: Option<&'a mut StorefrontWorld>,
) -> LocalBoxFuture<'a, ()> {
    let fut = async move {
        trace!("🚀️ After-scenario hook running for \"{}\"", scenario.name);
        if let Some(StorefrontWorld { system: Some(sys) }) = world {
            let Storefront { db, .. } = sys;
            let url = db.url().to_string();
            match ev {
                ScenarioFinished::StepFailed(_, _, _) | ScenarioFinished::StepSkipped => {
                    error!("🚀️ Error in scenario, database retained: {url}");
                },
                ScenarioFinished::StepPassed => {
                    debug!("🚀️ Scenario complete, removing database: {url}");
                    if let Err(e) = db.close().await {
                        error!("🚀️ Failed to close database: {e}");
                    }
                    if let Err(e) = Sqlite::drop_database(&url).await {
                        warn!("🚀️ Could not remove database {url}: {e}");
                    }
                },
                _ => trace!("🚀️ Unhandled event: {ev:?}"),
            }
        } else {
            warn!("🚀️ World was not specified. Cannot cleanup database.");
        }
    };
    fut.boxed_local()
}
