//! Runs every entity routine once, isolating failures per entity.

use jeb_core::{entity::EntityKind, store::SyncStore};
use tracing::Instrument as _;
use uuid::Uuid;

use crate::{EntityReport, SyncError, SyncReport, Syncer};

impl<S> Syncer<S>
where
  S: SyncStore + 'static,
{
  /// Run all six routines in order: startups, users, investors, partners,
  /// news, events.
  ///
  /// Routines run one after the other. Each runs on its own task, so a
  /// panic inside one is reported as that entity's failure and the rest
  /// still run.
  pub async fn sync_all(&self) -> SyncReport {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("sync_all", %run_id);

    async {
      let mut entities = Vec::with_capacity(EntityKind::ALL.len());
      for kind in EntityKind::ALL {
        let report = self.run_isolated(kind).await;
        entities.push((kind, report));
      }

      let failed = entities.iter().filter(|(_, r)| !r.ok()).count();
      if failed == 0 {
        tracing::info!("all entities synced");
      } else {
        tracing::warn!(failed, "sync run finished with failures");
      }
      SyncReport { run_id, entities }
    }
    .instrument(span)
    .await
  }

  async fn run_isolated(&self, kind: EntityKind) -> EntityReport {
    let syncer = self.clone();
    let task = tokio::spawn(async move { syncer.sync(kind).await }.in_current_span());

    let result = match task.await {
      Ok(result) => result,
      Err(e) => Err(SyncError::Join(e.to_string())),
    };
    if let Err(e) = &result {
      tracing::error!(entity = kind.label(), "sync failed: {e}");
    }
    EntityReport::from(result)
  }
}
