use std::sync::Mutex;

use bevy::prelude::*;
use mq_utils::FittingInbox;
use tracing::error;

use crate::avatar::table::sync_mesh_materials;
use crate::fetch::GarmentFetcher;
use crate::session::{self, FittingSettings};
use crate::wardrobe::{self, Wardrobe};

/// Wardrobe, fetcher and the command inbox of one fitting session.
pub struct FittingPlugin {
    settings: FittingSettings,
    inbox: Mutex<Option<FittingInbox>>,
    fetcher: Mutex<Option<GarmentFetcher>>,
}

impl FittingPlugin {
    pub fn new(inbox: FittingInbox, fetcher: GarmentFetcher, settings: FittingSettings) -> Self {
        Self {
            settings,
            inbox: Mutex::new(Some(inbox)),
            fetcher: Mutex::new(Some(fetcher)),
        }
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().ok().and_then(|mut inner| inner.take())
}

impl Plugin for FittingPlugin {
    fn build(&self, app: &mut App) {
        let (Some(inbox), Some(fetcher)) = (take(&self.inbox), take(&self.fetcher)) else {
            error!("fitting plugin built twice; the second session has no inbox");
            return;
        };

        app.insert_resource(inbox)
            .insert_resource(fetcher)
            .insert_resource(self.settings.clone())
            .init_resource::<Wardrobe>()
            .add_systems(
                Update,
                (
                    session::drain_fitting_commands,
                    session::apply_fetch_results,
                    wardrobe::sync_garment_panels,
                )
                    .chain()
                    .before(sync_mesh_materials),
            );
    }
}
