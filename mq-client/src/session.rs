use std::path::PathBuf;
use std::time::Duration;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResolution};
use mq_render::screenshot::{capture_png_bytes, capture_to_disk};
use mq_render::{StagePlugin, Turntable, resize_window};
use mq_utils::{FittingCommand, FittingConfig, FittingInbox, MannequinHandle, normalize_category};
use thiserror::Error;
use tracing::{info, warn};

use crate::avatar::table::MeshTable;
use crate::avatar::{self, AvatarPlugin, AvatarSettings, ColorParseError};
use crate::fetch::{FetchError, FetchRequest, GarmentFetcher};
use crate::plugins::FittingPlugin;
use crate::wardrobe::{Wardrobe, WearAssets, WearOptions, WearOutcome};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    SkinColor(#[from] ColorParseError),
}

#[derive(Resource, Debug, Clone)]
pub struct FittingSettings {
    pub wear: WearOptions,
    pub screenshot_path: PathBuf,
}

impl FittingSettings {
    pub fn from_config(config: &FittingConfig) -> Self {
        Self {
            wear: WearOptions {
                strategy: config.strategy,
                paint_mode: config.paint_mode,
                match_policy: config.match_policy,
            },
            screenshot_path: config.screenshot_path.clone(),
        }
    }
}

/// Build the fitting app for `config`. The returned handle drives the
/// session once the app runs.
pub fn initialize(config: &FittingConfig) -> Result<(App, MannequinHandle), SessionError> {
    let skin_color = avatar::parse_skin_color(&config.skin_color)?;
    let fetcher = GarmentFetcher::new(
        config.proxy_endpoint.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let (handle, inbox) = mq_utils::fitting_channel();
    let assets_root = config.resolved_assets_root();
    info!("assets root {:?}", assets_root);

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .build()
            .disable::<LogPlugin>()
            .set(AssetPlugin {
                file_path: assets_root.to_string_lossy().into_owned(),
                ..default()
            })
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: config.window.title.clone(),
                    resolution: WindowResolution::new(config.window.width, config.window.height),
                    ..default()
                }),
                ..default()
            }),
    )
    .add_plugins(StagePlugin {
        idle_sway: config.idle_sway,
    })
    .add_plugins(AvatarPlugin {
        settings: AvatarSettings {
            model_path: config.model_path.clone(),
            skin_color,
        },
    })
    .add_plugins(FittingPlugin::new(
        inbox,
        fetcher,
        FittingSettings::from_config(config),
    ));

    Ok((app, handle))
}

pub fn drain_fitting_commands(
    mut commands: Commands,
    inbox: Res<FittingInbox>,
    settings: Res<FittingSettings>,
    time: Res<Time>,
    mut exit: EventWriter<AppExit>,
    mut avatar: ResMut<AvatarSettings>,
    mut wardrobe: ResMut<Wardrobe>,
    mut fetcher: ResMut<GarmentFetcher>,
    mut turntable: ResMut<Turntable>,
    mut table: ResMut<MeshTable>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let mut assets = WearAssets {
        meshes: &mut meshes,
        materials: &mut materials,
        images: &mut images,
        table: &mut table,
    };

    while let Ok(command) = inbox.0.try_recv() {
        match command {
            FittingCommand::WearImage { category, url } => {
                let category = normalize_category(&category);
                let slot = category.slot();
                let seq = wardrobe.issue(slot);
                info!(
                    "wear {} ({category} -> {slot}) from {url}",
                    category.display_label()
                );
                fetcher.request(FetchRequest {
                    slot,
                    seq,
                    category,
                    url,
                });
            }
            FittingCommand::RemoveClothing {
                category: Some(category),
            } => {
                let slot = normalize_category(&category).slot();
                fetcher.cancel(slot);
                if !wardrobe.remove(slot, &mut assets) {
                    info!("nothing worn in {slot}");
                }
            }
            FittingCommand::RemoveClothing { category: None } => {
                fetcher.cancel_all();
                let removed = wardrobe.remove_all(&mut assets);
                info!("removed {removed} garments");
            }
            FittingCommand::ResetView => {
                turntable.reset(time.elapsed_secs());
                fetcher.cancel_all();
                wardrobe.remove_all(&mut assets);
                info!("view reset");
            }
            FittingCommand::SetMannequinColor(hex) => match avatar::parse_skin_color(&hex) {
                Ok(color) => {
                    let changed =
                        avatar::apply_skin_color(&*assets.table, &mut *assets.materials, color);
                    avatar.skin_color = color;
                    info!("mannequin color {hex} applied to {changed} meshes");
                }
                Err(err) => warn!("{err}"),
            },
            FittingCommand::Resize { width, height } => {
                let Ok(mut window) = windows.single_mut() else {
                    warn!("no primary window to resize");
                    continue;
                };
                if !resize_window(&mut window, width, height) {
                    warn!("ignoring resize to {width}x{height}");
                }
            }
            FittingCommand::TakeScreenshot { path } => {
                let path = path.unwrap_or_else(|| settings.screenshot_path.clone());
                capture_to_disk(&mut commands, path);
            }
            FittingCommand::TakeScreenshotBlob { reply } => {
                capture_png_bytes(&mut commands, reply);
            }
            FittingCommand::SetRotationAngle(angle) => {
                turntable.idle_amplitude = angle;
            }
            FittingCommand::Quit => {
                info!("closing fitting session");
                exit.write(AppExit::Success);
            }
        }
    }
}

pub fn apply_fetch_results(
    settings: Res<FittingSettings>,
    mut wardrobe: ResMut<Wardrobe>,
    mut fetcher: ResMut<GarmentFetcher>,
    mut table: ResMut<MeshTable>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    let results = fetcher.drain();
    if results.is_empty() {
        return;
    }
    let mut assets = WearAssets {
        meshes: &mut meshes,
        materials: &mut materials,
        images: &mut images,
        table: &mut table,
    };

    for result in results {
        let garment = match result.outcome {
            Ok(garment) => garment,
            Err(err) => {
                warn!("could not load {} garment from {}: {err}", result.slot, result.url);
                continue;
            }
        };
        match wardrobe.wear(garment, result.seq, settings.wear, &mut assets) {
            WearOutcome::Stale => {
                info!("discarded outdated {} garment {}", result.slot, result.url)
            }
            WearOutcome::Panel => info!("{} worn as a panel", result.slot),
            WearOutcome::Painted { meshes } => {
                info!("{} painted onto {meshes} meshes", result.slot)
            }
            WearOutcome::Unmatched => {
                warn!("{} garment matched no mesh and was not worn", result.slot)
            }
        }
    }
}
