//! Scene content loading
//!
//! Reads a manifest, loads everything it declares as one concurrent batch,
//! builds the alias table and instantiates the manifest's objects from their
//! templates. Asset and component problems are logged and skipped; the load
//! itself never fails.

use std::path::{Path, PathBuf};

use crate::assets::{
    AssetAliases, AssetId, AssetLoader, ComponentSpec, LoadFailure, Manifest, ObjectEntry,
    resolve_components,
};
use crate::core::EngineContext;
use crate::ecs::{EntityId, World};

/// Outcome of [`load_scene`]
#[derive(Debug, Default)]
pub struct SceneLoad {
    /// Asset ids registered by this load, one per reference taken
    pub ids: Vec<AssetId>,
    /// Manifest alias to id, for successfully loaded media
    pub aliases: AssetAliases,
    /// Media and templates that failed to load
    pub failures: Vec<LoadFailure>,
    /// Entities created from manifest objects, in manifest order
    pub entities: Vec<EntityId>,
}

/// Load a manifest's assets and objects into `world`.
///
/// Relative paths (the manifest itself and every media entry) resolve
/// against the configured asset root. Blocks until every load worker has
/// joined.
pub fn load_scene(
    manifest_path: impl AsRef<Path>,
    ctx: &mut EngineContext,
    world: &mut World,
) -> SceneLoad {
    let base = ctx.config.asset_root.clone();
    let manifest = Manifest::load_or_empty(base.join(manifest_path.as_ref()));

    let mut loader = AssetLoader::new(ctx.config.template_dir());
    let mut aliased: Vec<(String, PathBuf)> = Vec::new();

    for entry in &manifest.textures {
        if let Some(path) = entry.resolve(&base) {
            loader.queue_texture(&path);
            aliased.push((entry.id.clone(), path));
        }
    }
    for entry in &manifest.fonts {
        if let Some(path) = entry.resolve(&base) {
            loader.queue_font(&path, entry.size);
            aliased.push((entry.id.clone(), path));
        }
    }
    for entry in &manifest.sounds {
        if let Some(path) = entry.resolve(&base) {
            loader.queue_sound(&path);
            aliased.push((entry.id.clone(), path));
        }
    }
    for object in manifest.objects.iter().filter(|o| o.has_template()) {
        loader.queue_object(object.template.as_str());
    }

    let report = loader.load_all_blocking(&mut ctx.assets, &mut ctx.templates);

    let mut aliases = AssetAliases::default();
    for (alias, path) in aliased {
        if alias.is_empty() {
            continue;
        }
        if let Some(id) = ctx.assets.id_for_path(&path) {
            aliases.insert(alias, id);
        }
    }

    let entities = manifest
        .objects
        .iter()
        .map(|object| {
            let specs = object_components(ctx, object);
            ctx.components
                .build_entity(world, &specs, &ctx.assets, &aliases, object.display_name())
        })
        .collect();

    SceneLoad {
        ids: report.ids,
        aliases,
        failures: report.failures,
        entities,
    }
}

/// Template components with the object's overrides applied.
///
/// A missing template leaves only the inline overrides.
fn object_components(ctx: &EngineContext, object: &ObjectEntry) -> Vec<ComponentSpec> {
    if object.has_template()
        && let Some(template) = ctx.templates.get(&object.template)
    {
        return template.resolve(&object.overrides);
    }
    resolve_components(&[], &object.overrides)
}
