//! Headless demo: loads a scene, walks a player around and tears down

use std::path::PathBuf;

use scene_runtime::prelude::*;
use serde_json::json;

/// Manifest the demo scene loads when present under the asset root
const DEMO_MANIFEST: &str = "demo.json";

/// Play scene with a keyboard-driven player and a following camera
struct DemoScene {
    manifest: Option<PathBuf>,
}

impl DemoScene {
    fn new(config: &EngineConfig) -> Self {
        let manifest = config
            .asset_root
            .join(DEMO_MANIFEST)
            .exists()
            .then(|| PathBuf::from(DEMO_MANIFEST));
        Self { manifest }
    }
}

impl Scene for DemoScene {
    fn name(&self) -> &str {
        "demo"
    }

    fn manifest(&self) -> Option<PathBuf> {
        self.manifest.clone()
    }

    fn on_load(&mut self, data: &mut SceneData, ctx: &mut EngineContext) {
        if data.world.find_by_name("player").is_none() {
            let mut player = vec![
                ComponentSpec::new("Transform", json!({"position": [0.0, 0.0]})),
                ComponentSpec::new("InputController", json!({})),
                ComponentSpec::new("PlayerLogic", json!({"speed": 120.0})),
            ];
            if data.asset("player").is_some() {
                player.push(ComponentSpec::new("Sprite", json!({"texture": "player"})));
            }
            ctx.components
                .build_entity(&mut data.world, &player, &ctx.assets, &data.aliases, Some("player"));
        }

        let camera = vec![ComponentSpec::new("Camera", json!({"target": "player", "zoom": 2.0}))];
        ctx.components
            .build_entity(&mut data.world, &camera, &ctx.assets, &data.aliases, Some("camera"));
    }

    fn on_enter(&mut self, data: &mut SceneData, _ctx: &mut EngineContext) {
        log::info!("Demo scene ready with {} entities", data.world.len());
    }

    fn tick(&mut self, _data: &mut SceneData, ctx: &mut EngineContext) -> Transition {
        if ctx.input.is_key_just_pressed(Key::Escape) {
            return Transition::Pop;
        }
        if ctx.input.is_key_just_pressed(Key::Tab) {
            return Transition::push(PauseScene);
        }
        Transition::None
    }

    fn on_exit(&mut self, data: &mut SceneData, _ctx: &mut EngineContext) {
        let position = data
            .world
            .find_by_name("player")
            .and_then(|id| data.world.component::<Transform>(id))
            .map(|transform| transform.borrow().position);
        if let Some(position) = position {
            log::info!("Player finished at ({:.1}, {:.1})", position.x, position.y);
        }
    }
}

/// Overlay that suspends the demo until Tab is pressed again
struct PauseScene;

impl Scene for PauseScene {
    fn name(&self) -> &str {
        "pause"
    }

    fn tick(&mut self, _data: &mut SceneData, ctx: &mut EngineContext) -> Transition {
        if ctx.input.is_key_just_pressed(Key::Tab) {
            Transition::Pop
        } else {
            Transition::None
        }
    }
}

fn load_config() -> EngineConfig {
    let Some(path) = std::env::args().nth(1) else {
        return EngineConfig::default()
            .with_title("Scene Runtime Demo")
            .with_max_frames(240)
            .with_fixed_timestep(1.0 / 60.0);
    };

    EngineConfig::load_ron(&path).unwrap_or_else(|e| {
        log::error!("Failed to load config {path}: {e}; using defaults");
        EngineConfig::default()
    })
}

fn main() {
    env_logger::init();

    let config = load_config().with_start_scene("demo");
    let demo_config = config.clone();

    let input = ScriptedInput::new()
        .idle(10)
        .then(vec![(Key::D, true)])
        .idle(60)
        .then(vec![(Key::D, false), (Key::S, true)])
        .idle(30)
        .then(vec![(Key::S, false), (Key::Tab, true)])
        .then(vec![(Key::Tab, false)])
        .idle(20)
        .then(vec![(Key::Tab, true)])
        .then(vec![(Key::Tab, false)])
        .idle(30)
        .then(vec![(Key::Escape, true)]);

    let mut runtime = Runtime::new(config, input, RecordingSurface::new());
    runtime.register_scene("demo", move || DemoScene::new(&demo_config));

    let frames = runtime.run();
    log::info!(
        "Demo finished after {frames} frames ({} rendered); {} assets registered",
        runtime.surface().frames(),
        runtime.context().assets.len()
    );
}
