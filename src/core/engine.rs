//! Runtime configuration, shared context and the frame loop

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::assets::{AssetRegistry, TemplateRegistry};
use crate::core::Time;
use crate::ecs::ComponentFactory;
use crate::input::{Input, InputSource};
use crate::renderer::RenderSurface;
use crate::scene::{Scene, SceneRegistry, SceneStack};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application title, used in logs
    pub title: String,
    /// Directory manifests and media paths are resolved against
    pub asset_root: PathBuf,
    /// Template directory, relative to the asset root
    pub template_root: PathBuf,
    /// Target frames per second (0 for unlimited)
    pub target_fps: u32,
    /// Stop after this many frames (0 runs until the stack is empty)
    pub max_frames: u64,
    /// Constant frame delta in seconds instead of wall-clock time
    pub fixed_timestep: Option<f32>,
    /// Scene pushed by [`Runtime::run`] before the first frame
    pub start_scene: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("Scene Runtime"),
            asset_root: PathBuf::from("assets"),
            template_root: PathBuf::from("data"),
            target_fps: 60,
            max_frames: 0,
            fixed_timestep: None,
            start_scene: None,
        }
    }
}

impl EngineConfig {
    /// Create a new config with a title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the asset root directory
    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// Set the template directory, relative to the asset root
    #[must_use]
    pub fn with_template_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.template_root = root.into();
        self
    }

    /// Set target FPS
    #[must_use]
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Limit the number of frames [`Runtime::run`] executes
    #[must_use]
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = frames;
        self
    }

    /// Use a constant frame delta
    #[must_use]
    pub fn with_fixed_timestep(mut self, seconds: f32) -> Self {
        self.fixed_timestep = Some(seconds);
        self
    }

    /// Scene to push when the runtime starts
    #[must_use]
    pub fn with_start_scene(mut self, name: impl Into<String>) -> Self {
        self.start_scene = Some(name.into());
        self
    }

    /// Directory templates are loaded from
    #[must_use]
    pub fn template_dir(&self) -> PathBuf {
        self.asset_root.join(&self.template_root)
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: EngineConfig =
            ron::from_str(&content).map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        Ok(config)
    }

    /// Load a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        Ok(config)
    }

    /// Save the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Errors that can occur while loading or saving configuration
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Process-wide state handed to scenes and the loaders
pub struct EngineContext {
    pub config: EngineConfig,
    /// Shared, reference-counted assets
    pub assets: AssetRegistry,
    /// Loaded data templates
    pub templates: TemplateRegistry,
    /// Component constructors by type name
    pub components: ComponentFactory,
    /// Scene constructors by name
    pub scenes: SceneRegistry,
    /// Input state for the current frame
    pub input: Input,
    /// Time tracking
    pub time: Time,
    /// Should the runtime quit
    should_quit: bool,
}

impl EngineContext {
    /// Create a context with the built-in components registered
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let time = match config.fixed_timestep {
            Some(step) if step > 0.0 => Time::fixed(Duration::from_secs_f32(step)),
            _ => Time::new(),
        };

        Self {
            config,
            assets: AssetRegistry::new(),
            templates: TemplateRegistry::new(),
            components: ComponentFactory::with_builtins(),
            scenes: SceneRegistry::new(),
            input: Input::new(),
            time,
            should_quit: false,
        }
    }

    /// Request runtime shutdown
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Check if the runtime should quit
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("title", &self.config.title)
            .field("assets", &self.assets)
            .field("templates", &self.templates.len())
            .field("components", &self.components)
            .field("scenes", &self.scenes)
            .finish_non_exhaustive()
    }
}

/// Single-threaded frame loop: poll input, tick, render
pub struct Runtime<I: InputSource, R: RenderSurface> {
    context: EngineContext,
    stack: SceneStack,
    input: I,
    surface: R,
    frames: u64,
}

impl<I: InputSource, R: RenderSurface> Runtime<I, R> {
    /// Create a runtime drawing to `surface` and reading from `input`
    pub fn new(config: EngineConfig, input: I, surface: R) -> Self {
        Self {
            context: EngineContext::new(config),
            stack: SceneStack::new(),
            input,
            surface,
            frames: 0,
        }
    }

    #[must_use]
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.context
    }

    #[must_use]
    pub fn stack(&self) -> &SceneStack {
        &self.stack
    }

    #[must_use]
    pub fn surface(&self) -> &R {
        &self.surface
    }

    /// Frames run so far
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Register a scene constructor
    pub fn register_scene<S, F>(&mut self, name: impl Into<String>, constructor: F)
    where
        S: Scene + 'static,
        F: Fn() -> S + 'static,
    {
        self.context.scenes.register(name, constructor);
    }

    /// Push a registered scene by name
    pub fn push_scene(&mut self, name: &str) -> bool {
        self.stack.push_named(name, &mut self.context)
    }

    /// Run one frame. Returns false once there is nothing left to run.
    pub fn run_frame(&mut self) -> bool {
        let ctx = &mut self.context;
        ctx.time.update();
        self.input.poll(&mut ctx.input);

        let dt = ctx.time.delta_seconds();
        self.stack.tick(ctx, dt);

        self.surface.begin_frame();
        self.stack.render(&ctx.assets, &mut self.surface);
        self.surface.end_frame();

        self.stack.end_frame(ctx);
        ctx.input.update();
        self.frames += 1;

        !self.stack.is_empty() && !ctx.should_quit()
    }

    /// Run frames until the stack empties, quit is requested or the frame
    /// limit is reached, then tear everything down.
    ///
    /// Returns the number of frames run.
    pub fn run(&mut self) -> u64 {
        log::info!("Starting runtime: {}", self.context.config.title);

        if let Some(name) = self.context.config.start_scene.clone() {
            self.push_scene(&name);
        }

        let max_frames = self.context.config.max_frames;
        let frame_budget = match self.context.config.target_fps {
            0 => None,
            fps => Some(Duration::from_secs_f64(1.0 / f64::from(fps))),
        };

        let mut running = !self.stack.is_empty();
        while running && (max_frames == 0 || self.frames < max_frames) {
            let started = Instant::now();
            running = self.run_frame();

            if let Some(budget) = frame_budget
                && self.context.config.fixed_timestep.is_none()
            {
                let spent = started.elapsed();
                if spent < budget {
                    std::thread::sleep(budget - spent);
                }
            }
        }

        self.shutdown();
        self.frames
    }

    /// Pop every scene, releasing their assets
    pub fn shutdown(&mut self) {
        self.stack.clear(&mut self.context);
        log::info!(
            "Runtime stopped after {} frames; {} assets still registered",
            self.frames,
            self.context.assets.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ComponentSpec;
    use crate::ecs::{InputController, PlayerLogic, Transform};
    use crate::input::{Key, ScriptedInput};
    use crate::renderer::RecordingSurface;
    use crate::scene::{SceneData, Transition};
    use glam::Vec2;
    use serde_json::json;

    struct Walk;

    impl Scene for Walk {
        fn name(&self) -> &str {
            "walk"
        }

        fn on_load(&mut self, data: &mut SceneData, ctx: &mut EngineContext) {
            let specs = vec![
                ComponentSpec::new("Transform", json!({})),
                ComponentSpec::new("InputController", json!({})),
                ComponentSpec::new("PlayerLogic", json!({"speed": 10.0})),
            ];
            ctx.components
                .build_entity(&mut data.world, &specs, &ctx.assets, &data.aliases, Some("player"));
        }

        fn tick(&mut self, _data: &mut SceneData, ctx: &mut EngineContext) -> Transition {
            if ctx.input.is_key_just_pressed(Key::Escape) {
                Transition::Pop
            } else {
                Transition::None
            }
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
            .with_target_fps(0)
            .with_fixed_timestep(0.5)
            .with_start_scene("walk")
    }

    #[test]
    fn test_config_builder_and_ron_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        let config = EngineConfig::default()
            .with_title("Demo")
            .with_asset_root("content")
            .with_template_root("templates")
            .with_max_frames(30);

        config.save_ron(&path).unwrap();
        let loaded = EngineConfig::load_ron(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.template_dir(), PathBuf::from("content/templates"));
    }

    #[test]
    fn test_partial_json_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"title": "Partial", "max_frames": 5}"#).unwrap();

        let config = EngineConfig::load_json(&path).unwrap();
        assert_eq!(config.title, "Partial");
        assert_eq!(config.max_frames, 5);
        assert_eq!(config.target_fps, 60);
        assert!(EngineConfig::load_ron(dir.path().join("missing.ron")).is_err());
    }

    #[test]
    fn test_runtime_runs_until_scene_pops() {
        let input = ScriptedInput::new()
            .then(vec![(Key::D, true)])
            .idle(1)
            .then(vec![(Key::D, false), (Key::Escape, true)]);
        let mut runtime = Runtime::new(config(), input, RecordingSurface::new());
        runtime.register_scene("walk", || Walk);

        let frames = runtime.run();
        assert_eq!(frames, 3);
        assert!(runtime.stack().is_empty());
        assert_eq!(runtime.surface().frames(), 3);
    }

    #[test]
    fn test_run_frame_moves_player() {
        let input = ScriptedInput::new().then(vec![(Key::D, true)]).idle(2);
        let mut runtime = Runtime::new(config(), input, RecordingSurface::new());
        runtime.register_scene("walk", || Walk);
        assert!(runtime.push_scene("walk"));

        assert!(runtime.run_frame());
        assert!(runtime.run_frame());

        let data = runtime.stack().active().unwrap();
        let player = data.world.find_by_name("player").unwrap();
        let transform = data.world.component::<Transform>(player).unwrap();
        assert_eq!(transform.borrow().position, Vec2::new(10.0, 0.0));
        assert!(data.world.component::<InputController>(player).is_some());
        assert!(data.world.component::<PlayerLogic>(player).is_some());
    }

    #[test]
    fn test_max_frames_limit() {
        let mut runtime = Runtime::new(
            config().with_max_frames(4),
            ScriptedInput::new(),
            RecordingSurface::new(),
        );
        runtime.register_scene("walk", || Walk);

        assert_eq!(runtime.run(), 4);
        assert!(runtime.stack().is_empty());
    }
}
