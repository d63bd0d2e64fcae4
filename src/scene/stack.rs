//! Scene stack machine
//!
//! Scenes are pushed on top of each other; only the top one is ticked and
//! rendered. Scenes underneath keep their world and assets until popped.
//! A scene is never rendered before its first tick, so one pushed during a
//! tick shows up on the following frame.

use super::lifecycle::{Scene, SceneData, SceneState, Transition};
use super::loading::load_scene;
use crate::assets::AssetRegistry;
use crate::core::EngineContext;
use crate::renderer::RenderSurface;

struct StackEntry {
    scene: Box<dyn Scene>,
    data: SceneData,
    /// Entered but not ticked yet
    fresh: bool,
}

/// Ordered stack of scenes; the last one is active
#[derive(Default)]
pub struct SceneStack {
    entries: Vec<StackEntry>,
    /// Pops requested during this frame
    pending_pops: usize,
}

impl SceneStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load, push and enter a scene.
    ///
    /// Blocks until the scene's manifest is fully loaded; the scene is not
    /// entered before that.
    pub fn push<S: Scene + 'static>(&mut self, scene: S, ctx: &mut EngineContext) {
        self.push_boxed(Box::new(scene), ctx);
    }

    /// Construct a registered scene by name and push it.
    ///
    /// Returns false if no scene is registered under `name`.
    pub fn push_named(&mut self, name: &str, ctx: &mut EngineContext) -> bool {
        match ctx.scenes.create(name) {
            Some(scene) => {
                self.push_boxed(scene, ctx);
                true
            }
            None => false,
        }
    }

    /// [`Self::push`] for an already boxed scene
    pub fn push_boxed(&mut self, mut scene: Box<dyn Scene>, ctx: &mut EngineContext) {
        let mut data = SceneData::new(scene.name());
        log::info!("Loading scene '{}'", data.name);
        data.state = SceneState::Loading;

        if let Some(manifest) = scene.manifest() {
            let load = load_scene(&manifest, ctx, &mut data.world);
            if !load.failures.is_empty() {
                log::warn!(
                    "Scene '{}': {} assets failed to load",
                    data.name,
                    load.failures.len()
                );
            }
            data.loaded_assets = load.ids;
            data.aliases = load.aliases;
        }

        scene.on_load(&mut data, ctx);
        data.state = SceneState::Loaded;
        log::info!(
            "Loaded scene '{}': {} entities, {} assets",
            data.name,
            data.world.len(),
            data.loaded_assets.len()
        );

        scene.on_enter(&mut data, ctx);
        data.state = SceneState::Entered;
        log::info!("Entered scene '{}'", data.name);

        self.entries.push(StackEntry {
            scene,
            data,
            fresh: true,
        });
    }

    /// Pop the active scene at the end of the current frame
    pub fn request_pop(&mut self) {
        self.pending_pops += 1;
    }

    /// Exit and remove the active scene immediately.
    ///
    /// Returns the popped scene's name, or `None` if the stack was empty.
    pub fn pop(&mut self, ctx: &mut EngineContext) -> Option<String> {
        let Some(mut entry) = self.entries.pop() else {
            log::debug!("No scene to pop");
            return None;
        };

        exit(&mut entry, ctx);
        if let Some(top) = self.entries.last() {
            log::info!("Resuming scene '{}'", top.data.name);
        }
        Some(entry.data.name)
    }

    /// Pop every scene, top first
    pub fn clear(&mut self, ctx: &mut EngineContext) {
        self.pending_pops = 0;
        while self.pop(ctx).is_some() {}
    }

    /// Tick the active scene's world, then the scene itself
    pub fn tick(&mut self, ctx: &mut EngineContext, dt: f32) {
        let Some(entry) = self.entries.last_mut() else {
            return;
        };

        entry.fresh = false;
        entry.data.world.tick(&ctx.input, dt);
        let transition = entry.scene.tick(&mut entry.data, ctx);
        self.apply(transition, ctx);
    }

    fn apply(&mut self, transition: Transition, ctx: &mut EngineContext) {
        match transition {
            Transition::None => {}
            Transition::Push(scene) => self.push_boxed(scene, ctx),
            Transition::Pop => self.request_pop(),
            Transition::Replace(scene) => {
                self.pop(ctx);
                self.push_boxed(scene, ctx);
            }
        }
    }

    /// Render the active scene, unless it has not been ticked yet
    pub fn render(&mut self, assets: &AssetRegistry, surface: &mut dyn RenderSurface) {
        if let Some(entry) = self.entries.last_mut()
            && !entry.fresh
        {
            entry.data.world.render(assets, surface);
            entry.scene.render(&entry.data, assets, surface);
        }
    }

    /// Apply pops requested during the frame
    pub fn end_frame(&mut self, ctx: &mut EngineContext) {
        for _ in 0..std::mem::take(&mut self.pending_pops) {
            if self.pop(ctx).is_none() {
                break;
            }
        }
    }

    /// Name of the active scene
    #[must_use]
    pub fn active_name(&self) -> Option<&str> {
        self.entries.last().map(|entry| entry.data.name.as_str())
    }

    #[must_use]
    pub fn active(&self) -> Option<&SceneData> {
        self.entries.last().map(|entry| &entry.data)
    }

    pub fn active_mut(&mut self) -> Option<&mut SceneData> {
        self.entries.last_mut().map(|entry| &mut entry.data)
    }

    /// Scene names from bottom to top
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.data.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for SceneStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneStack")
            .field("scenes", &self.names().collect::<Vec<_>>())
            .field("pending_pops", &self.pending_pops)
            .finish()
    }
}

/// Scene teardown, then release exactly the assets the scene registered
fn exit(entry: &mut StackEntry, ctx: &mut EngineContext) {
    let data = &mut entry.data;
    data.state = SceneState::Exiting;
    entry.scene.on_exit(data, ctx);

    data.world.clear();
    let released = data.loaded_assets.len();
    for id in data.loaded_assets.drain(..) {
        ctx.assets.release(id);
    }
    data.aliases.clear();

    data.state = SceneState::Exited;
    log::info!("Exited scene '{}' ({released} asset references released)", data.name);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::*;
    use crate::assets::fixtures;
    use crate::core::EngineConfig;
    use crate::ecs::{Component, FrameContext, RenderContext};
    use crate::renderer::RecordingSurface;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records its own lifecycle hooks
    struct HookLog {
        log: Log,
    }

    impl Component for HookLog {
        fn type_name(&self) -> &'static str {
            "HookLog"
        }

        fn start(&mut self, _ctx: &mut FrameContext<'_>) {
            self.log.borrow_mut().push("start".to_string());
        }

        fn tick(&mut self, _ctx: &mut FrameContext<'_>) {
            self.log.borrow_mut().push("tick".to_string());
        }

        fn render(&mut self, _ctx: &mut RenderContext<'_>) {
            self.log.borrow_mut().push("render".to_string());
        }
    }

    struct Probe {
        name: &'static str,
        log: Log,
        manifest: Option<PathBuf>,
        /// Pop itself on this tick
        pop_on: Option<u32>,
        replace_with: Option<Box<dyn Scene>>,
        push_with: Option<Box<dyn Scene>>,
        /// Give the scene's world an entity that records component hooks
        hooks: Option<Log>,
        ticks: u32,
    }

    impl Probe {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: Rc::clone(log),
                manifest: None,
                pop_on: None,
                replace_with: None,
                push_with: None,
                hooks: None,
                ticks: 0,
            }
        }

        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{}:{event}", self.name));
        }
    }

    impl Scene for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn manifest(&self) -> Option<PathBuf> {
            self.manifest.clone()
        }

        fn on_load(&mut self, data: &mut SceneData, _ctx: &mut EngineContext) {
            assert_eq!(data.state, SceneState::Loading);
            self.record("load");
            if let Some(hooks) = self.hooks.take() {
                let id = data.world.create_object();
                data.world.attach(id, HookLog { log: hooks });
            }
        }

        fn on_enter(&mut self, data: &mut SceneData, _ctx: &mut EngineContext) {
            assert_eq!(data.state, SceneState::Loaded);
            self.record("enter");
        }

        fn tick(&mut self, _data: &mut SceneData, _ctx: &mut EngineContext) -> Transition {
            self.ticks += 1;
            self.record("tick");
            if let Some(next) = self.replace_with.take() {
                return Transition::Replace(next);
            }
            if let Some(next) = self.push_with.take() {
                return Transition::Push(next);
            }
            if self.pop_on == Some(self.ticks) {
                return Transition::Pop;
            }
            Transition::None
        }

        fn on_exit(&mut self, data: &mut SceneData, _ctx: &mut EngineContext) {
            assert_eq!(data.state, SceneState::Exiting);
            self.record("exit");
        }
    }

    fn events(log: &Log) -> Vec<String> {
        log.borrow_mut().drain(..).collect()
    }

    #[test]
    fn test_push_push_pop_resumes_lower_scene() {
        let log = Log::default();
        let mut ctx = EngineContext::new(EngineConfig::default());
        let mut stack = SceneStack::new();

        stack.push(Probe::new("a", &log), &mut ctx);
        stack.push(Probe::new("b", &log), &mut ctx);
        stack.tick(&mut ctx, 0.016);
        assert_eq!(
            events(&log),
            vec!["a:load", "a:enter", "b:load", "b:enter", "b:tick"]
        );

        assert_eq!(stack.pop(&mut ctx).as_deref(), Some("b"));
        assert_eq!(stack.active_name(), Some("a"));
        stack.tick(&mut ctx, 0.016);
        assert_eq!(events(&log), vec!["b:exit", "a:tick"]);
    }

    #[test]
    fn test_pop_empty_stack_is_none() {
        let mut ctx = EngineContext::new(EngineConfig::default());
        let mut stack = SceneStack::new();
        assert!(stack.pop(&mut ctx).is_none());

        stack.request_pop();
        stack.end_frame(&mut ctx);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_requested_pop_waits_for_end_of_frame() {
        let log = Log::default();
        let mut ctx = EngineContext::new(EngineConfig::default());
        let mut stack = SceneStack::new();

        let mut probe = Probe::new("menu", &log);
        probe.pop_on = Some(1);
        stack.push(probe, &mut ctx);

        stack.tick(&mut ctx, 0.016);
        assert_eq!(stack.len(), 1);

        stack.end_frame(&mut ctx);
        assert!(stack.is_empty());
        assert_eq!(stack.active_name(), None);
        assert_eq!(events(&log).last().map(String::as_str), Some("menu:exit"));
    }

    #[test]
    fn test_replace_swaps_active_scene() {
        let log = Log::default();
        let mut ctx = EngineContext::new(EngineConfig::default());
        let mut stack = SceneStack::new();

        let mut title = Probe::new("title", &log);
        title.replace_with = Some(Box::new(Probe::new("play", &log)));
        stack.push(title, &mut ctx);
        events(&log);

        stack.tick(&mut ctx, 0.016);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.active_name(), Some("play"));
        assert_eq!(
            events(&log),
            vec!["title:tick", "title:exit", "play:load", "play:enter"]
        );
    }

    #[test]
    fn test_scene_pushed_during_tick_starts_before_render() {
        let log = Log::default();
        let hooks = Log::default();
        let mut ctx = EngineContext::new(EngineConfig::default());
        let mut surface = RecordingSurface::new();
        let mut stack = SceneStack::new();

        let mut upper = Probe::new("upper", &log);
        upper.hooks = Some(Rc::clone(&hooks));
        let mut lower = Probe::new("lower", &log);
        lower.push_with = Some(Box::new(upper));
        stack.push(lower, &mut ctx);

        stack.tick(&mut ctx, 0.016);
        stack.render(&ctx.assets, &mut surface);
        stack.end_frame(&mut ctx);
        assert_eq!(stack.active_name(), Some("upper"));
        assert!(events(&hooks).is_empty());

        stack.tick(&mut ctx, 0.016);
        stack.render(&ctx.assets, &mut surface);
        assert_eq!(events(&hooks), vec!["start", "tick", "render"]);
    }

    #[test]
    fn test_push_named_through_registry() {
        let mut ctx = EngineContext::new(EngineConfig::default());
        ctx.scenes.register("menu", || Probe::new("menu", &Log::default()));
        let mut stack = SceneStack::new();

        assert!(stack.push_named("menu", &mut ctx));
        assert!(!stack.push_named("missing", &mut ctx));
        assert_eq!(stack.names().collect::<Vec<_>>(), vec!["menu"]);
    }

    #[test]
    fn test_exit_releases_exactly_loaded_assets() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fixtures::write_png(root, "shared.png");
        fixtures::write_png(root, "own.png");
        std::fs::write(
            root.join("lower.json"),
            r#"{"textures": [{"id": "shared", "path": "shared.png"}]}"#,
        )
        .unwrap();
        std::fs::write(
            root.join("upper.json"),
            r#"{"textures": [
                {"id": "shared", "path": "shared.png"},
                {"id": "own", "path": "own.png"}
            ]}"#,
        )
        .unwrap();

        let log = Log::default();
        let mut ctx = EngineContext::new(EngineConfig::default().with_asset_root(root));
        let mut stack = SceneStack::new();

        let mut lower = Probe::new("lower", &log);
        lower.manifest = Some("lower.json".into());
        stack.push(lower, &mut ctx);
        let mut upper = Probe::new("upper", &log);
        upper.manifest = Some("upper.json".into());
        stack.push(upper, &mut ctx);

        let shared = ctx.assets.id_for_path(root.join("shared.png")).unwrap();
        let own = ctx.assets.id_for_path(root.join("own.png")).unwrap();
        assert_eq!(ctx.assets.ref_count(shared), Some(2));
        assert_eq!(stack.active().unwrap().loaded_assets.len(), 2);

        stack.pop(&mut ctx);
        assert_eq!(ctx.assets.ref_count(shared), Some(1));
        assert!(!ctx.assets.contains(own));
        assert_eq!(stack.active().unwrap().asset("shared"), Some(shared));

        stack.clear(&mut ctx);
        assert!(ctx.assets.is_empty());
    }
}
