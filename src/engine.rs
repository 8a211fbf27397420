//! Range engine facade
//!
//! `RangeEngine` composes the session ledger, the three modes, raycasting,
//! impact effects, the camera and a render backend behind the handful of
//! operations the host UI needs. The host owns scheduling: it calls
//! [`RangeEngine::frame`] from its animation-frame callback and forwards
//! input through [`RangeEngine::handle_input`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::{SHAKE_DURATION, SHAKE_INTENSITY, SPAWN_PADDING};
use crate::error::RangeError;
use crate::platform::Clock;
use crate::platform::input::{InputCapture, InputEvent};
use crate::renderer::RenderBackend;
use crate::sim::{
    Camera, GameLoop, GameState, GameStats, GameStatus, ImpactEffects, ModeContext, ModeKind, ModeSet,
    RayHit, Raycaster, Scene, SessionEvent, TargetId, Viewport,
};

/// Handle returned by the `on_*` registration methods
pub type SubscriptionId = u64;

type StatsCallback = Box<dyn FnMut(&GameStats)>;

/// Registered observers, called in registration order.
///
/// Callbacks run while the engine is borrowed and must not call back into it.
#[derive(Default)]
struct Subscribers {
    next_id: SubscriptionId,
    stats_update: Vec<(SubscriptionId, StatsCallback)>,
    game_end: Vec<(SubscriptionId, StatsCallback)>,
}

impl Subscribers {
    fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        self.next_id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.stats_update.len() + self.game_end.len();
        self.stats_update.retain(|(sub, _)| *sub != id);
        self.game_end.retain(|(sub, _)| *sub != id);
        before != self.stats_update.len() + self.game_end.len()
    }

    fn clear(&mut self) {
        self.stats_update.clear();
        self.game_end.clear();
    }
}

/// Outcome of one fire event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shot {
    /// Ray hit a live target; `points` is what the ledger recorded
    Hit { target: TargetId, points: f32 },
    Miss,
    /// No round playing, engine disposed, or the target was already gone
    Ignored,
}

/// Simulation state the fixed-step callback mutates
struct World {
    state: GameState,
    scene: Scene,
    camera: Camera,
    modes: ModeSet,
    effects: ImpactEffects,
    rng: Pcg32,
    /// Mode driving the current (or last) round
    active: ModeKind,
}

impl World {
    /// One fixed simulation step
    fn step(&mut self, dt: f32) {
        let was_playing = self.state.is_playing();
        self.state.update(dt);

        let mode = self.modes.get_mut(self.active);
        if self.state.is_playing() {
            let mut ctx = ModeContext {
                state: &mut self.state,
                scene: &mut self.scene,
                rng: &mut self.rng,
            };
            mode.update(&mut ctx, dt);
        } else if was_playing {
            // Time limit reached this step
            mode.stop(&mut self.scene);
        }

        self.effects.update(dt, &mut self.scene);
        self.camera.update(dt, &mut self.rng);
    }

    /// Hand a raycast result to the active mode. The burst plays only when
    /// the mode scored the shot as a hit.
    fn resolve_shot(&mut self, hit: Option<RayHit>) -> Shot {
        let mode = self.modes.get_mut(self.active);
        let mut ctx = ModeContext {
            state: &mut self.state,
            scene: &mut self.scene,
            rng: &mut self.rng,
        };
        let Some(hit) = hit else {
            mode.on_miss(&mut ctx);
            return Shot::Miss;
        };

        let (hits, misses) = (ctx.state.hits(), ctx.state.misses());
        let points = mode.on_hit(&mut ctx, hit.target_id, hit.point);
        if ctx.state.hits() == hits {
            // Rim noise the mode scored as a miss, or a target already gone
            return if ctx.state.misses() > misses {
                Shot::Miss
            } else {
                Shot::Ignored
            };
        }

        self.effects.trigger(&mut self.scene, hit.point, &mut self.rng);
        Shot::Hit {
            target: hit.target_id,
            points,
        }
    }
}

pub struct RangeEngine<R: RenderBackend> {
    world: World,
    game_loop: GameLoop,
    raycaster: Raycaster,
    input: InputCapture,
    renderer: R,
    viewport: Viewport,
    /// Mode the next `start_game` uses
    selected: ModeKind,
    subscribers: Subscribers,
    disposed: bool,
}

impl<R: RenderBackend> RangeEngine<R> {
    pub fn new(viewport: Viewport, renderer: R, clock: Box<dyn Clock>, seed: u64) -> Self {
        let camera = Camera::new(viewport);
        let mut modes = ModeSet::new();
        modes.set_visible_bounds(camera.visible_bounds(SPAWN_PADDING));
        if viewport.is_degenerate() {
            log::warn!(
                "Engine created with degenerate viewport {}x{}, using fallback aspect",
                viewport.width,
                viewport.height
            );
        }

        log::info!("Range engine initialized (seed {})", seed);
        Self {
            world: World {
                state: GameState::new(clock),
                scene: Scene::new(),
                camera,
                modes,
                effects: ImpactEffects::new(),
                rng: Pcg32::seed_from_u64(seed),
                active: ModeKind::default(),
            },
            game_loop: GameLoop::new(),
            raycaster: Raycaster::default(),
            input: InputCapture::new(),
            renderer,
            viewport,
            selected: ModeKind::default(),
            subscribers: Subscribers::default(),
            disposed: false,
        }
    }

    // ------------------------------------------------------------------
    // Host operations
    // ------------------------------------------------------------------

    /// Select the mode for the next round. A round in progress is unaffected.
    pub fn set_mode(&mut self, kind: ModeKind) {
        if self.selected != kind {
            log::info!("Mode selected: {}", kind);
        }
        self.selected = kind;
    }

    /// Select a mode by its identifier (`gridshot`, `spidershot`, `microshot`)
    pub fn set_mode_str(&mut self, name: &str) -> Result<(), RangeError> {
        let kind = name.parse()?;
        self.set_mode(kind);
        Ok(())
    }

    /// Begin a round with the selected mode, tearing down any previous one
    pub fn start_game(&mut self) {
        if self.disposed {
            return;
        }
        let world = &mut self.world;
        world.modes.stop_all(&mut world.scene);

        world.active = self.selected;
        world.state.set_mode(self.selected);
        world.state.start_round();

        let mode = world.modes.get_mut(world.active);
        let mut ctx = ModeContext {
            state: &mut world.state,
            scene: &mut world.scene,
            rng: &mut world.rng,
        };
        mode.start(&mut ctx);

        self.dispatch_events();
    }

    /// Abandon the round: no game-end notification
    pub fn stop_game(&mut self) {
        if self.disposed {
            return;
        }
        let world = &mut self.world;
        world.modes.get_mut(world.active).stop(&mut world.scene);
        world.state.force_idle();
        log::info!("Round stopped");
        self.dispatch_events();
    }

    /// Host element resized. Degenerate sizes keep the previous projection.
    pub fn resize(&mut self, viewport: Viewport) {
        if self.disposed {
            return;
        }
        if !self.world.camera.resize(viewport) {
            log::debug!(
                "Ignoring degenerate resize {}x{}",
                viewport.width,
                viewport.height
            );
            return;
        }
        self.viewport = viewport;
        self.world
            .modes
            .set_visible_bounds(self.world.camera.visible_bounds(SPAWN_PADDING));
        self.renderer.resize(viewport);
    }

    /// Start the fixed-step scheduler at host time `now` (ms)
    pub fn start_loop(&mut self, now: f64) {
        if self.disposed {
            return;
        }
        self.game_loop.start(now);
    }

    /// Run one host animation frame: fixed steps, notifications, then a draw.
    /// Returns the number of fixed steps executed.
    pub fn frame(&mut self, now: f64) -> u32 {
        if self.disposed {
            return 0;
        }
        let world = &mut self.world;
        let steps = self.game_loop.frame(now, |dt| world.step(dt));
        self.dispatch_events();
        self.renderer
            .render(&self.world.scene, &self.world.camera, now);
        steps
    }

    /// Feed a translated input event
    pub fn handle_input(&mut self, event: InputEvent) -> Option<Shot> {
        match event {
            InputEvent::Fire(screen) => Some(self.fire(screen)),
            // Cursor tracking only
            InputEvent::Move(_) | InputEvent::Release => None,
        }
    }

    /// Shoot at an element-relative pixel position
    pub fn fire(&mut self, screen: Vec2) -> Shot {
        if self.disposed || !self.world.state.is_playing() {
            return Shot::Ignored;
        }

        let world = &mut self.world;
        let proxies = world.modes.get(world.active).hit_test_objects();
        let hit = self
            .raycaster
            .cast(&world.camera, screen, self.viewport, &proxies);
        let shot = world.resolve_shot(hit);

        world.camera.shake(SHAKE_INTENSITY, SHAKE_DURATION);
        self.dispatch_events();
        shot
    }

    /// Tear everything down in dependency order. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.game_loop.stop();
        self.input.dispose();
        let world = &mut self.world;
        world.modes.stop_all(&mut world.scene);
        world.effects.dispose(&mut world.scene);
        world.scene.dispose();
        self.renderer.dispose();
        self.subscribers.clear();
        log::info!("Range engine disposed");
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Called on every session change (HUD)
    pub fn on_stats_update(&mut self, callback: impl FnMut(&GameStats) + 'static) -> SubscriptionId {
        let id = self.subscribers.next_id();
        self.subscribers.stats_update.push((id, Box::new(callback)));
        id
    }

    /// Called once per completed round with the final stats
    pub fn on_game_end(&mut self, callback: impl FnMut(&GameStats) + 'static) -> SubscriptionId {
        let id = self.subscribers.next_id();
        self.subscribers.game_end.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn dispatch_events(&mut self) {
        for event in self.world.state.drain_events() {
            match event {
                SessionEvent::StatsChanged(stats) => {
                    for (_, callback) in self.subscribers.stats_update.iter_mut() {
                        callback(&stats);
                    }
                }
                SessionEvent::RoundEnded(stats) => {
                    for (_, callback) in self.subscribers.game_end.iter_mut() {
                        callback(&stats);
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn stats(&self) -> GameStats {
        self.world.state.stats()
    }

    pub fn status(&self) -> GameStatus {
        self.world.state.status()
    }

    pub fn selected_mode(&self) -> ModeKind {
        self.selected
    }

    /// Mode of the current (or last) round
    pub fn active_mode(&self) -> ModeKind {
        self.world.active
    }

    pub fn live_targets(&self) -> usize {
        self.world.modes.get(self.world.active).live_targets()
    }

    /// On-screen centers of the active mode's live targets
    pub fn target_screen_positions(&self) -> Vec<(TargetId, Vec2)> {
        self.world
            .modes
            .get(self.world.active)
            .hit_test_objects()
            .into_iter()
            .filter_map(|proxy| {
                self.world
                    .camera
                    .world_to_screen(proxy.center, self.viewport)
                    .map(|screen| (proxy.target_id, screen))
            })
            .collect()
    }

    pub fn active_effects(&self) -> usize {
        self.world.effects.len()
    }

    pub fn fps(&self) -> u32 {
        self.game_loop.fps()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> &Camera {
        &self.world.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.world.scene
    }

    pub fn game_loop(&self) -> &GameLoop {
        &self.game_loop
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Raw input translation; feed its results to [`Self::handle_input`]
    pub fn input_mut(&mut self) -> &mut InputCapture {
        &mut self.input
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ManualClock;
    use crate::renderer::HeadlessBackend;
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    const VIEWPORT: Viewport = Viewport::new(1280.0, 720.0);

    fn engine() -> (RangeEngine<HeadlessBackend>, ManualClock) {
        let clock = ManualClock::new(0.0);
        let engine = RangeEngine::new(
            VIEWPORT,
            HeadlessBackend::new(VIEWPORT),
            Box::new(clock.clone()),
            7,
        );
        (engine, clock)
    }

    #[test]
    fn test_fire_ignored_until_round_starts() {
        let (mut engine, _clock) = engine();
        assert_eq!(engine.fire(Vec2::new(640.0, 360.0)), Shot::Ignored);
        assert_eq!(engine.stats().misses, 0);
    }

    #[test]
    fn test_set_mode_applies_at_next_start() {
        let (mut engine, _clock) = engine();
        engine.start_game();
        assert_eq!(engine.active_mode(), ModeKind::Gridshot);
        assert_eq!(engine.live_targets(), 3);

        engine.set_mode(ModeKind::Spidershot);
        assert_eq!(engine.active_mode(), ModeKind::Gridshot);
        assert_eq!(engine.live_targets(), 3);

        engine.start_game();
        assert_eq!(engine.active_mode(), ModeKind::Spidershot);
        assert_eq!(engine.live_targets(), 1);
        // Previous mode's targets were released
        assert_eq!(engine.scene().targets().count(), 1);
    }

    #[test]
    fn test_set_mode_str_rejects_unknown() {
        let (mut engine, _clock) = engine();
        assert!(engine.set_mode_str("Microshot").is_ok());
        assert_eq!(engine.selected_mode(), ModeKind::Microshot);
        assert!(matches!(
            engine.set_mode_str("tracking"),
            Err(RangeError::UnknownMode(_))
        ));
        assert_eq!(engine.selected_mode(), ModeKind::Microshot);
    }

    #[test]
    fn test_center_hit_and_stray_miss() {
        let (mut engine, _clock) = engine();
        engine.start_game();

        let (id, screen) = engine.target_screen_positions()[0];
        match engine.fire(screen) {
            Shot::Hit { target, points } => {
                assert_eq!(target, id);
                assert!(points > 12.0);
            }
            other => panic!("expected a hit, got {:?}", other),
        }
        assert_eq!(engine.stats().x_ring_hits, 1);
        assert!(engine.active_effects() > 0);

        // Far corner never holds a target
        assert_eq!(engine.fire(Vec2::new(1.0, 1.0)), Shot::Miss);
        let stats = engine.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.streak, 0);
        assert!(engine.camera().is_shaking());
    }

    #[test]
    fn test_rim_noise_is_a_miss_without_burst() {
        let (mut engine, _clock) = engine();
        engine.start_game();

        let proxy = engine.world.modes.get(ModeKind::Gridshot).hit_test_objects()[0];
        // Point outside the scoring face
        let shot = engine.world.resolve_shot(Some(RayHit {
            target_id: proxy.target_id,
            point: proxy.center + Vec3::X * proxy.radius * 1.01,
            distance: 10.0,
        }));
        assert_eq!(shot, Shot::Miss);
        let stats = engine.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(engine.active_effects(), 0);
        assert_eq!(engine.live_targets(), 3);

        // Already-removed target
        let stale = RayHit {
            target_id: TargetId(9999),
            point: proxy.center,
            distance: 10.0,
        };
        assert_eq!(engine.world.resolve_shot(Some(stale)), Shot::Ignored);
        assert_eq!(engine.stats().misses, 1);
        assert_eq!(engine.active_effects(), 0);
    }

    #[test]
    fn test_stop_game_skips_game_end() {
        let (mut engine, _clock) = engine();
        let ended = Rc::new(RefCell::new(0));
        let counter = ended.clone();
        engine.on_game_end(move |_| *counter.borrow_mut() += 1);

        engine.start_game();
        engine.stop_game();
        assert_eq!(engine.status(), GameStatus::Idle);
        assert_eq!(engine.live_targets(), 0);
        assert_eq!(*ended.borrow(), 0);
    }

    #[test]
    fn test_degenerate_resize_keeps_projection() {
        let (mut engine, _clock) = engine();
        let aspect = engine.camera().aspect();
        engine.resize(Viewport::new(0.0, 0.0));
        assert_eq!(engine.viewport(), VIEWPORT);
        assert_eq!(engine.camera().aspect(), aspect);

        engine.resize(Viewport::new(400.0, 800.0));
        assert_eq!(engine.renderer().viewport(), Viewport::new(400.0, 800.0));
        assert!((engine.camera().aspect() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_unsubscribe() {
        let (mut engine, _clock) = engine();
        let seen = Rc::new(RefCell::new(0));
        let counter = seen.clone();
        let id = engine.on_stats_update(move |_| *counter.borrow_mut() += 1);

        engine.start_game();
        let after_start = *seen.borrow();
        assert!(after_start > 0);

        assert!(engine.unsubscribe(id));
        assert!(!engine.unsubscribe(id));
        engine.fire(Vec2::new(1.0, 1.0));
        assert_eq!(*seen.borrow(), after_start);
    }

    #[test]
    fn test_frame_renders_once_per_call() {
        let (mut engine, clock) = engine();
        engine.start_game();
        engine.start_loop(0.0);
        for i in 1..=10 {
            let now = i as f64 * 20.0;
            clock.set(now);
            engine.frame(now);
        }
        assert_eq!(engine.renderer().frames(), 10);
        assert_eq!(engine.renderer().last_frame().rings.len(), 3);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut engine, _clock) = engine();
        engine.start_game();
        engine.start_loop(0.0);
        let (_, screen) = engine.target_screen_positions()[0];
        engine.fire(screen);

        engine.dispose();
        engine.dispose();
        assert!(engine.is_disposed());
        assert!(engine.scene().is_empty());
        assert!(engine.renderer().is_disposed());
        assert!(!engine.game_loop().is_running());
        assert_eq!(engine.frame(1000.0), 0);
        assert_eq!(engine.fire(screen), Shot::Ignored);
    }
}
