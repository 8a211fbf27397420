//! Zeroed In entry point
//!
//! Handles platform-specific initialization and drives the engine from the
//! browser's animation-frame callback.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, EventTarget, HtmlCanvasElement, Window};

    use zeroed_in::engine::RangeEngine;
    use zeroed_in::error::RangeError;
    use zeroed_in::platform::web::{self, ListenerSet};
    use zeroed_in::platform::{Clock, default_clock};
    use zeroed_in::renderer::{GpuBackend, HeadlessBackend, RenderBackend, SdfRenderState};
    use zeroed_in::settings::{LocalStorage, SettingsStore};
    use zeroed_in::sim::{Camera, GameStats, Scene, Viewport};

    /// WebGPU when available, otherwise a backend that draws nothing
    enum HostBackend {
        Gpu(GpuBackend),
        Headless(HeadlessBackend),
    }

    impl RenderBackend for HostBackend {
        fn resize(&mut self, viewport: Viewport) {
            match self {
                HostBackend::Gpu(gpu) => gpu.resize(viewport),
                HostBackend::Headless(headless) => headless.resize(viewport),
            }
        }

        fn render(&mut self, scene: &Scene, camera: &Camera, time: f64) {
            match self {
                HostBackend::Gpu(gpu) => gpu.render(scene, camera, time),
                HostBackend::Headless(headless) => headless.render(scene, camera, time),
            }
        }

        fn dispose(&mut self) {
            match self {
                HostBackend::Gpu(gpu) => gpu.dispose(),
                HostBackend::Headless(headless) => headless.dispose(),
            }
        }
    }

    /// Page-lifetime state shared by every DOM callback
    struct App {
        engine: RangeEngine<HostBackend>,
        canvas: HtmlCanvasElement,
        /// Buttons, resize, pagehide (input listeners belong to the engine)
        host_listeners: ListenerSet,
    }

    impl App {
        fn dispose(&mut self) {
            self.engine.dispose();
            self.host_listeners.detach_all();
        }
    }

    fn window() -> Result<Window, RangeError> {
        web_sys::window().ok_or_else(|| RangeError::Platform("no window".into()))
    }

    fn document() -> Result<Document, RangeError> {
        window()?
            .document()
            .ok_or_else(|| RangeError::Platform("no document".into()))
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    /// Canvas size in CSS pixels; the backing store is scaled by the DPR
    fn fit_canvas(window: &Window, canvas: &HtmlCanvasElement) -> (Viewport, f32) {
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        canvas.set_width((client_w as f64 * dpr) as u32);
        canvas.set_height((client_h as f64 * dpr) as u32);
        (Viewport::new(client_w as f32, client_h as f32), dpr as f32)
    }

    async fn create_gpu_backend(
        canvas: &HtmlCanvasElement,
        viewport: Viewport,
        dpr: f32,
    ) -> Result<GpuBackend, RangeError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|err| RangeError::Platform(format!("failed to create surface: {err}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| RangeError::Platform(format!("no GPU adapter: {err}")))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = SdfRenderState::new(surface, &adapter, canvas.width(), canvas.height()).await?;
        render_state.set_start_time(default_clock().now_ms());
        Ok(GpuBackend::new(render_state, viewport, dpr))
    }

    fn update_hud(document: &Document, stats: &GameStats) {
        set_text(document, "#hud-score .hud-value", &format!("{:.1}", stats.score));
        set_text(document, "#hud-accuracy .hud-value", &format!("{:.1}%", stats.accuracy));
        set_text(document, "#hud-streak .hud-value", &stats.streak.to_string());
        let remaining = (stats.time_limit - stats.time_elapsed).max(0.0);
        set_text(document, "#hud-time .hud-value", &format!("{:.1}", remaining));
        let last = match stats.last_hit_score {
            Some(score) if stats.last_hit_x_ring => format!("{:.1} X", score),
            Some(score) => format!("{:.1}", score),
            None => "-".to_string(),
        };
        set_text(document, "#hud-last .hud-value", &last);
    }

    fn show_results(document: &Document, stats: &GameStats) {
        set_text(document, "#result-score", &format!("{:.1}", stats.score));
        set_text(document, "#result-accuracy", &format!("{:.1}%", stats.accuracy));
        set_text(document, "#result-hits", &format!("{} / {}", stats.hits, stats.hits + stats.misses));
        set_text(document, "#result-xring", &stats.x_ring_hits.to_string());
        set_text(document, "#result-best-streak", &stats.best_streak.to_string());
        set_text(document, "#result-average", &format!("{:.1}", stats.average_score));
        set_text(
            document,
            "#result-reaction",
            &format!("{} ms", stats.average_reaction_time),
        );
        show(document, "hud", false);
        show(document, "results", true);
    }

    fn show_preloader(document: &Document) {
        let settings = SettingsStore::new(LocalStorage).get();
        let kind = settings.preloader;
        if let Some(el) = document.get_element_by_id("preloader") {
            let _ = el.set_attribute("data-kind", kind.as_str());
        }
        set_text(document, "#preloader .preloader-name", kind.name());
        set_text(document, "#preloader .preloader-description", kind.description());
    }

    pub async fn run() -> Result<(), RangeError> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Zeroed In starting...");

        let window = window()?;
        let document = document()?;
        show_preloader(&document);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| RangeError::Platform("no canvas".into()))?
            .dyn_into()
            .map_err(|_| RangeError::Platform("#canvas is not a canvas".into()))?;

        let (viewport, dpr) = fit_canvas(&window, &canvas);

        let backend = match create_gpu_backend(&canvas, viewport, dpr).await {
            Ok(gpu) => HostBackend::Gpu(gpu),
            Err(err) => {
                log::error!("WebGPU unavailable, range will not draw: {}", err);
                show(&document, "gpu-error", true);
                HostBackend::Headless(HeadlessBackend::new(viewport))
            }
        };

        let seed = js_sys::Date::now() as u64;
        let mut engine = RangeEngine::new(viewport, backend, default_clock(), seed);

        {
            let document = document.clone();
            engine.on_stats_update(move |stats| update_hud(&document, stats));
        }
        {
            let document = document.clone();
            engine.on_game_end(move |stats| show_results(&document, stats));
        }

        let app = Rc::new(RefCell::new(App {
            engine,
            canvas: canvas.clone(),
            host_listeners: ListenerSet::new(),
        }));

        setup_input_handlers(&canvas, app.clone())?;
        setup_mode_buttons(&document, app.clone())?;
        setup_round_buttons(&document, app.clone())?;
        setup_lifecycle(&window, app.clone())?;

        show(&document, "preloader", false);
        show(&document, "menu", true);

        // Start game loop
        request_animation_frame(app);

        log::info!("Zeroed In running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) -> Result<(), RangeError> {
        let listeners = Rc::new(RefCell::new(ListenerSet::new()));
        let target: &EventTarget = canvas.as_ref();
        let element: Element = canvas.clone().into();
        let crosshair = document()?.get_element_by_id("crosshair");

        let move_crosshair = move |pos: Vec2| {
            if let Some(el) = &crosshair {
                let _ = el.set_attribute(
                    "style",
                    &format!("transform: translate({}px, {}px)", pos.x, pos.y),
                );
            }
        };

        {
            let mut set = listeners.borrow_mut();

            // Mouse
            {
                let app = app.clone();
                let element = element.clone();
                set.add(target, "mousedown", true, move |event| {
                    let Some((button, pos)) = web::mouse_position(&event, &element) else {
                        return;
                    };
                    let mut app = app.borrow_mut();
                    let engine = &mut app.engine;
                    if let Some(input) = engine.input_mut().mouse_down(button, pos) {
                        engine.handle_input(input);
                    }
                })?;
            }
            {
                let app = app.clone();
                let element = element.clone();
                let move_crosshair = move_crosshair.clone();
                set.add(target, "mousemove", true, move |event| {
                    let Some((_, pos)) = web::mouse_position(&event, &element) else {
                        return;
                    };
                    let mut app = app.borrow_mut();
                    if app.engine.input_mut().mouse_move(pos).is_some() {
                        move_crosshair(pos);
                    }
                })?;
            }
            {
                let app = app.clone();
                let element = element.clone();
                set.add(target, "mouseup", true, move |event| {
                    if let Some((button, _)) = web::mouse_position(&event, &element) {
                        app.borrow_mut().engine.input_mut().mouse_up(button);
                    }
                })?;
            }
            set.add(target, "contextmenu", false, |event| event.prevent_default())?;

            // Touch (non-passive so the page does not scroll)
            {
                let app = app.clone();
                let element = element.clone();
                let move_crosshair = move_crosshair.clone();
                set.add(target, "touchstart", false, move |event| {
                    event.prevent_default();
                    let touch = web::first_touch(&event, &element);
                    let mut app = app.borrow_mut();
                    let engine = &mut app.engine;
                    if let Some(input) = engine.input_mut().touch_start(touch) {
                        if let Some(pos) = touch {
                            move_crosshair(pos);
                        }
                        engine.handle_input(input);
                    }
                })?;
            }
            {
                let app = app.clone();
                let element = element.clone();
                set.add(target, "touchmove", false, move |event| {
                    event.prevent_default();
                    let touch = web::first_touch(&event, &element);
                    let mut app = app.borrow_mut();
                    if let Some(pos) = touch {
                        if app.engine.input_mut().touch_move(Some(pos)).is_some() {
                            move_crosshair(pos);
                        }
                    }
                })?;
            }
            {
                let app = app.clone();
                set.add(target, "touchend", true, move |_event| {
                    app.borrow_mut().engine.input_mut().touch_end();
                })?;
            }
        }

        log::info!("Input listeners attached: {}", listeners.borrow().attached());
        app.borrow_mut()
            .engine
            .input_mut()
            .set_detach(move || listeners.borrow_mut().detach_all());
        Ok(())
    }

    fn setup_mode_buttons(document: &Document, app: Rc<RefCell<App>>) -> Result<(), RangeError> {
        let buttons = document
            .query_selector_all(".mode-btn")
            .map_err(|err| RangeError::Platform(format!("querySelectorAll failed: {:?}", err)))?;

        let mut elements = Vec::new();
        for i in 0..buttons.length() {
            if let Some(el) = buttons.get(i).and_then(|node| node.dyn_into::<Element>().ok()) {
                elements.push(el);
            }
        }

        let selected = app.borrow().engine.selected_mode();
        for el in &elements {
            let Some(mode) = el.get_attribute("data-mode") else {
                continue;
            };
            if mode == selected.as_str() {
                let _ = el.set_attribute("class", "mode-btn active");
            }

            let app_ref = app.clone();
            let all = elements.clone();
            let this = el.clone();
            app.borrow_mut()
                .host_listeners
                .add(el.as_ref(), "click", true, move |_event| {
                    if let Err(err) = app_ref.borrow_mut().engine.set_mode_str(&mode) {
                        log::warn!("{}", err);
                        return;
                    }
                    for other in &all {
                        let _ = other.set_attribute("class", "mode-btn");
                    }
                    let _ = this.set_attribute("class", "mode-btn active");
                })?;
        }
        Ok(())
    }

    fn on_click(
        document: &Document,
        app: &Rc<RefCell<App>>,
        id: &str,
        handler: impl Fn(&mut App, &Document) + 'static,
    ) -> Result<(), RangeError> {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing #{} button", id);
            return Ok(());
        };
        let app_ref = app.clone();
        let document = document.clone();
        app.borrow_mut()
            .host_listeners
            .add(btn.as_ref(), "click", true, move |_event| {
                handler(&mut app_ref.borrow_mut(), &document);
            })
    }

    fn start_round(app: &mut App, document: &Document) {
        show(document, "menu", false);
        show(document, "results", false);
        show(document, "hud", true);
        app.engine.start_game();
    }

    fn setup_round_buttons(document: &Document, app: Rc<RefCell<App>>) -> Result<(), RangeError> {
        on_click(document, &app, "start-btn", start_round)?;
        on_click(document, &app, "replay-btn", start_round)?;
        on_click(document, &app, "stop-btn", |app, document| {
            app.engine.stop_game();
            show(document, "hud", false);
            show(document, "menu", true);
        })?;
        on_click(document, &app, "menu-btn", |_app, document| {
            show(document, "results", false);
            show(document, "menu", true);
        })?;
        Ok(())
    }

    fn setup_lifecycle(window: &Window, app: Rc<RefCell<App>>) -> Result<(), RangeError> {
        let target: &EventTarget = window.as_ref();
        {
            let app_ref = app.clone();
            let window = window.clone();
            app.borrow_mut()
                .host_listeners
                .add(target, "resize", true, move |_event| {
                    let mut app = app_ref.borrow_mut();
                    let (viewport, dpr) = fit_canvas(&window, &app.canvas);
                    if let HostBackend::Gpu(gpu) = app.engine.renderer_mut() {
                        gpu.set_pixel_ratio(dpr);
                    }
                    app.engine.resize(viewport);
                })?;
        }
        {
            let app_ref = app.clone();
            app.borrow_mut()
                .host_listeners
                .add(target, "pagehide", true, move |_event| {
                    app_ref.borrow_mut().dispose();
                })?;
        }
        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Ok(window) = window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut app = app.borrow_mut();
            if app.engine.is_disposed() {
                log::info!("Animation loop stopped");
                return;
            }
            if !app.engine.game_loop().is_running() {
                app.engine.start_loop(time);
            }
            app.engine.frame(time);
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(err) = wasm_game::run().await {
        log::error!("Zeroed In failed to start: {}", err);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Zeroed In (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    demo::perfect_round();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted Gridshot round with a perfect aimer
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use zeroed_in::RangeEngine;
    use zeroed_in::consts::FRAME_MS;
    use zeroed_in::platform::ManualClock;
    use zeroed_in::renderer::HeadlessBackend;
    use zeroed_in::sim::{GameStatus, ModeKind, Viewport};

    /// Frames between shots (~4 shots per second)
    const SHOT_INTERVAL: u32 = 15;

    pub fn perfect_round() {
        let viewport = Viewport::new(1280.0, 720.0);
        let clock = ManualClock::new(0.0);
        let mut engine = RangeEngine::new(
            viewport,
            HeadlessBackend::new(viewport),
            Box::new(clock.clone()),
            42,
        );

        engine.on_game_end(|stats| {
            log::info!(
                "Final: score {:.1}, {} hits, {} misses, {:.1}% accuracy, {} X-rings, {} ms avg reaction",
                stats.score,
                stats.hits,
                stats.misses,
                stats.accuracy,
                stats.x_ring_hits,
                stats.average_reaction_time
            );
        });

        engine.set_mode(ModeKind::Gridshot);
        engine.start_game();
        engine.start_loop(0.0);

        let mut frame = 0u32;
        while engine.status() == GameStatus::Playing {
            frame += 1;
            let now = frame as f64 * FRAME_MS;
            clock.set(now);
            engine.frame(now);

            if frame % SHOT_INTERVAL != 0 {
                continue;
            }
            if let Some((_, screen)) = engine.target_screen_positions().first().copied() {
                engine.fire(screen);
            }
        }

        log::info!(
            "Demo finished after {} frames ({} renders)",
            frame,
            engine.renderer().frames()
        );
        engine.dispose();
    }
}
