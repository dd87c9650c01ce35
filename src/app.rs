//! Application shell: window, frame loop and wiring.
//!
//! Data flows one way each frame: parameters → simulator step → scene →
//! GPU. The parameter store notifies the simulator synchronously, so a
//! complexity change reseeds the field before the next step runs.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::chat::ChatSession;
use crate::config::AppConfig;
use crate::connections::{connections_for, ConnectionStrategy};
use crate::error::AppError;
use crate::frame_loop::{run_interval, FrameLoop};
use crate::gpu::GpuState;
use crate::i18n::Language;
use crate::oracle::GeminiBackend;
use crate::params::{Param, ParameterStore};
use crate::scene::Scene;
use crate::simulation::ParticleField;
use crate::time::Time;
use crate::visuals::FieldStateLabel;

/// Slider step per key press, per input.
fn key_step(param: Param) -> f32 {
    match param {
        Param::Frequency => 5.0,
        Param::Complexity => 10.0,
        Param::Recursion => 5.0,
    }
}

/// Window title with the live readouts, used when no UI panel is shown.
pub fn title_readout(
    base: &str,
    language: Language,
    coherence: f32,
    entropy: f32,
    fps: f32,
) -> String {
    let labels = language.labels();
    let state = labels.field_state_name(FieldStateLabel::from_coherence(coherence));
    format!(
        "{base} | {state} | {} {coherence:.1}% | {} {entropy:.2} | {fps:.0} fps",
        labels.emergence, labels.entropy
    )
}

pub struct App {
    config: AppConfig,
    store: ParameterStore,
    field: Rc<RefCell<ParticleField>>,
    chat: ChatSession<GeminiBackend>,
    strategy: ConnectionStrategy,
    time: Time,
    title: String,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    frames: Option<FrameLoop<Arc<Window>>>,
    #[cfg(feature = "egui")]
    panel: crate::ui::PanelState,
    error: Option<AppError>,
}

impl App {
    pub fn new(config: AppConfig, runtime: Handle) -> Self {
        let mut store = ParameterStore::new(config.params);
        let field = ParticleField::builder()
            .with_optional_seed(config.seed)
            .with_noise(config.noise)
            .build(&store.get());
        let field = Rc::new(RefCell::new(field));

        let listener = Rc::clone(&field);
        store.subscribe(move |change| {
            listener.borrow_mut().on_param_change(change);
        });

        let chat = ChatSession::new(
            GeminiBackend::new(config.oracle.clone()),
            runtime,
            config.language,
        );

        Self {
            strategy: config.connection_strategy,
            config,
            store,
            field,
            chat,
            time: Time::new(),
            title: String::new(),
            window: None,
            gpu: None,
            frames: None,
            #[cfg(feature = "egui")]
            panel: crate::ui::PanelState::default(),
            error: None,
        }
    }

    /// The error that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<AppError> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        tracing::error!(%error, "shutting down");
        self.error = Some(error);
        self.shutdown(event_loop);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(frames) = self.frames.as_mut() {
            frames.cancel();
        }
        event_loop.exit();
    }

    fn set_language(&mut self, language: Language) {
        tracing::info!(language = language.tag(), "language changed");
        self.config.language = language;
        self.chat.set_language(language);
    }

    fn nudge(&mut self, param: Param, direction: f32) {
        let value = self.store.get().value(param) + key_step(param) * direction;
        self.store.set(param, value);
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        match event.logical_key.as_ref() {
            Key::Named(NamedKey::Escape) => self.shutdown(event_loop),
            Key::Character("q") => self.nudge(Param::Frequency, 1.0),
            Key::Character("a") => self.nudge(Param::Frequency, -1.0),
            Key::Character("w") => self.nudge(Param::Complexity, 1.0),
            Key::Character("s") => self.nudge(Param::Complexity, -1.0),
            Key::Character("e") => self.nudge(Param::Recursion, 1.0),
            Key::Character("d") => self.nudge(Param::Recursion, -1.0),
            Key::Character("l") => self.set_language(self.config.language.toggled()),
            Key::Character("n") => {
                let mut field = self.field.borrow_mut();
                let mut step = field.step_config();
                step.noise = !step.noise;
                field.set_step_config(step);
                tracing::info!(noise = step.noise, "noise toggled");
            }
            Key::Character("g") => {
                self.strategy = match self.strategy {
                    ConnectionStrategy::Pairwise => ConnectionStrategy::Grid,
                    ConnectionStrategy::Grid => ConnectionStrategy::Pairwise,
                };
                tracing::info!(strategy = ?self.strategy, "connection strategy changed");
            }
            _ => {}
        }
    }

    #[cfg(feature = "egui")]
    fn apply(&mut self, action: crate::ui::UiAction) {
        use crate::ui::UiAction;
        match action {
            UiAction::SetParam(param, value) => {
                self.store.set(param, value);
            }
            UiAction::ToggleLanguage => self.set_language(self.config.language.toggled()),
            UiAction::Send(text) => match self.chat.send(&text) {
                Ok(()) => self.panel.input.clear(),
                Err(refusal) => tracing::debug!(?refusal, "message not sent"),
            },
        }
    }

    /// One frame: land chat replies, step, build the scene, draw.
    fn redraw(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.time.tick();
        self.chat.poll();

        let params = self.store.get();
        let vertices = {
            let mut field = self.field.borrow_mut();
            field.step(&params);
            Scene::build(field.points(), &params, self.time.elapsed(), self.strategy)
                .tessellate()
        };

        #[cfg(feature = "egui")]
        let actions = match (self.gpu.as_mut(), self.window.as_ref()) {
            (Some(gpu), Some(window)) => {
                gpu.egui.begin_frame(window);
                let view = crate::ui::PanelView {
                    params,
                    language: self.config.language,
                    messages: self.chat.messages(),
                    pending: self.chat.is_pending(),
                };
                let actions = crate::ui::draw(&gpu.egui.ctx, &mut self.panel, &view);
                let output = gpu.egui.end_frame(window);
                gpu.set_overlay(output);
                actions
            }
            _ => Vec::new(),
        };
        #[cfg(feature = "egui")]
        for action in actions {
            self.apply(action);
        }

        self.update_title();

        match self.gpu.as_mut() {
            Some(gpu) => gpu.render(&vertices),
            None => Ok(()),
        }
    }

    fn update_title(&mut self) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let params = self.store.get();
        let title = title_readout(
            &self.config.window.title,
            self.config.language,
            params.coherence,
            params.entropy(),
            self.time.fps(),
        );
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let gpu = match pollster::block_on(GpuState::new(Arc::clone(&window))) {
            Ok(gpu) => gpu,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        #[cfg(feature = "egui")]
        crate::ui::install_cjk_font(&gpu.egui.ctx);

        let mut frames = FrameLoop::new(Arc::clone(&window));
        frames.begin();

        tracing::info!(
            points = self.field.borrow().points().len(),
            coherence = self.store.get().coherence,
            "field started"
        );

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.frames = Some(frames);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        let consumed = match (self.gpu.as_mut(), self.window.as_ref()) {
            (Some(gpu), Some(window)) => {
                gpu.egui.on_window_event(window, &event) || gpu.egui.wants_keyboard()
            }
            _ => false,
        };
        #[cfg(not(feature = "egui"))]
        let consumed = false;

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if !consumed => {
                self.handle_key(event_loop, &event)
            }
            WindowEvent::RedrawRequested => {
                let Some(mut frames) = self.frames.take() else {
                    return;
                };
                let mut outcome = Ok(());
                frames.on_frame(|| outcome = self.redraw());
                self.frames = Some(frames);

                match outcome {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(gpu) = self.gpu.as_mut() {
                            gpu.reconfigure();
                        }
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("GPU out of memory");
                        self.shutdown(event_loop);
                    }
                    Err(e) => tracing::warn!(error = %e, "dropped frame"),
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut frames) = self.frames.take() {
            frames.cancel();
            tracing::info!(frames = frames.frames(), "frame loop stopped");
        }
    }
}

/// Open the window and run until it is closed.
pub fn run(config: AppConfig, runtime: Handle) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, runtime);
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Frame period of the headless driver.
pub const HEADLESS_PERIOD: Duration = Duration::from_millis(16);

/// Run the simulation without a window for `duration`, logging readouts.
pub async fn run_headless(config: AppConfig, duration: Duration) -> Result<(), AppError> {
    let store = ParameterStore::new(config.params);
    let params = store.get();
    let mut field = ParticleField::builder()
        .with_optional_seed(config.seed)
        .with_noise(config.noise)
        .build(&params);

    let token = CancellationToken::new();
    let timer = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        timer.cancel();
    });

    tracing::info!(
        points = field.points().len(),
        coherence = params.coherence,
        ?duration,
        "running headless"
    );
    let strategy = config.connection_strategy;
    let frames = run_interval(HEADLESS_PERIOD, token, || {
        field.step(&params);
        if field.frame() % 60 == 0 {
            let connections = connections_for(field.points(), &params, strategy).len();
            tracing::info!(frame = field.frame(), connections, "field readout");
        }
    })
    .await;

    let label = config
        .language
        .labels()
        .field_state_name(FieldStateLabel::from_coherence(params.coherence));
    tracing::info!(
        frames,
        state = label,
        entropy = params.entropy(),
        "headless run finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_readout() {
        let title = title_readout("Aetheria", Language::En, 93.6, 1.0, 59.6);
        assert_eq!(
            title,
            "Aetheria | CONSCIOUS | Emergence Probability 93.6% | ENTROPY 1.00 | 60 fps"
        );
        let zh = title_readout("Aetheria", Language::Zh, 22.0, 8.0, 0.0);
        assert!(zh.contains("休眠"));
    }

    #[test]
    fn test_key_steps_stay_in_range() {
        let mut store = ParameterStore::default();
        for _ in 0..100 {
            let v = store.get().value(Param::Complexity) + key_step(Param::Complexity);
            store.set(Param::Complexity, v);
        }
        assert_eq!(store.get().complexity, 200.0);
    }

    #[tokio::test]
    async fn test_headless_run_finishes() {
        let config = AppConfig {
            seed: Some(3),
            ..Default::default()
        };
        run_headless(config, Duration::from_millis(50)).await.unwrap();
    }
}
