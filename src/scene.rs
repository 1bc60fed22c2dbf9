//! Scene builder and the window loop that drives it.
//!
//! ```ignore
//! use scatterform::prelude::*;
//!
//! Scene::new()
//!     .with_default_models()
//!     .with_title("Scatterform")
//!     .run()?;
//! ```

use std::sync::mpsc;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::animation::{AnimationStep, ZeroAxisPolicy};
use crate::context::{AnimationContext, COMPOSER_TICK};
use crate::error::{GpuError, SceneError};
use crate::gpu::GpuState;
use crate::loader::{default_models, MeshLoader, ModelSpec};

/// Frames between window title refreshes.
const TITLE_REFRESH_FRAMES: u64 = 60;

/// Builder for the animated scene.
pub struct Scene {
    models: Vec<ModelSpec>,
    title: String,
    window_size: (u32, u32),
    policy: ZeroAxisPolicy,
    seed: Option<u64>,
}

impl Scene {
    /// Create an empty scene. Add models before running it.
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            title: "Scatterform".to_string(),
            window_size: (1280, 720),
            policy: ZeroAxisPolicy::default(),
            seed: None,
        }
    }

    /// Add the two figures of the default scene.
    pub fn with_default_models(mut self) -> Self {
        self.models.extend(default_models());
        self
    }

    /// Add one model. Groups are registered in the order their loads finish.
    pub fn with_model(mut self, spec: ModelSpec) -> Self {
        self.models.push(spec);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// How to treat reference points lying on a coordinate plane while rising.
    pub fn with_zero_axis_policy(mut self, policy: ZeroAxisPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fix the random stream so timings repeat between runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    /// Start loading models, open the window and run until it closes.
    pub fn run(self) -> Result<(), SceneError> {
        let (sender, receiver) = mpsc::channel();
        let loader = MeshLoader::new(sender);
        for spec in self.models {
            loader.spawn(spec).map_err(SceneError::LoaderSpawn)?;
        }
        // Only the workers hold senders now, so the channel closes once they finish.
        drop(loader);

        let context = AnimationContext::new(AnimationStep::new(self.policy), self.seed).with_loads(receiver);

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(context, self.title, self.window_size);
        event_loop.run_app(&mut app)?;

        match app.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    context: AnimationContext,
    title: String,
    window_size: (u32, u32),
    error: Option<SceneError>,
}

impl App {
    fn new(context: AnimationContext, title: String, window_size: (u32, u32)) -> Self {
        Self {
            window: None,
            gpu_state: None,
            context,
            title,
            window_size,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SceneError> {
        let (width, height) = self.window_size;
        let window_attrs = Window::default_attributes()
            .with_title(self.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        log::info!("Opened window '{}' ({}x{})", self.title, width, height);
        self.window = Some(window.clone());

        let gpu_state: Result<GpuState, GpuError> =
            pollster::block_on(GpuState::new(window, self.context.decoration()));
        self.gpu_state = Some(gpu_state?);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        self.context.advance_frame();
        gpu_state.sync(&mut self.context);

        match gpu_state.render(COMPOSER_TICK) {
            Ok(_) => {}
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Reconfiguring surface: {}", e);
                gpu_state.resize(winit::dpi::PhysicalSize {
                    width: gpu_state.config.width,
                    height: gpu_state.config.height,
                })
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::error!("Render error: {:?}", e),
        }

        if let Some(window) = &self.window {
            let time = self.context.time();
            if time.frame() % TITLE_REFRESH_FRAMES == 0 {
                window.set_title(&format!("{} - {:.0} fps", self.title, time.fps()));
            }
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init(event_loop) {
                log::error!("{}", err);
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Placement;

    #[test]
    fn test_builder_collects_models() {
        let scene = Scene::new()
            .with_default_models()
            .with_model(ModelSpec::new("extra", "extra.obj", Placement::default()))
            .with_seed(9)
            .with_zero_axis_policy(ZeroAxisPolicy::Propagate);

        let names: Vec<_> = scene.models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["male02", "female02", "extra"]);
        assert_eq!(scene.seed, Some(9));
        assert_eq!(scene.policy, ZeroAxisPolicy::Propagate);
    }
}
