//! Headless run of the camera and shadow pipeline.
//!
//! Feeds scripted input through the orbit camera, then recomputes cascades
//! and light placement every frame, logging what a renderer would consume.

mod scenario;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use glam::Mat4;
use sketchbook_camera::{CameraView, FollowedSubject, OrbitCamera, OrbitMode};
use sketchbook_config::{CliArgs, Config, ConfigError, default_config_dir};
use sketchbook_csm::{CascadedShadows, CsmError, CsmSettings, MaterialHandle};
use sketchbook_input::{BindingError, CameraBindings, KeyboardState, PointerState};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use winit::event::MouseScrollDelta;

use crate::scenario::{CircuitDriver, input_for_frame};

const FRAME: Duration = Duration::from_nanos(16_666_667);
/// How often per-frame state is summarised at info level.
const REPORT_EVERY: u32 = 30;

#[derive(Debug, Error)]
enum DemoError {
    #[error("no config directory available on this platform; pass --config")]
    NoConfigDir,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Shadows(#[from] CsmError),
    #[error(transparent)]
    Bindings(#[from] BindingError),
}

#[derive(Parser, Debug)]
#[command(name = "sketchbook-demo", about = "Run the camera and shadow pipeline headless")]
struct DemoArgs {
    #[command(flatten)]
    cli: CliArgs,

    /// Frames to simulate.
    #[arg(long, default_value_t = 240)]
    frames: u32,

    /// Follow a subject driving in circles instead of free-flying.
    #[arg(long)]
    follow: bool,
}

fn main() -> ExitCode {
    let args = DemoArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("sketchbook-demo: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &DemoArgs) -> Result<(), DemoError> {
    let config_dir = match &args.cli.config {
        Some(dir) => dir.clone(),
        None => default_config_dir().ok_or(DemoError::NoConfigDir)?,
    };
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(&args.cli);
    config.validate()?;

    let log_dir = config
        .debug
        .log_dir
        .clone()
        .unwrap_or_else(|| config_dir.join("logs"));
    sketchbook_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    info!(dir = %config_dir.display(), frames = args.frames, follow = args.follow, "starting");

    let mut bindings = CameraBindings::default();
    bindings.apply_overrides(&config.input.keybindings)?;
    let conflicts = bindings.conflicts();
    if !conflicts.is_empty() {
        warn!(count = conflicts.len(), "keys shared between camera actions");
    }

    simulate(&config, &bindings, args.frames, args.follow)
}

fn simulate(
    config: &Config,
    bindings: &CameraBindings,
    frames: u32,
    follow: bool,
) -> Result<(), DemoError> {
    let mut view = CameraView::default();
    let mut orbit = OrbitCamera::from_config(&config.camera);
    orbit.update(Duration::ZERO, &mut view, None);

    let mut shadows = CascadedShadows::new(CsmSettings::from(&config.shadows), &view)?;
    let material = shadows.attach_material();
    let parent_world = Mat4::IDENTITY;

    let mut keyboard = KeyboardState::new();
    let mut pointer = PointerState::new();
    pointer.set_captured(true);
    let mut driver = CircuitDriver::new(20.0, 0.5);
    let dt = FRAME.as_secs_f32();

    for frame in 0..frames {
        let input = input_for_frame(frame);
        for key in input.keys {
            keyboard.process_raw(key);
        }
        pointer.on_raw_motion(f64::from(input.motion.x), f64::from(input.motion.y));
        if input.wheel != 0.0 {
            pointer.on_wheel(MouseScrollDelta::LineDelta(0.0, input.wheel));
        }

        if pointer.moved() {
            let delta = pointer.orbit_delta(config.input.invert_y);
            orbit.move_by(delta.x, delta.y);
        }
        orbit.zoom(pointer.wheel());

        let subject = follow.then(|| {
            driver.advance(dt);
            driver.snapshot()
        });
        match &subject {
            Some(s) => orbit.target = s.position(),
            None => {
                let actions = bindings.resolve(&keyboard);
                orbit.update_free_fly(&actions, dt, config.camera.free_cam_speed, &view);
            }
        }
        let mode = orbit.update(
            FRAME,
            &mut view,
            subject.as_ref().map(|s| s as &dyn FollowedSubject),
        );

        if frame == frames / 2 {
            shadows.set_fade(!config.shadows.fade);
        }
        shadows.update_frustums(&view)?;
        shadows.update(&view, &parent_world);

        for handle in shadows.materials().pending() {
            debug!(?handle, variant = ?shadows.active_variant().map(|v| &v.label), "rebuilding shader");
            shadows.acknowledge_material(handle);
        }

        if frame % REPORT_EVERY == 0 {
            report(frame, &orbit, mode, &view, &shadows);
        }
        keyboard.end_frame();
        pointer.end_frame();
    }

    summarize(&shadows, material, config.debug.show_cascades);
    shadows.dispose();
    Ok(())
}

fn report(
    frame: u32,
    orbit: &OrbitCamera,
    mode: OrbitMode,
    view: &CameraView,
    shadows: &CascadedShadows,
) {
    info!(
        frame,
        ?mode,
        theta = orbit.theta(),
        phi = orbit.phi(),
        radius = orbit.radius(),
        position = ?view.position,
        "camera"
    );
    for (i, light) in shadows.lights().iter().enumerate() {
        debug!(
            cascade = i,
            position = ?light.position,
            width = light.shadow_camera.width(),
            bias = light.bias,
            "cascade light"
        );
    }
}

fn summarize(shadows: &CascadedShadows, material: MaterialHandle, show_cascades: bool) {
    info!(breaks = ?shadows.breaks(), "final cascade breaks");
    match shadows.material(material) {
        Some(state) => {
            let block = state.to_block();
            info!(
                bytes = std::mem::size_of_val(&block),
                cascades = block.cascade_count,
                near = block.camera_near,
                far = block.shadow_far,
                "uniform block"
            );
        }
        None => warn!("demo material was detached early"),
    }
    let lights = shadows.light_uniforms();
    info!(
        lights = lights.len(),
        bytes = std::mem::size_of_val(lights.as_slice()),
        "light uniforms"
    );
    if show_cascades {
        let geometry = shadows.debug_geometry();
        info!(
            edges = geometry.frustum_edges.len(),
            planes = geometry.cascade_planes.len(),
            bounds = geometry.shadow_bounds.len(),
            "debug geometry"
        );
    }
}
