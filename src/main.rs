// main.rs — winit shell: window, input routing, menus and status bar

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use glam::Vec2;
use image::io::Reader as ImageReader;
use log::{error, info, warn};
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};

use pano360::config::ViewerConfig;
use pano360::controller::GesturePhase;
use pano360::i18n;
use pano360::renderer::Renderer;
use pano360::viewer::Viewer;

/// Values the egui closure reads and edits. The closure cannot borrow the
/// viewer (the renderer it draws through lives inside it), so the menus work
/// on this mirror and the frame loop applies the changes afterwards.
struct UiState {
    // mirrored settings
    inertia: f32,
    sensitivity: f32,
    gesture_enabled: bool,
    motion_enabled: bool,
    lang: String,
    show_fps: bool,
    // per-frame status
    fps: f32,
    is_fullscreen: bool,
    loading_name: Option<String>,
    yaw_deg: f32,
    pitch_deg: f32,
    fov_deg: f32,
    // one-shot requests out of the menus
    next_image: Option<PathBuf>,
    reset_view: bool,
    toggle_fullscreen: bool,
    lang_changed: bool,
    exit: bool,
}

fn main() {
    env_logger::init();

    let config_path = ViewerConfig::default_path();
    let mut config = ViewerConfig::load(&config_path);
    i18n::init(i18n::resolve_lang(&config.lang));

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&i18n::tr("app.title"))
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)
            .unwrap(),
    );

    let renderer = pollster::block_on(Renderer::new(window.clone()));
    let mut viewer = Viewer::new(renderer, config.fov_limits());
    viewer.set_inertia(config.inertia);
    viewer.set_gesture_control_enabled(config.gesture_control);
    viewer.set_motion_control_enabled(config.motion_control);
    {
        let size = window.inner_size();
        let gesture = viewer.gesture_mut();
        gesture.set_sensitivity(config.sensitivity);
        gesture.set_viewport(size.width as f32, size.height as f32);
    }
    // The window is on screen as soon as the loop starts.
    viewer.view_appeared();

    let mut ui = UiState {
        inertia: viewer.inertia(),
        sensitivity: config.sensitivity,
        gesture_enabled: viewer.gesture_control_enabled(),
        motion_enabled: viewer.motion_control_enabled(),
        lang: i18n::current_lang(),
        show_fps: false,
        fps: 0.0,
        is_fullscreen: false,
        loading_name: None,
        yaw_deg: 0.0,
        pitch_deg: 0.0,
        fov_deg: 0.0,
        next_image: None,
        reset_view: false,
        toggle_fullscreen: false,
        lang_changed: false,
        exit: false,
    };

    // drag state
    let mut mouse_pressed = false;
    let mut last_mouse_pos: Option<PhysicalPosition<f64>> = None;

    // frame timing
    let mut last_tick = Instant::now();
    let mut fps_window_start = Instant::now();
    let mut frame_count = 0u32;

    // decoded panoramas arrive from a background thread
    let (tx, rx): (Sender<image::RgbaImage>, Receiver<image::RgbaImage>) = channel();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Ok(rgba) = rx.try_recv() {
            viewer.surface_mut().set_image(rgba);
            ui.loading_name = None;
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let renderer = viewer.surface_mut();
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        save_config(&mut config, &viewer, &ui, &config_path);
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        viewer.surface_mut().resize(new_size);
                        viewer
                            .gesture_mut()
                            .set_viewport(new_size.width as f32, new_size.height as f32);
                    }

                    // Covered/uncovered by another window or minimized: drop
                    // the GPU textures while nobody can see the view.
                    WindowEvent::Occluded(occluded) => {
                        if occluded {
                            viewer.view_disappeared();
                        } else {
                            viewer.view_appeared();
                        }
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = pick_image_file() {
                                        ui.loading_name = file_name(&path);
                                        start_load_image(path, tx.clone());
                                    }
                                }
                                Some(VirtualKeyCode::F11) => {
                                    toggle_fullscreen(&window);
                                }
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            mouse_pressed = state == ElementState::Pressed;
                            let phase = if mouse_pressed {
                                GesturePhase::Began
                            } else {
                                GesturePhase::Ended
                            };
                            viewer
                                .gesture_mut()
                                .handle_pan(phase, Vec2::ZERO, Instant::now());
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if mouse_pressed {
                            if let Some(last_pos) = last_mouse_pos {
                                let delta = Vec2::new(
                                    (position.x - last_pos.x) as f32,
                                    (position.y - last_pos.y) as f32,
                                );
                                viewer.gesture_mut().handle_pan(
                                    GesturePhase::Changed,
                                    delta,
                                    Instant::now(),
                                );
                            }
                        }
                        last_mouse_pos = Some(position);
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        // One wheel line ≈ a 5% zoom step.
                        viewer.gesture_mut().handle_pinch(1.0 + scroll * 0.05);
                    }

                    WindowEvent::DroppedFile(path) => {
                        ui.loading_name = file_name(&path);
                        start_load_image(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let now = Instant::now();
                frame_count += 1;
                let window_secs = now.duration_since(fps_window_start).as_secs_f32();
                if window_secs >= 1.0 {
                    ui.fps = frame_count as f32 / window_secs;
                    frame_count = 0;
                    fps_window_start = now;
                }

                viewer.tick(now.duration_since(last_tick));
                last_tick = now;

                let snap = viewer.snapshot();
                ui.yaw_deg = snap.yaw.to_degrees();
                ui.pitch_deg = snap.pitch.to_degrees();
                ui.fov_deg = snap.fov.to_degrees();
                ui.is_fullscreen = window.fullscreen().is_some();

                viewer.surface_mut().update_camera();
                let render_result = viewer
                    .surface_mut()
                    .render_with_ui(&window, |ctx| draw_ui(ctx, &mut ui));

                apply_ui_changes(&mut viewer, &mut ui, &window);
                if let Some(path) = ui.next_image.take() {
                    ui.loading_name = file_name(&path);
                    start_load_image(path, tx.clone());
                }
                if ui.exit {
                    save_config(&mut config, &viewer, &ui, &config_path);
                    *control_flow = ControlFlow::Exit;
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let size = viewer.surface().size;
                        viewer.surface_mut().resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => error!("render error: {e:?}"),
                }
            }

            Event::Resumed => viewer.view_appeared(),
            Event::Suspended => viewer.view_disappeared(),

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn toggle_fullscreen(window: &winit::window::Window) {
    if window.fullscreen().is_some() {
        window.set_fullscreen(None);
    } else {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    }
}

fn pick_image_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(
            &i18n::tr("file.filter.images"),
            &["jpg", "jpeg", "png", "bmp"],
        )
        .pick_file()
}

fn file_name(path: &std::path::Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Decode on a background thread so a multi-hundred-megapixel panorama never
/// stalls the event loop; the RGBA result comes back over the channel.
fn start_load_image(path: PathBuf, tx: Sender<image::RgbaImage>) {
    thread::spawn(move || {
        info!("loading image {}", path.display());
        let decoded = ImageReader::open(&path)
            .map_err(image::ImageError::IoError)
            .and_then(|r| r.with_guessed_format().map_err(image::ImageError::IoError))
            .and_then(|mut r| {
                // panoramas routinely exceed the default decode limits
                r.no_limits();
                r.decode()
            });
        match decoded {
            Ok(img) => {
                let rgba = img.to_rgba8();
                info!("image decoded: {}x{}", rgba.width(), rgba.height());
                if tx.send(rgba).is_err() {
                    warn!("viewer shut down before the image finished loading");
                }
            }
            Err(e) => error!("failed to load {}: {e}", path.display()),
        }
    });
}

/// Push the menu edits back into the viewer. Mirrored values are re-applied
/// every frame; the setters are cheap and idempotent.
fn apply_ui_changes(viewer: &mut Viewer<Renderer>, ui: &mut UiState, window: &winit::window::Window) {
    viewer.set_inertia(ui.inertia);
    viewer.set_gesture_control_enabled(ui.gesture_enabled);
    viewer.set_motion_control_enabled(ui.motion_enabled);
    viewer.gesture_mut().set_sensitivity(ui.sensitivity);

    if ui.reset_view {
        ui.reset_view = false;
        viewer.reset_view();
    }
    if ui.toggle_fullscreen {
        ui.toggle_fullscreen = false;
        toggle_fullscreen(window);
    }
    if ui.lang_changed {
        ui.lang_changed = false;
        i18n::init(ui.lang.clone());
        window.set_title(&i18n::tr("app.title"));
    }
}

fn save_config(
    config: &mut ViewerConfig,
    viewer: &Viewer<Renderer>,
    ui: &UiState,
    path: &std::path::Path,
) {
    config.lang = i18n::current_lang();
    config.inertia = viewer.inertia();
    config.sensitivity = ui.sensitivity;
    config.gesture_control = viewer.gesture_control_enabled();
    config.motion_control = viewer.motion_control_enabled();
    if let Err(e) = config.save(path) {
        warn!("could not save config to {}: {e}", path.display());
    }
}

fn draw_ui(ctx: &egui::Context, state: &mut UiState) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(i18n::tr("menu.file"), |ui| {
                if ui.button(i18n::tr("menu.open_image")).clicked() {
                    ui.close_menu();
                    state.next_image = pick_image_file();
                }
                if ui.button(i18n::tr("menu.exit")).clicked() {
                    state.exit = true;
                }
            });

            ui.menu_button(i18n::tr("menu.view"), |ui| {
                if ui.button(i18n::tr("view.reset")).clicked() {
                    state.reset_view = true;
                    ui.close_menu();
                }
                let fullscreen_label = if state.is_fullscreen {
                    i18n::tr("view.fullscreen.exit")
                } else {
                    i18n::tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen_label).clicked() {
                    state.toggle_fullscreen = true;
                    ui.close_menu();
                }
                ui.separator();
                if ui.checkbox(&mut state.show_fps, i18n::tr("view.show_fps")).clicked() {
                    ui.close_menu();
                }
            });

            ui.menu_button(i18n::tr("menu.controls"), |ui| {
                ui.add(
                    egui::Slider::new(&mut state.inertia, 0.0..=1.0)
                        .text(i18n::tr("controls.inertia")),
                );
                ui.add(
                    egui::Slider::new(&mut state.sensitivity, 0.1..=5.0)
                        .text(i18n::tr("controls.sensitivity")),
                );
                ui.separator();
                ui.checkbox(&mut state.gesture_enabled, i18n::tr("controls.gesture"));
                ui.checkbox(&mut state.motion_enabled, i18n::tr("controls.motion"));
            });

            ui.menu_button(i18n::tr("menu.language"), |ui| {
                for (code, name) in [("en", "English"), ("fr", "Français")] {
                    if ui.radio_value(&mut state.lang, code.to_string(), name).clicked() {
                        state.lang_changed = true;
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if let Some(name) = &state.loading_name {
                ui.label(
                    egui::RichText::new(i18n::tr_with(
                        "status.loading_named",
                        &[("name", name.clone())],
                    ))
                    .color(egui::Color32::YELLOW),
                );
                ui.label("|");
            }
            ui.label(format!("FOV: {:.1}°", state.fov_deg));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", state.yaw_deg));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", state.pitch_deg));
            if state.show_fps {
                ui.label("|");
                ui.label(
                    egui::RichText::new(format!("FPS: {:.1}", state.fps))
                        .color(egui::Color32::GREEN),
                );
            }
        });
    });
}
