use anyhow::Context;
use image::RgbImage;
use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use crate::core::{
    big_float::BigFloat,
    file_io::{date_time_string, serialize_to_json, FilePrefix},
    image_utils::{copy_image_to_rgba_frame, draw_selection_rectangle, write_image_to_file},
    scalar::{Precision, Scalar},
    viewport::PlaneBounds,
    worker_pool::WorkerPool,
};
use crate::fractals::mandelbrot::{render, MandelbrotParams, RenderDiagnostics};

/**
 * State of an interactive zoom: the current bounds in the chosen arithmetic, the most
 * recent image, and the drag selection in progress (if any).
 *
 * Kept free of any windowing types so that the zoom behavior can be driven directly.
 */
pub struct ZoomSession<T: Scalar> {
    params: MandelbrotParams,
    bounds: PlaneBounds<T>,
    precision: T::Precision,
    worker_pool: WorkerPool,
    image: RgbImage,
    diagnostics: RenderDiagnostics,
    cursor: (u32, u32),
    drag_start: Option<(u32, u32)>,
}

impl<T: Scalar> ZoomSession<T> {
    /// Renders the initial view of `params` before returning.
    pub fn new(params: &MandelbrotParams, precision: T::Precision) -> ZoomSession<T> {
        let bounds = PlaneBounds::<T>::from_f64_bounds(&params.bounds, precision);
        let worker_pool = params.render_options.worker_pool();
        let output = render(
            &params.resolution,
            &bounds,
            &params.render_config,
            precision,
            &worker_pool,
        );
        ZoomSession {
            params: params.clone(),
            bounds,
            precision,
            worker_pool,
            image: output.image,
            diagnostics: output.diagnostics,
            cursor: (0, 0),
            drag_start: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.params.resolution[0]
    }

    pub fn height(&self) -> u32 {
        self.params.resolution[1]
    }

    pub fn bounds(&self) -> &PlaneBounds<T> {
        &self.bounds
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn diagnostics(&self) -> &RenderDiagnostics {
        &self.diagnostics
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    pub fn update_cursor(&mut self, pixel: (u32, u32)) {
        self.cursor = (
            pixel.0.min(self.width() - 1),
            pixel.1.min(self.height() - 1),
        );
    }

    pub fn begin_drag(&mut self) {
        self.drag_start = Some(self.cursor);
    }

    /**
     * Finish the selection at the current cursor. Zooms into the selected rectangle and
     * re-renders, returning `true`, unless the selection has no area.
     */
    pub fn end_drag(&mut self) -> bool {
        let start = match self.drag_start.take() {
            Some(start) => start,
            None => return false,
        };
        let zoomed = self.bounds.zoom_to_selection(
            start,
            self.cursor,
            self.width(),
            self.height(),
            self.precision,
        );
        match zoomed {
            Some(bounds) => {
                self.bounds = bounds;
                self.rerender();
                true
            }
            None => {
                info!("Ignoring zoom selection with no area");
                false
            }
        }
    }

    pub fn rerender(&mut self) {
        let output = render(
            &self.params.resolution,
            &self.bounds,
            &self.params.render_config,
            self.precision,
            &self.worker_pool,
        );
        self.image = output.image;
        self.diagnostics = output.diagnostics;
        info!("View bounds: {:?}", self.bounds.to_f64_bounds());
    }

    /// Paint the current image, with the selection rectangle on top while dragging.
    pub fn draw(&self, frame: &mut [u8]) {
        copy_image_to_rgba_frame(&self.image, frame);
        if let Some(start) = self.drag_start {
            draw_selection_rectangle(frame, self.width(), start, self.cursor);
        }
    }

    /// Parameters reproducing the current view. Bounds are rounded to `f64`.
    pub fn current_params(&self) -> MandelbrotParams {
        MandelbrotParams {
            bounds: self.bounds.to_f64_bounds(),
            ..self.params.clone()
        }
    }

    /// Write the current image and its parameters, stamped with the local date-time.
    pub fn save(&self, file_prefix: &FilePrefix) -> anyhow::Result<()> {
        file_prefix.create_directory()?;
        let stamp = format!("_{}", date_time_string());
        write_image_to_file(
            &file_prefix.with_suffix(&format!("{}.png", stamp)),
            &self.image,
        )?;
        serialize_to_json(
            &file_prefix.with_suffix(&format!("{}.json", stamp)),
            &self.current_params(),
        )?;
        Ok(())
    }
}

/**
 * Open an interactive window on the parameters, using the arithmetic they select.
 * Does not return until the window is closed.
 */
pub fn explore_mandelbrot(params: &MandelbrotParams, file_prefix: FilePrefix) -> anyhow::Result<()> {
    match params.precision {
        Precision::FixedWidth => run_window(ZoomSession::<f64>::new(params, ()), file_prefix),
        Precision::ArbitraryPrecision { bits } => {
            run_window(ZoomSession::<BigFloat>::new(params, bits), file_prefix)
        }
    }
}

fn run_window<T>(mut session: ZoomSession<T>, file_prefix: FilePrefix) -> anyhow::Result<()>
where
    T: Scalar + 'static,
    T::Precision: 'static,
{
    // winit panics when neither a Wayland compositor nor X11 is reachable.
    let event_loop = std::panic::catch_unwind(EventLoop::new).map_err(|_| {
        anyhow::anyhow!("Failed to initialize the windowing backend (is a display available?)")
    })?;
    let (width, height) = (session.width(), session.height());

    let window = {
        let size = LogicalSize::new(width as f64, height as f64);
        WindowBuilder::new()
            .with_title("Mandelbrot Zoom")
            .with_inner_size(size)
            .with_min_inner_size(size)
            .build(&event_loop)
            .context("Unable to create window")?
    };

    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(width, height, surface_texture).context("Unable to create pixel buffer")?
    };

    info!("Drag with the left mouse button to zoom. Space saves, Escape exits.");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;
        match event {
            Event::RedrawRequested(_) => {
                session.draw(pixels.frame_mut());
                if let Err(err) = pixels.render() {
                    error!("Unable to render pixels: {}", err);
                    *control_flow = ControlFlow::Exit;
                }
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => match key {
                    VirtualKeyCode::Escape => *control_flow = ControlFlow::Exit,
                    VirtualKeyCode::Space => {
                        if let Err(err) = session.save(&file_prefix) {
                            error!("Unable to save the current view: {:#}", err);
                        }
                    }
                    _ => {}
                },
                WindowEvent::CursorMoved { position, .. } => {
                    let pixel = pixels
                        .window_pos_to_pixel((position.x as f32, position.y as f32))
                        .unwrap_or_else(|pos| pixels.clamp_pixel_pos(pos));
                    session.update_cursor((pixel.0 as u32, pixel.1 as u32));
                    if session.is_dragging() {
                        window.request_redraw();
                    }
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => {
                    match state {
                        ElementState::Pressed => session.begin_drag(),
                        ElementState::Released => {
                            session.end_drag();
                        }
                    }
                    window.request_redraw();
                }
                WindowEvent::Resized(size) => {
                    if let Err(err) = pixels.resize_surface(size.width, size.height) {
                        error!("Unable to resize the pixel surface: {}", err);
                        *control_flow = ControlFlow::Exit;
                    }
                }
                _ => {}
            },
            _ => {}
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image_utils::SELECTION_COLOR;
    use crate::fractals::mandelbrot::RenderOptions;

    fn small_params() -> MandelbrotParams {
        MandelbrotParams {
            resolution: nalgebra::Vector2::new(40, 40),
            render_options: RenderOptions {
                worker_count: Some(2),
            },
            ..MandelbrotParams::default()
        }
    }

    #[test]
    fn test_drag_zooms_into_selection() {
        let params = small_params();
        let mut session = ZoomSession::<f64>::new(&params, ());
        let expected = params
            .bounds
            .zoom_to_selection((30, 20), (10, 10), 40, 40, ())
            .unwrap();

        session.update_cursor((30, 20));
        session.begin_drag();
        assert!(session.is_dragging());
        session.update_cursor((10, 10));
        assert!(session.end_drag());
        assert!(!session.is_dragging());
        assert_eq!(session.bounds(), &expected);
        assert_eq!(session.current_params().bounds, expected);
    }

    #[test]
    fn test_click_without_area_keeps_view() {
        let params = small_params();
        let mut session = ZoomSession::<f64>::new(&params, ());
        let before = session.image().clone();

        session.update_cursor((12, 12));
        session.begin_drag();
        session.update_cursor((12, 30));
        assert!(!session.end_drag());
        assert_eq!(session.bounds(), &params.bounds);
        assert_eq!(session.image(), &before);
        assert!(!session.end_drag());
    }

    #[test]
    fn test_cursor_is_clamped_to_image() {
        let mut session = ZoomSession::<f64>::new(&small_params(), ());
        session.update_cursor((500, 3));
        session.begin_drag();
        session.update_cursor((0, 0));
        assert!(session.end_drag());
        let bounds = session.bounds();
        assert!(bounds.real_max < 0.5);
        assert!(bounds.real_min == -1.5);
    }

    #[test]
    fn test_draw_overlays_selection_while_dragging() {
        let mut session = ZoomSession::<f64>::new(&small_params(), ());
        let mut frame = vec![0u8; 4 * 40 * 40];

        let corner = 4 * (5 * 40 + 5);
        session.update_cursor((5, 5));
        session.begin_drag();
        session.update_cursor((20, 20));
        session.draw(&mut frame);
        assert_eq!(
            &frame[corner..corner + 3],
            &[SELECTION_COLOR[0], SELECTION_COLOR[1], SELECTION_COLOR[2]]
        );
        let center = 4 * (12 * 40 + 12);
        let pixel = session.image().get_pixel(12, 12);
        assert_eq!(&frame[center..center + 3], &pixel.0);

        session.end_drag();
        session.draw(&mut frame);
        let corner_pixel = session.image().get_pixel(5, 5);
        assert_eq!(&frame[corner..corner + 3], &corner_pixel.0);
    }

    #[test]
    fn test_arbitrary_precision_session_zooms() {
        let params = MandelbrotParams {
            resolution: nalgebra::Vector2::new(16, 16),
            ..small_params()
        };
        let mut session = ZoomSession::<BigFloat>::new(&params, 96);
        session.update_cursor((0, 0));
        session.begin_drag();
        session.update_cursor((8, 8));
        assert!(session.end_drag());
        let bounds = session.bounds().to_f64_bounds();
        assert_eq!(bounds.real_min, -1.5);
        assert_eq!(bounds.real_max, -0.5);
        assert_eq!(bounds.imag_min, -1.0);
        assert_eq!(bounds.imag_max, 0.0);
        assert_eq!(session.image().dimensions(), (16, 16));
    }

    #[test]
    fn test_save_writes_image_and_params() {
        let directory = tempfile::tempdir().unwrap();
        let file_prefix = FilePrefix {
            directory_path: directory.path().to_path_buf(),
            file_base: "session".to_owned(),
        };
        let session = ZoomSession::<f64>::new(&small_params(), ());
        session.save(&file_prefix).unwrap();

        let names: Vec<String> = std::fs::read_dir(directory.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|name| name.ends_with(".png")));
        assert!(names.iter().any(|name| name.ends_with(".json")));
    }
}
