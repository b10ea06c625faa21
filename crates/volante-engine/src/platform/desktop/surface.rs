use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::render::{Color, Viewport};

use super::gpu::{GpuDevice, GpuInit};

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM).
    Fatal,
}

/// Frame acquired between the first graphics call and the buffer swap.
struct PendingFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// Multisampled color target resolved into the surface texture.
struct MsaaTarget {
    view: wgpu::TextureView,
    size: PhysicalSize<u32>,
}

/// Swapchain of one native window.
///
/// The surface holds an `Arc` of the window, so it is `'static` and may be
/// stored next to the window it presents to.
pub(crate) struct WindowSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    samples: u32,
    msaa: Option<MsaaTarget>,
    viewport: Viewport,
    frame: Option<PendingFrame>,
}

impl WindowSurface {
    pub(crate) fn create(
        instance: &wgpu::Instance,
        window: Arc<Window>,
    ) -> Result<wgpu::Surface<'static>> {
        instance
            .create_surface(window)
            .context("failed to create wgpu surface")
    }

    /// Configures `surface` for `window`'s current size.
    ///
    /// `samples` falls back to 1 when the adapter cannot multisample the
    /// chosen format.
    pub(crate) fn configure(
        surface: wgpu::Surface<'static>,
        gpu: &GpuDevice,
        init: &GpuInit,
        size: PhysicalSize<u32>,
        vsync: bool,
        samples: u32,
    ) -> Result<Self> {
        let caps = surface.get_capabilities(&gpu.adapter);
        let format =
            choose_surface_format(&caps, init.prefer_srgb).context("no supported surface formats")?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);

        let samples = if gpu.supports_samples(format, samples) {
            samples
        } else {
            log::warn!("gpu: {samples}x multisampling unsupported for {format:?}; using 1x");
            1
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        if size.width > 0 && size.height > 0 {
            surface.configure(&gpu.device, &config);
        }

        Ok(Self {
            surface,
            config,
            size,
            samples,
            msaa: None,
            viewport: Viewport::full(size.width, size.height),
            frame: None,
        })
    }

    pub(crate) fn samples(&self) -> u32 {
        self.samples
    }

    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub(crate) fn set_vsync(&mut self, gpu: &GpuDevice, enabled: bool) {
        let mode = present_mode(enabled);
        if self.config.present_mode == mode {
            return;
        }
        self.config.present_mode = mode;
        self.reconfigure(gpu);
    }

    /// Reconfigures the surface after a resize.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that
    /// case only the recorded size changes and configuration is deferred.
    pub(crate) fn resize(&mut self, gpu: &GpuDevice, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.reconfigure(gpu);
    }

    /// Records a full-target clear into the current frame.
    pub(crate) fn clear(&mut self, gpu: &GpuDevice, color: Color) {
        if !self.ensure_frame(gpu) {
            return;
        }
        let msaa = self.msaa_view(gpu);
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let (view, resolve_target) = match msaa.as_ref() {
            Some(msaa_view) => (msaa_view, Some(&frame.view)),
            None => (&frame.view, None),
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("volante clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(color.r),
                        g: f64::from(color.g),
                        b: f64::from(color.b),
                        a: f64::from(color.a),
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        // Out-of-target viewports are a validation error in wgpu.
        let (x, y, w, h) = clamp_viewport(self.viewport, self.size);
        if w > 0.0 && h > 0.0 {
            rpass.set_viewport(x, y, w, h, 0.0, 1.0);
        }
    }

    /// Submits the recorded commands and presents. A swap without any prior
    /// graphics call presents an untouched frame.
    pub(crate) fn present(&mut self, gpu: &GpuDevice) {
        if !self.ensure_frame(gpu) {
            return;
        }
        let Some(frame) = self.frame.take() else {
            return;
        };
        gpu.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        frame.surface_texture.present();
    }

    /// Acquires the next surface texture unless a frame is already pending.
    /// Returns false when the frame has to be skipped.
    fn ensure_frame(&mut self, gpu: &GpuDevice) -> bool {
        if self.frame.is_some() {
            return true;
        }
        if self.size.width == 0 || self.size.height == 0 {
            return false;
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                let msg = format!("{err:?}");
                match self.handle_surface_error(gpu, err) {
                    SurfaceErrorAction::Fatal => log::error!("gpu: surface error {msg}"),
                    action => log::debug!("gpu: surface error {msg}, {action:?}"),
                }
                return false;
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("volante frame encoder"),
            });

        self.frame = Some(PendingFrame {
            surface_texture,
            view,
            encoder,
        });
        true
    }

    /// Multisampled target matching the current size, recreated on demand.
    fn msaa_view(&mut self, gpu: &GpuDevice) -> Option<wgpu::TextureView> {
        if self.samples <= 1 {
            return None;
        }
        let stale = self.msaa.as_ref().is_none_or(|m| m.size != self.size);
        if stale {
            let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("volante msaa target"),
                size: wgpu::Extent3d {
                    width: self.config.width,
                    height: self.config.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: self.samples,
                dimension: wgpu::TextureDimension::D2,
                format: self.config.format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            self.msaa = Some(MsaaTarget {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                size: self.size,
            });
        }
        self.msaa.as_ref().map(|m| m.view.clone())
    }

    fn reconfigure(&mut self, gpu: &GpuDevice) {
        // A pending texture belongs to the old configuration.
        self.frame = None;
        if self.size.width > 0 && self.size.height > 0 {
            self.surface.configure(&gpu.device, &self.config);
        }
    }

    fn handle_surface_error(&mut self, gpu: &GpuDevice, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                self.reconfigure(gpu);
                SurfaceErrorAction::Reconfigured
            }
            wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

/// Intersects `viewport` with the drawable area, as wgpu's `f32` rectangle.
fn clamp_viewport(viewport: Viewport, size: PhysicalSize<u32>) -> (f32, f32, f32, f32) {
    let x0 = viewport.x.clamp(0, size.width as i32);
    let y0 = viewport.y.clamp(0, size.height as i32);
    let x1 = (i64::from(viewport.x) + i64::from(viewport.width)).clamp(0, i64::from(size.width)) as i32;
    let y1 = (i64::from(viewport.y) + i64::from(viewport.height)).clamp(0, i64::from(size.height)) as i32;
    (
        x0 as f32,
        y0 as f32,
        (x1 - x0).max(0) as f32,
        (y1 - y0).max(0) as f32,
    )
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::Fifo
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| caps.formats.contains(f)) {
            return Some(f);
        }
    }
    caps.formats.first().copied()
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
