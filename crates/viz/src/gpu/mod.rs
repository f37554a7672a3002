pub mod oscillator;
pub mod params;
pub mod readback;
pub mod renderer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use oscillator::GpuSurface;
pub use renderer::MeshRenderer;

/// Global flag indicating GPU device was lost
static GPU_DEVICE_LOST: AtomicBool = AtomicBool::new(false);

/// Check if the GPU device has been lost
pub fn is_device_lost() -> bool {
    GPU_DEVICE_LOST.load(Ordering::SeqCst)
}

/// Reset the device lost flag (call after recreating device)
pub fn reset_device_lost() {
    GPU_DEVICE_LOST.store(false, Ordering::SeqCst);
}

/// GPU error type for device setup and buffer operations
#[derive(Debug)]
pub enum GpuError {
    NoAdapter,
    RequestDevice(wgpu::RequestDeviceError),
    CreateSurface(wgpu::CreateSurfaceError),
    DeviceLost,
    BufferMapFailed(wgpu::BufferAsyncError),
    ChannelDisconnected,
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter"),
            GpuError::RequestDevice(e) => write!(f, "Device request failed: {}", e),
            GpuError::CreateSurface(e) => write!(f, "Surface creation failed: {}", e),
            GpuError::DeviceLost => write!(f, "GPU device lost"),
            GpuError::BufferMapFailed(e) => write!(f, "Buffer map failed: {:?}", e),
            GpuError::ChannelDisconnected => write!(f, "Channel disconnected"),
        }
    }
}

impl std::error::Error for GpuError {}

impl From<GpuError> for sim::SimError {
    fn from(err: GpuError) -> Self {
        sim::SimError::Device(err.to_string())
    }
}

/// Wait for a buffer map operation to complete, returning Result instead of panicking.
pub fn await_buffer_map(
    rx: std::sync::mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
) -> Result<(), GpuError> {
    if is_device_lost() {
        return Err(GpuError::DeviceLost);
    }
    match rx.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            log::error!("Buffer map failed: {:?}", e);
            Err(GpuError::BufferMapFailed(e))
        }
        Err(_) => {
            log::error!("Buffer map channel disconnected - possible device lost");
            GPU_DEVICE_LOST.store(true, Ordering::SeqCst);
            Err(GpuError::ChannelDisconnected)
        }
    }
}

/// Limits needed by the oscillator passes and the surface shader.
pub fn required_limits(adapter: &wgpu::Adapter) -> wgpu::Limits {
    wgpu::Limits {
        max_storage_buffers_per_shader_stage: 4,
        ..wgpu::Limits::downlevel_defaults()
    }
    .using_resolution(adapter.limits())
}

/// Route uncaptured errors to the log and flag out-of-memory as device loss.
pub fn install_error_handler(device: &wgpu::Device) {
    device.on_uncaptured_error(Box::new(|error| {
        log::error!("GPU uncaptured error: {:?}", error);
        if matches!(error, wgpu::Error::OutOfMemory { .. }) {
            GPU_DEVICE_LOST.store(true, Ordering::SeqCst);
        }
    }));
    reset_device_lost();
}

/// Device without a window, for compute-only runs and tests.
pub fn request_headless_device() -> Result<(Arc<wgpu::Device>, Arc<wgpu::Queue>), GpuError> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("Using GPU: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Kuramoto Headless Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: required_limits(&adapter),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(GpuError::RequestDevice)?;

        install_error_handler(&device);
        Ok((Arc::new(device), Arc::new(queue)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_error_maps_to_fatal_device_error() {
        let err: sim::SimError = GpuError::ChannelDisconnected.into();
        assert!(matches!(err, sim::SimError::Device(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_disconnected_map_channel_flags_device_lost() {
        let (tx, rx) = std::sync::mpsc::channel();
        drop(tx);
        let result = await_buffer_map(rx);
        assert!(matches!(result, Err(GpuError::ChannelDisconnected)));
        assert!(is_device_lost());
        reset_device_lost();
        assert!(!is_device_lost());
    }
}
