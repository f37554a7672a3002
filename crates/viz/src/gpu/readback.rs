//! Staged readback of the phase buffer for the order parameter estimator.
//!
//! `schedule` records a copy into a MAP_READ staging buffer and starts the map
//! without blocking. `wait` is the one blocking call per tick: it polls the
//! device until the map resolves and copies the phases out.

use std::sync::mpsc;

use super::{await_buffer_map, GpuError};

pub(crate) struct PhaseReadback {
    buffer: wgpu::Buffer,
    rx: Option<mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>>,
    capacity: usize,
    count: usize,
}

impl PhaseReadback {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        Self {
            buffer: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Kuramoto Phase Readback Staging"),
                size: (capacity * std::mem::size_of::<f32>()) as u64,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            rx: None,
            capacity,
            count: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }

    /// Copy `count` phases out of `src` and start mapping.
    ///
    /// Returns false if a readback is already in flight.
    pub fn schedule(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        src: &wgpu::Buffer,
        count: usize,
    ) -> bool {
        if self.is_pending() {
            return false;
        }

        let count = count.min(self.capacity);
        let byte_size = (count * std::mem::size_of::<f32>()) as u64;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Kuramoto Readback Copy Encoder"),
        });
        encoder.copy_buffer_to_buffer(src, 0, &self.buffer, 0, byte_size);
        queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = mpsc::channel();
        self.buffer
            .slice(..byte_size)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        self.rx = Some(rx);
        self.count = count;
        true
    }

    /// Block until the scheduled copy is mapped, then replace `out` with it.
    ///
    /// Leaves `out` empty when nothing was scheduled.
    pub fn wait(&mut self, device: &wgpu::Device, out: &mut Vec<f32>) -> Result<(), GpuError> {
        out.clear();
        let Some(rx) = self.rx.take() else {
            return Ok(());
        };

        device.poll(wgpu::Maintain::Wait);
        await_buffer_map(rx)?;

        let byte_size = (self.count * std::mem::size_of::<f32>()) as u64;
        {
            let data = self.buffer.slice(..byte_size).get_mapped_range();
            out.extend_from_slice(bytemuck::cast_slice(&data));
        }
        self.buffer.unmap();
        self.count = 0;
        Ok(())
    }
}
