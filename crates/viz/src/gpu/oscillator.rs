//! GPU-resident Kuramoto state and integration passes.
//!
//! Buffers (all `f32` per oscillator unless noted):
//! - params: [`KernelParams`] uniform, rewritten before every pass
//! - natural_freq: uploaded once, read-only afterwards
//! - velocity: written by the velocity pass, read by the phase pass
//! - phase[0], phase[1]: ping-pong pair; `current` names the snapshot
//!
//! Two bind groups are prebuilt, one per read slot, so a swap is just a flip
//! of `current` after the phase pass has been submitted.

use std::sync::Arc;

use sim::{ComputeSurface, NaturalFrequencyTable, PassInputs, SimError, MAX_POINTS};

use super::params::KernelParams;
use super::readback::PhaseReadback;
use super::is_device_lost;

const WORKGROUP_SIZE: u32 = 64;

pub struct GpuSurface {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    point_num: u32,

    params_buffer: wgpu::Buffer,
    frequency_buffer: wgpu::Buffer,
    velocity_buffer: wgpu::Buffer,
    phase_buffers: [wgpu::Buffer; 2],

    // bind_groups[i] reads phase_buffers[i] and writes the other slot
    bind_groups: [wgpu::BindGroup; 2],
    initialize_pipeline: wgpu::ComputePipeline,
    velocity_pipeline: wgpu::ComputePipeline,
    phase_pipeline: wgpu::ComputePipeline,

    readback: PhaseReadback,
    current: usize,
}

impl GpuSurface {
    /// Allocate every buffer for `point_num` oscillators and build the passes.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        point_num: u32,
    ) -> sim::Result<Self> {
        if point_num == 0 || point_num > MAX_POINTS {
            return Err(SimError::Configuration(format!(
                "gpu surface population must be in 1..={MAX_POINTS}, got {point_num}"
            )));
        }

        let lane_bytes = point_num as u64 * std::mem::size_of::<f32>() as u64;
        let limit = device.limits().max_storage_buffer_binding_size as u64;
        if lane_bytes > limit {
            return Err(SimError::ResourceExhausted {
                what: "storage buffer binding",
                requested: point_num as usize,
            });
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let storage = |label: &str, extra: wgpu::BufferUsages| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: lane_bytes,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | extra,
                mapped_at_creation: false,
            })
        };

        let frequency_buffer = storage("Kuramoto Natural Frequencies", wgpu::BufferUsages::empty());
        let velocity_buffer = storage("Kuramoto Velocities", wgpu::BufferUsages::COPY_SRC);
        let phase_buffers = [
            storage("Kuramoto Phases A", wgpu::BufferUsages::COPY_SRC),
            storage("Kuramoto Phases B", wgpu::BufferUsages::COPY_SRC),
        ];

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Kuramoto Params"),
            size: std::mem::size_of::<KernelParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let readback = PhaseReadback::new(&device, point_num as usize);

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            log::error!("Kuramoto buffer allocation failed: {error}");
            return Err(SimError::ResourceExhausted {
                what: "oscillator buffers",
                requested: point_num as usize,
            });
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Kuramoto Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/kuramoto.wgsl").into()),
        });

        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Kuramoto Bind Group Layout"),
            entries: &[
                // 0: params (uniform)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 1: natural_freq (read)
                storage_entry(1, true),
                // 2: phase_in (read)
                storage_entry(2, true),
                // 3: phase_out (read_write)
                storage_entry(3, false),
                // 4: velocity (read_write)
                storage_entry(4, false),
            ],
        });

        let bind_group_for = |read: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(if read == 0 {
                    "Kuramoto Bind Group (read A)"
                } else {
                    "Kuramoto Bind Group (read B)"
                }),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: frequency_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: phase_buffers[read].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: phase_buffers[1 - read].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: velocity_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [bind_group_for(0), bind_group_for(1)];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Kuramoto Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = |label: &str, entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let initialize_pipeline = pipeline("Kuramoto Initialize Pipeline", "initialize");
        let velocity_pipeline = pipeline("Kuramoto Velocity Pipeline", "update_velocity");
        let phase_pipeline = pipeline("Kuramoto Phase Pipeline", "update_phase");

        log::info!(
            "GPU surface: {} oscillators, {} workgroups per pass",
            point_num,
            point_num.div_ceil(WORKGROUP_SIZE)
        );

        Ok(Self {
            device,
            queue,
            point_num,
            params_buffer,
            frequency_buffer,
            velocity_buffer,
            phase_buffers,
            bind_groups,
            initialize_pipeline,
            velocity_pipeline,
            phase_pipeline,
            readback,
            current: 0,
        })
    }

    /// Which of the two phase buffers holds the current snapshot.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn phase_buffers(&self) -> &[wgpu::Buffer; 2] {
        &self.phase_buffers
    }

    pub fn frequency_buffer(&self) -> &wgpu::Buffer {
        &self.frequency_buffer
    }

    /// Blocking copy of the velocity buffer, for diagnostics and tests.
    pub fn read_velocities(&self) -> sim::Result<Vec<f32>> {
        let bytes = self.point_num as u64 * std::mem::size_of::<f32>() as u64;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Kuramoto Velocity Staging"),
            size: bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Kuramoto Velocity Copy Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.velocity_buffer, 0, &staging, 0, bytes);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        super::await_buffer_map(rx)?;

        let values: Vec<f32> = bytemuck::cast_slice(&slice.get_mapped_range()).to_vec();
        staging.unmap();
        Ok(values)
    }

    fn check_ready(&self, what: &'static str, inputs: &PassInputs) -> sim::Result<()> {
        if is_device_lost() {
            return Err(SimError::Device(format!("GPU device lost before {what}")));
        }
        if inputs.point_num != self.point_num {
            return Err(SimError::DimensionMismatch {
                what,
                expected: self.point_num as usize,
                actual: inputs.point_num as usize,
            });
        }
        Ok(())
    }

    fn dispatch(&self, label: &str, pipeline: &wgpu::ComputePipeline, params: &KernelParams) {
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.current], &[]);
            pass.dispatch_workgroups(self.point_num.div_ceil(WORKGROUP_SIZE), 1, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl ComputeSurface for GpuSurface {
    fn point_num(&self) -> u32 {
        self.point_num
    }

    fn upload_frequencies(&mut self, table: &NaturalFrequencyTable) -> sim::Result<()> {
        if table.len() != self.point_num as usize {
            return Err(SimError::DimensionMismatch {
                what: "frequency upload",
                expected: self.point_num as usize,
                actual: table.len(),
            });
        }
        self.queue.write_buffer(
            &self.frequency_buffer,
            0,
            bytemuck::cast_slice(table.values()),
        );
        Ok(())
    }

    fn initialize(&mut self, phases: &[f32]) -> sim::Result<()> {
        if phases.len() != self.point_num as usize {
            return Err(SimError::DimensionMismatch {
                what: "phase initialize",
                expected: self.point_num as usize,
                actual: phases.len(),
            });
        }
        self.queue.write_buffer(
            &self.phase_buffers[self.current],
            0,
            bytemuck::cast_slice(phases),
        );
        self.dispatch(
            "Kuramoto Initialize",
            &self.initialize_pipeline,
            &KernelParams::for_population(self.point_num),
        );
        Ok(())
    }

    fn update_velocity(&mut self, inputs: &PassInputs) -> sim::Result<()> {
        self.check_ready("velocity pass", inputs)?;
        self.dispatch(
            "Kuramoto Update Velocity",
            &self.velocity_pipeline,
            &KernelParams::from_inputs(inputs),
        );
        Ok(())
    }

    fn update_phase(&mut self, inputs: &PassInputs) -> sim::Result<()> {
        self.check_ready("phase pass", inputs)?;
        self.dispatch(
            "Kuramoto Update Phase",
            &self.phase_pipeline,
            &KernelParams::from_inputs(inputs),
        );
        self.current = 1 - self.current;
        Ok(())
    }

    fn request_readback(&mut self) -> sim::Result<()> {
        if is_device_lost() {
            return Err(SimError::Device("GPU device lost before readback".into()));
        }
        self.readback.schedule(
            &self.device,
            &self.queue,
            &self.phase_buffers[self.current],
            self.point_num as usize,
        );
        Ok(())
    }

    fn complete_readback(&mut self, out: &mut Vec<f32>) -> sim::Result<()> {
        if !self.readback.is_pending() {
            self.request_readback()?;
        }
        self.readback.wait(&self.device, out)?;
        Ok(())
    }

    fn has_pending_readback(&self) -> bool {
        self.readback.is_pending()
    }
}
