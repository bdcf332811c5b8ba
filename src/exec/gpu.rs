//! wgpu compute backend running the whole tick on the GPU.
//!
//! Kernels: evolve → log2(N) row stages → log2(N) column stages → assemble.
//! Every kernel is a separate dispatch with its own bind group; wgpu orders
//! storage accesses between dispatches, which provides the stage barrier.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::error::OceanError;
use crate::ocean::{ButterflyPlan, SpectralAmplitude, SurfaceMaps, SurfaceParams};

const WORKGROUP_SIZE: u32 = 8;

/// Simulation uniforms (matches `SimParams` in the WGSL kernels)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SimUniforms {
    n: u32,
    passes: u32,
    time: f32,
    choppy_scale: f32,
    texel_size: f32,
    fold_threshold: f32,
    _padding: [f32; 2],
}

/// Per-stage uniforms for the butterfly kernels
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct StageUniforms {
    stage: u32,
    _padding: [u32; 3],
}

/// Height, displacement and slope buffers of one ping-pong side
struct FieldBuffers {
    height: wgpu::Buffer,
    displacement: wgpu::Buffer,
    slope: wgpu::Buffer,
}

impl FieldBuffers {
    fn new(device: &wgpu::Device, cells: u64, label: &str) -> Self {
        let create = |name: &str, texel_bytes: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{} {}", label, name)),
                size: cells * texel_bytes,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        Self {
            height: create("Height", 8),
            displacement: create("Displacement", 16),
            slope: create("Slope", 16),
        }
    }
}

/// GPU pipeline owning device copies of the spectrum, plan, fields and maps
pub struct GpuPipeline {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    n: u32,
    passes: u32,
    params: SurfaceParams,
    params_buffer: wgpu::Buffer,
    evolve_pipeline: wgpu::ComputePipeline,
    rows_pipeline: wgpu::ComputePipeline,
    columns_pipeline: wgpu::ComputePipeline,
    assemble_pipeline: wgpu::ComputePipeline,
    evolve_bind_group: wgpu::BindGroup,
    /// One per global stage (rows then columns), alternating ping-pong direction
    fft_bind_groups: Vec<wgpu::BindGroup>,
    assemble_bind_group: wgpu::BindGroup,
    displacement_map: wgpu::Buffer,
    normal_map: wgpu::Buffer,
    fold_map: wgpu::Buffer,
    /// Evolved height spectrum, read back to reject non-finite ticks
    evolved_height: wgpu::Buffer,
    /// Maps followed by the evolved height: 16 + 16 + 4 + 8 bytes per cell
    readback: wgpu::Buffer,
}

impl GpuPipeline {
    /// Create device, upload the spectrum and plan, build all kernels
    pub fn new(
        spectrum: &SpectralAmplitude,
        plan: &ButterflyPlan,
        params: &SurfaceParams,
    ) -> Result<Self, OceanError> {
        pollster::block_on(Self::new_async(spectrum, plan, params))
    }

    async fn new_async(
        spectrum: &SpectralAmplitude,
        plan: &ButterflyPlan,
        params: &SurfaceParams,
    ) -> Result<Self, OceanError> {
        let n = spectrum.resolution();
        if plan.size() != n {
            return Err(crate::error::ConfigError::PlanSizeMismatch {
                plan: plan.size(),
                cells: n * n,
            }
            .into());
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| OceanError::Gpu("no suitable GPU adapter".to_string()))?;
        let adapter_name = adapter.get_info().name;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Ocean Compute Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| OceanError::Gpu(format!("failed to request device: {}", e)))?;

        let cells = (n * n) as u64;

        // Immutable inputs
        let spectrum_texels: Vec<[f32; 4]> = spectrum
            .cells()
            .iter()
            .map(|c| [c.h0.re, c.h0.im, c.h0_conj.re, c.h0_conj.im])
            .collect();
        let spectrum_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Spectrum Buffer"),
            contents: bytemuck::cast_slice(&spectrum_texels),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let butterfly_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Butterfly Buffer"),
            contents: bytemuck::cast_slice(plan.entries()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let uniforms = SimUniforms {
            n: n as u32,
            passes: plan.passes(),
            time: 0.0,
            choppy_scale: params.choppy_scale,
            texel_size: params.texel_size_m,
            fold_threshold: params.fold_threshold,
            _padding: [0.0; 2],
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Params Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let stage_buffers: Vec<wgpu::Buffer> = (0..plan.passes())
            .map(|stage| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Stage {} Params Buffer", stage)),
                    contents: bytemuck::cast_slice(&[StageUniforms {
                        stage,
                        _padding: [0; 3],
                    }]),
                    usage: wgpu::BufferUsages::UNIFORM,
                })
            })
            .collect();

        // Transient buffers: ping (evolve output, final IFFT output) and pong
        let ping = FieldBuffers::new(&device, cells, "Ping");
        let pong = FieldBuffers::new(&device, cells, "Pong");

        let map_buffer = |label: &str, texel_bytes: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: cells * texel_bytes,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        let displacement_map = map_buffer("Displacement Map", 16);
        let normal_map = map_buffer("Normal Map", 16);
        let fold_map = map_buffer("Fold Map", 4);

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Map Readback Buffer"),
            size: cells * (16 + 16 + 4 + 8),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Kernels
        let evolve_layout = create_layout(
            &device,
            "Evolve",
            &[
                Slot::Uniform,
                Slot::Read,
                Slot::Write,
                Slot::Write,
                Slot::Write,
            ],
        );
        let fft_layout = create_layout(
            &device,
            "FFT",
            &[
                Slot::Uniform,
                Slot::Uniform,
                Slot::Read,
                Slot::Read,
                Slot::Read,
                Slot::Read,
                Slot::Write,
                Slot::Write,
                Slot::Write,
            ],
        );
        let assemble_layout = create_layout(
            &device,
            "Assemble",
            &[
                Slot::Uniform,
                Slot::Read,
                Slot::Read,
                Slot::Read,
                Slot::Write,
                Slot::Write,
                Slot::Write,
            ],
        );

        let evolve_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Evolve Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/evolve.wgsl").into()),
        });
        let fft_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("FFT Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/fft.wgsl").into()),
        });
        let assemble_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Assemble Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/assemble.wgsl").into()),
        });

        let evolve_pipeline = create_pipeline(&device, &evolve_layout, &evolve_shader, "evolve");
        let rows_pipeline = create_pipeline(&device, &fft_layout, &fft_shader, "fft_rows");
        let columns_pipeline = create_pipeline(&device, &fft_layout, &fft_shader, "fft_columns");
        let assemble_pipeline =
            create_pipeline(&device, &assemble_layout, &assemble_shader, "assemble");

        // Bind groups
        let evolve_bind_group = create_bind_group(
            &device,
            "Evolve",
            &evolve_layout,
            &[
                &params_buffer,
                &spectrum_buffer,
                &ping.height,
                &ping.displacement,
                &ping.slope,
            ],
        );

        let passes = plan.passes();
        let fft_bind_groups = (0..2 * passes)
            .map(|global_stage| {
                let (src, dst) = if global_stage % 2 == 0 {
                    (&ping, &pong)
                } else {
                    (&pong, &ping)
                };
                create_bind_group(
                    &device,
                    &format!("FFT Stage {}", global_stage),
                    &fft_layout,
                    &[
                        &params_buffer,
                        &stage_buffers[(global_stage % passes) as usize],
                        &butterfly_buffer,
                        &src.height,
                        &src.displacement,
                        &src.slope,
                        &dst.height,
                        &dst.displacement,
                        &dst.slope,
                    ],
                )
            })
            .collect();

        // 2·log2(N) stages is even, so the spatial fields end up back in ping
        let assemble_bind_group = create_bind_group(
            &device,
            "Assemble",
            &assemble_layout,
            &[
                &params_buffer,
                &ping.height,
                &ping.displacement,
                &ping.slope,
                &displacement_map,
                &normal_map,
                &fold_map,
            ],
        );

        log::info!("GPU backend ready on {}", adapter_name);

        Ok(Self {
            device,
            queue,
            adapter_name,
            n: n as u32,
            passes,
            params: *params,
            params_buffer,
            evolve_pipeline,
            rows_pipeline,
            columns_pipeline,
            assemble_pipeline,
            evolve_bind_group,
            fft_bind_groups,
            assemble_bind_group,
            displacement_map,
            normal_map,
            fold_map,
            evolved_height: ping.height,
            readback,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Run all kernels for time `t` and read the maps back into `out`
    ///
    /// Fails with `Degenerate` (leaving `out` untouched) if the evolved
    /// height spectrum holds NaN or infinity.
    pub fn tick(&mut self, t: f32, out: &mut SurfaceMaps) -> Result<(), OceanError> {
        pollster::block_on(self.tick_async(t, out))
    }

    async fn tick_async(&mut self, t: f32, out: &mut SurfaceMaps) -> Result<(), OceanError> {
        let uniforms = SimUniforms {
            n: self.n,
            passes: self.passes,
            time: t,
            choppy_scale: self.params.choppy_scale,
            texel_size: self.params.texel_size_m,
            fold_threshold: self.params.fold_threshold,
            _padding: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let cells = (self.n * self.n) as u64;
        let workgroups = self.n.div_ceil(WORKGROUP_SIZE);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ocean Tick Encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Evolve Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.evolve_pipeline);
            pass.set_bind_group(0, &self.evolve_bind_group, &[]);
            pass.dispatch_workgroups(workgroups, workgroups, 1);
        }

        // The row stages overwrite ping, so grab the evolved height first
        encoder.copy_buffer_to_buffer(
            &self.evolved_height,
            0,
            &self.readback,
            cells * 36,
            cells * 8,
        );

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Transform And Assemble Pass"),
                timestamp_writes: None,
            });

            for (global_stage, bind_group) in self.fft_bind_groups.iter().enumerate() {
                if (global_stage as u32) < self.passes {
                    pass.set_pipeline(&self.rows_pipeline);
                } else {
                    pass.set_pipeline(&self.columns_pipeline);
                }
                pass.set_bind_group(0, bind_group, &[]);
                pass.dispatch_workgroups(workgroups, workgroups, 1);
            }

            pass.set_pipeline(&self.assemble_pipeline);
            pass.set_bind_group(0, &self.assemble_bind_group, &[]);
            pass.dispatch_workgroups(workgroups, workgroups, 1);
        }

        encoder.copy_buffer_to_buffer(&self.displacement_map, 0, &self.readback, 0, cells * 16);
        encoder.copy_buffer_to_buffer(&self.normal_map, 0, &self.readback, cells * 16, cells * 16);
        encoder.copy_buffer_to_buffer(&self.fold_map, 0, &self.readback, cells * 32, cells * 4);

        self.queue.submit(Some(encoder.finish()));

        // Read back results
        let slice = self.readback.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .await
            .map_err(|e| OceanError::Gpu(format!("readback channel closed: {}", e)))?
            .map_err(|e| OceanError::Gpu(format!("failed to map readback buffer: {}", e)))?;

        let bad_height = {
            let data = slice.get_mapped_range();
            let (maps, height) = data.split_at((cells * 36) as usize);
            let height: Vec<f32> = bytemuck::pod_collect_to_vec(height);
            let bad = height
                .chunks_exact(2)
                .filter(|h| !(h[0].is_finite() && h[1].is_finite()))
                .count();

            if bad == 0 {
                let split = (cells * 16) as usize;
                let vectors: Vec<[f32; 4]> = bytemuck::pod_collect_to_vec(&maps[..2 * split]);
                let folds: Vec<f32> = bytemuck::pod_collect_to_vec(&maps[2 * split..]);

                let to_vec3 = |v: &[f32; 4]| Vec3::new(v[0], v[1], v[2]);
                let (displacement, normal) = vectors.split_at(cells as usize);
                for (dst, src) in out.displacement.iter_mut().zip(displacement) {
                    *dst = to_vec3(src);
                }
                for (dst, src) in out.normal.iter_mut().zip(normal) {
                    *dst = to_vec3(src);
                }
                out.fold.copy_from_slice(&folds);
            }
            bad
        };
        self.readback.unmap();

        if bad_height > 0 {
            return Err(OceanError::Degenerate {
                time: t,
                field: "evolved height spectrum",
                count: bad_height,
            });
        }
        Ok(())
    }
}

/// Binding kinds used by the kernels, in binding order
#[derive(Clone, Copy)]
enum Slot {
    Uniform,
    Read,
    Write,
}

fn create_layout(device: &wgpu::Device, label: &str, slots: &[Slot]) -> wgpu::BindGroupLayout {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = slots
        .iter()
        .enumerate()
        .map(|(binding, slot)| wgpu::BindGroupLayoutEntry {
            binding: binding as u32,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: match slot {
                    Slot::Uniform => wgpu::BufferBindingType::Uniform,
                    Slot::Read => wgpu::BufferBindingType::Storage { read_only: true },
                    Slot::Write => wgpu::BufferBindingType::Storage { read_only: false },
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} Bind Group Layout", label)),
        entries: &entries,
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffers: &[&wgpu::Buffer],
) -> wgpu::BindGroup {
    let entries: Vec<wgpu::BindGroupEntry> = buffers
        .iter()
        .enumerate()
        .map(|(binding, buffer)| wgpu::BindGroupEntry {
            binding: binding as u32,
            resource: buffer.as_entire_binding(),
        })
        .collect();

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{} Bind Group", label)),
        layout,
        entries: &entries,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    module: &wgpu::ShaderModule,
    entry_point: &str,
) -> wgpu::ComputePipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{} Pipeline Layout", entry_point)),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(&format!("{} Pipeline", entry_point)),
        layout: Some(&pipeline_layout),
        module,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Executor;
    use crate::ocean::{dispersion, ifft, surface, PhillipsSpectrum};
    use glam::Vec2;

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn test_gpu_matches_cpu() {
        let n = 32;
        let spectrum = SpectralAmplitude::generate(
            n,
            11,
            &PhillipsSpectrum::new(0.0002, Vec2::new(1.0, 1.0), 32.0),
        )
        .unwrap();
        let plan = ButterflyPlan::build(n).unwrap();
        let params = SurfaceParams {
            choppy_scale: 1.0,
            texel_size_m: 1.0,
            fold_threshold: 0.0,
        };

        let mut gpu = GpuPipeline::new(&spectrum, &plan, &params).unwrap();
        let mut gpu_maps = SurfaceMaps::flat(n);
        gpu.tick(2.0, &mut gpu_maps).unwrap();

        let exec = Executor::Serial;
        let mut field = dispersion::evolve(&spectrum, 2.0, &exec);
        let (mut hs, mut ps) = (Vec::new(), Vec::new());
        ifft::inverse_fft_2d(&mut field.height, &mut hs, &plan, &exec).unwrap();
        ifft::inverse_fft_2d(&mut field.displacement, &mut ps, &plan, &exec).unwrap();
        ifft::inverse_fft_2d(&mut field.slope, &mut ps, &plan, &exec).unwrap();
        let mut cpu_maps = SurfaceMaps::flat(n);
        surface::assemble_into(&field, &params, &exec, &mut cpu_maps).unwrap();

        for i in 0..n * n {
            assert!((gpu_maps.displacement[i] - cpu_maps.displacement[i]).length() < 1e-3);
            assert!((gpu_maps.normal[i] - cpu_maps.normal[i]).length() < 1e-3);
            assert!((gpu_maps.fold[i] - cpu_maps.fold[i]).abs() < 1e-2);
        }
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn test_gpu_rejects_non_finite_evolution() {
        let n = 16;
        let spectrum = SpectralAmplitude::generate(
            n,
            4,
            &PhillipsSpectrum::new(0.0002, Vec2::new(1.0, 0.0), 20.0),
        )
        .unwrap();
        let plan = ButterflyPlan::build(n).unwrap();
        let params = SurfaceParams {
            choppy_scale: 1.0,
            texel_size_m: 1.0,
            fold_threshold: 0.0,
        };
        let mut gpu = GpuPipeline::new(&spectrum, &plan, &params).unwrap();

        let mut maps = SurfaceMaps::flat(n);
        gpu.tick(1.0, &mut maps).unwrap();
        let previous = maps.clone();

        match gpu.tick(f32::INFINITY, &mut maps) {
            Err(OceanError::Degenerate { field, count, .. }) => {
                assert_eq!(field, "evolved height spectrum");
                assert!(count > 0);
            }
            other => panic!("expected degenerate tick, got {:?}", other),
        }
        assert_eq!(maps, previous);
    }
}
