//! High-level GPU renderer interface.
//!
//! Three render pipelines over two shader modules:
//! - depth pre-pass: depth-only, test Less, write on
//! - accumulation: two Rgba16Float targets with ONE/ONE additive blending,
//!   depth test LessEqual against the pre-pass buffer, write off
//! - resolve: fullscreen pass into an Rgba8Unorm target (gamma is done in
//!   the shader, so the target is not an sRGB format)
//!
//! All three passes are recorded into one command encoder; wgpu orders
//! them, which provides the pre-pass → accumulation → resolve barriers.

use crate::core::{FrameParams, Splat};
use crate::gpu::buffers;
use crate::gpu::context::GpuContext;
use crate::gpu::shaders;
use crate::gpu::types::{FrameGPU, ResolveGPU, SplatGPU};
use image::RgbaImage;
use wgpu::{BindGroupLayout, Buffer, BufferUsages, RenderPipeline, TextureFormat};

const ACCUM_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
const OUTPUT_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Quad corners in triangle-strip order; XY doubles as the footprint UV.
const QUAD_STRIP: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];

pub struct GpuRenderer {
    ctx: GpuContext,
    prepass_pipeline: RenderPipeline,
    accumulate_pipeline: RenderPipeline,
    resolve_pipeline: RenderPipeline,
    frame_bind_group_layout: BindGroupLayout,
    resolve_bind_group_layout: BindGroupLayout,
    quad_vertices: Buffer,
}

impl GpuRenderer {
    /// Create a new GPU renderer.
    pub fn new() -> Result<Self, String> {
        let ctx = GpuContext::new_blocking()?;
        let device = &ctx.device;

        let splat_shader = shaders::create_splat_shader(device);
        let resolve_shader = shaders::create_resolve_shader(device);

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Frame Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let resolve_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Resolve Bind Group Layout"),
                entries: &[
                    // Accumulated premultiplied color + opacity
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Accumulated weighted normals
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Eye direction uniform
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let splat_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Splat Pipeline Layout"),
            bind_group_layouts: &[&frame_bind_group_layout],
            push_constant_ranges: &[],
        });
        let resolve_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Resolve Pipeline Layout"),
            bind_group_layouts: &[&resolve_bind_group_layout],
            push_constant_ranges: &[],
        });

        // Slot 0: quad corner (per vertex). Slot 1: splat instance.
        let corner_attrs = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        }];
        let instance_attrs = [
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 0,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 16,
                shader_location: 2,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 32,
                shader_location: 3,
            },
        ];
        let vertex_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &corner_attrs,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<SplatGPU>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &instance_attrs,
            },
        ];

        let primitive = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            // Back faces still splat; no culling.
            cull_mode: None,
            ..Default::default()
        };

        let prepass_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Depth Pre-pass Pipeline"),
            layout: Some(&splat_layout),
            vertex: wgpu::VertexState {
                module: &splat_shader,
                entry_point: "vs_main",
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &splat_shader,
                entry_point: "fs_prepass",
                targets: &[],
            }),
            primitive,
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        // Pure addition: no source/destination weighting.
        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let accumulate_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Accumulation Pipeline"),
            layout: Some(&splat_layout),
            vertex: wgpu::VertexState {
                module: &splat_shader,
                entry_point: "vs_main",
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &splat_shader,
                entry_point: "fs_accumulate",
                targets: &[
                    Some(wgpu::ColorTargetState {
                        format: ACCUM_FORMAT,
                        blend: Some(additive),
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: ACCUM_FORMAT,
                        blend: Some(additive),
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ],
            }),
            primitive,
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                // Gate against the pre-pass: at or in front of its depth.
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let resolve_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Resolve Pipeline"),
            layout: Some(&resolve_layout),
            vertex: wgpu::VertexState {
                module: &resolve_shader,
                entry_point: "vs_fullscreen",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &resolve_shader,
                entry_point: "fs_resolve",
                targets: &[Some(wgpu::ColorTargetState {
                    format: OUTPUT_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let quad_vertices = buffers::create_buffer_init(
            device,
            "Quad Corner Buffer",
            &QUAD_STRIP,
            BufferUsages::VERTEX,
        );

        Ok(Self {
            ctx,
            prepass_pipeline,
            accumulate_pipeline,
            resolve_pipeline,
            frame_bind_group_layout,
            resolve_bind_group_layout,
            quad_vertices,
        })
    }

    /// Render one frame offscreen and read the result back.
    pub fn render(
        &self,
        splats: &[Splat],
        frame: &FrameParams,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, String> {
        let device = &self.ctx.device;

        let instances: Vec<SplatGPU> = splats
            .iter()
            .filter(|s| s.is_finite())
            .map(SplatGPU::from_splat)
            .collect();

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let make_target = |label: &str, format: TextureFormat, usage: wgpu::TextureUsages| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };

        let render_attach = wgpu::TextureUsages::RENDER_ATTACHMENT;
        let depth_tex = make_target("Pre-pass Depth", DEPTH_FORMAT, render_attach);
        let color_accum = make_target(
            "Color Accumulation",
            ACCUM_FORMAT,
            render_attach | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let normal_accum = make_target(
            "Normal Accumulation",
            ACCUM_FORMAT,
            render_attach | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let output = make_target(
            "Resolved Output",
            OUTPUT_FORMAT,
            render_attach | wgpu::TextureUsages::COPY_SRC,
        );

        let depth_view = depth_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let color_view = color_accum.create_view(&wgpu::TextureViewDescriptor::default());
        let normal_view = normal_accum.create_view(&wgpu::TextureViewDescriptor::default());
        let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());

        // Zero-sized buffers are rejected; keep one zeroed instance when
        // the cloud is empty (the draws are skipped anyway).
        let fallback_instance = [SplatGPU {
            pos_radius: [0.0; 4],
            normal: [0.0; 4],
            color: [0.0; 4],
        }];
        let instance_data: &[SplatGPU] = if instances.is_empty() {
            &fallback_instance
        } else {
            &instances
        };
        let instance_buffer = buffers::create_buffer_init(
            device,
            "Splat Instance Buffer",
            instance_data,
            BufferUsages::VERTEX,
        );
        let prepass_uniforms = buffers::create_buffer_init(
            device,
            "Pre-pass Frame Uniforms",
            &[FrameGPU::from_frame(frame, true)],
            BufferUsages::UNIFORM,
        );
        let shade_uniforms = buffers::create_buffer_init(
            device,
            "Shading Frame Uniforms",
            &[FrameGPU::from_frame(frame, false)],
            BufferUsages::UNIFORM,
        );
        let resolve_uniforms = buffers::create_buffer_init(
            device,
            "Resolve Uniforms",
            &[ResolveGPU {
                eye_dir: [frame.eye_dir.x, frame.eye_dir.y, frame.eye_dir.z, 0.0],
            }],
            BufferUsages::UNIFORM,
        );

        let frame_bind = |label, buffer: &Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &self.frame_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        };
        let prepass_bind = frame_bind("Pre-pass Bind Group", &prepass_uniforms);
        let shade_bind = frame_bind("Shading Bind Group", &shade_uniforms);

        let resolve_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Resolve Bind Group"),
            layout: &self.resolve_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: resolve_uniforms.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        // Pass 1: depth pre-pass (write-only depth, cleared to far).
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Depth Pre-pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if !instances.is_empty() {
                pass.set_pipeline(&self.prepass_pipeline);
                pass.set_bind_group(0, &prepass_bind, &[]);
                pass.set_vertex_buffer(0, self.quad_vertices.slice(..));
                pass.set_vertex_buffer(1, instance_buffer.slice(..));
                pass.draw(0..4, 0..instances.len() as u32);
            }
        }

        // Pass 2: accumulation (targets cleared to zero each frame,
        // additive blend, depth gate read-only).
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Accumulation Pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &color_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &normal_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if !instances.is_empty() {
                pass.set_pipeline(&self.accumulate_pipeline);
                pass.set_bind_group(0, &shade_bind, &[]);
                pass.set_vertex_buffer(0, self.quad_vertices.slice(..));
                pass.set_vertex_buffer(1, instance_buffer.slice(..));
                pass.draw(0..4, 0..instances.len() as u32);
            }
        }

        // Pass 3: fullscreen resolve.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Resolve Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.resolve_pipeline);
            pass.set_bind_group(0, &resolve_bind, &[]);
            pass.draw(0..4, 0..1);
        }

        self.ctx.queue.submit(Some(encoder.finish()));

        let pixels = pollster::block_on(buffers::read_rgba_texture(
            device,
            &self.ctx.queue,
            &output,
            width,
            height,
        ))?;

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| "Readback size mismatch".to_string())
    }
}
