//! surfel-render: Render a splat cloud PLY to a PNG image
//!
//! Usage:
//!   surfel-render --input cloud.ply --out render.png
//!   surfel-render --input cloud.ply --eye 0,1,5 --target 0,0,0 --width 1920 --height 1080
//!   surfel-render --input cloud.ply --camera-json camera.json --out render.png

use nalgebra::Vector3;
use std::path::PathBuf;
use surfel_rs::core::Camera;
use surfel_rs::io::load_ply;
use surfel_rs::render::SplatPipeline;

fn parse_vec3(s: &str, flag: &str) -> Vector3<f32> {
    let parts: Vec<f32> = s.split(',').filter_map(|p| p.parse().ok()).collect();
    if parts.len() != 3 {
        eprintln!(
            "Error: {} must be three comma-separated floats (e.g., '0,1,5')",
            flag
        );
        std::process::exit(1);
    }
    Vector3::new(parts[0], parts[1], parts[2])
}

fn main() {
    println!("surfel-render v{}", surfel_rs::VERSION);

    // Parse command-line arguments
    let mut args = std::env::args().skip(1);
    let mut input: Option<PathBuf> = None;
    let mut out_path = PathBuf::from("render.png");
    let mut width: u32 = 1280;
    let mut height: u32 = 720;
    let mut eye: Option<Vector3<f32>> = None;
    let mut target: Option<Vector3<f32>> = None;
    let mut fov_deg: f32 = 60.0;
    let mut radius_scale: f32 = 1.0;
    let mut scaling: f32 = 1.0;
    let mut camera_json: Option<PathBuf> = None;
    let mut use_gpu = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" => {
                input = Some(PathBuf::from(args.next().expect("Missing --input argument")));
            }
            "--out" => {
                out_path = PathBuf::from(args.next().expect("Missing --out argument"));
            }
            "--width" => {
                width = args
                    .next()
                    .expect("Missing --width argument")
                    .parse()
                    .expect("Invalid width");
            }
            "--height" => {
                height = args
                    .next()
                    .expect("Missing --height argument")
                    .parse()
                    .expect("Invalid height");
            }
            "--eye" => {
                eye = Some(parse_vec3(
                    &args.next().expect("Missing --eye argument"),
                    "--eye",
                ));
            }
            "--target" => {
                target = Some(parse_vec3(
                    &args.next().expect("Missing --target argument"),
                    "--target",
                ));
            }
            "--fov" => {
                fov_deg = args
                    .next()
                    .expect("Missing --fov argument")
                    .parse()
                    .expect("Invalid fov");
            }
            "--radius-scale" => {
                radius_scale = args
                    .next()
                    .expect("Missing --radius-scale argument")
                    .parse()
                    .expect("Invalid radius scale");
            }
            "--scaling" => {
                scaling = args
                    .next()
                    .expect("Missing --scaling argument")
                    .parse()
                    .expect("Invalid scaling");
            }
            "--camera-json" => {
                camera_json = Some(PathBuf::from(
                    args.next().expect("Missing --camera-json argument"),
                ));
            }
            "--gpu" => {
                use_gpu = true;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                std::process::exit(1);
            }
        }
    }

    let Some(input) = input else {
        eprintln!("Error: --input is required");
        print_help();
        std::process::exit(1);
    };

    // Load the splat cloud
    let cloud = match load_ply(&input) {
        Ok(cloud) => cloud,
        Err(e) => {
            eprintln!("Error loading {}: {}", input.display(), e);
            std::process::exit(1);
        }
    };
    println!("Loaded {} splats from {}", cloud.len(), input.display());

    // Camera: explicit JSON wins, then --eye/--target, then auto-framing
    // from the cloud bounds.
    let camera = if let Some(path) = camera_json {
        let file = std::fs::File::open(&path).unwrap_or_else(|e| {
            eprintln!("Error opening {}: {}", path.display(), e);
            std::process::exit(1);
        });
        serde_json::from_reader(file).unwrap_or_else(|e| {
            eprintln!("Error parsing {}: {}", path.display(), e);
            std::process::exit(1);
        })
    } else {
        let (center, extent) = match cloud.bounds() {
            Some((min, max)) => (0.5 * (min + max), (max - min).norm().max(1.0)),
            None => (Vector3::zeros(), 1.0),
        };
        let target = target.unwrap_or(center);
        let eye = eye.unwrap_or_else(|| target + Vector3::new(0.0, 0.25 * extent, 1.5 * extent));
        let mut camera = Camera::look_at(eye, target);
        camera.fov_y = fov_deg.to_radians();
        camera
    };

    let frame = camera.frame_params(width, height, radius_scale, scaling);

    if use_gpu {
        #[cfg(feature = "gpu")]
        {
            let renderer = surfel_rs::gpu::GpuRenderer::new().unwrap_or_else(|e| {
                eprintln!("GPU init failed: {}", e);
                std::process::exit(1);
            });
            let img = renderer
                .render(cloud.as_slice(), &frame, width, height)
                .unwrap_or_else(|e| {
                    eprintln!("GPU render failed: {}", e);
                    std::process::exit(1);
                });
            save_image(img.save(&out_path), &out_path);
        }
        #[cfg(not(feature = "gpu"))]
        {
            eprintln!("GPU support not enabled. Recompile with --features gpu");
            std::process::exit(1);
        }
    } else {
        let mut pipeline = SplatPipeline::new(width, height);
        let img = pipeline.render(cloud.as_slice(), &frame);
        save_image(img.save(&out_path), &out_path);
    }

    println!("Wrote {}", out_path.display());
}

fn save_image(result: image::ImageResult<()>, path: &PathBuf) {
    if let Err(e) = result {
        eprintln!("Error writing {}: {}", path.display(), e);
        std::process::exit(1);
    }
}

fn print_help() {
    println!(
        r#"Usage: surfel-render --input <cloud.ply> [options]

Options:
  --input <path>         Splat cloud PLY file (required)
  --out <path>           Output PNG path (default: render.png)
  --width <px>           Image width (default: 1280)
  --height <px>          Image height (default: 720)
  --eye <x,y,z>          Eye position (default: auto-framed from bounds)
  --target <x,y,z>       Look-at target (default: cloud center)
  --fov <degrees>        Vertical field of view (default: 60)
  --radius-scale <f>     Splat radius multiplier (default: 1.0)
  --scaling <f>          Global scene scale (default: 1.0)
  --camera-json <path>   Load the full camera from JSON instead
  --gpu                  Render with wgpu (requires --features gpu)
  --help                 Show this help"#
    );
}
