use anyhow::{Context, Result};
use glam::Vec3;
use log::info;
use std::env;

use pixel_raster::{model_rotation_z, Buffers, Primitive, Rasterizer, RenderConfig};

fn main() -> Result<()> {
    // Initialiser le logging
    env_logger::init();
    info!("Démarrage de Pixel Raster v{}", pixel_raster::VERSION);

    // Traitement simple des arguments
    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<String> = None;
    let mut output: Option<String> = None;
    let mut angle: Option<f32> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => config_path = Some(args[i + 1].clone()),
            "--output" if i + 1 < args.len() => output = Some(args[i + 1].clone()),
            "--angle" if i + 1 < args.len() => {
                angle = Some(args[i + 1].parse().context("angle invalide")?)
            }
            other => anyhow::bail!("argument inconnu: {}", other),
        }
        i += 2;
    }

    let mut config = match config_path {
        Some(path) => RenderConfig::load_or_default(&path),
        None => RenderConfig::default(),
    };
    if let Some(path) = output {
        config.output.path = path;
    }
    if let Some(angle) = angle {
        config.camera.angle_deg = angle;
    }

    render_reference_scene(&config)
}

/// Rend les deux triangles de référence qui se chevauchent
fn render_reference_scene(config: &RenderConfig) -> Result<()> {
    let mut rasterizer = Rasterizer::with_pattern(
        config.output.width,
        config.output.height,
        config.sample_pattern()?,
    )?;

    let positions = vec![
        Vec3::new(2.0, 0.0, -2.0),
        Vec3::new(0.0, 2.0, -2.0),
        Vec3::new(-2.0, 0.0, -2.0),
        Vec3::new(3.5, -1.0, -5.0),
        Vec3::new(2.5, 1.5, -5.0),
        Vec3::new(-1.0, 0.5, -5.0),
    ];
    let indices = vec![[0, 1, 2], [3, 4, 5]];
    let front = Vec3::new(217.0, 238.0, 185.0);
    let back = Vec3::new(185.0, 217.0, 238.0);
    let colors = vec![front, front, front, back, back, back];

    let pos_id = rasterizer.load_positions(positions);
    let ind_id = rasterizer.load_indices(indices);
    let col_id = rasterizer.load_colors(colors);

    rasterizer.clear(Buffers::COLOR | Buffers::DEPTH);

    let camera = &config.camera;
    rasterizer.set_model(model_rotation_z(camera.angle_deg));
    rasterizer
        .geometry_mut()
        .set_camera(camera.eye(), camera.eye() - Vec3::Z, Vec3::Y);
    rasterizer.geometry_mut().set_perspective(
        camera.fov_deg.to_radians(),
        camera.aspect_ratio(&config.output),
        camera.near,
        camera.far,
    );

    rasterizer.draw(pos_id, ind_id, col_id, Primitive::Triangle)?;

    let stats = rasterizer.stats();
    info!(
        "{} triangles rastérisés, {} échantillons écrits en {} µs",
        stats.triangles_rasterized, stats.samples_written, stats.last_draw_time_us
    );

    rasterizer.frame_buffer().save_png(&config.output.path)?;
    println!("Image écrite dans {}", config.output.path);
    Ok(())
}
