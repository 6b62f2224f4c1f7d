//! Tests du pipeline complet : perspective, export PNG et configuration

use glam::{Mat4, Vec3, Vec4};
use pixel_raster::*;

const FRONT: Vec3 = Vec3::new(217.0, 238.0, 185.0);
const BACK: Vec3 = Vec3::new(185.0, 217.0, 238.0);

/// Scène de référence : deux triangles qui se chevauchent, vus depuis z = 5
fn render_reference_scene(width: u32, height: u32, swap_order: bool) -> Rasterizer {
    let mut rasterizer = Rasterizer::new(width, height).unwrap();

    let positions = vec![
        Vec3::new(2.0, 0.0, -2.0),
        Vec3::new(0.0, 2.0, -2.0),
        Vec3::new(-2.0, 0.0, -2.0),
        Vec3::new(3.5, -1.0, -5.0),
        Vec3::new(2.5, 1.5, -5.0),
        Vec3::new(-1.0, 0.5, -5.0),
    ];
    let indices = if swap_order {
        vec![[3, 4, 5], [0, 1, 2]]
    } else {
        vec![[0, 1, 2], [3, 4, 5]]
    };
    let colors = vec![FRONT, FRONT, FRONT, BACK, BACK, BACK];

    let pos = rasterizer.load_positions(positions);
    let ind = rasterizer.load_indices(indices);
    let col = rasterizer.load_colors(colors);

    rasterizer.clear(Buffers::COLOR | Buffers::DEPTH);
    rasterizer.set_model(model_rotation_z(0.0));
    rasterizer.set_view(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
    rasterizer.geometry_mut().set_perspective(
        45.0_f32.to_radians(),
        width as f32 / height as f32,
        DEPTH_NEAR,
        DEPTH_FAR,
    );
    rasterizer.draw(pos, ind, col, Primitive::Triangle).unwrap();
    rasterizer
}

#[test]
fn test_reference_scene_occlusion() {
    let rasterizer = render_reference_scene(700, 700, false);
    let fb = rasterizer.frame_buffer();

    // (0, 0.5, -2) : dans les deux triangles, le proche gagne
    assert_eq!(fb.pixel(350, 410), Some(FRONT));
    // (2.5, 0.5, -5) : seulement dans le triangle lointain
    assert_eq!(fb.pixel(561, 392), Some(BACK));
    // Coin de l'écran : vide
    assert_eq!(fb.pixel(5, 5), Some(Vec3::ZERO));

    let front_depth = fb.depth(350, 410).unwrap();
    let back_depth = fb.depth(561, 392).unwrap();
    assert!(front_depth < back_depth);
    assert!(front_depth > DEPTH_NEAR && back_depth < DEPTH_FAR);

    let stats = rasterizer.stats();
    assert_eq!(stats.triangles_submitted, 2);
    assert_eq!(stats.triangles_rasterized, 2);
    assert_eq!(stats.triangles_skipped, 0);
}

#[test]
fn test_reference_scene_independent_of_submission_order() {
    let a = render_reference_scene(120, 90, false);
    let b = render_reference_scene(120, 90, true);
    assert_eq!(a.frame_buffer().as_slice(), b.frame_buffer().as_slice());
}

#[test]
fn test_matrices_persist_across_draws() {
    let mut rasterizer = Rasterizer::new(16, 16).unwrap();
    // Décale tout d'un demi-écran vers la droite
    rasterizer.set_model(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));

    let pos = rasterizer.load_positions(vec![
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(-0.5, -1.0, 0.0),
        Vec3::new(-1.0, -0.5, 0.0),
    ]);
    let ind = rasterizer.load_indices(vec![[0, 1, 2]]);
    let col = rasterizer.load_colors(vec![Vec3::splat(200.0); 3]);

    rasterizer.draw(pos, ind, col, Primitive::Triangle).unwrap();
    rasterizer.set_view(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)));
    rasterizer.draw(pos, ind, col, Primitive::Triangle).unwrap();

    let fb = rasterizer.frame_buffer();
    // Premier appel : model seul ; second : model puis view
    assert_eq!(fb.pixel(8, 0), Some(Vec3::splat(200.0)));
    assert_eq!(fb.pixel(8, 8), Some(Vec3::splat(200.0)));
    assert_eq!(fb.pixel(0, 0), Some(Vec3::ZERO));
    assert_eq!(rasterizer.stats().draw_calls, 2);
}

#[test]
fn test_behind_camera_vertex_is_skipped() {
    let mut rasterizer = Rasterizer::new(32, 32).unwrap();
    rasterizer.geometry_mut().set_perspective(1.0, 1.0, DEPTH_NEAR, DEPTH_FAR);

    // Un sommet exactement dans le plan de la caméra : w = 0
    let pos = rasterizer.load_positions(vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, -3.0),
        Vec3::new(0.0, 1.0, -3.0),
    ]);
    let ind = rasterizer.load_indices(vec![[0, 1, 2]]);
    let col = rasterizer.load_colors(vec![Vec3::ONE; 3]);

    rasterizer.draw(pos, ind, col, Primitive::Triangle).unwrap();
    assert_eq!(rasterizer.stats().triangles_skipped, 1);
    assert!(rasterizer.sample_buffer().depth_slice().iter().all(|d| d.is_infinite()));
}

#[test]
fn test_triangle_crossing_eye_plane_is_skipped() {
    let mut rasterizer = Rasterizer::new(32, 32).unwrap();
    // w = z et profondeur NDC nulle : les sommets en z = -1 sont derrière l'œil
    rasterizer.set_projection(Mat4::from_cols(Vec4::X, Vec4::Y, Vec4::W, Vec4::ZERO));

    let pos = rasterizer.load_positions(vec![
        Vec3::new(-0.9, -0.9, 1.0),
        Vec3::new(0.9, -0.9, 1.0),
        Vec3::new(0.3, -0.9, -1.0),
        Vec3::new(-0.9, -0.9, 1.0),
        Vec3::new(0.9, -0.9, 1.0),
        Vec3::new(0.0, 0.9, 1.0),
    ]);
    let crossing = rasterizer.load_indices(vec![[0, 1, 2]]);
    let col = rasterizer.load_colors(vec![Vec3::splat(90.0); 6]);

    rasterizer.draw(pos, crossing, col, Primitive::Triangle).unwrap();
    assert_eq!(rasterizer.stats().triangles_skipped, 1);
    assert!(rasterizer.sample_buffer().depth_slice().iter().all(|d| d.is_infinite()));

    // Un triangle devant l'œil reste visible ensuite
    let visible = rasterizer.load_indices(vec![[3, 4, 5]]);
    rasterizer.draw(pos, visible, col, Primitive::Triangle).unwrap();
    assert_eq!(rasterizer.stats().triangles_rasterized, 1);
    assert_eq!(rasterizer.frame_buffer().pixel(16, 10), Some(Vec3::splat(90.0)));
    assert!(rasterizer
        .sample_buffer()
        .depth_slice()
        .iter()
        .all(|&d| d.is_infinite() || (DEPTH_NEAR..=DEPTH_FAR).contains(&d)));
}

#[test]
fn test_save_png() {
    let rasterizer = render_reference_scene(64, 48, false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");

    rasterizer.frame_buffer().save_png(&path).unwrap();

    let image = image::open(&path).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (64, 48));
    assert_eq!(&image, &rasterizer.frame_buffer().to_rgb_image());
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("render.toml");
    let path = path.to_str().unwrap();

    let mut config = RenderConfig::default();
    config.output.width = 320;
    config.camera.angle_deg = 30.0;
    config.sampling.pattern = "rotated".to_string();
    config.save_to_file(path).unwrap();

    let loaded = RenderConfig::load_from_file(path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.sample_pattern().unwrap(), SamplePattern::rotated_grid());

    std::fs::write(path, "output = 12").unwrap();
    assert!(RenderConfig::load_from_file(path).is_err());
    assert_eq!(RenderConfig::load_or_default(path), RenderConfig::default());

    let missing = dir.path().join("absent.toml");
    assert_eq!(
        RenderConfig::load_or_default(missing.to_str().unwrap()),
        RenderConfig::default()
    );
}
