//! Progressive render example.
//!
//! Accumulates a fixed number of frames of the Cornell box and saves the
//! result as PNG.

use cornell_core::Scene;
use cornell_renderer::{FrameSurface, RenderConfig, Renderer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Cornell Renderer - Progressive Example");
    println!("======================================");

    let start = std::time::Instant::now();
    let scene = Scene::cornell_box();
    println!("Scene built in {:?} ({} triangles)", start.elapsed(), scene.triangle_count());

    let config = RenderConfig::default().with_seed(1);
    let mut renderer = Renderer::new(scene, config, 400, 400)?;
    let surface = FrameSurface::new();

    let frames = 64;
    println!("Rendering {} frames at 400x400...", frames);

    let start = std::time::Instant::now();
    for _ in 0..frames {
        renderer.draw(&surface)?;
    }
    renderer.wait_until_idle()?;
    println!("Rendered in {:?}", start.elapsed());

    let filename = "cornell.png";
    surface.save_png(filename)?;
    println!("Saved to {}", filename);

    Ok(())
}
