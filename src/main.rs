use std::path::Path;

use glow::HasContext;

use crate::abs::*;

mod abs;
mod export;
mod obj;

const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;
const OUTPUT_PATH: &str = "output.png";

fn setup_logger() {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()
        .unwrap();
}

fn main() {
    setup_logger();

    let Some(mesh_path) = std::env::args().nth(1) else {
        eprintln!("Usage: objview <mesh file path>");
        std::process::exit(1);
    };

    let mesh = match obj::Mesh::load(Path::new(&mesh_path)) {
        Ok(mesh) => mesh,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    log::info!(
        "loaded {mesh_path}: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );

    let mut app = App::new("OBJ with Vertex Colors", WINDOW_WIDTH, WINDOW_HEIGHT);

    unsafe {
        app.gl.enable(glow::DEPTH_TEST);
        app.gl.clear_color(0.0, 0.0, 0.0, 1.0);
    }

    let vert = Shader::new(
        &app.gl,
        glow::VERTEX_SHADER,
        include_str!("render/shaders/mesh/vert.glsl"),
    )
    .unwrap();
    let frag = Shader::new(
        &app.gl,
        glow::FRAGMENT_SHADER,
        include_str!("render/shaders/mesh/frag.glsl"),
    )
    .unwrap();
    let shader_program = ShaderProgram::new(&app.gl, &[&vert, &frag]).unwrap();

    let gpu_mesh = GpuMesh::new(&app.gl, &mesh.vertices, &mesh.indices);

    'running: loop {
        for event in app.event_pump.poll_iter() {
            match event {
                sdl2::event::Event::Quit { .. } => break 'running,
                sdl2::event::Event::Window {
                    win_event: sdl2::event::WindowEvent::Resized(width, height),
                    ..
                } => unsafe {
                    app.gl.viewport(0, 0, width, height);
                },
                _ => {}
            }
        }

        unsafe {
            app.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
        shader_program.use_program();
        gpu_mesh.draw();
        app.window.gl_swap_window();
    }

    match export::save_frame(&app.gl, Path::new(OUTPUT_PATH)) {
        Ok(()) => log::info!("wrote {OUTPUT_PATH}"),
        Err(e) => log::error!("frame export failed: {e}"),
    }
}
