/// Load a Wavefront OBJ file, fit it into view and spin it in the terminal
///
/// Usage: mesh-viewer path/to/file.obj

use log::{error, info};
use std::env;
use std::io;
use toycity_core::{bounds, obj, Mesh};
use toycity_terminal::{init_logging, AppConfig, TerminalApp, View};

fn main() -> io::Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::discover()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Failed to load config: {}", e)))?;

    let mesh = if let Some(path) = args.get(1) {
        load_fitted(path)?
    } else {
        eprintln!("{}", usage(&args));
        eprintln!("\nNo OBJ file provided, using default cube...");
        Mesh::cube(2.0)
    };

    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(View::model(mesh), config)?;
    app.run()?;

    println!("Thank you for using the Toycity mesh viewer!");
    Ok(())
}

/// Argv may be empty when the process is spawned without a program name
fn usage(args: &[String]) -> String {
    let program = args.first().map_or("mesh-viewer", String::as_str);
    format!("Usage: {program} <obj-file>")
}

/// Load `path` and map it into the canonical `[-1, 1]` volume.
///
/// Any failure here keeps the viewer from entering its render loop.
fn load_fitted(path: &str) -> io::Result<Mesh> {
    println!("Loading OBJ file: {}", path);

    let mut loaded = obj::load_obj(path).map_err(|e| {
        error!("{path}: {e}");
        let kind = match e {
            obj::ObjError::Io(ref source) => source.kind(),
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, format!("Failed to load OBJ: {}", e))
    })?;

    let fit = bounds::normalize(&loaded.buffer.vertices).map_err(|e| {
        error!("{path}: {e}");
        io::Error::new(io::ErrorKind::InvalidData, format!("Cannot display {}: {}", path, e))
    })?;
    fit.apply(&mut loaded.buffer.vertices);
    info!("centered on {:?}, scaled by {}", fit.center, fit.scale);

    let mesh = Mesh::from_buffer(&loaded.buffer);
    println!("Loaded {} triangles", mesh.triangles.len());
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_without_program_name() {
        assert_eq!(usage(&[]), "Usage: mesh-viewer <obj-file>");
        assert_eq!(usage(&["viewer".to_string()]), "Usage: viewer <obj-file>");
    }

    #[test]
    fn test_non_finite_file_is_refused() {
        let path = std::env::temp_dir().join(format!("toycity-nonfinite-{}.obj", std::process::id()));
        std::fs::write(&path, "v inf 0 0\nv 0 1 0\nv 0 0 1\nf 1 2 3\n").unwrap();
        let err = load_fitted(path.to_str().unwrap()).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
