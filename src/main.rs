//! Scatterform viewer.
//!
//! With no arguments the default two figures are loaded from the working
//! directory. Otherwise every argument is an OBJ path, placed in turn at
//! the default figure positions. Once those run out the positions repeat,
//! each lap pushed further back by [`REPEAT_SPACING`].
//!
//! Set `RUST_LOG` to change verbosity (default `info`).

use std::path::PathBuf;

use scatterform::loader::{default_models, ModelSpec};
use scatterform::{Scene, Vec3};

/// Depth between repeated uses of the default positions.
const REPEAT_SPACING: f32 = 400.0;

fn model_specs(args: Vec<String>) -> Vec<ModelSpec> {
    if args.is_empty() {
        return default_models();
    }

    let placements: Vec<_> = default_models().into_iter().map(|m| m.placement).collect();
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let lap = (i / placements.len()) as f32;
            let mut placement = placements[i % placements.len()];
            placement.origin += Vec3::new(0.0, 0.0, -REPEAT_SPACING * lap);

            let path = PathBuf::from(arg);
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            ModelSpec::new(name, path, placement)
        })
        .collect()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let models = model_specs(std::env::args().skip(1).collect());
    for model in &models {
        log::info!("Queued '{}' from {}", model.name, model.path.display());
    }

    let scene = models
        .into_iter()
        .fold(Scene::new().with_title("Scatterform"), Scene::with_model);

    if let Err(e) = scene.run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_no_arguments_loads_default_models() {
        let names: Vec<_> = model_specs(Vec::new()).into_iter().map(|m| m.name).collect();
        assert_eq!(names, ["male02", "female02"]);
    }

    #[test]
    fn test_names_come_from_file_stems() {
        let specs = model_specs(args(&["assets/robot.obj", "tree.obj"]));
        assert_eq!(specs[0].name, "robot");
        assert_eq!(specs[1].name, "tree");
        assert_eq!(specs[0].placement.origin, default_models()[0].placement.origin);
    }

    #[test]
    fn test_repeated_placements_do_not_overlap() {
        let specs = model_specs(args(&["a.obj", "b.obj", "c.obj", "d.obj", "e.obj"]));
        for (i, a) in specs.iter().enumerate() {
            for b in &specs[i + 1..] {
                assert_ne!(a.placement.origin, b.placement.origin, "{} overlaps {}", a.name, b.name);
            }
        }
        assert_eq!(
            specs[2].placement.origin,
            specs[0].placement.origin + Vec3::new(0.0, 0.0, -REPEAT_SPACING)
        );
        assert_eq!(specs[2].placement.color, specs[0].placement.color);
    }
}
