//! File naming for uploaded media.

use std::path::Path;

use uuid::Uuid;

/// Directory, relative to the media root, where recipe images live.
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

/// Source of unique identifiers for generated file names.
pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    fn generate(&self) -> String;
}

/// Random UUID v4 identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Always hands out the same identifier.
#[derive(Clone, Debug)]
pub struct FixedIdGenerator(pub String);

impl IdGenerator for FixedIdGenerator {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// Build the storage path for a recipe image with a fresh UUID,
/// keeping the extension of the uploaded `filename`.
pub fn recipe_image_file_path(filename: &str) -> String {
    recipe_image_file_path_with(&UuidGenerator, filename)
}

/// Same as [`recipe_image_file_path`] but draws the identifier from `ids`.
pub fn recipe_image_file_path_with(ids: &dyn IdGenerator, filename: &str) -> String {
    let id = ids.generate();
    match Path::new(filename).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{RECIPE_IMAGE_DIR}/{id}.{ext}"),
        _ => format!("{RECIPE_IMAGE_DIR}/{id}"),
    }
}
