//! high-level operations, one per command

mod export;
mod new;
mod upload;

pub use export::{ensure_gitignored, export, resolve_coordinate, ExportResult};
pub use new::{new_recipe, CiService, NewOptions, RecipeLayout, DEFAULT_CONAN_REMOTES};
pub use upload::{publish, upload, PublishResult};
