/// Application name used for directory names and user agents.
pub const APP_NAME: &str = "levain";

/// The only accepted suffix for recipe files.
pub const RECIPE_EXTENSION: &str = ".levain.yaml";

/// Suffix of the install metadata sidecar stored next to a registry recipe.
pub const META_EXTENSION: &str = ".levain.meta";

/// Recipe every other recipe implicitly depends on.
pub const DEFAULT_BASE_RECIPE: &str = "levain";

/// Overrides the levain home directory.
pub const LEVAIN_HOME_ENV: &str = "LEVAIN_HOME";

/// Overrides the extra local recipes directory.
pub const RECIPES_DIR_ENV: &str = "LEVAIN_RECIPES_DIR";
