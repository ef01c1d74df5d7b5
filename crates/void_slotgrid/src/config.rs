//! Grid and item configuration

use crate::error::{ConfigError, ConfigResult};
use crate::grid::Grid;
use crate::item::{ItemCategory, ItemDefinition};
use crate::provider::{ItemStore, RenderMode};
use crate::shape::Shape;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Largest accepted grid extent on either axis
pub const MAX_EXTENT: u32 = 1024;

/// How to create and pre-fill one grid
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Name used in logs
    pub name: String,

    /// Layout mode
    pub render_mode: RenderMode,

    /// Maximum item count (`None` = unbounded)
    pub capacity: Option<usize>,

    /// Admitted category (`None` = any)
    pub allowed: Option<ItemCategory>,

    /// Width in cells
    pub width: u32,

    /// Height in cells
    pub height: u32,

    /// Try to place random items after creation
    pub fill_randomly: bool,

    /// Fill remaining space with the first item definition
    pub fill_empty: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            name: "grid".to_string(),
            render_mode: RenderMode::Grid,
            capacity: None,
            allowed: None,
            width: 8,
            height: 4,
            fill_randomly: true,
            fill_empty: false,
        }
    }
}

impl GridConfig {
    /// Create a named default config
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Equipment slot config: single mode, one item, no pre-fill
    pub fn slot(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(name)
            .with_render_mode(RenderMode::Single)
            .with_size(width, height)
            .with_capacity(1)
            .with_fill_randomly(false)
    }

    /// Set layout mode
    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    /// Set extent
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set maximum item count
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Only admit the given category
    pub fn with_allowed(mut self, category: ItemCategory) -> Self {
        self.allowed = Some(category);
        self
    }

    /// Enable or disable random pre-fill
    pub fn with_fill_randomly(mut self, enabled: bool) -> Self {
        self.fill_randomly = enabled;
        self
    }

    /// Enable or disable the fill-empty pass
    pub fn with_fill_empty(mut self, enabled: bool) -> Self {
        self.fill_empty = enabled;
        self
    }

    /// Check the extent
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid '{}' has zero extent {}x{}",
                self.name, self.width, self.height
            )));
        }
        if self.width > MAX_EXTENT || self.height > MAX_EXTENT {
            return Err(ConfigError::Invalid(format!(
                "grid '{}' extent {}x{} exceeds {}",
                self.name, self.width, self.height, MAX_EXTENT
            )));
        }
        Ok(())
    }

    /// Create the backing store for this config
    pub fn store(&self) -> ItemStore {
        let mut store = ItemStore::new(self.render_mode);
        if let Some(capacity) = self.capacity {
            store = store.with_capacity(capacity);
        }
        if let Some(category) = self.allowed {
            store = store.with_allowed(category);
        }
        store
    }

    /// Create an empty grid
    pub fn build(&self) -> ConfigResult<Grid> {
        self.validate()?;
        let grid = Grid::new(self.store(), self.width, self.height);
        log::debug!("Created grid '{}' as {}", self.name, grid.id());
        Ok(grid)
    }

    /// Run the configured pre-fill passes. Returns how many items were placed.
    ///
    /// The random pass makes `width * height / 3` attempts with random
    /// definitions. The fill-empty pass makes `width * height` attempts with
    /// the first definition, which should be a 1x1 item.
    pub fn populate<R>(&self, grid: &mut Grid, definitions: &[Arc<ItemDefinition>], rng: &mut R) -> usize
    where
        R: Rng,
    {
        if definitions.is_empty() {
            return 0;
        }

        let cells = self.width as usize * self.height as usize;
        let mut placed = 0;

        if self.fill_randomly {
            for _ in 0..cells / 3 {
                let definition = &definitions[rng.gen_range(0..definitions.len())];
                if grid.place(definition.instantiate()).is_ok() {
                    placed += 1;
                }
            }
        }

        if self.fill_empty {
            for _ in 0..cells {
                if grid.place(definitions[0].instantiate()).is_ok() {
                    placed += 1;
                }
            }
        }

        log::debug!("Pre-filled grid '{}' with {} items", self.name, placed);
        placed
    }
}

fn default_droppable() -> bool {
    true
}

/// Serialized form of an [`ItemDefinition`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefinitionConfig {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: Option<ItemCategory>,

    /// Footprint rows, `#` for occupied cells and `.` for holes
    pub shape: Vec<String>,

    #[serde(default = "default_droppable")]
    pub droppable: bool,
}

impl ItemDefinitionConfig {
    /// Build the runtime definition
    pub fn to_definition(&self) -> ConfigResult<ItemDefinition> {
        let shape = Shape::from_rows(&self.shape).map_err(|source| ConfigError::Shape {
            id: self.id.clone(),
            source,
        })?;

        let mut definition = ItemDefinition::new(self.id.clone(), self.name.clone(), shape)
            .with_description(self.description.clone());
        definition.category = self.category;
        definition.droppable = self.droppable;
        Ok(definition)
    }
}

/// Item catalog plus grid layout for a host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default)]
    pub items: Vec<ItemDefinitionConfig>,

    #[serde(default)]
    pub grids: Vec<GridConfig>,
}

impl SandboxConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check grids and item IDs
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate item id '{}'", item.id)));
            }
        }

        let mut names = HashSet::new();
        for grid in &self.grids {
            grid.validate()?;
            if !names.insert(grid.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate grid name '{}'", grid.name)));
            }
        }
        Ok(())
    }

    /// Build every item definition, in file order
    pub fn definitions(&self) -> ConfigResult<Vec<Arc<ItemDefinition>>> {
        self.items
            .iter()
            .map(|item| item.to_definition().map(Arc::new))
            .collect()
    }

    /// Look up a grid config by name
    pub fn grid(&self, name: &str) -> Option<&GridConfig> {
        self.grids.iter().find(|grid| grid.name == name)
    }

    /// Build and pre-fill every grid, in file order
    pub fn build_grids<R>(&self, definitions: &[Arc<ItemDefinition>], rng: &mut R) -> ConfigResult<Vec<(String, Grid)>>
    where
        R: Rng,
    {
        self.grids
            .iter()
            .map(|config| {
                let mut grid = config.build()?;
                config.populate(&mut grid, definitions, rng);
                Ok((config.name.clone(), grid))
            })
            .collect()
    }
}
