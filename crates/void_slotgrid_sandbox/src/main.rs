//! Void Slotgrid Sandbox
//!
//! Builds the grids described by a TOML file, wires logging listeners and
//! plays a scripted sequence of drags between them.
//!
//! Run with: cargo run -p void_slotgrid_sandbox -- [config.toml]
//!
//! `SLOTGRID_SEED` selects the random pre-fill.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::process::ExitCode;
use void_slotgrid::prelude::*;

const DEFAULT_CONFIG: &str = include_str!("../sandbox.toml");

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<SandboxConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            SandboxConfig::load_from_file(path)
        }
        None => SandboxConfig::from_toml_str(DEFAULT_CONFIG),
    }
}

fn run() -> Result<(), ConfigError> {
    let config = load_config()?;
    let definitions = config.definitions()?;

    let seed = std::env::var("SLOTGRID_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut grids = GridSet::new();
    let mut names = Vec::new();
    for (name, mut grid) in config.build_grids(&definitions, &mut rng)? {
        watch(&mut grid, &name);
        log::info!("Grid '{}': {}x{}, {} items", name, grid.width(), grid.height(), grid.len());
        names.push((name, grids.insert(grid)));
    }

    let mut drag = DragSlot::new();
    drag.subscribe(|event| match event {
        DragEvent::PickedUp(item) => log::info!("Picked up {}", item.name()),
        DragEvent::Added(item) => log::info!("{} moved to {}", item.name(), item.position),
        DragEvent::Swapped(item) => log::info!("{} swapped in", item.name()),
        DragEvent::Returned(item) => log::info!("{} went back where it came from", item.name()),
        DragEvent::Dropped(item) => log::info!("{} left the inventory", item.name()),
        DragEvent::Hovered(_) | DragEvent::Picked(_) => {}
    });

    print_all(&grids, &names);
    play(&mut grids, &names, &definitions, &mut drag);
    print_all(&grids, &names);
    Ok(())
}

/// Log the notifications a player would see
fn watch(grid: &mut Grid, name: &str) {
    let name = name.to_string();
    grid.subscribe(move |event| match event {
        GridEvent::ItemDropped(item) => log::info!("{} was dropped on the ground", item.name()),
        GridEvent::ItemDropFailed(item) => {
            log::info!("You're not allowed to drop {} on the ground", item.name())
        }
        GridEvent::ItemAddFailed(item) => log::info!("You can't put {} in {}!", item.name(), name),
        GridEvent::Resized { width, height } => log::info!("{} is now {}x{}", name, width, height),
        _ => {}
    });
}

fn grid_named(names: &[(String, GridId)], name: &str) -> Option<GridId> {
    names.iter().find(|(n, _)| n == name).map(|(_, id)| *id)
}

/// Carry an item from its grid to `target` (or outside every grid) and release it
fn carry(
    grids: &mut GridSet,
    drag: &mut DragSlot,
    item: ItemId,
    target: Option<(GridId, Point)>,
) -> Option<DragResolution> {
    let source = grids.grid_of(item)?;
    let grid = grids.get_mut(source)?;
    let grab = grid.item(item)?.position();
    drag.pick_up(grid, item, grab)?;

    drag.exit(source);
    if let Some((target, point)) = target {
        drag.enter(target);
        drag.update_position(point);
    }
    drag.release(grids)
}

fn play(grids: &mut GridSet, names: &[(String, GridId)], definitions: &[Arc<ItemDefinition>], drag: &mut DragSlot) {
    let (Some(backpack), Some(stash), Some(hand)) = (
        grid_named(names, "backpack"),
        grid_named(names, "stash"),
        grid_named(names, "hand"),
    ) else {
        log::warn!("Script needs grids named backpack, stash and hand");
        return;
    };

    let in_backpack: Vec<(ItemId, Option<ItemCategory>)> = grids
        .get(backpack)
        .map(|grid| grid.items().map(|item| (item.id(), item.category())).collect())
        .unwrap_or_default();

    // Move the first backpack item into the stash corner
    if let Some(&(item, _)) = in_backpack.first() {
        report(carry(grids, drag, item, Some((stash, Point::ZERO))));
    }

    // Equip a weapon, swapping out whatever is held
    for &(item, category) in &in_backpack {
        if category != Some(ItemCategory::Weapon) || grids.grid_of(item) != Some(backpack) {
            continue;
        }
        let Some(resolution) = report(carry(grids, drag, item, Some((hand, Point::ZERO)))) else {
            continue;
        };
        if let DragOutcome::Swapped { evicted, .. } = resolution.outcome {
            if let Some(grid) = grids.get_mut(backpack) {
                if let Err(rejected) = grid.place(evicted) {
                    log::info!("No room for {}, leaving it on the ground", rejected.item.name());
                }
            }
        }
    }

    // Throw the last backpack item on the ground
    if let Some(&(item, _)) = in_backpack.last() {
        if grids.grid_of(item) == Some(backpack) {
            report(carry(grids, drag, item, None));
        }
    }

    // Cursed items refuse to leave
    if let Some(cursed) = definitions.iter().find(|def| !def.droppable) {
        if let Some(grid) = grids.get_mut(stash) {
            match grid.place(cursed.instantiate()) {
                Ok(id) => match grid.drop_item(id) {
                    Ok(item) => log::warn!("{} left the stash after all", item.name()),
                    Err(error) => log::info!("{} stays in the stash: {}", cursed.name, error),
                },
                Err(rejected) => log::info!("No room for {}: {}", rejected.item.name(), rejected.reason),
            }
        }
    }

    // Shrink the stash, ejecting what no longer fits
    if let Some(grid) = grids.get_mut(stash) {
        let evicted = grid.resize(2, 2);
        log::info!("{} items fell out of the stash", evicted.len());
    }
}

fn report(resolution: Option<DragResolution>) -> Option<DragResolution> {
    match &resolution {
        Some(resolution) => log::debug!("{} -> {}", resolution.item.name(), resolution.outcome.name()),
        None => log::warn!("Drag did not start"),
    }
    resolution
}

fn print_all(grids: &GridSet, names: &[(String, GridId)]) {
    for (name, id) in names {
        if let Some(grid) = grids.get(*id) {
            print_grid(name, grid);
        }
    }
}

fn print_grid(name: &str, grid: &Grid) {
    println!();
    println!("{} ({}x{}, {:?})", name, grid.width(), grid.height(), grid.render_mode());

    let legend: Vec<(char, &Item)> = ('A'..='Z').chain('a'..='z').zip(grid.items()).collect();

    if grid.render_mode() == RenderMode::Grid {
        for y in 0..grid.height() as i32 {
            let row: String = (0..grid.width() as i32)
                .map(|x| {
                    let point = Point::new(x, y);
                    legend
                        .iter()
                        .find(|(_, item)| item.contains(point))
                        .map(|(c, _)| *c)
                        .unwrap_or('.')
                })
                .collect();
            println!("  {}", row);
        }
    }

    for (c, item) in &legend {
        println!("  {} = {} at {}", c, item.name(), item.position());
    }
}
