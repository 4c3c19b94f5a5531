//! Ls command: print a container's datasets and root attributes.

use anyhow::{Context, Result};

use magnon_store::Store;

use crate::cli::LsArgs;

/// Attribute values longer than this are cut off; simulation scripts and
/// log dumps stored as attributes would otherwise flood the listing.
const MAX_VALUE_CHARS: usize = 72;

/// Run the listing.
pub fn run(args: LsArgs) -> Result<()> {
    let store = Store::open(&args.container)
        .with_context(|| format!("failed to open container: {}", args.container.display()))?;

    for (name, shape) in store.list_arrays()? {
        println!("{name}  {shape:?}");
    }

    let attrs = store.list_attrs()?;
    if !attrs.is_empty() {
        println!();
    }
    for (key, value) in attrs {
        println!("{key} = {}", truncate(&value.to_string(), MAX_VALUE_CHARS));
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max).collect();
    format!("{head}...")
}
