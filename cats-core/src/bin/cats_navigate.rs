//! Cats Navigate CLI - Resolve and traverse categories from a catalog
//!
//! Usage:
//!     cats-navigate --catalog catalogs/filesystem.json Folder -c filesystem=ourfs
//!     cats-navigate --catalog catalogs/basketball.json Team --identity lakers --via games
//!     cats-navigate --json --explain Folder -c filesystem=ourfs

use clap::Parser;
use cats_core::{
    CatalogLoader, CategorySet, CatsError, Context, Navigated, Provenance, Registry,
};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cats-navigate")]
#[command(about = "Resolve category sets and follow links through a catalog")]
#[command(version)]
struct Args {
    /// Category or set name to start from
    category: String,

    /// Path to catalog JSON file
    #[arg(long, env = "CATS_CATALOG")]
    catalog: PathBuf,

    /// Context binding, repeatable
    #[arg(short = 'c', long = "context", value_name = "KEY=VALUE", value_parser = parse_binding)]
    context: Vec<(String, String)>,

    /// Open a single item instead of the whole set
    #[arg(long)]
    identity: Option<String>,

    /// Links to follow from the item, in order
    #[arg(long, requires = "identity")]
    via: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Show which derivation rule answered
    #[arg(long)]
    explain: bool,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,
}

fn parse_binding(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "cats_core=debug" } else { "cats_core=warn" };
    let filter = EnvFilter::try_from_env("CATS_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            if args.json {
                let response = e.to_error_response();
                match serde_json::to_string_pretty(&response) {
                    Ok(body) => println!("{}", body),
                    Err(_) => eprintln!("Error: {}", e),
                }
            } else {
                eprintln!("Error: {}", e);
            }
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> cats_core::Result<String> {
    let mut loader = CatalogLoader::new();
    let name = loader.load_from_file(&args.catalog)?;

    let registry = Registry::new();
    loader.install_all(&registry);
    tracing::debug!(catalog = %name, categories = ?registry.categories(), "catalog ready");

    let context: Context = args.context.iter().cloned().collect();
    let landed = navigate(&registry, args, context)?;

    let explanation = if args.explain {
        Some(explain(&landed))
    } else {
        None
    };

    if args.json {
        Ok(render_json(&landed, explanation)?)
    } else {
        Ok(render_text(&landed, explanation))
    }
}

/// Open the starting point and follow each `--via` link.
///
/// Every step but the last must land on an item.
fn navigate(registry: &Registry, args: &Args, context: Context) -> cats_core::Result<Navigated> {
    let identity = match &args.identity {
        Some(identity) => identity,
        None => return registry.open_set(&args.category, context).map(Navigated::Set),
    };

    let mut current = Navigated::Item(registry.open_item(&args.category, identity.as_str(), context)?);
    for link in &args.via {
        current = match current {
            Navigated::Item(item) => item.navigate(link)?,
            Navigated::Set(set) => {
                return Err(CatsError::WrongLinkKind {
                    category: set.name().to_string(),
                    link: link.clone(),
                    expected: "an item",
                    actual: "a set",
                })
            }
        };
    }
    Ok(current)
}

fn explain(landed: &Navigated) -> String {
    match landed {
        Navigated::Set(set) => explain_set(set),
        Navigated::Item(item) => format!("{} opened under {}", item, item.context()),
    }
}

/// Report the rule recorded when the set was opened
fn explain_set(set: &CategorySet) -> String {
    match set.provenance() {
        Provenance::Explicit => format!("{} has explicit items; no rule consulted", set),
        Provenance::Derived {
            selection,
            lookup_name,
        } => {
            let mut line = format!(
                "{} matched {} (rule #{}) under {}",
                selection.derivation,
                selection.tier,
                selection.index,
                set.context()
            );
            if let Some(lookup_name) = lookup_name {
                line.push_str(&format!(" via lookup '{}'", lookup_name));
            }
            line
        }
    }
}

fn render_text(landed: &Navigated, explanation: Option<String>) -> String {
    let mut lines = vec![];
    if let Some(explanation) = explanation {
        lines.push(format!("# {}", explanation));
    }
    match landed {
        Navigated::Set(set) => {
            lines.push(set.to_string());
            lines.extend(set.items().iter().map(|id| format!("  {}", id)));
        }
        Navigated::Item(item) => lines.push(item.to_string()),
    }
    lines.join("\n")
}

fn render_json(landed: &Navigated, explanation: Option<String>) -> cats_core::Result<String> {
    let mut value = match landed {
        Navigated::Set(set) => json!({
            "kind": "set",
            "name": set.name(),
            "category": set.item_category(),
            "context": set.context(),
            "items": set.items(),
        }),
        Navigated::Item(item) => json!({
            "kind": "item",
            "category": item.category(),
            "identity": item.identity(),
            "context": item.context(),
        }),
    };
    if let Some(explanation) = explanation {
        value["explain"] = json!(explanation);
    }
    Ok(serde_json::to_string_pretty(&value)?)
}
